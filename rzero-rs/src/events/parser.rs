use crate::error::{Result, RzeroError};
use crate::prelude::{Day, Id, Real};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Tag of primary case lines.
pub const PRIMARY_TAG: &str = "[PRIM]";

/// Tag of transmission lines.
pub const TRANSMISSION_TAG: &str = "[TRAN]";

const INFECTED_FIELD: usize = 1;
const INFECTOR_FIELD: usize = 2;
const DAY_FIELD: usize = 6;
const PROBABILITY_FIELD: usize = 13;
const MIN_FIELDS: usize = PROBABILITY_FIELD + 1;

/// A single infection event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventRecord {
    /// Index case seeded into the population.
    Primary { infected: Id, day: Day, p: Real },
    /// `infector` infected `infected` on `day`.
    Transmission {
        infected: Id,
        infector: Id,
        day: Day,
        p: Real,
    },
}

impl EventRecord {
    pub fn infected(&self) -> Id {
        match *self {
            EventRecord::Primary { infected, .. } => infected,
            EventRecord::Transmission { infected, .. } => infected,
        }
    }

    pub fn day(&self) -> Day {
        match *self {
            EventRecord::Primary { day, .. } => day,
            EventRecord::Transmission { day, .. } => day,
        }
    }

    /// Transmission probability the simulator used for this infection.
    pub fn probability(&self) -> Real {
        match *self {
            EventRecord::Primary { p, .. } => p,
            EventRecord::Transmission { p, .. } => p,
        }
    }
}

/// Parse one log line. Blank lines yield `None`; `line` is the 1-based line
/// number used in error messages.
pub fn parse_line(line: usize, text: &str) -> Result<Option<EventRecord>> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.is_empty() {
        return Ok(None);
    }

    let tag = fields[0];
    if tag != PRIMARY_TAG && tag != TRANSMISSION_TAG {
        return Err(RzeroError::malformed(line, format!("unknown tag {:?}", tag)));
    }
    if fields.len() < MIN_FIELDS {
        return Err(RzeroError::malformed(
            line,
            format!("expected at least {} fields, found {}", MIN_FIELDS, fields.len()),
        ));
    }

    let infected = parse_id(line, fields[INFECTED_FIELD], "infected id")?;
    let day = fields[DAY_FIELD]
        .parse::<Day>()
        .map_err(|_| RzeroError::malformed(line, format!("invalid day {:?}", fields[DAY_FIELD])))?;
    let p = fields[PROBABILITY_FIELD].parse::<Real>().map_err(|_| {
        RzeroError::malformed(
            line,
            format!("invalid transmission probability {:?}", fields[PROBABILITY_FIELD]),
        )
    })?;

    let event = if tag == PRIMARY_TAG {
        EventRecord::Primary { infected, day, p }
    } else {
        EventRecord::Transmission {
            infected,
            infector: parse_id(line, fields[INFECTOR_FIELD], "infector id")?,
            day,
            p,
        }
    };
    return Ok(Some(event));
}

/// Ids may be written as reals ("12.0"); the fraction is truncated.
fn parse_id(line: usize, field: &str, what: &str) -> Result<Id> {
    match field.parse::<Real>() {
        Ok(x) if x.is_finite() && x >= 0.0 => Ok(x.trunc() as Id),
        _ => Err(RzeroError::malformed(line, format!("invalid {} {:?}", what, field))),
    }
}

/// Parse a whole log, in order.
pub fn parse_log<R: BufRead>(reader: R) -> Result<Vec<EventRecord>> {
    let mut events = vec![];
    for (i, line) in reader.lines().enumerate() {
        if let Some(event) = parse_line(i + 1, &line?)? {
            events.push(event);
        }
    }
    return Ok(events);
}

pub fn read_log(path: impl AsRef<Path>) -> Result<Vec<EventRecord>> {
    let path = path.as_ref();
    let events = parse_log(BufReader::new(File::open(path)?))?;
    debug!("read {} events from {}", events.len(), path.display());
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
[PRIM] 1 -1 x x x 0 x x x x x x 0.05
[TRAN] 2 1 x x x 0 x x x x x x 0.05

[TRAN] 3.0 1 x x x 1 x x x x x x 0.05
[TRAN] 4 2.0 x x x 1 x x x x x x 0.06
";

    #[test]
    fn parses_both_tags() {
        let events = parse_log(LOG.as_bytes()).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            EventRecord::Primary {
                infected: 1,
                day: 0,
                p: 0.05
            }
        );
        assert_eq!(
            events[3],
            EventRecord::Transmission {
                infected: 4,
                infector: 2,
                day: 1,
                p: 0.06
            }
        );
        assert_eq!(events[2].infected(), 3);
    }

    #[test]
    fn reports_line_numbers() {
        let log = "[PRIM] 1 -1 x x x 0 x x x x x x 0.05\n\n[TRAN] 2 1 x x x day x x x x x x 0.05\n";
        match parse_log(log.as_bytes()) {
            Err(RzeroError::MalformedLog { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_line(1, "[FOO] 1 2 x x x 0 x x x x x x 0.1").is_err());
        assert!(parse_line(1, "[TRAN] 1 2 x x x 0").is_err());
        assert!(parse_line(1, "[TRAN] a 2 x x x 0 x x x x x x 0.1").is_err());
        assert!(parse_line(1, "[TRAN] 1 -2 x x x 0 x x x x x x 0.1").is_err());
        assert!(parse_line(1, "[TRAN] 1 2 x x x -1 x x x x x x 0.1").is_err());
        assert!(parse_line(1, "[TRAN] 1 2 x x x 0 x x x x x x p").is_err());
        assert_eq!(parse_line(1, "   ").unwrap(), None);
    }
}
