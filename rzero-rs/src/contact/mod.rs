//! Survey derived contact rates by pool type and age.
mod document;
mod model;

pub use document::*;
pub use model::*;
