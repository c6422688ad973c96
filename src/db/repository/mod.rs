//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a `rusqlite::Connection`; all public functions are
//! re-exported here.

mod api_token;
mod medicine;

pub use api_token::*;
pub use medicine::*;
