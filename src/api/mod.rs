//! JSON HTTP surface for medicine records.
//!
//! `medicine_api_router()` returns a composable `Router`; `server::serve`
//! runs it on the configured address.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::medicine_api_router;
pub use types::ApiContext;
