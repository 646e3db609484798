//! HTTP surface of the assistant.
//!
//! `api_router()` returns a composable `Router`; `server::start_server`
//! binds it and manages its lifecycle.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ApiSession};
pub use types::ApiContext;
