//! HTTP API.
//!
//! Routes are nested under `/api/`. Account routes are open; everything
//! under `/api/wells` and logout requires a bearer token and runs through
//! the Auth → Audit middleware stack.
//!
//! The router is composable: `api_router()` returns a `Router` that can be
//! mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::{ApiContext, DatasetSource};
