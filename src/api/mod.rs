//! HTTP surface.
//!
//! Routes live at the root (`/health`) and under `/api/`. Every request
//! passes the access log middleware; CORS admits configured origins plus
//! any `http://localhost:<port>` dev server.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::serve;
pub use types::ApiContext;
