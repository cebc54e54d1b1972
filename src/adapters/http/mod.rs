//! HTTP adapters - REST endpoints and router assembly.

pub mod error;
pub mod health;
pub mod messages;
pub mod middleware;
mod router;
pub mod users;

pub use error::{delivery_error_response, ErrorResponse};
pub use router::{app_router, AppServices, RouterSettings};
