//! REST API over axum.
//!
//! Every `/api/{owner}/...` route requires a bearer token whose owner matches
//! the path segment.

pub mod auth;
pub mod chat;
pub mod conversations;
pub mod error;
pub mod extract;
pub mod health;
pub mod server;
pub mod tasks;

pub use auth::{AuthenticatedOwner, JwtVerifier};
pub use error::{ApiError, ErrorResponse};
pub use server::{build_router, serve_with_shutdown, AppState};
