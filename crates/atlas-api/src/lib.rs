//! # atlas-api
//!
//! HTTP surface: axum handlers for content CRUD (classes, units, posts),
//! gallery-asset deletion, random backgrounds, auth, contact relay and
//! billing. Multipart bodies carry scalar fields, relation id lists and
//! binary attachments in one request.
//!
//! Role gating happens here, ahead of the coordinator.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod multipart;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use extractors::{AppState, AuthenticatedUser, EditorUser};
pub use routes::router;
