//! HTTP layer for askr.
//!
//! Axum-based API under `/api/` with API key authentication, envelope
//! responses for JSON endpoints, a data-stream body for chat turns, and
//! CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
