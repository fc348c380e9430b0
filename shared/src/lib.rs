//! Shared types for the service-bay tracker
//!
//! Types used by the server and by any API client: the unified error system,
//! the fixed domain enumerations and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
