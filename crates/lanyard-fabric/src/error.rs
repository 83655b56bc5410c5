//! Error types for lanyard-fabric.

use thiserror::Error;

/// Result type alias for fabric operations.
pub type Result<T> = std::result::Result<T, FabricError>;

/// Errors from calls into the fabric service.
#[derive(Debug, Error)]
pub enum FabricError {
    /// Transport-level failure reaching the service
    #[error("fabric transport error: {0}")]
    Transport(String),

    /// Error reported by the service itself
    #[error("fabric service error (status {status}): {message}")]
    Subsystem {
        /// HTTP status returned by the service
        status: u16,
        /// Response body, verbatim
        message: String,
    },

    /// Request could not be built
    #[error("invalid fabric request: {0}")]
    RequestBuild(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
