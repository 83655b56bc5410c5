//! Error types for lanyard-core.

use lanyard_fabric::FabricError;
use thiserror::Error;

/// Result type alias for endpoint lifecycle operations.
pub type Result<T> = std::result::Result<T, NetError>;

/// Errors from endpoint lifecycle operations.
#[derive(Debug, Error)]
pub enum NetError {
    /// Error from the fabric service
    #[error(transparent)]
    Fabric(#[from] FabricError),

    /// Endpoint not present in the network's table
    #[error("endpoint not found: {0}")]
    NotFound(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
