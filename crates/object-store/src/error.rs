//! Error types for the object store.

/// Errors that can occur when working with the object store.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    /// Object storage error
    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// S3 bucket not found - must be created before use
    #[error("S3 bucket '{0}' does not exist. Create it before connecting.")]
    BucketNotFound(String),
}

/// Result type alias for object store operations.
pub type Result<T> = std::result::Result<T, ObjectStoreError>;
