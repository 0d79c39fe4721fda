use thiserror::Error;

/// regsweep error types
#[derive(Error, Debug)]
pub enum SweepError {
    /// Transport or protocol failure talking to the registry
    #[error("Registry error: {registry} - {message}")]
    Registry { registry: String, message: String },

    /// Manifest lacks the fields needed to resolve a creation time
    #[error("Missing metadata in manifest {digest}: {detail}")]
    MissingMetadata { digest: String, detail: String },

    /// Payload was fetched but cannot be decoded
    #[error("Malformed payload for {digest}: {detail}")]
    MalformedPayload { digest: String, detail: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for regsweep operations
pub type Result<T> = std::result::Result<T, SweepError>;
