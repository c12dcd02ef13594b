//! Error types for paramstore-config.

/// Result type alias for paramstore-config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting (usually the environment namespace) is missing.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request itself is malformed (empty key list, empty path prefix, ...).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The parameter store reported one or more requested names as invalid.
    #[error("Invalid requested params: {}", .0.join(", "))]
    InvalidParameters(Vec<String>),

    /// Transport or service error from a remote collaborator.
    #[error("Remote store request failed: {0}")]
    RemoteFailure(String),

    /// A requested export name is not present in the exports registry.
    #[error("Invalid exported name {0}")]
    MissingExport(String),

    /// A response body or resolved value could not be decoded.
    #[error("Failed to deserialize configuration: {0}")]
    DeserializationError(String),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    /// Build an `InvalidParameters` error from any list of names.
    pub fn invalid_parameters<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::InvalidParameters(names.into_iter().map(Into::into).collect())
    }

    /// Whether this error came from a remote collaborator rather than local validation.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteFailure(_) | Self::InvalidParameters(_) | Self::MissingExport(_)
        )
    }
}
