/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No view is registered at this path.
    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for fallible app operations.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
