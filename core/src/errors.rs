use thiserror::Error;

/// University portal errors
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Configuration Error: {0}")]
    Configuration(String),

    #[error("Session change superseded by a newer login or logout")]
    Superseded,

    #[error("Persistence Error: {0}")]
    Persistence(String),

    #[error("HTTP Error: {status_code} - {message}")]
    Http { status_code: u16, message: String },

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PortalError {
    /// True for errors that mean the attached credential is no longer accepted.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PortalError::Unauthorized(_))
    }

    /// Maps a non-success API status and its message onto the error taxonomy.
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            // The API answers 422 for malformed bearer tokens.
            401 | 422 => PortalError::Unauthorized(message),
            403 => PortalError::Forbidden(message),
            404 => PortalError::NotFound(message),
            400 | 409 => PortalError::Validation(message),
            _ => PortalError::Http {
                status_code,
                message,
            },
        }
    }
}

/// Result type for portal operations
pub type PortalResult<T> = Result<T, PortalError>;
