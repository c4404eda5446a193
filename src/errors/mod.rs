//! Error handling module for the GreenGen client.
//!
//! Provides centralized error types mapping every failure mode to a
//! user-facing message category.

/// Error codes as constants to avoid stringly-typed errors.
#[allow(dead_code)]
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const BUSY: &str = "BUSY";
    pub const REMOTE_ERROR: &str = "REMOTE_ERROR";
    pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
    pub const BAD_RESPONSE: &str = "BAD_RESPONSE";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// No authenticated identity resolved
    Unauthorized(String),
    /// Local validation failure, caught before any remote call
    Validation(String),
    /// An operation of the same kind is already in flight
    Busy(String),
    /// The backend rejected the request
    Remote { status: u16, message: String },
    /// Network-level failure reaching the backend
    Transport(String),
    /// The backend answered with a body we could not decode
    BadResponse(String),
    /// File storage failure (upload or URL derivation)
    Storage(String),
}

impl AppError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Busy(_) => codes::BUSY,
            AppError::Remote { .. } => codes::REMOTE_ERROR,
            AppError::Transport(_) => codes::TRANSPORT_ERROR,
            AppError::BadResponse(_) => codes::BAD_RESPONSE,
            AppError::Storage(_) => codes::STORAGE_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Busy(msg) => msg.clone(),
            AppError::Remote { status, message } => format!("{} (status {})", message, status),
            AppError::Transport(msg) => msg.clone(),
            AppError::BadResponse(msg) => msg.clone(),
            AppError::Storage(msg) => msg.clone(),
        }
    }

    /// True for failures caught locally, before any remote side effect.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_) | AppError::Busy(_) | AppError::Unauthorized(_)
        )
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Transport error: {:?}", err);
        AppError::Transport(format!("Request failed: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("Decode error: {:?}", err);
        AppError::BadResponse(format!("Unexpected response body: {}", err))
    }
}
