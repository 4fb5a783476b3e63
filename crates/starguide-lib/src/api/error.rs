// API Error Types
// Feature: Chart Chat Assistant (014-chart-chat)

use thiserror::Error;

/// Default cooldown when the backend rate-limits without a Retry-After
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Backend API error
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection failed
    #[error("Cannot connect to backend: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Invalid or expired credentials: {0}")]
    AuthFailed(String),

    /// Backend signaled a rate limit; sends must pause for the window
    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Request timeout
    #[error("Backend response timeout")]
    Timeout,

    /// Resource not found (chart, session)
    #[error("Not found: {0}")]
    NotFound(String),

    /// API error from the backend
    #[error("Backend error: {0}")]
    ApiError(String),

    /// JSON parsing error
    #[error("Response parse error: {0}")]
    ParseError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Local storage error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::ConnectionFailed(err.to_string())
        } else {
            ApiError::ApiError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::IoError(err.to_string())
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Stable error codes for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    ConnectionFailed,
    AuthFailed,
    RateLimited,
    Timeout,
    NotFound,
    ApiError,
    ParseError,
    IoError,
    StorageError,
    InvalidConfig,
}

impl ApiErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorCode::ConnectionFailed => "API_CONNECTION_FAILED",
            ApiErrorCode::AuthFailed => "API_AUTH_FAILED",
            ApiErrorCode::RateLimited => "API_RATE_LIMITED",
            ApiErrorCode::Timeout => "API_TIMEOUT",
            ApiErrorCode::NotFound => "API_NOT_FOUND",
            ApiErrorCode::ApiError => "API_ERROR",
            ApiErrorCode::ParseError => "API_PARSE_ERROR",
            ApiErrorCode::IoError => "API_IO_ERROR",
            ApiErrorCode::StorageError => "API_STORAGE_ERROR",
            ApiErrorCode::InvalidConfig => "API_INVALID_CONFIG",
        }
    }
}

impl ApiError {
    pub fn code(&self) -> ApiErrorCode {
        match self {
            ApiError::ConnectionFailed(_) => ApiErrorCode::ConnectionFailed,
            ApiError::AuthFailed(_) => ApiErrorCode::AuthFailed,
            ApiError::RateLimited { .. } => ApiErrorCode::RateLimited,
            ApiError::Timeout => ApiErrorCode::Timeout,
            ApiError::NotFound(_) => ApiErrorCode::NotFound,
            ApiError::ApiError(_) => ApiErrorCode::ApiError,
            ApiError::ParseError(_) => ApiErrorCode::ParseError,
            ApiError::IoError(_) => ApiErrorCode::IoError,
            ApiError::StorageError(_) => ApiErrorCode::StorageError,
            ApiError::InvalidConfig(_) => ApiErrorCode::InvalidConfig,
        }
    }

    /// Whether this error is the backend's rate-limit signal, which routes
    /// to the cooldown gate instead of a generic notification
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }

    /// Cooldown seconds carried by a rate-limit error, if any
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            ApiError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

impl From<ApiError> for String {
    fn from(err: ApiError) -> Self {
        err.to_string()
    }
}
