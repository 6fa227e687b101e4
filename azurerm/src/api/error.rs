use thiserror::Error;
use tfsdk::RemoteError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("unexpected status {status} with error: {code}: {message}")]
    ApiError {
        status: u16,
        code: String,
        message: String,
    },

    #[error("{0} was not found")]
    NotFound(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Too many requests, rate limited")]
    RateLimited,

    #[error("Service unavailable, retry later")]
    ServiceUnavailable,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::NotFound(_) | ApiError::ApiError { status: 404, .. }
        )
    }
}

impl From<ApiError> for RemoteError {
    fn from(error: ApiError) -> Self {
        if error.is_not_found() {
            RemoteError::NotFound
        } else {
            RemoteError::failed(error)
        }
    }
}
