use fathom_protocol::ErrorKind;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Authentication(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. {detail}")]
    RateLimited {
        detail: String,
        /// Wait suggested by the remote (`Retry-After` / `RateLimit-Reset`), if any.
        retry_after: Option<Duration>,
    },

    #[error("HTTP {status}: {message}")]
    UpstreamServer { status: u16, message: String },

    #[error("Request failed: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    InvalidRequest { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::UpstreamServer { .. } => ErrorKind::UpstreamServer,
            Self::Network(_) => ErrorKind::Network,
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::InvalidResponse(_) => ErrorKind::InvalidResponse,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
