use fathom_client::ApiError;
use fathom_protocol::ErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Meeting listing failed: {0}")]
    Listing(#[from] ApiError),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Listing(err) => err.kind(),
        }
    }
}
