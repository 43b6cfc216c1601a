use fathom_client::ApiError;
use fathom_protocol::{ErrorEnvelope, ErrorKind};
use fathom_records::MalformedRecord;
use fathom_search::SearchError;
use thiserror::Error;

/// Failure of a single tool call. Converted into an MCP error result, never into a protocol
/// error.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Malformed(#[from] MalformedRecord),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Meeting {0} not found")]
    MeetingNotFound(u64),
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api(err) => err.kind(),
            Self::Malformed(_) => ErrorKind::MalformedRecord,
            Self::Search(err) => err.kind(),
            Self::MeetingNotFound(_) => ErrorKind::NotFound,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let envelope = ErrorEnvelope::new(self.kind(), self.to_string());
        match hint_for(self.kind()) {
            Some(hint) => envelope.with_hint(hint),
            None => envelope,
        }
    }
}

fn hint_for(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::Authentication => Some("Check that FATHOM_API_KEY holds a valid API key"),
        ErrorKind::NotFound => {
            Some("Use list_meetings or search_meetings to find a valid recording_id")
        }
        ErrorKind::RateLimited => Some("Wait for the rate limit window to reset, then retry"),
        ErrorKind::UpstreamServer => Some("The Fathom API is failing; retry later"),
        ErrorKind::Network => Some("Check network access and FATHOM_BASE_URL"),
        ErrorKind::InvalidRequest => Some("Check the tool arguments (filters, cursor, per_page)"),
        ErrorKind::InvalidResponse
        | ErrorKind::MalformedRecord
        | ErrorKind::ToonSyntax => None,
    }
}
