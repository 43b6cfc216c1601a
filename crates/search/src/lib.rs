//! # Fathom Search
//!
//! Keyword search over the meeting listing. The remote API has no search endpoint, so the
//! listing is aggregated and matched client-side; transcripts are only fetched when asked for.

mod engine;
mod error;
mod matcher;

pub use engine::{
    SearchEngine, SearchHit, SearchResult, DEFAULT_TRANSCRIPT_CONCURRENCY,
    MAX_TRANSCRIPT_CONCURRENCY,
};
pub use error::{Result, SearchError};
pub use matcher::Needle;
