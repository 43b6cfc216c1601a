//! # Fathom Client
//!
//! Read-only access to the Fathom external API.
//!
//! - [`MeetingApi`] is the seam the rest of the workspace codes against
//! - [`FathomClient`] implements it over HTTPS with status classification and backoff
//! - [`PageAggregator`] turns cursor pagination into complete (or explicitly bounded) result sets

mod api;
mod error;
mod http;
mod pagination;
mod retry;

pub use api::{MeetingApi, MeetingQuery, Page};
pub use error::{ApiError, Result};
pub use http::{FathomClient, DEFAULT_BASE_URL};
pub use pagination::{
    Aggregated, MeetingPages, PageAggregator, PageSource, TeamMemberPages, TeamPages,
    DEFAULT_MAX_PAGES,
};
pub use retry::{with_retry, RetryPolicy};
