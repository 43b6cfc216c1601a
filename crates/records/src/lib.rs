//! # Fathom Records
//!
//! Unified record shapes for the Fathom API and the pruning pass every payload goes through.
//!
//! ```text
//! raw fragment ──> normalize_* ──> projection ──> deep_filter ──> Meeting / Transcript / ...
//! ```

mod error;
mod filter;
mod markdown;
mod model;
mod normalize;

pub use error::{MalformedRecord, Result};
pub use filter::{deep_filter, is_placeholder};
pub use markdown::markdown_to_plain;
pub use model::{ActionItem, Meeting, Participant, Recorder, Team, TeamMember, Transcript, Utterance};
pub use normalize::{normalize_meeting, normalize_team, normalize_team_member, normalize_transcript};
