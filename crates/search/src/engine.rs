use crate::error::Result;
use crate::matcher::Needle;
use fathom_client::{MeetingApi, MeetingPages, MeetingQuery, PageAggregator};
use fathom_records::{normalize_meeting, normalize_transcript, Meeting, Transcript};
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TRANSCRIPT_CONCURRENCY: usize = 4;
pub const MAX_TRANSCRIPT_CONCURRENCY: usize = 16;

/// A matching meeting, with its transcript embedded when the match came from the transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub meeting: Meeting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub query: String,
    pub items: Vec<SearchHit>,
    pub total_matches: usize,
    pub searched_transcripts: bool,
    pub meetings_scanned: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub transcripts_skipped: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub transcript_search_incomplete: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub listing_truncated: bool,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl SearchResult {
    fn empty(query: &str, include_transcript: bool) -> Self {
        Self {
            query: query.to_string(),
            items: Vec::new(),
            total_matches: 0,
            searched_transcripts: include_transcript,
            meetings_scanned: 0,
            transcripts_skipped: 0,
            transcript_search_incomplete: false,
            listing_truncated: false,
        }
    }
}

enum TranscriptCheck {
    Matched(Transcript),
    NoMatch,
    Skipped,
}

/// Keyword search over the complete (hop-bounded) meeting listing.
///
/// Metadata is matched first; with `include_transcript` every meeting that did not match is
/// re-checked against its transcript, fetched with bounded concurrency. Results keep listing
/// order.
#[derive(Clone)]
pub struct SearchEngine {
    api: Arc<dyn MeetingApi>,
    aggregator: PageAggregator,
    transcript_concurrency: usize,
    transcript_deadline: Option<Duration>,
}

impl SearchEngine {
    pub fn new(api: Arc<dyn MeetingApi>) -> Self {
        Self {
            api,
            aggregator: PageAggregator::default(),
            transcript_concurrency: DEFAULT_TRANSCRIPT_CONCURRENCY,
            transcript_deadline: None,
        }
    }

    #[must_use]
    pub fn with_page_aggregator(mut self, aggregator: PageAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    #[must_use]
    pub fn with_transcript_concurrency(mut self, concurrency: usize) -> Self {
        self.transcript_concurrency = concurrency.clamp(1, MAX_TRANSCRIPT_CONCURRENCY);
        self
    }

    /// Bound the transcript phase. Checks finished before the deadline are kept and the result
    /// is flagged incomplete.
    #[must_use]
    pub fn with_transcript_deadline(mut self, deadline: Duration) -> Self {
        self.transcript_deadline = Some(deadline);
        self
    }

    pub async fn search(&self, query: &str, include_transcript: bool) -> Result<SearchResult> {
        let Some(needle) = Needle::new(query) else {
            debug!("blank search query; nothing to do");
            return Ok(SearchResult::empty(query, include_transcript));
        };

        let listing = MeetingQuery {
            include_summary: Some(true),
            include_crm_matches: Some(true),
            ..MeetingQuery::default()
        };
        let source = MeetingPages::new(self.api.as_ref(), &listing);
        let aggregated = self.aggregator.aggregate(&source, None, None).await?;
        if aggregated.hop_limit_reached {
            warn!(
                "search scanned only the first {} pages of meetings",
                self.aggregator.max_pages()
            );
        }

        let meetings: Vec<Meeting> = aggregated
            .items
            .iter()
            .filter_map(|raw| match normalize_meeting(raw) {
                Ok(meeting) => Some(meeting),
                Err(err) => {
                    warn!("skipping meeting: {err}");
                    None
                }
            })
            .collect();

        let mut hits: Vec<Option<SearchHit>> = meetings
            .iter()
            .map(|meeting| {
                needle.matches_meeting(meeting).then(|| SearchHit {
                    meeting: meeting.clone(),
                    transcript: None,
                })
            })
            .collect();

        let mut result = SearchResult::empty(query, include_transcript);
        result.meetings_scanned = meetings.len();
        result.listing_truncated = aggregated.hop_limit_reached;

        if include_transcript {
            let pending: Vec<usize> = (0..meetings.len()).filter(|&i| hits[i].is_none()).collect();
            let (outcomes, complete) = self.check_transcripts(&meetings, &pending, &needle).await;
            result.transcript_search_incomplete = !complete;

            for (index, outcome) in outcomes {
                match outcome {
                    TranscriptCheck::Matched(transcript) => {
                        let mut meeting = meetings[index].clone();
                        meeting.transcript.clear();
                        hits[index] = Some(SearchHit {
                            meeting,
                            transcript: Some(transcript),
                        });
                    }
                    TranscriptCheck::NoMatch => {}
                    TranscriptCheck::Skipped => result.transcripts_skipped += 1,
                }
            }
        }

        result.items = hits.into_iter().flatten().collect();
        result.total_matches = result.items.len();
        Ok(result)
    }

    /// Returns the finished checks and whether every pending meeting was checked.
    async fn check_transcripts(
        &self,
        meetings: &[Meeting],
        pending: &[usize],
        needle: &Needle,
    ) -> (Vec<(usize, TranscriptCheck)>, bool) {
        let mut checks = stream::iter(pending.iter().copied())
            .map(|index| async move { (index, self.check_transcript(&meetings[index], needle).await) })
            .buffer_unordered(self.transcript_concurrency);

        let mut outcomes = Vec::with_capacity(pending.len());
        let drain = async {
            while let Some(outcome) = checks.next().await {
                outcomes.push(outcome);
            }
        };
        let complete = match self.transcript_deadline {
            Some(deadline) => tokio::time::timeout(deadline, drain).await.is_ok(),
            None => {
                drain.await;
                true
            }
        };
        if !complete {
            warn!(
                "transcript search deadline reached after {}/{} meetings",
                outcomes.len(),
                pending.len()
            );
        }
        (outcomes, complete)
    }

    async fn check_transcript(&self, meeting: &Meeting, needle: &Needle) -> TranscriptCheck {
        let id = meeting.recording_id;
        let raw = match self.api.recording_transcript(id).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!("transcript for recording {id} unavailable: {err}");
                return TranscriptCheck::Skipped;
            }
        };
        match normalize_transcript(id, &raw, Some(meeting)) {
            Ok(transcript) if needle.is_in(&transcript.full_text()) => {
                TranscriptCheck::Matched(transcript)
            }
            Ok(_) => TranscriptCheck::NoMatch,
            Err(err) => {
                warn!("skipping transcript for recording {id}: {err}");
                TranscriptCheck::Skipped
            }
        }
    }
}
