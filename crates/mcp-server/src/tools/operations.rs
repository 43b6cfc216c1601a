//! Tool bodies, independent of the MCP wiring.
//!
//! Each operation returns the payload before pruning and serialization; the service applies the
//! configured output format.

use super::error::ToolError;
use super::schemas::{
    ListMeetingsRequest, ListTeamMembersRequest, ListTeamsRequest, SearchMeetingsRequest,
};
use crate::config::{ServerConfig, MAX_PER_PAGE};
use fathom_client::{
    MeetingApi, MeetingPages, MeetingQuery, PageAggregator, TeamMemberPages, TeamPages,
};
use fathom_records::{
    normalize_meeting, normalize_team, normalize_team_member, normalize_transcript, Meeting, Team,
};
use fathom_search::SearchEngine;
use log::{debug, warn};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, ToolError>;

#[derive(Clone)]
pub struct MeetingTools {
    api: Arc<dyn MeetingApi>,
    aggregator: PageAggregator,
    search: SearchEngine,
    default_per_page: u32,
}

impl MeetingTools {
    pub fn new(api: Arc<dyn MeetingApi>, config: &ServerConfig) -> Self {
        let aggregator = PageAggregator::new(config.max_pages);
        let search = SearchEngine::new(api.clone())
            .with_page_aggregator(aggregator)
            .with_transcript_concurrency(config.transcript_concurrency)
            .with_transcript_deadline(config.search_deadline);
        Self {
            api,
            aggregator,
            search,
            default_per_page: config.default_per_page,
        }
    }

    fn per_page(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_per_page)
            .clamp(1, MAX_PER_PAGE)
    }

    pub async fn list_meetings(&self, request: ListMeetingsRequest) -> Result<Value> {
        let per_page = self.per_page(request.per_page);
        let query = request.to_query(per_page);
        let source = MeetingPages::new(self.api.as_ref(), &query);
        let page = self
            .aggregator
            .aggregate(&source, request.cursor.as_deref(), Some(per_page as usize))
            .await?;

        let items = normalize_all(&page.items, normalize_meeting);
        Ok(listing(items, page.next_cursor))
    }

    /// One meeting with summary, action items and CRM matches.
    ///
    /// The API has no single-meeting endpoint, so the listing is walked until the recording
    /// shows up. A summary missing from the listing is fetched from the summary endpoint.
    pub async fn get_meeting_details(&self, recording_id: u64) -> Result<Value> {
        let query = MeetingQuery {
            include_summary: Some(true),
            include_action_items: Some(true),
            include_crm_matches: Some(true),
            limit: Some(MAX_PER_PAGE),
            ..MeetingQuery::default()
        };
        let mut raw = self
            .find_meeting(recording_id, &query)
            .await?
            .ok_or(ToolError::MeetingNotFound(recording_id))?;

        let mut meeting = normalize_meeting(&raw)?;
        if meeting.summary.is_none() {
            if let Some(summary) = self.fetch_summary(recording_id).await {
                if let Some(map) = raw.as_object_mut() {
                    map.insert("default_summary".to_string(), summary);
                }
                meeting = normalize_meeting(&raw)?;
            }
        }
        Ok(json!(meeting))
    }

    /// Transcript utterances, with the meeting's title, participants and times when the meeting
    /// can be located. The meeting lookup is best effort.
    pub async fn get_meeting_transcript(&self, recording_id: u64) -> Result<Value> {
        let raw = self.api.recording_transcript(recording_id).await?;

        let query = MeetingQuery {
            limit: Some(MAX_PER_PAGE),
            ..MeetingQuery::default()
        };
        let meeting: Option<Meeting> = match self.find_meeting(recording_id, &query).await {
            Ok(found) => found.and_then(|raw| match normalize_meeting(&raw) {
                Ok(meeting) => Some(meeting),
                Err(err) => {
                    warn!("meeting context for recording {recording_id} unusable: {err}");
                    None
                }
            }),
            Err(err) => {
                warn!("meeting context for recording {recording_id} unavailable: {err}");
                None
            }
        };

        let transcript = normalize_transcript(recording_id, &raw, meeting.as_ref())?;
        Ok(json!(transcript))
    }

    pub async fn search_meetings(&self, request: SearchMeetingsRequest) -> Result<Value> {
        let result = self
            .search
            .search(&request.query, request.include_transcript.unwrap_or(false))
            .await?;
        Ok(json!(result))
    }

    pub async fn list_teams(&self, request: ListTeamsRequest) -> Result<Value> {
        let per_page = self.per_page(request.per_page);
        let source = TeamPages::new(self.api.as_ref(), Some(per_page));
        let page = self
            .aggregator
            .aggregate(&source, request.cursor.as_deref(), Some(per_page as usize))
            .await?;

        // Team names are unique, but a remote paging by offset can repeat one across pages.
        let mut seen = HashSet::new();
        let mut items = normalize_all(&page.items, normalize_team);
        items.retain(|team: &Team| seen.insert(team.name.clone()));
        Ok(listing(items, page.next_cursor))
    }

    pub async fn list_team_members(&self, request: ListTeamMembersRequest) -> Result<Value> {
        let per_page = self.per_page(request.per_page);
        let team = request
            .team
            .as_deref()
            .map(str::trim)
            .filter(|team| !team.is_empty());
        let source = TeamMemberPages::new(self.api.as_ref(), team, Some(per_page));
        let page = self
            .aggregator
            .aggregate(&source, request.cursor.as_deref(), Some(per_page as usize))
            .await?;

        let items = normalize_all(&page.items, |raw| normalize_team_member(raw, team));
        Ok(listing(items, page.next_cursor))
    }

    async fn find_meeting(&self, recording_id: u64, query: &MeetingQuery) -> Result<Option<Value>> {
        let source = MeetingPages::new(self.api.as_ref(), query);
        let found = self
            .aggregator
            .find(&source, |raw| {
                raw.get("recording_id").and_then(Value::as_u64) == Some(recording_id)
            })
            .await?;
        Ok(found)
    }

    async fn fetch_summary(&self, recording_id: u64) -> Option<Value> {
        match self.api.recording_summary(recording_id).await {
            Ok(body) => body.get("summary").cloned().filter(|s| !s.is_null()),
            Err(err) => {
                debug!("summary for recording {recording_id} unavailable: {err}");
                None
            }
        }
    }
}

/// Normalize every fragment, skipping (and logging) the malformed ones.
fn normalize_all<T, F>(raw: &[Value], normalize: F) -> Vec<T>
where
    F: Fn(&Value) -> fathom_records::Result<T>,
{
    raw.iter()
        .filter_map(|item| match normalize(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("skipping record: {err}");
                None
            }
        })
        .collect()
}

fn listing<T: Serialize>(items: Vec<T>, next_cursor: Option<String>) -> Value {
    json!({
        "count": items.len(),
        "items": items,
        "next_cursor": next_cursor,
    })
}
