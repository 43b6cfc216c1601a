use async_trait::async_trait;
use fathom_client::{ApiError, MeetingApi, MeetingQuery, Page, PageAggregator};
use fathom_protocol::ErrorKind;
use fathom_search::SearchEngine;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory listing served `per_page` meetings at a time, cursors being offsets.
#[derive(Default)]
struct FakeApi {
    meetings: Vec<Value>,
    per_page: usize,
    transcripts: HashMap<u64, Value>,
    transcript_delay: Option<Duration>,
    listing_error: Option<ApiError>,
    listing_queries: Mutex<Vec<MeetingQuery>>,
    transcript_calls: AtomicUsize,
}

impl FakeApi {
    fn new(meetings: Vec<Value>) -> Self {
        Self {
            meetings,
            per_page: 50,
            ..Self::default()
        }
    }

    fn with_transcript(mut self, id: u64, lines: &[&str]) -> Self {
        let utterances: Vec<Value> = lines
            .iter()
            .enumerate()
            .map(|(i, text)| json!({ "speaker": { "display_name": "Ann" }, "text": text, "timestamp": format!("00:00:{:02}", i) }))
            .collect();
        self.transcripts.insert(id, json!({ "transcript": utterances }));
        self
    }

    fn listing_calls(&self) -> usize {
        self.listing_queries.lock().unwrap().len()
    }
}

#[async_trait]
impl MeetingApi for FakeApi {
    async fn meetings_page(
        &self,
        query: &MeetingQuery,
        cursor: Option<&str>,
    ) -> fathom_client::Result<Page> {
        self.listing_queries.lock().unwrap().push(query.clone());
        if let Some(err) = &self.listing_error {
            return Err(err.clone());
        }
        let start = cursor.map(|c| c.parse::<usize>().unwrap()).unwrap_or(0);
        let end = (start + self.per_page).min(self.meetings.len());
        let next = (end < self.meetings.len()).then(|| end.to_string());
        Ok(Page::new(self.meetings[start..end].to_vec(), next))
    }

    async fn recording_transcript(&self, recording_id: u64) -> fathom_client::Result<Value> {
        self.transcript_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.transcript_delay {
            tokio::time::sleep(delay).await;
        }
        self.transcripts
            .get(&recording_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("recording {recording_id}")))
    }

    async fn recording_summary(&self, _recording_id: u64) -> fathom_client::Result<Value> {
        Ok(json!({}))
    }

    async fn teams_page(
        &self,
        _cursor: Option<&str>,
        _limit: Option<u32>,
    ) -> fathom_client::Result<Page> {
        Ok(Page::default())
    }

    async fn team_members_page(
        &self,
        _team: Option<&str>,
        _cursor: Option<&str>,
        _limit: Option<u32>,
    ) -> fathom_client::Result<Page> {
        Ok(Page::default())
    }
}

/// Five meetings; only #3 mentions the budget in its metadata.
fn five_meetings() -> Vec<Value> {
    vec![
        json!({ "recording_id": 1, "title": "Kickoff", "topics": [] }),
        json!({ "recording_id": 2, "title": "Design review", "calendar_invitees": [{ "name": "Ann", "email": "ann@acme.com" }] }),
        json!({ "recording_id": 3, "title": "Q3 Budget planning", "sentiment": 0 }),
        json!({ "recording_id": 4, "title": "Hiring sync", "default_summary": { "markdown_formatted": "## Notes\nRoles" } }),
        json!({ "recording_id": 5, "title": "Customer call" }),
    ]
}

fn ids(result: &fathom_search::SearchResult) -> Vec<u64> {
    result.items.iter().map(|hit| hit.meeting.recording_id).collect()
}

#[tokio::test]
async fn title_match_without_transcripts() {
    let api = Arc::new(
        FakeApi::new(five_meetings()).with_transcript(5, &["the budget is tight"]),
    );
    let result = SearchEngine::new(api.clone())
        .search("budget", false)
        .await
        .unwrap();

    assert_eq!(result.total_matches, 1);
    assert!(!result.searched_transcripts);
    assert_eq!(ids(&result), vec![3]);
    assert_eq!(result.meetings_scanned, 5);
    assert_eq!(api.transcript_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transcript_match_is_embedded_and_order_is_kept() {
    let api = Arc::new(
        FakeApi::new(five_meetings())
            .with_transcript(1, &["welcome everyone"])
            .with_transcript(2, &["looks good"])
            .with_transcript(4, &["two roles open"])
            .with_transcript(5, &["hello", "the BUDGET is tight this quarter"]),
    );
    let result = SearchEngine::new(api.clone())
        .search("budget", true)
        .await
        .unwrap();

    assert_eq!(result.total_matches, 2);
    assert!(result.searched_transcripts);
    assert_eq!(ids(&result), vec![3, 5]);
    assert!(result.items[0].transcript.is_none());

    let transcript = result.items[1].transcript.as_ref().expect("embedded transcript");
    assert_eq!(transcript.recording_id, 5);
    assert_eq!(transcript.title.as_deref(), Some("Customer call"));
    assert_eq!(transcript.utterances.len(), 2);

    // Meeting #3 already matched on its title, so only the other four transcripts are fetched.
    assert_eq!(api.transcript_calls.load(Ordering::SeqCst), 4);
    assert_eq!(result.transcripts_skipped, 0);
}

#[tokio::test]
async fn unavailable_transcripts_are_skipped_and_counted() {
    let api = Arc::new(FakeApi::new(five_meetings()).with_transcript(5, &["budget talk"]));
    let result = SearchEngine::new(api)
        .with_transcript_concurrency(2)
        .search("budget", true)
        .await
        .unwrap();

    assert_eq!(ids(&result), vec![3, 5]);
    assert_eq!(result.transcripts_skipped, 3);
}

#[tokio::test]
async fn blank_query_does_not_touch_the_api() {
    let api = Arc::new(FakeApi::new(five_meetings()));
    let result = SearchEngine::new(api.clone())
        .search("   ", true)
        .await
        .unwrap();

    assert_eq!(result.total_matches, 0);
    assert!(result.items.is_empty());
    assert_eq!(api.listing_calls(), 0);
}

#[tokio::test]
async fn listing_is_aggregated_with_summaries_requested() {
    let mut api = FakeApi::new(five_meetings());
    api.per_page = 2;
    let api = Arc::new(api);
    let result = SearchEngine::new(api.clone())
        .search("roles", false)
        .await
        .unwrap();

    assert_eq!(ids(&result), vec![4]);
    assert_eq!(result.meetings_scanned, 5);
    assert_eq!(api.listing_calls(), 3);
    let first = api.listing_queries.lock().unwrap()[0].clone();
    assert_eq!(first.include_summary, Some(true));
    assert_eq!(first.include_crm_matches, Some(true));
}

#[tokio::test]
async fn hop_bound_marks_the_listing_truncated() {
    let mut api = FakeApi::new(five_meetings());
    api.per_page = 1;
    let result = SearchEngine::new(Arc::new(api))
        .with_page_aggregator(PageAggregator::new(3))
        .search("budget", false)
        .await
        .unwrap();

    assert_eq!(ids(&result), vec![3]);
    assert_eq!(result.meetings_scanned, 3);
    assert!(result.listing_truncated);
}

#[tokio::test]
async fn malformed_meetings_are_skipped() {
    let mut meetings = five_meetings();
    meetings.insert(1, json!({ "title": "budget without id" }));
    let result = SearchEngine::new(Arc::new(FakeApi::new(meetings)))
        .search("budget", false)
        .await
        .unwrap();

    assert_eq!(ids(&result), vec![3]);
    assert_eq!(result.meetings_scanned, 5);
}

#[tokio::test]
async fn listing_failure_is_surfaced() {
    let mut api = FakeApi::new(five_meetings());
    api.listing_error = Some(ApiError::Authentication("Invalid API key".into()));
    let err = SearchEngine::new(Arc::new(api))
        .search("budget", false)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn transcript_deadline_keeps_metadata_matches() {
    let mut api = FakeApi::new(five_meetings()).with_transcript(5, &["budget"]);
    api.transcript_delay = Some(Duration::from_secs(5));
    let result = SearchEngine::new(Arc::new(api))
        .with_transcript_deadline(Duration::from_millis(50))
        .search("budget", true)
        .await
        .unwrap();

    assert_eq!(ids(&result), vec![3]);
    assert!(result.transcript_search_incomplete);
}

#[tokio::test]
async fn quiet_fields_are_omitted_when_serialized() {
    let api = Arc::new(FakeApi::new(five_meetings()));
    let result = SearchEngine::new(api).search("budget", false).await.unwrap();
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(
        value,
        json!({
            "query": "budget",
            "items": [{ "recording_id": 3, "title": "Q3 Budget planning", "sentiment": 0 }],
            "total_matches": 1,
            "searched_transcripts": false,
            "meetings_scanned": 5,
        })
    );
}
