//! Cursor-driven aggregation of paginated listings.

use crate::api::{MeetingApi, MeetingQuery, Page};
use crate::error::Result;
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;

pub const DEFAULT_MAX_PAGES: usize = 10;

/// Anything that can fetch one page given a cursor.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page>;
}

/// Items gathered across pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregated {
    pub items: Vec<Value>,
    /// Cursor continuing right after the last gathered page, when more remain.
    pub next_cursor: Option<String>,
    pub pages: usize,
    /// The hop bound stopped the walk while the remote still had pages.
    pub hop_limit_reached: bool,
}

/// Walks cursors sequentially, one request at a time, with a bound on the number of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageAggregator {
    max_pages: usize,
}

impl Default for PageAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGES)
    }
}

impl PageAggregator {
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages: max_pages.max(1),
        }
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Gather pages starting at `start` until the remote runs out, `limit` items are held, or
    /// the hop bound is hit.
    ///
    /// Pages are never split: if `limit` is crossed mid-page the whole page is kept, so the
    /// returned cursor resumes exactly after it. `limit` is therefore a floor for stopping, not a
    /// cap: callers also ask the remote for `limit` items per page, and a remote that ignores
    /// that page size makes a listing return more than `limit` items. Any fetch error aborts the
    /// walk and the items gathered so far are dropped.
    pub async fn aggregate<S>(
        &self,
        source: &S,
        start: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Aggregated>
    where
        S: PageSource + ?Sized,
    {
        let mut cursor = start.filter(|c| !c.is_empty()).map(str::to_string);
        let mut out = Aggregated::default();

        loop {
            let page = source.fetch(cursor.as_deref()).await?;
            out.pages += 1;
            let fetched = page.items.len();
            out.items.extend(page.items);
            debug!(
                "page {} returned {fetched} items ({} total)",
                out.pages,
                out.items.len()
            );

            let Some(next) = page.next_cursor.filter(|c| !c.is_empty()) else {
                break;
            };
            if cursor.as_deref() == Some(next.as_str()) {
                warn!("remote returned the cursor it was given; stopping pagination");
                break;
            }
            if fetched == 0 || limit.is_some_and(|limit| out.items.len() >= limit) {
                out.next_cursor = Some(next);
                break;
            }
            if out.pages >= self.max_pages {
                warn!(
                    "stopped after {} pages with more results available",
                    self.max_pages
                );
                out.next_cursor = Some(next);
                out.hop_limit_reached = true;
                break;
            }
            cursor = Some(next);
        }

        Ok(out)
    }

    /// First item matching `predicate`, walking pages under the same hop bound.
    pub async fn find<S, P>(&self, source: &S, mut predicate: P) -> Result<Option<Value>>
    where
        S: PageSource + ?Sized,
        P: FnMut(&Value) -> bool,
    {
        let mut cursor: Option<String> = None;

        for hop in 1..=self.max_pages {
            let page = source.fetch(cursor.as_deref()).await?;
            let Page { items, next_cursor } = page;
            if let Some(found) = items.into_iter().find(|item| predicate(item)) {
                debug!("match found on page {hop}");
                return Ok(Some(found));
            }

            match next_cursor.filter(|c| !c.is_empty()) {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => return Ok(None),
            }
        }

        warn!(
            "no match within {} pages; more results were available",
            self.max_pages
        );
        Ok(None)
    }
}

/// `/meetings` pages for a fixed query.
pub struct MeetingPages<'a> {
    api: &'a dyn MeetingApi,
    query: &'a MeetingQuery,
}

impl<'a> MeetingPages<'a> {
    pub fn new(api: &'a dyn MeetingApi, query: &'a MeetingQuery) -> Self {
        Self { api, query }
    }
}

#[async_trait]
impl PageSource for MeetingPages<'_> {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page> {
        self.api.meetings_page(self.query, cursor).await
    }
}

/// `/teams` pages.
pub struct TeamPages<'a> {
    api: &'a dyn MeetingApi,
    limit: Option<u32>,
}

impl<'a> TeamPages<'a> {
    pub fn new(api: &'a dyn MeetingApi, limit: Option<u32>) -> Self {
        Self { api, limit }
    }
}

#[async_trait]
impl PageSource for TeamPages<'_> {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page> {
        self.api.teams_page(cursor, self.limit).await
    }
}

/// `/team_members` pages, optionally scoped to one team.
pub struct TeamMemberPages<'a> {
    api: &'a dyn MeetingApi,
    team: Option<&'a str>,
    limit: Option<u32>,
}

impl<'a> TeamMemberPages<'a> {
    pub fn new(api: &'a dyn MeetingApi, team: Option<&'a str>, limit: Option<u32>) -> Self {
        Self { api, team, limit }
    }
}

#[async_trait]
impl PageSource for TeamMemberPages<'_> {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page> {
        self.api.team_members_page(self.team, cursor, self.limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves `pages` in order; page `i` is requested with cursor `c{i}` (none for the first).
    struct ScriptedSource {
        pages: Vec<Result<Page>>,
        requested: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<Page>>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn uniform(pages: usize, per_page: usize) -> Self {
            Self::new(
                (0..pages)
                    .map(|p| {
                        let items = (0..per_page)
                            .map(|i| json!({ "recording_id": p * per_page + i }))
                            .collect();
                        let next = (p + 1 < pages).then(|| format!("c{}", p + 1));
                        Ok(Page::new(items, next))
                    })
                    .collect(),
            )
        }

        fn requested(&self) -> Vec<Option<String>> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch(&self, cursor: Option<&str>) -> Result<Page> {
            let index = match cursor {
                None => 0,
                Some(c) => c.trim_start_matches('c').parse::<usize>().unwrap(),
            };
            self.requested
                .lock()
                .unwrap()
                .push(cursor.map(str::to_string));
            self.pages[index].clone()
        }
    }

    fn ids(items: &[Value]) -> Vec<u64> {
        items
            .iter()
            .map(|item| item["recording_id"].as_u64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn gathers_every_page_in_order() {
        let source = ScriptedSource::uniform(3, 10);
        let out = PageAggregator::default()
            .aggregate(&source, None, None)
            .await
            .unwrap();

        assert_eq!(ids(&out.items), (0..30).collect::<Vec<_>>());
        assert_eq!(out.pages, 3);
        assert_eq!(out.next_cursor, None);
        assert!(!out.hop_limit_reached);
        assert_eq!(
            source.requested(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn failure_on_a_later_page_discards_everything() {
        let source = ScriptedSource::new(vec![
            Ok(Page::new(vec![json!({ "recording_id": 1 })], Some("c1".into()))),
            Err(ApiError::UpstreamServer {
                status: 500,
                message: "boom".into(),
            }),
        ]);
        let err = PageAggregator::default()
            .aggregate(&source, None, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), fathom_protocol::ErrorKind::UpstreamServer);
    }

    #[tokio::test]
    async fn limit_keeps_whole_pages_and_returns_the_resume_cursor() {
        let source = ScriptedSource::uniform(3, 10);
        let out = PageAggregator::default()
            .aggregate(&source, None, Some(15))
            .await
            .unwrap();

        assert_eq!(out.items.len(), 20);
        assert_eq!(out.next_cursor.as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn start_cursor_is_forwarded() {
        let source = ScriptedSource::uniform(3, 2);
        let out = PageAggregator::default()
            .aggregate(&source, Some("c1"), None)
            .await
            .unwrap();

        assert_eq!(ids(&out.items), vec![2, 3, 4, 5]);
        assert_eq!(source.requested()[0].as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn hop_bound_yields_a_flagged_partial_result() {
        let source = ScriptedSource::uniform(5, 1);
        let out = PageAggregator::new(2)
            .aggregate(&source, None, None)
            .await
            .unwrap();

        assert_eq!(ids(&out.items), vec![0, 1]);
        assert!(out.hop_limit_reached);
        assert_eq!(out.next_cursor.as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn repeated_cursor_stops_the_walk() {
        let source = ScriptedSource::new(vec![
            Ok(Page::new(vec![json!({ "recording_id": 0 })], Some("c1".into()))),
            Ok(Page::new(vec![json!({ "recording_id": 1 })], Some("c1".into()))),
        ]);
        let out = PageAggregator::default()
            .aggregate(&source, None, None)
            .await
            .unwrap();

        assert_eq!(ids(&out.items), vec![0, 1]);
        assert_eq!(out.next_cursor, None);
        assert_eq!(out.pages, 2);
    }

    #[tokio::test]
    async fn find_stops_at_the_first_match() {
        let source = ScriptedSource::uniform(3, 10);
        let found = PageAggregator::default()
            .find(&source, |item| item["recording_id"] == json!(12))
            .await
            .unwrap();

        assert_eq!(found, Some(json!({ "recording_id": 12 })));
        assert_eq!(source.requested().len(), 2);
    }

    #[tokio::test]
    async fn find_reports_absence() {
        let source = ScriptedSource::uniform(2, 3);
        let found = PageAggregator::default()
            .find(&source, |item| item["recording_id"] == json!(99))
            .await
            .unwrap();
        assert_eq!(found, None);
    }
}
