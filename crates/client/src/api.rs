//! The remote operations the server depends on, independent of the HTTP transport.

use crate::error::{ApiError, Result};
use async_trait::async_trait;
use serde_json::Value;

/// One page of a cursor-paginated listing. `next_cursor` is forwarded verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_cursor: Option<String>,
}

impl Page {
    pub fn new(items: Vec<Value>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    /// Parse a listing body: `{"items": [...], "next_cursor": "..."}`. Older responses name the
    /// cursor `cursor`; an empty cursor means there are no further pages.
    pub fn from_body(body: Value) -> Result<Self> {
        let Value::Object(mut map) = body else {
            return Err(ApiError::InvalidResponse(
                "listing body is not an object".to_string(),
            ));
        };
        let items = match map.remove("items") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => {
                return Err(ApiError::InvalidResponse(
                    "listing body has no 'items' array".to_string(),
                ))
            }
            Some(_) => {
                return Err(ApiError::InvalidResponse(
                    "listing 'items' is not an array".to_string(),
                ))
            }
        };
        let next_cursor = ["next_cursor", "cursor"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .filter(|cursor| !cursor.is_empty())
            .map(str::to_string);
        Ok(Self { items, next_cursor })
    }
}

/// Filters and inclusion flags for `GET /meetings`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeetingQuery {
    pub calendar_invitees: Vec<String>,
    pub calendar_invitees_domains: Vec<String>,
    pub calendar_invitees_domains_type: Option<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub recorded_by: Vec<String>,
    pub teams: Vec<String>,
    pub include_summary: Option<bool>,
    pub include_action_items: Option<bool>,
    pub include_crm_matches: Option<bool>,
    pub include_transcript: Option<bool>,
    pub limit: Option<u32>,
}

impl MeetingQuery {
    /// Query-string pairs in the remote's naming (`calendar_invitees[]=a&calendar_invitees[]=b`).
    pub fn to_params(&self, cursor: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let lists = [
            ("calendar_invitees[]", &self.calendar_invitees),
            ("calendar_invitees_domains[]", &self.calendar_invitees_domains),
            ("recorded_by[]", &self.recorded_by),
            ("teams[]", &self.teams),
        ];
        for (name, values) in lists {
            params.extend(
                values
                    .iter()
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .map(|v| (name, v.to_string())),
            );
        }

        let texts = [
            ("calendar_invitees_domains_type", &self.calendar_invitees_domains_type),
            ("created_after", &self.created_after),
            ("created_before", &self.created_before),
        ];
        for (name, value) in texts {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                params.push((name, value.to_string()));
            }
        }

        let flags = [
            ("include_summary", self.include_summary),
            ("include_action_items", self.include_action_items),
            ("include_crm_matches", self.include_crm_matches),
            ("include_transcript", self.include_transcript),
        ];
        for (name, flag) in flags {
            if let Some(flag) = flag {
                params.push((name, flag.to_string()));
            }
        }

        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            params.push(("cursor", cursor.to_string()));
        }
        params
    }
}

/// Read-only Fathom operations. Implemented over HTTP by [`crate::FathomClient`] and by in-memory
/// fakes in tests.
#[async_trait]
pub trait MeetingApi: Send + Sync {
    async fn meetings_page(&self, query: &MeetingQuery, cursor: Option<&str>) -> Result<Page>;

    /// Raw `/recordings/{id}/transcript` body.
    async fn recording_transcript(&self, recording_id: u64) -> Result<Value>;

    /// Raw `/recordings/{id}/summary` body.
    async fn recording_summary(&self, recording_id: u64) -> Result<Value>;

    async fn teams_page(&self, cursor: Option<&str>, limit: Option<u32>) -> Result<Page>;

    async fn team_members_page(
        &self,
        team: Option<&str>,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Page>;
}
