use crate::api::{MeetingApi, MeetingQuery, Page};
use crate::error::{ApiError, Result};
use crate::retry::{with_retry, RetryPolicy};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.fathom.ai/external/v1";

const USER_AGENT: &str = concat!("fathom-mcp/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body quoted back in an error message.
const MAX_ERROR_BODY: usize = 200;

/// HTTP transport for the Fathom external API.
///
/// Every call is a single GET with the API key header; transient failures are retried according
/// to the default [`RetryPolicy`].
#[derive(Clone)]
pub struct FathomClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl FathomClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let mut key = HeaderValue::from_str(api_key.trim()).map_err(|_| {
            ApiError::Authentication("API key contains characters not allowed in a header".into())
        })?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let label = format!("GET {path}");
        with_retry(&self.retry, &label, || self.get_once(path, params)).await
    }

    async fn get_once(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url} ({} params)", params.len());

        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<Value>()
                .await
                .map_err(|e| ApiError::InvalidResponse(e.to_string()));
        }

        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status.as_u16(), &headers, &body))
    }
}

/// Map a non-success status to an error kind.
pub(crate) fn classify_status(status: u16, headers: &HeaderMap, body: &str) -> ApiError {
    match status {
        401 | 403 => ApiError::Authentication(
            error_message(body).unwrap_or_else(|| "Invalid API key".to_string()),
        ),
        404 => ApiError::NotFound(error_message(body).unwrap_or_else(|| "Resource not found".into())),
        429 => {
            let header = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
            };
            let detail = format!(
                "Limit: {}, Remaining: {}, Reset: {}",
                header("ratelimit-limit").unwrap_or("unknown"),
                header("ratelimit-remaining").unwrap_or("unknown"),
                header("ratelimit-reset").unwrap_or("unknown"),
            );
            let retry_after = header("retry-after")
                .or_else(|| header("ratelimit-reset"))
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            ApiError::RateLimited {
                detail,
                retry_after,
            }
        }
        500..=599 => ApiError::UpstreamServer {
            status,
            message: error_message(body).unwrap_or_else(|| "server error".to_string()),
        },
        _ => ApiError::InvalidRequest {
            status,
            message: error_message(body).unwrap_or_else(|| "request rejected".to_string()),
        },
    }
}

/// `message` (or `error`) from a JSON error body, else the trimmed body text.
fn error_message(body: &str) -> Option<String> {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["message", "error"]
            .iter()
            .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
    });
    let text = from_json.unwrap_or_else(|| body.trim().to_string());
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(MAX_ERROR_BODY).collect())
}

#[async_trait]
impl MeetingApi for FathomClient {
    async fn meetings_page(&self, query: &MeetingQuery, cursor: Option<&str>) -> Result<Page> {
        let body = self.get_json("/meetings", &query.to_params(cursor)).await?;
        Page::from_body(body)
    }

    async fn recording_transcript(&self, recording_id: u64) -> Result<Value> {
        self.get_json(&format!("/recordings/{recording_id}/transcript"), &[])
            .await
    }

    async fn recording_summary(&self, recording_id: u64) -> Result<Value> {
        self.get_json(&format!("/recordings/{recording_id}/summary"), &[])
            .await
    }

    async fn teams_page(&self, cursor: Option<&str>, limit: Option<u32>) -> Result<Page> {
        let body = self.get_json("/teams", &page_params(cursor, limit)).await?;
        Page::from_body(body)
    }

    async fn team_members_page(
        &self,
        team: Option<&str>,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Page> {
        let mut params = page_params(cursor, limit);
        if let Some(team) = team.map(str::trim).filter(|t| !t.is_empty()) {
            params.push(("team", team.to_string()));
        }
        let body = self.get_json("/team_members", &params).await?;
        Page::from_body(body)
    }
}

fn page_params(cursor: Option<&str>, limit: Option<u32>) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
        params.push(("cursor", cursor.to_string()));
    }
    if let Some(limit) = limit {
        params.push(("limit", limit.to_string()));
    }
    params
}
