use super::error::ToolError;
use super::operations::MeetingTools;
use super::output::{tool_error, tool_success};
use super::schemas::{
    ListMeetingsRequest, ListTeamMembersRequest, ListTeamsRequest, RecordingRequest,
    SearchMeetingsRequest,
};
use crate::config::ServerConfig;
use anyhow::{Context as AnyhowContext, Result};
use fathom_client::{FathomClient, MeetingApi};
use fathom_protocol::OutputFormat;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde_json::Value;
use std::sync::Arc;

const INSTRUCTIONS: &str = "Read-only access to Fathom meeting recordings. Use 'list_meetings' \
to browse with filters and cursors, 'search_meetings' for keyword search (set include_transcript \
to also scan transcripts), 'get_meeting_details' for summary, action items and CRM matches, \
'get_meeting_transcript' for the spoken text, and 'list_teams' / 'list_team_members' for the \
organization. Responses are compact TOON unless OUTPUT_FORMAT=json; empty fields are omitted.";

/// Fathom MCP service
#[derive(Clone)]
pub struct FathomService {
    tools: MeetingTools,
    output_format: OutputFormat,
    tool_router: ToolRouter<Self>,
}

impl FathomService {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = FathomClient::new(&config.api_key, &config.base_url, config.timeout)
            .context("Failed to build the Fathom HTTP client")?;
        log::debug!("Fathom API at {}", client.base_url());
        Ok(Self::with_api(Arc::new(client), config))
    }

    pub fn with_api(api: Arc<dyn MeetingApi>, config: &ServerConfig) -> Self {
        Self {
            tools: MeetingTools::new(api, config),
            output_format: config.output_format,
            tool_router: Self::tool_router(),
        }
    }

    fn respond(&self, tool: &str, outcome: std::result::Result<Value, ToolError>) -> CallToolResult {
        match outcome {
            Ok(payload) => tool_success(payload, self.output_format),
            Err(err) => {
                log::warn!("{tool} failed: {err}");
                tool_error(err.envelope())
            }
        }
    }
}

#[tool_router]
impl FathomService {
    #[tool(
        description = "List meetings, newest first, with optional filters (attendees, domains, recorder, teams, created_after/created_before). Returns items and a next_cursor for the following page."
    )]
    pub async fn list_meetings(
        &self,
        Parameters(request): Parameters<ListMeetingsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.tools.list_meetings(request).await;
        Ok(self.respond("list_meetings", outcome))
    }

    #[tool(
        description = "Get one meeting by recording_id with its summary, action items and CRM matches."
    )]
    pub async fn get_meeting_details(
        &self,
        Parameters(request): Parameters<RecordingRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.tools.get_meeting_details(request.recording_id).await;
        Ok(self.respond("get_meeting_details", outcome))
    }

    #[tool(
        description = "Get the transcript of a meeting by recording_id: speaker, timestamp and text per utterance."
    )]
    pub async fn get_meeting_transcript(
        &self,
        Parameters(request): Parameters<RecordingRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.tools.get_meeting_transcript(request.recording_id).await;
        Ok(self.respond("get_meeting_transcript", outcome))
    }

    #[tool(
        description = "Case-insensitive keyword search across meeting titles, attendees, teams, topics and summaries. With include_transcript=true, meetings that do not match are also checked against their transcripts (slower)."
    )]
    pub async fn search_meetings(
        &self,
        Parameters(request): Parameters<SearchMeetingsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.tools.search_meetings(request).await;
        Ok(self.respond("search_meetings", outcome))
    }

    #[tool(description = "List the teams in the organization.")]
    pub async fn list_teams(
        &self,
        Parameters(request): Parameters<ListTeamsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.tools.list_teams(request).await;
        Ok(self.respond("list_teams", outcome))
    }

    #[tool(description = "List team members, optionally only those of one team.")]
    pub async fn list_team_members(
        &self,
        Parameters(request): Parameters<ListTeamMembersRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.tools.list_team_members(request).await;
        Ok(self.respond("list_team_members", outcome))
    }
}

#[tool_handler]
impl ServerHandler for FathomService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}
