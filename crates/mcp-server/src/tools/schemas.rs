use fathom_client::MeetingQuery;
use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListMeetingsRequest {
    #[schemars(description = "Only meetings with these attendee email addresses")]
    pub calendar_invitees: Option<Vec<String>>,

    #[schemars(description = "Only meetings with attendees from these email domains")]
    pub calendar_invitees_domains: Option<Vec<String>>,

    #[schemars(
        description = "Attendee domain mix: 'all', 'only_internal' or 'one_or_more_external'"
    )]
    pub calendar_invitees_domains_type: Option<String>,

    #[schemars(description = "ISO 8601 timestamp; only meetings created after it")]
    pub created_after: Option<String>,

    #[schemars(description = "ISO 8601 timestamp; only meetings created before it")]
    pub created_before: Option<String>,

    #[schemars(description = "Only meetings recorded by these email addresses")]
    pub recorded_by: Option<Vec<String>>,

    #[schemars(description = "Only meetings belonging to these team names")]
    pub teams: Option<Vec<String>>,

    #[schemars(description = "Include the meeting summary")]
    pub include_summary: Option<bool>,

    #[schemars(description = "Include action items")]
    pub include_action_items: Option<bool>,

    #[schemars(description = "Include CRM contact, company and deal matches")]
    pub include_crm_matches: Option<bool>,

    #[schemars(description = "Include the full transcript (large)")]
    pub include_transcript: Option<bool>,

    #[schemars(description = "Opaque cursor from a previous response's next_cursor")]
    pub cursor: Option<String>,

    #[schemars(description = "Meetings per page (default from DEFAULT_PER_PAGE, max 100)")]
    pub per_page: Option<u32>,
}

impl ListMeetingsRequest {
    pub fn to_query(&self, per_page: u32) -> MeetingQuery {
        MeetingQuery {
            calendar_invitees: self.calendar_invitees.clone().unwrap_or_default(),
            calendar_invitees_domains: self.calendar_invitees_domains.clone().unwrap_or_default(),
            calendar_invitees_domains_type: self.calendar_invitees_domains_type.clone(),
            created_after: self.created_after.clone(),
            created_before: self.created_before.clone(),
            recorded_by: self.recorded_by.clone().unwrap_or_default(),
            teams: self.teams.clone().unwrap_or_default(),
            include_summary: self.include_summary,
            include_action_items: self.include_action_items,
            include_crm_matches: self.include_crm_matches,
            include_transcript: self.include_transcript,
            limit: Some(per_page),
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecordingRequest {
    #[schemars(description = "Recording identifier (recording_id from list_meetings or search)")]
    pub recording_id: u64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchMeetingsRequest {
    #[schemars(
        description = "Case-insensitive keyword matched against titles, attendees, teams, topics and summaries"
    )]
    pub query: String,

    #[schemars(
        description = "Also search transcripts of meetings whose metadata did not match (slow: one request per meeting)"
    )]
    pub include_transcript: Option<bool>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListTeamsRequest {
    #[schemars(description = "Opaque cursor from a previous response's next_cursor")]
    pub cursor: Option<String>,

    #[schemars(description = "Teams per page (default from DEFAULT_PER_PAGE, max 100)")]
    pub per_page: Option<u32>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListTeamMembersRequest {
    #[schemars(description = "Only members of this team")]
    pub team: Option<String>,

    #[schemars(description = "Opaque cursor from a previous response's next_cursor")]
    pub cursor: Option<String>,

    #[schemars(description = "Members per page (default from DEFAULT_PER_PAGE, max 100)")]
    pub per_page: Option<u32>,
}
