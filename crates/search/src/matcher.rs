use fathom_records::Meeting;

/// Lower-cased search needle. Matching is a plain case-insensitive substring test: no
/// tokenization, stemming or ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Needle(String);

impl Needle {
    /// `None` for a blank query. Surrounding whitespace is part of the needle.
    pub fn new(query: &str) -> Option<Self> {
        if query.trim().is_empty() {
            return None;
        }
        Some(Self(query.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_in(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.0)
    }

    /// Metadata match: title, participant names and emails, teams, topics, summary.
    pub fn matches_meeting(&self, meeting: &Meeting) -> bool {
        let participants = meeting
            .participants
            .iter()
            .flat_map(|p| [p.name.as_deref(), p.email.as_deref()])
            .flatten();

        meeting
            .title
            .as_deref()
            .into_iter()
            .chain(participants)
            .chain(meeting.teams.iter().map(String::as_str))
            .chain(meeting.topics.iter().map(String::as_str))
            .chain(meeting.summary.as_deref())
            .any(|field| self.is_in(field))
    }
}
