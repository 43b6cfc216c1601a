//! Raw API fragments → unified records.
//!
//! Each normalizer projects the fields it understands into a JSON shape, runs [`deep_filter`]
//! over the projection and only then builds the typed record, so a record never holds an empty
//! placeholder. Unknown or mistyped optional fields are dropped; only a missing or mistyped
//! identifying field is an error.

use crate::error::{MalformedRecord, Result};
use crate::filter::deep_filter;
use crate::markdown::markdown_to_plain;
use crate::model::{Meeting, Team, TeamMember, Transcript, Utterance};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

const MEETING: &str = "meeting";
const TRANSCRIPT: &str = "transcript";
const TEAM: &str = "team";
const TEAM_MEMBER: &str = "team member";

/// CRM match groups as returned by the API, with the tag attached to each flattened entry.
const CRM_GROUPS: &[(&str, &str)] = &[
    ("contacts", "contact"),
    ("companies", "company"),
    ("deals", "deal"),
];

pub fn normalize_meeting(raw: &Value) -> Result<Meeting> {
    let recording_id = required_id(raw, MEETING, "recording_id")?;

    let title = match text(raw, "title") {
        Value::Null => text(raw, "meeting_title"),
        title => title,
    };

    let projection = json!({
        "recording_id": recording_id,
        "title": title,
        "url": text(raw, "url"),
        "share_url": text(raw, "share_url"),
        "created_at": text(raw, "created_at"),
        "scheduled_start_time": text(raw, "scheduled_start_time"),
        "scheduled_end_time": text(raw, "scheduled_end_time"),
        "recording_start_time": text(raw, "recording_start_time"),
        "recording_end_time": text(raw, "recording_end_time"),
        "transcript_language": text(raw, "transcript_language"),
        "participants": participants(raw.get("calendar_invitees")),
        "recorded_by": recorder(raw.get("recorded_by")),
        "teams": unique_names(raw.get("teams")),
        "topics": names(raw.get("topics")),
        "sentiment": raw.get("sentiment").cloned().unwrap_or(Value::Null),
        "crm_matches": crm_matches(raw.get("crm_matches")),
        "action_items": action_items(raw.get("action_items")),
        "summary": summary(raw),
        "transcript": utterances(raw.get("transcript")),
    });

    build(projection, MEETING)
}

/// Normalize a `/recordings/{id}/transcript` body.
///
/// The transcript endpoint only returns utterances; when the owning meeting is known its title,
/// participants and timestamps are carried over.
pub fn normalize_transcript(
    recording_id: u64,
    raw: &Value,
    meeting: Option<&Meeting>,
) -> Result<Transcript> {
    let lines = match raw {
        Value::Array(_) => raw,
        Value::Object(map) => match map.get("transcript") {
            None | Some(Value::Null) => return Err(MalformedRecord::missing(TRANSCRIPT, "transcript")),
            Some(lines @ Value::Array(_)) => lines,
            Some(_) => return Err(MalformedRecord::wrong_kind(TRANSCRIPT, "transcript")),
        },
        _ => return Err(MalformedRecord::wrong_kind(TRANSCRIPT, "transcript")),
    };

    let mut projection = json!({
        "recording_id": recording_id,
        "utterances": utterances(Some(lines)),
    });
    if let (Some(meeting), Value::Object(map)) = (meeting, &mut projection) {
        map.insert("title".into(), json!(meeting.title));
        map.insert("participants".into(), json!(meeting.participants));
        map.insert("scheduled_start_time".into(), json!(meeting.scheduled_start_time));
        map.insert("scheduled_end_time".into(), json!(meeting.scheduled_end_time));
        map.insert("recording_start_time".into(), json!(meeting.recording_start_time));
        map.insert("recording_end_time".into(), json!(meeting.recording_end_time));
    }

    build(projection, TRANSCRIPT)
}

pub fn normalize_team(raw: &Value) -> Result<Team> {
    let name = required_text(raw, TEAM, "name")?;
    build(
        json!({ "name": name, "created_at": text(raw, "created_at") }),
        TEAM,
    )
}

/// Normalize a team member. `team_filter` is the team the listing was scoped to, if any; the API
/// does not repeat it on each member.
pub fn normalize_team_member(raw: &Value, team_filter: Option<&str>) -> Result<TeamMember> {
    let email = required_text(raw, TEAM_MEMBER, "email")?;

    let mut teams = unique_names(raw.get("teams"));
    if let Some(team) = raw.get("team").and_then(Value::as_str) {
        push_unique(&mut teams, team);
    }
    if let Some(team) = team_filter.map(str::trim).filter(|t| !t.is_empty()) {
        push_unique(&mut teams, team);
    }

    build(
        json!({
            "name": text(raw, "name"),
            "email": email,
            "created_at": text(raw, "created_at"),
            "teams": teams,
        }),
        TEAM_MEMBER,
    )
}

fn build<T: DeserializeOwned>(projection: Value, entity: &'static str) -> Result<T> {
    serde_json::from_value(deep_filter(projection))
        .map_err(|_| MalformedRecord::wrong_kind(entity, "record"))
}

fn required_id(raw: &Value, entity: &'static str, field: &'static str) -> Result<u64> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(MalformedRecord::missing(entity, field)),
        Some(value) => value
            .as_u64()
            .ok_or_else(|| MalformedRecord::wrong_kind(entity, field)),
    }
}

fn required_text(raw: &Value, entity: &'static str, field: &'static str) -> Result<String> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(MalformedRecord::missing(entity, field)),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(MalformedRecord::missing(entity, field))
        }
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(MalformedRecord::wrong_kind(entity, field)),
    }
}

/// String field or `null`; mistyped values are dropped.
fn text(raw: &Value, key: &str) -> Value {
    match raw.get(key) {
        Some(Value::String(s)) => Value::String(s.trim().to_string()),
        _ => Value::Null,
    }
}

fn flag(raw: &Value, key: &str) -> Value {
    match raw.get(key) {
        Some(Value::Bool(b)) => Value::Bool(*b),
        _ => Value::Null,
    }
}

fn participant(raw: &Value) -> Value {
    json!({
        "name": text(raw, "name"),
        "email": text(raw, "email"),
        "is_external": flag(raw, "is_external"),
    })
}

fn participants(raw: Option<&Value>) -> Value {
    let Some(Value::Array(items)) = raw else {
        return Value::Null;
    };
    Value::Array(items.iter().filter(|i| i.is_object()).map(participant).collect())
}

fn recorder(raw: Option<&Value>) -> Value {
    match raw {
        Some(raw @ Value::Object(_)) => json!({
            "name": text(raw, "name"),
            "email": text(raw, "email"),
            "team": text(raw, "team"),
        }),
        _ => Value::Null,
    }
}

/// A list entry given either as a bare string or as `{ "name": ... }`.
fn entry_name(entry: &Value) -> Option<&str> {
    let name = match entry {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("name").and_then(Value::as_str),
        _ => None,
    };
    name.map(str::trim).filter(|s| !s.is_empty())
}

fn names(raw: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(entry_name)
        .map(str::to_string)
        .collect()
}

fn unique_names(raw: Option<&Value>) -> Vec<String> {
    let mut out = Vec::new();
    for name in names(raw) {
        push_unique(&mut out, &name);
    }
    out
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|existing| existing == name) {
        out.push(name.to_string());
    }
}

fn crm_matches(raw: Option<&Value>) -> Value {
    match raw {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        Some(Value::Object(groups)) => {
            let mut out = Vec::new();
            for (group, kind) in CRM_GROUPS {
                let Some(Value::Array(entries)) = groups.get(*group) else {
                    continue;
                };
                for entry in entries {
                    let Value::Object(fields) = entry else {
                        continue;
                    };
                    let mut tagged = Map::new();
                    tagged.insert("kind".into(), Value::String((*kind).to_string()));
                    tagged.extend(fields.clone());
                    out.push(Value::Object(tagged));
                }
            }
            Value::Array(out)
        }
        _ => Value::Null,
    }
}

fn action_items(raw: Option<&Value>) -> Value {
    let Some(Value::Array(items)) = raw else {
        return Value::Null;
    };
    Value::Array(
        items
            .iter()
            .filter(|item| {
                item.get("description")
                    .and_then(Value::as_str)
                    .is_some_and(|d| !d.trim().is_empty())
            })
            .map(|item| {
                let assignee = match item.get("assignee") {
                    Some(a @ Value::Object(_)) => json!({
                        "name": text(a, "name"),
                        "email": text(a, "email"),
                    }),
                    _ => Value::Null,
                };
                json!({
                    "description": text(item, "description"),
                    "completed": flag(item, "completed"),
                    "user_generated": flag(item, "user_generated"),
                    "recording_timestamp": text(item, "recording_timestamp"),
                    "recording_playback_url": text(item, "recording_playback_url"),
                    "assignee": assignee,
                })
            })
            .collect(),
    )
}

fn summary(raw: &Value) -> Value {
    let markdown = match raw.get("default_summary") {
        Some(Value::Object(map)) => map.get("markdown_formatted").and_then(Value::as_str),
        Some(Value::String(s)) => Some(s.as_str()),
        _ => raw.get("summary").and_then(Value::as_str),
    };
    match markdown {
        Some(md) => Value::String(markdown_to_plain(md)),
        None => Value::Null,
    }
}

fn utterance(raw: &Value) -> Option<Utterance> {
    let text = raw.get("text")?.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    let (speaker, speaker_email) = match raw.get("speaker") {
        Some(Value::String(name)) => (Some(name.clone()), None),
        Some(speaker @ Value::Object(_)) => (
            speaker
                .get("display_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            speaker
                .get("matched_calendar_invitee_email")
                .and_then(Value::as_str)
                .map(str::to_string),
        ),
        _ => (None, None),
    };
    let timestamp = match raw.get("timestamp") {
        Some(Value::String(ts)) => Some(ts.trim().to_string()),
        Some(Value::Number(n)) => n.as_f64().map(format_offset),
        _ => None,
    };
    Some(Utterance {
        speaker: speaker.filter(|s| !s.trim().is_empty()),
        speaker_email: speaker_email.filter(|s| !s.trim().is_empty()),
        timestamp: timestamp.filter(|t| !t.is_empty()),
        text: text.to_string(),
    })
}

fn utterances(raw: Option<&Value>) -> Value {
    let Some(Value::Array(items)) = raw else {
        return Value::Null;
    };
    let mut lines: Vec<Utterance> = items.iter().filter_map(utterance).collect();
    order_by_offset(&mut lines);
    json!(lines)
}

/// Stable sort by start offset. Left untouched when any offset is missing or unparsable, since
/// there is then no total order to restore.
fn order_by_offset(lines: &mut [Utterance]) {
    let offsets: Option<Vec<u64>> = lines
        .iter()
        .map(|u| u.timestamp.as_deref().and_then(parse_offset_ms))
        .collect();
    let Some(offsets) = offsets else {
        return;
    };
    let mut keyed: Vec<(u64, Utterance)> = offsets.into_iter().zip(lines.iter().cloned()).collect();
    keyed.sort_by_key(|(offset, _)| *offset);
    for (slot, (_, line)) in lines.iter_mut().zip(keyed) {
        *slot = line;
    }
}

/// `HH:MM:SS`, `MM:SS` or `SS`, seconds may carry a fraction.
pub(crate) fn parse_offset_ms(raw: &str) -> Option<u64> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let (seconds, units) = parts.split_last()?;
    let seconds: f64 = seconds.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let mut minutes = 0u64;
    for unit in units {
        minutes = minutes.checked_mul(60)?.checked_add(unit.parse::<u64>().ok()?)?;
    }
    let whole_ms = minutes.checked_mul(60_000)?;
    Some(whole_ms.saturating_add((seconds * 1000.0).round() as u64))
}

fn format_offset(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}
