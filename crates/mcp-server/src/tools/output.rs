use fathom_protocol::{ErrorEnvelope, OutputFormat};
use fathom_records::deep_filter;
use log::warn;
use rmcp::model::{CallToolResult, Content};
use serde_json::{json, Value};

/// Prune the payload and serialize it in the configured format.
pub(super) fn render(payload: Value, format: OutputFormat) -> String {
    let filtered = deep_filter(payload);
    match format {
        OutputFormat::Toon => fathom_toon::encode(&filtered),
        OutputFormat::Json => pretty_json(&filtered),
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| {
        warn!("failed to pretty-print payload: {err}");
        value.to_string()
    })
}

pub(super) fn tool_success(payload: Value, format: OutputFormat) -> CallToolResult {
    CallToolResult::success(vec![Content::text(render(payload, format))])
}

pub(super) fn tool_error(error: ErrorEnvelope) -> CallToolResult {
    let mut text = format!("error: {}\n{}", error.code, error.message);
    if let Some(hint) = error.hint.as_deref().filter(|h| !h.trim().is_empty()) {
        text.push_str("\nhint: ");
        text.push_str(hint);
    }
    let mut result = CallToolResult::error(vec![Content::text(text)]);
    result.structured_content = Some(json!({ "error": error }));
    result
}
