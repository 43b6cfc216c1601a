use anyhow::{Context, Result};
use rmcp::{model::CallToolRequestParam, service::ServiceExt, transport::TokioChildProcess};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

fn locate_fathom_mcp_bin() -> Result<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_fathom-mcp") {
        return Ok(PathBuf::from(path));
    }

    // `.../target/{debug|release}/deps/<test>` → `.../target/{debug|release}/fathom-mcp`
    if let Ok(exe) = std::env::current_exe() {
        if let Some(target_profile_dir) = exe.parent().and_then(|p| p.parent()) {
            let candidate = target_profile_dir.join("fathom-mcp");
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let repo_root = manifest_dir
        .ancestors()
        .nth(2)
        .context("failed to resolve repo root from CARGO_MANIFEST_DIR")?;
    for rel in ["target/debug/fathom-mcp", "target/release/fathom-mcp"] {
        let candidate = repo_root.join(rel);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    anyhow::bail!("failed to locate fathom-mcp binary")
}

fn server_command(bin: PathBuf) -> Command {
    let mut cmd = Command::new(bin);
    cmd.env("FATHOM_API_KEY", "test-key");
    // Nothing listens on the discard port, so any request fails fast without leaving the host.
    cmd.env("FATHOM_BASE_URL", "http://127.0.0.1:9");
    cmd.env("NO_PROXY", "*");
    cmd.env("no_proxy", "*");
    cmd.env("FATHOM_TIMEOUT", "2");
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[tokio::test]
async fn mcp_exposes_meeting_tools_and_reports_errors_as_results() -> Result<()> {
    let bin = locate_fathom_mcp_bin()?;

    let transport = TokioChildProcess::new(server_command(bin)).context("spawn mcp server")?;
    let service = tokio::time::timeout(Duration::from_secs(10), ().serve(transport))
        .await
        .context("timeout starting MCP server")??;

    let tools = tokio::time::timeout(
        Duration::from_secs(10),
        service.list_tools(Default::default()),
    )
    .await
    .context("timeout listing tools")??;
    let tool_names: HashSet<&str> = tools.tools.iter().map(|t| t.name.as_ref()).collect();
    for expected in [
        "list_meetings",
        "get_meeting_details",
        "get_meeting_transcript",
        "search_meetings",
        "list_teams",
        "list_team_members",
    ] {
        assert!(
            tool_names.contains(expected),
            "missing tool '{expected}' (available: {tool_names:?})"
        );
    }
    assert_eq!(tool_names.len(), 6, "unexpected tools: {tool_names:?}");

    // A blank query is answered locally.
    let search_args = serde_json::json!({ "query": "   " });
    let search_result = tokio::time::timeout(
        Duration::from_secs(10),
        service.call_tool(CallToolRequestParam {
            name: "search_meetings".into(),
            arguments: search_args.as_object().cloned(),
        }),
    )
    .await
    .context("timeout calling search_meetings")??;

    assert_ne!(
        search_result.is_error,
        Some(true),
        "search_meetings returned error"
    );
    let search_text = search_result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.as_str())
        .context("search_meetings missing text output")?;
    assert!(
        search_text.contains("total_matches: 0"),
        "unexpected search output: {search_text}"
    );
    assert!(
        search_text.contains("searched_transcripts: false"),
        "unexpected search output: {search_text}"
    );
    assert!(!search_text.contains("items"), "empty items should be pruned");

    // An unreachable API surfaces as a tool error, not a protocol error.
    let teams_result = tokio::time::timeout(
        Duration::from_secs(20),
        service.call_tool(CallToolRequestParam {
            name: "list_teams".into(),
            arguments: serde_json::json!({}).as_object().cloned(),
        }),
    )
    .await
    .context("timeout calling list_teams")??;

    assert_eq!(teams_result.is_error, Some(true), "list_teams should fail");
    let teams_text = teams_result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.as_str())
        .context("list_teams missing text output")?;
    assert!(
        teams_text.starts_with("error: network"),
        "unexpected error output: {teams_text}"
    );
    let code = teams_result
        .structured_content
        .as_ref()
        .and_then(|v| v.pointer("/error/code"))
        .and_then(|v| v.as_str());
    assert_eq!(code, Some("network"));

    service.cancel().await.context("shutdown mcp service")?;
    Ok(())
}

#[tokio::test]
async fn server_refuses_to_start_without_an_api_key() -> Result<()> {
    let bin = locate_fathom_mcp_bin()?;

    let output = tokio::time::timeout(
        Duration::from_secs(10),
        Command::new(bin)
            .env_remove("FATHOM_API_KEY")
            .env("RUST_LOG", "off")
            .stdin(std::process::Stdio::null())
            .output(),
    )
    .await
    .context("timeout waiting for server exit")??;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("FATHOM_API_KEY is not set"),
        "unexpected stderr: {stderr}"
    );
    Ok(())
}
