//! Fathom MCP Server
//!
//! Read-only access to Fathom meeting recordings for AI agents via the MCP protocol.
//!
//! ## Tools
//!
//! - `list_meetings` - Browse meetings with filters and cursors
//! - `get_meeting_details` - One meeting with summary, action items and CRM matches
//! - `get_meeting_transcript` - Speaker-attributed transcript of a meeting
//! - `search_meetings` - Keyword search, optionally across transcripts
//! - `list_teams` / `list_team_members` - Organization structure
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "fathom": {
//!       "command": "fathom-mcp",
//!       "env": { "FATHOM_API_KEY": "..." }
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

mod config;
mod tools;

use config::ServerConfig;
use tools::FathomService;

#[tokio::main]
async fn main() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = ServerConfig::from_env()?;
    log::info!(
        "Starting Fathom MCP server (base url {}, output {})",
        config.base_url,
        config.output_format.as_str()
    );

    let service = FathomService::new(&config)?;
    let server = service.serve(stdio()).await?;

    // Wait for shutdown
    server.waiting().await?;

    log::info!("Fathom MCP server stopped");
    Ok(())
}
