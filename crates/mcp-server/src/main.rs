//! Pusher Channels MCP Server
//!
//! Exposes the Pusher Channels admin API to AI agents via MCP protocol.
//!
//! ## Tools
//!
//! - `trigger_event` - Push an event to one or more channels
//! - `trigger_batch_events` - Push up to 10 events in one API call
//! - `list_channels` - List active channels with optional counts
//! - `get_channel_info` - Occupancy details for a single channel
//! - `get_presence_users` - Users connected to a presence channel
//! - `authorize_channel` - Mint a private/presence subscription token
//! - `terminate_user_connections` - Force a user offline everywhere
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "pusher": {
//!       "command": "pusher-mcp",
//!       "env": {
//!         "PUSHER_APP_ID": "...",
//!         "PUSHER_KEY": "...",
//!         "PUSHER_SECRET": "...",
//!         "PUSHER_CLUSTER": "us2"
//!       }
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

mod tools;

use tools::PusherService;

#[tokio::main]
async fn main() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    log::info!("Starting Pusher Channels MCP server");

    let service = PusherService::new();
    let server = service.serve(stdio()).await?;

    // Wait for shutdown
    server.waiting().await?;

    log::info!("Pusher Channels MCP server stopped");
    Ok(())
}
