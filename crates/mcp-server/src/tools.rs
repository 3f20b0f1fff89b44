//! MCP tools for the Pusher Channels admin API.
//!
//! Exposes event triggering, channel inspection, channel authorization, and
//! connection termination to AI agents via MCP protocol.

use once_cell::sync::OnceCell;
use pusher_channels_client::{
    BatchEvent, ClientConfig, ClientError, PresenceData, PusherClient,
};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use std::sync::Arc;

const MAX_NAME_LEN: usize = 200;
const MAX_TRIGGER_CHANNELS: usize = 100;
const MAX_BATCH_EVENTS: usize = 10;

/// Pusher Channels MCP Service
#[derive(Clone)]
pub struct PusherService {
    /// Lazily constructed API client, shared across clones of the service.
    /// The cell guards first construction, so concurrent first use cannot
    /// build two clients; construction errors are not cached and the next
    /// call retries.
    client: Arc<OnceCell<PusherClient>>,
    /// Tool router
    tool_router: ToolRouter<Self>,
}

impl PusherService {
    pub fn new() -> Self {
        Self {
            client: Arc::new(OnceCell::new()),
            tool_router: Self::tool_router(),
        }
    }

    fn client(&self) -> Result<&PusherClient, ClientError> {
        self.client.get_or_try_init(|| {
            let config = ClientConfig::from_env()?;
            log::debug!("creating Pusher client for app {}", config.app_id);
            PusherClient::new(config)
        })
    }
}

#[tool_handler]
impl ServerHandler for PusherService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Pusher Channels admin tools. Use 'trigger_event' to push realtime messages to connected clients, 'list_channels' and 'get_channel_info' to inspect channel occupancy, 'get_presence_users' to see who is on a presence channel, 'authorize_channel' to mint private/presence subscription tokens, and 'terminate_user_connections' to force a user offline.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Tool Input Schemas
// ============================================================================

/// Target of a single trigger call: one channel name or an array of them.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum ChannelTarget {
    One(String),
    Many(Vec<String>),
}

impl ChannelTarget {
    fn names(&self) -> Vec<&str> {
        match self {
            ChannelTarget::One(name) => vec![name.as_str()],
            ChannelTarget::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }

    fn into_names(self) -> Vec<String> {
        match self {
            ChannelTarget::One(name) => vec![name],
            ChannelTarget::Many(names) => names,
        }
    }
}

/// Event payload: a string passes to the provider verbatim, an object is
/// JSON-encoded exactly once.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum EventData {
    Text(String),
    Object(serde_json::Map<String, serde_json::Value>),
}

impl EventData {
    fn into_payload(self) -> Result<String, serde_json::Error> {
        match self {
            EventData::Text(text) => Ok(text),
            EventData::Object(object) => serde_json::to_string(&object),
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TriggerEventRequest {
    #[schemars(description = "Channel name or array of channel names (max 100)")]
    pub channel: ChannelTarget,

    #[schemars(description = "Event name to trigger (e.g. 'new-message', 'update')")]
    pub event: String,

    #[schemars(description = "Event payload — string or JSON object (max 10KB)")]
    pub data: EventData,

    #[serde(rename = "socketId")]
    #[schemars(
        description = "Optional socket ID to exclude from receiving the event (prevents echo)"
    )]
    pub socket_id: Option<String>,
}

impl TriggerEventRequest {
    fn validate(&self) -> Result<(), McpError> {
        let names = self.channel.names();
        if names.is_empty() || names.len() > MAX_TRIGGER_CHANNELS {
            return Err(McpError::invalid_params(
                format!("channel must name between 1 and {MAX_TRIGGER_CHANNELS} channels"),
                None,
            ));
        }
        for name in names {
            require_length("channel", name, MAX_NAME_LEN)?;
        }
        require_length("event", &self.event, MAX_NAME_LEN)
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BatchEventInput {
    #[schemars(description = "Target channel name")]
    pub channel: String,

    #[schemars(description = "Event name")]
    pub name: String,

    #[schemars(description = "Event payload")]
    pub data: EventData,

    #[serde(rename = "socketId")]
    #[schemars(description = "Socket ID to exclude")]
    pub socket_id: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TriggerBatchEventsRequest {
    #[schemars(description = "Array of events to send (max 10)")]
    pub events: Vec<BatchEventInput>,
}

impl TriggerBatchEventsRequest {
    fn validate(&self) -> Result<(), McpError> {
        if self.events.is_empty() || self.events.len() > MAX_BATCH_EVENTS {
            return Err(McpError::invalid_params(
                format!("events must contain between 1 and {MAX_BATCH_EVENTS} events"),
                None,
            ));
        }
        for event in &self.events {
            require_length("channel", &event.channel, MAX_NAME_LEN)?;
            require_length("name", &event.name, MAX_NAME_LEN)?;
        }
        Ok(())
    }
}

/// Per-channel attributes that can be requested from the channels endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InfoAttribute {
    UserCount,
    SubscriptionCount,
}

impl InfoAttribute {
    fn as_str(self) -> &'static str {
        match self {
            InfoAttribute::UserCount => "user_count",
            InfoAttribute::SubscriptionCount => "subscription_count",
        }
    }
}

fn join_info(info: Option<&[InfoAttribute]>) -> Option<String> {
    let info = info?;
    if info.is_empty() {
        return None;
    }
    Some(
        info.iter()
            .map(|attribute| attribute.as_str())
            .collect::<Vec<_>>()
            .join(","),
    )
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListChannelsRequest {
    #[schemars(description = "Filter channels by prefix (e.g. 'presence-', 'private-chat-')")]
    pub prefix: Option<String>,

    #[schemars(description = "Additional attributes to include for each channel")]
    pub info: Option<Vec<InfoAttribute>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetChannelInfoRequest {
    #[schemars(description = "The channel name to query")]
    pub channel: String,

    #[schemars(description = "Additional attributes to request")]
    pub info: Option<Vec<InfoAttribute>>,
}

impl GetChannelInfoRequest {
    fn validate(&self) -> Result<(), McpError> {
        require_length("channel", &self.channel, MAX_NAME_LEN)
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetPresenceUsersRequest {
    #[schemars(description = "Presence channel name (must start with 'presence-')")]
    pub channel: String,
}

impl GetPresenceUsersRequest {
    fn validate(&self) -> Result<(), McpError> {
        require_length("channel", &self.channel, MAX_NAME_LEN)?;
        if !self.channel.starts_with("presence-") {
            return Err(McpError::invalid_params(
                "Channel must be a presence channel (starts with 'presence-')",
                None,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AuthorizeChannelRequest {
    #[serde(rename = "socketId")]
    #[schemars(description = "The socket ID from the client connection")]
    pub socket_id: String,

    #[schemars(
        description = "Private or presence channel name (must start with 'private-' or 'presence-')"
    )]
    pub channel: String,

    #[serde(rename = "presenceData")]
    #[schemars(description = "Required for presence channels — identifies the connecting user")]
    pub presence_data: Option<PresenceData>,
}

impl AuthorizeChannelRequest {
    fn validate(&self) -> Result<(), McpError> {
        if self.socket_id.is_empty() {
            return Err(McpError::invalid_params("socketId must not be empty", None));
        }
        require_length("channel", &self.channel, MAX_NAME_LEN)?;
        if let Some(presence) = &self.presence_data {
            if presence.user_id.is_empty() {
                return Err(McpError::invalid_params(
                    "presenceData.user_id must not be empty",
                    None,
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TerminateUserRequest {
    #[serde(rename = "userId")]
    #[schemars(description = "The user ID to disconnect from all channels")]
    pub user_id: String,
}

impl TerminateUserRequest {
    fn validate(&self) -> Result<(), McpError> {
        if self.user_id.is_empty() {
            return Err(McpError::invalid_params("userId must not be empty", None));
        }
        Ok(())
    }
}

fn require_length(field: &str, value: &str, max: usize) -> Result<(), McpError> {
    if value.is_empty() || value.chars().count() > max {
        return Err(McpError::invalid_params(
            format!("{field} must be between 1 and {max} characters"),
            None,
        ));
    }
    Ok(())
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl PusherService {
    /// Trigger an event on one or more channels
    #[tool(
        description = "Send an event to one or more Pusher channels. Use this to push realtime messages to connected clients."
    )]
    pub async fn trigger_event(
        &self,
        Parameters(request): Parameters<TriggerEventRequest>,
    ) -> Result<CallToolResult, McpError> {
        request.validate()?;

        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Failed to trigger event: {e}"
                ))]));
            }
        };

        let TriggerEventRequest {
            channel,
            event,
            data,
            socket_id,
        } = request;
        let channels = channel.into_names();
        let payload = match data.into_payload() {
            Ok(payload) => payload,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Failed to trigger event: {e}"
                ))]));
            }
        };

        match client
            .trigger(&channels, &event, &payload, socket_id.as_deref())
            .await
        {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Event \"{}\" triggered on {} channel(s): {}",
                event,
                channels.len(),
                channels.join(", ")
            ))])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to trigger event: {e}"
            ))])),
        }
    }

    /// Trigger up to 10 events in one API call
    #[tool(
        description = "Send up to 10 events in a single API call. More efficient than triggering events individually when you need to notify multiple channels."
    )]
    pub async fn trigger_batch_events(
        &self,
        Parameters(request): Parameters<TriggerBatchEventsRequest>,
    ) -> Result<CallToolResult, McpError> {
        request.validate()?;

        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Failed to trigger batch events: {e}"
                ))]));
            }
        };

        let mut batch = Vec::with_capacity(request.events.len());
        let mut summary = Vec::with_capacity(request.events.len());
        for event in request.events {
            let data = match event.data.into_payload() {
                Ok(data) => data,
                Err(e) => {
                    return Ok(CallToolResult::error(vec![Content::text(format!(
                        "Failed to trigger batch events: {e}"
                    ))]));
                }
            };
            summary.push(format!("  \"{}\" → {}", event.name, event.channel));
            batch.push(BatchEvent {
                channel: event.channel,
                name: event.name,
                data,
                socket_id: event.socket_id,
            });
        }

        match client.trigger_batch(&batch).await {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Batch of {} event(s) triggered:\n{}",
                batch.len(),
                summary.join("\n")
            ))])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to trigger batch events: {e}"
            ))])),
        }
    }

    /// List active channels
    #[tool(
        description = "List all active channels in your Pusher app. Optionally filter by prefix (e.g. 'presence-' or 'private-') and request subscription or user counts."
    )]
    pub async fn list_channels(
        &self,
        Parameters(request): Parameters<ListChannelsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Failed to list channels: {e}"
                ))]));
            }
        };

        let info = join_info(request.info.as_deref());
        match client
            .channels(request.prefix.as_deref(), info.as_deref())
            .await
        {
            Ok(channels) => {
                if channels.is_empty() {
                    let text = match &request.prefix {
                        Some(prefix) => format!("No active channels matching prefix \"{prefix}\""),
                        None => "No active channels".to_string(),
                    };
                    return Ok(CallToolResult::success(vec![Content::text(text)]));
                }

                let lines: Vec<String> = channels
                    .iter()
                    .map(|(name, summary)| {
                        let mut parts = vec![name.clone()];
                        if let Some(subscriptions) = summary.subscription_count {
                            parts.push(format!("subscriptions: {subscriptions}"));
                        }
                        if let Some(users) = summary.user_count {
                            parts.push(format!("users: {users}"));
                        }
                        parts.join(" — ")
                    })
                    .collect();

                Ok(CallToolResult::success(vec![Content::text(format!(
                    "Active channels ({}):\n{}",
                    channels.len(),
                    lines.join("\n")
                ))]))
            }
            Err(ClientError::UnexpectedStatus { status, .. }) => {
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Pusher API returned status {status}"
                ))]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to list channels: {e}"
            ))])),
        }
    }

    /// Inspect a single channel
    #[tool(
        description = "Get detailed information about a specific Pusher channel, including whether it is occupied and optional subscription/user counts."
    )]
    pub async fn get_channel_info(
        &self,
        Parameters(request): Parameters<GetChannelInfoRequest>,
    ) -> Result<CallToolResult, McpError> {
        request.validate()?;

        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Failed to get channel info: {e}"
                ))]));
            }
        };

        let info = join_info(request.info.as_deref());
        match client.channel(&request.channel, info.as_deref()).await {
            Ok(state) => {
                let mut lines = vec![format!("Channel: {}", request.channel)];
                if let Some(occupied) = state.occupied {
                    lines.push(format!("Occupied: {occupied}"));
                }
                if let Some(subscriptions) = state.subscription_count {
                    lines.push(format!("Subscriptions: {subscriptions}"));
                }
                if let Some(users) = state.user_count {
                    lines.push(format!("Users: {users}"));
                }
                Ok(CallToolResult::success(vec![Content::text(
                    lines.join("\n"),
                )]))
            }
            Err(ClientError::UnexpectedStatus { status, .. }) => {
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Pusher API returned status {status} for channel \"{}\"",
                    request.channel
                ))]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to get channel info: {e}"
            ))])),
        }
    }

    /// List users on a presence channel
    #[tool(
        description = "List all users currently connected to a presence channel. Only works with channels that start with 'presence-'."
    )]
    pub async fn get_presence_users(
        &self,
        Parameters(request): Parameters<GetPresenceUsersRequest>,
    ) -> Result<CallToolResult, McpError> {
        request.validate()?;

        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Failed to get presence users: {e}"
                ))]));
            }
        };

        match client.presence_users(&request.channel).await {
            Ok(users) => {
                if users.is_empty() {
                    return Ok(CallToolResult::success(vec![Content::text(format!(
                        "No users connected to {}",
                        request.channel
                    ))]));
                }

                let user_list: Vec<String> =
                    users.iter().map(|user| format!("  {}", user.id)).collect();
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "Users on {} ({}):\n{}",
                    request.channel,
                    users.len(),
                    user_list.join("\n")
                ))]))
            }
            Err(ClientError::UnexpectedStatus { status, .. }) => {
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Pusher API returned status {status} for channel \"{}\"",
                    request.channel
                ))]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to get presence users: {e}"
            ))])),
        }
    }

    /// Mint a subscription authorization token
    #[tool(
        description = "Generate an authorization token for a private or presence channel. Useful when building auth endpoints for Pusher client connections."
    )]
    pub async fn authorize_channel(
        &self,
        Parameters(request): Parameters<AuthorizeChannelRequest>,
    ) -> Result<CallToolResult, McpError> {
        request.validate()?;

        if !request.channel.starts_with("private-") && !request.channel.starts_with("presence-") {
            return Ok(CallToolResult::error(vec![Content::text(
                "Channel must start with \"private-\" or \"presence-\" for authorization",
            )]));
        }

        if request.channel.starts_with("presence-") && request.presence_data.is_none() {
            return Ok(CallToolResult::error(vec![Content::text(
                "presenceData is required for presence channels",
            )]));
        }

        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Failed to authorize channel: {e}"
                ))]));
            }
        };

        let auth = match client.authorize_channel(
            &request.socket_id,
            &request.channel,
            request.presence_data.as_ref(),
        ) {
            Ok(auth) => auth,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Failed to authorize channel: {e}"
                ))]));
            }
        };

        match serde_json::to_string_pretty(&auth) {
            Ok(json) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Authorization for {}:\n{}",
                request.channel, json
            ))])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to authorize channel: {e}"
            ))])),
        }
    }

    /// Force a user offline everywhere
    #[tool(
        description = "Disconnect all connections for a specific user. Useful for moderation or security — forces a user offline across all channels."
    )]
    pub async fn terminate_user_connections(
        &self,
        Parameters(request): Parameters<TerminateUserRequest>,
    ) -> Result<CallToolResult, McpError> {
        request.validate()?;

        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Failed to terminate user connections: {e}"
                ))]));
            }
        };

        match client.terminate_user_connections(&request.user_id).await {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "All connections terminated for user \"{}\"",
                request.user_id
            ))])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Failed to terminate user connections: {e}"
            ))])),
        }
    }
}
