use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One event of a batch trigger call, already in wire form: `data` is the
/// final string payload (callers JSON-encode structured payloads first).
#[derive(Debug, Clone, Serialize)]
pub struct BatchEvent {
    pub channel: String,
    pub name: String,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<String>,
}

/// Attributes reported per channel by the channels index endpoint, present
/// only when requested through the `info` parameter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelSummary {
    pub user_count: Option<u64>,
    pub subscription_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ChannelsResponse {
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelSummary>,
}

/// State of a single channel. Fields the provider did not include in its
/// response stay `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelState {
    pub occupied: Option<bool>,
    pub user_count: Option<u64>,
    pub subscription_count: Option<u64>,
}

/// A user currently subscribed to a presence channel.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceUser {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct UsersResponse {
    #[serde(default)]
    pub users: Vec<PresenceUser>,
}
