//! Channel authorization signing for `private-` and `presence-` channels.
//!
//! Authorization is a pure computation over the app credentials: the client
//! library signs `"<socket_id>:<channel>"` (with the serialized presence
//! payload appended for presence channels) and hands the token back to the
//! caller's auth endpoint. No API call is involved.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::signature;

/// Identity of the connecting user on a presence channel.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PresenceData {
    #[schemars(description = "Unique user identifier")]
    pub user_id: String,

    #[schemars(description = "Optional user metadata (name, avatar, etc.)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Signed authorization token for a private or presence channel.
///
/// `channel_data` carries the serialized [`PresenceData`] and is present
/// only for presence channels; clients echo it back to the provider verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelAuth {
    pub auth: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<String>,
}

pub(crate) fn authorize(
    key: &str,
    secret: &str,
    socket_id: &str,
    channel: &str,
    presence: Option<&PresenceData>,
) -> Result<ChannelAuth> {
    let channel_data = presence.map(serde_json::to_string).transpose()?;
    let to_sign = match &channel_data {
        Some(data) => format!("{socket_id}:{channel}:{data}"),
        None => format!("{socket_id}:{channel}"),
    };
    let signature = signature::hmac_hex(secret, &to_sign);
    Ok(ChannelAuth {
        auth: format!("{key}:{signature}"),
        channel_data,
    })
}
