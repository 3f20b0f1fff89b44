use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::Serialize;

use crate::auth::{self, ChannelAuth, PresenceData};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::signature;
use crate::types::{
    BatchEvent, ChannelState, ChannelSummary, ChannelsResponse, PresenceUser, UsersResponse,
};

static CHANNEL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_=@,.;]+$").expect("channel name pattern"));
static SOCKET_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+$").expect("socket id pattern"));

const MAX_CHANNEL_NAME_LEN: usize = 200;
const MAX_TRIGGER_CHANNELS: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct TriggerBody<'a> {
    name: &'a str,
    channels: &'a [String],
    data: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    socket_id: Option<&'a str>,
}

#[derive(Serialize)]
struct BatchBody<'a> {
    batch: &'a [BatchEvent],
}

/// Client for one Pusher Channels app.
///
/// Holds the HTTP connection pool; construct once and share. All REST
/// methods issue exactly one signed request and never retry.
pub struct PusherClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl PusherClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Triggers `event` on up to 100 channels. `data` is the final string
    /// payload; `socket_id` excludes one connection from delivery.
    pub async fn trigger(
        &self,
        channels: &[String],
        event: &str,
        data: &str,
        socket_id: Option<&str>,
    ) -> Result<()> {
        if channels.len() > MAX_TRIGGER_CHANNELS {
            return Err(ClientError::TooManyChannels);
        }
        for channel in channels {
            validate_channel(channel)?;
        }
        if let Some(socket_id) = socket_id {
            validate_socket_id(socket_id)?;
        }

        let body = serde_json::to_string(&TriggerBody {
            name: event,
            channels,
            data,
            socket_id,
        })?;
        self.post(&["events"], &body).await
    }

    /// Triggers a batch of events as a single API call.
    pub async fn trigger_batch(&self, events: &[BatchEvent]) -> Result<()> {
        for event in events {
            validate_channel(&event.channel)?;
            if let Some(socket_id) = &event.socket_id {
                validate_socket_id(socket_id)?;
            }
        }

        let body = serde_json::to_string(&BatchBody { batch: events })?;
        self.post(&["batch_events"], &body).await
    }

    /// Lists active channels, optionally filtered by name prefix and
    /// enriched with the comma-joined `info` attributes.
    pub async fn channels(
        &self,
        filter_by_prefix: Option<&str>,
        info: Option<&str>,
    ) -> Result<BTreeMap<String, ChannelSummary>> {
        let mut params = Vec::new();
        if let Some(prefix) = filter_by_prefix {
            params.push(("filter_by_prefix".to_string(), prefix.to_string()));
        }
        if let Some(info) = info {
            params.push(("info".to_string(), info.to_string()));
        }
        let response: ChannelsResponse = self.get(&["channels"], params).await?;
        Ok(response.channels)
    }

    /// Fetches the state of a single channel.
    pub async fn channel(&self, name: &str, info: Option<&str>) -> Result<ChannelState> {
        let mut params = Vec::new();
        if let Some(info) = info {
            params.push(("info".to_string(), info.to_string()));
        }
        self.get(&["channels", name], params).await
    }

    /// Lists the users currently subscribed to a presence channel.
    pub async fn presence_users(&self, channel: &str) -> Result<Vec<PresenceUser>> {
        let response: UsersResponse = self
            .get(&["channels", channel, "users"], Vec::new())
            .await?;
        Ok(response.users)
    }

    /// Disconnects every open connection of `user_id`.
    pub async fn terminate_user_connections(&self, user_id: &str) -> Result<()> {
        self.post(&["users", user_id, "terminate_connections"], "{}")
            .await
    }

    /// Signs a subscription authorization for a private or presence channel.
    /// Local computation; no request is made.
    pub fn authorize_channel(
        &self,
        socket_id: &str,
        channel: &str,
        presence: Option<&PresenceData>,
    ) -> Result<ChannelAuth> {
        validate_socket_id(socket_id)?;
        validate_channel(channel)?;
        auth::authorize(
            &self.config.key,
            &self.config.secret,
            socket_id,
            channel,
            presence,
        )
    }

    /// Builds the endpoint URL for `/apps/{app_id}/<segments>` and returns
    /// it together with the encoded path used for signing.
    fn endpoint(&self, segments: &[&str]) -> Result<(Url, String)> {
        let mut url =
            Url::parse(&self.config.base_url()).map_err(|e| ClientError::Url(e.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ClientError::Url("endpoint URL cannot be a base".to_string()))?;
            path.push("apps");
            path.push(&self.config.app_id);
            for segment in segments {
                path.push(segment);
            }
        }
        let path = url.path().to_string();
        Ok((url, path))
    }

    async fn get<T>(&self, segments: &[&str], params: Vec<(String, String)>) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let (mut url, path) = self.endpoint(segments)?;
        let query = signature::signed_query(
            &self.config.key,
            &self.config.secret,
            "GET",
            &path,
            &params,
            None,
            unix_timestamp(),
        );
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(name, value)| (name.as_str(), value.as_str())));

        log::debug!("GET {path}");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    async fn post(&self, segments: &[&str], body: &str) -> Result<()> {
        let (mut url, path) = self.endpoint(segments)?;
        let query = signature::signed_query(
            &self.config.key,
            &self.config.secret,
            "POST",
            &path,
            &[],
            Some(body),
            unix_timestamp(),
        );
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(name, value)| (name.as_str(), value.as_str())));

        log::debug!("POST {path}");
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

fn validate_channel(channel: &str) -> Result<()> {
    if channel.is_empty()
        || channel.chars().count() > MAX_CHANNEL_NAME_LEN
        || !CHANNEL_NAME.is_match(channel)
    {
        return Err(ClientError::InvalidChannel(channel.to_string()));
    }
    Ok(())
}

fn validate_socket_id(socket_id: &str) -> Result<()> {
    if !SOCKET_ID.is_match(socket_id) {
        return Err(ClientError::InvalidSocketId(socket_id.to_string()));
    }
    Ok(())
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
