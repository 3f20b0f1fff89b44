//! # Pusher Channels Client
//!
//! Client for the Pusher Channels HTTP API: event triggering (single and
//! batch), channel occupancy queries, presence membership, and user
//! connection termination, with Pusher's HMAC-SHA256 request signing.
//! Channel authorization for `private-` and `presence-` channels is a local
//! signing operation and performs no network I/O.

mod auth;
mod client;
mod config;
mod error;
mod signature;
mod types;

pub use auth::{ChannelAuth, PresenceData};
pub use client::PusherClient;
pub use config::ClientConfig;
pub use error::{ClientError, ConfigError, Result};
pub use types::{BatchEvent, ChannelState, ChannelSummary, PresenceUser};
