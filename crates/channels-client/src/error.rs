use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure to assemble a [`crate::ClientConfig`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Missing required environment variables: {}. Set these in your MCP server configuration or .env file.",
        .missing.join(", ")
    )]
    MissingVars { missing: Vec<String> },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid channel name: '{0}'")]
    InvalidChannel(String),

    #[error("Invalid socket id: '{0}'")]
    InvalidSocketId(String),

    #[error("Can't trigger a message to more than 100 channels")]
    TooManyChannels,

    /// The API answered with a non-2xx status. The body is kept for
    /// diagnostics; callers that need the status match on this variant.
    #[error("unexpected status code {status}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid endpoint URL: {0}")]
    Url(String),
}
