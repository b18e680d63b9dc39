//! Error types for token acquisition and configuration.

use http::StatusCode;
use thiserror::Error;

/// Failure to build a manager or load its configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("token URL is required for OAuth2")]
    MissingTokenUrl,

    #[error("client ID is required for OAuth2")]
    MissingClientId,

    #[error("client secret is required for OAuth2")]
    MissingClientSecret,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config format: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Failure of a single token endpoint exchange.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token request returned status {}: {body}", .status.as_u16())]
    Status { status: StatusCode, body: String },

    #[error("failed to decode token response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("token refresh task aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Decode(_) => "decode",
            FetchError::Aborted(_) => "aborted",
        }
    }
}

/// Failure to attach authentication to an outbound request.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Only reported to the caller whose call performed the fetch.
    #[error("token refresh failed: {0}")]
    Refresh(#[source] FetchError),

    #[error("no valid access token available")]
    NoTokenAvailable,

    #[error("access token is not a valid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}
