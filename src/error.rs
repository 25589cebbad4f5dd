// Error type shared by the client, config and dispatcher. Each variant
// renders as one line; `main` prints it without the cause chain.

use std::path::PathBuf;

use thiserror::Error;

/// Every way a command can fail. The client never hands back a partial
/// result: a call either yields the decoded JSON body or one of these.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API key not provided. Use --api-key or set DOODSTREAM_API_KEY environment variable.")]
    MissingApiKey,

    #[error("invalid base URL {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },

    /// The request URL carries the API key, so it is stripped on the way in.
    #[error("API request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("API request failed: status {status} body {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("remote operation failed (status {status:?}): {msg}")]
    Remote { status: Option<i64>, msg: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err.without_url())
    }
}
