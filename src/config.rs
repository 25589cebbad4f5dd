// Settings resolution: the API key and base URL come from flags or their
// environment fallbacks; nothing is read from disk.

use url::Url;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://doodapi.com/api/";

/// Settings needed to build an [`ApiClient`](crate::api::ApiClient).
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub base_url: Url,
}

impl Config {
    /// Resolve the key and base URL from whatever the command line (or its
    /// environment fallbacks) supplied. A blank key counts as missing.
    pub fn resolve(api_key: Option<&str>, base_url: Option<&str>) -> Result<Self, ApiError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ApiError::MissingApiKey)?
            .to_string();
        let base_url = parse_base_url(base_url.unwrap_or(DEFAULT_BASE_URL))?;
        Ok(Config { api_key, base_url })
    }
}

/// Endpoint paths are relative, so the base must end in `/` or `join`
/// would replace its last segment.
fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|source| ApiError::InvalidBaseUrl { url: raw, source })
}
