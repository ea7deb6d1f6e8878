use crate::client::AiClientError;

/// Default backend base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Backend client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiClientConfig {
    /// Base URL every endpoint path is appended to, without trailing `/`.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl AiClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                     |
    /// |---------------------------|-----------------------------|
    /// | `API_BASE_URL`            | `http://localhost:3000/api` |
    /// | `AI_REQUEST_TIMEOUT_SECS` | `30`                        |
    pub fn from_env() -> Result<Self, AiClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AiClientError> {
        let api_base_url = lookup("API_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

        let request_timeout_secs = match lookup("AI_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AiClientError::Config(format!(
                    "AI_REQUEST_TIMEOUT_SECS must be a valid u64, got '{raw}'"
                ))
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            api_base_url,
            request_timeout_secs,
        })
    }
}

impl Default for AiClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}
