// Client configuration, from code or from the environment

use std::env;
use std::path::PathBuf;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    // No timeout unless asked for: a slow request stays in its loading state
    pub timeout_ms: Option<u64>,
    pub user_agent: String,
    // Where the auth session is persisted between runs
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: None,
            user_agent: format!("hotel-booking-client/{}", env!("CARGO_PKG_VERSION")),
            session_file: None,
        }
    }
}

impl ClientConfig {
    // Reads HOTEL_API_BASE_URL, HOTEL_API_TIMEOUT_MS and HOTEL_SESSION_FILE,
    // loading a `.env` file first when one is present
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup("HOTEL_API_BASE_URL") {
            config.base_url = base_url;
        }

        if let Some(raw) = lookup("HOTEL_API_TIMEOUT_MS") {
            let timeout = raw.trim().parse::<u64>().map_err(|e| {
                ClientError::ConfigError(format!("HOTEL_API_TIMEOUT_MS '{}': {}", raw, e))
            })?;
            config.timeout_ms = (timeout > 0).then_some(timeout);
        }

        if let Some(path) = lookup("HOTEL_SESSION_FILE") {
            config.session_file = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(ClientError::ConfigError("base_url is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::ConfigError(format!(
                "base_url must start with http:// or https://, got '{}'",
                url
            )));
        }
        Ok(())
    }

    // Joins an API path onto the base URL without doubling slashes
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
