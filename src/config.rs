//! Runtime configuration, read from the environment (and `.env` via dotenvy).

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;
use crate::transcription::PollOptions;

pub const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com/v2";

const ENV_API_KEY: &str = "ASSEMBLYAI_API_KEY";
const ENV_BASE_URL: &str = "ASSEMBLYAI_BASE_URL";
const ENV_POLL_INTERVAL_MS: &str = "TRANSCRIBE_POLL_INTERVAL_MS";
const ENV_TIMEOUT_MS: &str = "TRANSCRIBE_TIMEOUT_MS";

/// Opaque token authorizing every remote call.
///
/// Only non-emptiness is checked; the shape is the service's business.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        Ok(Self(token))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credential: Credential,
    /// Service root, without trailing slash
    pub base_url: String,
    pub poll: PollOptions,
}

impl Config {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll: PollOptions::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }

    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    /// Load from process environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let credential = lookup(ENV_API_KEY)
            .ok_or(ConfigError::MissingCredential)
            .and_then(Credential::new)?;

        let mut config = Self::new(credential);

        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            config = config.with_base_url(url);
        }

        let defaults = PollOptions::default();
        config.poll = PollOptions {
            interval: parse_millis(ENV_POLL_INTERVAL_MS, lookup(ENV_POLL_INTERVAL_MS))?
                .unwrap_or(defaults.interval),
            timeout: parse_millis(ENV_TIMEOUT_MS, lookup(ENV_TIMEOUT_MS))?
                .unwrap_or(defaults.timeout),
        };

        Ok(config)
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_millis(key: &'static str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    match value {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| ConfigError::InvalidValue { key, value: v }),
    }
}
