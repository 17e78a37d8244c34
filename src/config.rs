use std::time::Duration;

use url::Url;

use crate::Result;

/// Address of the local Percy CLI when `PERCY_CLI_API` is unset.
pub const DEFAULT_CLI_API: &str = "http://localhost:5338";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the sidecar. Parsed when the client is built.
    pub cli_api: String,
    /// `PERCY_LOGLEVEL=debug`.
    pub debug: bool,
    /// Fixed pause before each responsive serialization.
    pub responsive_capture_sleep: Option<Duration>,
    pub timeouts: Timeouts,
}

#[derive(Debug, Clone)]
pub struct Timeouts {
    pub healthcheck: Duration,
    pub dom_script: Duration,
    pub capture: Duration,
    pub log: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            healthcheck: Duration::from_secs(30),
            dom_script: Duration::from_secs(30),
            capture: Duration::from_secs(600),
            log: Duration::from_secs(5),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cli_api: DEFAULT_CLI_API.to_string(),
            debug: false,
            responsive_capture_sleep: None,
            timeouts: Timeouts::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cli_api = match lookup("PERCY_CLI_API").filter(|v| !v.is_empty()) {
            Some(raw) => {
                Url::parse(&raw)?;
                raw
            }
            None => DEFAULT_CLI_API.to_string(),
        };

        let debug = lookup("PERCY_LOGLEVEL").as_deref() == Some("debug");

        let responsive_capture_sleep = lookup("PERCY_RESPONSIVE_CAPTURE_SLEEP_TIME")
            .or_else(|| lookup("RESONSIVE_CAPTURE_SLEEP_TIME"))
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            cli_api,
            debug,
            responsive_capture_sleep,
            timeouts: Timeouts::default(),
        })
    }

    pub fn with_cli_api(mut self, cli_api: impl AsRef<str>) -> Self {
        self.cli_api = cli_api.as_ref().to_string();
        self
    }

    /// The sidecar address as a URL.
    pub fn cli_api_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.cli_api)?)
    }
}
