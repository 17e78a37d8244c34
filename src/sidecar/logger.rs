//! Labelled console logging, optionally mirrored to the CLI's log endpoint.

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Prefix for every console line.
pub const LABEL: &str = "[\u{1b}[35mpercy\u{1b}[39m]";
/// Prefix used when `PERCY_LOGLEVEL=debug`.
pub const DEBUG_LABEL: &str = "[\u{1b}[35mpercy:rust\u{1b}[39m]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Serialize)]
struct LogRequest<'a> {
    message: &'a str,
    level: LogLevel,
}

#[derive(Debug, Clone)]
pub struct SidecarLogger {
    http: Client,
    endpoint: Option<Url>,
    debug: bool,
    timeout: Duration,
}

impl SidecarLogger {
    pub(crate) fn new(http: Client, endpoint: Option<Url>, debug: bool, timeout: Duration) -> Self {
        Self {
            http,
            endpoint,
            debug,
            timeout,
        }
    }

    pub fn label(&self) -> &'static str {
        if self.debug {
            DEBUG_LABEL
        } else {
            LABEL
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Sends the message to `/percy/log`, then prints it. Delivery failures
    /// are never surfaced.
    pub async fn log(&self, level: LogLevel, message: &str) {
        let message = format!("{} {}", self.label(), message);

        if let Some(endpoint) = &self.endpoint {
            let sent = self
                .http
                .post(endpoint.clone())
                .timeout(self.timeout)
                .json(&LogRequest {
                    message: &message,
                    level,
                })
                .send()
                .await;
            if let Err(err) = sent {
                if self.debug {
                    tracing::debug!("Sending log to CLI Failed {err}");
                }
            }
        }

        self.emit(level, &message);
    }

    /// Console only.
    pub fn print(&self, level: LogLevel, message: &str) {
        self.emit(level, &format!("{} {}", self.label(), message));
    }

    fn emit(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Debug if self.debug => tracing::debug!("{line}"),
            LogLevel::Debug => {}
            LogLevel::Info => tracing::info!("{line}"),
            LogLevel::Warn => tracing::warn!("{line}"),
            LogLevel::Error => tracing::error!("{line}"),
        }
    }
}
