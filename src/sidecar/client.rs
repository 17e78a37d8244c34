use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

use super::api_types::{
    error_text, is_truthy, CaptureResponse, HealthcheckResponse, NegotiationResult,
    CORE_VERSION_HEADER,
};
use super::logger::{LogLevel, SidecarLogger};
use crate::config::{Config, Timeouts};
use crate::{PercyError, Result};

const HEALTHCHECK_PATH: &str = "/percy/healthcheck";
const DOM_SCRIPT_PATH: &str = "/percy/dom.js";
const SNAPSHOT_PATH: &str = "/percy/snapshot";
const AUTOMATE_SCREENSHOT_PATH: &str = "/percy/automateScreenshot";
const LOG_PATH: &str = "/percy/log";

const SUPPORTED_MAJOR_VERSION: &str = "1";

const LEGACY_AGENT_MESSAGE: &str = "You may be using @percy/agent which is no longer supported \
by this SDK. Please uninstall @percy/agent and install @percy/cli instead. \
https://www.browserstack.com/docs/percy/migration/migrate-to-cli";

/// Why a healthcheck did not produce a usable session.
#[derive(Debug)]
pub enum Unavailable {
    /// Transport failure, error status, bad payload or `success: false`.
    NotRunning(PercyError),
    /// No version header: the deprecated @percy/agent.
    LegacyAgent,
    UnsupportedVersion(String),
}

/// HTTP client for the Percy CLI sidecar.
///
/// The healthcheck result and the DOM script are fetched at most once until
/// [`reset`](Self::reset) is called.
#[derive(Debug)]
pub struct SidecarClient {
    http: Client,
    base_url: Url,
    timeouts: Timeouts,
    logger: SidecarLogger,
    availability: Mutex<Option<Option<NegotiationResult>>>,
    dom_script: Mutex<Option<Arc<str>>>,
}

impl SidecarClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder().build().map_err(PercyError::Network)?;
        let base_url = config.cli_api_url()?;
        let log_endpoint = join(&base_url, LOG_PATH)?;
        let logger = SidecarLogger::new(
            http.clone(),
            Some(log_endpoint),
            config.debug,
            config.timeouts.log,
        );

        Ok(Self {
            http,
            base_url,
            timeouts: config.timeouts.clone(),
            logger,
            availability: Mutex::new(None),
            dom_script: Mutex::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn logger(&self) -> &SidecarLogger {
        &self.logger
    }

    /// Returns the negotiated session, or `None` when capture is disabled.
    pub async fn check_availability(&self) -> Option<NegotiationResult> {
        let mut cached = self.availability.lock().await;
        if let Some(result) = cached.as_ref() {
            return result.clone();
        }

        let result = match self.negotiate().await {
            Ok(result) => Some(result),
            Err(reason) => {
                self.report_unavailable(reason);
                None
            }
        };
        *cached = Some(result.clone());
        result
    }

    /// Healthcheck without caching or logging.
    pub async fn negotiate(&self) -> std::result::Result<NegotiationResult, Unavailable> {
        let (version, health) = self.healthcheck().await.map_err(Unavailable::NotRunning)?;

        let Some(version) = version else {
            return Err(Unavailable::LegacyAgent);
        };
        if version.split('.').next() != Some(SUPPORTED_MAJOR_VERSION) {
            return Err(Unavailable::UnsupportedVersion(version));
        }

        Ok(health.into())
    }

    /// Body of the `@percy/dom` serializer script.
    pub async fn fetch_dom_script(&self) -> Result<Arc<str>> {
        let mut cached = self.dom_script.lock().await;
        if let Some(script) = cached.as_ref() {
            return Ok(script.clone());
        }

        let url = join(&self.base_url, DOM_SCRIPT_PATH)?;
        let response = self
            .http
            .get(url)
            .timeout(self.timeouts.dom_script)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PercyError::service(
                Some(status),
                error_message(status, &body),
            ));
        }

        let script: Arc<str> = Arc::from(body);
        *cached = Some(script.clone());
        Ok(script)
    }

    /// Forgets the negotiated session and the DOM script.
    pub async fn reset(&self) {
        *self.availability.lock().await = None;
        *self.dom_script.lock().await = None;
    }

    pub async fn post_snapshot<T: Serialize + ?Sized>(&self, payload: &T) -> Result<Option<Value>> {
        self.post_capture(SNAPSHOT_PATH, payload).await
    }

    pub async fn post_automate_screenshot<T: Serialize + ?Sized>(
        &self,
        payload: &T,
    ) -> Result<Option<Value>> {
        self.post_capture(AUTOMATE_SCREENSHOT_PATH, payload).await
    }

    async fn healthcheck(&self) -> Result<(Option<String>, HealthcheckResponse)> {
        let url = join(&self.base_url, HEALTHCHECK_PATH)?;
        let response = self
            .http
            .get(url)
            .timeout(self.timeouts.healthcheck)
            .send()
            .await?;
        let status = response.status();
        let version = response
            .headers()
            .get(CORE_VERSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PercyError::service(
                Some(status),
                error_message(status, &body),
            ));
        }

        let health: HealthcheckResponse = serde_json::from_str(&body)?;
        if !is_truthy(&health.success) {
            return Err(PercyError::service(
                Some(status),
                error_text(health.error.as_ref()),
            ));
        }

        Ok((version, health))
    }

    async fn post_capture<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Option<Value>> {
        let url = join(&self.base_url, path)?;
        let response = self
            .http
            .post(url)
            .timeout(self.timeouts.capture)
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PercyError::service(
                Some(status),
                error_message(status, &body),
            ));
        }

        let parsed: CaptureResponse = serde_json::from_str(&body)?;
        if !is_truthy(&parsed.success) {
            return Err(PercyError::service(
                Some(status),
                error_text(parsed.error.as_ref()),
            ));
        }

        Ok(parsed.data.filter(|data| !data.is_null()))
    }

    fn report_unavailable(&self, reason: Unavailable) {
        match reason {
            Unavailable::NotRunning(err) => {
                self.logger
                    .print(LogLevel::Info, "Percy is not running, disabling snapshots");
                self.logger.print(LogLevel::Debug, &err.to_string());
            }
            Unavailable::LegacyAgent => self.logger.print(LogLevel::Warn, LEGACY_AGENT_MESSAGE),
            Unavailable::UnsupportedVersion(version) => self.logger.print(
                LogLevel::Warn,
                &format!("Unsupported Percy CLI version, {version}"),
            ),
        }
    }
}

fn join(base: &Url, path: &str) -> Result<Url> {
    let raw = format!("{}{}", base.as_str().trim_end_matches('/'), path);
    Ok(Url::parse(&raw)?)
}

fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| format!("Percy CLI returned status {}", status.as_u16()))
}
