//! Snapshot and Automate screenshot entry points.
//!
//! This module provides the `PercyClient` struct, which sequences
//! negotiation, DOM capture and upload. Service trouble never fails the
//! calling test: it is logged and the call returns `Ok(None)`.

use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::cache::MetadataCache;
use crate::capture::{capture_responsive_dom, is_responsive_capture, serialize_dom};
use crate::config::Config;
use crate::driver::WebDriver;
use crate::error::{SCREENSHOT_IN_WEB_MESSAGE, SNAPSHOT_IN_AUTOMATE_MESSAGE};
use crate::metadata::DriverMetadata;
use crate::options::{normalize_screenshot_options, SnapshotOptions};
use crate::sidecar::{LogLevel, NegotiationResult, SidecarClient};
use crate::{PercyError, Result};

/// SDK identifier sent with every capture.
pub const CLIENT_INFO: &str = concat!("percy-webdriver-rust/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct PercyClient {
    config: Config,
    sidecar: SidecarClient,
    cache: Arc<MetadataCache>,
}

impl PercyClient {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_cache(config, Arc::new(MetadataCache::new()))
    }

    /// Reads `PERCY_CLI_API`, `PERCY_LOGLEVEL` and the responsive sleep
    /// override from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    /// Shares a session cache between clients.
    pub fn with_cache(config: Config, cache: Arc<MetadataCache>) -> Result<Self> {
        let sidecar = SidecarClient::new(&config)?;
        Ok(Self {
            config,
            sidecar,
            cache,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sidecar(&self) -> &SidecarClient {
        &self.sidecar
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Forces the next call to renegotiate with the sidecar.
    pub async fn reset(&self) {
        self.sidecar.reset().await;
    }

    /// Takes a DOM snapshot of the page `driver` is on.
    ///
    /// Returns the sidecar's `data` field (set for synchronous snapshots).
    /// Errors only for caller mistakes: an empty `name`, or an Automate
    /// session.
    pub async fn snapshot(
        &self,
        driver: &dyn WebDriver,
        name: &str,
        options: SnapshotOptions,
    ) -> Result<Option<Value>> {
        require_name(name)?;

        let Some(negotiated) = self.sidecar.check_availability().await else {
            return Ok(None);
        };
        if negotiated.is_automate() {
            return Err(PercyError::InvalidMode(
                SNAPSHOT_IN_AUTOMATE_MESSAGE.to_string(),
            ));
        }

        match self.take_snapshot(driver, name, &options, &negotiated).await {
            Ok(data) => Ok(data),
            Err(err) => {
                self.report_failure(&format!("Could not take DOM snapshot \"{name}\""), &err)
                    .await;
                Ok(None)
            }
        }
    }

    /// Asks the sidecar to screenshot an Automate session.
    ///
    /// `options` are normalized before upload (element references become
    /// ids); `params` are merged into the top level of the request.
    pub async fn automate_screenshot(
        &self,
        driver: &dyn WebDriver,
        name: &str,
        options: Option<Map<String, Value>>,
        params: Map<String, Value>,
    ) -> Result<Option<Value>> {
        require_name(name)?;

        let Some(negotiated) = self.sidecar.check_availability().await else {
            return Ok(None);
        };
        if !negotiated.is_automate() {
            return Err(PercyError::InvalidMode(
                SCREENSHOT_IN_WEB_MESSAGE.to_string(),
            ));
        }

        let options = normalize_screenshot_options(options.unwrap_or_default());
        match self.take_screenshot(driver, name, options, params).await {
            Ok(data) => Ok(data),
            Err(err) => {
                self.report_failure(&format!("Could not take Screenshot \"{name}\""), &err)
                    .await;
                Ok(None)
            }
        }
    }

    async fn take_snapshot(
        &self,
        driver: &dyn WebDriver,
        name: &str,
        options: &SnapshotOptions,
        negotiated: &NegotiationResult,
    ) -> Result<Option<Value>> {
        let script = self.sidecar.fetch_dom_script().await?;
        driver.execute_script(&script, Vec::new()).await?;
        let cookies = driver.cookies().await?;

        let dom_snapshot = if is_responsive_capture(negotiated, options) {
            let snapshots = capture_responsive_dom(
                driver,
                self.sidecar.logger(),
                &negotiated.eligible_widths,
                &cookies,
                options,
                self.config.responsive_capture_sleep,
            )
            .await?;
            Value::Array(snapshots)
        } else {
            Value::Object(serialize_dom(driver, &options.to_json_map(), &cookies).await?)
        };

        let mut payload = options.to_json_map();
        payload.insert("client_info".to_string(), json!(CLIENT_INFO));
        payload.insert(
            "environment_info".to_string(),
            json!(environment_info(driver)),
        );
        payload.insert("dom_snapshot".to_string(), dom_snapshot);
        payload.insert("url".to_string(), json!(driver.current_url().await?));
        payload.insert("name".to_string(), json!(name));

        self.sidecar.post_snapshot(&payload).await
    }

    async fn take_screenshot(
        &self,
        driver: &dyn WebDriver,
        name: &str,
        options: Map<String, Value>,
        params: Map<String, Value>,
    ) -> Result<Option<Value>> {
        let metadata = DriverMetadata::new(driver, &self.cache);

        let mut payload = params;
        payload.insert("client_info".to_string(), json!(CLIENT_INFO));
        payload.insert(
            "environment_info".to_string(),
            json!(environment_info(driver)),
        );
        payload.insert("sessionId".to_string(), json!(metadata.session_id()));
        payload.insert(
            "commandExecutorUrl".to_string(),
            json!(metadata.command_executor_url().await?),
        );
        payload.insert(
            "capabilities".to_string(),
            Value::Object(metadata.capabilities().await?),
        );
        // sic: the CLI reads this misspelled key
        payload.insert(
            "sessionCapabilites".to_string(),
            Value::Object(metadata.session_capabilities().await?),
        );
        payload.insert("snapshotName".to_string(), json!(name));
        payload.insert("options".to_string(), Value::Object(options));

        self.sidecar.post_automate_screenshot(&payload).await
    }

    async fn report_failure(&self, headline: &str, err: &PercyError) {
        let logger = self.sidecar.logger();
        logger.log(LogLevel::Info, headline).await;
        logger.log(LogLevel::Info, &err.to_string()).await;
    }
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PercyError::MissingArgument("name"));
    }
    Ok(())
}

fn environment_info(driver: &dyn WebDriver) -> Vec<String> {
    vec![driver.environment_info(), "rust".to_string()]
}
