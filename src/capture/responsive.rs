//! Multi-width DOM capture with resize synchronization.

use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::time::{sleep, timeout};

use super::dom::{serialize_dom, RESIZE_COUNT_SCRIPT, WAIT_FOR_RESIZE_SCRIPT};
use super::widths::widths_for_multi_dom;
use crate::driver::WebDriver;
use crate::options::SnapshotOptions;
use crate::sidecar::{EligibleWidths, LogLevel, SidecarLogger};
use crate::{Result, Viewport};

/// Upper bound on waiting for the page to acknowledge a resize.
pub const RESIZE_WAIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Delay between `window.resizeCount` polls.
pub const RESIZE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Captures one DOM record per eligible width and restores the window.
pub struct ResponsiveCapture<'a> {
    driver: &'a dyn WebDriver,
    logger: &'a SidecarLogger,
    sleep: Option<Duration>,
}

impl<'a> ResponsiveCapture<'a> {
    pub fn new(driver: &'a dyn WebDriver, logger: &'a SidecarLogger) -> Self {
        Self {
            driver,
            logger,
            sleep: None,
        }
    }

    /// Pause before each serialization, for pages that render slowly after
    /// a resize.
    pub fn with_sleep(mut self, sleep: Option<Duration>) -> Self {
        self.sleep = sleep;
        self
    }

    /// Returns one record per width, each tagged with `width`. The window is
    /// resized back to its original size even when a width fails.
    pub async fn capture(
        &self,
        eligible: &EligibleWidths,
        cookies: &Value,
        options: &SnapshotOptions,
    ) -> Result<Vec<Value>> {
        let widths = widths_for_multi_dom(eligible, options);
        let original = self.driver.window_size().await?;
        let serializer_options = options.to_json_map();

        let mut resize_count = 0;
        let captured = self
            .capture_widths(
                &widths,
                original,
                cookies,
                &serializer_options,
                &mut resize_count,
            )
            .await;
        let restored = self.resize_and_wait(original, resize_count + 1).await;

        let snapshots = captured?;
        restored?;
        Ok(snapshots)
    }

    async fn capture_widths(
        &self,
        widths: &[u32],
        original: Viewport,
        cookies: &Value,
        serializer_options: &Map<String, Value>,
        resize_count: &mut u64,
    ) -> Result<Vec<Value>> {
        self.driver
            .execute_script(WAIT_FOR_RESIZE_SCRIPT, Vec::new())
            .await?;

        let mut last_width = original.width;
        let mut snapshots = Vec::with_capacity(widths.len());
        for &width in widths {
            if width != last_width {
                *resize_count += 1;
                self.resize_and_wait(original.with_width(width), *resize_count)
                    .await?;
                last_width = width;
            }

            if let Some(pause) = self.sleep {
                sleep(pause).await;
            }

            let mut snapshot = serialize_dom(self.driver, serializer_options, cookies).await?;
            snapshot.insert("width".to_string(), json!(width));
            snapshots.push(Value::Object(snapshot));
        }
        Ok(snapshots)
    }

    /// Resizes the window and waits for the page's resize counter to reach
    /// `expected`. Running out of time is not an error.
    pub async fn resize_and_wait(&self, viewport: Viewport, expected: u64) -> Result<()> {
        self.resize(viewport).await?;

        let acknowledged = timeout(RESIZE_WAIT_TIMEOUT, self.wait_for_resize_count(expected)).await;
        if acknowledged.is_err() {
            self.logger
                .log(
                    LogLevel::Debug,
                    &format!(
                        "Timed out waiting for window resize event for width {}",
                        viewport.width
                    ),
                )
                .await;
        }
        Ok(())
    }

    async fn resize(&self, viewport: Viewport) -> Result<()> {
        if self.driver.supports_native_resize() {
            match self.driver.native_resize(viewport).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    self.logger
                        .log(
                            LogLevel::Debug,
                            &format!(
                                "Resizing using cdp failed falling back to driver for width {} {err}",
                                viewport.width
                            ),
                        )
                        .await;
                }
            }
        }
        self.driver.set_window_size(viewport).await
    }

    async fn wait_for_resize_count(&self, expected: u64) {
        loop {
            let count = self
                .driver
                .execute_script(RESIZE_COUNT_SCRIPT, Vec::new())
                .await;
            if matches!(count, Ok(ref value) if value.as_u64() == Some(expected)) {
                break;
            }
            sleep(RESIZE_POLL_INTERVAL).await;
        }
    }
}
