//! DOM capture for snapshots.
//!
//! # Module Structure
//!
//! - [`widths`] - responsive width-set computation
//! - [`dom`] - page-side serialization through `PercyDOM`
//! - [`responsive`] - per-width resize, wait and serialize loop

mod dom;
mod responsive;
mod widths;

pub use dom::serialize_dom;
pub use responsive::{ResponsiveCapture, RESIZE_POLL_INTERVAL, RESIZE_WAIT_TIMEOUT};
pub use widths::widths_for_multi_dom;

use serde_json::Value;
use std::time::Duration;

use crate::driver::WebDriver;
use crate::options::SnapshotOptions;
use crate::sidecar::{EligibleWidths, NegotiationResult, SidecarLogger};
use crate::Result;

/// Whether to capture at every eligible width.
///
/// Deferred uploads always force a single capture. Otherwise the per-call
/// flag or the CLI's `snapshot.responsiveSnapshotCapture` setting enables it.
pub fn is_responsive_capture(negotiated: &NegotiationResult, options: &SnapshotOptions) -> bool {
    if negotiated.defer_uploads() {
        return false;
    }
    options.responsive_snapshot_capture.unwrap_or(false) || negotiated.responsive_capture_default()
}

/// One DOM record per eligible width, with the window restored afterwards.
pub async fn capture_responsive_dom(
    driver: &dyn WebDriver,
    logger: &SidecarLogger,
    eligible: &EligibleWidths,
    cookies: &Value,
    options: &SnapshotOptions,
    sleep: Option<Duration>,
) -> Result<Vec<Value>> {
    ResponsiveCapture::new(driver, logger)
        .with_sleep(sleep)
        .capture(eligible, cookies, options)
        .await
}
