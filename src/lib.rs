//! Percy WebDriver SDK
//!
//! Captures visual snapshots from a WebDriver session and hands them to a
//! locally running Percy CLI, which renders and diffs them. Supports plain
//! DOM snapshots (optionally at several viewport widths) and Automate
//! screenshots.
//!
//! # Module Overview
//!
//! - [`client`] - `snapshot` and `automate_screenshot` entry points
//! - [`sidecar`] - Percy CLI healthcheck negotiation, uploads and logging
//! - [`capture`] - single and responsive DOM capture
//! - [`cache`] - per-session metadata cache with TTL eviction
//! - [`metadata`] - cache-backed session metadata
//! - [`driver`] - the [`WebDriver`] trait callers implement
//! - [`options`] - snapshot and screenshot options
//! - [`config`] - environment-driven settings
//!
//! # Example
//!
//! ```no_run
//! use percy_webdriver::{PercyClient, SnapshotOptions, WebDriver};
//!
//! # async fn example(driver: &dyn WebDriver) -> percy_webdriver::Result<()> {
//! let percy = PercyClient::from_env()?;
//! let options = SnapshotOptions::new().responsive(true).widths([375, 1280]);
//! percy.snapshot(driver, "Home page", options).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod capture;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod metadata;
pub mod options;
pub mod sidecar;
pub mod viewport;

pub use cache::{MetadataCache, CACHE_TIMEOUT};
pub use capture::{
    capture_responsive_dom, is_responsive_capture, serialize_dom, widths_for_multi_dom,
    ResponsiveCapture, RESIZE_WAIT_TIMEOUT,
};
pub use client::{PercyClient, CLIENT_INFO};
pub use config::{Config, Timeouts, DEFAULT_CLI_API};
pub use driver::{ElementRef, WebDriver, W3C_ELEMENT_KEY};
pub use error::{ErrorCategory, PercyError, Result};
pub use metadata::DriverMetadata;
pub use options::{normalize_screenshot_options, SnapshotOptions};
pub use sidecar::{
    EligibleWidths, LogLevel, NegotiationResult, SessionType, SidecarClient, SidecarLogger,
    Unavailable, LABEL,
};
pub use viewport::Viewport;
