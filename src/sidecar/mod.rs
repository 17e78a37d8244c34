//! Percy CLI sidecar integration.
//!
//! This module provides:
//! - [`SidecarClient`] - healthcheck negotiation, DOM script fetch and
//!   capture uploads
//! - [`SidecarLogger`] - labelled logging mirrored to `/percy/log`
//! - API types for the healthcheck and capture responses

pub mod api_types;
pub mod client;
pub mod logger;

pub use api_types::{EligibleWidths, NegotiationResult, SessionType, CORE_VERSION_HEADER};
pub use client::{SidecarClient, Unavailable};
pub use logger::{LogLevel, SidecarLogger, DEBUG_LABEL, LABEL};
