use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum PercyError {
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("{0}")]
    InvalidMode(String),

    #[error("Argument {argument} should be string")]
    CacheKeyType { argument: &'static str },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Percy service error (status: {status:?}): {message}")]
    Service {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("WebDriver error: {0}")]
    Driver(String),

    #[error("Unsupported driver operation: {0}")]
    Unsupported(String),
}

impl PercyError {
    pub fn service(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        PercyError::Service {
            status,
            message: message.into(),
        }
    }

    pub fn driver(message: impl Into<String>) -> Self {
        PercyError::Driver(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PercyError::MissingArgument(_)
            | PercyError::InvalidMode(_)
            | PercyError::CacheKeyType { .. } => ErrorCategory::Caller,
            PercyError::Service { .. } => ErrorCategory::Service,
            PercyError::Network(_) | PercyError::InvalidUrl(_) | PercyError::Serialization(_) => {
                ErrorCategory::Transport
            }
            PercyError::Driver(_) | PercyError::Unsupported(_) => ErrorCategory::Driver,
        }
    }

    /// Caller-contract violations are raised; everything else degrades to a
    /// logged no-op at the capture entry points.
    pub fn is_caller_error(&self) -> bool {
        self.category() == ErrorCategory::Caller
    }
}

pub type Result<T> = std::result::Result<T, PercyError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Caller,
    Service,
    Transport,
    Driver,
}

/// Guidance returned when `snapshot` is called on an Automate session.
pub(crate) const SNAPSHOT_IN_AUTOMATE_MESSAGE: &str = "Invalid function call - percy_snapshot(). \
Please use percy_screenshot() function while using Percy with Automate. \
For more information on usage of PercyScreenshot, refer \
https://www.browserstack.com/docs/percy/integrate/functional-and-visual";

/// Guidance returned when `automate_screenshot` is called on a web session.
pub(crate) const SCREENSHOT_IN_WEB_MESSAGE: &str = "Invalid function call - percy_screenshot(). \
Please use percy_snapshot() function for taking screenshot. \
percy_screenshot() should be used only while using Percy with Automate. \
For more information on usage of percy_snapshot(), refer doc for your language \
https://www.browserstack.com/docs/percy/integrate/overview";
