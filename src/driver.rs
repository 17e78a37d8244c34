//! The WebDriver contract this crate drives.
//!
//! Callers adapt their automation client (fantoccini, thirtyfour, a raw W3C
//! HTTP client, ...) by implementing [`WebDriver`]. Only the handful of
//! operations Percy needs are required.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{PercyError, Result, Viewport};

/// W3C identifier key of a web element reference.
pub const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a23c-163d5c822e88";
/// Key used by JSON wire protocol drivers.
pub const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

#[async_trait]
pub trait WebDriver: Send + Sync {
    fn session_id(&self) -> String;

    /// URL of the remote end that owns the session.
    async fn command_executor_url(&self) -> Result<String>;

    /// Capabilities returned when the session was created.
    async fn capabilities(&self) -> Result<Map<String, Value>>;

    /// Capabilities that were requested when the session was created.
    async fn session_capabilities(&self) -> Result<Map<String, Value>>;

    /// Runs `script` as a synchronous page script and returns its JSON result.
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value>;

    async fn current_url(&self) -> Result<String>;

    /// All cookies visible to the current page, as WebDriver cookie objects.
    async fn cookies(&self) -> Result<Value>;

    async fn window_size(&self) -> Result<Viewport>;

    async fn set_window_size(&self, viewport: Viewport) -> Result<()>;

    /// Whether [`native_resize`](Self::native_resize) is backed by a
    /// browser-protocol command (e.g. CDP on Chromium).
    fn supports_native_resize(&self) -> bool {
        false
    }

    /// Overrides device metrics through the browser's own protocol.
    async fn native_resize(&self, viewport: Viewport) -> Result<()> {
        Err(PercyError::Unsupported(format!(
            "native resize to {viewport}"
        )))
    }

    /// Short `name/version` identifier reported as environment info.
    fn environment_info(&self) -> String {
        "webdriver".to_string()
    }
}

/// A web element reference as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// Reads an element id out of a serialized reference. Bare strings are
    /// taken as ids already.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(id) => Some(Self(id.clone())),
            Value::Object(map) => map
                .get(W3C_ELEMENT_KEY)
                .or_else(|| map.get(LEGACY_ELEMENT_KEY))
                .and_then(Value::as_str)
                .map(|id| Self(id.to_string())),
            _ => None,
        }
    }
}

impl Serialize for ElementRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = Map::new();
        map.insert(W3C_ELEMENT_KEY.to_string(), Value::String(self.0.clone()));
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ElementRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("expected a web element reference"))
    }
}
