//! Wire types for the Percy CLI endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response header carrying the CLI version.
pub const CORE_VERSION_HEADER: &str = "x-percy-core-version";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Web,
    Automate,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleWidths {
    #[serde(default)]
    pub mobile: Vec<u32>,
    #[serde(default)]
    pub config: Vec<u32>,
}

/// What a compatible sidecar told us about the build.
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiationResult {
    /// `None` for services that predate session types.
    pub session_type: Option<SessionType>,
    pub eligible_widths: EligibleWidths,
    /// The CLI's resolved `.percy.yml` config.
    pub config: Value,
}

impl NegotiationResult {
    pub fn is_automate(&self) -> bool {
        self.session_type == Some(SessionType::Automate)
    }

    /// `config.percy.deferUploads`
    pub fn defer_uploads(&self) -> bool {
        config_flag(&self.config, "percy", "deferUploads")
    }

    /// `config.snapshot.responsiveSnapshotCapture`
    pub fn responsive_capture_default(&self) -> bool {
        config_flag(&self.config, "snapshot", "responsiveSnapshotCapture")
    }
}

fn config_flag(config: &Value, section: &str, key: &str) -> bool {
    config
        .get(section)
        .and_then(|section| section.get(key))
        .map(is_truthy)
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthcheckResponse {
    #[serde(default)]
    pub success: Value,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default, rename = "type")]
    pub session_type: Option<SessionType>,
    #[serde(default)]
    pub widths: Option<EligibleWidths>,
    #[serde(default)]
    pub config: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaptureResponse {
    #[serde(default)]
    pub success: Value,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl From<HealthcheckResponse> for NegotiationResult {
    fn from(health: HealthcheckResponse) -> Self {
        Self {
            session_type: health.session_type,
            eligible_widths: health.widths.unwrap_or_default(),
            config: health
                .config
                .filter(Value::is_object)
                .unwrap_or_else(|| Value::Object(Map::new())),
        }
    }
}

/// The CLI is loose about `success` (`true`, `"true"`, ...).
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub(crate) fn error_text(error: Option<&Value>) -> String {
    match error {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Null) | None => "unknown error".to_string(),
        Some(other) => other.to_string(),
    }
}
