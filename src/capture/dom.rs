//! Page-side DOM serialization through the injected `PercyDOM` global.

use serde_json::{Map, Value};

use crate::driver::WebDriver;
use crate::{PercyError, Result};

/// Installs the page-side resize counter read by `RESIZE_COUNT_SCRIPT`.
pub(crate) const WAIT_FOR_RESIZE_SCRIPT: &str = "PercyDOM.waitForResize()";

/// Number of resize events seen since `WAIT_FOR_RESIZE_SCRIPT` ran.
pub(crate) const RESIZE_COUNT_SCRIPT: &str = "return window.resizeCount";

pub(crate) fn serialize_script(options: &Map<String, Value>) -> Result<String> {
    Ok(format!(
        "return PercyDOM.serialize({})",
        serde_json::to_string(options)?
    ))
}

/// Serializes the current page and attaches `cookies` to the record.
pub async fn serialize_dom(
    driver: &dyn WebDriver,
    options: &Map<String, Value>,
    cookies: &Value,
) -> Result<Map<String, Value>> {
    let script = serialize_script(options)?;
    match driver.execute_script(&script, Vec::new()).await? {
        Value::Object(mut snapshot) => {
            snapshot.insert("cookies".to_string(), cookies.clone());
            Ok(snapshot)
        }
        other => Err(PercyError::driver(format!(
            "PercyDOM.serialize returned {} instead of an object",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
