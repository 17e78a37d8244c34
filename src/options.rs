//! Per-call options for snapshots and Automate screenshots.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::driver::ElementRef;

/// Options accepted by [`PercyClient::snapshot`](crate::PercyClient::snapshot).
///
/// Everything in `extra` is forwarded untouched, both to the page-side DOM
/// serializer and to the sidecar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotOptions {
    /// Single width to capture; takes precedence over `widths`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub widths: Vec<u32>,
    #[serde(
        default,
        alias = "responsiveSnapshotCapture",
        skip_serializing_if = "Option::is_none"
    )]
    pub responsive_snapshot_capture: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SnapshotOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn widths(mut self, widths: impl IntoIterator<Item = u32>) -> Self {
        self.widths = widths.into_iter().collect();
        self
    }

    pub fn responsive(mut self, enabled: bool) -> Self {
        self.responsive_snapshot_capture = Some(enabled);
        self
    }

    /// Sets any option by its wire name.
    ///
    /// `width`, `widths` and the responsive flag (either spelling) land in
    /// their typed fields. A value of the wrong type for one of those keys
    /// is forwarded untouched in `extra`.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            "width" => match as_width(&value) {
                Some(width) => self.width = Some(width),
                None => self.keep_extra(key, value),
            },
            "widths" => match as_widths(&value) {
                Some(widths) => self.widths = widths,
                None => self.keep_extra(key, value),
            },
            "responsive_snapshot_capture" | "responsiveSnapshotCapture" => match value.as_bool() {
                Some(enabled) => self.responsive_snapshot_capture = Some(enabled),
                None => self.keep_extra(key, value),
            },
            _ => self.keep_extra(key, value),
        }
        self
    }

    fn keep_extra(&mut self, key: String, value: Value) {
        self.extra.insert(key, value);
    }

    /// The options as a JSON object, the shape the serializer and the
    /// snapshot endpoint expect.
    pub fn to_json_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => self.extra.clone(),
        }
    }
}

fn as_width(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|width| u32::try_from(width).ok())
}

fn as_widths(value: &Value) -> Option<Vec<u32>> {
    value.as_array()?.iter().map(as_width).collect()
}

const IGNORE_ALIAS: &str = "ignoreRegionSeleniumElements";
const CONSIDER_ALIAS: &str = "considerRegionSeleniumElements";
const IGNORE_ELEMENTS: &str = "ignore_region_selenium_elements";
const CONSIDER_ELEMENTS: &str = "consider_region_selenium_elements";
const IGNORE_IDS: &str = "ignore_region_elements";
const CONSIDER_IDS: &str = "consider_region_elements";

/// Rewrites Automate screenshot options into the shape the sidecar wants.
///
/// camelCase element keys are renamed to snake_case, then both element lists
/// are replaced by plain element ids under `ignore_region_elements` and
/// `consider_region_elements`. Both id keys are always present.
pub fn normalize_screenshot_options(mut options: Map<String, Value>) -> Map<String, Value> {
    for (alias, canonical) in [(IGNORE_ALIAS, IGNORE_ELEMENTS), (CONSIDER_ALIAS, CONSIDER_ELEMENTS)] {
        if let Some(value) = options.remove(alias) {
            options.insert(canonical.to_string(), value);
        }
    }

    let ignore = element_ids(options.remove(IGNORE_ELEMENTS));
    let consider = element_ids(options.remove(CONSIDER_ELEMENTS));
    options.insert(IGNORE_IDS.to_string(), ignore);
    options.insert(CONSIDER_IDS.to_string(), consider);
    options
}

fn element_ids(elements: Option<Value>) -> Value {
    let ids = match elements {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(ElementRef::from_value)
            .map(|element| Value::String(element.0))
            .collect(),
        Some(single) => ElementRef::from_value(&single)
            .map(|element| vec![Value::String(element.0)])
            .unwrap_or_default(),
        None => Vec::new(),
    };
    Value::Array(ids)
}
