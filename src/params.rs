//! Request parameter set.
//!
//! Parameters are merged from a fixed default set and user-supplied
//! overrides, and only ever change through explicit operations
//! ([`ParameterSet::set`], [`ParameterSet::merge`],
//! [`ParameterSet::remove`]). The set is backed by a sorted map so query
//! strings serialize deterministically.

use std::collections::BTreeMap;

use serde_json::Value;

/// Key of the declared response image type (e.g. `"png"`).
pub const IMAGE_TYPE_KEY: &str = "imageType";

/// Key of the optional map name selecting a server-side map configuration.
pub const MAP_NAME_KEY: &str = "mapName";

/// Key of the optional JSON payload sent as the POST body.
pub const POST_DATA_KEY: &str = "postData";

/// Key of the requested image width in pixels.
pub const WIDTH_KEY: &str = "w";

/// Key of the requested image height in pixels.
pub const HEIGHT_KEY: &str = "h";

/// Key of the serialized bounding box.
pub const BBOX_KEY: &str = "b";

/// Key of the rendering density (pixels per inch).
pub const DPI_KEY: &str = "r";

/// Default rendering density, scaled by the pixel ratio for hidpi requests.
pub const DEFAULT_DPI: f64 = 90.0;

/// Mapping from parameter names to scalar/string values.
///
/// Values are [`serde_json::Value`]s so callers can supply numbers, strings,
/// or (for `postData`) structured JSON. Query serialization emits values
/// verbatim; the Spectrum Spatial image endpoint takes plain tokens and its
/// own `;` delimiters, so conventional form encoding does not apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: BTreeMap<String, Value>,
}

impl ParameterSet {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed defaults every request starts from: PNG output at 90 dpi.
    pub fn defaults() -> Self {
        let mut params = Self::new();
        params.set(IMAGE_TYPE_KEY, "png");
        params.set(DPI_KEY, DEFAULT_DPI as i64);
        params
    }

    /// Sets a single parameter, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Removes and returns the value for `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Overlays `overrides` onto this set; colliding keys take the
    /// override's value.
    pub fn merge(&mut self, overrides: &ParameterSet) {
        for (key, value) in &overrides.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Number of parameters in the set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the set holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(key, value)` pairs in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Serializes the set as a conventional `k=v&k=v` query string.
    ///
    /// No leading `?` is included; the URL builder appends one and then
    /// rewrites all delimiters to the endpoint's `;` form.
    pub fn query_string(&self) -> String {
        self.values
            .iter()
            .map(|(key, value)| format!("{}={}", key, value_to_query(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl FromIterator<(String, Value)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Renders a JSON value as a query-string token.
///
/// Strings are emitted without surrounding quotes; everything else uses its
/// compact JSON form.
pub(crate) fn value_to_query(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
