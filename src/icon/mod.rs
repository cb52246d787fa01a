//! Marker icon configuration
//!
//! An icon configuration is an open set of Leaflet icon properties
//! (`iconUrl`, `iconSize`, `html`, `circle_marker_options`, ...). Settings
//! forms leave unused properties as empty strings or as `{x: "", y: ""}`
//! pairs; those count as "not specified" when merging with the default icon
//! a map definition carries.
//!
//! # Modules
//!
//! - `tokens` - Per-row token substitution in icon templates
//! - `resolve` - Turning the merged configuration into a feature's icon

mod resolve;
mod tokens;

pub use resolve::{
    fill_icon_sizes, resolve_point_icon, BaseUrlResolver, IconSizer, NoopIconSizer,
    NoopUrlResolver, UrlResolver,
};
#[cfg(feature = "image-sizes")]
pub use resolve::LocalImageSizer;
pub use tokens::{TokenPatterns, TokenSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// How a point feature's marker is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconType {
    /// Image marker (`iconUrl`/`shadowUrl`)
    #[default]
    Marker,
    /// DivIcon built from the `html` template
    Html,
    /// Vector circle marker configured by `circle_marker_options`
    CircleMarker,
}

impl IconType {
    /// Parse an `iconType` value. Unknown values fall back to [`IconType::Marker`].
    pub fn parse(value: &str) -> Self {
        match value {
            "html" => IconType::Html,
            "circle_marker" => IconType::CircleMarker,
            _ => IconType::Marker,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IconType::Marker => "marker",
            IconType::Html => "html",
            IconType::CircleMarker => "circle_marker",
        }
    }
}

impl std::fmt::Display for IconType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Icon properties, keyed by Leaflet option name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconConfig(Map<String, Value>);

impl IconConfig {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// The blank icon a fresh style configuration starts from.
    pub fn form_defaults() -> Self {
        let pair = || json!({"x": "", "y": ""});
        let mut icon = Self::new();
        icon.set("iconUrl", "");
        icon.set("shadowUrl", "");
        icon.set("iconSize", pair());
        icon.set("iconAnchor", pair());
        icon.set("shadowAnchor", pair());
        icon.set("popupAnchor", pair());
        icon
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of a property; `None` when absent or not a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// String value of a property, only when it is non-empty.
    pub fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.get_str(key).filter(|s| !s.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no properties at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every property is empty in the sense of [`is_empty_value`].
    pub fn is_blank(&self) -> bool {
        self.0.values().all(is_empty_value)
    }

    pub fn icon_type(&self) -> IconType {
        self.get_str("iconType")
            .map(IconType::parse)
            .unwrap_or_default()
    }

    /// Copy of this configuration with every empty property removed.
    pub fn without_empty(&self) -> IconConfig {
        IconConfig(
            self.0
                .iter()
                .filter(|(_, value)| !is_empty_value(value))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    /// Merge this (style-level) configuration over a map-level default icon.
    ///
    /// Empty style properties are dropped so the defaults show through; every
    /// remaining style property replaces the default of the same name. A blank
    /// default icon leaves the style configuration as it is.
    pub fn merge_defaults(&self, defaults: &IconConfig) -> IconConfig {
        if defaults.is_empty() {
            return self.clone();
        }

        let mut merged = defaults.clone();
        for (key, value) in self.without_empty().0 {
            merged.0.insert(key, value);
        }
        merged
    }
}

/// Whether a configuration value counts as "not specified".
///
/// Null, `false`, the empty string and containers whose every leaf is empty
/// are empty. Numbers are never empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(_) => false,
        Value::Array(items) => items.iter().all(is_empty_value),
        Value::Object(map) => map.values().all(is_empty_value),
    }
}
