//! Core types: result rows, features, map descriptors and render output

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::icon::IconConfig;

// ============================================================================
// Result rows
// ============================================================================

/// One record of the source result set
///
/// `values` holds the raw field values (used for coordinates), `rendered`
/// the display strings (used for popups, labels and icon tokens). A field
/// whose raw value is null has no rendered value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowResult {
    /// Position of the row within its result set
    pub index: usize,
    #[serde(default)]
    pub rendered: BTreeMap<String, String>,
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

impl RowResult {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Set a field's raw value and derive its rendered value from it.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Override only the rendered value of a field.
    pub fn with_rendered(mut self, name: impl Into<String>, rendered: impl Into<String>) -> Self {
        self.rendered.insert(name.into(), rendered.into());
        self
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match render_value(&value) {
            Some(rendered) => {
                self.rendered.insert(name.clone(), rendered);
            }
            None => {
                self.rendered.remove(&name);
            }
        }
        self.values.insert(name, value);
    }

    pub fn rendered(&self, field: &str) -> Option<&str> {
        self.rendered.get(field).map(String::as_str)
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Raw value of a coordinate field as text.
    ///
    /// Missing fields, nulls, blank strings and non-scalar values yield `None`.
    pub fn coordinate(&self, field: &str) -> Option<String> {
        match self.values.get(field)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Display string for a raw value; `None` for null.
pub fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1".to_string() } else { "0".to_string() }),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

// ============================================================================
// Features
// ============================================================================

/// Geometry kind of a feature, as the Leaflet client names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Point,
    Linestring,
    Polygon,
    Multipoint,
    Multipolyline,
    Multipolygon,
    Json,
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FeatureType::Point => "point",
            FeatureType::Linestring => "linestring",
            FeatureType::Polygon => "polygon",
            FeatureType::Multipoint => "multipoint",
            FeatureType::Multipolyline => "multipolyline",
            FeatureType::Multipolygon => "multipolygon",
            FeatureType::Json => "json",
        };
        write!(f, "{}", name)
    }
}

/// One renderable shape with its popup, label and icon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
    /// Geometry fields produced by the geometry service (`lat`/`lon` for points)
    #[serde(flatten)]
    pub geometry: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Feature {
    pub fn new(feature_type: FeatureType) -> Self {
        Self {
            feature_type,
            geometry: Map::new(),
            popup: None,
            label: None,
            icon: None,
            weight: None,
        }
    }

    pub fn point(lat: f64, lon: f64) -> Self {
        let mut feature = Self::new(FeatureType::Point);
        feature.geometry.insert("lat".to_string(), Value::from(lat));
        feature.geometry.insert("lon".to_string(), Value::from(lon));
        feature
    }

    pub fn is_point(&self) -> bool {
        self.feature_type == FeatureType::Point
    }

    pub fn lat(&self) -> Option<f64> {
        self.geometry.get("lat").and_then(Value::as_f64)
    }

    pub fn lon(&self) -> Option<f64> {
        self.geometry.get("lon").and_then(Value::as_f64)
    }
}

// ============================================================================
// Map descriptors
// ============================================================================

/// A tile layer of a map definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    #[serde(rename = "urlTemplate")]
    pub url_template: String,
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// Map configuration handed to the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDescriptor {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Leaflet map options plus the adapter's own settings (`ajaxPopup`, ...)
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub layers: BTreeMap<String, TileLayer>,
    /// Default icon that style-level icon settings are merged over
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconConfig>,
    /// Default vector path style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MapDescriptor {
    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    /// Whether a setting is present and truthy.
    pub fn setting_enabled(&self, key: &str) -> bool {
        match self.settings.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
            Some(Value::String(s)) => !s.is_empty() && s != "0",
            Some(Value::Object(o)) => !o.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            _ => false,
        }
    }

    /// The map's default icon, when it has a non-empty one.
    pub fn default_icon(&self) -> Option<&IconConfig> {
        self.icon.as_ref().filter(|icon| !icon.is_empty())
    }
}

// ============================================================================
// Render output
// ============================================================================

/// The `{map, features}` payload consumed by the map renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPayload {
    pub map: MapDescriptor,
    pub features: Vec<Feature>,
}

/// A map that should be drawn, with what the client needs to draw it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMap {
    pub payload: RenderPayload,
    /// CSS height of the map container (`"400px"`), empty when unset
    pub height: String,
    /// Client libraries the output depends on
    pub attachments: BTreeSet<String>,
}

/// Result of a render pass
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutput {
    /// Nothing to render: no features and empty maps are hidden
    Empty,
    Map(RenderedMap),
}

impl RenderOutput {
    pub fn is_empty(&self) -> bool {
        matches!(self, RenderOutput::Empty)
    }

    pub fn rendered(&self) -> Option<&RenderedMap> {
        match self {
            RenderOutput::Empty => None,
            RenderOutput::Map(rendered) => Some(rendered),
        }
    }

    pub fn payload(&self) -> Option<&RenderPayload> {
        self.rendered().map(|r| &r.payload)
    }

    pub fn features(&self) -> &[Feature] {
        self.payload().map(|p| p.features.as_slice()).unwrap_or(&[])
    }
}
