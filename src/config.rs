//! Style configuration
//!
//! `StyleConfig` collects everything a settings form would ask for: which
//! fields carry the coordinates, which ones feed popups and labels, the
//! marker icon, map position and the client-side controls. Every field has a
//! default so a partial JSON document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::icon::IconConfig;
use crate::map::DEFAULT_MAP;
use crate::{LeafletError, Result};

/// CSS units accepted for the map height
pub const HEIGHT_UNITS: &[&str] = &["px", "%", "vh", "em", "rem"];

/// Which fields hold latitude and longitude
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoFieldSelector {
    pub leaflet_lat: Option<String>,
    pub leaflet_long: Option<String>,
}

impl GeoFieldSelector {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            leaflet_lat: Some(lat.into()),
            leaflet_long: Some(lon.into()),
        }
    }

    pub fn lat(&self) -> Option<&str> {
        non_empty(&self.leaflet_lat)
    }

    pub fn lon(&self) -> Option<&str> {
        non_empty(&self.leaflet_long)
    }

    /// Both field names, when both are configured.
    pub fn fields(&self) -> Option<(&str, &str)> {
        Some((self.lat()?, self.lon()?))
    }
}

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

/// Initial position and zoom limits of the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapPosition {
    /// Use `center`/`zoom` instead of fitting the map to its features
    pub force: bool,
    pub center: Center,
    pub zoom: i64,
    #[serde(rename = "minZoom")]
    pub min_zoom: Option<i64>,
    #[serde(rename = "maxZoom")]
    pub max_zoom: Option<i64>,
    #[serde(rename = "zoomFiner")]
    pub zoom_finer: i64,
}

impl Default for MapPosition {
    fn default() -> Self {
        Self {
            force: false,
            center: Center::default(),
            zoom: 12,
            min_zoom: None,
            max_zoom: None,
            zoom_finer: 0,
        }
    }
}

/// Control that resets the map to its initial view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetMapControl {
    pub control: bool,
    pub position: String,
}

impl Default for ResetMapControl {
    fn default() -> Self {
        Self {
            control: false,
            position: "topright".to_string(),
        }
    }
}

/// Marker clustering, performed client-side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerCluster {
    pub control: bool,
    /// Cluster options as a JSON object string
    pub options: String,
}

/// Address search control, drawn by the client's geocoder plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderControl {
    pub control: bool,
    pub position: String,
    /// Provider and behaviour options passed through to the plugin
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl Default for GeocoderControl {
    fn default() -> Self {
        Self {
            control: false,
            position: "topright".to_string(),
            settings: serde_json::Map::new(),
        }
    }
}

/// Style settings of one map display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Identifier of the base map definition
    pub leaflet_map: String,
    pub height: String,
    pub height_unit: String,
    /// Render nothing when no row produced a feature
    pub hide_empty_map: bool,
    pub disable_wheel: bool,
    pub fullscreen_control: bool,
    pub gesture_handling: bool,
    pub reset_map: ResetMapControl,
    pub map_position: MapPosition,
    pub leaflet_geo: GeoFieldSelector,
    pub name_field: Option<String>,
    pub description_field: Option<String>,
    pub icon: IconConfig,
    /// Vector path style as a JSON object string
    pub path: Option<String>,
    pub leaflet_markercluster: MarkerCluster,
    pub geocoder: GeocoderControl,
    /// Load popups through the client's ajax support
    pub ajax_popup: bool,
    /// Stable-sort features by their `weight`
    pub sort_by_weight: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            leaflet_map: DEFAULT_MAP.to_string(),
            height: "400".to_string(),
            height_unit: "px".to_string(),
            hide_empty_map: false,
            disable_wheel: false,
            fullscreen_control: false,
            gesture_handling: false,
            reset_map: ResetMapControl::default(),
            map_position: MapPosition::default(),
            leaflet_geo: GeoFieldSelector::default(),
            name_field: None,
            description_field: None,
            icon: IconConfig::form_defaults(),
            path: None,
            leaflet_markercluster: MarkerCluster::default(),
            geocoder: GeocoderControl::default(),
            ajax_popup: false,
            sort_by_weight: false,
        }
    }
}

impl StyleConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            LeafletError::ConfigError(format!("Failed to parse style configuration: {}", e))
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn with_geo_fields(mut self, lat: impl Into<String>, lon: impl Into<String>) -> Self {
        self.leaflet_geo = GeoFieldSelector::new(lat, lon);
        self
    }

    pub fn with_name_field(mut self, field: impl Into<String>) -> Self {
        self.name_field = Some(field.into());
        self
    }

    pub fn with_description_field(mut self, field: impl Into<String>) -> Self {
        self.description_field = Some(field.into());
        self
    }

    pub fn with_icon(mut self, icon: IconConfig) -> Self {
        self.icon = icon;
        self
    }

    pub fn name_field(&self) -> Option<&str> {
        non_empty(&self.name_field)
    }

    pub fn description_field(&self) -> Option<&str> {
        non_empty(&self.description_field)
    }

    pub fn path(&self) -> Option<&str> {
        non_empty(&self.path)
    }

    /// CSS height of the map container, empty when no height is set.
    pub fn map_height(&self) -> String {
        let height = self.height.trim();
        if height.is_empty() {
            String::new()
        } else {
            format!("{}{}", height, self.height_unit)
        }
    }

    /// Check for setup mistakes that would otherwise surface as odd maps.
    pub fn validate(&self) -> Result<()> {
        let geo = &self.leaflet_geo;
        if geo.lat().is_some() != geo.lon().is_some() {
            return Err(LeafletError::ValidationError(
                "Latitude and longitude fields must be configured together".to_string(),
            ));
        }

        let height = self.height.trim();
        if !height.is_empty() && height.parse::<f64>().map(|h| h < 0.0).unwrap_or(true) {
            return Err(LeafletError::ValidationError(format!(
                "Map height '{}' is not a non-negative number",
                self.height
            )));
        }
        if !height.is_empty() && !HEIGHT_UNITS.contains(&self.height_unit.as_str()) {
            return Err(LeafletError::ValidationError(format!(
                "Unknown height unit '{}'. Expected one of: {}",
                self.height_unit,
                HEIGHT_UNITS.join(", ")
            )));
        }

        let position = &self.map_position;
        if !(-90.0..=90.0).contains(&position.center.lat)
            || !(-180.0..=180.0).contains(&position.center.lon)
        {
            return Err(LeafletError::ValidationError(format!(
                "Map center ({}, {}) is outside valid coordinates",
                position.center.lat, position.center.lon
            )));
        }
        if let (Some(min), Some(max)) = (position.min_zoom, position.max_zoom) {
            if min > max {
                return Err(LeafletError::ValidationError(format!(
                    "minZoom {} is greater than maxZoom {}",
                    min, max
                )));
            }
        }

        if let Some(path) = self.path() {
            validate_json_object("path", path)?;
        }
        let cluster = &self.leaflet_markercluster;
        if !cluster.options.trim().is_empty() {
            validate_json_object("leaflet_markercluster.options", &cluster.options)?;
        }

        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn validate_json_object(name: &str, value: &str) -> Result<()> {
    match serde_json::from_str::<serde_json::Value>(value) {
        Ok(serde_json::Value::Object(_)) => Ok(()),
        Ok(_) => Err(LeafletError::ValidationError(format!(
            "'{}' must be a JSON object",
            name
        ))),
        Err(e) => Err(LeafletError::ValidationError(format!(
            "'{}' is not valid JSON: {}",
            name, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StyleConfig::default();
        assert_eq!(config.leaflet_map, "OSM Mapnik");
        assert_eq!(config.map_height(), "400px");
        assert_eq!(config.map_position.zoom, 12);
        assert!(config.icon.is_blank());
        assert!(config.leaflet_geo.fields().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = StyleConfig::from_json(
            r#"{
                "leaflet_geo": {"leaflet_lat": "lat", "leaflet_long": "lon"},
                "name_field": "title",
                "description_field": "",
                "hide_empty_map": true,
                "map_position": {"zoom": 5, "minZoom": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(config.leaflet_geo.fields(), Some(("lat", "lon")));
        assert_eq!(config.name_field(), Some("title"));
        assert_eq!(config.description_field(), None);
        assert!(config.hide_empty_map);
        assert_eq!(config.map_position.zoom, 5);
        assert_eq!(config.map_position.min_zoom, Some(2));
        assert_eq!(config.map_position.max_zoom, None);
        assert_eq!(config.height_unit, "px");
        assert_eq!(config.geocoder, GeocoderControl::default());
    }

    #[test]
    fn test_geocoder_from_json() {
        let config = StyleConfig::from_json(
            r#"{"geocoder": {"control": true, "settings": {"min_terms": 4, "providers": {"nominatim": {"checked": true}}}}}"#,
        )
        .unwrap();
        assert!(config.geocoder.control);
        assert_eq!(config.geocoder.position, "topright");
        assert_eq!(config.geocoder.settings["min_terms"], serde_json::json!(4));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = StyleConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, LeafletError::ConfigError(_)));
    }

    #[test]
    fn test_map_height() {
        let mut config = StyleConfig::default();
        config.height = "80".to_string();
        config.height_unit = "vh".to_string();
        assert_eq!(config.map_height(), "80vh");

        config.height = String::new();
        assert_eq!(config.map_height(), "");
    }

    #[test]
    fn test_validate_half_configured_geo_fields() {
        let mut config = StyleConfig::default();
        config.leaflet_geo.leaflet_lat = Some("lat".to_string());
        assert!(config.validate().is_err());

        config.leaflet_geo.leaflet_long = Some("lon".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_height() {
        let mut config = StyleConfig::default();
        config.height = "tall".to_string();
        assert!(config.validate().is_err());

        config.height = "400".to_string();
        config.height_unit = "furlong".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("furlong"));
    }

    #[test]
    fn test_validate_zoom_and_center() {
        let mut config = StyleConfig::default();
        config.map_position.min_zoom = Some(10);
        config.map_position.max_zoom = Some(5);
        assert!(config.validate().is_err());

        let mut config = StyleConfig::default();
        config.map_position.center = Center { lat: 95.0, lon: 0.0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_json_options() {
        let mut config = StyleConfig::default();
        config.path = Some("{\"color\": \"#ff0000\"}".to_string());
        assert!(config.validate().is_ok());

        config.path = Some("[1]".to_string());
        assert!(config.validate().is_err());

        config.path = None;
        config.leaflet_markercluster.options = "{broken".to_string();
        assert!(config.validate().is_err());
    }
}
