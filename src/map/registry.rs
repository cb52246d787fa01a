//! Map definitions available to style configurations
//!
//! A registry maps identifiers (`"OSM Mapnik"`) to map descriptor templates:
//! tile layers, interaction settings and optionally a default icon. The
//! built-in registry only knows the OpenStreetMap default; more definitions
//! can be registered in code or loaded from a JSON file.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use super::types::{MapDescriptor, TileLayer};
use crate::{LeafletError, Result};

/// Identifier of the built-in OpenStreetMap definition
pub const DEFAULT_MAP: &str = "OSM Mapnik";

/// Named map descriptor templates
#[derive(Debug, Clone, Default)]
pub struct MapRegistry {
    maps: BTreeMap<String, MapDescriptor>,
}

impl MapRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in definitions
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(DEFAULT_MAP, osm_mapnik());
        registry
    }

    /// Add or replace a definition.
    pub fn register(&mut self, id: impl Into<String>, map: MapDescriptor) {
        self.maps.insert(id.into(), map);
    }

    /// Look up a definition by identifier; returns an owned copy to customise.
    pub fn get(&self, id: &str) -> Result<MapDescriptor> {
        self.maps.get(id).cloned().ok_or_else(|| {
            LeafletError::ConfigError(format!(
                "Unknown map definition '{}'. Available: {}",
                id,
                self.ids().join(", ")
            ))
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.maps.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.maps.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MapDescriptor)> {
        self.maps.iter().map(|(id, map)| (id.as_str(), map))
    }

    /// Register every definition of a JSON object keyed by identifier.
    ///
    /// Returns the number of definitions added.
    pub fn load_json(&mut self, json: &str) -> Result<usize> {
        let maps: BTreeMap<String, MapDescriptor> = serde_json::from_str(json).map_err(|e| {
            LeafletError::ConfigError(format!("Failed to parse map definitions: {}", e))
        })?;
        let count = maps.len();
        for (id, map) in maps {
            tracing::debug!("Registering map definition '{}'", id);
            self.register(id, map);
        }
        Ok(count)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        self.load_json(&content)
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn osm_mapnik() -> MapDescriptor {
    let mut layers = BTreeMap::new();
    layers.insert(
        "earth".to_string(),
        TileLayer {
            url_template: "//{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            options: object(json!({
                "attribution": "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
            })),
        },
    );

    MapDescriptor {
        label: DEFAULT_MAP.to_string(),
        description: "Leaflet default map.".to_string(),
        settings: object(json!({
            "dragging": true,
            "touchZoom": true,
            "scrollWheelZoom": true,
            "doubleClickZoom": true,
            "zoomControl": true,
            "attributionControl": true,
            "trackResize": true,
            "fadeAnimation": true,
            "zoomAnimation": true,
            "closePopupOnClick": true,
        })),
        layers,
        icon: None,
        path: None,
        id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = MapRegistry::builtin();
        let map = registry.get(DEFAULT_MAP).unwrap();
        assert_eq!(map.label, "OSM Mapnik");
        assert!(map.layers.contains_key("earth"));
        assert_eq!(map.settings["scrollWheelZoom"], json!(true));
        assert!(map.icon.is_none());
    }

    #[test]
    fn test_unknown_map_is_config_error() {
        let registry = MapRegistry::builtin();
        let err = registry.get("Nope").unwrap_err();
        assert!(matches!(err, LeafletError::ConfigError(_)));
        assert!(err.to_string().contains("Nope"));
        assert!(err.to_string().contains("OSM Mapnik"));
    }

    #[test]
    fn test_load_json_definitions() {
        let mut registry = MapRegistry::builtin();
        let count = registry
            .load_json(
                r#"{
                    "Stores": {
                        "label": "Stores",
                        "settings": {"minZoom": 3, "ajaxPopup": true},
                        "layers": {
                            "base": {"urlTemplate": "https://tiles.example.com/{z}/{x}/{y}.png"}
                        },
                        "icon": {"iconUrl": "/icons/store.png"}
                    }
                }"#,
            )
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(registry.ids(), vec!["OSM Mapnik", "Stores"]);

        let map = registry.get("Stores").unwrap();
        assert_eq!(map.settings["minZoom"], json!(3));
        assert_eq!(
            map.default_icon().and_then(|i| i.get_str("iconUrl")),
            Some("/icons/store.png")
        );
    }

    #[test]
    fn test_load_json_rejects_malformed_input() {
        let mut registry = MapRegistry::new();
        assert!(registry.load_json("[1, 2]").is_err());
        assert!(registry.load_json(r#"{"x": {"layers": {"a": {}}}}"#).is_err());
    }
}
