//! Leaflet settings writer
//!
//! Produces the JSON settings block a Leaflet client picks up:
//!
//! ```json
//! {
//!   "leaflet": {"<map id>": {"mapid": "<map id>", "map": {...}, "features": [...]}},
//!   "height": "400px",
//!   "libraries": ["leaflet/general"]
//! }
//! ```
//!
//! The empty render signal is written as `null`.

use serde_json::{json, Map, Value};

use crate::map::RenderOutput;
use crate::writer::Writer;
use crate::{LeafletError, Result};

/// Leaflet settings JSON writer
#[derive(Debug, Clone)]
pub struct LeafletWriter {
    pretty: bool,
}

impl LeafletWriter {
    /// Create a writer producing pretty-printed JSON
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Build the settings value without serializing it.
    pub fn to_value(&self, output: &RenderOutput) -> Result<Value> {
        self.validate(output)?;

        let Some(rendered) = output.rendered() else {
            return Ok(Value::Null);
        };
        let payload = &rendered.payload;
        let map_id = payload.map.id.clone().unwrap_or_default();

        let map = serde_json::to_value(&payload.map).map_err(|e| {
            LeafletError::WriterError(format!("Failed to serialize map settings: {}", e))
        })?;
        let features = serde_json::to_value(&payload.features).map_err(|e| {
            LeafletError::WriterError(format!("Failed to serialize features: {}", e))
        })?;

        let mut leaflet = Map::new();
        leaflet.insert(
            map_id.clone(),
            json!({"mapid": map_id, "map": map, "features": features}),
        );

        Ok(json!({
            "leaflet": leaflet,
            "height": rendered.height,
            "libraries": rendered.attachments,
        }))
    }
}

impl Default for LeafletWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer for LeafletWriter {
    type Output = String;

    fn write(&self, output: &RenderOutput) -> Result<String> {
        let settings = self.to_value(output)?;
        let serialized = if self.pretty {
            serde_json::to_string_pretty(&settings)
        } else {
            serde_json::to_string(&settings)
        };
        serialized.map_err(|e| {
            LeafletError::WriterError(format!("Failed to serialize Leaflet settings: {}", e))
        })
    }

    fn validate(&self, output: &RenderOutput) -> Result<()> {
        let Some(rendered) = output.rendered() else {
            return Ok(());
        };

        let map = &rendered.payload.map;
        if map.id.as_deref().map(str::is_empty).unwrap_or(true) {
            return Err(LeafletError::WriterError(
                "LeafletWriter requires a map id".to_string(),
            ));
        }
        if map.layers.is_empty() {
            return Err(LeafletError::WriterError(format!(
                "Map '{}' has no tile layers",
                map.label
            )));
        }

        for (idx, feature) in rendered.payload.features.iter().enumerate() {
            if feature.is_point() && (feature.lat().is_none() || feature.lon().is_none()) {
                return Err(LeafletError::WriterError(format!(
                    "Point feature {} is missing lat/lon",
                    idx
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Feature, FeatureType, MapRegistry, RenderPayload, RenderedMap};
    use crate::{FeatureBuilder, RenderContext, RowResult, StyleConfig};
    use std::collections::BTreeSet;

    fn render(rows: &[RowResult], config: &StyleConfig) -> RenderOutput {
        FeatureBuilder::new()
            .build(rows, config, &mut RenderContext::new("stores", "page_1"))
            .unwrap()
    }

    #[test]
    fn test_write_settings_block() {
        let config = StyleConfig::default()
            .with_geo_fields("lat", "lon")
            .with_name_field("name");
        let rows = vec![RowResult::new(0)
            .with_field("lat", "45.0")
            .with_field("lon", "9.0")
            .with_field("name", "A")];

        let json_str = LeafletWriter::new().write(&render(&rows, &config)).unwrap();
        let settings: Value = serde_json::from_str(&json_str).unwrap();

        let id = "leaflet-map-view-stores-page-1";
        assert_eq!(settings["height"], "400px");
        assert_eq!(settings["libraries"], json!(["leaflet/general"]));
        assert_eq!(settings["leaflet"][id]["mapid"], id);
        assert_eq!(settings["leaflet"][id]["map"]["label"], "OSM Mapnik");
        assert_eq!(settings["leaflet"][id]["map"]["id"], id);

        let features = settings["leaflet"][id]["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["type"], "point");
        assert_eq!(features[0]["lat"], 45.0);
        assert_eq!(features[0]["lon"], 9.0);
        assert_eq!(features[0]["label"], "A");
        assert!(features[0]["icon"].is_object());
    }

    #[test]
    fn test_empty_output_is_null() {
        let writer = LeafletWriter::new().compact();
        assert_eq!(writer.write(&RenderOutput::Empty).unwrap(), "null");
    }

    fn output_with(map_id: Option<&str>, features: Vec<Feature>) -> RenderOutput {
        let mut map = MapRegistry::builtin().get("OSM Mapnik").unwrap();
        map.id = map_id.map(str::to_string);
        RenderOutput::Map(RenderedMap {
            payload: RenderPayload { map, features },
            height: String::new(),
            attachments: BTreeSet::new(),
        })
    }

    #[test]
    fn test_validation_requires_map_id() {
        let writer = LeafletWriter::new();
        assert!(writer.validate(&output_with(None, vec![])).is_err());
        assert!(writer.validate(&output_with(Some(""), vec![])).is_err());
        assert!(writer.validate(&output_with(Some("map"), vec![])).is_ok());
    }

    #[test]
    fn test_validation_rejects_points_without_coordinates() {
        let writer = LeafletWriter::new();
        let output = output_with(Some("map"), vec![Feature::new(FeatureType::Point)]);
        let err = writer.write(&output).unwrap_err();
        assert!(err.to_string().contains("lat/lon"));

        let output = output_with(Some("map"), vec![Feature::new(FeatureType::Polygon)]);
        assert!(writer.write(&output).is_ok());
    }
}
