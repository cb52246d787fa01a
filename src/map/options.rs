//! Style-level overrides of a map definition's settings

use serde_json::{json, Value};

use super::types::MapDescriptor;
use crate::config::StyleConfig;

/// Vector path style used when neither the style nor the map sets one
pub const DEFAULT_PATH: &str = r##"{"color":"#3388ff","opacity":"1.0","stroke":true,"weight":3,"fill":"depends","fillColor":"*","fillOpacity":"0.2","radius":"6"}"##;

const DEFAULT_MIN_ZOOM: i64 = 1;
const DEFAULT_MAX_ZOOM: i64 = 18;

/// Write the style configuration's position, zoom and control settings into
/// `map.settings`, falling back on the map definition's own values.
pub fn apply_style_overrides(map: &mut MapDescriptor, config: &StyleConfig) {
    let position = &config.map_position;

    let min_zoom = position
        .min_zoom
        .map(Value::from)
        .or_else(|| map.settings.get("minZoom").cloned())
        .unwrap_or_else(|| Value::from(DEFAULT_MIN_ZOOM));
    let max_zoom = position
        .max_zoom
        .map(Value::from)
        .or_else(|| map.settings.get("maxZoom").cloned())
        .unwrap_or_else(|| Value::from(DEFAULT_MAX_ZOOM));

    let scroll_wheel_zoom = if config.disable_wheel {
        Value::Bool(false)
    } else {
        map.settings
            .get("scrollWheelZoom")
            .cloned()
            .unwrap_or(Value::Bool(true))
    };

    let path = match (config.path(), &map.path) {
        (Some(path), _) => path.to_string(),
        (None, Some(map_path)) => map_path.to_string(),
        (None, None) => DEFAULT_PATH.to_string(),
    };

    let ajax_popup = config.ajax_popup || map.setting_enabled("ajaxPopup");

    let settings = &mut map.settings;
    settings.insert("map_position_force".to_string(), json!(position.force));
    settings.insert("zoom".to_string(), json!(position.zoom));
    settings.insert("zoomFiner".to_string(), json!(position.zoom_finer));
    settings.insert("minZoom".to_string(), min_zoom);
    settings.insert("maxZoom".to_string(), max_zoom);
    settings.insert(
        "center".to_string(),
        json!({"lat": position.center.lat, "lon": position.center.lon}),
    );
    settings.insert("scrollWheelZoom".to_string(), scroll_wheel_zoom);
    settings.insert("path".to_string(), Value::String(path));
    settings.insert(
        "leaflet_markercluster".to_string(),
        json!({
            "control": config.leaflet_markercluster.control,
            "options": config.leaflet_markercluster.options,
        }),
    );
    settings.insert(
        "fullscreen_control".to_string(),
        json!(config.fullscreen_control),
    );
    settings.insert("gestureHandling".to_string(), json!(config.gesture_handling));
    settings.insert(
        "reset_map".to_string(),
        json!({
            "control": config.reset_map.control,
            "position": config.reset_map.position,
        }),
    );
    settings.insert(
        "geocoder".to_string(),
        json!({
            "control": config.geocoder.control,
            "position": config.geocoder.position,
            "settings": config.geocoder.settings,
        }),
    );
    settings.insert("ajaxPopup".to_string(), json!(ajax_popup));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapRegistry;

    fn osm() -> MapDescriptor {
        MapRegistry::builtin().get("OSM Mapnik").unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let mut map = osm();
        apply_style_overrides(&mut map, &StyleConfig::default());

        assert_eq!(map.settings["zoom"], json!(12));
        assert_eq!(map.settings["minZoom"], json!(1));
        assert_eq!(map.settings["maxZoom"], json!(18));
        assert_eq!(map.settings["center"], json!({"lat": 0.0, "lon": 0.0}));
        assert_eq!(map.settings["scrollWheelZoom"], json!(true));
        assert_eq!(map.settings["path"], json!(DEFAULT_PATH));
        assert_eq!(map.settings["ajaxPopup"], json!(false));
        // Untouched map settings survive
        assert_eq!(map.settings["dragging"], json!(true));
    }

    #[test]
    fn test_zoom_bounds_fall_back_on_map_definition() {
        let mut map = osm();
        map.settings.insert("minZoom".to_string(), json!(4));
        map.settings.insert("maxZoom".to_string(), json!(16));

        let mut config = StyleConfig::default();
        config.map_position.max_zoom = Some(10);
        apply_style_overrides(&mut map, &config);

        assert_eq!(map.settings["minZoom"], json!(4));
        assert_eq!(map.settings["maxZoom"], json!(10));
    }

    #[test]
    fn test_disable_wheel() {
        let mut map = osm();
        let config = StyleConfig {
            disable_wheel: true,
            ..Default::default()
        };
        apply_style_overrides(&mut map, &config);
        assert_eq!(map.settings["scrollWheelZoom"], json!(false));
    }

    #[test]
    fn test_path_precedence() {
        let mut map = osm();
        map.path = Some(json!({"color": "red"}));
        apply_style_overrides(&mut map, &StyleConfig::default());
        assert_eq!(map.settings["path"], json!("{\"color\":\"red\"}"));

        let config = StyleConfig {
            path: Some("{\"color\":\"blue\"}".to_string()),
            ..Default::default()
        };
        apply_style_overrides(&mut map, &config);
        assert_eq!(map.settings["path"], json!("{\"color\":\"blue\"}"));
    }

    #[test]
    fn test_geocoder_control() {
        let mut map = osm();
        apply_style_overrides(&mut map, &StyleConfig::default());
        assert_eq!(map.settings["geocoder"]["control"], json!(false));

        let mut config = StyleConfig::default();
        config.geocoder.control = true;
        config.geocoder.position = "topleft".to_string();
        config
            .geocoder
            .settings
            .insert("zoom".to_string(), json!(16));
        apply_style_overrides(&mut map, &config);

        assert_eq!(
            map.settings["geocoder"],
            json!({"control": true, "position": "topleft", "settings": {"zoom": 16}})
        );
    }

    #[test]
    fn test_ajax_popup_from_style_or_map() {
        let mut map = osm();
        map.settings.insert("ajaxPopup".to_string(), json!(true));
        apply_style_overrides(&mut map, &StyleConfig::default());
        assert_eq!(map.settings["ajaxPopup"], json!(true));

        let mut map = osm();
        let config = StyleConfig {
            ajax_popup: true,
            ..Default::default()
        };
        apply_style_overrides(&mut map, &config);
        assert_eq!(map.settings["ajaxPopup"], json!(true));
    }
}
