//! Feature building pipeline
//!
//! Turns result rows into a render payload:
//!
//! ```text
//! StyleConfig ──► MapRegistry lookup ──► style overrides ──► icon merge (once)
//!                                                                 │
//! rows ──► lat/lon extraction ──► GeometryService ──► popup/label/icon ──► hooks
//!                                                                 │
//!                       weight sort (optional) ◄── collect in row order
//!                                 │
//!                 empty + hide_empty_map? ──► RenderOutput::Empty
//!                                 │
//!                 payload hooks ──► RenderOutput::Map
//! ```
//!
//! Rows are independent of each other. Across rows only the merged icon
//! configuration, computed before the first row is visited, and the compiled
//! token patterns are shared.

use std::collections::BTreeSet;

use crate::config::StyleConfig;
use crate::geometry::{point_wkt, GeometryService, WktPointService};
use crate::html::{decode_entities, HtmlIds};
use crate::icon::{
    resolve_point_icon, IconConfig, IconSizer, NoopIconSizer, NoopUrlResolver, TokenPatterns,
    UrlResolver,
};
use crate::map::{
    apply_style_overrides, Feature, MapDescriptor, MapRegistry, RenderOutput, RenderPayload,
    RenderedMap, RowResult,
};
use crate::{LeafletError, Result};

/// Prefix of map container ids unless a render context sets its own
pub const DEFAULT_MAP_ID_PREFIX: &str = "leaflet_map_view";

/// Client library every map needs
pub const LIBRARY_LEAFLET: &str = "leaflet/general";
/// Client library needed for popups loaded through ajax
pub const LIBRARY_AJAX: &str = "core/drupal.ajax";
/// Client library needed for marker clustering
pub const LIBRARY_MARKERCLUSTER: &str = "leaflet_markercluster/leaflet-markercluster";

/// What feature hooks get to see besides the feature and its row
pub struct HookContext<'a> {
    pub config: &'a StyleConfig,
    pub map: &'a MapDescriptor,
    /// Icon configuration after merging with the map's default icon
    pub icon: &'a IconConfig,
}

/// Called for every finished feature before it is collected
pub type FeatureHook = Box<dyn Fn(&mut Feature, &RowResult, &HookContext<'_>) + Send + Sync>;

/// Called once with the complete payload before it is returned
pub type PayloadHook = Box<dyn Fn(&mut RenderPayload, &StyleConfig) + Send + Sync>;

/// Request-scoped state of a render pass
///
/// Identifies the display being rendered and keeps map container ids unique
/// when one request renders several maps.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub view_id: String,
    pub display_id: String,
    id_prefix: Option<String>,
    ids: HtmlIds,
}

impl RenderContext {
    pub fn new(view_id: impl Into<String>, display_id: impl Into<String>) -> Self {
        Self {
            view_id: view_id.into(),
            display_id: display_id.into(),
            id_prefix: None,
            ids: HtmlIds::new(),
        }
    }

    /// Use `prefix` instead of [`DEFAULT_MAP_ID_PREFIX`] for map ids.
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    /// Next unique container id for this display's map.
    pub fn map_id(&mut self) -> String {
        let prefix = self.id_prefix.as_deref().unwrap_or(DEFAULT_MAP_ID_PREFIX);
        let base = format!("{}_{}_{}", prefix, self.view_id, self.display_id);
        self.ids.unique_id(&base)
    }
}

/// Builds render payloads from result rows
pub struct FeatureBuilder {
    registry: MapRegistry,
    geometry: Box<dyn GeometryService + Send + Sync>,
    urls: Box<dyn UrlResolver + Send + Sync>,
    sizer: Box<dyn IconSizer + Send + Sync>,
    feature_hooks: Vec<FeatureHook>,
    payload_hooks: Vec<PayloadHook>,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureBuilder {
    /// Builder with the built-in maps, WKT points, unresolved URLs and no
    /// image sizing.
    pub fn new() -> Self {
        Self {
            registry: MapRegistry::builtin(),
            geometry: Box::new(WktPointService::new()),
            urls: Box::new(NoopUrlResolver),
            sizer: Box::new(NoopIconSizer),
            feature_hooks: Vec::new(),
            payload_hooks: Vec::new(),
        }
    }

    pub fn with_registry(mut self, registry: MapRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_geometry_service(
        mut self,
        service: impl GeometryService + Send + Sync + 'static,
    ) -> Self {
        self.geometry = Box::new(service);
        self
    }

    pub fn with_url_resolver(mut self, resolver: impl UrlResolver + Send + Sync + 'static) -> Self {
        self.urls = Box::new(resolver);
        self
    }

    pub fn with_icon_sizer(mut self, sizer: impl IconSizer + Send + Sync + 'static) -> Self {
        self.sizer = Box::new(sizer);
        self
    }

    /// Register a hook run on every feature, in registration order.
    pub fn add_feature_hook<F>(&mut self, hook: F)
    where
        F: Fn(&mut Feature, &RowResult, &HookContext<'_>) + Send + Sync + 'static,
    {
        self.feature_hooks.push(Box::new(hook));
    }

    /// Register a hook run on the finished payload, in registration order.
    pub fn add_payload_hook<F>(&mut self, hook: F)
    where
        F: Fn(&mut RenderPayload, &StyleConfig) + Send + Sync + 'static,
    {
        self.payload_hooks.push(Box::new(hook));
    }

    pub fn registry(&self) -> &MapRegistry {
        &self.registry
    }

    /// Run one render pass over `rows`.
    ///
    /// # Errors
    ///
    /// - `ConfigError` when the configured map definition does not exist
    /// - `GeometryError` when a row's coordinates are rejected by the
    ///   geometry service
    pub fn build(
        &self,
        rows: &[RowResult],
        config: &StyleConfig,
        context: &mut RenderContext,
    ) -> Result<RenderOutput> {
        let mut map = self.registry.get(&config.leaflet_map)?;
        apply_style_overrides(&mut map, config);
        map.id = Some(context.map_id());

        let icon = match map.default_icon() {
            Some(defaults) => config.icon.merge_defaults(defaults),
            None => config.icon.clone(),
        };

        let mut features = Vec::new();
        match config.leaflet_geo.fields() {
            Some((lat_field, lon_field)) => {
                let hook_context = HookContext {
                    config,
                    map: &map,
                    icon: &icon,
                };
                let mut patterns = TokenPatterns::new();
                for row in rows {
                    features.extend(self.build_row(
                        row,
                        lat_field,
                        lon_field,
                        &hook_context,
                        &mut patterns,
                    )?);
                }
            }
            None => tracing::debug!("No latitude/longitude fields configured"),
        }

        tracing::debug!(
            "Built {} feature(s) from {} row(s) for map '{}'",
            features.len(),
            rows.len(),
            config.leaflet_map
        );

        if features.is_empty() && config.hide_empty_map {
            return Ok(RenderOutput::Empty);
        }

        if config.sort_by_weight {
            sort_by_weight(&mut features);
        }

        let mut payload = RenderPayload { map, features };
        for hook in &self.payload_hooks {
            hook(&mut payload, config);
        }

        let attachments = attachments(&payload.map, config);
        Ok(RenderOutput::Map(RenderedMap {
            payload,
            height: config.map_height(),
            attachments,
        }))
    }

    fn build_row(
        &self,
        row: &RowResult,
        lat_field: &str,
        lon_field: &str,
        context: &HookContext<'_>,
        patterns: &mut TokenPatterns,
    ) -> Result<Vec<Feature>> {
        let (Some(lat), Some(lon)) = (row.coordinate(lat_field), row.coordinate(lon_field)) else {
            tracing::debug!("Skipping row {}: missing coordinates", row.index);
            return Ok(Vec::new());
        };

        let mut features = self
            .geometry
            .process(&[point_wkt(&lat, &lon)])
            .map_err(|e| match e {
                LeafletError::GeometryError(msg) => {
                    LeafletError::GeometryError(format!("Row {}: {}", row.index, msg))
                }
                other => other,
            })?;

        let config = context.config;
        let popup = config
            .description_field()
            .and_then(|field| row.rendered(field))
            .map(str::to_string);
        let label = config
            .name_field()
            .and_then(|field| row.rendered(field))
            .map(decode_entities)
            .filter(|label| !label.is_empty());

        let tokens = features
            .iter()
            .any(Feature::is_point)
            .then(|| patterns.tokens_for(row));

        for feature in &mut features {
            if let Some(popup) = &popup {
                feature.popup = Some(popup.clone());
            }
            if let Some(label) = &label {
                feature.label = Some(label.clone());
            }
            if feature.is_point() {
                if let Some(tokens) = &tokens {
                    feature.icon = Some(resolve_point_icon(
                        context.icon,
                        tokens,
                        self.urls.as_ref(),
                        self.sizer.as_ref(),
                    ));
                }
            }
            for hook in &self.feature_hooks {
                hook(feature, row, context);
            }
        }

        Ok(features)
    }
}

/// Stable sort by `weight`; features without one weigh 0.
pub fn sort_by_weight(features: &mut [Feature]) {
    features.sort_by(|a, b| a.weight.unwrap_or(0.0).total_cmp(&b.weight.unwrap_or(0.0)));
}

fn attachments(map: &MapDescriptor, config: &StyleConfig) -> BTreeSet<String> {
    let mut libraries = BTreeSet::new();
    libraries.insert(LIBRARY_LEAFLET.to_string());
    if map.setting_enabled("ajaxPopup") {
        libraries.insert(LIBRARY_AJAX.to_string());
    }
    if config.leaflet_markercluster.control {
        libraries.insert(LIBRARY_MARKERCLUSTER.to_string());
    }
    libraries
}
