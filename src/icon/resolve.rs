//! Resolving a point feature's icon
//!
//! Takes the merged icon configuration and produces the icon attached to a
//! single feature: templates are filled with the row's tokens, image URLs are
//! made absolute and missing icon sizes are read from the images themselves.

use serde_json::{json, Value};
use url::Url;

use super::{IconConfig, IconType, TokenSet};

/// Turns relative icon paths into absolute URLs
pub trait UrlResolver {
    /// Resolve `url` to an absolute URL. External URLs are returned unchanged.
    fn absolute(&self, url: &str) -> String;
}

/// Leaves every URL as it is
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUrlResolver;

impl UrlResolver for NoopUrlResolver {
    fn absolute(&self, url: &str) -> String {
        url.to_string()
    }
}

/// Resolves site-relative paths against the site's base URL
#[derive(Debug, Clone)]
pub struct BaseUrlResolver {
    base: Url,
}

impl BaseUrlResolver {
    pub fn new(base: &str) -> crate::Result<Self> {
        let mut base = Url::parse(base).map_err(|e| {
            crate::LeafletError::ConfigError(format!("Invalid base URL '{}': {}", base, e))
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

/// A URL is external when it carries a scheme or is protocol-relative.
pub fn is_external(url: &str) -> bool {
    url.starts_with("//") || Url::parse(url).is_ok()
}

impl UrlResolver for BaseUrlResolver {
    fn absolute(&self, url: &str) -> String {
        if is_external(url) {
            return url.to_string();
        }

        // Paths are relative to the site base, with or without a leading slash
        match self.base.join(url.trim_start_matches('/')) {
            Ok(joined) => joined.to_string(),
            Err(e) => {
                tracing::debug!("Leaving icon URL '{}' unresolved: {}", url, e);
                url.to_string()
            }
        }
    }
}

/// Reads the intrinsic pixel size of an icon image
pub trait IconSizer {
    fn dimensions(&self, url: &str) -> Option<(u32, u32)>;
}

/// Never knows any image size
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIconSizer;

impl IconSizer for NoopIconSizer {
    fn dimensions(&self, _url: &str) -> Option<(u32, u32)> {
        None
    }
}

/// Reads image sizes from files below a local document root
///
/// The URL's path is looked up relative to `root`; URLs whose path climbs out
/// of the root are ignored.
#[cfg(feature = "image-sizes")]
#[derive(Debug, Clone)]
pub struct LocalImageSizer {
    root: std::path::PathBuf,
}

#[cfg(feature = "image-sizes")]
impl LocalImageSizer {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn local_path(&self, url: &str) -> Option<std::path::PathBuf> {
        let path = if let Some(rest) = url.strip_prefix("//") {
            Url::parse(&format!("http://{}", rest)).ok()?.path().to_string()
        } else if let Ok(parsed) = Url::parse(url) {
            parsed.path().to_string()
        } else {
            url.split(['?', '#']).next().unwrap_or_default().to_string()
        };

        let relative = path.trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[cfg(feature = "image-sizes")]
impl IconSizer for LocalImageSizer {
    fn dimensions(&self, url: &str) -> Option<(u32, u32)> {
        let path = self.local_path(url)?;
        match image::image_dimensions(&path) {
            Ok(dims) => Some(dims),
            Err(e) => {
                tracing::debug!("Cannot read icon size from {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Whether a `{x, y}` size value holds at least one positive dimension.
fn is_valid_size(value: Option<&Value>) -> bool {
    let Some(Value::Object(size)) = value else {
        return false;
    };
    ["x", "y"].iter().any(|axis| {
        size.get(*axis)
            .and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            })
            .map(|n| n > 0.0)
            .unwrap_or(false)
    })
}

/// Fill `iconSize`/`shadowSize` from the image files when they are missing
/// or invalid.
pub fn fill_icon_sizes(icon: &mut IconConfig, sizer: &dyn IconSizer) {
    for (url_key, size_key) in [("iconUrl", "iconSize"), ("shadowUrl", "shadowSize")] {
        if is_valid_size(icon.get(size_key)) {
            continue;
        }
        let Some(url) = icon.non_empty_str(url_key) else {
            continue;
        };
        if let Some((x, y)) = sizer.dimensions(url) {
            icon.set(size_key, json!({"x": x, "y": y}));
        }
    }
}

/// Build the icon of a single point feature from the merged configuration.
pub fn resolve_point_icon(
    icon: &IconConfig,
    tokens: &TokenSet,
    urls: &dyn UrlResolver,
    sizer: &dyn IconSizer,
) -> IconConfig {
    let mut resolved = icon.clone();

    match icon.icon_type() {
        IconType::Html => {
            let html = tokens.replace(icon.get_str("html").unwrap_or_default());
            resolved.set("html", html);
            if let Some(class) = icon.get("html_class") {
                resolved.set("html_class", class.clone());
            }
        }
        IconType::CircleMarker => {
            let options = tokens.replace(icon.get_str("circle_marker_options").unwrap_or_default());
            resolved.set("options", options);
        }
        IconType::Marker => {
            if let Some(template) = icon.non_empty_str("iconUrl") {
                resolved.set("iconUrl", resolve_url(template, tokens, urls));

                if let Some(shadow) = icon.non_empty_str("shadowUrl") {
                    resolved.set("shadowUrl", resolve_url(shadow, tokens, urls));
                }
            }
            fill_icon_sizes(&mut resolved, sizer);
        }
    }

    resolved
}

fn resolve_url(template: &str, tokens: &TokenSet, urls: &dyn UrlResolver) -> String {
    let url = tokens.replace(template);
    if url.is_empty() {
        url
    } else {
        urls.absolute(&url)
    }
}
