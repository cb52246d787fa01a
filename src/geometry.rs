//! Geometry service: coordinate text to features
//!
//! The feature builder only ever asks for points, written as WKT
//! (`POINT (lon lat)`). Richer services (lines, polygons, GeoJSON) can be
//! plugged in through [`GeometryService`].

use regex::Regex;
use std::sync::OnceLock;

use crate::map::Feature;
use crate::{LeafletError, Result};

/// Converts geometry values into renderable features
pub trait GeometryService {
    /// Turn each WKT value into one or more features.
    ///
    /// # Errors
    ///
    /// Returns `LeafletError::GeometryError` when a value cannot be parsed.
    fn process(&self, values: &[String]) -> Result<Vec<Feature>>;
}

/// WKT for a point at the given coordinates; WKT puts longitude first.
pub fn point_wkt(lat: &str, lon: &str) -> String {
    format!("POINT ({} {})", lon, lat)
}

fn point_regex() -> &'static Regex {
    static POINT: OnceLock<Regex> = OnceLock::new();
    POINT.get_or_init(|| {
        Regex::new(r"(?i)^\s*POINT\s*\(\s*(\S+)\s+(\S+)\s*\)\s*$").expect("point pattern is valid")
    })
}

/// Parses WKT points into point features
#[derive(Debug, Default, Clone, Copy)]
pub struct WktPointService;

impl WktPointService {
    pub fn new() -> Self {
        Self
    }

    fn parse_point(&self, wkt: &str) -> Result<Feature> {
        let caps = point_regex().captures(wkt).ok_or_else(|| {
            LeafletError::GeometryError(format!("Unsupported or malformed geometry '{}'", wkt))
        })?;

        let lon = parse_ordinate(&caps[1], "longitude", wkt)?;
        let lat = parse_ordinate(&caps[2], "latitude", wkt)?;
        Ok(Feature::point(lat, lon))
    }
}

fn parse_ordinate(text: &str, name: &str, wkt: &str) -> Result<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            LeafletError::GeometryError(format!("Invalid {} '{}' in '{}'", name, text, wkt))
        })
}

impl GeometryService for WktPointService {
    fn process(&self, values: &[String]) -> Result<Vec<Feature>> {
        values.iter().map(|wkt| self.parse_point(wkt)).collect()
    }
}
