//! Map-side types for leaflet-latlon
//!
//! - `types` - Rows, features, map descriptors and render output
//! - `registry` - Named map definitions
//! - `options` - Style-level overrides of map settings

pub mod options;
pub mod registry;
pub mod types;

pub use options::{apply_style_overrides, DEFAULT_PATH};
pub use registry::{MapRegistry, DEFAULT_MAP};
pub use types::*;
