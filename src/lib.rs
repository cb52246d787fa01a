/*!
# leaflet-latlon

Builds Leaflet map payloads from tabular result sets.

Every row of a result set that carries a latitude and a longitude becomes a
point feature. Features are enriched with popups, labels and marker icons
according to a [`StyleConfig`], and the resulting `{map, features}` payload
is handed to a [`Writer`](writer::Writer) that produces the settings block a
Leaflet client consumes.

## Example

```rust,ignore
use leaflet_latlon::reader::{JsonReader, Reader};
use leaflet_latlon::writer::{LeafletWriter, Writer};
use leaflet_latlon::{FeatureBuilder, RenderContext, StyleConfig};

let rows = JsonReader::new().read_rows("rows.json".as_ref())?;
let config = StyleConfig::from_file("style.json".as_ref())?;

let builder = FeatureBuilder::new();
let mut context = RenderContext::new("stores", "page_1");
let output = builder.build(&rows, &config, &mut context)?;

let json = LeafletWriter::new().write(&output)?;
```

## Modules

- [`config`] - Style configuration (`StyleConfig`) and validation
- [`map`] - Rows, features, map descriptors and the map registry
- [`icon`] - Icon configuration, default merging, token substitution
- [`geometry`] - Geometry service trait and the WKT point implementation
- [`builder`] - The per-row feature building pipeline
- [`reader`] - Loading result rows from CSV and JSON
- [`writer`] - Serializing render output for the client
*/

pub mod builder;
pub mod config;
pub mod geometry;
pub mod html;
pub mod icon;
pub mod map;
pub mod reader;
pub mod writer;

pub use builder::{FeatureBuilder, FeatureHook, HookContext, PayloadHook, RenderContext};
pub use config::{GeoFieldSelector, GeocoderControl, MapPosition, StyleConfig};
pub use geometry::{GeometryService, WktPointService};
pub use icon::{IconConfig, IconType};
pub use map::{
    Feature, FeatureType, MapDescriptor, MapRegistry, RenderOutput, RenderPayload, RenderedMap,
    RowResult,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum LeafletError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Geometry error: {0}")]
    GeometryError(String),

    #[error("Reader error: {0}")]
    ReaderError(String),

    #[error("Writer error: {0}")]
    WriterError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LeafletError>;
