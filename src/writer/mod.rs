//! Output writers for leaflet-latlon
//!
//! A writer turns a [`RenderOutput`] into what a client-side map renderer
//! consumes.
//!
//! # Example
//!
//! ```rust,ignore
//! use leaflet_latlon::writer::{Writer, LeafletWriter};
//!
//! let writer = LeafletWriter::new();
//! let json = writer.write(&output)?;
//! ```

use crate::map::RenderOutput;
use crate::Result;

mod leaflet;

pub use leaflet::LeafletWriter;

/// Trait for render output writers
pub trait Writer {
    /// Output type produced by this writer
    type Output;

    /// Serialize a render pass's output
    ///
    /// # Errors
    ///
    /// Returns `LeafletError::WriterError` if serialization fails or the
    /// output fails [`validate`](Writer::validate).
    fn write(&self, output: &RenderOutput) -> Result<Self::Output>;

    /// Check that the output can be handed to the renderer
    fn validate(&self, output: &RenderOutput) -> Result<()>;
}
