//! Result set sources for leaflet-latlon
//!
//! A reader loads a result set from a file and returns it as
//! [`RowResult`]s, indexed by their position.
//!
//! # Example
//!
//! ```rust,ignore
//! use leaflet_latlon::reader::{CsvReader, Reader};
//!
//! let rows = CsvReader::new().read_rows("stores.csv".as_ref())?;
//! ```

use std::path::Path;

use crate::map::RowResult;
use crate::{LeafletError, Result};

pub mod data;

pub use data::rows_from_records;
#[cfg(feature = "csv")]
pub use data::rows_from_dataframe;

/// Trait for result set readers
pub trait Reader {
    /// Load all rows from `path`
    ///
    /// # Errors
    ///
    /// Returns `LeafletError::ReaderError` if the file cannot be parsed, or
    /// `LeafletError::IoError` if it cannot be read.
    fn read_rows(&self, path: &Path) -> Result<Vec<RowResult>>;
}

/// Reads a JSON array of objects, one object per row
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReader;

impl JsonReader {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, json: &str) -> Result<Vec<RowResult>> {
        let records: Vec<serde_json::Value> = serde_json::from_str(json).map_err(|e| {
            LeafletError::ReaderError(format!("Expected a JSON array of rows: {}", e))
        })?;
        rows_from_records(records)
    }
}

impl Reader for JsonReader {
    fn read_rows(&self, path: &Path) -> Result<Vec<RowResult>> {
        let content = std::fs::read_to_string(path)?;
        self.parse(&content)
    }
}

/// Reads a CSV file with a header line through Polars
#[cfg(feature = "csv")]
#[derive(Debug, Clone)]
pub struct CsvReader {
    separator: u8,
}

#[cfg(feature = "csv")]
impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "csv")]
impl CsvReader {
    pub fn new() -> Self {
        Self { separator: b',' }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }
}

#[cfg(feature = "csv")]
impl Reader for CsvReader {
    fn read_rows(&self, path: &Path) -> Result<Vec<RowResult>> {
        use polars::prelude::{CsvReadOptions, SerReader};

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .map_parse_options(|options| options.with_separator(self.separator))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| {
                LeafletError::ReaderError(format!("Failed to read CSV {}: {}", path.display(), e))
            })?;

        tracing::debug!(
            "Read {} row(s) with columns {:?} from {}",
            df.height(),
            df.get_column_names(),
            path.display()
        );
        Ok(rows_from_dataframe(&df))
    }
}

/// Pick a reader from the file extension (`.csv` or `.json`).
pub fn reader_for_path(path: &Path) -> Result<Box<dyn Reader>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => Ok(Box::new(JsonReader::new())),
        #[cfg(feature = "csv")]
        "csv" => Ok(Box::new(CsvReader::new())),
        other => Err(LeafletError::ReaderError(format!(
            "No reader for '{}' files: {}",
            other,
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_json_reader() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"lat": "45.0", "lon": "9.0", "name": "A"}}, {{"lat": "", "lon": "9.0"}}]"#
        )
        .unwrap();

        let rows = JsonReader::new().read_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rendered("name"), Some("A"));
        assert_eq!(rows[1].coordinate("lat"), None);
    }

    #[test]
    fn test_json_reader_rejects_non_arrays() {
        let err = JsonReader::new().parse(r#"{"lat": 1}"#).unwrap_err();
        assert!(matches!(err, LeafletError::ReaderError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = JsonReader::new()
            .read_rows(Path::new("/nonexistent/rows.json"))
            .unwrap_err();
        assert!(matches!(err, LeafletError::IoError(_)));
    }

    #[cfg(feature = "csv")]
    #[test]
    fn test_csv_reader() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "name,lat,lon").unwrap();
        writeln!(file, "Shop,45.5,9.25").unwrap();
        writeln!(file, "Nowhere,,9.0").unwrap();
        file.flush().unwrap();

        let rows = CsvReader::new().read_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rendered("name"), Some("Shop"));
        assert_eq!(rows[0].coordinate("lat"), Some("45.5".to_string()));
        assert_eq!(rows[1].coordinate("lat"), None);
    }

    #[test]
    fn test_reader_for_path() {
        assert!(reader_for_path(Path::new("rows.json")).is_ok());
        assert!(reader_for_path(Path::new("rows.JSON")).is_ok());
        assert!(reader_for_path(Path::new("rows.xlsx")).is_err());
    }
}
