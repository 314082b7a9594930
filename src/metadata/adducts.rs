use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::MetadataError;

/// Lookup table normalizing adduct labels (`adducts_formatter.json`)
///
/// The file is a flat JSON object mapping a raw adduct label, as written by
/// an annotation tool, to its normalized form. Unknown adducts pass through
/// unchanged. Loaded once per run and shared read-only between workers.
#[derive(Debug, Clone, Default)]
pub struct AdductTable {
    map: HashMap<String, String>,
}

impl AdductTable {
    /// An empty table; every adduct passes through
    pub fn identity() -> Self {
        Self::default()
    }

    /// Load the table from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| MetadataError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse the table from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, MetadataError> {
        let map: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self { map })
    }

    /// Normalized form of an adduct label
    pub fn normalize<'a>(&'a self, adduct: &'a str) -> &'a str {
        self.map.get(adduct).map(String::as_str).unwrap_or(adduct)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
