//! TOML configuration file support.
//!
//! Settings shared by every run can live in a config file instead of flags.
//! Flags given on the command line override the file.
//!
//! ```toml
//! # mzgraph.toml
//! [run]
//! ionization = "auto"
//! sources = ["sirius_structure", "sirius_class", "tima"]
//! workers = 8
//! adducts = "adducts.json"
//!
//! [ranking]
//! spectral_library = 3
//! tima = 5
//!
//! [merge]
//! compress = true
//! gzip_size_mb = 200
//! use_git = true
//!
//! [export]
//! target_dir = "/data/graphs"
//! compress = true
//! ```

use anyhow::{Context, Result};
use mzgraph::builders::{AnnotationSource, RankingConfig};
use mzgraph::identifiers::{IonizationMode, IonizationSetting};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure for mzgraph.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Wave 1 settings.
    #[serde(default)]
    pub run: RunSection,

    /// Top-N bounds per ranked source.
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Merge settings.
    #[serde(default)]
    pub merge: MergeSection,

    /// Export settings.
    #[serde(default)]
    pub export: ExportSection,
}

/// Settings of the build wave and the worker pool.
#[derive(Debug, Default, Deserialize)]
pub struct RunSection {
    pub ionization: Option<IonizationSetting>,
    pub sources: Option<Vec<AnnotationSource>>,
    pub workers: Option<usize>,
    pub adducts: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MergeSection {
    pub ionization: Option<IonizationMode>,
    pub compress: Option<bool>,
    /// Compression threshold in MB (10^6 bytes).
    pub gzip_size_mb: Option<f64>,
    pub cleanup: Option<bool>,
    pub provenance: Option<bool>,
    pub use_git: Option<bool>,
    pub revision: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportSection {
    pub target_dir: Option<PathBuf>,
    pub ionization: Option<IonizationMode>,
    pub compress: Option<bool>,
    pub purge: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load the file when one is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
