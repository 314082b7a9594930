//! # Annotation Graph Builders
//!
//! One builder per annotation source. A builder reads the source's tables
//! from `<sample>/<ionization>/`, maps every usable row to triples under the
//! identifiers of [`IdentifierDeriver`], and returns a [`Fragment`]. Fragments
//! are written to `<sample>/rdf/<source>_<ionization>.ttl`.
//!
//! ## Error policy
//!
//! - source file absent: [`BuildError::MissingInput`], the source is skipped
//! - required column absent: [`BuildError::MissingColumns`], the source is skipped
//! - key field of a row absent or unparsable: the row is skipped and counted
//! - any other field absent: the corresponding triple is omitted

mod canopus;
mod error;
pub mod graphml;
mod network;
pub mod polarity;
mod sirius;
mod speclib;
mod tima;

#[cfg(test)]
mod tests;

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::graph::{GraphStore, Literal};
use crate::identifiers::{scan_from_feature_key, IdentifierDeriver, IonizationMode};
use crate::metadata::AdductTable;
use crate::ranking::{RankSelector, Ranked};
use crate::table::{Row, Table};

pub use canopus::ClassAnnotationBuilder;
pub use error::BuildError;
pub use network::NetworkEdgeBuilder;
pub use sirius::StructureAnnotationBuilder;
pub use speclib::SpectralLibraryBuilder;
pub use tima::TaxonomicAnnotationBuilder;

/// Annotation sources known to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationSource {
    /// SIRIUS / CSI:FingerID structure annotation
    SiriusStructure,
    /// CANOPUS chemical class annotation
    SiriusClass,
    /// Spectral library matches
    SpectralLibrary,
    /// Feature-based molecular network edges
    MolecularNetwork,
    /// TIMA taxonomically informed annotation
    Tima,
}

impl AnnotationSource {
    /// Every source, in build order
    pub const ALL: [AnnotationSource; 5] = [
        AnnotationSource::SiriusStructure,
        AnnotationSource::SiriusClass,
        AnnotationSource::SpectralLibrary,
        AnnotationSource::MolecularNetwork,
        AnnotationSource::Tima,
    ];

    /// Configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationSource::SiriusStructure => "sirius_structure",
            AnnotationSource::SiriusClass => "sirius_class",
            AnnotationSource::SpectralLibrary => "spectral_library",
            AnnotationSource::MolecularNetwork => "molecular_network",
            AnnotationSource::Tima => "tima",
        }
    }

    /// Stem of the fragment file name
    pub fn fragment_stem(&self) -> &'static str {
        match self {
            AnnotationSource::SiriusStructure => "sirius",
            AnnotationSource::SiriusClass => "canopus",
            AnnotationSource::SpectralLibrary => "speclib",
            AnnotationSource::MolecularNetwork => "individual_mn",
            AnnotationSource::Tima => "tima-r",
        }
    }

    /// Fragment file name for an ionization mode
    pub fn fragment_file_name(&self, ionization_mode: IonizationMode) -> String {
        format!("{}_{}.ttl", self.fragment_stem(), ionization_mode)
    }

    /// The builder for this source
    pub fn builder(&self) -> Box<dyn AnnotationGraphBuilder + Send + Sync> {
        match self {
            AnnotationSource::SiriusStructure => Box::new(StructureAnnotationBuilder),
            AnnotationSource::SiriusClass => Box::new(ClassAnnotationBuilder),
            AnnotationSource::SpectralLibrary => Box::new(SpectralLibraryBuilder),
            AnnotationSource::MolecularNetwork => Box::new(NetworkEdgeBuilder),
            AnnotationSource::Tima => Box::new(TaxonomicAnnotationBuilder),
        }
    }
}

impl fmt::Display for AnnotationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sirius_structure" | "sirius" => Ok(AnnotationSource::SiriusStructure),
            "sirius_class" | "canopus" => Ok(AnnotationSource::SiriusClass),
            "spectral_library" | "speclib" => Ok(AnnotationSource::SpectralLibrary),
            "molecular_network" | "molecular_networking" | "mn" => {
                Ok(AnnotationSource::MolecularNetwork)
            }
            "tima" | "tima_r" => Ok(AnnotationSource::Tima),
            other => Err(format!("unknown annotation source '{}'", other)),
        }
    }
}

/// Top-N bound per ranked source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub sirius_structure: usize,
    pub sirius_class: usize,
    pub spectral_library: usize,
    pub tima: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            sirius_structure: 5,
            sirius_class: 5,
            spectral_library: 3,
            tima: 5,
        }
    }
}

impl RankingConfig {
    /// Selector for a ranked source; the network source is never ranked
    pub fn selector(&self, source: AnnotationSource) -> RankSelector {
        let top_n = match source {
            AnnotationSource::SiriusStructure => self.sirius_structure,
            AnnotationSource::SiriusClass => self.sirius_class,
            AnnotationSource::SpectralLibrary => self.spectral_library,
            AnnotationSource::Tima => self.tima,
            AnnotationSource::MolecularNetwork => usize::MAX,
        };
        RankSelector::new(top_n)
    }
}

/// Everything a builder needs for one sample
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    /// Sample directory (`<root>/<sample>`)
    pub sample_dir: &'a Path,
    /// Directory name, used in input file names
    pub sample_name: &'a str,
    pub deriver: &'a IdentifierDeriver,
    pub adducts: &'a AdductTable,
    pub ranking: &'a RankingConfig,
}

impl<'a> BuildContext<'a> {
    /// Ionization mode of the sample
    pub fn ionization_mode(&self) -> IonizationMode {
        self.deriver.sample().ionization_mode()
    }

    /// Directory holding the sample's inputs for its ionization mode
    pub fn input_dir(&self) -> PathBuf {
        self.sample_dir.join(self.ionization_mode().as_str())
    }

    /// Directory receiving the sample's fragments
    pub fn rdf_dir(&self) -> PathBuf {
        self.sample_dir.join("rdf")
    }
}

/// Row counters of one builder invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Data rows (or edges) read
    pub rows_read: usize,
    /// Rows skipped for a missing or unparsable key field
    pub rows_skipped: usize,
    /// Rows dropped by the top-N bound
    pub rows_truncated: usize,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows read, {} skipped, {} beyond top-N",
            self.rows_read, self.rows_skipped, self.rows_truncated
        )
    }
}

/// Graph produced by one builder for one sample
#[derive(Debug, Clone)]
pub struct Fragment {
    pub source: AnnotationSource,
    pub graph: GraphStore,
    pub stats: BuildStats,
}

impl Fragment {
    fn new(source: AnnotationSource) -> Self {
        Self {
            source,
            graph: GraphStore::new(),
            stats: BuildStats::default(),
        }
    }
}

/// Maps one annotation source into a graph fragment
pub trait AnnotationGraphBuilder {
    /// Source handled by this builder
    fn source(&self) -> AnnotationSource;

    /// Build the fragment of one sample
    fn build(&self, ctx: &BuildContext<'_>) -> Result<Fragment, BuildError>;
}

/// Remove the fragment a previous run wrote for `source`.
///
/// Returns whether a file was removed.
pub fn remove_fragment(
    ctx: &BuildContext<'_>,
    source: AnnotationSource,
) -> Result<bool, BuildError> {
    let path = ctx
        .rdf_dir()
        .join(source.fragment_file_name(ctx.ionization_mode()));
    match fs::remove_file(&path) {
        Ok(()) => {
            info!("{}: removed stale {}", ctx.sample_name, path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BuildError::SerializeFailure { path, source: e }),
    }
}

/// Write a fragment to `<sample>/rdf/<source>_<ion>.ttl`.
///
/// An empty fragment is not written and any fragment left by an earlier
/// run is removed. The file is written to a temporary path in the same
/// directory and renamed into place.
pub fn write_fragment(
    ctx: &BuildContext<'_>,
    fragment: &Fragment,
) -> Result<Option<PathBuf>, BuildError> {
    let rdf_dir = ctx.rdf_dir();
    let path = rdf_dir.join(fragment.source.fragment_file_name(ctx.ionization_mode()));

    if fragment.graph.is_empty() {
        info!(
            "{}: {} graph is empty, nothing written",
            ctx.sample_name, fragment.source
        );
        remove_fragment(ctx, fragment.source)?;
        return Ok(None);
    }

    let serialize_failure = |source: std::io::Error| BuildError::SerializeFailure {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(&rdf_dir).map_err(serialize_failure)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&rdf_dir).map_err(serialize_failure)?;
    tmp.write_all(fragment.graph.serialize().as_bytes())
        .map_err(serialize_failure)?;
    tmp.persist(&path).map_err(|e| serialize_failure(e.error))?;

    debug!("{}: wrote {}", ctx.sample_name, path.display());
    Ok(Some(path))
}

/// Open a required input table and check its header
fn open_table(path: &Path, required: &[&str]) -> Result<Table, BuildError> {
    let table = Table::open_tsv(path)?.ok_or_else(|| BuildError::MissingInput(path.to_path_buf()))?;
    let missing = table.missing_columns(required);
    if !missing.is_empty() {
        return Err(BuildError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        });
    }
    Ok(table)
}

/// Rows paired with the scan number parsed from their feature key.
///
/// Rows without a usable key are skipped, logged and counted.
fn keyed_rows<'t>(
    table: &'t Table,
    key_column: &str,
    stats: &mut BuildStats,
) -> Vec<(u64, Row<'t>)> {
    let mut rows = Vec::with_capacity(table.len());
    // Undecodable records never reach the row loop
    stats.rows_read += table.unreadable_rows();
    stats.rows_skipped += table.unreadable_rows();
    for row in table.rows() {
        stats.rows_read += 1;
        let scan = row
            .require(key_column)
            .map_err(|e| e.to_string())
            .and_then(|key| scan_from_feature_key(key).map_err(|e| e.to_string()));
        match scan {
            Ok(scan) => rows.push((scan, row)),
            Err(reason) => {
                stats.rows_skipped += 1;
                warn!(
                    "{}",
                    BuildError::MalformedRow {
                        line: row.line(),
                        reason
                    }
                );
            }
        }
    }
    rows
}

/// Drop rows lacking a second key field (e.g. the structure key)
fn with_field<'t>(
    rows: Vec<(u64, Row<'t>)>,
    column: &str,
    stats: &mut BuildStats,
) -> Vec<(u64, Row<'t>)> {
    let (kept, dropped): (Vec<_>, Vec<_>) =
        rows.into_iter().partition(|(_, row)| row.text(column).is_some());
    for (_, row) in &dropped {
        debug!("line {}: no {} value, row skipped", row.line(), column);
    }
    stats.rows_skipped += dropped.len();
    kept
}

type RankedRows<'t> = Vec<(u64, Vec<Ranked<(u64, Row<'t>)>>)>;

/// Group rows by scan and keep the top-N of each feature
fn rank_rows<'t, F>(
    selector: RankSelector,
    rows: Vec<(u64, Row<'t>)>,
    score: F,
    stats: &mut BuildStats,
) -> RankedRows<'t>
where
    F: Fn(&Row<'t>) -> Option<f64>,
{
    let before = rows.len();
    let groups = selector.select_grouped(rows, |(scan, _)| *scan, |(_, row)| score(row));
    let kept: usize = groups.iter().map(|(_, ranked)| ranked.len()).sum();
    stats.rows_truncated += before - kept;
    groups
}

fn put_text(graph: &mut GraphStore, subject: &str, predicate: &str, value: Option<&str>) {
    if let Some(value) = value {
        graph.add_literal(subject, predicate, Literal::string(value));
    }
}

fn put_float(graph: &mut GraphStore, subject: &str, predicate: &str, value: Option<f64>) {
    if let Some(value) = value {
        graph.add_literal(subject, predicate, Literal::float(value));
    }
}

fn put_integer(graph: &mut GraphStore, subject: &str, predicate: &str, value: Option<i64>) {
    if let Some(value) = value {
        graph.add_literal(subject, predicate, Literal::integer(value));
    }
}

fn put_link(graph: &mut GraphStore, subject: &str, predicate: &str, object: Option<String>) {
    if let Some(object) = object {
        graph.add_link(subject, predicate, &object);
    }
}
