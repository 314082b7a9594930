//! # mzgraph - Per-sample knowledge graphs from LC-MS/MS annotations
//!
//! `mzgraph` turns the annotation tables of an untargeted metabolomics
//! pipeline into one RDF knowledge graph per sample, then merges and exports
//! these graphs reproducibly across many samples.
//!
//! ## Key Features
//!
//! - **Canonical identifiers**: features, annotations, structures, labels and
//!   network components get identifiers derived only from the sample
//!   metadata and the row key, so every run produces the same IRIs.
//!
//! - **Bounded ranking**: multi-valued annotations are cut to the top-N
//!   candidates per feature with dense, stable ranks.
//!
//! - **Five annotation sources**: SIRIUS structures, CANOPUS classes,
//!   spectral library matches, feature-based molecular networks and TIMA.
//!
//! - **Deterministic Turtle**: sorted, deduplicated serialization; merged
//!   graphs are named after the SHA-256 of their bytes.
//!
//! ## Data Layout
//!
//! ```text
//! <root>/
//! ├── S1/
//! │   ├── metadata.tsv              # sample_id, massive_id
//! │   ├── pos/                      # inputs of the sample's polarity
//! │   │   ├── compound_identifications.tsv
//! │   │   ├── canopus_formula_summary_adducts.tsv
//! │   │   ├── spectral_lib_matching/
//! │   │   ├── molecular_network/
//! │   │   └── tima/data/processed/
//! │   └── rdf/                      # fragments, merged graph, graph_params.yaml
//! └── S2/
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mzgraph::pipeline::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::new("/data/samples");
//! let summary = Pipeline::new(config)?.run()?;
//! println!("{}", summary);
//! # Ok::<(), mzgraph::pipeline::PipelineError>(())
//! ```
//!
//! ## Modules
//!
//! - [`identifiers`]: identifier derivation
//! - [`table`]: tab-separated input tables and missing-value handling
//! - [`metadata`]: sample metadata and the adduct table
//! - [`ranking`]: top-N selection per feature
//! - [`graph`]: triple store and Turtle reader/writer
//! - [`builders`]: one graph builder per annotation source
//! - [`merge`]: per-sample merge and provenance
//! - [`export`]: collection of merged graphs
//! - [`pipeline`]: the three waves over a data root

#![deny(rustdoc::missing_crate_level_docs)]

pub mod builders;
pub mod export;
pub mod graph;
pub mod identifiers;
pub mod merge;
pub mod metadata;
pub mod pipeline;
pub mod ranking;
pub mod table;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::builders::{
        AnnotationGraphBuilder, AnnotationSource, BuildContext, BuildError, Fragment,
        RankingConfig,
    };
    pub use crate::export::{ExportConfig, ExportStage};
    pub use crate::graph::{GraphStore, Literal, Term, Triple};
    pub use crate::identifiers::{IdentifierDeriver, IonizationMode, IonizationSetting, Sample};
    pub use crate::merge::{MergeConfig, MergeEngine, MergeOutcome};
    pub use crate::metadata::{AdductTable, SampleMetadata};
    pub use crate::pipeline::{Pipeline, PipelineConfig, RunSummary};
    pub use crate::ranking::{RankSelector, Ranked};
}
