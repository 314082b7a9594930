//! # Sample metadata
//!
//! Parsing of the per-sample `metadata.tsv` record and of the adduct
//! normalization table shared by every worker of a run.

mod adducts;
mod error;
mod sample;


pub use adducts::AdductTable;
pub use error::MetadataError;
pub use sample::SampleMetadata;
