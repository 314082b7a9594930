//! # mzgraph
//!
//! Command-line front end of the knowledge graph pipeline.
//!
//! ## Usage
//!
//! ```bash
//! # Build, merge and export every sample under /data/samples
//! mzgraph run /data/samples --export /data/graphs -v
//!
//! # Only structure and class annotations, negative mode
//! mzgraph run /data/samples --sirius-structure --sirius-class -i neg
//!
//! # Re-merge existing fragments with compression
//! mzgraph merge /data/samples --compress --gzip-size 100
//!
//! # Collect merged graphs
//! mzgraph export /data/samples /data/graphs --compress --delete-existing
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
