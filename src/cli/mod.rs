use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use mzgraph::identifiers::{IonizationMode, IonizationSetting};
use mzgraph::pipeline::RunSummary;
use std::path::PathBuf;

mod config;
mod export;
mod merge;
mod run;

/// mzgraph - Per-sample knowledge graphs from LC-MS/MS annotations
#[derive(Parser)]
#[command(name = "mzgraph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph fragments of every sample, then merge (and export)
    Run(RunArgs),

    /// Merge the existing fragments of every sample
    Merge(MergeCommand),

    /// Copy every merged graph into one directory
    Export(ExportCommand),
}

/// Merge flags shared by `run` and `merge`
#[derive(Args, Debug, Default)]
pub struct MergeArgs {
    /// Gzip merged graphs above the size threshold
    #[arg(short = 'c', long)]
    compress: bool,

    /// Compression threshold in MB (default: 200)
    #[arg(long, value_name = "MB")]
    gzip_size: Option<f64>,

    /// Keep earlier merged graphs of each sample
    #[arg(long)]
    keep_previous: bool,

    /// Do not write graph_params.yaml
    #[arg(long)]
    no_provenance: bool,

    /// Record the git commit of the working directory in the provenance
    #[arg(long)]
    use_git: bool,

    /// Record this revision in the provenance
    #[arg(long, value_name = "REV")]
    revision: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory holding one subdirectory per sample
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ionization mode: pos, neg or auto
    #[arg(short = 'i', long)]
    ionization: Option<IonizationSetting>,

    /// Build SIRIUS structure annotations
    #[arg(long)]
    sirius_structure: bool,

    /// Build CANOPUS class annotations
    #[arg(long)]
    sirius_class: bool,

    /// Build spectral library annotations
    #[arg(long)]
    spectral_library: bool,

    /// Build molecular network edges
    #[arg(long)]
    molecular_networking: bool,

    /// Build TIMA annotations
    #[arg(long)]
    tima: bool,

    /// Top-N structure annotations per feature
    #[arg(long, value_name = "N")]
    top_sirius_structure: Option<usize>,

    /// Top-N class annotations per feature
    #[arg(long, value_name = "N")]
    top_sirius_class: Option<usize>,

    /// Top-N spectral library matches per feature
    #[arg(long, value_name = "N")]
    top_spectral_library: Option<usize>,

    /// Top-N TIMA annotations per feature
    #[arg(long, value_name = "N")]
    top_tima: Option<usize>,

    /// Worker threads (default: half the CPUs, rounded up)
    #[arg(long, visible_alias = "cpu", value_name = "N")]
    workers: Option<usize>,

    /// JSON table normalizing adduct labels
    #[arg(long, value_name = "FILE")]
    adducts: Option<PathBuf>,

    /// Stop after building fragments
    #[arg(long)]
    no_merge: bool,

    #[command(flatten)]
    merge: MergeArgs,

    /// Export merged graphs into this directory
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// Gzip exported graphs
    #[arg(long)]
    export_compress: bool,

    /// Remove exported .ttl.gz graphs from the export directory first
    #[arg(long)]
    delete_existing: bool,
}

#[derive(Args, Debug)]
pub struct MergeCommand {
    /// Directory holding one subdirectory per sample
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only merge fragments of this polarity
    #[arg(short = 'i', long)]
    ionization: Option<IonizationMode>,

    /// Worker threads (default: half the CPUs, rounded up)
    #[arg(long, visible_alias = "cpu", value_name = "N")]
    workers: Option<usize>,

    #[command(flatten)]
    merge: MergeArgs,
}

#[derive(Args, Debug)]
pub struct ExportCommand {
    /// Directory holding one subdirectory per sample
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Target directory (default: [export] target_dir of the config file)
    #[arg(value_name = "TARGET")]
    target: Option<PathBuf>,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only export graphs holding this polarity
    #[arg(short = 'i', long)]
    ionization: Option<IonizationMode>,

    /// Gzip exported graphs
    #[arg(short = 'c', long)]
    compress: bool,

    /// Remove exported .ttl.gz graphs from the target directory first
    #[arg(short = 'd', long)]
    delete_existing: bool,

    /// Worker threads (default: half the CPUs, rounded up)
    #[arg(long, visible_alias = "cpu", value_name = "N")]
    workers: Option<usize>,
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run::run(args),
        Commands::Merge(args) => merge::run(args),
        Commands::Export(args) => export::run(args),
    }
}

/// Print the run summary and exit non-zero when a wave failed for every sample
fn finish(summary: RunSummary) -> Result<()> {
    #[cfg(feature = "colorized_output")]
    {
        println!("{}", summary.format_colored());
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        println!("{}", summary);
    }

    if !summary.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
