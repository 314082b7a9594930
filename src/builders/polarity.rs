//! Polarity resolution and input relocation.
//!
//! A sample laid out with its raw inputs at the root is reorganised once into
//! `<sample>/<ionization>/` when the ionization mode is `auto`. The mode is
//! read from the dominant adduct of a root-level annotation table. Samples that are
//! already organised keep their `pos/` or `neg/` directory.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info};

use super::BuildError;
use crate::identifiers::{IonizationMode, IonizationSetting};
use crate::table::Table;

/// Tables whose `adduct` column reveals the polarity, in lookup order
pub const POLARITY_TABLES: [&str; 3] = [
    "compound_identifications.tsv",
    "canopus_formula_summary_adducts.tsv",
    "canopus_formula_summary.tsv",
];

/// Extensions of the raw inputs moved into the polarity directory
pub const RELOCATED_EXTENSIONS: [&str; 4] = ["tsv", "csv", "mztab", "mgf"];

/// Most frequent adduct; ties go to the lexicographically smallest label
pub fn dominant_adduct<'a>(adducts: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for adduct in adducts {
        *counts.entry(adduct).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(a, count_a), (b, count_b)| count_a.cmp(count_b).then_with(|| b.cmp(a)))
        .map(|(adduct, _)| adduct.to_string())
}

/// Polarity implied by the dominant adduct of a table
pub fn polarity_from_table(table: &Table, sample: &str) -> Result<IonizationMode, BuildError> {
    let adducts: Vec<&str> = table.rows().filter_map(|row| row.text("adduct")).collect();
    let dominant = dominant_adduct(adducts).ok_or_else(|| BuildError::AmbiguousPolarity {
        sample: sample.to_string(),
        detail: "no adduct values".to_string(),
    })?;

    IonizationMode::from_adduct(&dominant).ok_or_else(|| BuildError::AmbiguousPolarity {
        sample: sample.to_string(),
        detail: format!("dominant adduct '{}' has no charge sign", dominant),
    })
}

/// Decide the ionization mode of a sample, relocating root inputs in `auto` mode
pub fn resolve_polarity(
    sample_dir: &Path,
    setting: IonizationSetting,
) -> Result<IonizationMode, BuildError> {
    if let Some(mode) = setting.explicit() {
        return Ok(mode);
    }

    let sample = sample_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    for candidate in POLARITY_TABLES {
        let Some(table) = Table::open_tsv(sample_dir.join(candidate))? else {
            continue;
        };
        if !table.has_column("adduct") {
            continue;
        }
        let mode = polarity_from_table(&table, &sample)?;
        info!("{}: inferred {} mode from {}", sample, mode, candidate);
        let moved = relocate_inputs(sample_dir, mode)?;
        if moved > 0 {
            info!("{}: moved {} input files into {}/", sample, moved, mode);
        }
        return Ok(mode);
    }

    for mode in IonizationMode::ALL {
        if sample_dir.join(mode.as_str()).is_dir() {
            debug!("{}: using existing {}/ directory", sample, mode);
            return Ok(mode);
        }
    }

    Err(BuildError::MissingInput(sample_dir.join(POLARITY_TABLES[0])))
}

/// Whether a root-level file is a raw input to relocate
fn is_relocatable(file_name: &str) -> bool {
    if file_name.ends_with("metadata.tsv") {
        return false;
    }
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            RELOCATED_EXTENSIONS
                .iter()
                .any(|allowed| e.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Move root-level raw inputs into `<sample>/<ionization>/`.
///
/// Existing destinations are never overwritten; metadata files stay in place.
/// Returns the number of files moved.
pub fn relocate_inputs(sample_dir: &Path, mode: IonizationMode) -> Result<usize, BuildError> {
    let target = sample_dir.join(mode.as_str());
    let mut moved = 0;

    let mut entries: Vec<_> = fs::read_dir(sample_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| is_relocatable(name))
        .collect();
    entries.sort();

    for name in entries {
        let destination = target.join(&name);
        if destination.exists() {
            debug!("{} already present in {}/, left in place", name, mode);
            continue;
        }
        fs::create_dir_all(&target)?;
        fs::rename(sample_dir.join(&name), &destination)?;
        moved += 1;
    }

    Ok(moved)
}
