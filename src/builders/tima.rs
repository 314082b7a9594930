use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::{
    keyed_rows, open_table, put_float, put_integer, put_link, put_text, rank_rows,
    AnnotationGraphBuilder, AnnotationSource, BuildContext, BuildError, Fragment,
};
use crate::graph::vocab::{class, predicate};
use crate::graph::Literal;
use crate::identifiers::{AnnotationKind, LabelScheme};
use crate::table::Row;

/// Directory of processed TIMA results, relative to the sample or polarity directory
pub const RESULTS_DIR: &str = "tima/data/processed";
/// Suffix of the annotation table inside [`RESULTS_DIR`]
pub const RESULTS_SUFFIX: &str = "tima_annotations.tsv";

const FEATURE_KEY: &str = "feature_id";
const STRUCTURE_KEY: &str = "candidate_structure_inchikey_no_stereo";
/// TIMA already ranks candidates; a lower final rank is better
const RANK_COLUMN: &str = "rank_final";
const CHEMONTID: &str = "candidate_structure_tax_cla_chemontid";

const TEXT_FIELDS: [(&str, &str); 7] = [
    ("candidate_structure_smiles_no_stereo", predicate::HAS_SMILES),
    ("candidate_structure_molecular_formula", predicate::HAS_MOLECULAR_FORMULA),
    ("candidate_structure_organism_occurrence_reference", predicate::HAS_REFERENCE),
    ("candidate_library", predicate::HAS_REFERENCE),
    ("candidate_structure_organism_occurrence_closest", predicate::HAS_BEST_CANDIDATE_ORGANISM),
    (CHEMONTID, predicate::HAS_CLASSYFIRE_CHEMONTID),
    ("candidate_structure_tax_cla_01kin", predicate::HAS_CLASSYFIRE_KINGDOM),
];

const FLOAT_FIELDS: [(&str, &str); 8] = [
    ("candidate_score_similarity", predicate::HAS_SPECTRAL_SCORE),
    ("score_biological", predicate::HAS_TAXO_SCORE),
    ("score_chemical", predicate::HAS_CONSISTENCY_SCORE),
    ("score_final", predicate::HAS_FINAL_SCORE),
    ("candidate_score_sirius_confidence", predicate::HAS_STRUCTURE_CONFIDENCE_SCORE),
    ("candidate_structure_error_mz", predicate::HAS_STRUCTURE_ERROR_MZ),
    ("candidate_structure_xlogp", predicate::HAS_LOGP),
    ("candidate_spectrum_entropy", predicate::HAS_SPECTRUM_ENTROPY),
];

const INTEGER_FIELDS: [(&str, &str); 3] = [
    ("rank_initial", predicate::HAS_RANK_INITIAL),
    ("rank_final", predicate::HAS_RANK_FINAL),
    (
        "candidate_count_similarity_peaks_matched",
        predicate::HAS_STRUCTURE_SIMILARITY_PEAKS_MATCHED,
    ),
];

const LABEL_FIELDS: [(&str, LabelScheme, &str); 6] = [
    ("candidate_structure_tax_cla_02sup", LabelScheme::ClassyFire, predicate::HAS_CLASSYFIRE_SUPERCLASS),
    ("candidate_structure_tax_cla_03cla", LabelScheme::ClassyFire, predicate::HAS_CLASSYFIRE_CLASS),
    ("candidate_structure_tax_cla_04dirpar", LabelScheme::ClassyFire, predicate::HAS_CLASSYFIRE_LEVEL_5),
    ("candidate_structure_tax_npc_01pat", LabelScheme::Npc, predicate::HAS_NPC_PATHWAY),
    ("candidate_structure_tax_npc_02sup", LabelScheme::Npc, predicate::HAS_NPC_SUPERCLASS),
    ("candidate_structure_tax_npc_03cla", LabelScheme::Npc, predicate::HAS_NPC_CLASS),
];

/// Whether a row names a candidate, by structure or by class labels only
fn has_candidate(row: &Row<'_>) -> bool {
    row.text(STRUCTURE_KEY).is_some()
        || row.text(CHEMONTID).is_some()
        || LABEL_FIELDS
            .iter()
            .any(|(column, _, _)| row.text(column).is_some())
}

/// First `*tima_annotations.tsv` (by name) in a results directory
fn find_in(dir: &Path) -> Result<Option<PathBuf>, BuildError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .map(|n| n.to_string_lossy().ends_with(RESULTS_SUFFIX))
                    .unwrap_or(false)
        })
        .collect();
    candidates.sort();
    Ok(candidates.into_iter().next())
}

/// TIMA taxonomically informed annotations
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxonomicAnnotationBuilder;

impl TaxonomicAnnotationBuilder {
    /// Locate the results table, polarity directory first, then the sample root
    pub fn locate(ctx: &BuildContext<'_>) -> Result<PathBuf, BuildError> {
        let polarity_dir = ctx.input_dir().join(RESULTS_DIR);
        if let Some(path) = find_in(&polarity_dir)? {
            return Ok(path);
        }
        if let Some(path) = find_in(&ctx.sample_dir.join(RESULTS_DIR))? {
            return Ok(path);
        }
        Err(BuildError::MissingInput(polarity_dir.join(format!("*{}", RESULTS_SUFFIX))))
    }
}

impl AnnotationGraphBuilder for TaxonomicAnnotationBuilder {
    fn source(&self) -> AnnotationSource {
        AnnotationSource::Tima
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<Fragment, BuildError> {
        let path = Self::locate(ctx)?;
        let table = open_table(&path, &[FEATURE_KEY, STRUCTURE_KEY])?;

        let mut fragment = Fragment::new(self.source());
        let stats = &mut fragment.stats;
        let rows = keyed_rows(&table, FEATURE_KEY, stats);
        // Unannotated features come with an empty candidate; a candidate
        // known only by its classes is kept without a structure link
        let (rows, empty): (Vec<_>, Vec<_>) =
            rows.into_iter().partition(|(_, row)| has_candidate(row));
        for (_, row) in &empty {
            debug!("line {}: no TIMA candidate, row skipped", row.line());
        }
        stats.rows_skipped += empty.len();
        let groups = rank_rows(
            ctx.ranking.selector(self.source()),
            rows,
            |row| row.float(RANK_COLUMN).map(|rank| -rank),
            stats,
        );

        let deriver = ctx.deriver;
        let graph = &mut fragment.graph;

        for (scan, ranked) in groups {
            let feature = deriver.feature(scan);
            let usi = deriver.usi(scan);

            for candidate in ranked {
                let (_, row) = candidate.item;
                let annotation = deriver.annotation(AnnotationKind::Tima, scan, candidate.rank);

                graph.add_link(&feature, predicate::HAS_TIMA_ANNOTATION, &annotation);
                graph.add_type(&annotation, class::TIMA_ANNOTATION);
                graph.add_label(
                    &annotation,
                    format!("TIMA annotation {} of {}", candidate.rank, usi),
                );
                graph.add_literal(
                    &annotation,
                    predicate::HAS_RANK,
                    Literal::integer(candidate.rank as i64),
                );

                if let Some(structure) = row.text(STRUCTURE_KEY).and_then(|k| deriver.structure(k)) {
                    graph.add_link(&annotation, predicate::HAS_INCHIKEY_2D, &structure);
                    graph.add_type(&structure, class::INCHIKEY_2D);
                }

                for (column, pred) in TEXT_FIELDS {
                    put_text(graph, &annotation, pred, row.text(column));
                }
                for (column, pred) in FLOAT_FIELDS {
                    put_float(graph, &annotation, pred, row.float(column));
                }
                for (column, pred) in INTEGER_FIELDS {
                    put_integer(graph, &annotation, pred, row.integer(column));
                }
                for (column, scheme, pred) in LABEL_FIELDS {
                    put_link(
                        graph,
                        &annotation,
                        pred,
                        row.text(column).and_then(|l| deriver.label(scheme, l)),
                    );
                }
            }
        }

        debug!("{}: tima {} from {}", ctx.sample_name, fragment.stats, path.display());
        Ok(fragment)
    }
}
