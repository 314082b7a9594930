use log::debug;

use super::{
    keyed_rows, open_table, put_float, put_integer, put_text, rank_rows, AnnotationGraphBuilder,
    AnnotationSource, BuildContext, BuildError, Fragment,
};
use crate::graph::vocab::{class, predicate};
use crate::graph::Literal;
use crate::identifiers::AnnotationKind;

const FEATURE_KEY: &str = "feature_id";
const RANK_SCORE: &str = "msms_score";

/// Library results of a sample, relative to the polarity directory
pub fn input_file(sample_name: &str, ion: &str) -> String {
    format!(
        "spectral_lib_matching/{}_lib_results_final_{}.tsv",
        sample_name, ion
    )
}

/// Connectivity block of a full InChIKey (`XXXXXXXXXXXXXX-...` → first 14 chars)
pub fn inchikey_2d(inchikey: &str) -> Option<&str> {
    let block = inchikey.trim().split('-').next()?;
    (block.len() == 14 && block.chars().all(|c| c.is_ascii_uppercase())).then_some(block)
}

/// Spectral library matches
#[derive(Debug, Clone, Copy, Default)]
pub struct SpectralLibraryBuilder;

impl AnnotationGraphBuilder for SpectralLibraryBuilder {
    fn source(&self) -> AnnotationSource {
        AnnotationSource::SpectralLibrary
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<Fragment, BuildError> {
        let ion = ctx.ionization_mode();
        let path = ctx
            .input_dir()
            .join(input_file(ctx.sample_name, ion.as_str()));
        let table = open_table(&path, &[FEATURE_KEY])?;

        let mut fragment = Fragment::new(self.source());
        let stats = &mut fragment.stats;
        let rows = keyed_rows(&table, FEATURE_KEY, stats);
        let groups = rank_rows(
            ctx.ranking.selector(self.source()),
            rows,
            |row| row.float(RANK_SCORE),
            stats,
        );

        let deriver = ctx.deriver;
        let graph = &mut fragment.graph;

        for (scan, ranked) in groups {
            let feature = deriver.feature(scan);

            for candidate in ranked {
                let (_, row) = candidate.item;
                let annotation =
                    deriver.annotation(AnnotationKind::SpectralLibrary, scan, candidate.rank);

                graph.add_link(&feature, predicate::HAS_SPECLIB_ANNOTATION, &annotation);
                graph.add_type(&annotation, class::SPECLIB_ANNOTATION);
                graph.add_label(
                    &annotation,
                    format!("Spectral library annotation of feature_ID={}", scan),
                );
                graph.add_literal(
                    &annotation,
                    predicate::HAS_RANK,
                    Literal::integer(candidate.rank as i64),
                );

                if let Some(inchikey) = row.text("inchikey") {
                    if let Some(structure) = deriver.structure(inchikey) {
                        graph.add_link(&annotation, predicate::HAS_INCHIKEY, &structure);
                    }
                    if let Some(structure) = inchikey_2d(inchikey).and_then(|k| deriver.structure(k)) {
                        graph.add_link(&annotation, predicate::HAS_INCHIKEY_2D, &structure);
                        graph.add_type(&structure, class::INCHIKEY_2D);
                    }
                }

                put_text(graph, &annotation, predicate::HAS_SMILES, row.text("smiles"));
                put_text(graph, &annotation, predicate::HAS_STRUCTURE_NAME, row.text("compound_name"));
                put_text(graph, &annotation, predicate::HAS_INCHI, row.text("inchi"));
                put_text(
                    graph,
                    &annotation,
                    predicate::HAS_SPECTRAL_LIBRARY_ID,
                    row.text("Spectral_library_ID"),
                );
                put_text(
                    graph,
                    &annotation,
                    predicate::HAS_SPECTRAL_LIBRARY,
                    row.text("Spectral_library"),
                );
                put_float(graph, &annotation, predicate::HAS_MSMS_SCORE, row.float(RANK_SCORE));
                put_integer(graph, &annotation, predicate::HAS_MATCHED_PEAKS, row.integer("matched_peaks"));
            }
        }

        debug!("{}: speclib {}", ctx.sample_name, fragment.stats);
        Ok(fragment)
    }
}
