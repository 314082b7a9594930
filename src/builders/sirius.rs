use log::debug;

use super::{
    keyed_rows, open_table, put_float, put_text, rank_rows, with_field, AnnotationGraphBuilder,
    AnnotationSource, BuildContext, BuildError, Fragment,
};
use crate::graph::vocab::{class, predicate};
use crate::graph::Literal;
use crate::identifiers::AnnotationKind;

/// Input table, relative to the polarity directory
pub const INPUT_FILE: &str = "compound_identifications.tsv";

const FEATURE_KEY: &str = "id";
const STRUCTURE_KEY: &str = "InChIkey2D";
/// Ranking score: COSMIC confidence
const RANK_SCORE: &str = "ConfidenceScore";

/// SIRIUS / CSI:FingerID structure annotations
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureAnnotationBuilder;

impl AnnotationGraphBuilder for StructureAnnotationBuilder {
    fn source(&self) -> AnnotationSource {
        AnnotationSource::SiriusStructure
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<Fragment, BuildError> {
        let path = ctx.input_dir().join(INPUT_FILE);
        let table = open_table(&path, &[FEATURE_KEY, STRUCTURE_KEY])?;

        let mut fragment = Fragment::new(self.source());
        let stats = &mut fragment.stats;
        let rows = keyed_rows(&table, FEATURE_KEY, stats);
        let rows = with_field(rows, STRUCTURE_KEY, stats);
        let groups = rank_rows(
            ctx.ranking.selector(self.source()),
            rows,
            |row| row.float(RANK_SCORE),
            stats,
        );

        let deriver = ctx.deriver;
        let ion = ctx.ionization_mode();
        let graph = &mut fragment.graph;

        for (scan, ranked) in groups {
            let feature = deriver.feature(scan);
            let usi = deriver.usi(scan);

            for candidate in ranked {
                let (_, row) = candidate.item;
                let annotation =
                    deriver.annotation(AnnotationKind::SiriusStructure, scan, candidate.rank);

                graph.add_link(&feature, predicate::HAS_SIRIUS_ANNOTATION, &annotation);
                graph.add_type(&annotation, class::SIRIUS_STRUCTURE_ANNOTATION);
                graph.add_label(&annotation, format!("sirius annotation of {}", usi));
                graph.add_literal(
                    &annotation,
                    predicate::HAS_IONIZATION,
                    Literal::string(ion.as_str()),
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

                put_text(
                    graph,
                    &annotation,
                    predicate::HAS_SIRIUS_ADDUCT,
                    row.text("adduct").map(|a| ctx.adducts.normalize(a)),
                );
                put_float(graph, &annotation, predicate::HAS_SIRIUS_SCORE, row.float("SiriusScore"));
                put_float(graph, &annotation, predicate::HAS_ZODIAC_SCORE, row.float("ZodiacScore"));
                put_float(graph, &annotation, predicate::HAS_COSMIC_SCORE, row.float("ConfidenceScore"));
            }
        }

        debug!("{}: sirius {}", ctx.sample_name, fragment.stats);
        Ok(fragment)
    }
}
