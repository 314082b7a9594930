use log::debug;

use super::{
    keyed_rows, open_table, put_float, put_link, put_text, rank_rows, AnnotationGraphBuilder,
    AnnotationSource, BuildContext, BuildError, Fragment,
};
use crate::graph::vocab::{class, predicate};
use crate::graph::Literal;
use crate::identifiers::{AnnotationKind, LabelScheme};
use crate::table::Row;

/// Input table, relative to the polarity directory
pub const INPUT_FILE: &str = "canopus_formula_summary_adducts.tsv";

const FEATURE_KEY: &str = "id";
const RANK_SCORE: &str = "NPC#class Probability";

/// NPClassifier levels: (label column, probability column, predicate, probability predicate)
const NPC_LEVELS: [(&str, &str, &str, &str); 3] = [
    (
        "NPC#pathway",
        "NPC#pathway Probability",
        predicate::HAS_NPC_PATHWAY,
        predicate::HAS_NPC_PATHWAY_PROB,
    ),
    (
        "NPC#superclass",
        "NPC#superclass Probability",
        predicate::HAS_NPC_SUPERCLASS,
        predicate::HAS_NPC_SUPERCLASS_PROB,
    ),
    (
        "NPC#class",
        "NPC#class Probability",
        predicate::HAS_NPC_CLASS,
        predicate::HAS_NPC_CLASS_PROB,
    ),
];

/// ClassyFire levels, same layout as [`NPC_LEVELS`]
const CLASSYFIRE_LEVELS: [(&str, &str, &str, &str); 5] = [
    (
        "ClassyFire#most specific class",
        "ClassyFire#most specific class Probability",
        predicate::HAS_CLASSYFIRE_MOST_SPECIFIC_CLASS,
        predicate::HAS_CLASSYFIRE_MOST_SPECIFIC_CLASS_PROB,
    ),
    (
        "ClassyFire#level 5",
        "ClassyFire#level 5 Probability",
        predicate::HAS_CLASSYFIRE_LEVEL_5,
        predicate::HAS_CLASSYFIRE_LEVEL_5_PROB,
    ),
    (
        "ClassyFire#subclass",
        "ClassyFire#subclass Probability",
        predicate::HAS_CLASSYFIRE_SUBCLASS,
        predicate::HAS_CLASSYFIRE_SUBCLASS_PROB,
    ),
    (
        "ClassyFire#class",
        "ClassyFire#class Probability",
        predicate::HAS_CLASSYFIRE_CLASS,
        predicate::HAS_CLASSYFIRE_CLASS_PROB,
    ),
    (
        "ClassyFire#superclass",
        "ClassyFire#superclass Probability",
        predicate::HAS_CLASSYFIRE_SUPERCLASS,
        predicate::HAS_CLASSYFIRE_SUPERCLASS_PROB,
    ),
];

/// Probability of a level; SIRIUS writes the superclass header in lower case
fn probability(row: &Row<'_>, column: &str) -> Option<f64> {
    row.float(column)
        .or_else(|| row.float(&column.replace(" Probability", " probability")))
}

/// CANOPUS chemical class annotations
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassAnnotationBuilder;

impl AnnotationGraphBuilder for ClassAnnotationBuilder {
    fn source(&self) -> AnnotationSource {
        AnnotationSource::SiriusClass
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<Fragment, BuildError> {
        let path = ctx.input_dir().join(INPUT_FILE);
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
            let usi = deriver.usi(scan);

            for candidate in ranked {
                let (_, row) = candidate.item;
                let annotation =
                    deriver.annotation(AnnotationKind::SiriusClass, scan, candidate.rank);

                graph.add_link(&feature, predicate::HAS_CANOPUS_ANNOTATION, &annotation);
                graph.add_type(&annotation, class::SIRIUS_CANOPUS_ANNOTATION);
                graph.add_label(&annotation, format!("Canopus annotation of {}", usi));
                graph.add_literal(
                    &annotation,
                    predicate::HAS_RANK,
                    Literal::integer(candidate.rank as i64),
                );

                put_text(graph, &annotation, predicate::HAS_MOLECULAR_FORMULA, row.text("molecularFormula"));
                put_text(graph, &annotation, predicate::HAS_ADDUCT, row.text("adduct"));
                put_text(graph, &annotation, predicate::HAS_PRECURSOR_FORMULA, row.text("precursorFormula"));

                for (column, prob_column, link, prob) in NPC_LEVELS {
                    put_link(
                        graph,
                        &annotation,
                        link,
                        row.text(column).and_then(|l| deriver.label(LabelScheme::Npc, l)),
                    );
                    put_float(graph, &annotation, prob, probability(&row, prob_column));
                }

                for (column, prob_column, link, prob) in CLASSYFIRE_LEVELS {
                    put_link(
                        graph,
                        &annotation,
                        link,
                        row.text(column)
                            .and_then(|l| deriver.label(LabelScheme::ClassyFire, l)),
                    );
                    put_float(graph, &annotation, prob, probability(&row, prob_column));
                }
            }
        }

        debug!("{}: canopus {}", ctx.sample_name, fragment.stats);
        Ok(fragment)
    }
}
