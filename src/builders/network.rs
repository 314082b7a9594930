use std::collections::BTreeMap;

use log::{debug, warn};

use super::graphml::read_edges;
use super::{
    keyed_rows, open_table, put_float, AnnotationGraphBuilder, AnnotationSource, BuildContext,
    BuildError, Fragment,
};
use crate::graph::vocab::{class, predicate};
use crate::graph::Literal;
use crate::identifiers::scan_from_feature_key;

/// Component id of features that belong to no cluster
pub const SINGLETON_COMPONENT: i64 = -1;

const FEATURE_KEY: &str = "feature_id";
const PRECURSOR_MZ: &str = "precursor_mz";
const COMPONENT_ID: &str = "component_id";

/// Network file of a sample, relative to the polarity directory
pub fn graph_file(sample_name: &str, ion: &str) -> String {
    format!("molecular_network/{}_mn_{}.graphml", sample_name, ion)
}

/// Per-feature companion table, relative to the polarity directory
pub fn metadata_file(sample_name: &str, ion: &str) -> String {
    format!("molecular_network/{}_mn_metadata_{}.tsv", sample_name, ion)
}

#[derive(Debug, Clone, Copy)]
struct NetworkNode {
    precursor_mz: Option<f64>,
    component: Option<i64>,
}

/// Orient an edge: the feature with the larger precursor m/z is member 1,
/// equal masses put the lower scan first.
pub fn orient(a: (u64, f64), b: (u64, f64)) -> (u64, u64) {
    if a.1 > b.1 || (a.1 == b.1 && a.0 <= b.0) {
        (a.0, b.0)
    } else {
        (b.0, a.0)
    }
}

/// Feature-based molecular network edges and component membership
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkEdgeBuilder;

impl AnnotationGraphBuilder for NetworkEdgeBuilder {
    fn source(&self) -> AnnotationSource {
        AnnotationSource::MolecularNetwork
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<Fragment, BuildError> {
        let ion = ctx.ionization_mode().as_str();
        let input_dir = ctx.input_dir();
        let metadata_path = input_dir.join(metadata_file(ctx.sample_name, ion));
        let graph_path = input_dir.join(graph_file(ctx.sample_name, ion));

        let table = open_table(&metadata_path, &[FEATURE_KEY, PRECURSOR_MZ, COMPONENT_ID])?;
        let edges = read_edges(&graph_path)?.ok_or(BuildError::MissingInput(graph_path))?;

        let mut fragment = Fragment::new(self.source());
        let nodes: BTreeMap<u64, NetworkNode> = keyed_rows(&table, FEATURE_KEY, &mut fragment.stats)
            .into_iter()
            .map(|(scan, row)| {
                let node = NetworkNode {
                    precursor_mz: row.float(PRECURSOR_MZ),
                    component: row.integer(COMPONENT_ID),
                };
                (scan, node)
            })
            .collect();

        let deriver = ctx.deriver;
        let graph = &mut fragment.graph;

        for (&scan, node) in &nodes {
            let Some(component) = node.component else {
                continue;
            };
            let feature = deriver.feature(scan);
            let tag = if component == SINGLETON_COMPONENT {
                class::SINGLE_NODE
            } else {
                class::IN_NETWORK
            };
            graph.add_type(&feature, tag);
            graph.add_link(&feature, predicate::HAS_FBMN_CI, &deriver.component(component));
        }

        let mut skipped_edges = 0;
        for edge in &edges {
            fragment.stats.rows_read += 1;

            let endpoints = scan_from_feature_key(&edge.source)
                .ok()
                .zip(scan_from_feature_key(&edge.target).ok());
            let Some((source, target)) = endpoints else {
                skipped_edges += 1;
                continue;
            };

            let masses = nodes
                .get(&source)
                .and_then(|n| n.precursor_mz)
                .zip(nodes.get(&target).and_then(|n| n.precursor_mz));
            let Some((source_mz, target_mz)) = masses else {
                debug!(
                    "{}: edge {}-{} has an endpoint without precursor m/z, skipped",
                    ctx.sample_name, edge.source, edge.target
                );
                skipped_edges += 1;
                continue;
            };

            let (member_1, member_2) = orient((source, source_mz), (target, target_mz));
            let pair = deriver.feature_pair(member_1, member_2);

            graph.add_type(&pair, class::LF_PAIR);
            graph.add_link(&pair, predicate::HAS_MEMBER_1, &deriver.feature(member_1));
            graph.add_link(&pair, predicate::HAS_MEMBER_2, &deriver.feature(member_2));
            put_float(graph, &pair, predicate::HAS_COSINE, edge.float("weight"));
            graph.add_literal(
                &pair,
                predicate::HAS_MASS_DIFFERENCE,
                Literal::float((source_mz - target_mz).abs()),
            );
        }

        if skipped_edges > 0 {
            warn!(
                "{}: {} network edges skipped (endpoint missing from {})",
                ctx.sample_name,
                skipped_edges,
                metadata_path.display()
            );
        }
        fragment.stats.rows_skipped += skipped_edges;
        debug!("{}: network {}", ctx.sample_name, fragment.stats);
        Ok(fragment)
    }
}
