use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mzgraph::graph::vocab::{class, predicate};
use mzgraph::graph::{GraphStore, Literal};
use mzgraph::identifiers::{AnnotationKind, IdentifierDeriver, IonizationMode, Sample};

/// A structure-annotation-like graph: 5 ranked candidates per feature
fn build_graph(num_features: u64) -> GraphStore {
    let sample = Sample::new("S1", Some("MSV000012345".to_string()), IonizationMode::Pos).unwrap();
    let deriver = IdentifierDeriver::new(sample);
    let mut graph = GraphStore::new();

    for scan in 0..num_features {
        let feature = deriver.feature(scan);
        for rank in 1..=5u32 {
            let annotation = deriver.annotation(AnnotationKind::SiriusStructure, scan, rank);
            let structure = format!("https://enpkg.commons-lab.org/kg/{:014}", scan * 10 + rank as u64);
            graph.add_link(&feature, predicate::HAS_SIRIUS_ANNOTATION, &annotation);
            graph.add_type(&annotation, class::SIRIUS_STRUCTURE_ANNOTATION);
            graph.add_link(&annotation, predicate::HAS_INCHIKEY_2D, &structure);
            graph.add_type(&structure, class::INCHIKEY_2D);
            graph.add_literal(&annotation, predicate::HAS_RANK, Literal::integer(rank as i64));
            graph.add_literal(
                &annotation,
                predicate::HAS_SIRIUS_SCORE,
                Literal::float(100.0 / rank as f64),
            );
        }
    }
    graph
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("turtle_serialize");

    for num_features in [100u64, 1_000, 5_000] {
        let graph = build_graph(num_features);
        group.throughput(Throughput::Elements(graph.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}features", num_features)),
            &graph,
            |b, graph| b.iter(|| black_box(graph.serialize())),
        );
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("turtle_parse");

    for num_features in [100u64, 1_000, 5_000] {
        let graph = build_graph(num_features);
        let text = graph.serialize();
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}features", num_features)),
            &text,
            |b, text| b.iter(|| black_box(GraphStore::parse(text).unwrap())),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_serialize, bench_parse);
criterion_main!(benches);
