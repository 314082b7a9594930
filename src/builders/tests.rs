use std::fs;
use std::path::Path;

use super::polarity::{dominant_adduct, relocate_inputs, resolve_polarity};
use super::*;
use crate::graph::vocab::{self, class, predicate};
use crate::graph::{Term, Triple};
use crate::identifiers::{AnnotationKind, IonizationSetting, Sample};

struct Fixture {
    _dir: tempfile::TempDir,
    sample_dir: std::path::PathBuf,
    deriver: IdentifierDeriver,
    adducts: AdductTable,
    ranking: RankingConfig,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("S1").join("pos")).unwrap();
        let sample = Sample::new("S1", Some("MSV001".to_string()), IonizationMode::Pos).unwrap();
        Self {
            sample_dir: dir.path().join("S1"),
            _dir: dir,
            deriver: IdentifierDeriver::new(sample),
            adducts: AdductTable::identity(),
            ranking: RankingConfig::default(),
        }
    }

    fn sample_dir(&self) -> std::path::PathBuf {
        self.sample_dir.clone()
    }

    fn ctx(&self) -> BuildContext<'_> {
        BuildContext {
            sample_dir: &self.sample_dir,
            sample_name: "S1",
            deriver: &self.deriver,
            adducts: &self.adducts,
            ranking: &self.ranking,
        }
    }

    fn write(&self, relative: &str, content: &str) {
        self.write_bytes(relative, content.as_bytes());
    }

    fn write_bytes(&self, relative: &str, content: &[u8]) {
        let path = self.sample_dir().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn contains(graph: &GraphStore, subject: &str, predicate: &str, object: Term) -> bool {
    graph
        .distinct()
        .contains(&Triple::new(Term::iri(subject), vocab::kg(predicate), object))
}

fn has_type(graph: &GraphStore, subject: &str, class: &str) -> bool {
    graph.distinct().contains(&Triple::new(
        Term::iri(subject),
        vocab::RDF_TYPE,
        Term::iri(vocab::kg(class)),
    ))
}

fn objects(graph: &GraphStore, subject: &str, predicate: &str) -> Vec<Term> {
    let predicate = vocab::kg(predicate);
    graph
        .distinct()
        .into_iter()
        .filter(|t| t.subject == Term::iri(subject) && t.predicate == predicate)
        .map(|t| t.object)
        .collect()
}

const SIRIUS_TABLE: &str = "id\tInChIkey2D\tadduct\tSiriusScore\tZodiacScore\tConfidenceScore
0_S1_42\tABCDEFGHIJKLMN\t[M+H]+\t10.5\t0.9\t0.8
broken_key\tBBBBBBBBBBBBBB\t[M+H]+\t1\t0.1\t0.1
0_S1_43\tNaN\t[M+H]+\t1\t0.1\t0.1
0_S1_44\tCCCCCCCCCCCCCC\t[M + H]+\tnan\t\tNaN
";

#[test]
fn test_structure_annotation_triples() {
    let fx = Fixture::new();
    fx.write("pos/compound_identifications.tsv", SIRIUS_TABLE);

    let fragment = StructureAnnotationBuilder.build(&fx.ctx()).unwrap();
    let graph = &fragment.graph;

    assert_eq!(fragment.stats.rows_read, 4);
    assert_eq!(fragment.stats.rows_skipped, 2);

    let feature = fx.deriver.feature(42);
    let annotation = fx.deriver.annotation(AnnotationKind::SiriusStructure, 42, 1);
    assert_eq!(
        annotation,
        "https://enpkg.commons-lab.org/kg/sirius_mzspec:MSV001:S1_features_ms2_pos.mgf:scan:42/SiriusStructureAnnotation/1"
    );
    assert!(contains(graph, &feature, predicate::HAS_SIRIUS_ANNOTATION, Term::iri(&annotation)));
    assert!(has_type(graph, &annotation, class::SIRIUS_STRUCTURE_ANNOTATION));
    assert!(has_type(
        graph,
        "https://enpkg.commons-lab.org/kg/ABCDEFGHIJKLMN",
        class::INCHIKEY_2D
    ));
    assert!(contains(
        graph,
        &annotation,
        predicate::HAS_SIRIUS_SCORE,
        Term::Literal(Literal::float(10.5))
    ));
    assert!(contains(
        graph,
        &annotation,
        predicate::HAS_IONIZATION,
        Term::Literal(Literal::string("pos"))
    ));
    assert!(contains(
        graph,
        &annotation,
        predicate::HAS_RANK,
        Term::Literal(Literal::integer(1))
    ));

    // Missing scores are omitted, not written as placeholders
    let other = fx.deriver.annotation(AnnotationKind::SiriusStructure, 44, 1);
    assert!(objects(graph, &other, predicate::HAS_SIRIUS_SCORE).is_empty());
    assert!(objects(graph, &other, predicate::HAS_ZODIAC_SCORE).is_empty());
    assert!(objects(graph, &other, predicate::HAS_COSMIC_SCORE).is_empty());
}

#[test]
fn test_undecodable_row_skips_only_that_row() {
    let fx = Fixture::new();
    let mut table = b"id\tInChIkey2D\tadduct\tSiriusScore\tZodiacScore\tConfidenceScore
0_S1_1\tAAAAAAAAAAAAAA\t[M+H]+\t12.0\t0.9\t0.8
0_S1_2\tBBBBBBBBBBBBBB\t[M+H]+\t9.5\t0.7\t"
        .to_vec();
    table.extend_from_slice(&[0xff, b'\n']);
    fx.write_bytes("pos/compound_identifications.tsv", &table);

    let fragment = StructureAnnotationBuilder.build(&fx.ctx()).unwrap();
    assert_eq!(fragment.stats.rows_read, 2);
    assert_eq!(fragment.stats.rows_skipped, 1);

    let kept = fx.deriver.annotation(AnnotationKind::SiriusStructure, 1, 1);
    let dropped = fx.deriver.annotation(AnnotationKind::SiriusStructure, 2, 1);
    assert!(has_type(&fragment.graph, &kept, class::SIRIUS_STRUCTURE_ANNOTATION));
    assert!(!has_type(&fragment.graph, &dropped, class::SIRIUS_STRUCTURE_ANNOTATION));
    assert!(write_fragment(&fx.ctx(), &fragment).unwrap().is_some());
}

#[test]
fn test_structure_annotation_normalizes_adducts() {
    let mut fx = Fixture::new();
    fx.adducts = AdductTable::from_json_str(r#"{"[M + H]+": "[M+H]+"}"#).unwrap();
    fx.write("pos/compound_identifications.tsv", SIRIUS_TABLE);

    let fragment = StructureAnnotationBuilder.build(&fx.ctx()).unwrap();
    let annotation = fx.deriver.annotation(AnnotationKind::SiriusStructure, 44, 1);
    assert_eq!(
        objects(&fragment.graph, &annotation, predicate::HAS_SIRIUS_ADDUCT),
        vec![Term::Literal(Literal::string("[M+H]+"))]
    );
}

#[test]
fn test_missing_source_is_recoverable() {
    let fx = Fixture::new();
    let err = StructureAnnotationBuilder.build(&fx.ctx()).unwrap_err();
    assert!(matches!(err, BuildError::MissingInput(_)));
    assert!(err.is_recoverable());

    let err = NetworkEdgeBuilder.build(&fx.ctx()).unwrap_err();
    assert!(matches!(err, BuildError::MissingInput(_)));

    let err = TaxonomicAnnotationBuilder.build(&fx.ctx()).unwrap_err();
    assert!(matches!(err, BuildError::MissingInput(_)));
}

#[test]
fn test_missing_columns() {
    let fx = Fixture::new();
    fx.write("pos/compound_identifications.tsv", "id\tadduct\n0_S1_1\t[M+H]+\n");

    match StructureAnnotationBuilder.build(&fx.ctx()) {
        Err(BuildError::MissingColumns { columns, .. }) => {
            assert_eq!(columns, vec!["InChIkey2D".to_string()])
        }
        other => panic!("expected missing columns, got {:?}", other),
    }
}

#[test]
fn test_class_annotation_labels() {
    let fx = Fixture::new();
    fx.write(
        "pos/canopus_formula_summary_adducts.tsv",
        "id\tmolecularFormula\tadduct\tprecursorFormula\tNPC#pathway\tNPC#pathway Probability\tNPC#superclass\tNPC#superclass Probability\tNPC#class\tNPC#class Probability\tClassyFire#superclass\tClassyFire#superclass probability
0_S1_7\tC10H12O\t[M+H]+\tC10H13O\tAlkaloids\t0.99\tPseudoalkaloids (transamidation)\t0.5\tβ-lactams\t0.4\tOrganoheterocyclic compounds\t0.95
",
    );

    let fragment = ClassAnnotationBuilder.build(&fx.ctx()).unwrap();
    let graph = &fragment.graph;
    let annotation = fx.deriver.annotation(AnnotationKind::SiriusClass, 7, 1);

    assert!(contains(
        graph,
        &fx.deriver.feature(7),
        predicate::HAS_CANOPUS_ANNOTATION,
        Term::iri(&annotation)
    ));
    assert_eq!(
        objects(graph, &annotation, predicate::HAS_NPC_SUPERCLASS),
        vec![Term::iri("https://enpkg.commons-lab.org/kg/npc_Pseudoalkaloids_transamidation")]
    );
    assert_eq!(
        objects(graph, &annotation, predicate::HAS_NPC_CLASS),
        vec![Term::iri("https://enpkg.commons-lab.org/kg/npc_%CE%B2_lactams")]
    );
    assert_eq!(
        objects(graph, &annotation, predicate::HAS_CLASSYFIRE_SUPERCLASS),
        vec![Term::iri("https://enpkg.commons-lab.org/kg/Organoheterocyclic_compounds")]
    );
    assert_eq!(
        objects(graph, &annotation, predicate::HAS_CLASSYFIRE_SUPERCLASS_PROB),
        vec![Term::Literal(Literal::float(0.95))]
    );
    assert!(objects(graph, &annotation, predicate::HAS_CLASSYFIRE_LEVEL_5).is_empty());
}

#[test]
fn test_spectral_library_ranking() {
    let fx = Fixture::new();
    fx.write(
        "pos/spectral_lib_matching/S1_lib_results_final_pos.tsv",
        "feature_id\tinchikey\tsmiles\tcompound_name\tinchi\tSpectral_library_ID\tSpectral_library\tmsms_score\tmatched_peaks
5\tAAAAAAAAAAAAAA-UHFFFAOYSA-N\tC\tfirst\tInChI=1S/CH4\tID1\tlib\t0.7\t6
5\tBBBBBBBBBBBBBB-UHFFFAOYSA-N\tCC\tsecond\t\tID2\tlib\t0.9\t8
5\t\tCCC\tthird\t\tID3\tlib\t0.7\t4.0
5\tDDDDDDDDDDDDDD-UHFFFAOYSA-N\tCCCC\tfourth\t\tID4\tlib\t0.1\t2
6\tEEEEEEEEEEEEEE-UHFFFAOYSA-N\tO\tother\t\tID5\tlib\t\t
",
    );

    let fragment = SpectralLibraryBuilder.build(&fx.ctx()).unwrap();
    let graph = &fragment.graph;
    assert_eq!(fragment.stats.rows_truncated, 1);

    let names = |rank: u32| {
        objects(
            graph,
            &fx.deriver.annotation(AnnotationKind::SpectralLibrary, 5, rank),
            predicate::HAS_STRUCTURE_NAME,
        )
    };
    assert_eq!(names(1), vec![Term::Literal(Literal::string("second"))]);
    assert_eq!(names(2), vec![Term::Literal(Literal::string("first"))]);
    assert_eq!(names(3), vec![Term::Literal(Literal::string("third"))]);
    assert!(names(4).is_empty());

    let best = fx.deriver.annotation(AnnotationKind::SpectralLibrary, 5, 1);
    assert!(contains(
        graph,
        &best,
        predicate::HAS_INCHIKEY,
        Term::iri("https://enpkg.commons-lab.org/kg/BBBBBBBBBBBBBB-UHFFFAOYSA-N")
    ));
    assert!(contains(
        graph,
        &best,
        predicate::HAS_INCHIKEY_2D,
        Term::iri("https://enpkg.commons-lab.org/kg/BBBBBBBBBBBBBB")
    ));

    // "4.0" matched peaks is still an integer
    let third = fx.deriver.annotation(AnnotationKind::SpectralLibrary, 5, 3);
    assert_eq!(
        objects(graph, &third, predicate::HAS_MATCHED_PEAKS),
        vec![Term::Literal(Literal::integer(4))]
    );
    assert!(objects(graph, &third, predicate::HAS_INCHIKEY).is_empty());
}

const MN_METADATA: &str = "feature_id\tprecursor_mz\tcomponent_id
1\t300.2\t3
2\t500.1\t3
3\t250.0\t-1
4\t\t5
";

const MN_GRAPH: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="edge" attr.name="weight" attr.type="double"/>
  <graph edgedefault="undirected">
    <edge source="1" target="2"><data key="d0">0.82</data></edge>
    <edge source="1" target="9"><data key="d0">0.75</data></edge>
    <edge source="4" target="2"><data key="d0">0.70</data></edge>
  </graph>
</graphml>"#;

#[test]
fn test_network_edge_orientation() {
    let fx = Fixture::new();
    fx.write("pos/molecular_network/S1_mn_metadata_pos.tsv", MN_METADATA);
    fx.write("pos/molecular_network/S1_mn_pos.graphml", MN_GRAPH);

    let fragment = NetworkEdgeBuilder.build(&fx.ctx()).unwrap();
    let graph = &fragment.graph;

    let pair = fx.deriver.feature_pair(2, 1);
    assert!(has_type(graph, &pair, class::LF_PAIR));
    assert!(contains(graph, &pair, predicate::HAS_MEMBER_1, Term::iri(fx.deriver.feature(2))));
    assert!(contains(graph, &pair, predicate::HAS_MEMBER_2, Term::iri(fx.deriver.feature(1))));
    assert!(contains(
        graph,
        &pair,
        predicate::HAS_COSINE,
        Term::Literal(Literal::float(0.82))
    ));
    assert_eq!(objects(graph, &pair, predicate::HAS_MASS_DIFFERENCE).len(), 1);

    // Endpoint 9 is unknown, feature 4 has no precursor m/z
    assert!(!has_type(graph, &fx.deriver.feature_pair(1, 9), class::LF_PAIR));
    assert!(!has_type(graph, &fx.deriver.feature_pair(2, 4), class::LF_PAIR));
    assert_eq!(fragment.stats.rows_skipped, 2);
}

#[test]
fn test_network_component_tagging() {
    let fx = Fixture::new();
    fx.write("pos/molecular_network/S1_mn_metadata_pos.tsv", MN_METADATA);
    fx.write("pos/molecular_network/S1_mn_pos.graphml", MN_GRAPH);

    let fragment = NetworkEdgeBuilder.build(&fx.ctx()).unwrap();
    let graph = &fragment.graph;

    assert!(has_type(graph, &fx.deriver.feature(1), class::IN_NETWORK));
    assert!(has_type(graph, &fx.deriver.feature(3), class::SINGLE_NODE));
    assert!(contains(
        graph,
        &fx.deriver.feature(3),
        predicate::HAS_FBMN_CI,
        Term::iri("https://enpkg.commons-lab.org/kg/S1_fbmn_pos_componentindex_-1")
    ));
    // Feature 4 is tagged even though its edge was skipped
    assert!(has_type(graph, &fx.deriver.feature(4), class::IN_NETWORK));
}

#[test]
fn test_orient_ties_by_scan() {
    assert_eq!(network::orient((5, 100.0), (2, 100.0)), (2, 5));
    assert_eq!(network::orient((5, 100.0), (2, 99.0)), (5, 2));
    assert_eq!(network::orient((5, 10.0), (2, 99.0)), (2, 5));
}

#[test]
fn test_taxonomic_annotation_uses_final_rank() {
    let fx = Fixture::new();
    fx.write(
        "pos/tima/data/processed/240101_tima_annotations.tsv",
        "feature_id\tcandidate_structure_inchikey_no_stereo\trank_final\tscore_final\tcandidate_structure_tax_npc_01pat\tcandidate_structure_tax_cla_chemontid
8\tAAAAAAAAAAAAAA\t2\t0.5\tTerpenoids\tCHEMONTID:0000259
8\tBBBBBBBBBBBBBB\t1\t0.7\tAlkaloids\t
8\t\t\t\t\t
",
    );

    let fragment = TaxonomicAnnotationBuilder.build(&fx.ctx()).unwrap();
    let graph = &fragment.graph;
    let first = fx.deriver.annotation(AnnotationKind::Tima, 8, 1);

    assert_eq!(fragment.stats.rows_skipped, 1);
    assert!(contains(
        graph,
        &first,
        predicate::HAS_INCHIKEY_2D,
        Term::iri("https://enpkg.commons-lab.org/kg/BBBBBBBBBBBBBB")
    ));
    assert!(contains(
        graph,
        &first,
        predicate::HAS_NPC_PATHWAY,
        Term::iri("https://enpkg.commons-lab.org/kg/npc_Alkaloids")
    ));
    let second = fx.deriver.annotation(AnnotationKind::Tima, 8, 2);
    assert!(contains(
        graph,
        &second,
        predicate::HAS_CLASSYFIRE_CHEMONTID,
        Term::Literal(Literal::string("CHEMONTID:0000259"))
    ));
}

#[test]
fn test_taxonomic_annotation_without_structure_keeps_classes() {
    let fx = Fixture::new();
    fx.write(
        "pos/tima/data/processed/240101_tima_annotations.tsv",
        "feature_id\tcandidate_structure_inchikey_no_stereo\trank_final\tcandidate_structure_tax_npc_01pat
9\t\t1\tTerpenoids
",
    );

    let fragment = TaxonomicAnnotationBuilder.build(&fx.ctx()).unwrap();
    let graph = &fragment.graph;
    let annotation = fx.deriver.annotation(AnnotationKind::Tima, 9, 1);

    assert_eq!(fragment.stats.rows_skipped, 0);
    assert!(contains(
        graph,
        &fx.deriver.feature(9),
        predicate::HAS_TIMA_ANNOTATION,
        Term::iri(&annotation)
    ));
    assert!(contains(
        graph,
        &annotation,
        predicate::HAS_NPC_PATHWAY,
        Term::iri("https://enpkg.commons-lab.org/kg/npc_Terpenoids")
    ));
    assert!(objects(graph, &annotation, predicate::HAS_INCHIKEY_2D).is_empty());
}

#[test]
fn test_tima_falls_back_to_sample_root() {
    let fx = Fixture::new();
    fx.write(
        "tima/data/processed/x_tima_annotations.tsv",
        "feature_id\tcandidate_structure_inchikey_no_stereo\trank_final\n1\tAAAAAAAAAAAAAA\t1\n",
    );
    let path = TaxonomicAnnotationBuilder::locate(&fx.ctx()).unwrap();
    assert!(path.ends_with("x_tima_annotations.tsv"));
}

#[test]
fn test_write_fragment() {
    let fx = Fixture::new();
    fx.write("pos/compound_identifications.tsv", SIRIUS_TABLE);
    let ctx = fx.ctx();

    let fragment = StructureAnnotationBuilder.build(&ctx).unwrap();
    let path = write_fragment(&ctx, &fragment).unwrap().unwrap();
    assert_eq!(path, fx.sample_dir().join("rdf").join("sirius_pos.ttl"));

    let parsed = GraphStore::from_file(&path).unwrap();
    assert_eq!(parsed.distinct(), fragment.graph.distinct());

    let empty = Fragment::new(AnnotationSource::Tima);
    assert!(write_fragment(&ctx, &empty).unwrap().is_none());
    assert!(!fx.sample_dir().join("rdf").join("tima-r_pos.ttl").exists());
}

#[test]
fn test_source_names() {
    for source in AnnotationSource::ALL {
        assert_eq!(source.as_str().parse::<AnnotationSource>(), Ok(source));
    }
    assert_eq!(
        AnnotationSource::MolecularNetwork.fragment_file_name(IonizationMode::Neg),
        "individual_mn_neg.ttl"
    );
    assert!("nope".parse::<AnnotationSource>().is_err());
}

#[test]
fn test_dominant_adduct() {
    assert_eq!(
        dominant_adduct(["[M+H]+", "[M-H]-", "[M+H]+"]),
        Some("[M+H]+".to_string())
    );
    // Tie: lexicographically smallest wins
    assert_eq!(
        dominant_adduct(["[M-H]-", "[M+H]+"]),
        Some("[M+H]+".to_string())
    );
    assert_eq!(dominant_adduct(Vec::<&str>::new()), None);
}

fn write_root(sample_dir: &Path, name: &str, content: &str) {
    fs::create_dir_all(sample_dir).unwrap();
    fs::write(sample_dir.join(name), content).unwrap();
}

#[test]
fn test_auto_polarity_relocates_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let sample_dir = dir.path().join("S2");
    write_root(&sample_dir, "metadata.tsv", "sample_id\nS2\n");
    write_root(
        &sample_dir,
        "compound_identifications.tsv",
        "id\tadduct\n1\t[M-H]-\n2\t[M-H]-\n3\t[M+H]+\n",
    );
    write_root(&sample_dir, "features.mgf", "BEGIN IONS\n");
    write_root(&sample_dir, "notes.txt", "kept\n");

    let mode = resolve_polarity(&sample_dir, IonizationSetting::Auto).unwrap();
    assert_eq!(mode, IonizationMode::Neg);
    assert!(sample_dir.join("metadata.tsv").exists());
    assert!(sample_dir.join("notes.txt").exists());
    assert!(sample_dir.join("neg/compound_identifications.tsv").exists());
    assert!(sample_dir.join("neg/features.mgf").exists());

    // Second run finds the organised layout
    let again = resolve_polarity(&sample_dir, IonizationSetting::Auto).unwrap();
    assert_eq!(again, IonizationMode::Neg);
}

#[test]
fn test_relocation_never_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let sample_dir = dir.path().join("S3");
    write_root(&sample_dir, "quant.csv", "new");
    write_root(&sample_dir.join("pos"), "quant.csv", "old");

    let moved = relocate_inputs(&sample_dir, IonizationMode::Pos).unwrap();
    assert_eq!(moved, 0);
    assert_eq!(fs::read_to_string(sample_dir.join("pos/quant.csv")).unwrap(), "old");
    assert!(sample_dir.join("quant.csv").exists());
}

#[test]
fn test_ambiguous_polarity() {
    let dir = tempfile::tempdir().unwrap();
    let sample_dir = dir.path().join("S4");
    write_root(&sample_dir, "compound_identifications.tsv", "id\tadduct\n1\tM\n");

    let err = resolve_polarity(&sample_dir, IonizationSetting::Auto).unwrap_err();
    assert!(matches!(err, BuildError::AmbiguousPolarity { .. }));
    assert!(!err.is_recoverable());
}

#[test]
fn test_explicit_polarity_wins() {
    let dir = tempfile::tempdir().unwrap();
    let sample_dir = dir.path().join("S5");
    write_root(&sample_dir, "compound_identifications.tsv", "id\tadduct\n1\t[M-H]-\n");

    let mode = resolve_polarity(&sample_dir, IonizationSetting::Pos).unwrap();
    assert_eq!(mode, IonizationMode::Pos);
    assert!(sample_dir.join("compound_identifications.tsv").exists());
}

#[test]
fn test_existing_polarity_directory() {
    let dir = tempfile::tempdir().unwrap();
    let sample_dir = dir.path().join("S6");
    fs::create_dir_all(sample_dir.join("neg")).unwrap();
    assert_eq!(
        resolve_polarity(&sample_dir, IonizationSetting::Auto).unwrap(),
        IonizationMode::Neg
    );

    let empty = dir.path().join("S7");
    fs::create_dir_all(&empty).unwrap();
    assert!(matches!(
        resolve_polarity(&empty, IonizationSetting::Auto),
        Err(BuildError::MissingInput(_))
    ));
}
