use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use super::*;
use crate::graph::GraphStore;
use crate::merge::{MergeConfig, MergeEngine};

fn merged_sample(root: &Path, name: &str, fragment: &str) -> (PathBuf, PathBuf) {
    let dir = root.join(name);
    fs::create_dir_all(dir.join("rdf")).unwrap();
    fs::write(
        dir.join("metadata.tsv"),
        format!("sample_id\tmassive_id\n{}\tMSV001\n", name),
    )
    .unwrap();

    let mut graph = GraphStore::new();
    graph.add_type("https://enpkg.commons-lab.org/kg/lcms_feature_1", "SingleNode");
    fs::write(dir.join("rdf").join(fragment), graph.serialize()).unwrap();

    let outcome = MergeEngine::new(MergeConfig::default())
        .merge_sample(&dir)
        .unwrap()
        .unwrap();
    (dir, outcome.artifact)
}

#[test]
fn test_export_copies_artifact() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("export");
    let (dir, artifact) = merged_sample(root.path(), "S1", "sirius_pos.ttl");

    let stage = ExportStage::new(ExportConfig::new(&target));
    stage.prepare(&[]).unwrap();
    let exported = stage.export_sample(&dir).unwrap().unwrap();

    assert_eq!(exported, target.join(artifact.file_name().unwrap()));
    assert_eq!(fs::read(&exported).unwrap(), fs::read(&artifact).unwrap());
}

#[test]
fn test_export_with_compression() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("export");
    let (dir, artifact) = merged_sample(root.path(), "S1", "sirius_pos.ttl");

    let mut config = ExportConfig::new(&target);
    config.compress = true;
    let stage = ExportStage::new(config);
    stage.prepare(&[]).unwrap();
    let exported = stage.export_sample(&dir).unwrap().unwrap();

    assert!(exported.to_string_lossy().ends_with(".ttl.gz"));
    let mut text = String::new();
    GzDecoder::new(fs::File::open(&exported).unwrap())
        .read_to_string(&mut text)
        .unwrap();
    assert_eq!(text, fs::read_to_string(&artifact).unwrap());
}

#[test]
fn test_sample_without_artifact_is_skipped() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("S1");
    fs::create_dir_all(dir.join("rdf")).unwrap();
    fs::write(dir.join("rdf/sirius_pos.ttl"), "").unwrap();

    let stage = ExportStage::new(ExportConfig::new(root.path().join("export")));
    stage.prepare(&[]).unwrap();
    assert!(stage.export_sample(&dir).unwrap().is_none());
}

#[test]
fn test_ionization_filter_uses_provenance() {
    let root = tempfile::tempdir().unwrap();
    let (pos_dir, _) = merged_sample(root.path(), "S1", "sirius_pos.ttl");
    let (neg_dir, _) = merged_sample(root.path(), "S2", "sirius_neg.ttl");

    let mut config = ExportConfig::new(root.path().join("export"));
    config.ionization = Some(IonizationMode::Neg);
    let stage = ExportStage::new(config);
    stage.prepare(&[]).unwrap();

    assert!(stage.export_sample(&pos_dir).unwrap().is_none());
    assert!(stage.export_sample(&neg_dir).unwrap().is_some());
}

#[test]
fn test_ionization_filter_without_provenance() {
    let root = tempfile::tempdir().unwrap();
    let (dir, _) = merged_sample(root.path(), "S1", "sirius_pos.ttl");
    fs::remove_file(dir.join("rdf").join(crate::merge::PROVENANCE_FILE)).unwrap();

    let mut config = ExportConfig::new(root.path().join("export"));
    config.ionization = Some(IonizationMode::Pos);
    let stage = ExportStage::new(config);
    stage.prepare(&[]).unwrap();
    assert!(stage.export_sample(&dir).unwrap().is_some());
}

#[test]
fn test_purge_removes_stale_graphs_only() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("export");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("MSV001_S9_merged_graph_old.ttl.gz"), b"x").unwrap();
    fs::write(target.join("README.txt"), b"keep").unwrap();

    let mut config = ExportConfig::new(&target);
    config.purge = true;
    let purged = ExportStage::new(config).prepare(&[]).unwrap();

    assert_eq!(purged, 1);
    assert!(!target.join("MSV001_S9_merged_graph_old.ttl.gz").exists());
    assert!(target.join("README.txt").exists());
}

#[test]
fn test_purge_with_ionization_keeps_other_polarity() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("export");
    let (pos_dir, _) = merged_sample(root.path(), "S1", "sirius_pos.ttl");
    let (neg_dir, _) = merged_sample(root.path(), "S2", "sirius_neg.ttl");

    let mut first = ExportConfig::new(&target);
    first.compress = true;
    let stage = ExportStage::new(first);
    stage.prepare(&[]).unwrap();
    let pos_export = stage.export_sample(&pos_dir).unwrap().unwrap();
    let neg_export = stage.export_sample(&neg_dir).unwrap().unwrap();

    let mut config = ExportConfig::new(&target);
    config.ionization = Some(IonizationMode::Neg);
    config.purge = true;
    let samples = vec![pos_dir, neg_dir];
    let purged = ExportStage::new(config).prepare(&samples).unwrap();

    assert_eq!(purged, 1);
    assert!(pos_export.exists());
    assert!(!neg_export.exists());
}

#[test]
fn test_export_is_repeatable() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("export");
    let (dir, _) = merged_sample(root.path(), "S1", "sirius_pos.ttl");

    let stage = ExportStage::new(ExportConfig::new(&target));
    stage.prepare(&[]).unwrap();
    let first = stage.export_sample(&dir).unwrap().unwrap();
    let second = stage.export_sample(&dir).unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_dir(&target).unwrap().count(), 1);
}
