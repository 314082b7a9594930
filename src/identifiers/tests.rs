use super::*;

fn deriver(massive_id: Option<&str>, ion: IonizationMode) -> IdentifierDeriver {
    let sample = Sample::new("S1", massive_id.map(String::from), ion).unwrap();
    IdentifierDeriver::new(sample)
}

#[test]
fn test_usi_construction() {
    let ids = deriver(Some("MSV001"), IonizationMode::Pos);
    assert_eq!(ids.usi(42), "mzspec:MSV001:S1_features_ms2_pos.mgf:scan:42");
}

#[test]
fn test_usi_without_massive_id_uses_sentinel() {
    let ids = deriver(None, IonizationMode::Neg);
    assert_eq!(ids.usi(7), "mzspec:MSV_NA:S1_features_ms2_neg.mgf:scan:7");

    // Falsy values behave like an absent id
    for falsy in ["", "  ", "NaN", "nan"] {
        let ids = deriver(Some(falsy), IonizationMode::Pos);
        assert_eq!(ids.sample().massive_id(), MASSIVE_ID_SENTINEL);
    }
}

#[test]
fn test_missing_sample_id_is_rejected() {
    assert_eq!(
        Sample::new("", Some("MSV001".into()), IonizationMode::Pos),
        Err(IdentifierError::MissingSampleId)
    );
    assert_eq!(
        Sample::new("nan", None, IonizationMode::Pos),
        Err(IdentifierError::MissingSampleId)
    );
}

#[test]
fn test_feature_and_annotation_identifiers() {
    let ids = deriver(Some("MSV001"), IonizationMode::Pos);

    assert_eq!(
        ids.feature(42),
        "https://enpkg.commons-lab.org/kg/lcms_feature_mzspec:MSV001:S1_features_ms2_pos.mgf:scan:42"
    );
    assert_eq!(
        ids.annotation(AnnotationKind::SpectralLibrary, 42, 2),
        "https://enpkg.commons-lab.org/kg/speclib_mzspec:MSV001:S1_features_ms2_pos.mgf:scan:42/SpecLibAnnotation/2"
    );
    assert_eq!(
        ids.annotation(AnnotationKind::SiriusClass, 3, 1),
        "https://enpkg.commons-lab.org/kg/canopus_mzspec:MSV001:S1_features_ms2_pos.mgf:scan:3/SiriusCanopusAnnotation/1"
    );
}

#[test]
fn test_annotation_identifiers_are_unique_per_feature_source_rank() {
    let ids = deriver(Some("MSV001"), IonizationMode::Pos);
    let mut seen = std::collections::HashSet::new();
    for kind in [
        AnnotationKind::SiriusStructure,
        AnnotationKind::SiriusClass,
        AnnotationKind::SpectralLibrary,
        AnnotationKind::Tima,
    ] {
        for scan in [1, 11, 111] {
            for rank in 1..=3 {
                assert!(seen.insert(ids.annotation(kind, scan, rank)));
            }
        }
    }
}

#[test]
fn test_normalize_label_rules() {
    assert_eq!(normalize_label("Fatty acids"), "Fatty_acids");
    assert_eq!(normalize_label("Shikimates and Phenylpropanoids"), "Shikimates_and_Phenylpropanoids");
    assert_eq!(normalize_label("Amino acids (and peptides)"), "Amino_acids_and_peptides");
    assert_eq!(normalize_label("Ergot-alkaloids"), "Ergot_alkaloids");
    assert_eq!(normalize_label("Class #1"), "Class__1");
    assert_eq!(normalize_label("Benzene, toluene"), "Benzene_toluene");
    assert_eq!(normalize_label("  padded  "), "padded");
}

#[test]
fn test_normalize_label_percent_encodes_leftovers() {
    assert_eq!(normalize_label("1/2"), "1%2F2");
    assert_eq!(normalize_label("a:b"), "a%3Ab");
    assert_eq!(normalize_label("β-lactams"), "%CE%B2_lactams");
}

#[test]
fn test_label_identifiers_agree_across_callers() {
    let pos = deriver(Some("MSV001"), IonizationMode::Pos);
    let neg = deriver(None, IonizationMode::Neg);

    let a = pos.label(LabelScheme::Npc, "Amino acids and Peptides");
    let b = neg.label(LabelScheme::Npc, "Amino acids and Peptides ");
    assert_eq!(a, b);
    assert_eq!(
        a.as_deref(),
        Some("https://enpkg.commons-lab.org/kg/npc_Amino_acids_and_Peptides")
    );

    assert_eq!(
        pos.label(LabelScheme::ClassyFire, "Organic acids, and derivatives").as_deref(),
        Some("https://enpkg.commons-lab.org/kg/Organic_acids_and_derivatives")
    );
    assert_eq!(pos.label(LabelScheme::Npc, "NaN"), None);
    assert_eq!(pos.label(LabelScheme::Npc, "()"), None);
}

#[test]
fn test_structure_identifier() {
    let ids = deriver(Some("MSV001"), IonizationMode::Pos);
    assert_eq!(
        ids.structure("BSYNRYMUTXBXSQ").as_deref(),
        Some("https://enpkg.commons-lab.org/kg/BSYNRYMUTXBXSQ")
    );
    assert_eq!(
        ids.structure("BSYNRYMUTXBXSQ-UHFFFAOYSA-N").as_deref(),
        Some("https://enpkg.commons-lab.org/kg/BSYNRYMUTXBXSQ-UHFFFAOYSA-N")
    );
    assert_eq!(ids.structure(""), None);
}

#[test]
fn test_component_and_pair_identifiers() {
    let ids = deriver(Some("MSV001"), IonizationMode::Pos);
    assert_eq!(
        ids.component(-1),
        "https://enpkg.commons-lab.org/kg/S1_fbmn_pos_componentindex_-1"
    );
    assert_eq!(
        ids.feature_pair(5, 9),
        "https://enpkg.commons-lab.org/kg/lcms_feature_pair_mzspec:MSV001:S1_features_ms2_pos.mgf:scan:5_mzspec:MSV001:S1_features_ms2_pos.mgf:scan:9"
    );
}

#[test]
fn test_iri_escapes_forbidden_characters() {
    let sample = Sample::new("my sample", None, IonizationMode::Pos).unwrap();
    let ids = IdentifierDeriver::new(sample);
    let iri = ids.feature(1);
    assert!(!iri.contains(' '));
    assert!(iri.contains("my%20sample"));
    // The USI itself stays bit-exact
    assert_eq!(ids.usi(1), "mzspec:MSV_NA:my sample_features_ms2_pos.mgf:scan:1");
}

#[test]
fn test_scan_from_feature_key() {
    assert_eq!(scan_from_feature_key("42"), Ok(42));
    assert_eq!(scan_from_feature_key("42.0"), Ok(42));
    assert_eq!(scan_from_feature_key("0_sample_pos_1337"), Ok(1337));
    assert!(scan_from_feature_key("abc").is_err());
    assert!(scan_from_feature_key("12.5").is_err());
    assert!(scan_from_feature_key("").is_err());
}

#[test]
fn test_ionization_parsing() {
    assert_eq!("pos".parse::<IonizationMode>(), Ok(IonizationMode::Pos));
    assert_eq!("NEG".parse::<IonizationMode>(), Ok(IonizationMode::Neg));
    assert!("both".parse::<IonizationMode>().is_err());
    assert_eq!("auto".parse::<IonizationSetting>(), Ok(IonizationSetting::Auto));
    assert_eq!(IonizationSetting::Neg.explicit(), Some(IonizationMode::Neg));
    assert_eq!(IonizationSetting::Auto.explicit(), None);
}

#[test]
fn test_polarity_from_adduct() {
    assert_eq!(IonizationMode::from_adduct("[M+H]+"), Some(IonizationMode::Pos));
    assert_eq!(IonizationMode::from_adduct("[M-H]-"), Some(IonizationMode::Neg));
    assert_eq!(IonizationMode::from_adduct("M+H"), None);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Normalized labels never contain characters that break identifiers
        #[test]
        fn test_normalized_label_is_identifier_safe(label in ".{0,40}") {
            let normalized = normalize_label(&label);
            for forbidden in [' ', '(', ')', '-', '#', ',', '/', ':', '<', '>', '"'] {
                prop_assert!(!normalized.contains(forbidden));
            }
        }

        /// Derivation is a pure function of its inputs
        #[test]
        fn test_derivation_is_deterministic(sample_id in "[A-Za-z0-9_]{1,12}", scan in 0u64..1_000_000) {
            let a = IdentifierDeriver::new(Sample::new(sample_id.clone(), None, IonizationMode::Pos).unwrap());
            let b = IdentifierDeriver::new(Sample::new(sample_id, None, IonizationMode::Pos).unwrap());
            prop_assert_eq!(a.feature(scan), b.feature(scan));
            prop_assert_eq!(
                a.annotation(AnnotationKind::Tima, scan, 1),
                b.annotation(AnnotationKind::Tima, scan, 1)
            );
        }
    }
}
