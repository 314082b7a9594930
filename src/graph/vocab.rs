//! Predicates and classes used by the annotation builders.
//!
//! Everything lives in the domain namespace except the handful of W3C terms
//! at the top.

use crate::identifiers::KG_NAMESPACE;

pub const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NAMESPACE: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// Full IRI of a term in the domain namespace
pub fn kg(term: &str) -> String {
    format!("{}{}", KG_NAMESPACE, term)
}

/// Classes
pub mod class {
    pub const INCHIKEY_2D: &str = "InChIkey2D";
    pub const SIRIUS_STRUCTURE_ANNOTATION: &str = "SiriusStructureAnnotation";
    pub const SIRIUS_CANOPUS_ANNOTATION: &str = "SiriusCanopusAnnotation";
    pub const SPECLIB_ANNOTATION: &str = "SpecLibAnnotation";
    pub const TIMA_ANNOTATION: &str = "TimaAnnotation";
    pub const SINGLE_NODE: &str = "SingleNode";
    pub const IN_NETWORK: &str = "InNetwork";
    pub const LF_PAIR: &str = "LFpair";
}

/// Predicates
pub mod predicate {
    // shared
    pub const HAS_RANK: &str = "has_rank";
    pub const HAS_INCHIKEY_2D: &str = "has_InChIkey2D";
    pub const HAS_MOLECULAR_FORMULA: &str = "has_molecular_formula";
    pub const HAS_SMILES: &str = "has_SMILES";
    pub const HAS_NPC_PATHWAY: &str = "has_npc_pathway";
    pub const HAS_NPC_SUPERCLASS: &str = "has_npc_superclass";
    pub const HAS_NPC_CLASS: &str = "has_npc_class";
    pub const HAS_CLASSYFIRE_SUPERCLASS: &str = "has_classyfire_superclass";
    pub const HAS_CLASSYFIRE_CLASS: &str = "has_classyfire_class";
    pub const HAS_CLASSYFIRE_LEVEL_5: &str = "has_classyfire_level_5";

    // structure annotation
    pub const HAS_SIRIUS_ANNOTATION: &str = "has_sirius_annotation";
    pub const HAS_IONIZATION: &str = "has_ionization";
    pub const HAS_SIRIUS_ADDUCT: &str = "has_sirius_adduct";
    pub const HAS_SIRIUS_SCORE: &str = "has_sirius_score";
    pub const HAS_ZODIAC_SCORE: &str = "has_zodiac_score";
    pub const HAS_COSMIC_SCORE: &str = "has_cosmic_score";

    // class annotation
    pub const HAS_CANOPUS_ANNOTATION: &str = "has_canopus_annotation";
    pub const HAS_ADDUCT: &str = "has_adduct";
    pub const HAS_PRECURSOR_FORMULA: &str = "has_precursor_formula";
    pub const HAS_NPC_PATHWAY_PROB: &str = "has_npc_pathway_prob";
    pub const HAS_NPC_SUPERCLASS_PROB: &str = "has_npc_superclass_prob";
    pub const HAS_NPC_CLASS_PROB: &str = "has_npc_class_prob";
    pub const HAS_CLASSYFIRE_MOST_SPECIFIC_CLASS: &str = "has_classyfire_most_specific_class";
    pub const HAS_CLASSYFIRE_MOST_SPECIFIC_CLASS_PROB: &str =
        "has_classyfire_most_specific_class_prob";
    pub const HAS_CLASSYFIRE_LEVEL_5_PROB: &str = "has_classyfire_level_5_prob";
    pub const HAS_CLASSYFIRE_SUBCLASS: &str = "has_classyfire_subclass";
    pub const HAS_CLASSYFIRE_SUBCLASS_PROB: &str = "has_classyfire_subclass_prob";
    pub const HAS_CLASSYFIRE_CLASS_PROB: &str = "has_classyfire_class_prob";
    pub const HAS_CLASSYFIRE_SUPERCLASS_PROB: &str = "has_classyfire_superclass_prob";

    // spectral library
    pub const HAS_SPECLIB_ANNOTATION: &str = "has_speclib_annotation";
    pub const HAS_INCHIKEY: &str = "has_InChIkey";
    pub const HAS_STRUCTURE_NAME: &str = "has_structure_name";
    pub const HAS_INCHI: &str = "has_inchi";
    pub const HAS_SPECTRAL_LIBRARY_ID: &str = "has_spectral_library_id";
    pub const HAS_SPECTRAL_LIBRARY: &str = "has_spectral_library";
    pub const HAS_MSMS_SCORE: &str = "has_msms_score";
    pub const HAS_MATCHED_PEAKS: &str = "has_matched_peaks";

    // molecular network
    pub const HAS_FBMN_CI: &str = "has_fbmn_ci";
    pub const HAS_COSINE: &str = "has_cosine";
    pub const HAS_MASS_DIFFERENCE: &str = "has_mass_difference";
    pub const HAS_MEMBER_1: &str = "has_member_1";
    pub const HAS_MEMBER_2: &str = "has_member_2";

    // taxonomically informed annotation
    pub const HAS_TIMA_ANNOTATION: &str = "has_tima_annotation";
    pub const HAS_REFERENCE: &str = "has_reference";
    pub const HAS_BEST_CANDIDATE_ORGANISM: &str = "has_best_candidate_organism";
    pub const HAS_SPECTRAL_SCORE: &str = "has_spectral_score";
    pub const HAS_TAXO_SCORE: &str = "has_taxo_score";
    pub const HAS_CONSISTENCY_SCORE: &str = "has_consistency_score";
    pub const HAS_FINAL_SCORE: &str = "has_final_score";
    pub const HAS_RANK_INITIAL: &str = "has_rank_initial";
    pub const HAS_RANK_FINAL: &str = "has_rank_final";
    pub const HAS_STRUCTURE_CONFIDENCE_SCORE: &str = "has_structure_confidence_score";
    pub const HAS_STRUCTURE_SIMILARITY_PEAKS_MATCHED: &str =
        "has_structure_similarity_peaks_matched";
    pub const HAS_STRUCTURE_ERROR_MZ: &str = "has_structure_error_mz";
    pub const HAS_LOGP: &str = "has_logp";
    pub const HAS_SPECTRUM_ENTROPY: &str = "has_spectrum_entropy";
    pub const HAS_CLASSYFIRE_CHEMONTID: &str = "has_classyfire_chemontid";
    pub const HAS_CLASSYFIRE_KINGDOM: &str = "has_classyfire_01kin";
}
