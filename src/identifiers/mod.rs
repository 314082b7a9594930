//! # Identifier Deriver
//!
//! Every IRI that ends up in a sample graph is built here. Builders never
//! concatenate identifier strings themselves, so two sources that talk about
//! the same feature, structure or class label always produce the same node.
//!
//! ## Identifier scheme
//!
//! ```text
//! USI         mzspec:{massive_id|MSV_NA}:{sample_id}_features_ms2_{ion}.mgf:scan:{scan}
//! feature     {kg}lcms_feature_{usi}
//! annotation  {kg}{source_tag}{usi}/{AnnotationType}/{rank}
//! structure   {kg}{structure_key}
//! label       {kg}{scheme_prefix}{normalized_label}
//! component   {kg}{sample_id}_fbmn_{ion}_componentindex_{component}
//! pair        {kg}lcms_feature_pair_{usi_member_1}_{usi_member_2}
//! ```
//!
//! Derivation is a pure function of the [`Sample`] and the row key: the same
//! inputs always give the same identifier.

mod error;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::table::is_missing;

pub use error::IdentifierError;

/// Domain namespace of the knowledge graph (`enpkg:` prefix)
pub const KG_NAMESPACE: &str = "https://enpkg.commons-lab.org/kg/";

/// Module namespace (`enpkgmodule:` prefix)
pub const MODULE_NAMESPACE: &str = "https://enpkg.commons-lab.org/module/";

/// Wikidata entity namespace, bound on merged graphs
pub const WIKIDATA_NAMESPACE: &str = "http://www.wikidata.org/entity/";

/// Placeholder used when a sample has no public dataset identifier
pub const MASSIVE_ID_SENTINEL: &str = "MSV_NA";

/// Polarity of the mass-spectral acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IonizationMode {
    /// Positive ionization
    Pos,
    /// Negative ionization
    Neg,
}

impl IonizationMode {
    /// Both polarities, positive first
    pub const ALL: [IonizationMode; 2] = [IonizationMode::Pos, IonizationMode::Neg];

    /// Short lowercase name used in file names and USIs
    pub fn as_str(&self) -> &'static str {
        match self {
            IonizationMode::Pos => "pos",
            IonizationMode::Neg => "neg",
        }
    }

    /// Polarity implied by an adduct label such as `[M+H]+` or `[M-H]-`
    pub fn from_adduct(adduct: &str) -> Option<Self> {
        if adduct.contains("]+") {
            Some(IonizationMode::Pos)
        } else if adduct.contains("]-") {
            Some(IonizationMode::Neg)
        } else {
            None
        }
    }
}

impl fmt::Display for IonizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IonizationMode {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pos" | "positive" => Ok(IonizationMode::Pos),
            "neg" | "negative" => Ok(IonizationMode::Neg),
            other => Err(IdentifierError::InvalidIonizationMode(other.to_string())),
        }
    }
}

/// Requested ionization: a fixed polarity or inference from the data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IonizationSetting {
    /// Positive mode only
    Pos,
    /// Negative mode only
    Neg,
    /// Infer from the dominant adduct polarity of each sample
    #[default]
    Auto,
}

impl IonizationSetting {
    /// The fixed polarity, or `None` for `auto`
    pub fn explicit(&self) -> Option<IonizationMode> {
        match self {
            IonizationSetting::Pos => Some(IonizationMode::Pos),
            IonizationSetting::Neg => Some(IonizationMode::Neg),
            IonizationSetting::Auto => None,
        }
    }
}

impl From<IonizationMode> for IonizationSetting {
    fn from(mode: IonizationMode) -> Self {
        match mode {
            IonizationMode::Pos => IonizationSetting::Pos,
            IonizationMode::Neg => IonizationSetting::Neg,
        }
    }
}

impl fmt::Display for IonizationSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IonizationSetting::Pos => f.write_str("pos"),
            IonizationSetting::Neg => f.write_str("neg"),
            IonizationSetting::Auto => f.write_str("auto"),
        }
    }
}

impl FromStr for IonizationSetting {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(IonizationSetting::Auto);
        }
        IonizationMode::from_str(s).map(IonizationSetting::from)
    }
}

/// One physical specimen, immutable for the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    sample_id: String,
    massive_id: Option<String>,
    ionization_mode: IonizationMode,
}

impl Sample {
    /// Create a sample, rejecting a missing `sample_id`.
    ///
    /// An empty or missing-value `massive_id` is stored as absent and later
    /// rendered as [`MASSIVE_ID_SENTINEL`].
    pub fn new(
        sample_id: impl Into<String>,
        massive_id: Option<String>,
        ionization_mode: IonizationMode,
    ) -> Result<Self, IdentifierError> {
        let sample_id = sample_id.into().trim().to_string();
        if is_missing(&sample_id) {
            return Err(IdentifierError::MissingSampleId);
        }
        let massive_id = massive_id
            .map(|m| m.trim().to_string())
            .filter(|m| !is_missing(m));

        Ok(Self {
            sample_id,
            massive_id,
            ionization_mode,
        })
    }

    /// The sample identifier
    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    /// The public dataset identifier, or `MSV_NA`
    pub fn massive_id(&self) -> &str {
        self.massive_id.as_deref().unwrap_or(MASSIVE_ID_SENTINEL)
    }

    /// Ionization mode the sample was acquired in
    pub fn ionization_mode(&self) -> IonizationMode {
        self.ionization_mode
    }
}

/// Annotation sources that yield ranked candidates per feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    /// SIRIUS / CSI:FingerID structure candidates
    SiriusStructure,
    /// CANOPUS chemical class predictions
    SiriusClass,
    /// Spectral library matches
    SpectralLibrary,
    /// TIMA taxonomically informed consensus annotation
    Tima,
}

impl AnnotationKind {
    /// Prefix placed in front of the USI
    pub fn source_tag(&self) -> &'static str {
        match self {
            AnnotationKind::SiriusStructure => "sirius_",
            AnnotationKind::SiriusClass => "canopus_",
            AnnotationKind::SpectralLibrary => "speclib_",
            AnnotationKind::Tima => "tima_",
        }
    }

    /// RDF class of the annotation node
    pub fn type_name(&self) -> &'static str {
        match self {
            AnnotationKind::SiriusStructure => "SiriusStructureAnnotation",
            AnnotationKind::SiriusClass => "SiriusCanopusAnnotation",
            AnnotationKind::SpectralLibrary => "SpecLibAnnotation",
            AnnotationKind::Tima => "TimaAnnotation",
        }
    }
}

/// Classification vocabularies whose labels become shared nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelScheme {
    /// NPClassifier pathway / superclass / class
    Npc,
    /// ClassyFire taxonomy levels
    ClassyFire,
}

impl LabelScheme {
    fn prefix(&self) -> &'static str {
        match self {
            LabelScheme::Npc => "npc_",
            LabelScheme::ClassyFire => "",
        }
    }
}

/// Builds every identifier of one sample's graph
#[derive(Debug, Clone)]
pub struct IdentifierDeriver {
    sample: Sample,
    usi_prefix: String,
}

impl IdentifierDeriver {
    /// Create a deriver bound to one sample
    pub fn new(sample: Sample) -> Self {
        let usi_prefix = format!(
            "mzspec:{}:{}_features_ms2_{}.mgf:scan:",
            sample.massive_id(),
            sample.sample_id(),
            sample.ionization_mode()
        );
        Self { sample, usi_prefix }
    }

    /// The sample this deriver is bound to
    pub fn sample(&self) -> &Sample {
        &self.sample
    }

    /// Universal Spectrum Identifier of a feature
    pub fn usi(&self, scan: u64) -> String {
        format!("{}{}", self.usi_prefix, scan)
    }

    /// IRI of a chromatographic feature
    pub fn feature(&self, scan: u64) -> String {
        kg_iri(&format!("lcms_feature_{}", self.usi(scan)))
    }

    /// IRI of the `rank`-th annotation of a feature from one source
    pub fn annotation(&self, kind: AnnotationKind, scan: u64, rank: u32) -> String {
        kg_iri(&format!(
            "{}{}/{}/{}",
            kind.source_tag(),
            self.usi(scan),
            kind.type_name(),
            rank
        ))
    }

    /// IRI of a structure from its structural key; `None` for a blank key
    pub fn structure(&self, key: &str) -> Option<String> {
        let key = key.trim();
        if is_missing(key) {
            return None;
        }
        Some(format!("{}{}", KG_NAMESPACE, encode_segment(key)))
    }

    /// IRI of a classification label, shared by every builder
    pub fn label(&self, scheme: LabelScheme, label: &str) -> Option<String> {
        if is_missing(label.trim()) {
            return None;
        }
        let normalized = normalize_label(label);
        if normalized.is_empty() {
            return None;
        }
        Some(format!("{}{}{}", KG_NAMESPACE, scheme.prefix(), normalized))
    }

    /// IRI of a molecular network component of this sample
    pub fn component(&self, component_id: i64) -> String {
        format!(
            "{}{}_fbmn_{}_componentindex_{}",
            KG_NAMESPACE,
            encode_segment(self.sample.sample_id()),
            self.sample.ionization_mode(),
            component_id
        )
    }

    /// IRI of an oriented feature pair (member 1 first)
    pub fn feature_pair(&self, member_1: u64, member_2: u64) -> String {
        kg_iri(&format!(
            "lcms_feature_pair_{}_{}",
            self.usi(member_1),
            self.usi(member_2)
        ))
    }
}

/// Extract the scan number from a feature key.
///
/// Keys are either a bare number (`"42"`, `"42.0"`) or a tool-specific id
/// whose last `_`-separated segment is the scan (`"0_sample_42"`).
pub fn scan_from_feature_key(key: &str) -> Result<u64, IdentifierError> {
    let trimmed = key.trim();
    let tail = trimmed.rsplit('_').next().unwrap_or(trimmed).trim();

    if let Ok(scan) = tail.parse::<u64>() {
        return Ok(scan);
    }
    match tail.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(v as u64),
        _ => Err(IdentifierError::InvalidScanNumber(key.to_string())),
    }
}

/// Normalize a class or taxonomy label into an identifier segment.
///
/// Spaces, hyphens and `#` become `_`; parentheses and commas are dropped;
/// anything else outside the RFC 3986 unreserved set is percent-encoded.
pub fn normalize_label(label: &str) -> String {
    let mut cleaned = String::with_capacity(label.len());
    for ch in label.trim().chars() {
        match ch {
            ' ' | '-' | '#' => cleaned.push('_'),
            '(' | ')' | ',' => {}
            c => cleaned.push(c),
        }
    }
    encode_segment(&cleaned)
}

/// Percent-encode every byte outside `[A-Za-z0-9-._~]`
pub fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Absolute IRI in the domain namespace.
///
/// Characters that may not appear inside a Turtle IRI reference are
/// percent-encoded; everything else (including the `:` and `/` of USIs) is
/// kept verbatim.
pub fn kg_iri(local: &str) -> String {
    let mut out = String::with_capacity(KG_NAMESPACE.len() + local.len());
    out.push_str(KG_NAMESPACE);
    for ch in local.chars() {
        let forbidden = matches!(
            ch,
            ' ' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\'
        ) || ch.is_control();

        if forbidden {
            let mut buf = [0u8; 4];
            for byte in ch.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        } else {
            out.push(ch);
        }
    }
    out
}
