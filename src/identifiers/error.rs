/// Errors raised while deriving identifiers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The sample metadata carries no `sample_id`
    #[error("Sample metadata has no sample_id")]
    MissingSampleId,

    /// A feature key does not end in a scan number
    #[error("Cannot derive a scan number from feature key '{0}'")]
    InvalidScanNumber(String),

    /// Unknown ionization mode label
    #[error("Invalid ionization mode '{0}' (expected pos, neg or auto)")]
    InvalidIonizationMode(String),
}
