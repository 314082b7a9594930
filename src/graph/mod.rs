//! # Graph Store
//!
//! Append-only, namespace-aware collection of RDF triples.
//!
//! Builders [`add`](GraphStore::add) triples freely, duplicates included.
//! Set semantics only apply on output: [`GraphStore::serialize`] writes each
//! distinct triple once, sorted by subject, predicate and object, so the
//! same triples always serialize to the same bytes.
//!
//! ## Example
//!
//! ```
//! use mzgraph::graph::{GraphStore, Literal};
//!
//! let mut graph = GraphStore::new();
//! let feature = "https://enpkg.commons-lab.org/kg/lcms_feature_1";
//! graph.add_type(feature, "InNetwork");
//! graph.add_literal(feature, "has_rank", Literal::integer(1));
//!
//! let ttl = graph.serialize();
//! let parsed = GraphStore::parse(&ttl).unwrap();
//! assert_eq!(parsed.distinct(), graph.distinct());
//! ```

mod error;
mod turtle;
pub mod vocab;


use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::identifiers::{KG_NAMESPACE, MODULE_NAMESPACE};

pub use error::GraphError;

/// Datatype of a literal
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Datatype {
    /// Plain string (`xsd:string`, written without a datatype)
    String,
    /// Language-tagged string
    Lang(String),
    /// `xsd:float`
    Float,
    /// `xsd:integer`
    Integer,
    /// Any other datatype IRI
    Other(String),
}

impl Datatype {
    /// Datatype from its IRI
    pub fn from_iri(iri: &str) -> Self {
        match iri {
            vocab::XSD_STRING => Datatype::String,
            vocab::XSD_FLOAT => Datatype::Float,
            vocab::XSD_INTEGER => Datatype::Integer,
            other => Datatype::Other(other.to_string()),
        }
    }

    /// IRI of the datatype, `None` for plain and language-tagged strings
    pub fn iri(&self) -> Option<&str> {
        match self {
            Datatype::String | Datatype::Lang(_) => None,
            Datatype::Float => Some(vocab::XSD_FLOAT),
            Datatype::Integer => Some(vocab::XSD_INTEGER),
            Datatype::Other(iri) => Some(iri),
        }
    }
}

/// An RDF literal: lexical form plus datatype
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Datatype,
}

impl Literal {
    /// Plain string literal
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            lexical: value.into(),
            datatype: Datatype::String,
        }
    }

    /// `xsd:float` literal.
    ///
    /// Integral values keep one decimal (`1.0`) so the lexical form stays
    /// recognisably floating point.
    pub fn float(value: f64) -> Self {
        let lexical = if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{:.1}", value)
        } else {
            format!("{}", value)
        };
        Self {
            lexical,
            datatype: Datatype::Float,
        }
    }

    /// `xsd:integer` literal
    pub fn integer(value: i64) -> Self {
        Self {
            lexical: value.to_string(),
            datatype: Datatype::Integer,
        }
    }

    /// Literal with an explicit datatype IRI
    pub fn typed(lexical: impl Into<String>, datatype_iri: &str) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Datatype::from_iri(datatype_iri),
        }
    }

    /// Language-tagged literal
    pub fn lang(lexical: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Datatype::Lang(tag.into()),
        }
    }
}

/// Subject or object of a triple
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    /// Absolute IRI
    Iri(String),
    /// Blank node label (without the `_:` prefix)
    Blank(String),
    /// Literal value
    Literal(Literal),
}

impl Term {
    /// IRI term
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// The IRI, if this term is one
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// The literal, if this term is one
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(literal) => Some(literal),
            _ => None,
        }
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Blank(label) => write!(f, "_:{}", label),
            Term::Literal(literal) => {
                let lexical = turtle::escape_literal(&literal.lexical);
                match &literal.datatype {
                    Datatype::String => write!(f, "\"{}\"", lexical),
                    Datatype::Lang(tag) => write!(f, "\"{}\"@{}", lexical, tag),
                    other => write!(f, "\"{}\"^^<{}>", lexical, other.iri().unwrap_or_default()),
                }
            }
        }
    }
}

/// A subject-predicate-object statement
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {} .", self.subject, self.predicate, self.object)
    }
}

/// Append-only triple collection with prefix bindings
#[derive(Debug, Clone)]
pub struct GraphStore {
    prefixes: BTreeMap<String, String>,
    triples: Vec<Triple>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    /// Empty store with the `enpkg`, `enpkgmodule`, `rdf`, `rdfs` and `xsd` bindings
    pub fn new() -> Self {
        let mut prefixes = BTreeMap::new();
        prefixes.insert("enpkg".to_string(), KG_NAMESPACE.to_string());
        prefixes.insert("enpkgmodule".to_string(), MODULE_NAMESPACE.to_string());
        prefixes.insert("rdf".to_string(), vocab::RDF_NAMESPACE.to_string());
        prefixes.insert("rdfs".to_string(), vocab::RDFS_NAMESPACE.to_string());
        prefixes.insert("xsd".to_string(), vocab::XSD_NAMESPACE.to_string());
        Self {
            prefixes,
            triples: Vec::new(),
        }
    }

    /// Bind an additional prefix (e.g. `wd` for Wikidata)
    pub fn bind(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Prefix bindings, sorted by prefix
    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefixes
    }

    /// Append a triple; duplicates are kept
    pub fn add(&mut self, triple: Triple) {
        self.triples.push(triple);
    }

    /// Append a triple whose predicate is in the domain namespace
    pub fn add_kg(&mut self, subject: &str, predicate: &str, object: Term) {
        self.add(Triple::new(
            Term::iri(subject),
            vocab::kg(predicate),
            object,
        ));
    }

    /// Link two resources through a domain predicate
    pub fn add_link(&mut self, subject: &str, predicate: &str, object_iri: &str) {
        self.add_kg(subject, predicate, Term::iri(object_iri));
    }

    /// Attach a literal through a domain predicate
    pub fn add_literal(&mut self, subject: &str, predicate: &str, literal: Literal) {
        self.add_kg(subject, predicate, Term::Literal(literal));
    }

    /// `subject rdf:type enpkg:{class}`
    pub fn add_type(&mut self, subject: &str, class: &str) {
        self.add(Triple::new(
            Term::iri(subject),
            vocab::RDF_TYPE,
            Term::iri(vocab::kg(class)),
        ));
    }

    /// `subject rdfs:label "{label}"`
    pub fn add_label(&mut self, subject: &str, label: impl Into<String>) {
        self.add(Triple::new(
            Term::iri(subject),
            vocab::RDFS_LABEL,
            Term::Literal(Literal::string(label)),
        ));
    }

    /// Append every triple of another store and adopt its prefixes
    pub fn extend(&mut self, other: GraphStore) {
        for (prefix, namespace) in other.prefixes {
            self.prefixes.entry(prefix).or_insert(namespace);
        }
        self.triples.extend(other.triples);
    }

    /// Triples in insertion order, duplicates included
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Number of added triples, duplicates included
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Whether nothing was added
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Distinct triples in canonical order
    pub fn distinct(&self) -> BTreeSet<Triple> {
        self.triples.iter().cloned().collect()
    }

    /// Deterministic Turtle serialization
    pub fn serialize(&self) -> String {
        turtle::write(&self.prefixes, &self.distinct())
    }

    /// Serialize an already deduplicated set with this store's prefixes
    pub fn serialize_set(&self, triples: &BTreeSet<Triple>) -> String {
        turtle::write(&self.prefixes, triples)
    }

    /// Parse a Turtle document.
    ///
    /// Prefixes declared by the document are kept as bindings.
    pub fn parse(input: &str) -> Result<Self, GraphError> {
        let (prefixes, triples) = turtle::parse(input)?;
        let mut store = Self::new();
        for (prefix, namespace) in prefixes {
            store.prefixes.entry(prefix).or_insert(namespace);
        }
        store.triples = triples;
        Ok(store)
    }

    /// Read and parse a Turtle file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes)?;
        Self::parse(&text)
    }
}
