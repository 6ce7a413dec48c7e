//! # Core Type Definitions
//!
//! This module contains the value types the engine moves around:
//! - RDF terms and quads (`Term`, `Literal`, `Quad`, `QuadPosition`)
//! - Query variables (`Variable`)
//! - Error types (`LdhopError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module implement `Ord`, so every collection built from
//! them can be a `BTreeMap`/`BTreeSet` with a stable iteration order.

use crate::primitives::VARIABLE_PREFIX;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// TERMS
// =============================================================================

/// A literal value with optional datatype or language tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// The lexical form, unescaped.
    pub lexical: String,
    /// Datatype IRI, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    /// Language tag, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// An RDF term.
///
/// Terms are immutable values. Two terms are equal iff they have the same
/// kind and the same lexical identity, so a `Term` can be used directly as a
/// map key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Term {
    /// A named node.
    Iri(String),
    /// A blank node, identified by its label.
    BlankNode(String),
    /// A literal.
    Literal(Literal),
}

impl Term {
    /// Create an IRI term.
    #[must_use]
    pub fn iri(value: impl Into<String>) -> Self {
        Self::Iri(value.into())
    }

    /// Create a blank node term.
    #[must_use]
    pub fn blank(label: impl Into<String>) -> Self {
        Self::BlankNode(label.into())
    }

    /// Create a plain string literal.
    #[must_use]
    pub fn literal(lexical: impl Into<String>) -> Self {
        Self::Literal(Literal {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        })
    }

    /// The IRI value, if this term is a named node.
    #[must_use]
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(value) => Some(value),
            _ => None,
        }
    }

    /// Check if this term is a named node.
    #[must_use]
    pub fn is_iri(&self) -> bool {
        matches!(self, Self::Iri(_))
    }

    /// Short kind name used in identity keys.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Iri(_) => "NamedNode",
            Self::BlankNode(_) => "BlankNode",
            Self::Literal(_) => "Literal",
        }
    }

    /// The lexical value without kind information.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Iri(value) | Self::BlankNode(value) => value,
            Self::Literal(literal) => &literal.lexical,
        }
    }

    /// Stable identity key: `kind:lexical-id`.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}:{}", self.kind(), self)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(value) => write!(f, "{}", value),
            Self::BlankNode(label) => write!(f, "_:{}", label),
            Self::Literal(literal) => {
                write!(f, "\"{}\"", literal.lexical)?;
                if let Some(language) = &literal.language {
                    write!(f, "@{}", language)
                } else if let Some(datatype) = &literal.datatype {
                    write!(f, "^^{}", datatype)
                } else {
                    Ok(())
                }
            }
        }
    }
}

// =============================================================================
// QUADS
// =============================================================================

/// One of the four positions of a quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuadPosition {
    Subject,
    Predicate,
    Object,
    Graph,
}

impl QuadPosition {
    /// All positions in quad order.
    pub const ALL: [Self; 4] = [Self::Subject, Self::Predicate, Self::Object, Self::Graph];
}

/// A triple tagged with the named graph (document) it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Term,
}

impl Quad {
    /// Create a new quad.
    #[must_use]
    pub fn new(subject: Term, predicate: Term, object: Term, graph: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph,
        }
    }

    /// Get the term at a position.
    #[must_use]
    pub fn get(&self, position: QuadPosition) -> &Term {
        match position {
            QuadPosition::Subject => &self.subject,
            QuadPosition::Predicate => &self.predicate,
            QuadPosition::Object => &self.object,
            QuadPosition::Graph => &self.graph,
        }
    }

    /// Same triple, placed in another graph.
    #[must_use]
    pub fn in_graph(self, graph: Term) -> Self {
        Self { graph, ..self }
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.subject, self.predicate, self.object, self.graph
        )
    }
}

// =============================================================================
// VARIABLES
// =============================================================================

/// A logical variable of a hop query, e.g. `?person`.
///
/// Stores the bare name; the `?` prefix is only part of the textual form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Variable(String);

impl Variable {
    /// Create a variable from a name, with or without the `?` prefix.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.strip_prefix(VARIABLE_PREFIX) {
            Some(stripped) => Self(stripped.to_string()),
            None => Self(name),
        }
    }

    /// Parse the textual form. The `?` prefix is required.
    pub fn parse(text: &str) -> Result<Self, LdhopError> {
        match text.strip_prefix(VARIABLE_PREFIX) {
            Some(name) if is_valid_name(name) => Ok(Self(name.to_string())),
            _ => Err(LdhopError::InvalidVariable(text.to_string())),
        }
    }

    /// The bare name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", VARIABLE_PREFIX, self.0)
    }
}

impl TryFrom<String> for Variable {
    type Error = LdhopError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Variable> for String {
    fn from(variable: Variable) -> Self {
        variable.to_string()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised at the API boundary.
///
/// Internal cascades (forward chaining, retraction) never fail; only
/// malformed caller input and I/O in the outer layers produce errors.
#[derive(Debug, Error)]
pub enum LdhopError {
    /// A variable name is missing its `?` prefix or contains invalid characters.
    #[error("Invalid variable: {0:?}")]
    InvalidVariable(String),

    /// A starting binding or constant is not an absolute IRI.
    #[error("Invalid IRI: {0:?}")]
    InvalidIri(String),

    /// A query configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An RDF document could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================
