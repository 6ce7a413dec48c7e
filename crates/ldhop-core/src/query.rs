//! # Query Module
//!
//! Hop query steps and the compiled `Query`.
//!
//! A hop query is an ordered list of steps. Each step either matches a
//! triple pattern and binds a new variable from one position of every match,
//! transforms a bound term into a new one, or marks a variable whose terms are
//! documents that must be fetched.

use crate::iri::{container_uri, document_uri};
use crate::primitives::VARIABLE_PREFIX;
use crate::{LdhopError, QuadPosition, Term, Variable};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// SLOTS
// =============================================================================

/// A constraint on one quad position of a match step.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Slot {
    /// The position must hold a term currently bound to this variable.
    Variable(Variable),
    /// The position must hold exactly this term.
    Constant(Term),
}

impl Slot {
    /// Parse the textual form: `?name` is a variable, anything else an IRI.
    pub fn parse(text: &str) -> Result<Self, LdhopError> {
        if text.starts_with(VARIABLE_PREFIX) {
            Variable::parse(text).map(Self::Variable)
        } else if text.is_empty() {
            Err(LdhopError::InvalidIri(text.to_string()))
        } else {
            Ok(Self::Constant(Term::iri(text)))
        }
    }

    /// The slot as a graph constraint: IRI constants become document IRIs,
    /// the spelling every stored quad uses for its graph.
    #[must_use]
    pub fn into_graph(self) -> Self {
        match self {
            Self::Constant(Term::Iri(iri)) => Self::Constant(Term::iri(document_uri(&iri))),
            other => other,
        }
    }

    /// The variable, if this slot is one.
    #[must_use]
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Self::Variable(variable) => Some(variable),
            Self::Constant(_) => None,
        }
    }
}

impl From<Variable> for Slot {
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<Term> for Slot {
    fn from(term: Term) -> Self {
        Self::Constant(term)
    }
}

// =============================================================================
// STEPS
// =============================================================================

/// Match a triple pattern and bind `target` from the `pick` position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchStep {
    pub subject: Option<Slot>,
    pub predicate: Option<Slot>,
    pub object: Option<Slot>,
    pub graph: Option<Slot>,
    pub pick: QuadPosition,
    pub target: Variable,
}

impl MatchStep {
    /// A step with no constraints yet.
    #[must_use]
    pub fn new(pick: QuadPosition, target: Variable) -> Self {
        Self {
            subject: None,
            predicate: None,
            object: None,
            graph: None,
            pick,
            target,
        }
    }

    #[must_use]
    pub fn subject(mut self, slot: impl Into<Slot>) -> Self {
        self.subject = Some(slot.into());
        self
    }

    #[must_use]
    pub fn predicate(mut self, slot: impl Into<Slot>) -> Self {
        self.predicate = Some(slot.into());
        self
    }

    #[must_use]
    pub fn object(mut self, slot: impl Into<Slot>) -> Self {
        self.object = Some(slot.into());
        self
    }

    #[must_use]
    pub fn graph(mut self, slot: impl Into<Slot>) -> Self {
        self.graph = Some(slot.into().into_graph());
        self
    }

    /// The constraint at a position.
    #[must_use]
    pub fn slot(&self, position: QuadPosition) -> Option<&Slot> {
        match position {
            QuadPosition::Subject => self.subject.as_ref(),
            QuadPosition::Predicate => self.predicate.as_ref(),
            QuadPosition::Object => self.object.as_ref(),
            QuadPosition::Graph => self.graph.as_ref(),
        }
    }

    /// Positions constrained by a variable, with that variable.
    pub fn variable_slots(&self) -> impl Iterator<Item = (QuadPosition, &Variable)> {
        QuadPosition::ALL.into_iter().filter_map(|position| {
            self.slot(position)
                .and_then(Slot::as_variable)
                .map(|variable| (position, variable))
        })
    }

    /// Check if any position is constrained by `variable`.
    #[must_use]
    pub fn references(&self, variable: &Variable) -> bool {
        self.variable_slots().any(|(_, v)| v == variable)
    }
}

/// A named pure function from a term to an optional term.
///
/// Returning `None` means "no hop".
#[derive(Clone)]
pub struct TransformFn {
    name: String,
    func: Arc<dyn Fn(&Term) -> Option<Term> + Send + Sync>,
}

impl TransformFn {
    /// Wrap a closure under a name used for debugging.
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&Term) -> Option<Term> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// The IRI of the document holding the term (fragment stripped).
    #[must_use]
    pub fn document() -> Self {
        Self::new("document", |term| {
            term.as_iri().map(|iri| Term::iri(document_uri(iri)))
        })
    }

    /// The container holding the term's document.
    #[must_use]
    pub fn container() -> Self {
        Self::new("container", |term| {
            term.as_iri().and_then(container_uri).map(Term::iri)
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the function.
    #[must_use]
    pub fn apply(&self, term: &Term) -> Option<Term> {
        (self.func)(term)
    }
}

impl fmt::Debug for TransformFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformFn")
            .field("name", &self.name)
            .finish()
    }
}

/// Derive `target` from every term bound to `source`.
#[derive(Debug, Clone)]
pub struct TransformStep {
    pub source: Variable,
    pub target: Variable,
    pub transform: TransformFn,
}

/// A single step of a hop query.
#[derive(Debug, Clone)]
pub enum Step {
    /// Match a triple pattern against the store.
    Match(MatchStep),
    /// Map a bound term to a new term.
    Transform(TransformStep),
    /// Terms bound to this variable are documents to fetch.
    AddResources { variable: Variable },
}

impl Step {
    /// Shorthand for a transform step.
    #[must_use]
    pub fn transform(source: Variable, target: Variable, transform: TransformFn) -> Self {
        Self::Transform(TransformStep {
            source,
            target,
            transform,
        })
    }

    /// Shorthand for an add-resources step.
    #[must_use]
    pub fn add_resources(variable: Variable) -> Self {
        Self::AddResources { variable }
    }
}

impl From<MatchStep> for Step {
    fn from(step: MatchStep) -> Self {
        Self::Match(step)
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// A compiled hop query.
///
/// Steps referencing variables that never get bound are inert; queries are
/// static configuration and are not validated for reachability.
#[derive(Debug, Clone, Default)]
pub struct Query {
    steps: Vec<Step>,
    /// Variables whose IRI terms require their document to be fetched.
    needed: BTreeSet<Variable>,
}

impl Query {
    /// Compile a list of steps.
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Self {
        let needed = steps
            .iter()
            .flat_map(|step| match step {
                Step::Match(m) => m.variable_slots().map(|(_, v)| v.clone()).collect(),
                Step::AddResources { variable } => vec![variable.clone()],
                Step::Transform(_) => Vec::new(),
            })
            .collect();

        Self { steps, needed }
    }

    /// Steps in query order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Check if terms bound to `variable` need their document fetched.
    #[must_use]
    pub fn is_needed(&self, variable: &Variable) -> bool {
        self.needed.contains(variable)
    }

    /// Get the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the query has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl FromIterator<Step> for Query {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
