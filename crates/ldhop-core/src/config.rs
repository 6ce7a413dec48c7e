//! # Query Configuration
//!
//! Serializable description of a hop query and its starting bindings.
//!
//! Steps are written in the textual hop-query form: `?name` is a variable,
//! any other string in a match position is an IRI constant. Transforms are
//! referenced by name and resolved to the built-in functions.

use crate::engine::StartingBindings;
use crate::primitives::VARIABLE_PREFIX;
use crate::query::{MatchStep, Query, Slot, Step, TransformFn};
use crate::{LdhopError, QuadPosition, Variable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named transform functions available to configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinTransform {
    /// Strip the fragment.
    Document,
    /// Parent container of the document.
    Container,
}

impl BuiltinTransform {
    #[must_use]
    pub fn function(self) -> TransformFn {
        match self {
            Self::Document => TransformFn::document(),
            Self::Container => TransformFn::container(),
        }
    }
}

/// One step of a configured query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StepConfig {
    Match {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subject: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        predicate: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        object: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        graph: Option<String>,
        pick: QuadPosition,
        target: String,
    },
    Transform {
        source: String,
        target: String,
        function: BuiltinTransform,
    },
    AddResources {
        variable: String,
    },
}

impl StepConfig {
    fn build(&self) -> Result<Step, LdhopError> {
        let step = match self {
            Self::Match {
                subject,
                predicate,
                object,
                graph,
                pick,
                target,
            } => Step::Match(MatchStep {
                subject: parse_slot(subject.as_deref())?,
                predicate: parse_slot(predicate.as_deref())?,
                object: parse_slot(object.as_deref())?,
                graph: parse_slot(graph.as_deref())?.map(Slot::into_graph),
                pick: *pick,
                target: Variable::parse(target)?,
            }),
            Self::Transform {
                source,
                target,
                function,
            } => Step::transform(
                Variable::parse(source)?,
                Variable::parse(target)?,
                function.function(),
            ),
            Self::AddResources { variable } => Step::add_resources(Variable::parse(variable)?),
        };
        Ok(step)
    }
}

fn parse_slot(text: Option<&str>) -> Result<Option<Slot>, LdhopError> {
    text.map(Slot::parse).transpose()
}

/// Traversal limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalConfig {
    /// Stop after this many fetches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fetches: Option<usize>,
}

/// A hop query with its starting bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    pub steps: Vec<StepConfig>,
    /// Starting IRIs per variable. Keys may omit the `?`.
    #[serde(default)]
    pub start: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub traversal: TraversalConfig,
}

impl QueryConfig {
    /// Compile into a query and its starting bindings.
    pub fn build(&self) -> Result<(Query, StartingBindings), LdhopError> {
        if self.steps.is_empty() {
            return Err(LdhopError::InvalidConfig("query has no steps".to_string()));
        }

        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                step.build().map_err(|e| {
                    LdhopError::InvalidConfig(format!("step {}: {}", index, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut start = StartingBindings::new();
        for (name, iris) in &self.start {
            let variable = parse_start_variable(name)?;
            start
                .entry(variable)
                .or_default()
                .extend(iris.iter().cloned());
        }

        Ok((Query::new(steps), start))
    }

    /// Add a starting IRI, as given on a command line (`var=iri`).
    pub fn add_start(&mut self, assignment: &str) -> Result<(), LdhopError> {
        let (name, iri) = assignment.split_once('=').ok_or_else(|| {
            LdhopError::InvalidConfig(format!("expected var=iri, got {:?}", assignment))
        })?;
        let variable = parse_start_variable(name.trim())?;
        self.start
            .entry(variable.name().to_string())
            .or_default()
            .push(iri.trim().to_string());
        Ok(())
    }
}

fn parse_start_variable(name: &str) -> Result<Variable, LdhopError> {
    if name.starts_with(VARIABLE_PREFIX) {
        Variable::parse(name)
    } else {
        Variable::parse(&format!("{}{}", VARIABLE_PREFIX, name))
    }
}

// =============================================================================
// TESTS
// =============================================================================
