//! # Binding Table
//!
//! The set of currently held `(variable, term)` bindings.
//!
//! Bindings are interned into an arena so that moves can reference them by a
//! stable `BindingId` instead of embedding terms. Interning is permanent: a
//! retracted binding keeps its id and gets the same id back if it is derived
//! again later.

use crate::primitives::BINDING_KEY_SEPARATOR;
use crate::{Term, Variable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// BINDING
// =============================================================================

/// Index of an interned binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BindingId(pub usize);

/// A variable bound to one term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub variable: Variable,
    pub term: Term,
}

impl Binding {
    #[must_use]
    pub fn new(variable: Variable, term: Term) -> Self {
        Self { variable, term }
    }

    /// Textual key `variable|kind|lexical`.
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.variable.name(),
            self.term.kind(),
            self.term,
            sep = BINDING_KEY_SEPARATOR
        )
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.variable, self.term)
    }
}

// =============================================================================
// BINDING TABLE
// =============================================================================

/// Arena of interned bindings plus the subset currently held.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    /// Arena: id -> binding.
    arena: Vec<Binding>,

    /// Reverse lookup: binding -> id.
    ids: BTreeMap<Binding, BindingId>,

    /// Currently held bindings.
    bound: BTreeSet<BindingId>,

    /// Current values per variable. A variable with no values has no row.
    values: BTreeMap<Variable, BTreeSet<Term>>,
}

impl BindingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the id of a binding, allocating one if it was never seen.
    ///
    /// Interning does not bind.
    pub fn intern(&mut self, variable: &Variable, term: &Term) -> BindingId {
        let binding = Binding::new(variable.clone(), term.clone());
        if let Some(id) = self.ids.get(&binding) {
            return *id;
        }

        let id = BindingId(self.arena.len());
        self.arena.push(binding.clone());
        self.ids.insert(binding, id);
        id
    }

    /// Look up an interned binding.
    #[must_use]
    pub fn resolve(&self, id: BindingId) -> Option<&Binding> {
        self.arena.get(id.0)
    }

    /// The id of a binding, if it was ever interned.
    #[must_use]
    pub fn id_of(&self, variable: &Variable, term: &Term) -> Option<BindingId> {
        self.ids
            .get(&Binding::new(variable.clone(), term.clone()))
            .copied()
    }

    /// Check if `variable` is currently bound to `term`.
    #[must_use]
    pub fn has(&self, variable: &Variable, term: &Term) -> bool {
        self.values
            .get(variable)
            .is_some_and(|terms| terms.contains(term))
    }

    /// Check if an interned binding is currently held.
    #[must_use]
    pub fn is_bound(&self, id: BindingId) -> bool {
        self.bound.contains(&id)
    }

    /// Hold a binding. Returns `true` if it was not held before.
    pub fn insert(&mut self, id: BindingId) -> bool {
        let Some(binding) = self.arena.get(id.0) else {
            return false;
        };
        if !self.bound.insert(id) {
            return false;
        }

        self.values
            .entry(binding.variable.clone())
            .or_default()
            .insert(binding.term.clone());
        true
    }

    /// Release a binding. Returns `true` if it was held.
    pub fn remove(&mut self, id: BindingId) -> bool {
        if !self.bound.remove(&id) {
            return false;
        }
        let Some(binding) = self.arena.get(id.0) else {
            return false;
        };

        let now_empty = self
            .values
            .get_mut(&binding.variable)
            .is_some_and(|terms| {
                terms.remove(&binding.term);
                terms.is_empty()
            });
        if now_empty {
            self.values.remove(&binding.variable);
        }
        true
    }

    /// Current values of a variable.
    #[must_use]
    pub fn values_of(&self, variable: &Variable) -> Option<&BTreeSet<Term>> {
        self.values.get(variable)
    }

    /// All current values, per variable.
    #[must_use]
    pub fn all(&self) -> &BTreeMap<Variable, BTreeSet<Term>> {
        &self.values
    }

    /// Number of held bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
