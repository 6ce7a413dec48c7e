//! # Quad Store
//!
//! The mutable triple store the engine reads from and writes to.
//!
//! This module defines the `QuadStore` trait and an in-memory
//! implementation. All data structures use `BTreeMap` for deterministic
//! ordering.

use crate::{Quad, QuadPosition, Term};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// QUADSTORE TRAIT
// =============================================================================

/// The QuadStore trait defines the store operations the engine relies on.
///
/// Lookups return owned quads so the engine can keep mutating the store
/// while it walks the results.
pub trait QuadStore {
    /// Insert a quad. Returns `true` if it was not present yet.
    fn insert(&mut self, quad: Quad) -> bool;

    /// Remove a quad. Returns `true` if it was present.
    fn remove(&mut self, quad: &Quad) -> bool;

    /// Check if a quad is present.
    fn contains(&self, quad: &Quad) -> bool;

    /// All quads matching the pattern. `None` is a wildcard.
    fn quads_matching(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> Vec<Quad>;

    /// Get the total number of quads.
    fn len(&self) -> usize;

    /// Check if the store holds no quads.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// MEMORY STORE IMPLEMENTATION
// =============================================================================

/// In-memory quad store with one index per quad position.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// All quads.
    quads: BTreeSet<Quad>,

    /// Per-position index: position -> term -> quads with that term there.
    indexes: BTreeMap<QuadPosition, BTreeMap<Term, BTreeSet<Quad>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all quads in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    /// Distinct graph terms currently holding at least one quad.
    #[must_use]
    pub fn graph_terms(&self) -> BTreeSet<Term> {
        self.indexes
            .get(&QuadPosition::Graph)
            .map(|index| index.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn index_len(&self, position: QuadPosition, term: &Term) -> usize {
        self.indexes
            .get(&position)
            .and_then(|index| index.get(term))
            .map_or(0, BTreeSet::len)
    }
}

impl QuadStore for MemoryStore {
    fn insert(&mut self, quad: Quad) -> bool {
        if self.quads.contains(&quad) {
            return false;
        }

        for position in QuadPosition::ALL {
            self.indexes
                .entry(position)
                .or_default()
                .entry(quad.get(position).clone())
                .or_default()
                .insert(quad.clone());
        }
        self.quads.insert(quad)
    }

    fn remove(&mut self, quad: &Quad) -> bool {
        if !self.quads.remove(quad) {
            return false;
        }

        for position in QuadPosition::ALL {
            if let Some(index) = self.indexes.get_mut(&position) {
                let term = quad.get(position);
                let now_empty = index.get_mut(term).is_some_and(|bucket| {
                    bucket.remove(quad);
                    bucket.is_empty()
                });
                if now_empty {
                    index.remove(term);
                }
            }
        }
        true
    }

    fn contains(&self, quad: &Quad) -> bool {
        self.quads.contains(quad)
    }

    fn quads_matching(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> Vec<Quad> {
        let pattern = [
            (QuadPosition::Subject, subject),
            (QuadPosition::Predicate, predicate),
            (QuadPosition::Object, object),
            (QuadPosition::Graph, graph),
        ];

        let matches = |quad: &Quad| {
            pattern
                .iter()
                .all(|(position, term)| term.is_none_or(|t| quad.get(*position) == t))
        };

        // Scan the smallest bucket among the bound positions
        let narrowest = pattern
            .iter()
            .filter_map(|(position, term)| term.map(|t| (*position, t)))
            .min_by_key(|(position, term)| self.index_len(*position, term));

        match narrowest {
            Some((position, term)) => self
                .indexes
                .get(&position)
                .and_then(|index| index.get(term))
                .map(|bucket| bucket.iter().filter(|q| matches(*q)).cloned().collect())
                .unwrap_or_default(),
            None => self.quads.iter().cloned().collect(),
        }
    }

    fn len(&self) -> usize {
        self.quads.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
