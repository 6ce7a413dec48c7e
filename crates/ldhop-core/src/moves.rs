//! # Move Index
//!
//! Derivation edges ("moves") between bindings, indexed both ways.
//!
//! A move records that a set of source bindings produced a set of target
//! bindings through one query step, optionally because of one quad. The index
//! answers three questions in a single lookup each:
//! - which moves consume a binding (`consumers`)
//! - which moves produce a binding (`producers`)
//! - which moves exist because of a quad (`by_quad`)
//!
//! It also owns the two graph walks retraction needs: the forward closure of
//! a binding's consequences and the well-founded support check over it.

use crate::bindings::BindingId;
use crate::Quad;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

// =============================================================================
// MOVE
// =============================================================================

/// The query step a move was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepIndex {
    /// Synthetic anchor of a starting binding.
    Seed,
    /// Index into the query's step list.
    Query(usize),
}

impl fmt::Display for StepIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seed => write!(f, "seed"),
            Self::Query(index) => write!(f, "#{}", index),
        }
    }
}

/// Unique identifier of a move in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MoveId(pub u64);

/// A derivation edge from source bindings to target bindings.
///
/// Equality covers all four fields, so two derivations of the same targets
/// from different quads are distinct moves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Move {
    pub from: BTreeSet<BindingId>,
    pub to: BTreeSet<BindingId>,
    pub step: StepIndex,
    pub quad: Option<Quad>,
}

impl Move {
    #[must_use]
    pub fn new(
        from: BTreeSet<BindingId>,
        to: BTreeSet<BindingId>,
        step: StepIndex,
        quad: Option<Quad>,
    ) -> Self {
        Self {
            from,
            to,
            step,
            quad,
        }
    }

    /// The anchor move of a starting binding.
    #[must_use]
    pub fn seed(binding: BindingId) -> Self {
        Self::new(BTreeSet::new(), BTreeSet::from([binding]), StepIndex::Seed, None)
    }

    #[must_use]
    pub fn is_seed(&self) -> bool {
        self.step == StepIndex::Seed
    }
}

// =============================================================================
// MOVE INDEX
// =============================================================================

/// All live moves plus the reverse indexes.
#[derive(Debug, Clone, Default)]
pub struct MoveIndex {
    next_id: u64,

    /// Live moves: id -> move.
    moves: BTreeMap<MoveId, Move>,

    /// Dedup lookup: move -> id.
    signatures: BTreeMap<Move, MoveId>,

    /// Moves consuming a binding.
    by_source: BTreeMap<BindingId, BTreeSet<MoveId>>,

    /// Moves producing a binding.
    by_target: BTreeMap<BindingId, BTreeSet<MoveId>>,

    /// Moves anchored on a quad.
    by_quad: BTreeMap<Quad, BTreeSet<MoveId>>,
}

fn index_insert<K: Ord>(index: &mut BTreeMap<K, BTreeSet<MoveId>>, key: K, id: MoveId) {
    index.entry(key).or_default().insert(id);
}

fn index_remove<K: Ord>(index: &mut BTreeMap<K, BTreeSet<MoveId>>, key: &K, id: MoveId) {
    let now_empty = index.get_mut(key).is_some_and(|ids| {
        ids.remove(&id);
        ids.is_empty()
    });
    if now_empty {
        index.remove(key);
    }
}

impl MoveIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a move into the main set and all three indexes.
    ///
    /// Returns `None` if an identical move is already present.
    pub fn add(&mut self, mv: Move) -> Option<MoveId> {
        if self.signatures.contains_key(&mv) {
            return None;
        }

        let id = MoveId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        for source in &mv.from {
            index_insert(&mut self.by_source, *source, id);
        }
        for target in &mv.to {
            index_insert(&mut self.by_target, *target, id);
        }
        if let Some(quad) = &mv.quad {
            index_insert(&mut self.by_quad, quad.clone(), id);
        }

        self.signatures.insert(mv.clone(), id);
        self.moves.insert(id, mv);
        Some(id)
    }

    /// Delete a move from every structure. Returns the removed move.
    pub fn remove(&mut self, id: MoveId) -> Option<Move> {
        let mv = self.moves.remove(&id)?;

        for source in &mv.from {
            index_remove(&mut self.by_source, source, id);
        }
        for target in &mv.to {
            index_remove(&mut self.by_target, target, id);
        }
        if let Some(quad) = &mv.quad {
            index_remove(&mut self.by_quad, quad, id);
        }
        self.signatures.remove(&mv);

        Some(mv)
    }

    #[must_use]
    pub fn get(&self, id: MoveId) -> Option<&Move> {
        self.moves.get(&id)
    }

    #[must_use]
    pub fn contains(&self, mv: &Move) -> bool {
        self.signatures.contains_key(mv)
    }

    /// Moves whose `from` includes `binding`.
    #[must_use]
    pub fn consumers(&self, binding: BindingId) -> Vec<MoveId> {
        collect_ids(self.by_source.get(&binding))
    }

    /// Moves whose `to` includes `binding`.
    #[must_use]
    pub fn producers(&self, binding: BindingId) -> Vec<MoveId> {
        collect_ids(self.by_target.get(&binding))
    }

    /// Check if any live move produces `binding`.
    #[must_use]
    pub fn has_producers(&self, binding: BindingId) -> bool {
        self.by_target.contains_key(&binding)
    }

    /// Moves anchored on `quad`.
    #[must_use]
    pub fn by_quad(&self, quad: &Quad) -> Vec<MoveId> {
        collect_ids(self.by_quad.get(quad))
    }

    /// All live moves in id order.
    pub fn iter(&self) -> impl Iterator<Item = (MoveId, &Move)> {
        self.moves.iter().map(|(id, mv)| (*id, mv))
    }

    /// Get the number of live moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    // =========================================================================
    // RETRACTION WALKS
    // =========================================================================

    /// Forward closure of `start` over the consumer index.
    ///
    /// The result contains `start` and every binding that some chain of live
    /// moves derives from it.
    #[must_use]
    pub fn dependents_of(&self, start: BindingId) -> BTreeSet<BindingId> {
        let mut colored = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(binding) = queue.pop_front() {
            for id in self.consumers(binding) {
                let Some(mv) = self.moves.get(&id) else {
                    continue;
                };
                for target in &mv.to {
                    if colored.insert(*target) {
                        queue.push_back(*target);
                    }
                }
            }
        }

        colored
    }

    /// Members of `colored` with no well-founded support.
    ///
    /// A colored binding is supported if some producing move has every source
    /// either outside `colored` and currently bound, or colored and already
    /// known to be supported. Iterates to the least fixpoint; whatever stays
    /// unsupported is held up only by cycles among the colored bindings.
    #[must_use]
    pub fn unsupported_within(
        &self,
        colored: &BTreeSet<BindingId>,
        is_bound: impl Fn(BindingId) -> bool,
    ) -> BTreeSet<BindingId> {
        let mut supported: BTreeSet<BindingId> = BTreeSet::new();

        loop {
            let newly: Vec<BindingId> = colored
                .iter()
                .copied()
                .filter(|binding| !supported.contains(binding))
                .filter(|binding| {
                    self.producers(*binding).iter().any(|id| {
                        self.moves.get(id).is_some_and(|mv| {
                            mv.from.iter().all(|source| {
                                if colored.contains(source) {
                                    supported.contains(source)
                                } else {
                                    is_bound(*source)
                                }
                            })
                        })
                    })
                })
                .collect();

            if newly.is_empty() {
                break;
            }
            supported.extend(newly);
        }

        colored.difference(&supported).copied().collect()
    }
}

fn collect_ids(ids: Option<&BTreeSet<MoveId>>) -> Vec<MoveId> {
    ids.map(|ids| ids.iter().copied().collect())
        .unwrap_or_default()
}

// =============================================================================
// TESTS
// =============================================================================
