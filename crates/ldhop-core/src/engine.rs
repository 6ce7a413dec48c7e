//! # Traversal Engine
//!
//! Keeps the bindings of a hop query consistent with a mutable quad store.
//!
//! Adding facts forward-chains: every step that becomes satisfiable records a
//! move and binds its target. Removing facts retracts the moves anchored on
//! them, then every binding left without a well-founded producer, then the
//! documents only those bindings wanted.
//!
//! ## Invariants
//!
//! - A binding is held iff it is a starting binding or the target of a live
//!   move whose sources are all held.
//! - Starting bindings are anchored by seed moves that no removal touches.
//! - A tracked document has at least one source binding, unless it was
//!   supplied directly by the caller.

use crate::bindings::{BindingId, BindingTable};
use crate::iri::{document_uri, is_absolute};
use crate::moves::{Move, MoveIndex, StepIndex};
use crate::observer::{EngineObserver, NoopObserver};
use crate::query::{MatchStep, Query, Slot, Step};
use crate::resources::{GraphStatus, ResourceTracker, SourceRemoval};
use crate::store::{MemoryStore, QuadStore};
use crate::{Binding, LdhopError, Quad, QuadPosition, Term, Variable};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace};

/// Pending work of a retraction.
#[derive(Debug)]
enum Retraction {
    /// A quad leaving the store.
    Quad(Quad),
    /// A binding that lost a producing move.
    Target(BindingId),
    /// A binding to unbind.
    Binding(BindingId),
}

/// Starting IRIs per variable.
pub type StartingBindings = BTreeMap<Variable, BTreeSet<String>>;

/// What a graph update changed in the set of tracked documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphUpdate {
    /// Documents still needed after the update.
    pub missing: BTreeSet<String>,
    /// Documents dropped during the update.
    pub dropped: BTreeSet<String>,
}

// =============================================================================
// ENGINE
// =============================================================================

pub struct Engine<S: QuadStore = MemoryStore> {
    query: Arc<Query>,
    store: S,
    bindings: BindingTable,
    moves: MoveIndex,
    resources: ResourceTracker,
    observer: Box<dyn EngineObserver>,
    /// Documents dropped since the current public operation started.
    dropped: BTreeSet<String>,
}

impl Engine<MemoryStore> {
    /// Create an engine over an empty in-memory store.
    pub fn new(query: Query, start: &StartingBindings) -> Result<Self, LdhopError> {
        Self::with_store(query, start, MemoryStore::new(), Box::new(NoopObserver))
    }

    /// Create an engine over an empty in-memory store, reporting to `observer`.
    pub fn with_observer(
        query: Query,
        start: &StartingBindings,
        observer: Box<dyn EngineObserver>,
    ) -> Result<Self, LdhopError> {
        Self::with_store(query, start, MemoryStore::new(), observer)
    }
}

impl<S: QuadStore> Engine<S> {
    /// Create an engine over `store` and seed the starting bindings.
    ///
    /// Every starting IRI is validated before anything is mutated.
    pub fn with_store(
        query: Query,
        start: &StartingBindings,
        store: S,
        observer: Box<dyn EngineObserver>,
    ) -> Result<Self, LdhopError> {
        if let Some(bad) = start.values().flatten().find(|iri| !is_absolute(iri)) {
            return Err(LdhopError::InvalidIri(bad.clone()));
        }

        let mut engine = Self {
            query: Arc::new(query),
            store,
            bindings: BindingTable::new(),
            moves: MoveIndex::new(),
            resources: ResourceTracker::new(),
            observer,
            dropped: BTreeSet::new(),
        };

        for (variable, iris) in start {
            for iri in iris {
                let id = engine.bindings.intern(variable, &Term::iri(iri.as_str()));
                engine.moves.add(Move::seed(id));
                engine.bind(id);
            }
        }

        debug!(
            steps = engine.query.len(),
            bindings = engine.bindings.len(),
            missing = engine.resources.missing().len(),
            "engine seeded"
        );
        Ok(engine)
    }

    // =========================================================================
    // GRAPH UPDATES
    // =========================================================================

    /// Replace the content of document `uri` with `quads`.
    ///
    /// Every quad is placed in the document's graph. The difference with the
    /// stored content is applied as additions first, then removals. When
    /// `requested` names another document (a redirect), that document is
    /// marked supplied too and linked to `uri`.
    pub fn add_graph(
        &mut self,
        uri: &str,
        quads: impl IntoIterator<Item = Quad>,
        requested: Option<&str>,
    ) -> GraphUpdate {
        self.update_graph(uri, quads, requested, GraphStatus::Added)
    }

    /// Record a failed fetch of `uri`: an empty document that is never retried.
    pub fn fail_graph(&mut self, uri: &str) -> GraphUpdate {
        self.update_graph(uri, Vec::new(), None, GraphStatus::Failed)
    }

    /// Drop the record of `uri` and remove all of its quads.
    ///
    /// Bindings that survive the cascade and still point into the document
    /// make it missing again. Returns the documents dropped by the cascade.
    pub fn remove_graph(&mut self, uri: &str) -> BTreeSet<String> {
        self.dropped.clear();

        let document = document_uri(uri);
        let sources = self
            .resources
            .get(&document)
            .map(|record| record.sources.clone())
            .unwrap_or_default();
        self.purge_graph(&document);

        for id in sources {
            if !self.bindings.is_bound(id) {
                continue;
            }
            if self.resources.ensure_tracked(&document) {
                debug!(graph = %document, "resource needed again");
                self.observer.on_need_resource(&document);
            }
            self.resources.record_source(&document, id);
        }

        std::mem::take(&mut self.dropped)
    }

    fn update_graph(
        &mut self,
        uri: &str,
        quads: impl IntoIterator<Item = Quad>,
        requested: Option<&str>,
        status: GraphStatus,
    ) -> GraphUpdate {
        self.dropped.clear();

        let document = document_uri(uri);
        let graph = Term::iri(document.as_str());
        let incoming: BTreeSet<Quad> = quads
            .into_iter()
            .map(|quad| quad.in_graph(graph.clone()))
            .collect();
        let current: BTreeSet<Quad> = self
            .store
            .quads_matching(None, None, None, Some(&graph))
            .into_iter()
            .collect();

        let additions: Vec<Quad> = incoming.difference(&current).cloned().collect();
        let deletions: Vec<Quad> = current.difference(&incoming).cloned().collect();
        debug!(
            graph = %document,
            added = additions.len(),
            removed = deletions.len(),
            ?status,
            "updating graph"
        );

        for quad in additions {
            self.add_quad(quad);
        }
        for quad in &deletions {
            self.remove_quad(quad);
        }

        if !self.dropped.contains(&document) {
            self.resources.mark(&document, status);
        }
        if let Some(requested) = requested.map(document_uri) {
            if !self.dropped.contains(&requested) {
                self.resources.link_redirect(&requested, &document);
            }
        }

        let missing = self.resources.missing();
        if missing.is_empty() {
            debug!("no documents missing");
            self.observer.on_query_complete();
        }

        GraphUpdate {
            missing,
            dropped: std::mem::take(&mut self.dropped),
        }
    }

    // =========================================================================
    // FORWARD CHAINING
    // =========================================================================

    /// Insert a quad and bind whatever it satisfies with the current bindings.
    pub fn add_quad(&mut self, quad: Quad) {
        if !self.store.insert(quad.clone()) {
            return;
        }

        let query = Arc::clone(&self.query);
        for (index, step) in query.steps().iter().enumerate() {
            if let Step::Match(step) = step {
                if self.satisfies(step, &quad) {
                    let target = self.record_match(index, step, &quad);
                    self.bind(target);
                }
            }
        }
    }

    /// Bind `start` and everything that follows from it.
    fn bind(&mut self, start: BindingId) {
        let mut queue = VecDeque::from([start]);

        while let Some(id) = queue.pop_front() {
            if !self.bindings.insert(id) {
                continue;
            }
            let Some(binding) = self.bindings.resolve(id).cloned() else {
                continue;
            };
            trace!(binding = %binding, "bound");
            self.observer
                .on_variable_added(&binding.variable, &binding.term);

            self.track_resource(id, &binding);
            queue.extend(self.hop_from(id, &binding));
        }
    }

    /// Register the document of a needed IRI binding.
    fn track_resource(&mut self, id: BindingId, binding: &Binding) {
        let Some(iri) = binding.term.as_iri() else {
            return;
        };
        if !self.query.is_needed(&binding.variable) {
            return;
        }

        let document = document_uri(iri);
        if self.resources.ensure_tracked(&document) {
            debug!(graph = %document, "resource needed");
            self.observer.on_need_resource(&document);
        }
        self.resources.record_source(&document, id);
    }

    /// Evaluate every step that consumes `binding`. Returns the targets to bind.
    fn hop_from(&mut self, id: BindingId, binding: &Binding) -> Vec<BindingId> {
        let query = Arc::clone(&self.query);
        let mut targets = Vec::new();

        for (index, step) in query.steps().iter().enumerate() {
            match step {
                Step::Transform(transform) if transform.source == binding.variable => {
                    let Some(term) = transform.transform.apply(&binding.term) else {
                        continue;
                    };
                    let target = self.bindings.intern(&transform.target, &term);
                    self.moves.add(Move::new(
                        BTreeSet::from([id]),
                        BTreeSet::from([target]),
                        StepIndex::Query(index),
                        None,
                    ));
                    targets.push(target);
                }
                Step::Match(step) if step.references(&binding.variable) => {
                    for quad in self.candidate_quads(step, binding) {
                        targets.push(self.record_match(index, step, &quad));
                    }
                }
                _ => {}
            }
        }

        targets
    }

    /// Quads matching `step` where `binding` fills its own positions and the
    /// other variables range over their current values.
    fn candidate_quads(&self, step: &MatchStep, binding: &Binding) -> Vec<Quad> {
        let mut patterns: Vec<[Option<Term>; 4]> = vec![[None, None, None, None]];

        for (slot_index, position) in QuadPosition::ALL.into_iter().enumerate() {
            let candidates: Vec<Term> = match step.slot(position) {
                None => continue,
                Some(Slot::Constant(term)) => vec![term.clone()],
                Some(Slot::Variable(variable)) if *variable == binding.variable => {
                    vec![binding.term.clone()]
                }
                Some(Slot::Variable(variable)) => self
                    .bindings
                    .values_of(variable)
                    .map(|terms| terms.iter().cloned().collect())
                    .unwrap_or_default(),
            };

            patterns = patterns
                .into_iter()
                .flat_map(|pattern| {
                    candidates.iter().map(move |term| {
                        let mut pattern = pattern.clone();
                        pattern[slot_index] = Some(term.clone());
                        pattern
                    })
                })
                .collect();
        }

        patterns
            .iter()
            .flat_map(|[subject, predicate, object, graph]| {
                self.store.quads_matching(
                    subject.as_ref(),
                    predicate.as_ref(),
                    object.as_ref(),
                    graph.as_ref(),
                )
            })
            .collect()
    }

    /// Check a quad against a step's constants and current bindings.
    fn satisfies(&self, step: &MatchStep, quad: &Quad) -> bool {
        QuadPosition::ALL
            .into_iter()
            .all(|position| match step.slot(position) {
                None => true,
                Some(Slot::Constant(term)) => quad.get(position) == term,
                Some(Slot::Variable(variable)) => {
                    self.bindings.has(variable, quad.get(position))
                }
            })
    }

    /// Record the move a matching quad justifies. Returns its target.
    fn record_match(&mut self, index: usize, step: &MatchStep, quad: &Quad) -> BindingId {
        let from = step
            .variable_slots()
            .map(|(position, variable)| self.bindings.intern(variable, quad.get(position)))
            .collect();
        let target = self.bindings.intern(&step.target, quad.get(step.pick));

        self.moves.add(Move::new(
            from,
            BTreeSet::from([target]),
            StepIndex::Query(index),
            Some(quad.clone()),
        ));
        target
    }

    // =========================================================================
    // RETRACTION
    // =========================================================================

    /// Remove a quad and retract everything it alone justified.
    pub fn remove_quad(&mut self, quad: &Quad) {
        self.retract(vec![Retraction::Quad(quad.clone())]);
    }

    /// Drain a retraction worklist.
    ///
    /// Retraction only ever shrinks the state, so every item is checked
    /// against the state at the time it is taken off the queue.
    fn retract(&mut self, start: Vec<Retraction>) {
        let mut queue = VecDeque::from(start);

        while let Some(item) = queue.pop_front() {
            match item {
                Retraction::Quad(quad) => {
                    if !self.store.remove(&quad) {
                        continue;
                    }
                    for id in self.moves.by_quad(&quad) {
                        if let Some(mv) = self.moves.remove(id) {
                            queue.extend(mv.to.into_iter().map(Retraction::Target));
                        }
                    }
                }
                Retraction::Target(id) => {
                    if !self.bindings.is_bound(id) {
                        continue;
                    }
                    if self.moves.has_producers(id) {
                        queue.extend(self.orphans_of(id).into_iter().map(Retraction::Binding));
                    } else {
                        queue.push_back(Retraction::Binding(id));
                    }
                }
                Retraction::Binding(id) => queue.extend(self.unbind(id)),
            }
        }
    }

    /// Unbind `id`. Returns the work it leaves behind.
    fn unbind(&mut self, id: BindingId) -> Vec<Retraction> {
        if !self.bindings.remove(id) {
            return Vec::new();
        }
        let Some(binding) = self.bindings.resolve(id).cloned() else {
            return Vec::new();
        };
        trace!(binding = %binding, "unbound");
        self.observer
            .on_variable_removed(&binding.variable, &binding.term);

        let mut work = Vec::new();
        if let Some(iri) = binding.term.as_iri() {
            let document = document_uri(iri);
            if self.resources.remove_source(&document, id) == SourceRemoval::Unsupported {
                work.extend(self.drop_document(&document).into_iter().map(Retraction::Quad));
            }
        }

        // Consumers leave the index right away so no support check sees a
        // move whose source is gone.
        for consumer in self.moves.consumers(id) {
            if let Some(mv) = self.moves.remove(consumer) {
                work.extend(mv.to.into_iter().map(Retraction::Target));
            }
        }
        work
    }

    /// The part of `start`'s consequences that only cycles hold up.
    fn orphans_of(&self, start: BindingId) -> BTreeSet<BindingId> {
        let colored = self.moves.dependents_of(start);
        let orphans = self
            .moves
            .unsupported_within(&colored, |id| self.bindings.is_bound(id));
        if !orphans.is_empty() {
            debug!(
                colored = colored.len(),
                orphans = orphans.len(),
                "retracting orphaned bindings"
            );
        }
        orphans
    }

    /// Drop the record of `document` and return the quads to remove with it.
    fn drop_document(&mut self, document: &str) -> Vec<Quad> {
        let mut uris = self.resources.drop_graph(document);
        for uri in &uris {
            debug!(graph = %uri, "resource dropped");
            self.observer.on_drop_resource(uri);
            self.dropped.insert(uri.clone());
        }
        if !uris.iter().any(|uri| uri == document) {
            uris.push(document.to_string());
        }

        uris.into_iter()
            .flat_map(|uri| {
                self.store
                    .quads_matching(None, None, None, Some(&Term::iri(uri)))
            })
            .collect()
    }

    fn purge_graph(&mut self, document: &str) {
        let quads = self.drop_document(document);
        self.retract(quads.into_iter().map(Retraction::Quad).collect());
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Current values of a variable.
    #[must_use]
    pub fn get_variable(&self, variable: &Variable) -> BTreeSet<Term> {
        self.bindings
            .values_of(variable)
            .cloned()
            .unwrap_or_default()
    }

    /// Current values of every bound variable.
    #[must_use]
    pub fn get_all_variables(&self) -> &BTreeMap<Variable, BTreeSet<Term>> {
        self.bindings.all()
    }

    /// Documents that are needed and not supplied yet.
    #[must_use]
    pub fn get_missing_resources(&self) -> BTreeSet<String> {
        self.resources.missing()
    }

    /// Tracked documents, optionally filtered by whether they are supplied.
    #[must_use]
    pub fn get_graphs(&self, added: Option<bool>) -> BTreeSet<String> {
        self.resources.graphs(added)
    }

    /// Status of the document holding `uri`, if tracked.
    #[must_use]
    pub fn graph_status(&self, uri: &str) -> Option<GraphStatus> {
        self.resources.status(&document_uri(uri))
    }

    #[must_use]
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// One line per move: `?a:x, ?b:y ==> ?c:z`.
    #[must_use]
    pub fn describe_moves(&self) -> Vec<String> {
        let side = |ids: &BTreeSet<BindingId>| {
            ids.iter()
                .filter_map(|id| self.bindings.resolve(*id))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };

        self.moves
            .iter()
            .map(|(_, mv)| format!("{} ==> {}", side(&mv.from), side(&mv.to)))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
