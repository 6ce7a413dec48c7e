//! # Property-Based Tests
//!
//! Invariants of the engine over random `knows` graphs.
//!
//! Person `i` lives at `https://p{i}.example/profile/card#me` and its document
//! holds its outgoing `knows` links. Traversal starts from person 0, so the
//! expected outcome is plain graph reachability.

mod common;

use common::*;
use ldhop_core::{Engine, Quad, Term};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

type Edges = BTreeSet<(usize, usize)>;

fn name(i: usize) -> String {
    format!("p{}", i)
}

fn documents(n: usize, edges: &Edges) -> BTreeMap<String, Vec<Quad>> {
    (0..n)
        .map(|i| {
            let doc = person_doc(&name(i));
            let quads = edges
                .iter()
                .filter(|(from, _)| *from == i)
                .map(|(_, to)| link(&doc, &person(&name(i)), FOAF_KNOWS, &person(&name(*to))))
                .collect();
            (doc, quads)
        })
        .collect()
}

fn reachable(edges: &Edges) -> BTreeSet<usize> {
    let mut seen = BTreeSet::from([0]);
    let mut queue = VecDeque::from([0]);
    while let Some(i) = queue.pop_front() {
        for (_, to) in edges.iter().filter(|(from, _)| *from == i) {
            if seen.insert(*to) {
                queue.push_back(*to);
            }
        }
    }
    seen
}

fn expected_persons(edges: &Edges) -> BTreeSet<Term> {
    reachable(edges)
        .into_iter()
        .map(|i| Term::iri(person(&name(i))))
        .collect()
}

fn expected_moves(edges: &Edges) -> usize {
    let reach = reachable(edges);
    1 + edges.iter().filter(|(from, _)| reach.contains(from)).count()
}

fn engine() -> Engine {
    Engine::new(knows_query(), &start("person", &[&person(&name(0))])).expect("engine")
}

fn graph_strategy() -> impl Strategy<Value = (usize, Edges, Edges)> {
    (2usize..7).prop_flat_map(|n| {
        (
            Just(n),
            vec((0..n, 0..n), 0..16).prop_map(|e| e.into_iter().collect::<Edges>()),
            vec((0..n, 0..n), 0..16).prop_map(|e| e.into_iter().collect::<Edges>()),
        )
    })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A finished traversal binds exactly the persons reachable from the start.
    #[test]
    fn traversal_matches_reachability((n, edges, _) in graph_strategy()) {
        let mut engine = engine();
        let mut fetcher = MapFetcher::new(documents(n, &edges));

        let report = run(&mut engine, &mut fetcher);

        prop_assert!(report.complete);
        prop_assert_eq!(engine.get_variable(&var("person")), expected_persons(&edges));
        prop_assert_eq!(engine.move_count(), expected_moves(&edges));
        prop_assert!(engine.get_missing_resources().is_empty());
    }

    /// Supplying every document again changes nothing.
    #[test]
    fn re_adding_documents_is_idempotent((n, edges, _) in graph_strategy()) {
        let mut engine = engine();
        let mut fetcher = MapFetcher::new(documents(n, &edges));
        run(&mut engine, &mut fetcher);
        let variables = engine.get_all_variables().clone();
        let moves = engine.move_count();

        for uri in engine.get_graphs(Some(true)) {
            let update = engine.add_graph(&uri, fetcher.document(&uri), None);
            prop_assert!(update.dropped.is_empty());
        }

        prop_assert_eq!(engine.get_all_variables(), &variables);
        prop_assert_eq!(engine.move_count(), moves);
    }

    /// Replacing documents leaves exactly what the new versions justify.
    #[test]
    fn replacement_conserves_justified_bindings((n, first, second) in graph_strategy()) {
        let mut engine = engine();
        let mut fetcher = MapFetcher::new(documents(n, &first));
        run(&mut engine, &mut fetcher);

        fetcher.documents = documents(n, &second);
        for uri in engine.get_graphs(None) {
            if engine.graph_status(&uri).is_some() {
                engine.add_graph(&uri, fetcher.document(&uri), None);
            }
        }
        run(&mut engine, &mut fetcher);

        prop_assert_eq!(engine.get_variable(&var("person")), expected_persons(&second));
        prop_assert_eq!(engine.move_count(), expected_moves(&second));
    }

    /// Emptying every document keeps the starting binding and its seed move.
    #[test]
    fn starting_binding_survives_everything((n, edges, _) in graph_strategy()) {
        let mut engine = engine();
        let mut fetcher = MapFetcher::new(documents(n, &edges));
        run(&mut engine, &mut fetcher);

        for uri in engine.get_graphs(None) {
            if engine.graph_status(&uri).is_some() {
                engine.add_graph(&uri, Vec::new(), None);
            }
        }

        prop_assert_eq!(
            engine.get_variable(&var("person")),
            BTreeSet::from([Term::iri(person(&name(0)))])
        );
        prop_assert_eq!(engine.move_count(), 1);
        prop_assert_eq!(engine.get_graphs(None), set(&[&person_doc(&name(0))]));
    }

    /// The order in which documents arrive does not change the outcome.
    #[test]
    fn fetch_order_does_not_matter((n, edges, _) in graph_strategy()) {
        let docs = documents(n, &edges);

        let mut forward = engine();
        run(&mut forward, &mut MapFetcher::new(docs.clone()));

        let mut backward = engine();
        while let Some(uri) = backward.get_missing_resources().into_iter().next_back() {
            let quads = docs.get(&uri).cloned().unwrap_or_default();
            backward.add_graph(&uri, quads, None);
        }

        prop_assert_eq!(forward.get_all_variables(), backward.get_all_variables());
        prop_assert_eq!(forward.move_count(), backward.move_count());
        prop_assert_eq!(forward.get_graphs(None), backward.get_graphs(None));
    }
}
