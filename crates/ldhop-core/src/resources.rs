//! # Resource Tracker
//!
//! Per-document records: whether the document has been supplied, and which
//! bindings point into it.
//!
//! A record is created lazily the first time a needed IRI binding refers to
//! the document, and dropped once the last such binding goes away.

use crate::bindings::BindingId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPH RECORD
// =============================================================================

/// Fetch status of a tracked document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphStatus {
    /// Needed, not supplied yet.
    Missing,
    /// Supplied.
    Added,
    /// The fetch failed. Counts as supplied and is never retried.
    Failed,
}

impl GraphStatus {
    /// Check if the document no longer needs fetching.
    #[must_use]
    pub fn is_added(self) -> bool {
        !matches!(self, Self::Missing)
    }
}

/// Why a document is wanted and whether it has been supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRecord {
    pub uri: String,
    pub status: GraphStatus,
    /// Bindings whose term lives in this document.
    pub sources: BTreeSet<BindingId>,
    /// The document this one was redirected to, if any.
    pub redirects_to: Option<String>,
}

impl GraphRecord {
    fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            status: GraphStatus::Missing,
            sources: BTreeSet::new(),
            redirects_to: None,
        }
    }
}

/// Outcome of removing a source binding from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRemoval {
    /// No record for that document, or the binding was not one of its sources.
    NotTracked,
    /// Other sources remain.
    StillSupported,
    /// That was the last source; the document should be dropped.
    Unsupported,
}

// =============================================================================
// RESOURCE TRACKER
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct ResourceTracker {
    graphs: BTreeMap<String, GraphRecord>,
}

impl ResourceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document as needed. Returns `true` if the record is new.
    pub fn ensure_tracked(&mut self, uri: &str) -> bool {
        if self.graphs.contains_key(uri) {
            return false;
        }
        self.graphs.insert(uri.to_string(), GraphRecord::new(uri));
        true
    }

    /// Record a binding as a reason to want `uri`.
    pub fn record_source(&mut self, uri: &str, binding: BindingId) {
        if let Some(record) = self.graphs.get_mut(uri) {
            record.sources.insert(binding);
        }
    }

    /// Forget a binding as a reason to want `uri`.
    pub fn remove_source(&mut self, uri: &str, binding: BindingId) -> SourceRemoval {
        let Some(record) = self.graphs.get_mut(uri) else {
            return SourceRemoval::NotTracked;
        };
        if !record.sources.remove(&binding) {
            return SourceRemoval::NotTracked;
        }
        if record.sources.is_empty() {
            SourceRemoval::Unsupported
        } else {
            SourceRemoval::StillSupported
        }
    }

    /// Set the status of a document, creating its record if needed.
    pub fn mark(&mut self, uri: &str, status: GraphStatus) {
        self.graphs
            .entry(uri.to_string())
            .or_insert_with(|| GraphRecord::new(uri))
            .status = status;
    }

    /// Record that fetching `requested` yielded the document `actual`.
    pub fn link_redirect(&mut self, requested: &str, actual: &str) {
        if requested == actual {
            return;
        }
        self.mark(requested, GraphStatus::Added);
        if let Some(record) = self.graphs.get_mut(requested) {
            record.redirects_to = Some(actual.to_string());
        }
    }

    /// Delete the record of `uri`.
    ///
    /// Returns the dropped uris: `uri` itself, plus its redirect target when
    /// that target has no sources of its own and nothing else redirects to it.
    pub fn drop_graph(&mut self, uri: &str) -> Vec<String> {
        let Some(record) = self.graphs.remove(uri) else {
            return Vec::new();
        };
        let mut dropped = vec![record.uri];

        if let Some(target) = record.redirects_to {
            let orphaned = self
                .graphs
                .get(&target)
                .is_some_and(|t| t.sources.is_empty())
                && !self
                    .graphs
                    .values()
                    .any(|other| other.redirects_to.as_deref() == Some(target.as_str()));
            if orphaned {
                self.graphs.remove(&target);
                dropped.push(target);
            }
        }

        dropped
    }

    /// Documents that are needed and not supplied yet.
    #[must_use]
    pub fn missing(&self) -> BTreeSet<String> {
        self.graphs(Some(false))
    }

    /// Tracked documents, optionally filtered by whether they are supplied.
    #[must_use]
    pub fn graphs(&self, added: Option<bool>) -> BTreeSet<String> {
        self.graphs
            .values()
            .filter(|record| added.is_none_or(|added| record.status.is_added() == added))
            .map(|record| record.uri.clone())
            .collect()
    }

    #[must_use]
    pub fn status(&self, uri: &str) -> Option<GraphStatus> {
        self.graphs.get(uri).map(|record| record.status)
    }

    #[must_use]
    pub fn get(&self, uri: &str) -> Option<&GraphRecord> {
        self.graphs.get(uri)
    }

    #[must_use]
    pub fn is_tracked(&self, uri: &str) -> bool {
        self.graphs.contains_key(uri)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = "https://person.example/profile/card";

    #[test]
    fn new_records_are_missing() {
        let mut tracker = ResourceTracker::new();
        assert!(tracker.ensure_tracked(CARD));
        assert!(!tracker.ensure_tracked(CARD));

        assert_eq!(tracker.status(CARD), Some(GraphStatus::Missing));
        assert_eq!(tracker.missing(), BTreeSet::from([CARD.to_string()]));
        assert!(tracker.graphs(Some(true)).is_empty());
    }

    #[test]
    fn failed_counts_as_added() {
        let mut tracker = ResourceTracker::new();
        tracker.ensure_tracked(CARD);
        tracker.mark(CARD, GraphStatus::Failed);

        assert!(tracker.missing().is_empty());
        assert_eq!(tracker.graphs(Some(true)).len(), 1);
        assert_eq!(tracker.graphs(None).len(), 1);
    }

    #[test]
    fn last_source_removal_reports_unsupported() {
        let mut tracker = ResourceTracker::new();
        tracker.ensure_tracked(CARD);
        tracker.record_source(CARD, BindingId(1));
        tracker.record_source(CARD, BindingId(2));

        assert_eq!(
            tracker.remove_source(CARD, BindingId(1)),
            SourceRemoval::StillSupported
        );
        assert_eq!(
            tracker.remove_source(CARD, BindingId(1)),
            SourceRemoval::NotTracked
        );
        assert_eq!(
            tracker.remove_source(CARD, BindingId(2)),
            SourceRemoval::Unsupported
        );
        assert_eq!(
            tracker.remove_source("https://other.example/", BindingId(2)),
            SourceRemoval::NotTracked
        );
    }

    #[test]
    fn redirect_target_dropped_with_requested() {
        let mut tracker = ResourceTracker::new();
        tracker.ensure_tracked("https://id.example/");
        tracker.record_source("https://id.example/", BindingId(0));
        tracker.mark("https://data.example/card", GraphStatus::Added);
        tracker.link_redirect("https://id.example/", "https://data.example/card");

        assert!(tracker.missing().is_empty());
        assert_eq!(
            tracker
                .get("https://id.example/")
                .and_then(|r| r.redirects_to.as_deref()),
            Some("https://data.example/card")
        );

        let dropped = tracker.drop_graph("https://id.example/");
        assert_eq!(
            dropped,
            vec![
                "https://id.example/".to_string(),
                "https://data.example/card".to_string()
            ]
        );
        assert!(tracker.graphs(None).is_empty());
    }

    #[test]
    fn redirect_target_with_own_sources_survives() {
        let mut tracker = ResourceTracker::new();
        tracker.ensure_tracked("https://data.example/card");
        tracker.record_source("https://data.example/card", BindingId(3));
        tracker.link_redirect("https://id.example/", "https://data.example/card");

        assert_eq!(tracker.drop_graph("https://id.example/").len(), 1);
        assert!(tracker.is_tracked("https://data.example/card"));
    }
}
