//! # Traversal Driver
//!
//! Serial loop feeding fetched documents into an engine until nothing is
//! missing.
//!
//! Fetching is external: the driver only asks a `Fetcher` for one document
//! at a time and hands the result to the engine. A failed fetch is recorded
//! as such and never retried.

use crate::engine::Engine;
use crate::store::QuadStore;
use crate::Quad;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Result of fetching one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    pub quads: Vec<Quad>,
    pub ok: bool,
    /// The document actually served, when it differs from the requested one.
    pub final_uri: Option<String>,
}

impl FetchResult {
    /// A successful fetch of the requested document.
    #[must_use]
    pub fn ok(quads: Vec<Quad>) -> Self {
        Self {
            quads,
            ok: true,
            final_uri: None,
        }
    }

    /// A successful fetch that was served from another document.
    #[must_use]
    pub fn redirected(final_uri: impl Into<String>, quads: Vec<Quad>) -> Self {
        Self {
            quads,
            ok: true,
            final_uri: Some(final_uri.into()),
        }
    }

    #[must_use]
    pub fn failed() -> Self {
        Self::default()
    }
}

/// Source of documents for the driver.
pub trait Fetcher {
    /// Fetch one document. Failures are reported through `FetchResult::ok`.
    fn fetch(&mut self, uri: &str) -> FetchResult;
}

/// Summary of a traversal run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraversalReport {
    /// Documents fetched successfully.
    pub fetched: usize,
    /// Documents whose fetch failed.
    pub failed: usize,
    /// Whether the run ended with nothing missing.
    pub complete: bool,
}

/// Fetch missing documents one at a time until none is missing or `limit`
/// fetches have been made.
pub fn traverse<S: QuadStore, F: Fetcher + ?Sized>(
    engine: &mut Engine<S>,
    fetcher: &mut F,
    limit: Option<usize>,
) -> TraversalReport {
    let mut report = TraversalReport::default();

    loop {
        let Some(uri) = engine.get_missing_resources().into_iter().next() else {
            report.complete = true;
            break;
        };
        if limit.is_some_and(|limit| report.fetched + report.failed >= limit) {
            warn!(limit = ?limit, "fetch limit reached");
            break;
        }

        let result = fetcher.fetch(&uri);
        if result.ok {
            report.fetched += 1;
            let actual = result.final_uri.as_deref().unwrap_or(&uri);
            let update = engine.add_graph(actual, result.quads, Some(&uri));
            debug!(
                graph = %uri,
                missing = update.missing.len(),
                dropped = update.dropped.len(),
                "document added"
            );
        } else {
            report.failed += 1;
            warn!(graph = %uri, "fetch failed");
            engine.fail_graph(&uri);
        }
    }

    info!(
        fetched = report.fetched,
        failed = report.failed,
        complete = report.complete,
        "traversal finished"
    );
    report
}
