//! # Engine Observer
//!
//! Optional hooks invoked synchronously at mutation points of the engine.
//!
//! Hooks are notifications only: they cannot veto or alter what the engine
//! does. Every method has a no-op default so implementors override only what
//! they care about.

use crate::{Term, Variable};

/// Receives engine notifications.
pub trait EngineObserver {
    /// A document started being needed.
    fn on_need_resource(&mut self, _uri: &str) {}

    /// A document stopped being tracked.
    fn on_drop_resource(&mut self, _uri: &str) {}

    /// A binding was added.
    fn on_variable_added(&mut self, _variable: &Variable, _term: &Term) {}

    /// A binding was removed.
    fn on_variable_removed(&mut self, _variable: &Variable, _term: &Term) {}

    /// A graph addition left no document missing.
    fn on_query_complete(&mut self) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}
