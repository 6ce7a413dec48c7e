//! # ldhop-core
//!
//! The incremental binding-maintenance engine for ldhop - THE LOGIC.
//!
//! A hop query describes how to walk from a few starting IRIs to everything
//! reachable through linked-data documents. This crate keeps the bindings of
//! such a query consistent while documents are added, replaced and removed:
//! - every new fact is forward-chained into moves and bindings
//! - every removed fact retracts exactly what it alone supported,
//!   including self-sustaining cycles
//! - the documents that still need fetching are always known
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Has NO async, NO network dependencies (pure Rust)
//! - Never fetches or parses; documents arrive as quads through the API
//! - Uses `BTreeMap`/`BTreeSet` only, so iteration order is stable
//! - Runs every public mutation to completion before returning

// =============================================================================
// MODULES
// =============================================================================

pub mod bindings;
pub mod config;
pub mod driver;
pub mod engine;
pub mod iri;
pub mod moves;
pub mod observer;
pub mod primitives;
pub mod query;
pub mod resources;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{LdhopError, Literal, Quad, QuadPosition, Term, Variable};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use bindings::{Binding, BindingId, BindingTable};
pub use engine::{Engine, GraphUpdate, StartingBindings};
pub use moves::{Move, MoveId, MoveIndex, StepIndex};
pub use observer::{EngineObserver, NoopObserver};
pub use query::{MatchStep, Query, Slot, Step, TransformFn, TransformStep};
pub use resources::{GraphRecord, GraphStatus, ResourceTracker, SourceRemoval};
pub use store::{MemoryStore, QuadStore};

// =============================================================================
// RE-EXPORTS: Driver and Configuration
// =============================================================================

pub use config::{BuiltinTransform, QueryConfig, StepConfig, TraversalConfig};
pub use driver::{FetchResult, Fetcher, TraversalReport, traverse};
