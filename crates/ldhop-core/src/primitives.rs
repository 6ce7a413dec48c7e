//! # Primitives
//!
//! Hardcoded constants shared across the engine.
//!
//! These are compiled into the binary and are immutable at runtime.

/// Prefix marking a variable in the textual form of a hop query.
///
/// `?person` is a variable, anything else in a match position is a constant IRI.
pub const VARIABLE_PREFIX: char = '?';

/// Separator between an IRI's document part and its fragment.
///
/// Bindings that differ only after this character share one document fetch.
pub const FRAGMENT_SEPARATOR: char = '#';

/// Separator used in the textual binding key `variable|kind|lexical`.
pub const BINDING_KEY_SEPARATOR: char = '|';
