//! # ldhop
//!
//! Document access for the ldhop binary: a fetcher that serves linked-data
//! documents from a directory tree, and the Turtle adapter that turns them
//! into quads for `ldhop-core`.

pub mod fetch;
pub mod turtle;

pub use fetch::{DirectoryFetcher, MAX_DOCUMENT_SIZE, read_text_file};
pub use turtle::parse_turtle;
