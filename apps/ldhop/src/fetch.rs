//! # Directory Fetcher
//!
//! Serves linked-data documents from a local mirror laid out by host and path:
//!
//! ```text
//! https://person.example/profile/card  ->  <root>/person.example/profile/card.ttl
//! https://pod.example/chats/           ->  <root>/pod.example/chats/index.ttl
//! https://localhost:3000/alice         ->  <root>/localhost_3000/alice.ttl
//! ```
//!
//! Any failure to locate, read, or parse a document is a failed fetch. The
//! engine settles failed documents so traversal keeps going.

use crate::turtle::parse_turtle;
use ldhop_core::{FetchResult, Fetcher, LdhopError};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Maximum document size (10 MB).
pub const MAX_DOCUMENT_SIZE: u64 = 10 * 1024 * 1024;

const DOCUMENT_EXTENSION: &str = "ttl";
const CONTAINER_INDEX: &str = "index";

/// Read a UTF-8 file no larger than `max_size` bytes.
pub fn read_text_file(path: &Path, max_size: u64) -> Result<String, LdhopError> {
    let metadata = fs::metadata(path)
        .map_err(|e| LdhopError::Io(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > max_size {
        return Err(LdhopError::Io(format!(
            "File too large: {} bytes (max: {} bytes)",
            metadata.len(),
            max_size
        )));
    }
    fs::read_to_string(path).map_err(|e| LdhopError::Io(format!("{}: {}", path.display(), e)))
}

/// Fetches documents from a directory tree.
#[derive(Debug)]
pub struct DirectoryFetcher {
    root: PathBuf,
}

impl DirectoryFetcher {
    /// Create a fetcher rooted at an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, LdhopError> {
        let root = root
            .as_ref()
            .canonicalize()
            .map_err(|e| LdhopError::Io(format!("Invalid document root: {}", e)))?;
        if !root.is_dir() {
            return Err(LdhopError::Io(format!(
                "Document root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the document at `uri` lives in the mirror.
    ///
    /// Returns `None` for IRIs without a host or whose path would leave the
    /// root.
    pub fn path_for(&self, uri: &str) -> Option<PathBuf> {
        let url = Url::parse(uri).ok()?;
        let host = url.host_str()?;
        let mut path = self.root.join(match url.port() {
            Some(port) => format!("{}_{}", host, port),
            None => host.to_string(),
        });

        let segments: Vec<&str> = url.path_segments()?.collect();
        let (last, dirs) = segments.split_last()?;
        for segment in dirs {
            if !is_plain_segment(segment) {
                return None;
            }
            path.push(segment);
        }

        let file = if last.is_empty() { CONTAINER_INDEX } else { last };
        if !is_plain_segment(file) {
            return None;
        }
        path.push(format!("{}.{}", file, DOCUMENT_EXTENSION));
        Some(path)
    }

    fn load(&self, uri: &str) -> Result<String, LdhopError> {
        let path = self
            .path_for(uri)
            .ok_or_else(|| LdhopError::InvalidIri(format!("No local path for {}", uri)))?;

        // symlinks must not lead out of the mirror
        let resolved = path
            .canonicalize()
            .map_err(|e| LdhopError::Io(format!("{}: {}", path.display(), e)))?;
        if !resolved.starts_with(&self.root) {
            return Err(LdhopError::Io(format!(
                "{} resolves outside the document root",
                path.display()
            )));
        }

        read_text_file(&resolved, MAX_DOCUMENT_SIZE)
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
}

impl Fetcher for DirectoryFetcher {
    fn fetch(&mut self, uri: &str) -> FetchResult {
        let quads = self.load(uri).and_then(|text| parse_turtle(&text, uri));
        match quads {
            Ok(quads) => {
                tracing::debug!(uri, quads = quads.len(), "loaded document");
                FetchResult::ok(quads)
            }
            Err(e) => {
                tracing::warn!(uri, error = %e, "fetch failed");
                FetchResult::failed()
            }
        }
    }
}
