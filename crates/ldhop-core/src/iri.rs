//! # IRI Helpers
//!
//! Document and container IRIs derived from term IRIs.
//!
//! Parsing goes through the `url` crate so that equivalent spellings
//! (`https://id.example` and `https://id.example/`) map to one document.
//!
//! ## Normalized Graph Names
//!
//! The engine stores every quad of a document under `document_uri` of the
//! document IRI, so graph names are always in URL-normalized form: an empty
//! path becomes `/` and non-ASCII path characters are percent-encoded.
//! Constant graph slots are normalized the same way when a step is built.
//! A term bound elsewhere in its raw spelling is compared as-is, so it only
//! matches a graph position when it is already normalized.

use crate::primitives::FRAGMENT_SEPARATOR;
use url::Url;

/// The IRI of the document that holds `iri`: the fragment is stripped.
///
/// IRIs the URL parser rejects (e.g. relative references) fall back to
/// plain fragment stripping.
#[must_use]
pub fn document_uri(iri: &str) -> String {
    match Url::parse(iri) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => iri
            .split_once(FRAGMENT_SEPARATOR)
            .map(|(document, _)| document.to_string())
            .unwrap_or_else(|| iri.to_string()),
    }
}

/// The container holding the document of `iri`.
///
/// Fragment and query are dropped, then the last path segment. A container
/// IRI (trailing slash) is its own container, and the root stays the root.
#[must_use]
pub fn container_uri(iri: &str) -> Option<String> {
    let mut url = Url::parse(iri).ok()?;
    url.set_fragment(None);
    url.set_query(None);

    let path = url.path().to_string();
    if let Some(last_slash) = path.rfind('/') {
        url.set_path(&path[..=last_slash]);
    }

    Some(url.to_string())
}

/// Check that `iri` is an absolute IRI.
#[must_use]
pub fn is_absolute(iri: &str) -> bool {
    Url::parse(iri).is_ok()
}
