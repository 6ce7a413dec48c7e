//! # Turtle Adapter
//!
//! Parses a Turtle document into quads placed in the document's graph.
//!
//! Relative IRIs resolve against the document IRI. Triples whose terms have
//! no counterpart in the engine's term model (quoted triples, variables) are
//! skipped.

use ldhop_core::{LdhopError, Literal, Quad, Term};
use sophia::api::parser::TripleParser;
use sophia::api::source::TripleSource;
use sophia::api::term::{Term as SophiaTerm, TermKind};
use sophia::api::triple::Triple;
use sophia::iri::Iri;
use sophia::turtle::parser::turtle::TurtleParser;
use std::io::Cursor;

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

/// Parse `text` as the Turtle content of `document`.
pub fn parse_turtle(text: &str, document: &str) -> Result<Vec<Quad>, LdhopError> {
    let base = Iri::new(document.to_string())
        .map_err(|e| LdhopError::InvalidIri(format!("{}: {}", document, e)))?;
    let parser = TurtleParser { base: Some(base) };
    let graph = Term::iri(document);

    let mut quads = Vec::new();
    let mut source = parser.parse(Cursor::new(text.as_bytes()));
    source
        .try_for_each_triple(|t| {
            if let (Some(s), Some(p), Some(o)) = (convert(t.s()), convert(t.p()), convert(t.o())) {
                quads.push(Quad::new(s, p, o, graph.clone()));
            }
            Ok::<(), std::convert::Infallible>(())
        })
        .map_err(|e| LdhopError::Parse(format!("{}: {}", document, e)))?;

    Ok(quads)
}

fn convert<T: SophiaTerm>(term: T) -> Option<Term> {
    match term.kind() {
        TermKind::Iri => term.iri().map(|iri| Term::iri(iri.as_str())),
        TermKind::BlankNode => term.bnode_id().map(|id| Term::blank(id.as_str())),
        TermKind::Literal => {
            let lexical = term.lexical_form()?.to_string();
            let language = term.language_tag().map(|tag| tag.as_str().to_string());
            let datatype = term
                .datatype()
                .map(|iri| iri.as_str().to_string())
                .filter(|iri| iri != XSD_STRING && iri != RDF_LANG_STRING);
            Some(Term::Literal(Literal {
                lexical,
                datatype,
                language,
            }))
        }
        _ => None,
    }
}
