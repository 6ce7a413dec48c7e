//! Shared fixtures for the integration tests.
//!
//! Documents are built in code as `uri -> quads` maps and served by
//! `MapFetcher`.

#![allow(dead_code)]

use ldhop_core::{
    Engine, EngineObserver, FetchResult, Fetcher, MatchStep, Quad, QuadPosition, Query,
    StartingBindings, Step, Term, TraversalReport, Variable, traverse,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

// =============================================================================
// VOCABULARY
// =============================================================================

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const FOAF_KNOWS: &str = "http://xmlns.com/foaf/0.1/knows";
pub const FOAF_NAME: &str = "http://xmlns.com/foaf/0.1/name";
pub const SIOC_COMMUNITY: &str = "http://rdfs.org/sioc/ns#Community";
pub const SIOC_HAS_USERGROUP: &str = "http://rdfs.org/sioc/ns#has_usergroup";
pub const SIOC_MEMBER_OF: &str = "http://rdfs.org/sioc/ns#member_of";
pub const VCARD_HAS_MEMBER: &str = "http://www.w3.org/2006/vcard/ns#hasMember";
pub const SOLID_PUBLIC_TYPE_INDEX: &str = "http://www.w3.org/ns/solid/terms#publicTypeIndex";
pub const SOLID_FOR_CLASS: &str = "http://www.w3.org/ns/solid/terms#forClass";
pub const SOLID_INSTANCE: &str = "http://www.w3.org/ns/solid/terms#instance";
pub const DCT_REFERENCES: &str = "http://purl.org/dc/terms/references";
pub const HOSPEX_DOCUMENT: &str = "http://w3id.org/hospex/ns#PersonalHospexDocument";
pub const HOSPEX_OFFERS: &str = "http://w3id.org/hospex/ns#offers";
pub const HOSPEX_ACCOMMODATION: &str = "http://w3id.org/hospex/ns#Accommodation";

// =============================================================================
// HELPERS
// =============================================================================

pub fn var(name: &str) -> Variable {
    Variable::new(name)
}

pub fn iri(value: &str) -> Term {
    Term::iri(value)
}

pub fn start(variable: &str, iris: &[&str]) -> StartingBindings {
    BTreeMap::from([(
        var(variable),
        iris.iter().map(|iri| iri.to_string()).collect(),
    )])
}

/// A triple with an IRI object, placed in `document`.
pub fn link(document: &str, s: &str, p: &str, o: &str) -> Quad {
    Quad::new(iri(s), iri(p), iri(o), iri(document))
}

/// A triple with a literal object, placed in `document`.
pub fn attribute(document: &str, s: &str, p: &str, value: &str) -> Quad {
    Quad::new(iri(s), iri(p), Term::literal(value), iri(document))
}

pub fn iris(terms: &BTreeSet<Term>) -> BTreeSet<String> {
    terms.iter().map(|term| term.to_string()).collect()
}

pub fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

// =============================================================================
// FETCHER
// =============================================================================

/// Serves documents from a map. Unknown documents fail.
#[derive(Debug, Clone, Default)]
pub struct MapFetcher {
    pub documents: BTreeMap<String, Vec<Quad>>,
    pub redirects: BTreeMap<String, String>,
    pub log: Vec<String>,
}

impl MapFetcher {
    pub fn new(documents: BTreeMap<String, Vec<Quad>>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    pub fn document(&self, uri: &str) -> Vec<Quad> {
        self.documents.get(uri).cloned().unwrap_or_default()
    }
}

impl Fetcher for MapFetcher {
    fn fetch(&mut self, uri: &str) -> FetchResult {
        self.log.push(uri.to_string());
        let served = self.redirects.get(uri).cloned();
        let actual = served.as_deref().unwrap_or(uri);

        match (self.documents.get(actual), served) {
            (Some(quads), Some(final_uri)) => FetchResult::redirected(final_uri, quads.clone()),
            (Some(quads), None) => FetchResult::ok(quads.clone()),
            (None, _) => FetchResult::failed(),
        }
    }
}

/// Run a traversal to completion.
pub fn run(engine: &mut Engine, fetcher: &mut MapFetcher) -> TraversalReport {
    traverse(engine, fetcher, Some(1000))
}

// =============================================================================
// OBSERVER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Need(String),
    Drop(String),
    Added(String, String),
    Removed(String, String),
    Complete,
}

/// Records every notification. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<Event>>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| matches(e)).count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl EngineObserver for Recorder {
    fn on_need_resource(&mut self, uri: &str) {
        self.push(Event::Need(uri.to_string()));
    }

    fn on_drop_resource(&mut self, uri: &str) {
        self.push(Event::Drop(uri.to_string()));
    }

    fn on_variable_added(&mut self, variable: &Variable, term: &Term) {
        self.push(Event::Added(variable.to_string(), term.to_string()));
    }

    fn on_variable_removed(&mut self, variable: &Variable, term: &Term) {
        self.push(Event::Removed(variable.to_string(), term.to_string()));
    }

    fn on_query_complete(&mut self) {
        self.push(Event::Complete);
    }
}

// =============================================================================
// COMMUNITY FIXTURE
// =============================================================================

pub const COMMUNITY: &str = "https://community.example/community#us";
pub const COMMUNITY_DOC: &str = "https://community.example/community";
pub const GROUP: &str = "https://community.example/group#members";
pub const GROUP_DOC: &str = "https://community.example/group";
pub const PERSON: &str = "https://person.example/profile/card#me";
pub const PERSON_DOC: &str = "https://person.example/profile/card";
pub const PERSON2: &str = "https://person2.example/profile/card#me";
pub const PERSON2_DOC: &str = "https://person2.example/profile/card";
pub const TYPE_INDEX: &str = "https://person.example/settings/publicTypeIndex";
pub const HOSPEX_DOC: &str = "https://person.example/hospex/community-example/card";
pub const OFFER1: &str = "https://person.example/hospex/community-example/accommodation1#accommodation";
pub const OFFER1_DOC: &str = "https://person.example/hospex/community-example/accommodation1";
pub const OFFER2: &str = "https://person.example/hospex/community-example/accommodation2#accommodation";
pub const OFFER2_DOC: &str = "https://person.example/hospex/community-example/accommodation2";

/// Community -> members -> their hospex documents for this community -> offers.
pub fn community_query() -> Query {
    Query::new(vec![
        MatchStep::new(QuadPosition::Object, var("group"))
            .subject(var("community"))
            .predicate(iri(SIOC_HAS_USERGROUP))
            .into(),
        MatchStep::new(QuadPosition::Object, var("person"))
            .subject(var("group"))
            .predicate(iri(VCARD_HAS_MEMBER))
            .into(),
        MatchStep::new(QuadPosition::Object, var("publicTypeIndex"))
            .subject(var("person"))
            .predicate(iri(SOLID_PUBLIC_TYPE_INDEX))
            .into(),
        MatchStep::new(QuadPosition::Object, var("typeRegistration"))
            .subject(var("publicTypeIndex"))
            .predicate(iri(DCT_REFERENCES))
            .into(),
        MatchStep::new(QuadPosition::Subject, var("typeRegistrationForHospex"))
            .subject(var("typeRegistration"))
            .predicate(iri(SOLID_FOR_CLASS))
            .object(iri(HOSPEX_DOCUMENT))
            .into(),
        MatchStep::new(QuadPosition::Object, var("hospexDocument"))
            .subject(var("typeRegistrationForHospex"))
            .predicate(iri(SOLID_INSTANCE))
            .into(),
        Step::add_resources(var("hospexDocument")),
        MatchStep::new(QuadPosition::Graph, var("hospexDocumentForCommunity"))
            .subject(var("person"))
            .predicate(iri(SIOC_MEMBER_OF))
            .object(var("community"))
            .into(),
        MatchStep::new(QuadPosition::Object, var("offer"))
            .subject(var("person"))
            .predicate(iri(HOSPEX_OFFERS))
            .graph(var("hospexDocumentForCommunity"))
            .into(),
        Step::add_resources(var("offer")),
    ])
}

/// Only the community -> group -> person part.
pub fn membership_query(fetch_persons: bool) -> Query {
    let mut steps: Vec<Step> = vec![
        MatchStep::new(QuadPosition::Object, var("group"))
            .subject(var("community"))
            .predicate(iri(SIOC_HAS_USERGROUP))
            .into(),
        MatchStep::new(QuadPosition::Object, var("person"))
            .subject(var("group"))
            .predicate(iri(VCARD_HAS_MEMBER))
            .into(),
    ];
    if fetch_persons {
        steps.push(Step::add_resources(var("person")));
    }
    Query::new(steps)
}

pub fn hospex_card(with_membership: bool, offers: &[&str]) -> Vec<Quad> {
    let mut quads = Vec::new();
    if with_membership {
        quads.push(link(HOSPEX_DOC, PERSON, SIOC_MEMBER_OF, COMMUNITY));
    }
    for offer in offers {
        quads.push(link(HOSPEX_DOC, PERSON, HOSPEX_OFFERS, offer));
    }
    quads
}

pub fn community_documents() -> BTreeMap<String, Vec<Quad>> {
    let type_registration = format!("{}#hospex", TYPE_INDEX);

    BTreeMap::from([
        (
            COMMUNITY_DOC.to_string(),
            vec![
                link(COMMUNITY_DOC, COMMUNITY, SIOC_HAS_USERGROUP, GROUP),
                link(COMMUNITY_DOC, COMMUNITY, RDF_TYPE, SIOC_COMMUNITY),
            ],
        ),
        (
            GROUP_DOC.to_string(),
            vec![
                link(GROUP_DOC, GROUP, VCARD_HAS_MEMBER, PERSON),
                link(GROUP_DOC, GROUP, VCARD_HAS_MEMBER, PERSON2),
            ],
        ),
        (
            PERSON_DOC.to_string(),
            vec![
                link(PERSON_DOC, PERSON, SOLID_PUBLIC_TYPE_INDEX, TYPE_INDEX),
                attribute(PERSON_DOC, PERSON, FOAF_NAME, "Person One"),
            ],
        ),
        (
            PERSON2_DOC.to_string(),
            vec![attribute(PERSON2_DOC, PERSON2, FOAF_NAME, "Person Two")],
        ),
        (
            TYPE_INDEX.to_string(),
            vec![
                link(TYPE_INDEX, TYPE_INDEX, DCT_REFERENCES, &type_registration),
                link(TYPE_INDEX, &type_registration, SOLID_FOR_CLASS, HOSPEX_DOCUMENT),
                link(TYPE_INDEX, &type_registration, SOLID_INSTANCE, HOSPEX_DOC),
            ],
        ),
        (HOSPEX_DOC.to_string(), hospex_card(true, &[OFFER1, OFFER2])),
        (
            OFFER1_DOC.to_string(),
            vec![link(OFFER1_DOC, OFFER1, RDF_TYPE, HOSPEX_ACCOMMODATION)],
        ),
        (
            OFFER2_DOC.to_string(),
            vec![link(OFFER2_DOC, OFFER2, RDF_TYPE, HOSPEX_ACCOMMODATION)],
        ),
    ])
}

// =============================================================================
// FRIEND-OF-A-FRIEND FIXTURE
// =============================================================================

pub const ME: &str = "https://me.example/profile/card#me";

pub fn person(name: &str) -> String {
    format!("https://{}.example/profile/card#me", name)
}

pub fn person_doc(name: &str) -> String {
    format!("https://{}.example/profile/card", name)
}

/// `?person foaf:knows ?person`, following the object.
pub fn knows_query() -> Query {
    Query::new(vec![
        MatchStep::new(QuadPosition::Object, var("person"))
            .subject(var("person"))
            .predicate(iri(FOAF_KNOWS))
            .into(),
    ])
}

/// Document of `name` with a `knows` link to each of `friends`.
pub fn knows_document(name: &str, friends: &[&str]) -> Vec<Quad> {
    let doc = person_doc(name);
    let me = person(name);
    let mut quads: Vec<Quad> = friends
        .iter()
        .map(|friend| link(&doc, &me, FOAF_KNOWS, &person(friend)))
        .collect();
    quads.push(attribute(&doc, &me, FOAF_NAME, name));
    quads
}

/// me -> a, b; a -> c; b -> d; c -> e; d -> a. d also mentions a blank node.
pub fn foaf_documents() -> BTreeMap<String, Vec<Quad>> {
    let mut d = knows_document("d", &["a"]);
    d.push(Quad::new(
        Term::blank("anon"),
        iri(FOAF_KNOWS),
        iri(&person("a")),
        iri(&person_doc("d")),
    ));

    BTreeMap::from([
        (person_doc("me"), knows_document("me", &["a", "b"])),
        (person_doc("a"), knows_document("a", &["c"])),
        (person_doc("b"), knows_document("b", &["d"])),
        (person_doc("c"), knows_document("c", &["e"])),
        (person_doc("d"), d),
        (person_doc("e"), knows_document("e", &[])),
    ])
}
