//! In-memory RDF graph storage
//!
//! A store holds a set of triples, indexed by subject, predicate and object,
//! and answers triple patterns for the evaluator through the `Graph` trait.

pub mod dataset;

use fnv::FnvHashSet;
use indexmap::IndexMap;

use crate::core::{Graph, TripleIter};
use crate::term::{Term, Triple};

pub use dataset::{MemoryDataset, DEFAULT_GRAPH_ID};

/// An indexed set of RDF triples
#[derive(Clone, Default)]
pub struct Store {
    /// The triples in insertion order
    triples: Vec<Triple>,
    /// Membership set for duplicate suppression
    members: FnvHashSet<Triple>,
    /// Index by subject
    by_subject: IndexMap<Term, Vec<usize>>,
    /// Index by predicate
    by_predicate: IndexMap<Term, Vec<usize>>,
    /// Index by object
    by_object: IndexMap<Term, Vec<usize>>,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple to the store; duplicates are ignored
    pub fn add(&mut self, triple: Triple) {
        if !self.members.insert(triple.clone()) {
            return;
        }
        let idx = self.triples.len();
        self.by_subject.entry(triple.subject.clone()).or_default().push(idx);
        self.by_predicate.entry(triple.predicate.clone()).or_default().push(idx);
        self.by_object.entry(triple.object.clone()).or_default().push(idx);
        self.triples.push(triple);
    }

    /// Add multiple triples
    pub fn add_all(&mut self, triples: impl IntoIterator<Item = Triple>) {
        for triple in triples {
            self.add(triple);
        }
    }

    /// Check if the store contains a triple
    pub fn contains(&self, triple: &Triple) -> bool {
        self.members.contains(triple)
    }

    /// Get the number of triples
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Iterate over all triples in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Remove a triple, returning whether it was present
    pub fn remove(&mut self, triple: &Triple) -> bool {
        if !self.members.remove(triple) {
            return false;
        }
        let remaining: Vec<Triple> = self.triples.drain(..).filter(|t| t != triple).collect();
        self.by_subject.clear();
        self.by_predicate.clear();
        self.by_object.clear();
        self.members.clear();
        self.add_all(remaining);
        true
    }

    /// Clear all triples
    pub fn clear(&mut self) {
        self.triples.clear();
        self.members.clear();
        self.by_subject.clear();
        self.by_predicate.clear();
        self.by_object.clear();
    }

    /// Candidate positions for a pattern: the shortest index list among the
    /// bound positions, or `None` when every position is a wildcard
    fn candidates(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Option<&[usize]> {
        const EMPTY: &[usize] = &[];
        let lookups = [
            subject.map(|s| self.by_subject.get(s)),
            predicate.map(|p| self.by_predicate.get(p)),
            object.map(|o| self.by_object.get(o)),
        ];
        lookups
            .into_iter()
            .flatten()
            .map(|hit| hit.map(|v| v.as_slice()).unwrap_or(EMPTY))
            .min_by_key(|slice| slice.len())
    }
}

fn position_matches(pattern: Option<&Term>, term: &Term) -> bool {
    pattern.map(|p| p == term).unwrap_or(true)
}

impl Graph for Store {
    fn triples<'g>(
        &'g self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> TripleIter<'g> {
        let candidates = self.candidates(subject, predicate, object);
        let subject = subject.cloned();
        let predicate = predicate.cloned();
        let object = object.cloned();
        let keep = move |t: &&Triple| {
            position_matches(subject.as_ref(), &t.subject)
                && position_matches(predicate.as_ref(), &t.predicate)
                && position_matches(object.as_ref(), &t.object)
        };

        match candidates {
            Some(indices) => Box::new(
                indices
                    .iter()
                    .map(move |&i| &self.triples[i])
                    .filter(keep)
                    .cloned(),
            ),
            None => Box::new(self.triples.iter().filter(keep).cloned()),
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Store {{")?;
        for triple in &self.triples {
            writeln!(f, "  {:?}", triple)?;
        }
        write!(f, "}}")
    }
}
