//! In-memory RDF Dataset
//!
//! A dataset consists of one default graph and zero or more named graphs,
//! each identified by an IRI. Dataset clauses (`FROM` / `FROM NAMED`) are
//! served from source documents registered up front with
//! [`MemoryDataset::register_source`].
//!
//! # Example
//!
//! ```ignore
//! use cwm_algebra::store::MemoryDataset;
//! use cwm_algebra::term::{Term, Triple};
//!
//! let mut dataset = MemoryDataset::new();
//! dataset.add(triple1);
//! dataset.add_to_graph(triple2, &Term::uri("http://example.org/graph1"));
//! ```

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::core::{Dataset, Graph};
use crate::cwm_error;
use crate::error::{CwmResult, ErrorCode};
use crate::term::{Term, Triple};
use super::Store;

/// Identifier reported for the default graph
pub const DEFAULT_GRAPH_ID: &str = "urn:x-cwm:default-graph";

/// An in-memory dataset: default graph, named graphs and loadable sources
#[derive(Clone, Default)]
pub struct MemoryDataset {
    /// The default (unnamed) graph
    default_graph: Store,
    /// Named graphs in creation order
    named_graphs: IndexMap<Term, Store>,
    /// Documents available to dataset clauses, keyed by source IRI
    sources: IndexMap<Term, Vec<Triple>>,
}

impl MemoryDataset {
    /// Create a new empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dataset with the given default graph
    pub fn with_default(default_graph: Store) -> Self {
        MemoryDataset {
            default_graph,
            ..Self::default()
        }
    }

    /// Get a reference to the default graph
    pub fn default_graph(&self) -> &Store {
        &self.default_graph
    }

    /// Get a mutable reference to the default graph
    pub fn default_graph_mut(&mut self) -> &mut Store {
        &mut self.default_graph
    }

    /// Get a reference to a named graph, if it exists
    pub fn named_graph(&self, name: &Term) -> Option<&Store> {
        self.named_graphs.get(name)
    }

    /// Get a mutable reference to a named graph, creating it if it doesn't exist
    pub fn named_graph_mut(&mut self, name: &Term) -> &mut Store {
        self.named_graphs.entry(name.clone()).or_default()
    }

    /// Get all named graph identifiers
    pub fn graph_names(&self) -> Vec<Term> {
        self.named_graphs.keys().cloned().collect()
    }

    /// Add a triple to the default graph
    pub fn add(&mut self, triple: Triple) {
        self.default_graph.add(triple);
    }

    /// Add a triple to a named graph
    pub fn add_to_graph(&mut self, triple: Triple, graph: &Term) {
        self.named_graph_mut(graph).add(triple);
    }

    /// Make a document available to `load`
    pub fn register_source(&mut self, source: Term, triples: impl IntoIterator<Item = Triple>) {
        self.sources.entry(source).or_default().extend(triples);
    }

    /// Get total triple count across all graphs
    pub fn total_triple_count(&self) -> usize {
        self.default_graph.len() + self.named_graphs.values().map(Store::len).sum::<usize>()
    }
}

impl Dataset for MemoryDataset {
    fn default_context_id(&self) -> Term {
        Term::uri(DEFAULT_GRAPH_ID)
    }

    fn default_context(&self) -> &dyn Graph {
        &self.default_graph
    }

    fn get_context(&self, id: &Term) -> Option<&dyn Graph> {
        if id == &self.default_context_id() {
            return Some(&self.default_graph);
        }
        self.named_graphs.get(id).map(|store| store as &dyn Graph)
    }

    fn contexts<'d>(&'d self) -> Box<dyn Iterator<Item = (Term, &'d dyn Graph)> + 'd> {
        let default = std::iter::once((self.default_context_id(), &self.default_graph as &dyn Graph));
        let named = self
            .named_graphs
            .iter()
            .map(|(id, store)| (id.clone(), store as &dyn Graph));
        Box::new(default.chain(named))
    }

    fn load(&mut self, source: &Term, default: bool) -> CwmResult<()> {
        let triples = self.sources.get(source).cloned().ok_or_else(|| {
            cwm_error!(ErrorCode::SourceNotFound, "no source registered for {}", source)
                .with_context("source", source.to_string())
        })?;

        debug!(%source, default, triples = triples.len(), "loading dataset source");
        if default {
            self.default_graph.add_all(triples);
        } else {
            self.named_graph_mut(source).add_all(triples);
        }
        Ok(())
    }
}

impl fmt::Debug for MemoryDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MemoryDataset {{")?;
        writeln!(f, "  default: {} triples", self.default_graph.len())?;
        for (name, store) in &self.named_graphs {
            writeln!(f, "  {}: {} triples", name, store.len())?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(
            Term::uri(format!("http://example.org/{}", s)),
            Term::uri(format!("http://example.org/{}", p)),
            Term::uri(format!("http://example.org/{}", o)),
        )
    }

    fn g(name: &str) -> Term {
        Term::uri(format!("http://example.org/graphs/{}", name))
    }

    #[test]
    fn test_default_and_named_graphs() {
        let mut dataset = MemoryDataset::new();
        dataset.add(triple("a", "p", "b"));
        dataset.add_to_graph(triple("c", "p", "d"), &g("one"));
        dataset.add_to_graph(triple("e", "p", "f"), &g("two"));

        assert_eq!(dataset.default_graph().len(), 1);
        assert_eq!(dataset.named_graph(&g("one")).map(Store::len), Some(1));
        assert_eq!(dataset.graph_names(), vec![g("one"), g("two")]);
        assert_eq!(dataset.total_triple_count(), 3);
    }

    #[test]
    fn test_contexts_include_default_first() {
        let mut dataset = MemoryDataset::new();
        dataset.add_to_graph(triple("c", "p", "d"), &g("one"));

        let ids: Vec<Term> = dataset.contexts().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![dataset.default_context_id(), g("one")]);
    }

    #[test]
    fn test_get_context() {
        let mut dataset = MemoryDataset::new();
        dataset.add(triple("a", "p", "b"));
        dataset.add_to_graph(triple("c", "p", "d"), &g("one"));

        let named = dataset.get_context(&g("one")).unwrap();
        assert_eq!(named.triples(None, None, None).count(), 1);
        let default = dataset.get_context(&dataset.default_context_id()).unwrap();
        assert_eq!(default.triples(None, None, None).count(), 1);
        assert!(dataset.get_context(&g("missing")).is_none());
    }

    #[test]
    fn test_load_registered_source() {
        let mut dataset = MemoryDataset::new();
        dataset.register_source(g("doc"), vec![triple("a", "p", "b"), triple("b", "p", "c")]);

        dataset.load(&g("doc"), true).unwrap();
        assert_eq!(dataset.default_graph().len(), 2);

        dataset.load(&g("doc"), false).unwrap();
        assert_eq!(dataset.named_graph(&g("doc")).map(Store::len), Some(2));
    }

    #[test]
    fn test_load_unknown_source() {
        let mut dataset = MemoryDataset::new();
        let err = dataset.load(&g("nowhere"), true).unwrap_err();
        assert_eq!(err.code, ErrorCode::SourceNotFound);
    }
}
