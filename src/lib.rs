//! CWM Algebra - lazy SPARQL algebra evaluation
//!
//! Evaluates a SPARQL algebra tree (as produced by a parser/translator) into
//! a pull-based stream of solutions over pluggable RDF graphs and datasets.
//!
//! # Architecture
//!
//! The evaluator only talks to its collaborators through the traits in
//! [`core`]:
//!
//! - [`core::Graph`] - triple-pattern matching, plus optional incremental enumeration
//! - [`core::Dataset`] - default and named graphs, loadable dataset sources
//! - [`core::ExpressionEvaluator`] - FILTER / BIND / ORDER BY expressions
//! - [`core::AggregateFunctions`] - COUNT, SUM and friends
//! - [`core::TemplateInstantiator`] - CONSTRUCT templates
//! - [`core::CustomEvaluator`] - strategies that may claim algebra nodes
//!
//! In-crate implementations ([`Store`], [`MemoryDataset`],
//! [`sparql::SimpleExpressionEvaluator`], [`sparql::StandardAggregates`],
//! [`sparql::DefaultTemplate`]) make the crate usable on its own.
//!
//! # Example
//!
//! ```rust,ignore
//! use cwm_algebra::{AlgebraNode, QueryEngine, QueryResult, Store, Term, Triple};
//!
//! let mut store = Store::new();
//! store.add(Triple::new(
//!     Term::uri("http://example.org/b"),
//!     Term::uri("http://www.w3.org/1999/02/22-rdf-syntax-ns#type"),
//!     Term::uri("http://example.org/Person"),
//! ));
//!
//! let query = AlgebraNode::select(
//!     AlgebraNode::bgp(vec![Triple::new(
//!         Term::variable("s"),
//!         Term::uri("http://www.w3.org/1999/02/22-rdf-syntax-ns#type"),
//!         Term::uri("http://example.org/Person"),
//!     )]),
//!     vec![],
//! );
//!
//! let mut engine = QueryEngine::over_graph(&store);
//! if let QueryResult::Select { rows, .. } = engine.execute(&query)? {
//!     for row in rows {
//!         println!("{:?}", row?);
//!     }
//! }
//! ```

pub mod core;
pub mod config;
pub mod error;
pub mod term;
pub mod store;
pub mod sparql;

// Re-export collaborator traits
pub use crate::core::{
    AggregateFunctions, AggregateInput, CustomEvaluator, Dataset, ExpressionEvaluator, Graph,
    IncrementalRequest, TemplateInstantiator,
    ns,
};

// Re-export term types
pub use term::{Term, Triple, Binding, Uri, Literal, Datatype, BlankNode, Variable};

// Re-export store types
pub use store::{Store, MemoryDataset};

// Re-export evaluator types
pub use sparql::{
    AlgebraNode, Expression, EvaluationContext, Evaluator, QueryEngine, QueryResult, Solutions,
};

// Re-export configuration types
pub use config::{CwmConfig, ConfigError, GeneralConfig, EvaluationConfig, LogLevel, init_logging};

// Re-export error types
pub use error::{CwmError, CwmResult, ErrorCode, ErrorContext};
