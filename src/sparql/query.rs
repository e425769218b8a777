//! Query forms and the query engine
//!
//! [`Evaluator::evaluate_query`] turns a SELECT, ASK or CONSTRUCT node into
//! a [`QueryResult`]. [`QueryEngine`] adds the outer steps a caller usually
//! wants: loading FROM / FROM NAMED sources into the dataset, applying the
//! evaluation config and cancellation token, and seeding initial bindings.
//!
//! # Example
//!
//! ```ignore
//! use cwm_algebra::sparql::{AlgebraNode, QueryEngine, QueryResult};
//!
//! let mut engine = QueryEngine::over_graph(&store);
//! if let QueryResult::Select { variables, rows } = engine.execute(&query)? {
//!     for row in rows {
//!         println!("{:?}", row?);
//!     }
//! }
//! ```

use std::fmt;

use tracing::{debug, debug_span};

use crate::config::EvaluationConfig;
use crate::core::{Dataset, Graph};
use crate::cwm_bail;
use crate::error::{CwmResult, ErrorCode};
use crate::store::Store;
use crate::term::{Binding, Variable};
use super::{validate, AlgebraNode, CancelToken, EvaluationContext, Evaluator, Solutions, TriplePattern};

/// The result of one query form
pub enum QueryResult<'a> {
    /// Projected variables and the lazy row stream
    Select { variables: Vec<Variable>, rows: Solutions<'a> },
    Ask(bool),
    /// The instantiated template triples of every solution
    Construct(Store),
}

impl QueryResult<'_> {
    /// Drain a SELECT result; `None` for the other forms
    pub fn into_rows(self) -> Option<CwmResult<Vec<Binding>>> {
        match self {
            QueryResult::Select { rows, .. } => Some(rows.collect()),
            _ => None,
        }
    }
}

impl fmt::Debug for QueryResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Select { variables, .. } => {
                f.debug_struct("Select").field("variables", variables).finish_non_exhaustive()
            }
            QueryResult::Ask(answer) => f.debug_tuple("Ask").field(answer).finish(),
            QueryResult::Construct(store) => f.debug_tuple("Construct").field(&store.len()).finish(),
        }
    }
}

impl Evaluator {
    /// Validate and run a query-form node
    pub fn evaluate_query<'a>(&self, query: &'a AlgebraNode, ctx: &EvaluationContext<'a>) -> CwmResult<QueryResult<'a>> {
        validate(query, ctx.dataset().is_some())?;

        match query {
            AlgebraNode::SelectQuery { child, variables, .. } => {
                let variables = if variables.is_empty() {
                    child.variables().into_iter().collect()
                } else {
                    variables.clone()
                };
                let rows = self.evaluate_node(query, ctx)?;
                Ok(QueryResult::Select { variables, rows })
            }
            AlgebraNode::AskQuery { child, .. } => match self.evaluate_node(child, ctx)?.next() {
                Some(Ok(_)) => Ok(QueryResult::Ask(true)),
                Some(Err(e)) => Err(e),
                None => Ok(QueryResult::Ask(false)),
            },
            AlgebraNode::ConstructQuery { child, template, .. } => {
                let derived;
                let template: &[TriplePattern] = match template {
                    Some(template) => template,
                    None => {
                        derived = child.patterns();
                        &derived
                    }
                };
                let mut store = Store::new();
                for row in self.evaluate_node(child, ctx)? {
                    store.add_all(self.templates().fill_template(template, &row?));
                }
                debug!(triples = store.len(), "construct finished");
                Ok(QueryResult::Construct(store))
            }
            other => cwm_bail!(ErrorCode::InvalidAlgebra, "{} is not a query form", other.name()),
        }
    }
}

/// What a [`QueryEngine`] evaluates against
pub enum QueryTarget<'s> {
    /// A single graph; GRAPH and dataset clauses are rejected
    Graph(&'s dyn Graph),
    /// A dataset that dataset clauses may load into
    Dataset(&'s mut dyn Dataset),
}

/// Runs query forms against a graph or dataset
pub struct QueryEngine<'s> {
    target: QueryTarget<'s>,
    evaluator: Evaluator,
    config: EvaluationConfig,
    cancel: Option<CancelToken>,
}

impl<'s> QueryEngine<'s> {
    pub fn over_graph(graph: &'s dyn Graph) -> Self {
        Self::new(QueryTarget::Graph(graph))
    }

    pub fn over_dataset(dataset: &'s mut dyn Dataset) -> Self {
        Self::new(QueryTarget::Dataset(dataset))
    }

    fn new(target: QueryTarget<'s>) -> Self {
        QueryEngine {
            target,
            evaluator: Evaluator::new(),
            config: EvaluationConfig::default(),
            cancel: None,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Run a query form with no initial bindings
    pub fn execute<'q>(&'q mut self, query: &'q AlgebraNode) -> CwmResult<QueryResult<'q>> {
        self.execute_with(query, Binding::new())
    }

    /// Run a query form with `initial` bound in the root context
    pub fn execute_with<'q>(&'q mut self, query: &'q AlgebraNode, initial: Binding) -> CwmResult<QueryResult<'q>> {
        let _span = debug_span!("query", form = query.name()).entered();
        validate(query, matches!(self.target, QueryTarget::Dataset(_)))?;

        let root = match &mut self.target {
            QueryTarget::Graph(graph) => EvaluationContext::new(*graph),
            QueryTarget::Dataset(dataset) => {
                for clause in query.dataset_clauses() {
                    dataset.load(&clause.source, !clause.named)?;
                }
                EvaluationContext::with_dataset(&**dataset)
            }
        };

        let mut root = root.with_config(self.config);
        if let Some(cancel) = &self.cancel {
            root = root.with_cancel_token(cancel.clone());
        }
        let ctx = root.thaw(&initial);
        debug!(initial = initial.len(), "query context ready");

        self.evaluator.evaluate_query(query, &ctx)
    }
}
