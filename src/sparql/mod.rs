//! SPARQL algebra evaluation
//!
//! Turns an [`AlgebraNode`] tree into a lazy, pull-based stream of solutions.
//! Every operator is an iterator adaptor over its children; nothing is
//! materialized except where an operator has to see all of its input (Group,
//! OrderBy, the right side of a hash join, the right side of Minus).
//!
//! Collaborators are plugged in through the traits in [`crate::core`]:
//! the graph and dataset come with the [`EvaluationContext`], while the
//! expression evaluator, aggregate table, template instantiator and any
//! custom strategies are owned by the [`Evaluator`].
//!
//! # Example
//!
//! ```ignore
//! use cwm_algebra::sparql::{AlgebraNode, EvaluationContext, Evaluator};
//!
//! let ctx = EvaluationContext::new(&store);
//! let rows = Evaluator::new().evaluate(&node, &ctx)?;
//! for row in rows {
//!     println!("{:?}", row?);
//! }
//! ```

pub mod algebra;
pub mod context;
pub mod expression;

mod aggregate;
mod bgp;
mod combinators;
mod filter;
mod modifiers;
mod query;
mod template;

use std::iter;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug_span, trace};

use crate::core::{AggregateFunctions, CustomEvaluator, ExpressionEvaluator, TemplateInstantiator};
use crate::cwm_ensure;
use crate::error::{CwmError, CwmResult, ErrorCode};
use crate::term::Binding;

pub use aggregate::StandardAggregates;
pub use algebra::{
    AggregateFunction, AggregateSpec, AlgebraNode, DatasetClause, Expression, Function, GroupCondition,
    OrderCondition, OrderDirection, TriplePattern, ValuesRow,
};
pub use context::{BindError, CancelToken, EvaluationContext, FilterHints};
pub use expression::{effective_boolean_value, ExprError, SimpleExpressionEvaluator};
pub use query::{QueryEngine, QueryResult, QueryTarget};
pub use template::DefaultTemplate;

/// A lazy stream of solutions
///
/// Failures that only show up while pulling (a collaborator error, say) are
/// yielded as `Err` items; the stream may continue after them.
pub type Solutions<'a> = Box<dyn Iterator<Item = CwmResult<Binding>> + 'a>;

/// Evaluates algebra trees against an [`EvaluationContext`]
///
/// Cloning is cheap: collaborators and strategies are shared.
#[derive(Clone)]
pub struct Evaluator {
    expressions: Arc<dyn ExpressionEvaluator>,
    aggregates: Arc<dyn AggregateFunctions>,
    templates: Arc<dyn TemplateInstantiator>,
    strategies: Arc<IndexMap<String, Arc<dyn CustomEvaluator>>>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator {
            expressions: Arc::new(SimpleExpressionEvaluator::new()),
            aggregates: Arc::new(StandardAggregates),
            templates: Arc::new(DefaultTemplate),
            strategies: Arc::default(),
        }
    }
}

impl Evaluator {
    /// Create an evaluator with the built-in collaborators and no strategies
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expressions(mut self, expressions: impl ExpressionEvaluator + 'static) -> Self {
        self.expressions = Arc::new(expressions);
        self
    }

    pub fn with_aggregates(mut self, aggregates: impl AggregateFunctions + 'static) -> Self {
        self.aggregates = Arc::new(aggregates);
        self
    }

    pub fn with_templates(mut self, templates: impl TemplateInstantiator + 'static) -> Self {
        self.templates = Arc::new(templates);
        self
    }

    /// Register a strategy; strategies are consulted in registration order
    ///
    /// Registering under an existing name replaces that strategy in place.
    pub fn with_strategy(mut self, name: impl Into<String>, strategy: impl CustomEvaluator + 'static) -> Self {
        Arc::make_mut(&mut self.strategies).insert(name.into(), Arc::new(strategy));
        self
    }

    pub fn expressions(&self) -> &dyn ExpressionEvaluator {
        &*self.expressions
    }

    pub fn aggregates(&self) -> &dyn AggregateFunctions {
        &*self.aggregates
    }

    pub fn templates(&self) -> &dyn TemplateInstantiator {
        &*self.templates
    }

    /// Names of the registered strategies, in consultation order
    pub fn strategy_names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }

    /// Validate `node` and evaluate it
    ///
    /// Fatal problems (unsupported constructs, graph scoping without a
    /// dataset, malformed aggregation) are reported here, before any row is
    /// produced.
    pub fn evaluate<'a>(&self, node: &'a AlgebraNode, ctx: &EvaluationContext<'a>) -> CwmResult<Solutions<'a>> {
        let _span = debug_span!("evaluate", root = node.name()).entered();
        validate(node, ctx.dataset().is_some())?;
        self.evaluate_node(node, ctx)
    }

    /// Evaluate a node without the up-front validation pass
    ///
    /// This is the entry point for strategies that delegate back into the
    /// evaluator for subtrees.
    pub fn evaluate_node<'a>(&self, node: &'a AlgebraNode, ctx: &EvaluationContext<'a>) -> CwmResult<Solutions<'a>> {
        for (name, strategy) in self.strategies.iter() {
            if let Some(result) = strategy.evaluate(self, node, ctx) {
                trace!(strategy = %name, node = node.name(), "node claimed by strategy");
                return result;
            }
        }
        trace!(node = node.name(), "evaluating");

        match node {
            AlgebraNode::Bgp { patterns } => Ok(bgp::evaluate_bgp(patterns, ctx)),
            AlgebraNode::Filter { expression, child } => self.filter(expression, child, ctx),
            AlgebraNode::Join { left, right, lazy: true } => self.lazy_join(left, right, ctx),
            AlgebraNode::Join { left, right, lazy: false } => self.hash_join(left, right, ctx),
            AlgebraNode::LeftJoin { left, right, expression } => {
                self.left_join(left, right, expression.as_ref(), ctx)
            }
            AlgebraNode::Union { left, right } => self.union(left, right, ctx),
            AlgebraNode::Minus { left, right } => self.minus(left, right, ctx),
            AlgebraNode::Extend { child, variable, expression } => self.extend(child, variable, expression, ctx),
            AlgebraNode::Graph { term, child } => self.graph(term, child, ctx),
            AlgebraNode::Values { rows } => Ok(combinators::evaluate_values(rows, ctx)),
            AlgebraNode::Group { child, conditions } => self.group(child, conditions, ctx),
            AlgebraNode::AggregateJoin { group, aggregates } => self.aggregate_join(group, aggregates, ctx),
            AlgebraNode::OrderBy { child, conditions } => self.order_by(child, conditions, ctx),
            AlgebraNode::Slice { child, offset, limit } => self.slice(child, *offset, *limit, ctx),
            AlgebraNode::Distinct { child } => self.distinct(child, ctx),
            AlgebraNode::Reduced { child } => self.reduced(child, ctx),
            AlgebraNode::Project { child, variables } => self.project(child, variables, ctx),
            AlgebraNode::SelectQuery { child, variables, .. } => {
                if variables.is_empty() {
                    self.evaluate_node(child, ctx)
                } else {
                    self.project(child, variables, ctx)
                }
            }
            AlgebraNode::AskQuery { child, .. } => Ok(Box::new(self.evaluate_node(child, ctx)?.take(1))),
            AlgebraNode::ConstructQuery { child, .. } => self.evaluate_node(child, ctx),
            AlgebraNode::Service { .. } | AlgebraNode::DescribeQuery { .. } => Err(CwmError::unsupported(node.name())),
        }
    }

    /// Evaluate a subtree from inside a running stream
    ///
    /// A failure becomes the single item of the returned stream.
    pub(crate) fn evaluate_or_fail<'a>(&self, node: &'a AlgebraNode, ctx: &EvaluationContext<'a>) -> Solutions<'a> {
        match self.evaluate_node(node, ctx) {
            Ok(solutions) => solutions,
            Err(e) => Box::new(iter::once(Err(e))),
        }
    }
}

/// Check a tree for constructs that must fail before evaluation starts
pub fn validate(node: &AlgebraNode, has_dataset: bool) -> CwmResult<()> {
    match node {
        AlgebraNode::Service { endpoint, .. } => {
            return Err(CwmError::unsupported(node.name()).with_context("endpoint", endpoint.to_string()));
        }
        AlgebraNode::DescribeQuery { .. } => return Err(CwmError::unsupported(node.name())),
        AlgebraNode::Graph { term, .. } if !has_dataset => {
            return Err(CwmError::graph_scope(format!("GRAPH {} needs a dataset to evaluate against", term)));
        }
        AlgebraNode::AggregateJoin { group, .. } => {
            cwm_ensure!(
                matches!(**group, AlgebraNode::Group { .. }),
                ErrorCode::InvalidAlgebra,
                "AggregateJoin over {} instead of Group",
                group.name()
            );
        }
        _ => {}
    }

    if let Some(clause) = node.dataset_clauses().first() {
        if !has_dataset {
            return Err(CwmError::graph_scope(format!(
                "dataset clause for {} needs a dataset to load into",
                clause.source
            )));
        }
    }

    node.children().into_iter().try_for_each(|child| validate(child, has_dataset))
}
