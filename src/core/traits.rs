//! Collaborator trait abstractions for cwm-algebra
//!
//! The evaluator never touches storage, expressions or templates directly.
//! It drives them through these traits:
//! - `Graph`: triple-pattern matching plus the optional incremental pass
//! - `Dataset`: default and named graphs, and dataset-clause loading
//! - `ExpressionEvaluator`: FILTER / EXTEND / ORDER BY / GROUP BY expressions
//! - `AggregateFunctions`: reducing one group's values to a term
//! - `TemplateInstantiator`: CONSTRUCT template filling
//! - `CustomEvaluator`: pluggable per-node evaluation strategies
//!
//! In-crate defaults exist for every trait (`Store`, `MemoryDataset`,
//! `SimpleExpressionEvaluator`, `StandardAggregates`, `DefaultTemplate`).

use crate::error::CwmResult;
use crate::sparql::{
    AggregateFunction, AlgebraNode, CancelToken, EvaluationContext, Evaluator, ExprError,
    Expression, FilterHints, Solutions, TriplePattern, effective_boolean_value,
};
use crate::term::{Binding, Term, Triple};

// ============================================================================
// Graphs
// ============================================================================

/// Lazy sequence of matching triples
pub type TripleIter<'g> = Box<dyn Iterator<Item = Triple> + 'g>;

/// Lazy sequence of partial bindings produced by an incremental pass
pub type IncrementalIter<'g> = Box<dyn Iterator<Item = CwmResult<Binding>> + 'g>;

/// Everything a graph needs to run its exploratory pass over one BGP
#[derive(Clone, Debug)]
pub struct IncrementalRequest<'r> {
    /// The BGP's triple patterns, already in evaluation order
    pub patterns: &'r [TriplePattern],
    /// Filter hints for the variables the BGP mentions
    pub hints: FilterHints,
    /// Whether the traversal may follow cycles
    pub follow_cycles: bool,
    /// Cooperative cancellation token shared with the evaluation
    pub cancel: Option<CancelToken>,
}

impl IncrementalRequest<'_> {
    /// Check whether the owning evaluation was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|c| c.is_cancelled()).unwrap_or(false)
    }
}

/// A read-only graph that answers triple patterns
///
/// `None` in any position is a wildcard. Implementations must not be mutated
/// while an evaluation borrows them.
pub trait Graph {
    /// All triples matching the given positions
    fn triples<'g>(
        &'g self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> TripleIter<'g>;

    /// Exploratory enumeration of a whole BGP
    ///
    /// Returns `None` when the graph has no such strategy. Solutions produced
    /// here are deduplicated against the naive pass, so partial or repeated
    /// output is harmless.
    fn incremental_enumerate<'g>(&'g self, _request: &IncrementalRequest<'_>) -> Option<IncrementalIter<'g>> {
        None
    }

    /// Fragment-collection hook run instead of the incremental pass when it
    /// is switched off
    fn prefetch(&self, _request: &IncrementalRequest<'_>) {}
}

// ============================================================================
// Datasets
// ============================================================================

/// A collection of graphs: one default graph plus named graphs
pub trait Dataset {
    /// Identifier of the default graph
    fn default_context_id(&self) -> Term;

    /// The default graph
    fn default_context(&self) -> &dyn Graph;

    /// Look up a graph by identifier
    fn get_context(&self, id: &Term) -> Option<&dyn Graph>;

    /// Every graph in the dataset, the default one included
    fn contexts<'d>(&'d self) -> Box<dyn Iterator<Item = (Term, &'d dyn Graph)> + 'd>;

    /// Load a source into the default graph or as a named graph
    fn load(&mut self, source: &Term, default: bool) -> CwmResult<()>;
}

// ============================================================================
// Expressions
// ============================================================================

/// Evaluates scalar and boolean expressions against a context's bindings
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate to a term
    fn eval(&self, expr: &Expression, ctx: &EvaluationContext<'_>) -> Result<Term, ExprError>;

    /// Evaluate to an effective boolean value
    fn eval_boolean(&self, expr: &Expression, ctx: &EvaluationContext<'_>) -> Result<bool, ExprError> {
        let term = self.eval(expr, ctx)?;
        effective_boolean_value(&term)
    }
}

// ============================================================================
// Aggregates
// ============================================================================

/// The rows of one group, reduced to what an aggregate function consumes
#[derive(Clone, Debug, Default)]
pub struct AggregateInput {
    /// Values of the aggregate's argument, one per row where it evaluated
    pub values: Vec<Term>,
    /// Number of rows in the group (distinct rows under `COUNT(DISTINCT *)`)
    pub rows: usize,
    /// Whether the aggregate was written with `*`
    pub star: bool,
}

/// Table of aggregate functions
pub trait AggregateFunctions: Send + Sync {
    /// Reduce one group; an error leaves the target variable unbound
    fn apply(&self, function: &AggregateFunction, input: &AggregateInput) -> Result<Term, ExprError>;
}

// ============================================================================
// Templates
// ============================================================================

/// Instantiates CONSTRUCT templates
pub trait TemplateInstantiator: Send + Sync {
    /// Fill the template for one solution
    fn fill_template(&self, template: &[TriplePattern], binding: &Binding) -> Vec<Triple>;
}

// ============================================================================
// Evaluation strategies
// ============================================================================

/// A pluggable evaluation strategy consulted before built-in dispatch
///
/// Returning `None` declines the node.
pub trait CustomEvaluator: Send + Sync {
    fn evaluate<'a>(
        &self,
        evaluator: &Evaluator,
        node: &'a AlgebraNode,
        ctx: &EvaluationContext<'a>,
    ) -> Option<CwmResult<Solutions<'a>>>;
}
