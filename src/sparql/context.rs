//! Evaluation contexts
//!
//! A context carries the bindings made so far, the graph that BGPs match
//! against, the dataset behind GRAPH clauses, the filter-hint registry and
//! the cancellation token. Every fork is a cheap copy that shares structure
//! with its parent; nothing is mutated in place except the hint registry,
//! which is deliberately shared by the whole evaluation.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::config::EvaluationConfig;
use crate::core::{Dataset, Graph, IncrementalRequest};
use crate::term::{Binding, Term, Variable};
use super::TriplePattern;

/// Serialized single-variable filters, per variable
pub type FilterHints = IndexMap<Variable, IndexSet<String>>;

/// Failure of [`EvaluationContext::bind`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("{variable} is already bound to {existing}, cannot rebind to {attempted}")]
    AlreadyBound {
        variable: Variable,
        existing: Term,
        attempted: Term,
    },
}

/// Cooperative cancellation flag shared by one evaluation
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; running iterators end at their next check
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One binding in a parent-linked chain
struct Frame {
    variable: Variable,
    term: Term,
    parent: Option<Rc<Frame>>,
}

/// Bindings visible at a `push()`, kept for `pop()`
struct Scope {
    frames: Option<Rc<Frame>>,
    parent: Option<Rc<Scope>>,
}

/// Per-evaluation context; forks are cheap, structurally shared copies
#[derive(Clone)]
pub struct EvaluationContext<'a> {
    frames: Option<Rc<Frame>>,
    scopes: Option<Rc<Scope>>,
    graph: &'a dyn Graph,
    dataset: Option<&'a dyn Dataset>,
    hints: Rc<RefCell<FilterHints>>,
    cancel: Option<CancelToken>,
    config: EvaluationConfig,
}

impl<'a> EvaluationContext<'a> {
    /// Context over a single graph, without named graphs
    pub fn new(graph: &'a dyn Graph) -> Self {
        EvaluationContext {
            frames: None,
            scopes: None,
            graph,
            dataset: None,
            hints: Rc::new(RefCell::new(FilterHints::new())),
            cancel: None,
            config: EvaluationConfig::default(),
        }
    }

    /// Context over a dataset, matching its default graph
    pub fn with_dataset(dataset: &'a dyn Dataset) -> Self {
        Self::new(dataset.default_context()).clone_with_dataset(dataset)
    }

    pub fn with_config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The graph BGPs currently match against
    pub fn graph(&self) -> &'a dyn Graph {
        self.graph
    }

    pub fn dataset(&self) -> Option<&'a dyn Dataset> {
        self.dataset
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(CancelToken::is_cancelled).unwrap_or(false)
    }

    /// Term bound to a variable anywhere in the lineage
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        let mut frame = self.frames.as_deref();
        while let Some(f) = frame {
            if &f.variable == variable {
                return Some(&f.term);
            }
            frame = f.parent.as_deref();
        }
        None
    }

    /// Resolve a pattern position: constants as-is, bound variables to their
    /// term, unbound variables to `None`
    pub fn resolve(&self, term: &Term) -> Option<Term> {
        match term {
            Term::Variable(v) => self.get(v).cloned(),
            _ => Some(term.clone()),
        }
    }

    // ========================================================================
    // Forks
    // ========================================================================

    /// Child scope sharing all current bindings
    pub fn push(&self) -> Self {
        let mut child = self.clone();
        child.scopes = Some(Rc::new(Scope {
            frames: self.frames.clone(),
            parent: self.scopes.clone(),
        }));
        child
    }

    /// The enclosing scope of the innermost `push()`, if any
    pub fn pop(&self) -> Option<Self> {
        let scope = self.scopes.as_ref()?;
        let mut parent = self.clone();
        parent.frames = scope.frames.clone();
        parent.scopes = scope.parent.clone();
        Some(parent)
    }

    /// Extend the bindings; rebinding to the same term is a no-op
    pub fn bind(&self, variable: Variable, term: Term) -> Result<Self, BindError> {
        if let Some(existing) = self.get(&variable) {
            if existing == &term {
                return Ok(self.clone());
            }
            return Err(BindError::AlreadyBound {
                existing: existing.clone(),
                variable,
                attempted: term,
            });
        }
        let mut child = self.clone();
        child.frames = Some(Rc::new(Frame {
            variable,
            term,
            parent: self.frames.clone(),
        }));
        Ok(child)
    }

    /// Freeze the current bindings
    pub fn solution(&self) -> Binding {
        let mut pairs = Vec::new();
        let mut frame = self.frames.as_deref();
        while let Some(f) = frame {
            pairs.push((f.variable.clone(), f.term.clone()));
            frame = f.parent.as_deref();
        }
        pairs.into_iter().collect()
    }

    /// New scope holding exactly `binding`'s bindings
    pub fn thaw(&self, binding: &Binding) -> Self {
        let mut ctx = self.clone();
        ctx.frames = frames_from(binding);
        ctx.push()
    }

    /// Current bindings under `outer`'s graph scope
    pub fn forget(&self, outer: &EvaluationContext<'a>) -> Self {
        let mut ctx = self.clone();
        ctx.graph = outer.graph;
        ctx.dataset = outer.dataset;
        ctx
    }

    /// Keep only the bindings of `variables`
    pub fn remember<'v>(&self, variables: impl IntoIterator<Item = &'v Variable>) -> Self {
        let kept = self.solution().project(variables);
        let mut ctx = self.clone();
        ctx.frames = frames_from(&kept);
        ctx
    }

    /// Child scope whose BGPs match against `graph`
    pub fn push_graph(&self, graph: &'a dyn Graph) -> Self {
        let mut ctx = self.push();
        ctx.graph = graph;
        ctx
    }

    /// Same bindings over `dataset`, matching its default graph
    pub fn clone_with_dataset(&self, dataset: &'a dyn Dataset) -> Self {
        let mut ctx = self.clone();
        ctx.dataset = Some(dataset);
        ctx.graph = dataset.default_context();
        ctx
    }

    // ========================================================================
    // Filter hints
    // ========================================================================

    /// Record a serialized filter for a variable
    pub fn register_hint(&self, variable: Variable, filter: String) {
        self.hints.borrow_mut().entry(variable).or_default().insert(filter);
    }

    /// Snapshot of the hints for the given variables
    pub fn hints_for<'v>(&self, variables: impl IntoIterator<Item = &'v Variable>) -> FilterHints {
        let hints = self.hints.borrow();
        variables
            .into_iter()
            .filter_map(|v| hints.get(v).map(|filters| (v.clone(), filters.clone())))
            .collect()
    }

    /// Everything the graph needs to enumerate `patterns` incrementally
    pub fn incremental_request<'r>(&self, patterns: &'r [TriplePattern]) -> IncrementalRequest<'r> {
        let variables: IndexSet<&Variable> = patterns
            .iter()
            .flat_map(|p| [&p.subject, &p.predicate, &p.object])
            .filter_map(Term::as_variable)
            .collect();
        IncrementalRequest {
            patterns,
            hints: self.hints_for(variables),
            follow_cycles: self.config.follow_cycles,
            cancel: self.cancel.clone(),
        }
    }
}

fn frames_from(binding: &Binding) -> Option<Rc<Frame>> {
    binding.iter().fold(None, |parent, (variable, term)| {
        Some(Rc::new(Frame {
            variable: variable.clone(),
            term: term.clone(),
            parent,
        }))
    })
}

impl fmt::Debug for EvaluationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("bindings", &self.solution())
            .field("has_dataset", &self.dataset.is_some())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
