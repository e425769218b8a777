//! Basic graph pattern matching
//!
//! Two passes share one seen-set. The optional incremental pass asks the
//! graph for an exploratory enumeration and records every solution it
//! yields. The naive pass then unifies the patterns left to right against
//! `Graph::triples` and drops anything the first pass already produced.

use std::cell::RefCell;
use std::iter;
use std::rc::Rc;

use fnv::FnvHashSet;
use tracing::{debug, trace, warn};

use crate::core::IncrementalIter;
use crate::term::{substitute_triple, Binding, Term, Triple};
use super::{BindError, EvaluationContext, Solutions, TriplePattern};

type SeenSet = Rc<RefCell<FnvHashSet<Binding>>>;

/// Evaluate a BGP in `ctx`
pub fn evaluate_bgp<'a>(patterns: &'a [TriplePattern], ctx: &EvaluationContext<'a>) -> Solutions<'a> {
    if patterns.is_empty() {
        return Box::new(iter::once(Ok(ctx.solution())));
    }

    let seen: SeenSet = Rc::default();
    let request = ctx.incremental_request(patterns);
    let incremental: Solutions<'a> = if ctx.config().incremental {
        match ctx.graph().incremental_enumerate(&request) {
            Some(inner) => {
                debug!(patterns = patterns.len(), "incremental BGP pass started");
                Box::new(IncrementalPass {
                    inner: Some(inner),
                    patterns,
                    ctx: ctx.clone(),
                    base: ctx.solution(),
                    seen: seen.clone(),
                })
            }
            None => Box::new(iter::empty()),
        }
    } else {
        ctx.graph().prefetch(&request);
        Box::new(iter::empty())
    };

    let naive_ctx = ctx.clone();
    let naive = iter::once(()).flat_map(move |_| match_patterns(patterns, naive_ctx.clone()));
    let cancel_ctx = ctx.clone();

    Box::new(
        incremental
            .chain(naive.filter(move |solution| match solution {
                Ok(binding) => !seen.borrow().contains(binding),
                Err(_) => true,
            }))
            .take_while(move |_| !cancel_ctx.is_cancelled()),
    )
}

/// Naive left-to-right unification
fn match_patterns<'a>(patterns: &'a [TriplePattern], ctx: EvaluationContext<'a>) -> Solutions<'a> {
    let Some((first, rest)) = patterns.split_first() else {
        return Box::new(iter::once(Ok(ctx.solution())));
    };
    if ctx.is_cancelled() {
        return Box::new(iter::empty());
    }

    let s = ctx.resolve(&first.subject);
    let p = ctx.resolve(&first.predicate);
    let o = ctx.resolve(&first.object);
    let matches = ctx.graph().triples(s.as_ref(), p.as_ref(), o.as_ref());
    let guard = ctx.clone();

    Box::new(
        matches
            .take_while(move |_| !guard.is_cancelled())
            .filter_map(move |triple| match bind_triple(&ctx, first, &triple) {
                Ok(next) => Some(next),
                Err(BindError::AlreadyBound { variable, .. }) => {
                    trace!(%variable, %triple, "match discarded on binding conflict");
                    None
                }
            })
            .flat_map(move |next| match_patterns(rest, next)),
    )
}

/// Bind the pattern's variables to the matched triple's terms
fn bind_triple<'a>(
    ctx: &EvaluationContext<'a>,
    pattern: &TriplePattern,
    triple: &Triple,
) -> Result<EvaluationContext<'a>, BindError> {
    let positions = [
        (&pattern.subject, &triple.subject),
        (&pattern.predicate, &triple.predicate),
        (&pattern.object, &triple.object),
    ];
    positions.into_iter().try_fold(ctx.push(), |c, (p, t)| match p {
        Term::Variable(v) => c.bind(v.clone(), t.clone()),
        _ => Ok(c),
    })
}

/// Incremental solutions, merged with the context, verified and recorded
struct IncrementalPass<'a> {
    inner: Option<IncrementalIter<'a>>,
    patterns: &'a [TriplePattern],
    ctx: EvaluationContext<'a>,
    base: Binding,
    seen: SeenSet,
}

impl IncrementalPass<'_> {
    /// Every pattern must be fully instantiated and present in the graph
    fn holds(&self, solution: &Binding) -> bool {
        let graph = self.ctx.graph();
        self.patterns.iter().all(|pattern| {
            let t = substitute_triple(pattern, solution);
            t.is_ground()
                && graph
                    .triples(Some(&t.subject), Some(&t.predicate), Some(&t.object))
                    .next()
                    .is_some()
        })
    }

    fn finish(&mut self) {
        if self.inner.take().is_some() {
            debug!(recorded = self.seen.borrow().len(), "incremental BGP pass finished");
        }
    }
}

impl Iterator for IncrementalPass<'_> {
    type Item = crate::error::CwmResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.ctx.is_cancelled() {
                self.finish();
                return None;
            }
            let next = self.inner.as_mut()?.next();
            let partial = match next {
                Some(Ok(partial)) => partial,
                Some(Err(error)) => {
                    warn!(%error, "incremental BGP pass failed; falling back to naive matching");
                    self.finish();
                    return None;
                }
                None => {
                    self.finish();
                    return None;
                }
            };
            let Some(solution) = self.base.merge(&partial) else {
                continue;
            };
            if !self.holds(&solution) {
                trace!(?solution, "incremental solution rejected");
                continue;
            }
            if self.seen.borrow_mut().insert(solution.clone()) {
                return Some(Ok(solution));
            }
        }
    }
}
