//! Join, LeftJoin, Union, Minus, Values and Graph

use std::cell::RefCell;
use std::collections::VecDeque;
use std::iter;
use std::rc::Rc;

use fnv::{FnvHashMap, FnvHashSet};
use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::error::{CwmError, CwmResult};
use crate::term::{Binding, Term, Variable};
use super::{AlgebraNode, EvaluationContext, Evaluator, Expression, Solutions, ValuesRow};

impl Evaluator {
    /// Nested-loop join: the right side is re-evaluated with each left row bound
    pub(crate) fn lazy_join<'a>(
        &self,
        left: &'a AlgebraNode,
        right: &'a AlgebraNode,
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        let left = self.evaluate_node(left, ctx)?;
        let evaluator = self.clone();
        let ctx = ctx.clone();

        Ok(Box::new(left.flat_map(move |row| -> Solutions<'a> {
            match row {
                Ok(row) => {
                    let matches = evaluator.evaluate_or_fail(right, &ctx.thaw(&row));
                    Box::new(matches.filter_map(move |r| match r {
                        Ok(r) => row.merge(&r).map(Ok),
                        Err(e) => Some(Err(e)),
                    }))
                }
                Err(e) => Box::new(iter::once(Err(e))),
            }
        })))
    }

    /// Hash join: the right side is collected once, on first pull, and
    /// indexed by the variables both operands mention
    pub(crate) fn hash_join<'a>(
        &self,
        left: &'a AlgebraNode,
        right: &'a AlgebraNode,
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        let right_variables = right.variables();
        let keys: Vec<Variable> = left
            .variables()
            .into_iter()
            .filter(|v| right_variables.contains(v))
            .collect();

        Ok(Box::new(JoinIterator {
            left: self.evaluate_node(left, ctx)?,
            right: Some(self.evaluate_node(right, ctx)?),
            index: JoinIndex::new(keys),
            buffered: VecDeque::new(),
        }))
    }

    pub(crate) fn left_join<'a>(
        &self,
        left: &'a AlgebraNode,
        right: &'a AlgebraNode,
        expression: Option<&'a Expression>,
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        Ok(Box::new(LeftJoinIterator {
            evaluator: self.clone(),
            left: self.evaluate_node(left, ctx)?,
            right,
            expression,
            left_variables: left.variables(),
            ctx: ctx.clone(),
            current: None,
        }))
    }

    /// Left rows as they come, then right rows not already produced on the left
    pub(crate) fn union<'a>(
        &self,
        left: &'a AlgebraNode,
        right: &'a AlgebraNode,
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        let seen: Rc<RefCell<FnvHashSet<Binding>>> = Rc::default();
        let recorded = seen.clone();
        let left = self.evaluate_node(left, ctx)?.inspect(move |row| {
            if let Ok(row) = row {
                recorded.borrow_mut().insert(row.clone());
            }
        });

        let evaluator = self.clone();
        let ctx = ctx.clone();
        let right = iter::once(())
            .flat_map(move |_| evaluator.evaluate_or_fail(right, &ctx))
            .filter(move |row| match row {
                Ok(row) => !seen.borrow().contains(row),
                Err(_) => true,
            });

        Ok(Box::new(left.chain(right)))
    }

    pub(crate) fn minus<'a>(
        &self,
        left: &'a AlgebraNode,
        right: &'a AlgebraNode,
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        Ok(Box::new(MinusIterator {
            left: self.evaluate_node(left, ctx)?,
            right: Some(self.evaluate_node(right, ctx)?),
            right_rows: Vec::new(),
            errors: VecDeque::new(),
        }))
    }

    /// Evaluate `child` against one graph, or against every named graph
    pub(crate) fn graph<'a>(
        &self,
        term: &'a Term,
        child: &'a AlgebraNode,
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        let dataset = ctx.dataset().ok_or_else(|| {
            CwmError::graph_scope(format!("GRAPH {} needs a dataset to evaluate against", term))
        })?;

        let name = match term {
            Term::Variable(v) => ctx.get(v).cloned(),
            constant => Some(constant.clone()),
        };

        if let Some(name) = name {
            if name.as_uri().is_none() {
                trace!(graph = %name, "graph name is not an IRI");
                return Ok(Box::new(iter::empty()));
            }
            return match dataset.get_context(&name) {
                Some(graph) => self.evaluate_node(child, &ctx.push_graph(graph)),
                None => {
                    debug!(graph = %name, "named graph not in dataset");
                    Ok(Box::new(iter::empty()))
                }
            };
        }

        let Term::Variable(variable) = term else {
            return Ok(Box::new(iter::empty()));
        };
        let default_id = dataset.default_context_id();
        let evaluator = self.clone();
        let ctx = ctx.clone();

        Ok(Box::new(
            dataset
                .contexts()
                .filter(move |(id, _)| *id != default_id)
                .flat_map(move |(id, graph)| -> Solutions<'a> {
                    match ctx.push_graph(graph).bind(variable.clone(), id) {
                        Ok(scoped) => evaluator.evaluate_or_fail(child, &scoped),
                        Err(_) => Box::new(iter::empty()),
                    }
                }),
        ))
    }
}

/// Inline data: one solution per row that agrees with the context
pub(crate) fn evaluate_values<'a>(rows: &'a [ValuesRow], ctx: &EvaluationContext<'a>) -> Solutions<'a> {
    let ctx = ctx.clone();
    Box::new(rows.iter().filter_map(move |row| {
        let bound = row.iter().try_fold(ctx.push(), |c, (variable, value)| match value {
            Some(term) => c.bind(variable.clone(), term.clone()),
            None => Ok(c),
        });
        match bound {
            Ok(c) => Some(Ok(c.solution())),
            Err(error) => {
                trace!(%error, "VALUES row skipped");
                None
            }
        }
    }))
}

/// Right-side rows of a hash join
///
/// Rows binding every key variable are bucketed by their key values. Rows
/// missing a key (an OPTIONAL miss, say) are compatible with any key and
/// are tried against every left row.
struct JoinIndex {
    keys: Vec<Variable>,
    seen: FnvHashSet<Binding>,
    buckets: FnvHashMap<Vec<Term>, Vec<Binding>>,
    unkeyed: Vec<Binding>,
}

impl JoinIndex {
    fn new(keys: Vec<Variable>) -> Self {
        JoinIndex {
            keys,
            seen: FnvHashSet::default(),
            buckets: FnvHashMap::default(),
            unkeyed: Vec::new(),
        }
    }

    fn key(&self, row: &Binding) -> Option<Vec<Term>> {
        self.keys.iter().map(|v| row.get(v).cloned()).collect()
    }

    fn insert(&mut self, row: Binding) {
        if !self.seen.insert(row.clone()) {
            return;
        }
        match self.key(&row) {
            Some(key) => self.buckets.entry(key).or_default().push(row),
            None => self.unkeyed.push(row),
        }
    }

    fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Right rows that may join with `left`
    fn candidates<'i>(&'i self, left: &Binding) -> Box<dyn Iterator<Item = &'i Binding> + 'i> {
        match self.key(left) {
            Some(key) => Box::new(self.buckets.get(&key).into_iter().flatten().chain(&self.unkeyed)),
            None => Box::new(self.buckets.values().flatten().chain(&self.unkeyed)),
        }
    }
}

struct JoinIterator<'a> {
    left: Solutions<'a>,
    right: Option<Solutions<'a>>,
    index: JoinIndex,
    buffered: VecDeque<CwmResult<Binding>>,
}

impl Iterator for JoinIterator<'_> {
    type Item = CwmResult<Binding>;

    fn next(&mut self) -> Option<CwmResult<Binding>> {
        if let Some(right) = self.right.take() {
            for row in right {
                match row {
                    Ok(row) => self.index.insert(row),
                    Err(e) => self.buffered.push_back(Err(e)),
                }
            }
            trace!(
                rows = self.index.seen.len(),
                buckets = self.index.buckets.len(),
                keys = self.index.keys.len(),
                "join right side indexed"
            );
        }

        loop {
            if let Some(result) = self.buffered.pop_front() {
                return Some(result);
            }
            if self.index.is_empty() {
                return None;
            }
            match self.left.next()? {
                Ok(left_row) => {
                    let joined = self.index.candidates(&left_row).filter_map(|r| left_row.merge(r)).map(Ok);
                    self.buffered.extend(joined);
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// The right-side scan for one left row
struct OptionalScan<'a> {
    left: Binding,
    right: Solutions<'a>,
    matched: bool,
}

struct LeftJoinIterator<'a> {
    evaluator: Evaluator,
    left: Solutions<'a>,
    right: &'a AlgebraNode,
    expression: Option<&'a Expression>,
    left_variables: IndexSet<Variable>,
    ctx: EvaluationContext<'a>,
    current: Option<OptionalScan<'a>>,
}

impl LeftJoinIterator<'_> {
    fn accepts(&self, row: &Binding) -> bool {
        accepts(&self.evaluator, self.expression, &self.ctx, row)
    }

    /// Decide what to do with a left row that found no accepted match
    ///
    /// The right side is retried with only the left operand's own variables
    /// in scope. A passing row there means the miss was caused by incidental
    /// outer bindings, and the left row is dropped.
    fn fallback(&self, left: Binding) -> Option<CwmResult<Binding>> {
        let scope = self.ctx.thaw(&left).remember(&self.left_variables);
        for row in self.evaluator.evaluate_or_fail(self.right, &scope) {
            match row {
                Ok(row) if self.accepts(&row) => {
                    trace!(?left, "optional row dropped: hidden match");
                    return None;
                }
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }
        }
        Some(Ok(left))
    }
}

impl Iterator for LeftJoinIterator<'_> {
    type Item = CwmResult<Binding>;

    fn next(&mut self) -> Option<CwmResult<Binding>> {
        loop {
            if let Some(scan) = &mut self.current {
                match scan.right.next() {
                    Some(Ok(r)) => {
                        if let Some(joined) = scan.left.merge(&r) {
                            if accepts(&self.evaluator, self.expression, &self.ctx, &joined) {
                                scan.matched = true;
                                return Some(Ok(joined));
                            }
                        }
                        continue;
                    }
                    Some(Err(e)) => return Some(Err(e)),
                    None => {}
                }
                if let Some(scan) = self.current.take() {
                    if !scan.matched {
                        if let Some(result) = self.fallback(scan.left) {
                            return Some(result);
                        }
                    }
                }
                continue;
            }

            match self.left.next()? {
                Ok(left) => {
                    let right = self.evaluator.evaluate_or_fail(self.right, &self.ctx.thaw(&left));
                    self.current = Some(OptionalScan { left, right, matched: false });
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Whether an optional match passes the LeftJoin expression; errors reject
fn accepts(evaluator: &Evaluator, expression: Option<&Expression>, ctx: &EvaluationContext<'_>, row: &Binding) -> bool {
    match expression {
        None => true,
        Some(expression) => evaluator
            .expressions()
            .eval_boolean(expression, &ctx.thaw(row).forget(ctx))
            .unwrap_or(false),
    }
}

struct MinusIterator<'a> {
    left: Solutions<'a>,
    right: Option<Solutions<'a>>,
    right_rows: Vec<Binding>,
    errors: VecDeque<CwmResult<Binding>>,
}

impl Iterator for MinusIterator<'_> {
    type Item = CwmResult<Binding>;

    fn next(&mut self) -> Option<CwmResult<Binding>> {
        if let Some(right) = self.right.take() {
            for row in right {
                match row {
                    Ok(row) => self.right_rows.push(row),
                    Err(e) => self.errors.push_back(Err(e)),
                }
            }
        }
        if let Some(error) = self.errors.pop_front() {
            return Some(error);
        }

        loop {
            match self.left.next()? {
                Ok(row) => {
                    let excluded = self
                        .right_rows
                        .iter()
                        .any(|r| row.shares_variable(r) && row.is_compatible(r));
                    if !excluded {
                        return Some(Ok(row));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryDataset, Store};
    use crate::term::Triple;

    fn ex(local: &str) -> Term {
        Term::uri(format!("http://example.org/{}", local))
    }

    fn v(name: &str) -> Variable {
        Variable::new(name)
    }

    fn row(pairs: &[(&str, Term)]) -> Binding {
        pairs.iter().map(|(name, term)| (v(name), term.clone())).collect()
    }

    fn values(rows: &[&[(&str, Term)]]) -> AlgebraNode {
        AlgebraNode::values(
            rows.iter()
                .map(|r| r.iter().map(|(name, term)| (v(name), Some(term.clone()))).collect())
                .collect(),
        )
    }

    fn run(node: &AlgebraNode, store: &Store) -> Vec<Binding> {
        let ctx = EvaluationContext::new(store);
        Evaluator::new().evaluate(node, &ctx).unwrap().map(Result::unwrap).collect()
    }

    fn sorted(mut rows: Vec<Binding>) -> Vec<Binding> {
        rows.sort_by_key(|b| format!("{:?}", b));
        rows
    }

    fn people() -> Store {
        let mut store = Store::new();
        store.add(Triple::new(ex("a"), ex("type"), ex("Person")));
        store.add(Triple::new(ex("b"), ex("type"), ex("Person")));
        store.add(Triple::new(ex("b"), ex("name"), Term::literal("Bob")));
        store
    }

    fn typed() -> AlgebraNode {
        AlgebraNode::bgp(vec![Triple::new(Term::variable("s"), ex("type"), ex("Person"))])
    }

    fn named() -> AlgebraNode {
        AlgebraNode::bgp(vec![Triple::new(Term::variable("s"), ex("name"), Term::variable("n"))])
    }

    #[test]
    fn test_join_scenario() {
        let store = people();
        let expected = vec![row(&[("s", ex("b")), ("n", Term::literal("Bob"))])];
        assert_eq!(run(&AlgebraNode::join(typed(), named()), &store), expected);
        assert_eq!(run(&AlgebraNode::lazy_join(typed(), named()), &store), expected);
    }

    #[test]
    fn test_join_is_commutative() {
        let store = Store::new();
        let a = values(&[&[("x", Term::integer(1))], &[("x", Term::integer(2))]]);
        let b = values(&[
            &[("x", Term::integer(1)), ("y", ex("one"))],
            &[("x", Term::integer(2)), ("y", ex("two"))],
            &[("x", Term::integer(3)), ("y", ex("three"))],
        ]);

        let ab = sorted(run(&AlgebraNode::join(a.clone(), b.clone()), &store));
        let ba = sorted(run(&AlgebraNode::join(b.clone(), a.clone()), &store));
        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 2);
        assert_eq!(sorted(run(&AlgebraNode::lazy_join(a, b), &store)), ab);
    }

    #[test]
    fn test_hash_join_with_unbound_keys() {
        let store = Store::new();
        let left = AlgebraNode::values(vec![
            vec![(v("x"), Some(Term::integer(1)))],
            vec![(v("x"), Some(Term::integer(2)))],
            vec![(v("x"), None), (v("z"), Some(ex("free")))],
        ]);
        let right = AlgebraNode::values(vec![
            vec![(v("x"), Some(Term::integer(1))), (v("y"), Some(ex("one")))],
            vec![(v("x"), None), (v("y"), Some(ex("any")))],
        ]);

        let rows = sorted(run(&AlgebraNode::join(left.clone(), right.clone()), &store));
        assert_eq!(
            rows,
            sorted(vec![
                row(&[("x", Term::integer(1)), ("y", ex("one"))]),
                row(&[("x", Term::integer(1)), ("y", ex("any"))]),
                row(&[("x", Term::integer(2)), ("y", ex("any"))]),
                row(&[("z", ex("free")), ("x", Term::integer(1)), ("y", ex("one"))]),
                row(&[("z", ex("free")), ("y", ex("any"))]),
            ])
        );
        assert_eq!(sorted(run(&AlgebraNode::lazy_join(left, right), &store)), rows);
    }

    #[test]
    fn test_join_with_empty_side() {
        let store = people();
        let nothing = AlgebraNode::bgp(vec![Triple::new(Term::variable("s"), ex("missing"), Term::variable("o"))]);
        assert!(run(&AlgebraNode::join(typed(), nothing.clone()), &store).is_empty());
        assert!(run(&AlgebraNode::join(nothing, typed()), &store).is_empty());
    }

    #[test]
    fn test_left_join_keeps_unmatched_rows() {
        let store = people();
        let rows = sorted(run(&AlgebraNode::left_join(typed(), named(), None), &store));
        assert_eq!(
            rows,
            sorted(vec![
                row(&[("s", ex("a"))]),
                row(&[("s", ex("b")), ("n", Term::literal("Bob"))]),
            ])
        );
    }

    #[test]
    fn test_left_join_expression_rejects_match() {
        let store = people();
        let never = Expression::equal(Expression::var("n"), Expression::constant(Term::literal("Alice")));
        let rows = run(&AlgebraNode::left_join(typed(), named(), Some(never)), &store);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| !r.contains(&v("n"))));
    }

    #[test]
    fn test_left_join_expression_accepts_match() {
        let store = people();
        let bob = Expression::equal(Expression::var("n"), Expression::constant(Term::literal("Bob")));
        let rows = sorted(run(&AlgebraNode::left_join(typed(), named(), Some(bob)), &store));
        assert_eq!(
            rows,
            sorted(vec![
                row(&[("s", ex("a"))]),
                row(&[("s", ex("b")), ("n", Term::literal("Bob"))]),
            ])
        );
    }

    #[test]
    fn test_left_join_drops_row_with_hidden_match() {
        let store = people();
        let optional = AlgebraNode::left_join(typed(), named(), None);

        // ?n = "Alice" from the outer row blocks :b's name; retried with only ?s in scope it matches "Bob"
        let alice = values(&[&[("n", Term::literal("Alice"))]]);
        let rows = run(&AlgebraNode::lazy_join(alice, optional.clone()), &store);
        assert_eq!(rows, vec![row(&[("s", ex("a")), ("n", Term::literal("Alice"))])]);

        let bob = values(&[&[("n", Term::literal("Bob"))]]);
        let rows = sorted(run(&AlgebraNode::lazy_join(bob, optional), &store));
        assert_eq!(
            rows,
            sorted(vec![
                row(&[("s", ex("a")), ("n", Term::literal("Bob"))]),
                row(&[("s", ex("b")), ("n", Term::literal("Bob"))]),
            ])
        );
    }

    #[test]
    fn test_union_preserves_left_duplicates() {
        let store = Store::new();
        let left = values(&[&[("x", Term::integer(1))], &[("x", Term::integer(1))]]);
        let right = values(&[&[("x", Term::integer(1))], &[("x", Term::integer(2))]]);

        let rows = run(&AlgebraNode::union(left, right), &store);
        assert_eq!(
            rows,
            vec![
                row(&[("x", Term::integer(1))]),
                row(&[("x", Term::integer(1))]),
                row(&[("x", Term::integer(2))]),
            ]
        );
    }

    #[test]
    fn test_minus() {
        let store = Store::new();
        let left = values(&[&[("x", Term::integer(1))], &[("x", Term::integer(2))]]);
        let right = values(&[&[("x", Term::integer(2)), ("y", ex("two"))]]);
        let rows = run(&AlgebraNode::minus(left, right), &store);
        assert_eq!(rows, vec![row(&[("x", Term::integer(1))])]);
    }

    #[test]
    fn test_minus_disjoint_domains_remove_nothing() {
        let store = Store::new();
        let left = values(&[&[("x", Term::integer(1))]]);
        let right = values(&[&[("y", Term::integer(1))]]);
        assert_eq!(run(&AlgebraNode::minus(left, right), &store).len(), 1);
    }

    #[test]
    fn test_values_skip_conflicting_rows() {
        let store = Store::new();
        let ctx = EvaluationContext::new(&store).bind(v("x"), Term::integer(1)).unwrap();
        let rows: Vec<ValuesRow> = vec![
            vec![(v("x"), Some(Term::integer(1))), (v("y"), Some(ex("a")))],
            vec![(v("x"), Some(Term::integer(2))), (v("y"), Some(ex("b")))],
            vec![(v("x"), None), (v("y"), Some(ex("c")))],
        ];
        let out: Vec<Binding> = evaluate_values(&rows, &ctx).map(Result::unwrap).collect();
        assert_eq!(
            out,
            vec![
                row(&[("x", Term::integer(1)), ("y", ex("a"))]),
                row(&[("x", Term::integer(1)), ("y", ex("c"))]),
            ]
        );
    }

    fn library() -> MemoryDataset {
        let mut dataset = MemoryDataset::new();
        dataset.add(Triple::new(ex("d"), ex("title"), Term::literal("Default")));
        dataset.add_to_graph(Triple::new(ex("x"), ex("title"), Term::literal("First")), &ex("g1"));
        dataset.add_to_graph(Triple::new(ex("y"), ex("title"), Term::literal("Second")), &ex("g2"));
        dataset
    }

    fn titles() -> AlgebraNode {
        AlgebraNode::bgp(vec![Triple::new(Term::variable("s"), ex("title"), Term::variable("t"))])
    }

    fn run_dataset(node: &AlgebraNode, dataset: &MemoryDataset) -> Vec<Binding> {
        let ctx = EvaluationContext::with_dataset(dataset);
        Evaluator::new().evaluate(node, &ctx).unwrap().map(Result::unwrap).collect()
    }

    #[test]
    fn test_graph_with_constant_name() {
        let dataset = library();
        let rows = run_dataset(&AlgebraNode::graph(ex("g2"), titles()), &dataset);
        assert_eq!(rows, vec![row(&[("s", ex("y")), ("t", Term::literal("Second"))])]);

        assert!(run_dataset(&AlgebraNode::graph(ex("nowhere"), titles()), &dataset).is_empty());
    }

    #[test]
    fn test_graph_variable_ranges_over_named_graphs() {
        let dataset = library();
        let rows = run_dataset(&AlgebraNode::graph(Term::variable("g"), titles()), &dataset);
        assert_eq!(
            rows,
            vec![
                row(&[("g", ex("g1")), ("s", ex("x")), ("t", Term::literal("First"))]),
                row(&[("g", ex("g2")), ("s", ex("y")), ("t", Term::literal("Second"))]),
            ]
        );
    }

    #[test]
    fn test_graph_variable_already_bound() {
        let dataset = library();
        let ctx = EvaluationContext::with_dataset(&dataset).bind(v("g"), ex("g1")).unwrap();
        let node = AlgebraNode::graph(Term::variable("g"), titles());
        let rows: Vec<Binding> = Evaluator::new().evaluate(&node, &ctx).unwrap().map(Result::unwrap).collect();
        assert_eq!(rows, vec![row(&[("g", ex("g1")), ("s", ex("x")), ("t", Term::literal("First"))])]);
    }

    #[test]
    fn test_default_graph_outside_graph_clause() {
        let dataset = library();
        let rows = run_dataset(&titles(), &dataset);
        assert_eq!(rows, vec![row(&[("s", ex("d")), ("t", Term::literal("Default"))])]);
    }
}
