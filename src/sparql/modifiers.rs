//! Solution modifiers: ORDER BY, OFFSET/LIMIT, DISTINCT, REDUCED, projection

use std::cmp::Ordering;
use std::iter;

use fnv::FnvHashSet;

use crate::error::CwmResult;
use crate::term::{Binding, Term, Variable};
use super::{AlgebraNode, EvaluationContext, Evaluator, OrderCondition, OrderDirection, Solutions};

impl Evaluator {
    /// Sort the child's rows; materializes on the first pull
    ///
    /// One stable sort per condition, last to first, gives lexicographic
    /// order over all conditions. Rows whose key fails to evaluate sort first.
    pub(crate) fn order_by<'a>(
        &self,
        child: &'a AlgebraNode,
        conditions: &'a [OrderCondition],
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        let rows = self.evaluate_node(child, ctx)?;
        let evaluator = self.clone();
        let ctx = ctx.clone();

        Ok(Box::new(iter::once(rows).flat_map(move |rows| -> Solutions<'a> {
            let mut sorted = Vec::new();
            for row in rows {
                match row {
                    Ok(row) => sorted.push(row),
                    Err(e) => return Box::new(iter::once(Err(e))),
                }
            }
            for condition in conditions.iter().rev() {
                let mut keyed: Vec<(Option<Term>, Binding)> = sorted
                    .into_iter()
                    .map(|row| {
                        let scope = ctx.thaw(&row).forget(&ctx);
                        (evaluator.expressions().eval(&condition.expression, &scope).ok(), row)
                    })
                    .collect();
                keyed.sort_by(|(a, _), (b, _)| match condition.direction {
                    OrderDirection::Ascending => compare_keys(a, b),
                    OrderDirection::Descending => compare_keys(b, a),
                });
                sorted = keyed.into_iter().map(|(_, row)| row).collect();
            }
            Box::new(sorted.into_iter().map(Ok))
        })))
    }

    pub(crate) fn slice<'a>(
        &self,
        child: &'a AlgebraNode,
        offset: usize,
        limit: Option<usize>,
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        Ok(Box::new(SliceIterator {
            inner: self.evaluate_node(child, ctx)?,
            to_skip: offset,
            remaining: limit,
        }))
    }

    pub(crate) fn distinct<'a>(&self, child: &'a AlgebraNode, ctx: &EvaluationContext<'a>) -> CwmResult<Solutions<'a>> {
        let mut seen = FnvHashSet::default();
        Ok(Box::new(self.evaluate_node(child, ctx)?.filter(move |row| match row {
            Ok(row) => seen.insert(row.clone()),
            Err(_) => true,
        })))
    }

    /// Pass rows through, dropping adjacent repeats when `dedup_reduced` is on
    pub(crate) fn reduced<'a>(&self, child: &'a AlgebraNode, ctx: &EvaluationContext<'a>) -> CwmResult<Solutions<'a>> {
        let rows = self.evaluate_node(child, ctx)?;
        if !ctx.config().dedup_reduced {
            return Ok(rows);
        }
        let mut previous: Option<Binding> = None;
        Ok(Box::new(rows.filter(move |row| match row {
            Ok(row) if previous.as_ref() == Some(row) => false,
            Ok(row) => {
                previous = Some(row.clone());
                true
            }
            Err(_) => true,
        })))
    }

    pub(crate) fn project<'a>(
        &self,
        child: &'a AlgebraNode,
        variables: &'a [Variable],
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        Ok(Box::new(
            self.evaluate_node(child, ctx)?
                .map(move |row| row.map(|b| b.project(variables))),
        ))
    }
}

/// Unbound keys sort before every term
fn compare_keys(a: &Option<Term>, b: &Option<Term>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.universal_cmp(b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

/// OFFSET and LIMIT over a lazy stream
///
/// Only successful rows count towards either bound; errors pass through.
struct SliceIterator<'a> {
    inner: Solutions<'a>,
    to_skip: usize,
    remaining: Option<usize>,
}

impl Iterator for SliceIterator<'_> {
    type Item = CwmResult<Binding>;

    fn next(&mut self) -> Option<CwmResult<Binding>> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            match self.inner.next()? {
                Ok(_) if self.to_skip > 0 => self.to_skip -= 1,
                Ok(row) => {
                    if let Some(remaining) = &mut self.remaining {
                        *remaining -= 1;
                    }
                    return Some(Ok(row));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluationConfig;
    use crate::sparql::{Expression, ValuesRow};
    use crate::store::Store;

    fn v(name: &str) -> Variable {
        Variable::new(name)
    }

    fn numbers(values: &[i64]) -> AlgebraNode {
        AlgebraNode::values(values.iter().map(|n| vec![(v("n"), Some(Term::integer(*n)))]).collect())
    }

    fn pairs(rows: &[(i64, &str)]) -> AlgebraNode {
        let rows: Vec<ValuesRow> = rows
            .iter()
            .map(|(n, s)| vec![(v("n"), Some(Term::integer(*n))), (v("s"), Some(Term::literal(*s)))])
            .collect();
        AlgebraNode::values(rows)
    }

    fn run_with(node: &AlgebraNode, config: EvaluationConfig) -> Vec<Binding> {
        let store = Store::new();
        let ctx = EvaluationContext::new(&store).with_config(config);
        Evaluator::new().evaluate(node, &ctx).unwrap().map(Result::unwrap).collect()
    }

    fn run(node: &AlgebraNode) -> Vec<Binding> {
        run_with(node, EvaluationConfig::default())
    }

    fn column(rows: &[Binding], name: &str) -> Vec<Term> {
        rows.iter().map(|r| r.get(&v(name)).cloned().unwrap()).collect()
    }

    fn ints(values: &[i64]) -> Vec<Term> {
        values.iter().map(|n| Term::integer(*n)).collect()
    }

    #[test]
    fn test_order_then_slice() {
        let node = AlgebraNode::slice(
            AlgebraNode::order_by(numbers(&[4, 2, 5, 1, 3]), vec![OrderCondition::asc(Expression::var("n"))]),
            2,
            Some(2),
        );
        assert_eq!(column(&run(&node), "n"), ints(&[3, 4]));
    }

    #[test]
    fn test_order_descending() {
        let node = AlgebraNode::order_by(numbers(&[4, 2, 5]), vec![OrderCondition::desc(Expression::var("n"))]);
        assert_eq!(column(&run(&node), "n"), ints(&[5, 4, 2]));
    }

    #[test]
    fn test_order_multiple_keys() {
        let node = AlgebraNode::order_by(
            pairs(&[(2, "b"), (1, "z"), (2, "a"), (1, "y")]),
            vec![OrderCondition::asc(Expression::var("n")), OrderCondition::desc(Expression::var("s"))],
        );
        let rows = run(&node);
        assert_eq!(column(&rows, "n"), ints(&[1, 1, 2, 2]));
        assert_eq!(
            column(&rows, "s"),
            vec![Term::literal("z"), Term::literal("y"), Term::literal("b"), Term::literal("a")]
        );
    }

    #[test]
    fn test_order_unbound_sorts_first() {
        let rows: Vec<ValuesRow> = vec![
            vec![(v("n"), Some(Term::integer(1)))],
            vec![(v("n"), None)],
        ];
        let node = AlgebraNode::order_by(AlgebraNode::values(rows), vec![OrderCondition::asc(Expression::var("n"))]);
        let out = run(&node);
        assert!(!out[0].contains(&v("n")));
        assert_eq!(out[1].get(&v("n")), Some(&Term::integer(1)));
    }

    #[test]
    fn test_order_mixed_numbers_and_strings() {
        let rows: Vec<ValuesRow> = vec![
            vec![(v("n"), Some(Term::integer(10)))],
            vec![(v("n"), Some(Term::literal("5")))],
            vec![(v("n"), Some(Term::integer(9)))],
        ];
        let node = AlgebraNode::order_by(AlgebraNode::values(rows), vec![OrderCondition::asc(Expression::var("n"))]);
        assert_eq!(column(&run(&node), "n"), vec![Term::integer(9), Term::integer(10), Term::literal("5")]);
    }

    #[test]
    fn test_order_many_mixed_literals() {
        let rows: Vec<ValuesRow> = (0..800i64)
            .map(|i| {
                let term = if i % 3 == 0 { Term::literal((i * 7 % 101).to_string()) } else { Term::integer(i * 13 % 97) };
                vec![(v("n"), Some(term))]
            })
            .collect();
        let node = AlgebraNode::order_by(AlgebraNode::values(rows), vec![OrderCondition::asc(Expression::var("n"))]);

        let sorted = column(&run(&node), "n");
        assert_eq!(sorted.len(), 800);
        assert!(sorted.windows(2).all(|pair| pair[0].universal_cmp(&pair[1]) != Ordering::Greater));
    }

    #[test]
    fn test_slice_bounds() {
        let all = numbers(&[1, 2, 3, 4, 5]);
        assert_eq!(column(&run(&AlgebraNode::slice(all.clone(), 0, None)), "n").len(), 5);
        assert_eq!(column(&run(&AlgebraNode::slice(all.clone(), 3, None)), "n"), ints(&[4, 5]));
        assert!(run(&AlgebraNode::slice(all.clone(), 10, Some(2))).is_empty());
        assert!(run(&AlgebraNode::slice(all, 0, Some(0))).is_empty());
    }

    #[test]
    fn test_distinct_is_idempotent() {
        let node = numbers(&[1, 2, 1, 3, 2]);
        let once = run(&AlgebraNode::distinct(node.clone()));
        let twice = run(&AlgebraNode::distinct(AlgebraNode::distinct(node)));
        assert_eq!(column(&once, "n"), ints(&[1, 2, 3]));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reduced_passes_rows_by_default() {
        let node = AlgebraNode::reduced(numbers(&[1, 1, 2]));
        assert_eq!(column(&run(&node), "n"), ints(&[1, 1, 2]));
    }

    #[test]
    fn test_reduced_drops_adjacent_repeats_when_enabled() {
        let config = EvaluationConfig { dedup_reduced: true, ..EvaluationConfig::default() };
        let node = AlgebraNode::reduced(numbers(&[1, 1, 2, 1]));
        assert_eq!(column(&run_with(&node, config), "n"), ints(&[1, 2, 1]));
    }

    #[test]
    fn test_project() {
        let node = AlgebraNode::project(pairs(&[(1, "a")]), vec![v("s"), v("missing")]);
        let rows = run(&node);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0].get(&v("s")), Some(&Term::literal("a")));
    }
}
