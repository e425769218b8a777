//! Property-based tests for algebra operators using proptest

use std::cmp::Ordering;
use std::collections::BTreeSet;

use cwm_algebra::sparql::{OrderCondition, ValuesRow};
use cwm_algebra::{AlgebraNode, Binding, EvaluationContext, Evaluator, Expression, Store, Term, Variable};
use proptest::prelude::*;

/// Rows over two variables with small integer values, duplicates removed
fn rows_strategy(first: &'static str, second: &'static str) -> impl Strategy<Value = Vec<ValuesRow>> {
    prop::collection::btree_set((0i64..4, 0i64..4), 0..8).prop_map(move |pairs| {
        pairs
            .into_iter()
            .map(|(a, b)| {
                vec![
                    (Variable::new(first), Some(Term::integer(a))),
                    (Variable::new(second), Some(Term::integer(b))),
                ]
            })
            .collect()
    })
}

/// Single-variable rows, duplicates allowed
fn column_strategy() -> impl Strategy<Value = Vec<ValuesRow>> {
    prop::collection::vec(0i64..6, 0..12).prop_map(|values| {
        values
            .into_iter()
            .map(|n| vec![(Variable::new("n"), Some(Term::integer(n)))])
            .collect()
    })
}

/// Ground terms of every kind, with numbers and digit strings mixed in
fn term_strategy() -> impl Strategy<Value = Term> {
    prop_oneof![
        (-20i64..20).prop_map(Term::integer),
        (-20i64..20).prop_map(|n| Term::decimal(n as f64 / 4.0)),
        "[0-9a-c]{0,3}".prop_map(Term::literal),
        ("[0-9a-c]{0,2}", "en|de").prop_map(|(v, lang)| Term::lang_literal(v, lang)),
        "[0-9a-c]{1,2}".prop_map(|v| Term::typed_literal(v, "http://www.w3.org/2001/XMLSchema#integer")),
        "[a-c]{1,2}".prop_map(|local| Term::uri(format!("http://example.org/{}", local))),
        "[a-c]{1,2}".prop_map(Term::blank),
    ]
}

fn run(node: &AlgebraNode) -> Vec<Binding> {
    let store = Store::new();
    let ctx = EvaluationContext::new(&store);
    Evaluator::new()
        .evaluate(node, &ctx)
        .unwrap()
        .map(|row| row.unwrap())
        .collect()
}

fn as_multiset(rows: Vec<Binding>) -> Vec<String> {
    let mut keys: Vec<String> = rows.iter().map(|b| format!("{:?}", b)).collect();
    keys.sort();
    keys
}

fn integer(row: &Binding, name: &str) -> i64 {
    row.get(&Variable::new(name))
        .and_then(|t| t.as_literal())
        .and_then(|l| l.as_integer())
        .unwrap()
}

proptest! {
    #[test]
    fn join_is_commutative(a in rows_strategy("x", "y"), b in rows_strategy("y", "z")) {
        let left = AlgebraNode::values(a);
        let right = AlgebraNode::values(b);

        let ab = as_multiset(run(&AlgebraNode::join(left.clone(), right.clone())));
        let ba = as_multiset(run(&AlgebraNode::join(right.clone(), left.clone())));
        prop_assert_eq!(&ab, &ba);

        let lazy = as_multiset(run(&AlgebraNode::lazy_join(left, right)));
        prop_assert_eq!(&ab, &lazy);
    }

    #[test]
    fn left_join_keeps_every_left_row(a in rows_strategy("x", "y"), b in rows_strategy("y", "z")) {
        let left_rows: Vec<Binding> = run(&AlgebraNode::values(a.clone()));
        let out = run(&AlgebraNode::left_join(AlgebraNode::values(a), AlgebraNode::values(b), None));

        prop_assert!(out.len() >= left_rows.len());
        let vars = [Variable::new("x"), Variable::new("y")];
        let origins: BTreeSet<String> = out.iter().map(|r| format!("{:?}", r.project(&vars))).collect();
        prop_assert_eq!(origins.len(), left_rows.len());
    }

    #[test]
    fn union_skips_right_duplicates_of_left_rows(a in column_strategy(), b in column_strategy()) {
        let left_rows = run(&AlgebraNode::values(a.clone()));
        let right_rows = run(&AlgebraNode::values(b.clone()));
        let out = run(&AlgebraNode::union(AlgebraNode::values(a), AlgebraNode::values(b)));

        let mut expected = left_rows.clone();
        expected.extend(right_rows.into_iter().filter(|r| !left_rows.contains(r)));
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn order_then_slice_matches_sorted_window(
        values in column_strategy(),
        offset in 0usize..6,
        limit in prop::option::of(0usize..6),
    ) {
        let mut expected: Vec<i64> = run(&AlgebraNode::values(values.clone()))
            .iter()
            .map(|r| integer(r, "n"))
            .collect();
        expected.sort();
        let expected: Vec<i64> = expected
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect();

        let node = AlgebraNode::slice(
            AlgebraNode::order_by(AlgebraNode::values(values), vec![OrderCondition::asc(Expression::var("n"))]),
            offset,
            limit,
        );
        let got: Vec<i64> = run(&node).iter().map(|r| integer(r, "n")).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn distinct_is_idempotent(values in column_strategy()) {
        let node = AlgebraNode::values(values);
        let once = run(&AlgebraNode::distinct(node.clone()));
        let twice = run(&AlgebraNode::distinct(AlgebraNode::distinct(node)));
        prop_assert_eq!(&once, &twice);

        let unique: BTreeSet<String> = once.iter().map(|r| format!("{:?}", r)).collect();
        prop_assert_eq!(unique.len(), once.len());
    }

    #[test]
    fn universal_order_is_total(terms in prop::collection::vec(term_strategy(), 0..12)) {
        for a in &terms {
            for b in &terms {
                let ab = a.universal_cmp(b);
                prop_assert_eq!(ab, b.universal_cmp(a).reverse());
                prop_assert_eq!(ab == Ordering::Equal, a == b);
                for c in &terms {
                    if ab != Ordering::Greater && b.universal_cmp(c) != Ordering::Greater {
                        prop_assert_ne!(a.universal_cmp(c), Ordering::Greater);
                    }
                }
            }
        }
    }

    #[test]
    fn order_by_sorts_mixed_terms(terms in prop::collection::vec(term_strategy(), 0..200)) {
        let rows: Vec<ValuesRow> = terms
            .into_iter()
            .map(|t| vec![(Variable::new("n"), Some(t))])
            .collect();
        let node = AlgebraNode::order_by(AlgebraNode::values(rows), vec![OrderCondition::asc(Expression::var("n"))]);

        let sorted: Vec<Term> = run(&node)
            .iter()
            .map(|r| r.get(&Variable::new("n")).cloned().unwrap())
            .collect();
        for pair in sorted.windows(2) {
            prop_assert_ne!(pair[0].universal_cmp(&pair[1]), Ordering::Greater);
        }
    }
}
