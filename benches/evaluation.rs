//! Benchmarks for algebra evaluation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cwm_algebra::sparql::{OrderCondition, QueryResult};
use cwm_algebra::{AlgebraNode, EvaluationContext, Evaluator, Expression, QueryEngine, Store, Term, Triple};

fn ex(local: &str) -> Term {
    Term::uri(format!("http://example.org/{}", local))
}

/// `size` people, every third one named, each with an age
fn people(size: usize) -> Store {
    let mut store = Store::new();
    for i in 0..size {
        let person = ex(&format!("p{}", i));
        store.add(Triple::new(person.clone(), ex("type"), ex("Person")));
        store.add(Triple::new(person.clone(), ex("age"), Term::integer((i % 90) as i64)));
        if i % 3 == 0 {
            store.add(Triple::new(person, ex("name"), Term::literal(format!("Person {}", i))));
        }
    }
    store
}

fn typed() -> AlgebraNode {
    AlgebraNode::bgp(vec![Triple::new(Term::variable("s"), ex("type"), ex("Person"))])
}

fn named() -> AlgebraNode {
    AlgebraNode::bgp(vec![Triple::new(Term::variable("s"), ex("name"), Term::variable("n"))])
}

fn bgp_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("bgp");

    for size in [100, 1000] {
        let store = people(size);
        let two_patterns = AlgebraNode::bgp(vec![
            Triple::new(Term::variable("s"), ex("type"), ex("Person")),
            Triple::new(Term::variable("s"), ex("age"), Term::variable("age")),
        ]);

        group.bench_with_input(BenchmarkId::new("two_patterns", size), &store, |b, store| {
            let evaluator = Evaluator::new();
            b.iter(|| {
                let ctx = EvaluationContext::new(store);
                let count = evaluator.evaluate(&two_patterns, &ctx).map(|rows| rows.count());
                black_box(count)
            });
        });
    }

    group.finish();
}

fn join_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("join");
    let store = people(1000);
    let evaluator = Evaluator::new();

    let hash = AlgebraNode::join(typed(), named());
    group.bench_function("hash", |b| {
        b.iter(|| {
            let ctx = EvaluationContext::new(&store);
            black_box(evaluator.evaluate(&hash, &ctx).map(|rows| rows.count()))
        });
    });

    let lazy = AlgebraNode::lazy_join(typed(), named());
    group.bench_function("lazy", |b| {
        b.iter(|| {
            let ctx = EvaluationContext::new(&store);
            black_box(evaluator.evaluate(&lazy, &ctx).map(|rows| rows.count()))
        });
    });

    let optional = AlgebraNode::left_join(typed(), named(), None);
    group.bench_function("optional", |b| {
        b.iter(|| {
            let ctx = EvaluationContext::new(&store);
            black_box(evaluator.evaluate(&optional, &ctx).map(|rows| rows.count()))
        });
    });

    group.finish();
}

fn order_slice_benchmark(c: &mut Criterion) {
    let store = people(1000);
    let query = AlgebraNode::select(
        AlgebraNode::slice(
            AlgebraNode::order_by(
                AlgebraNode::bgp(vec![Triple::new(Term::variable("s"), ex("age"), Term::variable("age"))]),
                vec![OrderCondition::desc(Expression::var("age"))],
            ),
            10,
            Some(10),
        ),
        vec![],
    );

    c.bench_function("order_slice_1000", |b| {
        b.iter(|| {
            let mut engine = QueryEngine::over_graph(&store);
            match engine.execute(&query) {
                Ok(QueryResult::Select { rows, .. }) => black_box(rows.count()),
                _ => 0,
            }
        });
    });
}

criterion_group!(
    benches,
    bgp_benchmark,
    join_benchmark,
    order_slice_benchmark,
);

criterion_main!(benches);
