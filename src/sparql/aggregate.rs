//! GROUP BY and aggregation
//!
//! Grouping has to see its whole input, so it materializes on the first
//! pull. Output is produced one group at a time.

use std::iter;

use fnv::FnvHashSet;
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::core::{ns, AggregateFunctions, AggregateInput};
use crate::error::{CwmError, CwmResult};
use crate::term::{Binding, Term};
use super::{
    AggregateFunction, AggregateSpec, AlgebraNode, EvaluationContext, Evaluator, ExprError, GroupCondition,
    Solutions,
};

/// Rows by group key, both in arrival order
type Groups = IndexMap<Vec<Option<Term>>, Vec<Binding>>;

impl Evaluator {
    /// A Group outside AggregateJoin: its rows, flattened in group order
    pub(crate) fn group<'a>(
        &self,
        child: &'a AlgebraNode,
        conditions: &'a [GroupCondition],
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        let evaluator = self.clone();
        let ctx = ctx.clone();
        Ok(Box::new(iter::once(()).flat_map(move |_| -> Solutions<'a> {
            match evaluator.collect_groups(child, conditions, &ctx) {
                Ok(groups) => Box::new(groups.into_values().flatten().map(Ok)),
                Err(e) => Box::new(iter::once(Err(e))),
            }
        })))
    }

    /// One row per group with the group keys and every aggregate bound
    pub(crate) fn aggregate_join<'a>(
        &self,
        group: &'a AlgebraNode,
        aggregates: &'a [AggregateSpec],
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        let AlgebraNode::Group { child, conditions } = group else {
            return Err(CwmError::invalid_algebra(format!("AggregateJoin over {} instead of Group", group.name())));
        };
        let evaluator = self.clone();
        let ctx = ctx.clone();

        Ok(Box::new(iter::once(()).flat_map(move |_| -> Solutions<'a> {
            let groups = match evaluator.collect_groups(child, conditions, &ctx) {
                Ok(groups) => groups,
                Err(e) => return Box::new(iter::once(Err(e))),
            };
            if groups.is_empty() {
                return Box::new(iter::once(Ok(ctx.solution())));
            }
            let evaluator = evaluator.clone();
            let ctx = ctx.clone();
            Box::new(groups.into_iter().map(move |(key, rows)| {
                Ok(evaluator.aggregate_row(&key, &rows, conditions, aggregates, &ctx))
            }))
        })))
    }

    fn collect_groups<'a>(
        &self,
        child: &'a AlgebraNode,
        conditions: &[GroupCondition],
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Groups> {
        let mut groups = Groups::new();
        if conditions.is_empty() {
            groups.insert(Vec::new(), Vec::new());
        }

        for row in self.evaluate_node(child, ctx)? {
            let row = row?;
            let scope = ctx.thaw(&row).forget(ctx);
            let key = conditions
                .iter()
                .map(|c| self.expressions().eval(&c.expression, &scope).ok())
                .collect();
            groups.entry(key).or_default().push(row);
        }

        debug!(groups = groups.len(), "grouping finished");
        Ok(groups)
    }

    fn aggregate_row(
        &self,
        key: &[Option<Term>],
        rows: &[Binding],
        conditions: &[GroupCondition],
        aggregates: &[AggregateSpec],
        ctx: &EvaluationContext<'_>,
    ) -> Binding {
        let mut out = ctx.push();
        for (condition, value) in conditions.iter().zip(key) {
            if let (Some(variable), Some(value)) = (condition.output_variable(), value) {
                if let Ok(next) = out.bind(variable.clone(), value.clone()) {
                    out = next;
                }
            }
        }

        for spec in aggregates {
            let input = self.aggregate_input(spec, rows, ctx);
            match self.aggregates().apply(&spec.function, &input) {
                Ok(value) => {
                    if let Ok(next) = out.bind(spec.variable.clone(), value) {
                        out = next;
                    }
                }
                Err(error) => trace!(%error, variable = %spec.variable, "aggregate left unbound"),
            }
        }
        out.solution()
    }

    fn aggregate_input(&self, spec: &AggregateSpec, rows: &[Binding], ctx: &EvaluationContext<'_>) -> AggregateInput {
        let Some(expression) = &spec.expression else {
            let rows = if spec.distinct {
                rows.iter().collect::<FnvHashSet<_>>().len()
            } else {
                rows.len()
            };
            return AggregateInput { values: Vec::new(), rows, star: true };
        };

        let values = rows
            .iter()
            .filter_map(|row| self.expressions().eval(expression, &ctx.thaw(row).forget(ctx)).ok());
        let values: Vec<Term> = if spec.distinct {
            values.collect::<IndexSet<_>>().into_iter().collect()
        } else {
            values.collect()
        };
        AggregateInput { values, rows: rows.len(), star: false }
    }
}

/// The SPARQL 1.1 set functions
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAggregates;

impl AggregateFunctions for StandardAggregates {
    fn apply(&self, function: &AggregateFunction, input: &AggregateInput) -> Result<Term, ExprError> {
        let values = &input.values;
        match function {
            AggregateFunction::Count => {
                let count = if input.star { input.rows } else { values.len() };
                Ok(Term::integer(count as i64))
            }
            AggregateFunction::Sum => sum(values),
            AggregateFunction::Avg => {
                if values.is_empty() {
                    return Ok(Term::integer(0));
                }
                let total = numbers(values)?.iter().sum::<f64>();
                Ok(Term::decimal(total / values.len() as f64))
            }
            AggregateFunction::Min => values
                .iter()
                .min_by(|a, b| a.universal_cmp(b))
                .cloned()
                .ok_or(ExprError::EmptyGroup),
            AggregateFunction::Max => values
                .iter()
                .max_by(|a, b| a.universal_cmp(b))
                .cloned()
                .ok_or(ExprError::EmptyGroup),
            AggregateFunction::Sample => values.first().cloned().ok_or(ExprError::EmptyGroup),
            AggregateFunction::GroupConcat { separator } => {
                let separator = separator.as_deref().unwrap_or(" ");
                let parts: Vec<&str> = values.iter().map(lexical_form).collect();
                Ok(Term::literal(parts.join(separator)))
            }
            AggregateFunction::Custom(name) => Err(ExprError::UnknownFunction(name.clone())),
        }
    }
}

/// Integer sum when every value is an integer, decimal otherwise
fn sum(values: &[Term]) -> Result<Term, ExprError> {
    let integers: Option<Vec<i64>> = values
        .iter()
        .map(|v| {
            v.as_literal()
                .filter(|lit| lit.datatype_uri() == Some(ns::XSD_INTEGER))
                .and_then(|lit| lit.as_integer())
        })
        .collect();

    if let Some(integers) = integers {
        return integers
            .into_iter()
            .try_fold(0i64, i64::checked_add)
            .map(Term::integer)
            .ok_or_else(|| ExprError::TypeError("integer overflow in SUM".to_string()));
    }
    Ok(Term::decimal(numbers(values)?.iter().sum()))
}

fn numbers(values: &[Term]) -> Result<Vec<f64>, ExprError> {
    values
        .iter()
        .map(|v| {
            v.as_literal()
                .and_then(|lit| lit.numeric_value())
                .ok_or_else(|| ExprError::TypeError(format!("{} is not numeric", v)))
        })
        .collect()
}

fn lexical_form(term: &Term) -> &str {
    match term {
        Term::Literal(lit) => lit.value(),
        Term::Uri(uri) => uri.as_str(),
        Term::BlankNode(blank) => blank.label(),
        Term::Variable(var) => var.name(),
    }
}
