//! Default expression evaluator
//!
//! Covers the operators and built-ins used by FILTER, BIND, ORDER BY and
//! GROUP BY in everyday queries. Errors follow SPARQL: an unbound variable
//! or a type mismatch is an error, which the calling operator recovers from.

use std::cmp::Ordering;

use regex::RegexBuilder;
use thiserror::Error;

use crate::core::{ns, ExpressionEvaluator};
use crate::term::{Datatype, Literal, Term, Variable};
use super::{EvaluationContext, Expression, Function};

/// Expression evaluation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("variable {0} is unbound")]
    Unbound(Variable),
    #[error("type error: {0}")]
    TypeError(String),
    #[error("unknown function {0}")]
    UnknownFunction(String),
    #[error("invalid regular expression {pattern:?}: {message}")]
    InvalidRegex { pattern: String, message: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("aggregate over an empty group")]
    EmptyGroup,
}

/// SPARQL effective boolean value
pub fn effective_boolean_value(term: &Term) -> Result<bool, ExprError> {
    let lit = match term {
        Term::Literal(lit) => lit,
        other => return Err(ExprError::TypeError(format!("{} has no boolean value", other))),
    };
    if lit.datatype_uri() == Some(ns::XSD_BOOLEAN) {
        return Ok(lit.as_boolean().unwrap_or(false));
    }
    if lit.is_numeric() {
        return Ok(lit.numeric_value().map(|n| n != 0.0 && !n.is_nan()).unwrap_or(false));
    }
    if lit.is_string() || lit.language().is_some() {
        return Ok(!lit.value().is_empty());
    }
    Err(ExprError::TypeError(format!("{} has no boolean value", lit)))
}

/// Built-in evaluator for [`Expression`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleExpressionEvaluator;

impl SimpleExpressionEvaluator {
    pub fn new() -> Self {
        SimpleExpressionEvaluator
    }

    fn logical_and(&self, l: &Expression, r: &Expression, ctx: &EvaluationContext<'_>) -> Result<bool, ExprError> {
        match (self.eval_boolean(l, ctx), self.eval_boolean(r, ctx)) {
            (Ok(false), _) | (_, Ok(false)) => Ok(false),
            (Ok(true), Ok(true)) => Ok(true),
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }

    fn logical_or(&self, l: &Expression, r: &Expression, ctx: &EvaluationContext<'_>) -> Result<bool, ExprError> {
        match (self.eval_boolean(l, ctx), self.eval_boolean(r, ctx)) {
            (Ok(true), _) | (_, Ok(true)) => Ok(true),
            (Ok(false), Ok(false)) => Ok(false),
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }

    fn compare(&self, l: &Expression, r: &Expression, ctx: &EvaluationContext<'_>) -> Result<Ordering, ExprError> {
        let a = self.eval(l, ctx)?;
        let b = self.eval(r, ctx)?;
        compare_values(&a, &b)
    }

    fn arithmetic(
        &self,
        l: &Expression,
        r: &Expression,
        op: ArithmeticOp,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Term, ExprError> {
        let a = numeric_literal(&self.eval(l, ctx)?)?;
        let b = numeric_literal(&self.eval(r, ctx)?)?;

        if op != ArithmeticOp::Divide {
            if let (Some(x), Some(y)) = (integer_value(&a), integer_value(&b)) {
                let result = match op {
                    ArithmeticOp::Add => x.checked_add(y),
                    ArithmeticOp::Subtract => x.checked_sub(y),
                    ArithmeticOp::Multiply => x.checked_mul(y),
                    ArithmeticOp::Divide => None,
                };
                if let Some(n) = result {
                    return Ok(Term::integer(n));
                }
            }
        }

        let x = a.numeric_value().unwrap_or(f64::NAN);
        let y = b.numeric_value().unwrap_or(f64::NAN);
        let value = match op {
            ArithmeticOp::Add => x + y,
            ArithmeticOp::Subtract => x - y,
            ArithmeticOp::Multiply => x * y,
            ArithmeticOp::Divide => {
                if y == 0.0 {
                    return Err(ExprError::DivisionByZero);
                }
                x / y
            }
        };
        Ok(Term::decimal(value))
    }

    fn call(&self, function: &Function, args: &[Expression], ctx: &EvaluationContext<'_>) -> Result<Term, ExprError> {
        let arity = |expected: std::ops::RangeInclusive<usize>| {
            if expected.contains(&args.len()) {
                Ok(())
            } else {
                Err(ExprError::TypeError(format!(
                    "{} takes {} to {} arguments, got {}",
                    function.name(),
                    expected.start(),
                    expected.end(),
                    args.len()
                )))
            }
        };

        match function {
            Function::IsIri | Function::IsBlank | Function::IsLiteral => {
                arity(1..=1)?;
                let term = self.eval(&args[0], ctx)?;
                let result = match function {
                    Function::IsIri => matches!(term, Term::Uri(_)),
                    Function::IsBlank => matches!(term, Term::BlankNode(_)),
                    _ => matches!(term, Term::Literal(_)),
                };
                Ok(Term::boolean(result))
            }
            Function::Str => {
                arity(1..=1)?;
                match self.eval(&args[0], ctx)? {
                    Term::Literal(lit) => Ok(Term::literal(lit.value())),
                    Term::Uri(uri) => Ok(Term::literal(uri.as_str())),
                    other => Err(ExprError::TypeError(format!("STR is undefined for {}", other))),
                }
            }
            Function::Lang => {
                arity(1..=1)?;
                let term = self.eval(&args[0], ctx)?;
                let lit = literal(&term)?;
                Ok(Term::literal(lit.language().unwrap_or("")))
            }
            Function::Datatype => {
                arity(1..=1)?;
                let term = self.eval(&args[0], ctx)?;
                let lit = literal(&term)?;
                Ok(match lit.datatype() {
                    Datatype::Plain => Term::uri(ns::XSD_STRING),
                    Datatype::Language(_) => Term::uri(ns::RDF_LANG_STRING),
                    Datatype::Typed(dt) => Term::uri(dt.as_str()),
                })
            }
            Function::Regex => {
                arity(2..=3)?;
                let text = self.eval(&args[0], ctx)?;
                let pattern = self.eval(&args[1], ctx)?;
                let flags = match args.get(2) {
                    Some(expr) => Some(self.eval(expr, ctx)?),
                    None => None,
                };
                let pattern = literal(&pattern)?.value();
                let flags = match &flags {
                    Some(term) => literal(term)?.value(),
                    None => "",
                };
                let re = RegexBuilder::new(pattern)
                    .case_insensitive(flags.contains('i'))
                    .multi_line(flags.contains('m'))
                    .dot_matches_new_line(flags.contains('s'))
                    .ignore_whitespace(flags.contains('x'))
                    .build()
                    .map_err(|e| ExprError::InvalidRegex {
                        pattern: pattern.to_string(),
                        message: e.to_string(),
                    })?;
                Ok(Term::boolean(re.is_match(literal(&text)?.value())))
            }
            Function::Contains | Function::StrStarts | Function::StrEnds => {
                arity(2..=2)?;
                let haystack = self.eval(&args[0], ctx)?;
                let needle = self.eval(&args[1], ctx)?;
                let haystack = literal(&haystack)?.value();
                let needle = literal(&needle)?.value();
                let result = match function {
                    Function::Contains => haystack.contains(needle),
                    Function::StrStarts => haystack.starts_with(needle),
                    _ => haystack.ends_with(needle),
                };
                Ok(Term::boolean(result))
            }
            Function::StrLen => {
                arity(1..=1)?;
                let term = self.eval(&args[0], ctx)?;
                let len = literal(&term)?.value().chars().count();
                Ok(Term::integer(len as i64))
            }
            Function::Custom(iri) => Err(ExprError::UnknownFunction(iri.clone())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

fn literal(term: &Term) -> Result<&Literal, ExprError> {
    term.as_literal()
        .ok_or_else(|| ExprError::TypeError(format!("expected a literal, got {}", term)))
}

fn numeric_literal(term: &Term) -> Result<Literal, ExprError> {
    match term.as_literal() {
        Some(lit) if lit.numeric_value().is_some() => Ok(lit.clone()),
        _ => Err(ExprError::TypeError(format!("expected a number, got {}", term))),
    }
}

fn integer_value(lit: &Literal) -> Option<i64> {
    if lit.datatype_uri() == Some(ns::XSD_INTEGER) {
        lit.as_integer()
    } else {
        None
    }
}

/// Value comparison used by `<`, `>`, `=` and friends
fn compare_values(a: &Term, b: &Term) -> Result<Ordering, ExprError> {
    if let (Term::Literal(x), Term::Literal(y)) = (a, b) {
        if let (Some(m), Some(n)) = (x.numeric_value(), y.numeric_value()) {
            return m
                .partial_cmp(&n)
                .ok_or_else(|| ExprError::TypeError("NaN is unordered".to_string()));
        }
        if x.is_string() && y.is_string() {
            return Ok(x.value().cmp(y.value()));
        }
        if x.datatype() == y.datatype() {
            if let (Some(p), Some(q)) = (x.as_boolean(), y.as_boolean()) {
                if x.datatype_uri() == Some(ns::XSD_BOOLEAN) {
                    return Ok(p.cmp(&q));
                }
            }
        }
    }
    Err(ExprError::TypeError(format!("cannot order {} and {}", a, b)))
}

/// `=` semantics: numbers by value, everything else by term identity
fn values_equal(a: &Term, b: &Term) -> bool {
    if let (Term::Literal(x), Term::Literal(y)) = (a, b) {
        if let (Some(m), Some(n)) = (x.numeric_value(), y.numeric_value()) {
            return m == n;
        }
    }
    a == b
}

impl ExpressionEvaluator for SimpleExpressionEvaluator {
    fn eval(&self, expr: &Expression, ctx: &EvaluationContext<'_>) -> Result<Term, ExprError> {
        match expr {
            Expression::Variable(v) | Expression::Constant(Term::Variable(v)) => {
                ctx.get(v).cloned().ok_or_else(|| ExprError::Unbound(v.clone()))
            }
            Expression::Constant(term) => Ok(term.clone()),
            Expression::And(l, r) => self.logical_and(l, r, ctx).map(Term::boolean),
            Expression::Or(l, r) => self.logical_or(l, r, ctx).map(Term::boolean),
            Expression::Not(inner) => self.eval_boolean(inner, ctx).map(|b| Term::boolean(!b)),
            Expression::Equal(l, r) => {
                Ok(Term::boolean(values_equal(&self.eval(l, ctx)?, &self.eval(r, ctx)?)))
            }
            Expression::NotEqual(l, r) => {
                Ok(Term::boolean(!values_equal(&self.eval(l, ctx)?, &self.eval(r, ctx)?)))
            }
            Expression::Less(l, r) => Ok(Term::boolean(self.compare(l, r, ctx)? == Ordering::Less)),
            Expression::LessOrEqual(l, r) => {
                Ok(Term::boolean(self.compare(l, r, ctx)? != Ordering::Greater))
            }
            Expression::Greater(l, r) => {
                Ok(Term::boolean(self.compare(l, r, ctx)? == Ordering::Greater))
            }
            Expression::GreaterOrEqual(l, r) => {
                Ok(Term::boolean(self.compare(l, r, ctx)? != Ordering::Less))
            }
            Expression::Add(l, r) => self.arithmetic(l, r, ArithmeticOp::Add, ctx),
            Expression::Subtract(l, r) => self.arithmetic(l, r, ArithmeticOp::Subtract, ctx),
            Expression::Multiply(l, r) => self.arithmetic(l, r, ArithmeticOp::Multiply, ctx),
            Expression::Divide(l, r) => self.arithmetic(l, r, ArithmeticOp::Divide, ctx),
            Expression::Bound(v) => Ok(Term::boolean(ctx.get(v).is_some())),
            Expression::Function(function, args) => self.call(function, args, ctx),
        }
    }
}
