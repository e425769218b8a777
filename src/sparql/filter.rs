//! FILTER and BIND (Extend)

use tracing::trace;

use crate::error::CwmResult;
use crate::term::Variable;
use super::{AlgebraNode, EvaluationContext, Evaluator, Expression, Solutions};

impl Evaluator {
    /// Keep the rows for which `expression` is true
    ///
    /// Single-variable parts of the expression are registered as hints
    /// before the child starts, so BGPs below can use them in their
    /// incremental pass. Evaluation errors count as false.
    pub(crate) fn filter<'a>(
        &self,
        expression: &'a Expression,
        child: &'a AlgebraNode,
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        for (variable, serialized) in expression.discriminate() {
            ctx.register_hint(variable, serialized);
        }

        let rows = self.evaluate_node(child, ctx)?;
        let evaluator = self.clone();
        let outer = ctx.clone();

        Ok(Box::new(rows.filter(move |row| {
            let Ok(row) = row else {
                return true;
            };
            match evaluator.expressions().eval_boolean(expression, &outer.thaw(row).forget(&outer)) {
                Ok(keep) => keep,
                Err(error) => {
                    trace!(%error, %expression, "filter error, row rejected");
                    false
                }
            }
        })))
    }

    /// Bind `variable` to the value of `expression`; rows it cannot extend
    /// pass through unchanged
    pub(crate) fn extend<'a>(
        &self,
        child: &'a AlgebraNode,
        variable: &'a Variable,
        expression: &'a Expression,
        ctx: &EvaluationContext<'a>,
    ) -> CwmResult<Solutions<'a>> {
        let rows = self.evaluate_node(child, ctx)?;
        let evaluator = self.clone();
        let outer = ctx.clone();

        Ok(Box::new(rows.map(move |row| -> CwmResult<_> {
            let row = row?;
            let scope = outer.thaw(&row);
            let value = match evaluator.expressions().eval(expression, &scope.forget(&outer)) {
                Ok(value) => value,
                Err(error) => {
                    trace!(%error, %variable, "extend left variable unbound");
                    return Ok(row);
                }
            };
            match scope.bind(variable.clone(), value) {
                Ok(extended) => Ok(extended.solution()),
                Err(error) => {
                    trace!(%error, "extend conflicts with existing binding");
                    Ok(row)
                }
            }
        })))
    }
}
