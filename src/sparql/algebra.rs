//! SPARQL algebra trees
//!
//! The evaluator consumes an already-translated algebra tree. Nodes are
//! immutable once built and are borrowed for the lifetime of an evaluation.

use std::fmt;

use indexmap::IndexSet;

use crate::term::{Term, Triple, Variable};

/// A triple pattern: constants or variables in each position
pub type TriplePattern = Triple;

/// One row of an inline `VALUES` table; `None` marks `UNDEF`
pub type ValuesRow = Vec<(Variable, Option<Term>)>;

/// Built-in functions understood by the default expression evaluator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Function {
    Str,
    Lang,
    Datatype,
    IsIri,
    IsBlank,
    IsLiteral,
    Regex,
    Contains,
    StrStarts,
    StrEnds,
    StrLen,
    /// Extension function, identified by IRI
    Custom(String),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Str => "STR",
            Function::Lang => "LANG",
            Function::Datatype => "DATATYPE",
            Function::IsIri => "isIRI",
            Function::IsBlank => "isBLANK",
            Function::IsLiteral => "isLITERAL",
            Function::Regex => "REGEX",
            Function::Contains => "CONTAINS",
            Function::StrStarts => "STRSTARTS",
            Function::StrEnds => "STRENDS",
            Function::StrLen => "STRLEN",
            Function::Custom(iri) => iri,
        }
    }
}

/// Filter, bind, ordering and grouping expressions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Variable(Variable),
    Constant(Term),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),
    Less(Box<Expression>, Box<Expression>),
    LessOrEqual(Box<Expression>, Box<Expression>),
    Greater(Box<Expression>, Box<Expression>),
    GreaterOrEqual(Box<Expression>, Box<Expression>),
    Add(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Divide(Box<Expression>, Box<Expression>),
    Bound(Variable),
    Function(Function, Vec<Expression>),
}

impl Expression {
    pub fn var(name: &str) -> Self {
        Expression::Variable(Variable::new(name))
    }

    pub fn constant(term: Term) -> Self {
        Expression::Constant(term)
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or(Box::new(left), Box::new(right))
    }

    pub fn not(inner: Expression) -> Self {
        Expression::Not(Box::new(inner))
    }

    pub fn equal(left: Expression, right: Expression) -> Self {
        Expression::Equal(Box::new(left), Box::new(right))
    }

    pub fn less(left: Expression, right: Expression) -> Self {
        Expression::Less(Box::new(left), Box::new(right))
    }

    pub fn greater(left: Expression, right: Expression) -> Self {
        Expression::Greater(Box::new(left), Box::new(right))
    }

    pub fn add(left: Expression, right: Expression) -> Self {
        Expression::Add(Box::new(left), Box::new(right))
    }

    pub fn call(function: Function, args: Vec<Expression>) -> Self {
        Expression::Function(function, args)
    }

    /// Variables mentioned anywhere in the expression, in first-use order
    pub fn variables(&self) -> IndexSet<Variable> {
        let mut out = IndexSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut IndexSet<Variable>) {
        match self {
            Expression::Variable(v) | Expression::Bound(v) => {
                out.insert(v.clone());
            }
            Expression::Constant(Term::Variable(v)) => {
                out.insert(v.clone());
            }
            Expression::Constant(_) => {}
            Expression::Not(inner) => inner.collect_variables(out),
            Expression::And(l, r)
            | Expression::Or(l, r)
            | Expression::Equal(l, r)
            | Expression::NotEqual(l, r)
            | Expression::Less(l, r)
            | Expression::LessOrEqual(l, r)
            | Expression::Greater(l, r)
            | Expression::GreaterOrEqual(l, r)
            | Expression::Add(l, r)
            | Expression::Subtract(l, r)
            | Expression::Multiply(l, r)
            | Expression::Divide(l, r) => {
                l.collect_variables(out);
                r.collect_variables(out);
            }
            Expression::Function(_, args) => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
        }
    }

    /// Split into per-variable filter hints
    ///
    /// A sub-expression that mentions exactly one variable becomes a hint for
    /// that variable. Conjunctions over several variables are searched
    /// recursively; any other multi-variable expression yields nothing.
    pub fn discriminate(&self) -> Vec<(Variable, String)> {
        let vars = self.variables();
        if vars.len() == 1 {
            return vars.into_iter().map(|v| (v, self.to_string())).collect();
        }
        match self {
            Expression::And(l, r) => {
                let mut hints = l.discriminate();
                hints.extend(r.discriminate());
                hints
            }
            _ => Vec::new(),
        }
    }
}

fn binary(f: &mut fmt::Formatter<'_>, l: &Expression, op: &str, r: &Expression) -> fmt::Result {
    write!(f, "({} {} {})", l, op, r)
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Variable(v) => write!(f, "{}", v),
            Expression::Constant(t) => write!(f, "{}", t),
            Expression::And(l, r) => binary(f, l, "&&", r),
            Expression::Or(l, r) => binary(f, l, "||", r),
            Expression::Not(inner) => write!(f, "!{}", inner),
            Expression::Equal(l, r) => binary(f, l, "=", r),
            Expression::NotEqual(l, r) => binary(f, l, "!=", r),
            Expression::Less(l, r) => binary(f, l, "<", r),
            Expression::LessOrEqual(l, r) => binary(f, l, "<=", r),
            Expression::Greater(l, r) => binary(f, l, ">", r),
            Expression::GreaterOrEqual(l, r) => binary(f, l, ">=", r),
            Expression::Add(l, r) => binary(f, l, "+", r),
            Expression::Subtract(l, r) => binary(f, l, "-", r),
            Expression::Multiply(l, r) => binary(f, l, "*", r),
            Expression::Divide(l, r) => binary(f, l, "/", r),
            Expression::Bound(v) => write!(f, "BOUND({})", v),
            Expression::Function(function, args) => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Sort direction of one ORDER BY key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

/// One ORDER BY key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderCondition {
    pub expression: Expression,
    pub direction: OrderDirection,
}

impl OrderCondition {
    pub fn asc(expression: Expression) -> Self {
        OrderCondition { expression, direction: OrderDirection::Ascending }
    }

    pub fn desc(expression: Expression) -> Self {
        OrderCondition { expression, direction: OrderDirection::Descending }
    }
}

/// One GROUP BY key, optionally bound to a variable with `AS`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupCondition {
    pub expression: Expression,
    pub alias: Option<Variable>,
}

impl GroupCondition {
    pub fn var(name: &str) -> Self {
        GroupCondition { expression: Expression::var(name), alias: None }
    }

    /// Variable that carries the key into aggregate rows, if any
    pub fn output_variable(&self) -> Option<&Variable> {
        match (&self.alias, &self.expression) {
            (Some(alias), _) => Some(alias),
            (None, Expression::Variable(v)) => Some(v),
            _ => None,
        }
    }
}

/// Aggregate function kinds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Sample,
    GroupConcat { separator: Option<String> },
    /// Extension aggregate, identified by IRI
    Custom(String),
}

/// One aggregate computed by `AggregateJoin`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateSpec {
    pub function: AggregateFunction,
    /// Argument expression; `None` means `*`
    pub expression: Option<Expression>,
    pub distinct: bool,
    /// Variable that receives the result
    pub variable: Variable,
}

impl AggregateSpec {
    pub fn count_star(variable: &str) -> Self {
        AggregateSpec {
            function: AggregateFunction::Count,
            expression: None,
            distinct: false,
            variable: Variable::new(variable),
        }
    }

    pub fn new(function: AggregateFunction, expression: Expression, variable: &str) -> Self {
        AggregateSpec {
            function,
            expression: Some(expression),
            distinct: false,
            variable: Variable::new(variable),
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

/// A `FROM` (default) or `FROM NAMED` clause
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetClause {
    pub source: Term,
    pub named: bool,
}

impl DatasetClause {
    pub fn default_graph(source: Term) -> Self {
        DatasetClause { source, named: false }
    }

    pub fn named(source: Term) -> Self {
        DatasetClause { source, named: true }
    }
}

/// A node of the query algebra
#[derive(Debug, Clone, PartialEq)]
pub enum AlgebraNode {
    Bgp {
        patterns: Vec<TriplePattern>,
    },
    Filter {
        expression: Expression,
        child: Box<AlgebraNode>,
    },
    Join {
        left: Box<AlgebraNode>,
        right: Box<AlgebraNode>,
        /// Evaluate the right side once per left solution
        lazy: bool,
    },
    LeftJoin {
        left: Box<AlgebraNode>,
        right: Box<AlgebraNode>,
        /// Optional filter; `None` is always true
        expression: Option<Expression>,
    },
    Union {
        left: Box<AlgebraNode>,
        right: Box<AlgebraNode>,
    },
    Minus {
        left: Box<AlgebraNode>,
        right: Box<AlgebraNode>,
    },
    Extend {
        child: Box<AlgebraNode>,
        variable: Variable,
        expression: Expression,
    },
    Graph {
        term: Term,
        child: Box<AlgebraNode>,
    },
    Values {
        rows: Vec<ValuesRow>,
    },
    Group {
        child: Box<AlgebraNode>,
        conditions: Vec<GroupCondition>,
    },
    AggregateJoin {
        /// Always a `Group` node
        group: Box<AlgebraNode>,
        aggregates: Vec<AggregateSpec>,
    },
    OrderBy {
        child: Box<AlgebraNode>,
        conditions: Vec<OrderCondition>,
    },
    Slice {
        child: Box<AlgebraNode>,
        offset: usize,
        limit: Option<usize>,
    },
    Distinct {
        child: Box<AlgebraNode>,
    },
    Reduced {
        child: Box<AlgebraNode>,
    },
    Project {
        child: Box<AlgebraNode>,
        variables: Vec<Variable>,
    },
    Service {
        endpoint: Term,
        child: Box<AlgebraNode>,
        silent: bool,
    },
    SelectQuery {
        child: Box<AlgebraNode>,
        /// Result variables; empty means every variable of the pattern
        variables: Vec<Variable>,
        dataset: Vec<DatasetClause>,
    },
    AskQuery {
        child: Box<AlgebraNode>,
        dataset: Vec<DatasetClause>,
    },
    ConstructQuery {
        child: Box<AlgebraNode>,
        /// `None` for `CONSTRUCT WHERE`, which reuses the pattern's triples
        template: Option<Vec<TriplePattern>>,
        dataset: Vec<DatasetClause>,
    },
    DescribeQuery {
        child: Box<AlgebraNode>,
        resources: Vec<Term>,
        dataset: Vec<DatasetClause>,
    },
}

impl AlgebraNode {
    // ========================================================================
    // Constructors
    // ========================================================================

    pub fn bgp(patterns: Vec<TriplePattern>) -> Self {
        AlgebraNode::Bgp { patterns }
    }

    pub fn filter(expression: Expression, child: AlgebraNode) -> Self {
        AlgebraNode::Filter { expression, child: Box::new(child) }
    }

    pub fn join(left: AlgebraNode, right: AlgebraNode) -> Self {
        AlgebraNode::Join { left: Box::new(left), right: Box::new(right), lazy: false }
    }

    pub fn lazy_join(left: AlgebraNode, right: AlgebraNode) -> Self {
        AlgebraNode::Join { left: Box::new(left), right: Box::new(right), lazy: true }
    }

    pub fn left_join(left: AlgebraNode, right: AlgebraNode, expression: Option<Expression>) -> Self {
        AlgebraNode::LeftJoin { left: Box::new(left), right: Box::new(right), expression }
    }

    pub fn union(left: AlgebraNode, right: AlgebraNode) -> Self {
        AlgebraNode::Union { left: Box::new(left), right: Box::new(right) }
    }

    pub fn minus(left: AlgebraNode, right: AlgebraNode) -> Self {
        AlgebraNode::Minus { left: Box::new(left), right: Box::new(right) }
    }

    pub fn extend(child: AlgebraNode, variable: &str, expression: Expression) -> Self {
        AlgebraNode::Extend { child: Box::new(child), variable: Variable::new(variable), expression }
    }

    pub fn graph(term: Term, child: AlgebraNode) -> Self {
        AlgebraNode::Graph { term, child: Box::new(child) }
    }

    pub fn values(rows: Vec<ValuesRow>) -> Self {
        AlgebraNode::Values { rows }
    }

    pub fn group(child: AlgebraNode, conditions: Vec<GroupCondition>) -> Self {
        AlgebraNode::Group { child: Box::new(child), conditions }
    }

    pub fn aggregate_join(group: AlgebraNode, aggregates: Vec<AggregateSpec>) -> Self {
        AlgebraNode::AggregateJoin { group: Box::new(group), aggregates }
    }

    pub fn order_by(child: AlgebraNode, conditions: Vec<OrderCondition>) -> Self {
        AlgebraNode::OrderBy { child: Box::new(child), conditions }
    }

    pub fn slice(child: AlgebraNode, offset: usize, limit: Option<usize>) -> Self {
        AlgebraNode::Slice { child: Box::new(child), offset, limit }
    }

    pub fn distinct(child: AlgebraNode) -> Self {
        AlgebraNode::Distinct { child: Box::new(child) }
    }

    pub fn reduced(child: AlgebraNode) -> Self {
        AlgebraNode::Reduced { child: Box::new(child) }
    }

    pub fn project(child: AlgebraNode, variables: Vec<Variable>) -> Self {
        AlgebraNode::Project { child: Box::new(child), variables }
    }

    pub fn select(child: AlgebraNode, variables: Vec<Variable>) -> Self {
        AlgebraNode::SelectQuery { child: Box::new(child), variables, dataset: Vec::new() }
    }

    pub fn ask(child: AlgebraNode) -> Self {
        AlgebraNode::AskQuery { child: Box::new(child), dataset: Vec::new() }
    }

    pub fn construct(child: AlgebraNode, template: Option<Vec<TriplePattern>>) -> Self {
        AlgebraNode::ConstructQuery { child: Box::new(child), template, dataset: Vec::new() }
    }

    /// Attach dataset clauses to a query node; other nodes are returned as-is
    pub fn with_dataset(mut self, clauses: Vec<DatasetClause>) -> Self {
        match &mut self {
            AlgebraNode::SelectQuery { dataset, .. }
            | AlgebraNode::AskQuery { dataset, .. }
            | AlgebraNode::ConstructQuery { dataset, .. }
            | AlgebraNode::DescribeQuery { dataset, .. } => *dataset = clauses,
            _ => {}
        }
        self
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Node kind, as used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            AlgebraNode::Bgp { .. } => "BGP",
            AlgebraNode::Filter { .. } => "Filter",
            AlgebraNode::Join { .. } => "Join",
            AlgebraNode::LeftJoin { .. } => "LeftJoin",
            AlgebraNode::Union { .. } => "Union",
            AlgebraNode::Minus { .. } => "Minus",
            AlgebraNode::Extend { .. } => "Extend",
            AlgebraNode::Graph { .. } => "Graph",
            AlgebraNode::Values { .. } => "Values",
            AlgebraNode::Group { .. } => "Group",
            AlgebraNode::AggregateJoin { .. } => "AggregateJoin",
            AlgebraNode::OrderBy { .. } => "OrderBy",
            AlgebraNode::Slice { .. } => "Slice",
            AlgebraNode::Distinct { .. } => "Distinct",
            AlgebraNode::Reduced { .. } => "Reduced",
            AlgebraNode::Project { .. } => "Project",
            AlgebraNode::Service { .. } => "SERVICE",
            AlgebraNode::SelectQuery { .. } => "SelectQuery",
            AlgebraNode::AskQuery { .. } => "AskQuery",
            AlgebraNode::ConstructQuery { .. } => "ConstructQuery",
            AlgebraNode::DescribeQuery { .. } => "DESCRIBE",
        }
    }

    /// Direct children, left to right
    pub fn children(&self) -> Vec<&AlgebraNode> {
        match self {
            AlgebraNode::Bgp { .. } | AlgebraNode::Values { .. } => Vec::new(),
            AlgebraNode::Join { left, right, .. }
            | AlgebraNode::LeftJoin { left, right, .. }
            | AlgebraNode::Union { left, right }
            | AlgebraNode::Minus { left, right } => vec![&**left, &**right],
            AlgebraNode::AggregateJoin { group, .. } => vec![&**group],
            AlgebraNode::Filter { child, .. }
            | AlgebraNode::Extend { child, .. }
            | AlgebraNode::Graph { child, .. }
            | AlgebraNode::Group { child, .. }
            | AlgebraNode::OrderBy { child, .. }
            | AlgebraNode::Slice { child, .. }
            | AlgebraNode::Distinct { child }
            | AlgebraNode::Reduced { child }
            | AlgebraNode::Project { child, .. }
            | AlgebraNode::Service { child, .. }
            | AlgebraNode::SelectQuery { child, .. }
            | AlgebraNode::AskQuery { child, .. }
            | AlgebraNode::ConstructQuery { child, .. }
            | AlgebraNode::DescribeQuery { child, .. } => vec![&**child],
        }
    }

    /// Dataset clauses of a query node
    pub fn dataset_clauses(&self) -> &[DatasetClause] {
        match self {
            AlgebraNode::SelectQuery { dataset, .. }
            | AlgebraNode::AskQuery { dataset, .. }
            | AlgebraNode::ConstructQuery { dataset, .. }
            | AlgebraNode::DescribeQuery { dataset, .. } => dataset,
            _ => &[],
        }
    }

    /// Statically referenced variables of the subtree, in first-use order
    pub fn variables(&self) -> IndexSet<Variable> {
        let mut out = IndexSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut IndexSet<Variable>) {
        match self {
            AlgebraNode::Bgp { patterns } => {
                for pattern in patterns {
                    collect_pattern_variables(pattern, out);
                }
            }
            AlgebraNode::Filter { expression, .. } => expression.collect_variables(out),
            AlgebraNode::LeftJoin { expression: Some(expression), .. } => {
                expression.collect_variables(out)
            }
            AlgebraNode::Extend { variable, expression, .. } => {
                expression.collect_variables(out);
                out.insert(variable.clone());
            }
            AlgebraNode::Graph { term: Term::Variable(v), .. } => {
                out.insert(v.clone());
            }
            AlgebraNode::Values { rows } => {
                for (var, _) in rows.iter().flatten() {
                    out.insert(var.clone());
                }
            }
            AlgebraNode::Group { conditions, .. } => {
                for condition in conditions {
                    condition.expression.collect_variables(out);
                    if let Some(alias) = &condition.alias {
                        out.insert(alias.clone());
                    }
                }
            }
            AlgebraNode::AggregateJoin { aggregates, .. } => {
                for aggregate in aggregates {
                    if let Some(expression) = &aggregate.expression {
                        expression.collect_variables(out);
                    }
                    out.insert(aggregate.variable.clone());
                }
            }
            AlgebraNode::OrderBy { conditions, .. } => {
                for condition in conditions {
                    condition.expression.collect_variables(out);
                }
            }
            AlgebraNode::Project { variables, .. } | AlgebraNode::SelectQuery { variables, .. } => {
                out.extend(variables.iter().cloned());
            }
            _ => {}
        }
        for child in self.children() {
            child.collect_variables(out);
        }
    }

    /// Every triple pattern in the subtree, in tree order
    pub fn patterns(&self) -> Vec<TriplePattern> {
        let mut out = Vec::new();
        self.collect_patterns(&mut out);
        out
    }

    fn collect_patterns(&self, out: &mut Vec<TriplePattern>) {
        if let AlgebraNode::Bgp { patterns } = self {
            out.extend(patterns.iter().cloned());
        }
        for child in self.children() {
            child.collect_patterns(out);
        }
    }
}

fn collect_pattern_variables(pattern: &TriplePattern, out: &mut IndexSet<Variable>) {
    for term in [&pattern.subject, &pattern.predicate, &pattern.object] {
        if let Term::Variable(v) = term {
            out.insert(v.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp(s: Term, p: &str, o: Term) -> TriplePattern {
        Triple::new(s, Term::uri(format!("http://example.org/{}", p)), o)
    }

    #[test]
    fn test_expression_display() {
        let expr = Expression::and(
            Expression::greater(Expression::var("age"), Expression::constant(Term::integer(18))),
            Expression::call(Function::Regex, vec![
                Expression::var("name"),
                Expression::constant(Term::literal("^B")),
            ]),
        );
        assert_eq!(
            expr.to_string(),
            "((?age > \"18\"^^<http://www.w3.org/2001/XMLSchema#integer>) && REGEX(?name, \"^B\"))"
        );
    }

    #[test]
    fn test_discriminate_single_variable() {
        let expr = Expression::greater(Expression::var("x"), Expression::constant(Term::integer(1)));
        let hints = expr.discriminate();
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].0, Variable::new("x"));
        assert_eq!(hints[0].1, expr.to_string());
    }

    #[test]
    fn test_discriminate_recurses_through_conjunction() {
        let left = Expression::greater(Expression::var("x"), Expression::constant(Term::integer(1)));
        let right = Expression::Bound(Variable::new("y"));
        let expr = Expression::and(left.clone(), right.clone());

        let hints = expr.discriminate();
        assert_eq!(
            hints,
            vec![
                (Variable::new("x"), left.to_string()),
                (Variable::new("y"), right.to_string()),
            ]
        );
    }

    #[test]
    fn test_discriminate_ignores_multi_variable_disjunction() {
        let expr = Expression::or(Expression::var("x"), Expression::var("y"));
        assert!(expr.discriminate().is_empty());
    }

    #[test]
    fn test_bare_variable_is_a_hint() {
        let hints = Expression::var("flag").discriminate();
        assert_eq!(hints, vec![(Variable::new("flag"), "?flag".to_string())]);
    }

    #[test]
    fn test_node_variables() {
        let node = AlgebraNode::left_join(
            AlgebraNode::bgp(vec![tp(Term::variable("s"), "p", Term::variable("o"))]),
            AlgebraNode::extend(
                AlgebraNode::bgp(vec![tp(Term::variable("o"), "q", Term::variable("z"))]),
                "w",
                Expression::var("z"),
            ),
            None,
        );
        let vars: Vec<String> = node.variables().iter().map(|v| v.name().to_string()).collect();
        assert_eq!(vars, vec!["s", "o", "z", "w"]);
    }

    #[test]
    fn test_patterns_in_tree_order() {
        let a = tp(Term::variable("s"), "p", Term::variable("o"));
        let b = tp(Term::variable("o"), "q", Term::literal("x"));
        let node = AlgebraNode::select(
            AlgebraNode::join(AlgebraNode::bgp(vec![a.clone()]), AlgebraNode::bgp(vec![b.clone()])),
            vec![],
        );
        assert_eq!(node.patterns(), vec![a, b]);
    }

    #[test]
    fn test_group_output_variable() {
        assert_eq!(GroupCondition::var("g").output_variable(), Some(&Variable::new("g")));
        let computed = GroupCondition {
            expression: Expression::call(Function::Str, vec![Expression::var("g")]),
            alias: None,
        };
        assert_eq!(computed.output_variable(), None);
    }

    #[test]
    fn test_with_dataset_only_on_queries() {
        let clause = DatasetClause::named(Term::uri("http://example.org/g"));
        let query = AlgebraNode::ask(AlgebraNode::bgp(vec![])).with_dataset(vec![clause.clone()]);
        assert_eq!(query.dataset_clauses(), &[clause.clone()]);

        let bgp = AlgebraNode::bgp(vec![]).with_dataset(vec![clause]);
        assert!(bgp.dataset_clauses().is_empty());
    }
}
