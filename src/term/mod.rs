//! RDF term and solution representations
//!
//! This module defines the core data types the evaluator works on:
//! - URIs (named nodes)
//! - Literals (with optional datatype or language tag)
//! - Blank nodes (anonymous nodes)
//! - Variables (placeholders in patterns)
//! - Bindings (immutable variable-to-term solutions)

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

pub mod uri;
mod literal;
mod blank;
mod variable;
mod binding;

pub use uri::Uri;
pub use literal::{Literal, Datatype};
pub use blank::BlankNode;
pub use variable::Variable;
pub use binding::Binding;

use crate::core::ns;

/// A term in RDF, or a variable in pattern position
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A URI reference (named node)
    Uri(Arc<Uri>),
    /// A literal value
    Literal(Arc<Literal>),
    /// A blank node (anonymous)
    BlankNode(BlankNode),
    /// A variable (for patterns)
    Variable(Variable),
}

impl Term {
    /// Create a URI term
    pub fn uri(s: impl Into<String>) -> Self {
        Term::Uri(Arc::new(Uri::new(s.into())))
    }

    /// Create a plain literal
    pub fn literal(s: impl Into<String>) -> Self {
        Term::Literal(Arc::new(Literal::plain(s.into())))
    }

    /// Create a typed literal
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal(Arc::new(Literal::typed(value.into(), datatype.into())))
    }

    /// Create a language-tagged literal
    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Term::Literal(Arc::new(Literal::with_language(value.into(), lang.into())))
    }

    /// Create an `xsd:integer` literal
    pub fn integer(value: i64) -> Self {
        Term::typed_literal(value.to_string(), ns::XSD_INTEGER)
    }

    /// Create an `xsd:decimal` literal
    pub fn decimal(value: f64) -> Self {
        let lexical = if value.fract() == 0.0 && value.is_finite() {
            format!("{:.1}", value)
        } else {
            value.to_string()
        };
        Term::typed_literal(lexical, ns::XSD_DECIMAL)
    }

    /// Create an `xsd:boolean` literal
    pub fn boolean(value: bool) -> Self {
        Term::typed_literal(value.to_string(), ns::XSD_BOOLEAN)
    }

    /// Create a blank node with a label
    pub fn blank(label: impl Into<String>) -> Self {
        Term::BlankNode(BlankNode::labeled(label.into()))
    }

    /// Create a fresh blank node
    pub fn fresh_blank() -> Self {
        Term::BlankNode(BlankNode::fresh())
    }

    /// Create a variable
    pub fn variable(name: impl Into<String>) -> Self {
        Term::Variable(Variable::new(name))
    }

    /// Check if this term is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Check if this term is ground (not a variable)
    pub fn is_ground(&self) -> bool {
        !self.is_variable()
    }

    /// Get the URI if this is a URI term
    pub fn as_uri(&self) -> Option<&Uri> {
        match self {
            Term::Uri(u) => Some(u),
            _ => None,
        }
    }

    /// Get the literal if this is a literal term
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Get the variable if this is a variable term
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Term::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Rank of the term kind in the universal order
    fn kind_rank(&self) -> u8 {
        match self {
            Term::Variable(_) => 0,
            Term::BlankNode(_) => 1,
            Term::Uri(_) => 2,
            Term::Literal(_) => 3,
        }
    }

    /// Universal term order: Variable < BlankNode < Uri < Literal
    ///
    /// Terms of the same kind compare by natural value. This is a sort order,
    /// not an equality: numerically equal literals of different datatypes
    /// may still be distinct terms.
    pub fn universal_cmp(&self, other: &Term) -> Ordering {
        match (self, other) {
            (Term::Variable(a), Term::Variable(b)) => a.cmp(b),
            (Term::BlankNode(a), Term::BlankNode(b)) => a.cmp(b),
            (Term::Uri(a), Term::Uri(b)) => a.cmp(b),
            (Term::Literal(a), Term::Literal(b)) => a.natural_cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Uri(u) => write!(f, "{}", u),
            Term::Literal(l) => write!(f, "{}", l),
            Term::BlankNode(b) => write!(f, "{}", b),
            Term::Variable(v) => write!(f, "{}", v),
        }
    }
}

impl From<Variable> for Term {
    fn from(v: Variable) -> Self {
        Term::Variable(v)
    }
}

/// A triple (statement) in RDF
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Triple { subject, predicate, object }
    }

    /// Check if this triple contains any variables
    pub fn has_variables(&self) -> bool {
        self.subject.is_variable() || self.predicate.is_variable() || self.object.is_variable()
    }

    /// Check if this triple is ground (no variables)
    pub fn is_ground(&self) -> bool {
        !self.has_variables()
    }
}

impl fmt::Debug for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?} {:?} .", self.subject, self.predicate, self.object)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// Apply a binding to a term, substituting a bound variable
pub fn substitute(term: &Term, binding: &Binding) -> Term {
    match term {
        Term::Variable(v) => binding.get(v).cloned().unwrap_or_else(|| term.clone()),
        _ => term.clone(),
    }
}

/// Apply a binding to a triple
pub fn substitute_triple(triple: &Triple, binding: &Binding) -> Triple {
    Triple {
        subject: substitute(&triple.subject, binding),
        predicate: substitute(&triple.predicate, binding),
        object: substitute(&triple.object, binding),
    }
}
