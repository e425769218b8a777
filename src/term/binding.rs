//! Immutable solution bindings

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{Term, Variable};

/// An immutable mapping from variables to terms (one query solution)
///
/// Keys are kept in variable order, so equality and hashing are independent of
/// insertion order and the binding itself serves as a structural fingerprint.
/// Cloning is cheap; "modifying" operations return a new binding.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Binding {
    map: Arc<BTreeMap<Variable, Term>>,
}

impl Binding {
    /// Create an empty binding
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the term bound to a variable
    pub fn get(&self, var: &Variable) -> Option<&Term> {
        self.map.get(var)
    }

    /// Check whether a variable is bound
    pub fn contains(&self, var: &Variable) -> bool {
        self.map.contains_key(var)
    }

    /// Number of bound variables
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over `(variable, term)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.map.iter()
    }

    /// Iterate over the bound variables in canonical order
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.map.keys()
    }

    /// Return a binding with `var` set to `term`, replacing any previous value
    pub fn with(&self, var: Variable, term: Term) -> Binding {
        let mut map = (*self.map).clone();
        map.insert(var, term);
        Binding { map: Arc::new(map) }
    }

    /// Two bindings are compatible when they agree on every shared variable
    pub fn is_compatible(&self, other: &Binding) -> bool {
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small
            .iter()
            .all(|(var, term)| large.get(var).map(|t| t == term).unwrap_or(true))
    }

    /// Check whether the two bindings have at least one variable in common
    pub fn shares_variable(&self, other: &Binding) -> bool {
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small.variables().any(|var| large.contains(var))
    }

    /// Union of two compatible bindings, or `None` if they conflict
    pub fn merge(&self, other: &Binding) -> Option<Binding> {
        if !self.is_compatible(other) {
            return None;
        }
        if other.is_empty() {
            return Some(self.clone());
        }
        if self.is_empty() {
            return Some(other.clone());
        }
        let mut map = (*self.map).clone();
        for (var, term) in other.iter() {
            map.entry(var.clone()).or_insert_with(|| term.clone());
        }
        Some(Binding { map: Arc::new(map) })
    }

    /// Restrict the binding to the given variables
    pub fn project<'v>(&self, vars: impl IntoIterator<Item = &'v Variable>) -> Binding {
        vars.into_iter()
            .filter_map(|var| self.get(var).map(|term| (var.clone(), term.clone())))
            .collect()
    }
}

impl FromIterator<(Variable, Term)> for Binding {
    fn from_iter<I: IntoIterator<Item = (Variable, Term)>>(iter: I) -> Self {
        Binding {
            map: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, term)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", var, term)?;
        }
        write!(f, "}}")
    }
}
