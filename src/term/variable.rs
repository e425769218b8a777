//! Query variable representation

use std::fmt;

/// A SPARQL query variable (`?name`)
///
/// Variables order by name, which gives bindings their canonical key order.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: String,
}

impl Variable {
    /// Create a variable from its name (without the leading `?`)
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.strip_prefix('?').map(str::to_string).unwrap_or(name);
        Variable { name }
    }

    /// Get the variable name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_name() {
        let v = Variable::new("x");
        assert_eq!(v.name(), "x");
        assert_eq!(format!("{}", v), "?x");
    }

    #[test]
    fn test_leading_question_mark_is_stripped() {
        assert_eq!(Variable::new("?x"), Variable::new("x"));
    }

    #[test]
    fn test_variable_ordering() {
        let mut vars = vec![Variable::new("z"), Variable::new("a"), Variable::new("m")];
        vars.sort();
        let names: Vec<_> = vars.iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["a", "m", "z"]);
    }
}
