//! Literal value representation

use std::cmp::Ordering;
use std::fmt;

use crate::core::ns;

/// Datatype for a literal
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Datatype {
    /// Plain literal (no datatype)
    Plain,
    /// Language-tagged literal
    Language(String),
    /// Typed literal with datatype URI
    Typed(String),
}

/// An RDF literal value
///
/// Equality is structural: `"1"^^xsd:integer` and `"1.0"^^xsd:decimal` are different literals
/// even though they compare equal by value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    value: String,
    datatype: Datatype,
}

impl Literal {
    /// Create a plain literal
    pub fn plain(value: String) -> Self {
        Literal {
            value,
            datatype: Datatype::Plain,
        }
    }

    /// Create a typed literal
    pub fn typed(value: String, datatype: String) -> Self {
        Literal {
            value,
            datatype: Datatype::Typed(datatype),
        }
    }

    /// Create a language-tagged literal
    pub fn with_language(value: String, lang: String) -> Self {
        Literal {
            value,
            datatype: Datatype::Language(lang.to_lowercase()),
        }
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the datatype
    pub fn datatype(&self) -> &Datatype {
        &self.datatype
    }

    /// Check if this is a plain literal
    pub fn is_plain(&self) -> bool {
        matches!(self.datatype, Datatype::Plain)
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        match &self.datatype {
            Datatype::Language(lang) => Some(lang),
            _ => None,
        }
    }

    /// Get the datatype URI if present
    pub fn datatype_uri(&self) -> Option<&str> {
        match &self.datatype {
            Datatype::Typed(uri) => Some(uri),
            _ => None,
        }
    }

    /// Check whether the datatype is one of the XSD numeric types
    pub fn is_numeric(&self) -> bool {
        self.datatype_uri().map(ns::is_numeric_datatype).unwrap_or(false)
    }

    /// Check whether this is an `xsd:string` or a plain literal
    pub fn is_string(&self) -> bool {
        match &self.datatype {
            Datatype::Plain => true,
            Datatype::Typed(dt) => dt == ns::XSD_STRING,
            Datatype::Language(_) => false,
        }
    }

    /// Numeric value of an XSD numeric literal
    pub fn numeric_value(&self) -> Option<f64> {
        if self.is_numeric() {
            self.value.trim().parse().ok()
        } else {
            None
        }
    }

    /// Try to parse as an integer
    pub fn as_integer(&self) -> Option<i64> {
        self.value.parse().ok()
    }

    /// Try to parse as a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self.value.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    /// Order two literals by natural value
    ///
    /// Literals with a numeric value sort before all others and compare by
    /// number among themselves. Ties, and everything non-numeric, fall back
    /// to the lexical form, then language tag, then datatype.
    pub fn natural_cmp(&self, other: &Literal) -> Ordering {
        let by_value = match (self.numeric_value(), other.numeric_value()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_value
            .then_with(|| self.value.cmp(&other.value))
            .then_with(|| self.language().cmp(&other.language()))
            .then_with(|| self.datatype_uri().cmp(&other.datatype_uri()))
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let escaped = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        match &self.datatype {
            Datatype::Plain => write!(f, "\"{}\"", escaped),
            Datatype::Language(lang) => write!(f, "\"{}\"@{}", escaped, lang),
            Datatype::Typed(dt) => write!(f, "\"{}\"^^<{}>", escaped, dt),
        }
    }
}
