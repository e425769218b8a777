//! Structured Error Handling for cwm-algebra
//!
//! Provides a unified error type with:
//! - Error codes for programmatic handling
//! - Structured, JSON-friendly error values
//! - Context preservation through error chains
//!
//! # Error Categories
//!
//! - Evaluation errors - unsupported constructs, graph-scope violations, malformed algebra
//! - Dataset errors - dataset clauses naming unknown sources
//! - Config errors - configuration loading and validation
//!
//! Binding conflicts and expression failures are *not* surfaced through this type
//! during evaluation: they are recovered locally by the operator that hit them.
//!
//! # Example
//!
//! ```rust,ignore
//! use cwm_algebra::error::{CwmError, ErrorCode};
//!
//! fn check(node: &AlgebraNode) -> Result<(), CwmError> {
//!     Err(CwmError::unsupported("SERVICE")
//!         .with_context("node", node.name()))
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::sparql::ExprError;

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Evaluation errors (2xxx)
    /// Algebra node kind with no handler (SERVICE, DESCRIBE, ...)
    UnsupportedConstruct = 2001,
    /// GRAPH or dataset clause against a store without named graphs
    GraphScope = 2002,
    /// Structurally invalid algebra tree
    InvalidAlgebra = 2003,
    /// Expression evaluation failed outside a recoverable position
    ExpressionError = 2004,

    // Dataset errors (3xxx)
    /// No source registered for a dataset clause
    SourceNotFound = 3002,

    // Config errors (7xxx)
    /// Generic config error
    ConfigError = 7000,
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,
    /// Invalid config value
    InvalidConfigValue = 7003,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UnsupportedConstruct => "Unsupported algebra construct",
            ErrorCode::GraphScope => "Graph scope not supported by store",
            ErrorCode::InvalidAlgebra => "Invalid algebra tree",
            ErrorCode::ExpressionError => "Expression evaluation failed",

            ErrorCode::SourceNotFound => "Dataset source not found",

            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",
            ErrorCode::InvalidConfigValue => "Invalid configuration value",

            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Whether this error aborts a whole query evaluation
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorCode::UnsupportedConstruct | ErrorCode::GraphScope | ErrorCode::InvalidAlgebra
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Source location (file:line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for cwm-algebra
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CwmError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CwmError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    /// Create an unsupported-construct error naming the construct
    pub fn unsupported(construct: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedConstruct,
            format!("{} is not supported by the evaluator", construct),
        )
        .with_context("construct", construct)
    }

    /// Create a graph-scope error
    pub fn graph_scope(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GraphScope, message)
            .with_hint("Evaluate against a dataset with named-graph support, or drop the GRAPH/FROM clause")
    }

    /// Create an invalid-algebra error
    pub fn invalid_algebra(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAlgebra, message)
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add source location
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.location = Some(location.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Whether this error aborts a whole query evaluation
    pub fn is_fatal(&self) -> bool {
        self.code.is_fatal()
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }
}

impl fmt::Display for CwmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if let Some(ref loc) = ctx.location {
                write!(f, " at {}", loc)?;
            }
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for CwmError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<std::io::Error> for CwmError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::ConfigNotFound,
            _ => ErrorCode::InternalError,
        };
        CwmError::new(code, err.to_string())
    }
}

impl From<toml::de::Error> for CwmError {
    fn from(err: toml::de::Error) -> Self {
        CwmError::config(err.to_string())
            .with_code(ErrorCode::InvalidConfigSyntax)
    }
}

impl From<ConfigError> for CwmError {
    fn from(err: ConfigError) -> Self {
        let code = match err {
            ConfigError::Parse(..) => ErrorCode::InvalidConfigSyntax,
            ConfigError::InvalidValue(..) => ErrorCode::InvalidConfigValue,
            _ => ErrorCode::ConfigError,
        };
        CwmError::new(code, err.to_string())
    }
}

impl From<ExprError> for CwmError {
    fn from(err: ExprError) -> Self {
        CwmError::new(ErrorCode::ExpressionError, err.to_string())
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using CwmError
pub type CwmResult<T> = Result<T, CwmError>;

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Create a CwmError with context from the current location
#[macro_export]
macro_rules! cwm_error {
    ($code:expr, $msg:expr) => {
        $crate::error::CwmError::new($code, $msg)
            .at(format!("{}:{}", file!(), line!()))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::CwmError::new($code, format!($fmt, $($arg)*))
            .at(format!("{}:{}", file!(), line!()))
    };
}

/// Bail out early with an error
#[macro_export]
macro_rules! cwm_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::cwm_error!($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::cwm_error!($code, $fmt, $($arg)*))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! cwm_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::cwm_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::cwm_bail!($code, $fmt, $($arg)*);
        }
    };
}

// ============================================================================
// Tests
// ============================================================================
