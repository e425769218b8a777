//! Core abstractions and common definitions for cwm-algebra
//!
//! This module provides:
//! - `traits`: Collaborator traits (Graph, Dataset, ExpressionEvaluator, ...)
//! - `namespaces`: Standard RDF/XSD namespace URI constants

pub mod traits;
pub mod namespaces;

pub use traits::*;
pub use namespaces::ns;
