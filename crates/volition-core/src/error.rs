//! Diagnostics shared by the expression and behaviour-tree compilers and VMs.
//!
//! Every failure carries a category, a code and a human-readable message.
//! Compilation is fail-first per expression but tree builds accumulate
//! diagnostics across nodes, so the report type supports merging.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Internal,
    Syntax,
    TypeCheck,
    Identifier,
    Math,
    Const,
    /// Behaviour-tree specific: a condition compiled to the wrong type.
    ExpressionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InternalError,
    SyntaxError,
    IdentifierNotFound,
    ArithmeticTypeError,
    ComparisonTypeError,
    LogicTypeError,
    DivideByZero,
    ConstNameExpression,
    ConditionTypeNotBool,
}

/// A single categorised failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Diagnostic {
    pub category: ErrorCategory,
    pub code: ErrorCode,
    pub message: String,
}

/// An ordered collection of diagnostics.
///
/// Returned as the error half of compile results and exposed by evaluators
/// after a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: ErrorCategory, code: ErrorCode, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            category,
            code,
            message: message.into(),
        });
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Append every diagnostic from `other`, preserving order.
    pub fn combine(&mut self, other: &ErrorReport) {
        self.diagnostics.extend(other.diagnostics.iter().cloned());
    }

    pub fn reset(&mut self) {
        self.diagnostics.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn first(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn contains_code(&self, code: ErrorCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diagnostics.as_slice() {
            [] => f.write_str("no errors"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (+{} more)", rest.len()),
        }
    }
}

impl std::error::Error for ErrorReport {}
