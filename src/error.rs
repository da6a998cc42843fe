// ABOUTME: Runtime error type for execution failures in the Jyro interpreter

use crate::diagnostics::{Diagnostic, MessageCode, Severity, Span, Stage};
use crate::value::{Value, ValueType};
use std::time::Duration;
use thiserror::Error;

/// What went wrong at runtime. Each variant maps onto one diagnostic code;
/// limiter breaches and cancellation get their own kinds so hosts can react
/// differently (e.g. retry after a timeout, never retry a type error).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecErrorKind {
    #[error("division by zero")]
    DivisionByZero,

    #[error("{0}")]
    TypeMismatch(String),

    #[error("index {index} out of range (length {length})")]
    IndexOutOfRange { index: i64, length: usize },

    #[error("cannot access '{0}' on null")]
    NullAccess(String),

    #[error("cannot iterate over a {0}")]
    NotIterable(&'static str),

    #[error("{function}: expected {expected} argument(s), got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{function}: argument {position} expects {expected}, got {actual}")]
    ArgumentType {
        function: String,
        position: usize,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{function}: {message}")]
    FunctionFailed { function: String, message: String },

    #[error("script '{0}' not found")]
    ScriptNotFound(String),

    #[error("statement limit of {0} exceeded")]
    StatementLimit(u64),

    #[error("loop iteration limit of {0} exceeded")]
    LoopLimit(u64),

    #[error("call depth limit of {0} exceeded")]
    CallDepthLimit(u32),

    #[error("script call depth limit of {0} exceeded")]
    ScriptCallDepthLimit(u32),

    #[error("execution time limit exceeded after {0:?}")]
    TimeLimit(Duration),

    #[error("execution cancelled by host")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

/// A runtime error plus the source position of the node that raised it. The
/// span is attached by the interpreter as the error unwinds, so deep helpers
/// (value operators, the limiter) stay position-free.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecError {
    pub kind: ExecErrorKind,
    pub span: Option<Span>,
}

impl ExecError {
    pub fn new(kind: ExecErrorKind) -> Self {
        ExecError { kind, span: None }
    }

    /// Attaches a span if none is set yet. The innermost position wins.
    pub fn at(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn division_by_zero() -> Self {
        ExecError::new(ExecErrorKind::DivisionByZero)
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        ExecError::new(ExecErrorKind::TypeMismatch(message.into()))
    }

    pub fn binary_type(op: &str, left: &Value, right: &Value) -> Self {
        ExecError::type_mismatch(format!(
            "operator '{}' cannot be applied to {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))
    }

    pub fn unary_type(op: &str, operand: &Value) -> Self {
        ExecError::type_mismatch(format!(
            "operator '{}' cannot be applied to {}",
            op,
            operand.type_name()
        ))
    }

    pub fn coercion(value: &Value, target: ValueType) -> Self {
        ExecError::type_mismatch(format!(
            "cannot convert {} to {}",
            value.type_name(),
            target.name()
        ))
    }

    pub fn index_out_of_range(index: i64, length: usize) -> Self {
        ExecError::new(ExecErrorKind::IndexOutOfRange { index, length })
    }

    pub fn null_access(segment: impl Into<String>) -> Self {
        ExecError::new(ExecErrorKind::NullAccess(segment.into()))
    }

    pub fn not_iterable(type_name: &'static str) -> Self {
        ExecError::new(ExecErrorKind::NotIterable(type_name))
    }

    pub fn function_failed(function: &str, message: impl Into<String>) -> Self {
        ExecError::new(ExecErrorKind::FunctionFailed {
            function: function.to_string(),
            message: message.into(),
        })
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ExecError::new(ExecErrorKind::Internal(message.into()))
    }

    /// Converts into the single diagnostic the interpreter reports for an
    /// unwound runtime error.
    pub fn into_diagnostic(self) -> Diagnostic {
        let span = self.span.unwrap_or_default();
        let (code, args) = match self.kind {
            ExecErrorKind::DivisionByZero => (MessageCode::DivisionByZero, vec![]),
            ExecErrorKind::TypeMismatch(msg) => (MessageCode::TypeMismatch, vec![msg]),
            ExecErrorKind::IndexOutOfRange { index, length } => (
                MessageCode::IndexOutOfRange,
                vec![index.to_string(), length.to_string()],
            ),
            ExecErrorKind::NullAccess(segment) => (MessageCode::NullAccess, vec![segment]),
            ExecErrorKind::NotIterable(name) => (MessageCode::NotIterable, vec![name.to_string()]),
            ExecErrorKind::ArgumentCount {
                function,
                expected,
                actual,
            } => (
                MessageCode::ArgumentCount,
                vec![function, expected, actual.to_string()],
            ),
            ExecErrorKind::ArgumentType {
                function,
                position,
                expected,
                actual,
            } => (
                MessageCode::ArgumentType,
                vec![
                    function,
                    position.to_string(),
                    expected.to_string(),
                    actual.to_string(),
                ],
            ),
            ExecErrorKind::FunctionFailed { function, message } => {
                (MessageCode::FunctionFailed, vec![function, message])
            }
            ExecErrorKind::ScriptNotFound(name) => (MessageCode::ScriptNotFound, vec![name]),
            ExecErrorKind::StatementLimit(n) => {
                (MessageCode::StatementLimitExceeded, vec![n.to_string()])
            }
            ExecErrorKind::LoopLimit(n) => (MessageCode::LoopLimitExceeded, vec![n.to_string()]),
            ExecErrorKind::CallDepthLimit(n) => {
                (MessageCode::CallDepthExceeded, vec![n.to_string()])
            }
            ExecErrorKind::ScriptCallDepthLimit(n) => {
                (MessageCode::ScriptCallDepthExceeded, vec![n.to_string()])
            }
            ExecErrorKind::TimeLimit(elapsed) => (
                MessageCode::TimeLimitExceeded,
                vec![format!("{:?}", elapsed)],
            ),
            ExecErrorKind::Cancelled => (MessageCode::CancelledByHost, vec![]),
            ExecErrorKind::Internal(msg) => (MessageCode::InternalError, vec![msg]),
        };
        Diagnostic::new(code, Severity::Error, Stage::Execution, span, args)
    }
}

impl std::fmt::Display for ExecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for ExecError {}

impl From<ExecErrorKind> for ExecError {
    fn from(kind: ExecErrorKind) -> Self {
        ExecError::new(kind)
    }
}
