// ABOUTME: Structured diagnostic records emitted by every pipeline stage

use serde::Serialize;
use std::fmt;

/// Source position, 1-based. Line 0 means "no position" (e.g. end of input
/// or an engine-level condition).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Self {
        Span { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Lexing,
    Parsing,
    Validation,
    Linking,
    Execution,
}

/// Closed set of diagnostic codes. Message text lives in a
/// [`MessageProvider`] so hosts can localize it; the code plus `args` carry
/// everything a formatter needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageCode {
    // Lexing
    UnexpectedCharacter,
    UnterminatedString,
    InvalidEscape,
    InvalidNumber,
    // Parsing
    UnexpectedToken,
    UnexpectedEndOfInput,
    // Validation
    UndeclaredVariable,
    DuplicateDeclaration,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    InvalidAssignmentTarget,
    ShadowedFunctionName,
    // Linking
    UndefinedFunction,
    DuplicateFunction,
    // Execution
    DivisionByZero,
    TypeMismatch,
    IndexOutOfRange,
    NullAccess,
    NotIterable,
    ArgumentCount,
    ArgumentType,
    FunctionFailed,
    ScriptNotFound,
    StatementLimitExceeded,
    LoopLimitExceeded,
    CallDepthExceeded,
    ScriptCallDepthExceeded,
    TimeLimitExceeded,
    CancelledByHost,
    InternalError,
}

/// One structured message record: code, severity, originating stage, source
/// position, and the positional arguments for formatting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub code: MessageCode,
    pub severity: Severity,
    pub stage: Stage,
    pub line: u32,
    pub column: u32,
    pub args: Vec<String>,
}

impl Diagnostic {
    pub fn new(
        code: MessageCode,
        severity: Severity,
        stage: Stage,
        span: Span,
        args: Vec<String>,
    ) -> Self {
        Diagnostic {
            code,
            severity,
            stage,
            line: span.line,
            column: span.column,
            args,
        }
    }

    pub fn error(code: MessageCode, stage: Stage, span: Span, args: Vec<String>) -> Self {
        Diagnostic::new(code, Severity::Error, stage, span, args)
    }

    pub fn warning(code: MessageCode, stage: Stage, span: Span, args: Vec<String>) -> Self {
        Diagnostic::new(code, Severity::Warning, stage, span, args)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }
}

/// Formats diagnostics into human-readable text. Hosts install their own
/// provider through the execution options to localize messages.
pub trait MessageProvider: Send + Sync {
    fn format(&self, diagnostic: &Diagnostic) -> String;
}

/// Built-in English formatter.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMessageProvider;

impl MessageProvider for DefaultMessageProvider {
    fn format(&self, d: &Diagnostic) -> String {
        let arg = |i: usize| d.args.get(i).map(String::as_str).unwrap_or("?");
        let text = match d.code {
            MessageCode::UnexpectedCharacter => format!("unexpected character '{}'", arg(0)),
            MessageCode::UnterminatedString => "unterminated string literal".to_string(),
            MessageCode::InvalidEscape => format!("invalid escape sequence '\\{}'", arg(0)),
            MessageCode::InvalidNumber => format!("invalid number literal '{}'", arg(0)),
            MessageCode::UnexpectedToken => {
                format!("unexpected {}, expected {}", arg(0), arg(1))
            }
            MessageCode::UnexpectedEndOfInput => {
                format!("unexpected end of input, expected {}", arg(0))
            }
            MessageCode::UndeclaredVariable => format!("undeclared variable '{}'", arg(0)),
            MessageCode::DuplicateDeclaration => {
                format!("variable '{}' is already declared in this scope", arg(0))
            }
            MessageCode::BreakOutsideLoop => "'break' outside of a loop".to_string(),
            MessageCode::ContinueOutsideLoop => "'continue' outside of a loop".to_string(),
            MessageCode::InvalidAssignmentTarget => "invalid assignment target".to_string(),
            MessageCode::ShadowedFunctionName => format!(
                "call to '{}' ignores the local variable of the same name",
                arg(0)
            ),
            MessageCode::UndefinedFunction => format!("undefined function '{}'", arg(0)),
            MessageCode::DuplicateFunction => {
                format!("function '{}' registered more than once; last wins", arg(0))
            }
            MessageCode::DivisionByZero => "division by zero".to_string(),
            MessageCode::TypeMismatch => arg(0).to_string(),
            MessageCode::IndexOutOfRange => {
                format!("index {} out of range (length {})", arg(0), arg(1))
            }
            MessageCode::NullAccess => format!("cannot access '{}' on null", arg(0)),
            MessageCode::NotIterable => format!("cannot iterate over a {}", arg(0)),
            MessageCode::ArgumentCount => format!(
                "{}: expected {} argument(s), got {}",
                arg(0),
                arg(1),
                arg(2)
            ),
            MessageCode::ArgumentType => format!(
                "{}: argument {} expects {}, got {}",
                arg(0),
                arg(1),
                arg(2),
                arg(3)
            ),
            MessageCode::FunctionFailed => format!("{}: {}", arg(0), arg(1)),
            MessageCode::ScriptNotFound => format!("script '{}' not found", arg(0)),
            MessageCode::StatementLimitExceeded => {
                format!("statement limit of {} exceeded", arg(0))
            }
            MessageCode::LoopLimitExceeded => {
                format!("loop iteration limit of {} exceeded", arg(0))
            }
            MessageCode::CallDepthExceeded => format!("call depth limit of {} exceeded", arg(0)),
            MessageCode::ScriptCallDepthExceeded => {
                format!("script call depth limit of {} exceeded", arg(0))
            }
            MessageCode::TimeLimitExceeded => {
                format!("execution time limit exceeded after {}", arg(0))
            }
            MessageCode::CancelledByHost => "execution cancelled by host".to_string(),
            MessageCode::InternalError => format!("internal error: {}", arg(0)),
        };
        if d.line == 0 {
            format!("{:?} {:?}: {}", d.severity, d.stage, text)
        } else {
            format!(
                "{:?} {:?} at {}:{}: {}",
                d.severity, d.stage, d.line, d.column, text
            )
        }
    }
}
