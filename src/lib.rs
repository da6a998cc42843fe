// ABOUTME: Library surface of the Jyro scripting engine

pub mod ast;
pub mod builtins;
pub mod cancel;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
mod eval;
pub mod functions;
pub mod help;
pub mod highlighter;
pub mod lexer;
pub mod limiter;
pub mod linker;
pub mod parser;
pub mod resolver;
pub mod scope;
pub mod signature;
pub mod validator;
pub mod value;

pub use cancel::CancellationToken;
pub use config::{ExecutionOptions, NetworkConfig};
pub use diagnostics::{
    DefaultMessageProvider, Diagnostic, MessageCode, MessageProvider, Severity, Span, Stage,
};
pub use engine::{Engine, ExecutionMetadata, ExecutionResult};
pub use error::{ExecError, ExecErrorKind};
pub use functions::{FunctionContext, FunctionRegistry, FunctionTable, JyroFunction};
pub use linker::LinkedProgram;
pub use resolver::{DirScriptResolver, InMemoryScriptResolver, ScriptResolver};
pub use signature::{FunctionSignature, Parameter};
pub use value::{Value, ValueType};
