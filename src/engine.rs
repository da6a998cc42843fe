// ABOUTME: Engine tying the pipeline together: parse, validate, link, execute

use crate::cancel::CancellationToken;
use crate::config::ExecutionOptions;
use crate::diagnostics::{Diagnostic, MessageProvider};
use crate::eval::Interpreter;
use crate::functions::{FunctionRegistry, JyroFunction};
use crate::limiter::ResourceLimiter;
use crate::linker::{self, LinkedProgram};
use crate::resolver::ScriptResolver;
use crate::validator;
use crate::value::Value;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Counters observed during one execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionMetadata {
    pub elapsed: Duration,
    pub statements_executed: u64,
    pub loop_iterations: u64,
    pub function_calls: u64,
    pub max_call_depth: u32,
}

/// Outcome of one `execute` call: the (possibly mutated) root, every
/// diagnostic from every stage that ran, and the metrics. `success` is false
/// iff any diagnostic has Error severity.
#[derive(Debug)]
pub struct ExecutionResult {
    pub success: bool,
    pub data: Value,
    pub diagnostics: Vec<Diagnostic>,
    pub metadata: ExecutionMetadata,
}

impl ExecutionResult {
    fn failed(data: Value, diagnostics: Vec<Diagnostic>) -> Self {
        ExecutionResult {
            success: false,
            data,
            diagnostics,
            metadata: ExecutionMetadata::default(),
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Renders every diagnostic through a message provider, in order.
    pub fn format_diagnostics(&self, provider: &dyn MessageProvider) -> Vec<String> {
        self.diagnostics.iter().map(|d| provider.format(d)).collect()
    }
}

/// The embeddable engine. Holds the function registry, execution options,
/// and the optional script resolver; stateless across `execute` calls, so
/// one engine may serve many executions (concurrently, if the host wants:
/// every call owns its scope stack, limiter, and diagnostics).
pub struct Engine {
    registry: FunctionRegistry,
    options: ExecutionOptions,
    resolver: Option<Arc<dyn ScriptResolver>>,
}

impl Engine {
    /// An engine with the bundled standard library registered.
    pub fn new() -> Self {
        let mut registry = FunctionRegistry::new();
        crate::builtins::register_builtins(&mut registry);
        Engine {
            registry,
            options: ExecutionOptions::default(),
            resolver: None,
        }
    }

    /// An engine with no functions at all; hosts add their own catalog.
    pub fn empty() -> Self {
        Engine {
            registry: FunctionRegistry::new(),
            options: ExecutionOptions::default(),
            resolver: None,
        }
    }

    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ScriptResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn register_function(&mut self, function: Arc<dyn JyroFunction>) -> &mut Self {
        self.registry.register(function);
        self
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Runs the front half of the pipeline: lex, parse, validate, link.
    /// A failed stage short-circuits the rest and returns its diagnostics;
    /// success still carries any warnings inside the linked program.
    pub fn compile(&self, source: &str) -> Result<LinkedProgram, Vec<Diagnostic>> {
        let program = crate::parser::parse(source).map_err(|d| vec![d])?;

        let validation = validator::validate(&program);
        if validation.iter().any(Diagnostic::is_error) {
            return Err(validation);
        }

        match linker::link(program, &self.registry) {
            Ok(mut linked) => {
                // Validation warnings ride along with linking warnings.
                let mut diagnostics = validation;
                diagnostics.append(&mut linked.diagnostics);
                linked.diagnostics = diagnostics;
                Ok(linked)
            }
            Err(mut link_diagnostics) => {
                let mut diagnostics = validation;
                diagnostics.append(&mut link_diagnostics);
                Err(diagnostics)
            }
        }
    }

    /// One-shot: compile and run with a fresh (never-cancelled) token.
    pub fn execute(&self, source: &str, data: Value) -> ExecutionResult {
        self.execute_with_cancellation(source, data, &CancellationToken::new())
    }

    pub fn execute_with_cancellation(
        &self,
        source: &str,
        data: Value,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        match self.compile(source) {
            Ok(linked) => self.run(&linked, data, cancel),
            Err(diagnostics) => ExecutionResult::failed(data, diagnostics),
        }
    }

    /// Executes an already linked program. The program is immutable and may
    /// be shared across concurrent `run` calls.
    pub fn run(
        &self,
        linked: &LinkedProgram,
        mut data: Value,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let mut diagnostics = linked.diagnostics.clone();
        let mut limiter = ResourceLimiter::new(&self.options);
        let run_result = {
            let mut interpreter = Interpreter::new(
                &linked.functions,
                &mut data,
                &mut limiter,
                cancel,
                self.resolver.as_deref(),
            );
            interpreter.run(&linked.program)
        };
        if let Err(error) = run_result {
            diagnostics.push(error.into_diagnostic());
        }

        let metadata = ExecutionMetadata {
            elapsed: limiter.elapsed(),
            statements_executed: limiter.statements(),
            loop_iterations: limiter.loop_iterations(),
            function_calls: limiter.function_calls(),
            max_call_depth: limiter.max_observed_call_depth(),
        };
        let success = !diagnostics.iter().any(Diagnostic::is_error);
        ExecutionResult {
            success,
            data,
            diagnostics,
            metadata,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{MessageCode, Stage};

    fn empty_object() -> Value {
        Value::Object(indexmap::IndexMap::new())
    }

    #[test]
    fn test_pipeline_short_circuits_on_validation_error() {
        let engine = Engine::empty();
        let result = engine.execute("Data.x = y", empty_object());
        assert!(!result.success);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].stage, Stage::Validation);
        // Data untouched.
        assert_eq!(result.data, empty_object());
    }

    #[test]
    fn test_compile_then_run_twice_is_deterministic() {
        let engine = Engine::empty();
        let linked = engine
            .compile("var n = 2 Data.out = n * 21")
            .expect("compile");
        let cancel = CancellationToken::new();
        let a = engine.run(&linked, empty_object(), &cancel);
        let b = engine.run(&linked, empty_object(), &cancel);
        assert!(a.success && b.success);
        assert_eq!(a.data, b.data);
        assert_eq!(a.metadata.statements_executed, b.metadata.statements_executed);
    }

    #[test]
    fn test_runtime_error_preserves_partial_mutation() {
        let engine = Engine::empty();
        let result = engine.execute("Data.before = 1 Data.after = 10 / 0", empty_object());
        assert!(!result.success);
        let Value::Object(map) = &result.data else { panic!("not object") };
        assert!(map.contains_key("before"));
        assert!(!map.contains_key("after"));
        assert_eq!(result.diagnostics[0].code, MessageCode::DivisionByZero);
    }

    #[test]
    fn test_metadata_counts_statements() {
        let engine = Engine::empty();
        let result = engine.execute("var a = 1 var b = 2 Data.c = a + b", empty_object());
        assert!(result.success);
        assert_eq!(result.metadata.statements_executed, 3);
    }

    #[test]
    fn test_pre_cancelled_token() {
        let engine = Engine::empty();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = engine.execute_with_cancellation("Data.x = 1", empty_object(), &cancel);
        assert!(!result.success);
        assert_eq!(result.diagnostics[0].code, MessageCode::CancelledByHost);
    }
}
