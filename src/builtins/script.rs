//! Nested script invocation: CallScript
//!
//! `CallScript("name")` asks the engine's script resolver for source,
//! compiles it against the same function table, and runs it against the same
//! `Data` root inside the shared limiter's script-call bracket. The nested
//! script's own diagnostics are folded into a single runtime error naming
//! the script.

use super::{define_function, str_arg, BuiltinModule};
use crate::error::{ExecError, ExecErrorKind};
use crate::functions::{FunctionContext, FunctionRegistry};
use crate::signature::Parameter;
use crate::value::{Value, ValueType};
use std::sync::Arc;

define_function! {
    call_script,
    name: "CallScript",
    params: [Parameter::required("name", ValueType::String)],
    returns: Some(ValueType::Null),
    doc: "Runs a named script from the resolver against the current Data.",
    |args: &[Value], ctx: &mut FunctionContext<'_>| {
        let name = str_arg("CallScript", args, 0)?;

        let Some(resolver) = ctx.resolver else {
            return Err(ExecError::function_failed(
                "CallScript",
                "no script resolver is configured",
            ));
        };
        let Some(source) = resolver.resolve(name) else {
            return Err(ExecErrorKind::ScriptNotFound(name.to_string()).into());
        };

        ctx.limiter.enter_script_call()?;
        let outcome = crate::eval::run_nested_script(name, &source, ctx);
        ctx.limiter.exit_script_call();
        outcome?;
        Ok(Value::Null)
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Arc::new(CallScriptFunction));
}

inventory::submit! {
    BuiltinModule {
        name: "script",
        register,
    }
}
