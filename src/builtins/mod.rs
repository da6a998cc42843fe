//! # Standard Library
//!
//! Host functions bundled with the engine, organized by category:
//!
//! - **[strings]**: Length, Upper, Lower, Trim, Replace, Split, Join,
//!   Contains, StartsWith, EndsWith, Substring
//! - **[math]**: Abs, Min, Max, Round, Floor, Ceiling, Sqrt
//! - **[arrays]**: Append, Insert, RemoveAt, Sort, Reverse, IndexOf,
//!   First, Last
//! - **[objects]**: Keys, Values, HasKey, Remove, Merge
//! - **[types]**: TypeOf, IsNull, IsNumber, IsString, IsBoolean, IsArray,
//!   IsObject, ToNumber, ToString, ToBoolean, ParseJson, ToJson
//! - **[datetime]**: Now, Today, ParseDate, FormatDate, AddDays, DiffDays
//! - **[script]**: CallScript
//! - **[network]**: HttpGet — opt-in only, never registered by default
//!
//! Values are owned trees, so collection functions return new values instead
//! of mutating their arguments: `Data.items = Append(Data.items, x)`.
//!
//! Each category module registers itself through `inventory`; the engine
//! calls [`register_builtins`] once when it is constructed.

use crate::error::ExecError;
use crate::functions::FunctionRegistry;
use crate::value::Value;
use indexmap::IndexMap;

pub mod arrays;
pub mod datetime;
pub mod math;
pub mod network;
pub mod objects;
pub mod script;
pub mod strings;
pub mod types;

/// One self-registering builtin category.
pub struct BuiltinModule {
    pub name: &'static str,
    pub register: fn(&mut FunctionRegistry),
}

inventory::collect!(BuiltinModule);

/// Registers every collected builtin category. Modules are sorted by name so
/// registration order (and therefore duplicate-name resolution) stays
/// deterministic regardless of link order.
pub fn register_builtins(registry: &mut FunctionRegistry) {
    let mut modules: Vec<&BuiltinModule> = inventory::iter::<BuiltinModule>.into_iter().collect();
    modules.sort_by_key(|module| module.name);
    for module in modules {
        (module.register)(registry);
    }
}

/// Defines a unit struct implementing `JyroFunction` with a lazily built
/// signature and a closure body. Bodies run after signature validation, so
/// they match argument variants directly through the typed helpers below.
macro_rules! define_function {
    (
        $id:ident,
        name: $name:literal,
        params: [$($param:expr),* $(,)?],
        returns: $ret:expr,
        doc: $doc:literal,
        $body:expr
    ) => {
        paste::paste! {
            pub struct [<$id:camel Function>];

            impl crate::functions::JyroFunction for [<$id:camel Function>] {
                fn signature(&self) -> &crate::signature::FunctionSignature {
                    static SIGNATURE: std::sync::OnceLock<crate::signature::FunctionSignature> =
                        std::sync::OnceLock::new();
                    SIGNATURE.get_or_init(|| {
                        crate::signature::FunctionSignature::new($name, vec![$($param),*], $ret)
                            .with_description($doc)
                    })
                }

                fn execute(
                    &self,
                    args: &[crate::value::Value],
                    ctx: &mut crate::functions::FunctionContext<'_>,
                ) -> Result<crate::value::Value, crate::error::ExecError> {
                    ($body)(args, ctx)
                }
            }
        }
    };
}

pub(crate) use define_function;

// ============================================================================
// Typed argument accessors
// ============================================================================
//
// Signature validation has already matched variants, so a mismatch here is a
// bug in the signature, not in the script; the helpers fail loudly instead
// of panicking.

pub(crate) fn str_arg<'a>(name: &str, args: &'a [Value], idx: usize) -> Result<&'a str, ExecError> {
    match args.get(idx) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(ExecError::function_failed(
            name,
            format!("argument {} is not a string", idx + 1),
        )),
    }
}

pub(crate) fn num_arg(name: &str, args: &[Value], idx: usize) -> Result<f64, ExecError> {
    match args.get(idx) {
        Some(Value::Number(n)) => Ok(*n),
        _ => Err(ExecError::function_failed(
            name,
            format!("argument {} is not a number", idx + 1),
        )),
    }
}

pub(crate) fn arr_arg<'a>(
    name: &str,
    args: &'a [Value],
    idx: usize,
) -> Result<&'a Vec<Value>, ExecError> {
    match args.get(idx) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(ExecError::function_failed(
            name,
            format!("argument {} is not an array", idx + 1),
        )),
    }
}

pub(crate) fn obj_arg<'a>(
    name: &str,
    args: &'a [Value],
    idx: usize,
) -> Result<&'a IndexMap<String, Value>, ExecError> {
    match args.get(idx) {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(ExecError::function_failed(
            name,
            format!("argument {} is not an object", idx + 1),
        )),
    }
}

/// Optional numeric parameter: absent means `None`.
pub(crate) fn opt_num_arg(name: &str, args: &[Value], idx: usize) -> Result<Option<f64>, ExecError> {
    match args.get(idx) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(*n)),
        _ => Err(ExecError::function_failed(
            name,
            format!("argument {} is not a number", idx + 1),
        )),
    }
}

/// Validates an integral, in-range index argument.
pub(crate) fn index_arg(
    name: &str,
    args: &[Value],
    idx: usize,
    length: usize,
    allow_end: bool,
) -> Result<usize, ExecError> {
    let n = num_arg(name, args, idx)?;
    if n.fract() != 0.0 || n < 0.0 {
        return Err(ExecError::function_failed(
            name,
            format!("index {} is not a non-negative integer", n),
        ));
    }
    let position = n as usize;
    let in_range = if allow_end {
        position <= length
    } else {
        position < length
    };
    if !in_range {
        return Err(ExecError::function_failed(
            name,
            format!("index {} out of range (length {})", position, length),
        ));
    }
    Ok(position)
}
