//! String manipulation functions
//!
//! - Measurement: Length (also counts arrays and objects)
//! - Transformation: Upper, Lower, Trim, Replace, Substring
//! - Splitting and joining: Split, Join
//! - Predicates: Contains, StartsWith, EndsWith

use super::{arr_arg, define_function, opt_num_arg, str_arg, BuiltinModule};
use crate::error::ExecError;
use crate::functions::FunctionRegistry;
use crate::signature::Parameter;
use crate::value::{Value, ValueType};
use std::sync::Arc;

define_function! {
    length,
    name: "Length",
    params: [Parameter::required_any("value")],
    returns: Some(ValueType::Number),
    doc: "Length of a string (in characters), array, or object.",
    |args: &[Value], _ctx: &mut _| {
        let n = match &args[0] {
            Value::String(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            other => {
                return Err(ExecError::function_failed(
                    "Length",
                    format!("expected a string, array, or object, got {}", other.type_name()),
                ));
            }
        };
        Ok(Value::Number(n as f64))
    }
}

define_function! {
    upper,
    name: "Upper",
    params: [Parameter::required("text", ValueType::String)],
    returns: Some(ValueType::String),
    doc: "Uppercases a string.",
    |args: &[Value], _ctx: &mut _| {
        Ok(Value::String(str_arg("Upper", args, 0)?.to_uppercase()))
    }
}

define_function! {
    lower,
    name: "Lower",
    params: [Parameter::required("text", ValueType::String)],
    returns: Some(ValueType::String),
    doc: "Lowercases a string.",
    |args: &[Value], _ctx: &mut _| {
        Ok(Value::String(str_arg("Lower", args, 0)?.to_lowercase()))
    }
}

define_function! {
    trim,
    name: "Trim",
    params: [Parameter::required("text", ValueType::String)],
    returns: Some(ValueType::String),
    doc: "Removes leading and trailing whitespace.",
    |args: &[Value], _ctx: &mut _| {
        Ok(Value::String(str_arg("Trim", args, 0)?.trim().to_string()))
    }
}

define_function! {
    replace,
    name: "Replace",
    params: [
        Parameter::required("text", ValueType::String),
        Parameter::required("find", ValueType::String),
        Parameter::required("replacement", ValueType::String),
    ],
    returns: Some(ValueType::String),
    doc: "Replaces every occurrence of a substring.",
    |args: &[Value], _ctx: &mut _| {
        let text = str_arg("Replace", args, 0)?;
        let find = str_arg("Replace", args, 1)?;
        let replacement = str_arg("Replace", args, 2)?;
        Ok(Value::String(text.replace(find, replacement)))
    }
}

define_function! {
    split,
    name: "Split",
    params: [
        Parameter::required("text", ValueType::String),
        Parameter::required("separator", ValueType::String),
    ],
    returns: Some(ValueType::Array),
    doc: "Splits a string by a separator; an empty separator splits into characters.",
    |args: &[Value], _ctx: &mut _| {
        let text = str_arg("Split", args, 0)?;
        let separator = str_arg("Split", args, 1)?;
        let parts: Vec<Value> = if separator.is_empty() {
            text.chars().map(|c| Value::String(c.to_string())).collect()
        } else {
            text.split(separator)
                .map(|part| Value::String(part.to_string()))
                .collect()
        };
        Ok(Value::Array(parts))
    }
}

define_function! {
    join,
    name: "Join",
    params: [
        Parameter::required("items", ValueType::Array),
        Parameter::required("separator", ValueType::String),
    ],
    returns: Some(ValueType::String),
    doc: "Joins array elements with a separator, stringifying each element.",
    |args: &[Value], _ctx: &mut _| {
        let items = arr_arg("Join", args, 0)?;
        let separator = str_arg("Join", args, 1)?;
        let parts: Vec<String> = items.iter().map(Value::to_display_string).collect();
        Ok(Value::String(parts.join(separator)))
    }
}

define_function! {
    contains,
    name: "Contains",
    params: [
        Parameter::required_any("haystack"),
        Parameter::required_any("needle"),
    ],
    returns: Some(ValueType::Boolean),
    doc: "Substring test for strings, element test for arrays, key test for objects.",
    |args: &[Value], _ctx: &mut _| {
        let found = match (&args[0], &args[1]) {
            (Value::String(text), Value::String(needle)) => text.contains(needle.as_str()),
            (Value::Array(items), needle) => items.iter().any(|item| item.equals(needle)),
            (Value::Object(map), Value::String(key)) => map.contains_key(key),
            (haystack, _) => {
                return Err(ExecError::function_failed(
                    "Contains",
                    format!("cannot search a {}", haystack.type_name()),
                ));
            }
        };
        Ok(Value::Boolean(found))
    }
}

define_function! {
    starts_with,
    name: "StartsWith",
    params: [
        Parameter::required("text", ValueType::String),
        Parameter::required("prefix", ValueType::String),
    ],
    returns: Some(ValueType::Boolean),
    doc: "Whether a string starts with a prefix.",
    |args: &[Value], _ctx: &mut _| {
        let text = str_arg("StartsWith", args, 0)?;
        let prefix = str_arg("StartsWith", args, 1)?;
        Ok(Value::Boolean(text.starts_with(prefix)))
    }
}

define_function! {
    ends_with,
    name: "EndsWith",
    params: [
        Parameter::required("text", ValueType::String),
        Parameter::required("suffix", ValueType::String),
    ],
    returns: Some(ValueType::Boolean),
    doc: "Whether a string ends with a suffix.",
    |args: &[Value], _ctx: &mut _| {
        let text = str_arg("EndsWith", args, 0)?;
        let suffix = str_arg("EndsWith", args, 1)?;
        Ok(Value::Boolean(text.ends_with(suffix)))
    }
}

define_function! {
    substring,
    name: "Substring",
    params: [
        Parameter::required("text", ValueType::String),
        Parameter::required("start", ValueType::Number),
        Parameter::optional("length", ValueType::Number),
    ],
    returns: Some(ValueType::String),
    doc: "Character-based substring; start past the end yields an empty string.",
    |args: &[Value], _ctx: &mut _| {
        let text = str_arg("Substring", args, 0)?;
        let start = super::num_arg("Substring", args, 1)?;
        if start < 0.0 || start.fract() != 0.0 {
            return Err(ExecError::function_failed(
                "Substring",
                format!("start {} is not a non-negative integer", start),
            ));
        }
        let length = match opt_num_arg("Substring", args, 2)? {
            Some(n) if n < 0.0 || n.fract() != 0.0 => {
                return Err(ExecError::function_failed(
                    "Substring",
                    format!("length {} is not a non-negative integer", n),
                ));
            }
            Some(n) => n as usize,
            None => usize::MAX,
        };
        let result: String = text.chars().skip(start as usize).take(length).collect();
        Ok(Value::String(result))
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Arc::new(LengthFunction));
    registry.register(Arc::new(UpperFunction));
    registry.register(Arc::new(LowerFunction));
    registry.register(Arc::new(TrimFunction));
    registry.register(Arc::new(ReplaceFunction));
    registry.register(Arc::new(SplitFunction));
    registry.register(Arc::new(JoinFunction));
    registry.register(Arc::new(ContainsFunction));
    registry.register(Arc::new(StartsWithFunction));
    registry.register(Arc::new(EndsWithFunction));
    registry.register(Arc::new(SubstringFunction));
}

inventory::submit! {
    BuiltinModule {
        name: "strings",
        register,
    }
}
