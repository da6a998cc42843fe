//! Type inspection and conversion: TypeOf, Is* predicates, ToNumber,
//! ToString, ToBoolean, ParseJson, ToJson

use super::{define_function, str_arg, BuiltinModule};
use crate::error::ExecError;
use crate::functions::FunctionRegistry;
use crate::signature::Parameter;
use crate::value::{Value, ValueType};
use std::sync::Arc;

define_function! {
    type_of,
    name: "TypeOf",
    params: [Parameter::required_any("value")],
    returns: Some(ValueType::String),
    doc: "Type name of a value: null, boolean, number, string, array, or object.",
    |args: &[Value], _ctx: &mut _| {
        Ok(Value::String(args[0].type_name().to_string()))
    }
}

macro_rules! type_predicate {
    ($id:ident, $name:literal, $variant:pat, $doc:literal) => {
        define_function! {
            $id,
            name: $name,
            params: [Parameter::required_any("value")],
            returns: Some(ValueType::Boolean),
            doc: $doc,
            |args: &[Value], _ctx: &mut _| {
                Ok(Value::Boolean(matches!(&args[0], $variant)))
            }
        }
    };
}

type_predicate!(is_null, "IsNull", Value::Null, "Whether the value is null.");
type_predicate!(
    is_number,
    "IsNumber",
    Value::Number(_),
    "Whether the value is a number."
);
type_predicate!(
    is_string,
    "IsString",
    Value::String(_),
    "Whether the value is a string."
);
type_predicate!(
    is_boolean,
    "IsBoolean",
    Value::Boolean(_),
    "Whether the value is a boolean."
);
type_predicate!(
    is_array,
    "IsArray",
    Value::Array(_),
    "Whether the value is an array."
);
type_predicate!(
    is_object,
    "IsObject",
    Value::Object(_),
    "Whether the value is an object."
);

define_function! {
    to_number,
    name: "ToNumber",
    params: [Parameter::required_any("value")],
    returns: Some(ValueType::Number),
    doc: "Converts to a number: parses strings, maps booleans to 0/1, passes null through.",
    |args: &[Value], _ctx: &mut _| {
        args[0].clone().coerce_to(ValueType::Number)
    }
}

define_function! {
    to_string,
    name: "ToString",
    params: [Parameter::required_any("value")],
    returns: Some(ValueType::String),
    doc: "Stringifies a value the way concatenation does.",
    |args: &[Value], _ctx: &mut _| {
        Ok(Value::String(args[0].to_display_string()))
    }
}

define_function! {
    to_boolean,
    name: "ToBoolean",
    params: [Parameter::required_any("value")],
    returns: Some(ValueType::Boolean),
    doc: "Truthiness of a value as a boolean.",
    |args: &[Value], _ctx: &mut _| {
        Ok(Value::Boolean(args[0].is_truthy()))
    }
}

define_function! {
    parse_json,
    name: "ParseJson",
    params: [Parameter::required("text", ValueType::String)],
    returns: None,
    doc: "Parses a JSON document into a value.",
    |args: &[Value], _ctx: &mut _| {
        let text = str_arg("ParseJson", args, 0)?;
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(json) => Ok(Value::from_json(&json)),
            Err(err) => Err(ExecError::function_failed("ParseJson", err.to_string())),
        }
    }
}

define_function! {
    to_json,
    name: "ToJson",
    params: [Parameter::required_any("value")],
    returns: Some(ValueType::String),
    doc: "Renders a value as compact JSON.",
    |args: &[Value], _ctx: &mut _| {
        Ok(Value::String(args[0].to_json().to_string()))
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Arc::new(TypeOfFunction));
    registry.register(Arc::new(IsNullFunction));
    registry.register(Arc::new(IsNumberFunction));
    registry.register(Arc::new(IsStringFunction));
    registry.register(Arc::new(IsBooleanFunction));
    registry.register(Arc::new(IsArrayFunction));
    registry.register(Arc::new(IsObjectFunction));
    registry.register(Arc::new(ToNumberFunction));
    registry.register(Arc::new(ToStringFunction));
    registry.register(Arc::new(ToBooleanFunction));
    registry.register(Arc::new(ParseJsonFunction));
    registry.register(Arc::new(ToJsonFunction));
}

inventory::submit! {
    BuiltinModule {
        name: "types",
        register,
    }
}
