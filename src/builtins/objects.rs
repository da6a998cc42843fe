//! Object functions: Keys, Values, HasKey, Remove, Merge
//!
//! Like the array functions, these return new objects rather than mutating
//! their arguments. Key order is preserved everywhere.

use super::{define_function, obj_arg, str_arg, BuiltinModule};
use crate::functions::FunctionRegistry;
use crate::signature::Parameter;
use crate::value::{Value, ValueType};
use std::sync::Arc;

define_function! {
    keys,
    name: "Keys",
    params: [Parameter::required("object", ValueType::Object)],
    returns: Some(ValueType::Array),
    doc: "Keys of an object, in insertion order.",
    |args: &[Value], _ctx: &mut _| {
        let map = obj_arg("Keys", args, 0)?;
        Ok(Value::Array(
            map.keys().map(|k| Value::String(k.clone())).collect(),
        ))
    }
}

define_function! {
    values,
    name: "Values",
    params: [Parameter::required("object", ValueType::Object)],
    returns: Some(ValueType::Array),
    doc: "Values of an object, in insertion order.",
    |args: &[Value], _ctx: &mut _| {
        let map = obj_arg("Values", args, 0)?;
        Ok(Value::Array(map.values().cloned().collect()))
    }
}

define_function! {
    has_key,
    name: "HasKey",
    params: [
        Parameter::required("object", ValueType::Object),
        Parameter::required("key", ValueType::String),
    ],
    returns: Some(ValueType::Boolean),
    doc: "Whether an object has a key (a key holding null still counts).",
    |args: &[Value], _ctx: &mut _| {
        let map = obj_arg("HasKey", args, 0)?;
        let key = str_arg("HasKey", args, 1)?;
        Ok(Value::Boolean(map.contains_key(key)))
    }
}

define_function! {
    remove,
    name: "Remove",
    params: [
        Parameter::required("object", ValueType::Object),
        Parameter::required("key", ValueType::String),
    ],
    returns: Some(ValueType::Object),
    doc: "A new object without the key; remaining keys keep their order.",
    |args: &[Value], _ctx: &mut _| {
        let mut map = obj_arg("Remove", args, 0)?.clone();
        let key = str_arg("Remove", args, 1)?;
        map.shift_remove(key);
        Ok(Value::Object(map))
    }
}

define_function! {
    merge,
    name: "Merge",
    params: [
        Parameter::required("base", ValueType::Object),
        Parameter::required("overlay", ValueType::Object),
    ],
    returns: Some(ValueType::Object),
    doc: "A new object with the overlay's entries written over the base's.",
    |args: &[Value], _ctx: &mut _| {
        let mut merged = obj_arg("Merge", args, 0)?.clone();
        let overlay = obj_arg("Merge", args, 1)?;
        for (key, value) in overlay {
            merged.insert(key.clone(), value.clone());
        }
        Ok(Value::Object(merged))
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Arc::new(KeysFunction));
    registry.register(Arc::new(ValuesFunction));
    registry.register(Arc::new(HasKeyFunction));
    registry.register(Arc::new(RemoveFunction));
    registry.register(Arc::new(MergeFunction));
}

inventory::submit! {
    BuiltinModule {
        name: "objects",
        register,
    }
}
