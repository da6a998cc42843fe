//! Array functions: Append, Insert, RemoveAt, Sort, Reverse, IndexOf,
//! First, Last
//!
//! Arrays are owned values, so these functions return a new array; write the
//! result back: `Data.items = Append(Data.items, x)`.

use super::{arr_arg, define_function, index_arg, BuiltinModule};
use crate::error::ExecError;
use crate::functions::FunctionRegistry;
use crate::signature::Parameter;
use crate::value::{Value, ValueType};
use std::sync::Arc;

define_function! {
    append,
    name: "Append",
    params: [
        Parameter::required("items", ValueType::Array),
        Parameter::required_any("item"),
    ],
    returns: Some(ValueType::Array),
    doc: "A new array with the item added at the end.",
    |args: &[Value], _ctx: &mut _| {
        let mut items = arr_arg("Append", args, 0)?.clone();
        items.push(args[1].clone());
        Ok(Value::Array(items))
    }
}

define_function! {
    insert,
    name: "Insert",
    params: [
        Parameter::required("items", ValueType::Array),
        Parameter::required("index", ValueType::Number),
        Parameter::required_any("item"),
    ],
    returns: Some(ValueType::Array),
    doc: "A new array with the item inserted at the index (0..=length).",
    |args: &[Value], _ctx: &mut _| {
        let mut items = arr_arg("Insert", args, 0)?.clone();
        let index = index_arg("Insert", args, 1, items.len(), true)?;
        items.insert(index, args[2].clone());
        Ok(Value::Array(items))
    }
}

define_function! {
    remove_at,
    name: "RemoveAt",
    params: [
        Parameter::required("items", ValueType::Array),
        Parameter::required("index", ValueType::Number),
    ],
    returns: Some(ValueType::Array),
    doc: "A new array with the element at the index removed.",
    |args: &[Value], _ctx: &mut _| {
        let mut items = arr_arg("RemoveAt", args, 0)?.clone();
        let index = index_arg("RemoveAt", args, 1, items.len(), false)?;
        items.remove(index);
        Ok(Value::Array(items))
    }
}

define_function! {
    sort,
    name: "Sort",
    params: [Parameter::required("items", ValueType::Array)],
    returns: Some(ValueType::Array),
    doc: "Sorts an all-number or all-string array ascending.",
    |args: &[Value], _ctx: &mut _| {
        let items = arr_arg("Sort", args, 0)?;
        if items.iter().all(|v| matches!(v, Value::Number(_))) {
            let mut sorted = items.clone();
            sorted.sort_by(|a, b| {
                a.compare(b).unwrap_or(std::cmp::Ordering::Equal)
            });
            return Ok(Value::Array(sorted));
        }
        if items.iter().all(|v| matches!(v, Value::String(_))) {
            let mut sorted = items.clone();
            sorted.sort_by(|a, b| {
                a.compare(b).unwrap_or(std::cmp::Ordering::Equal)
            });
            return Ok(Value::Array(sorted));
        }
        Err(ExecError::function_failed(
            "Sort",
            "array must contain only numbers or only strings",
        ))
    }
}

define_function! {
    reverse,
    name: "Reverse",
    params: [Parameter::required("items", ValueType::Array)],
    returns: Some(ValueType::Array),
    doc: "A new array with the elements in reverse order.",
    |args: &[Value], _ctx: &mut _| {
        let mut items = arr_arg("Reverse", args, 0)?.clone();
        items.reverse();
        Ok(Value::Array(items))
    }
}

define_function! {
    index_of,
    name: "IndexOf",
    params: [
        Parameter::required_any("haystack"),
        Parameter::required_any("needle"),
    ],
    returns: Some(ValueType::Number),
    doc: "First position of an element (array) or substring (string); -1 when absent.",
    |args: &[Value], _ctx: &mut _| {
        let position = match (&args[0], &args[1]) {
            (Value::Array(items), needle) => items
                .iter()
                .position(|item| item.equals(needle))
                .map(|i| i as f64)
                .unwrap_or(-1.0),
            (Value::String(text), Value::String(needle)) => match text.find(needle.as_str()) {
                Some(byte_index) => text[..byte_index].chars().count() as f64,
                None => -1.0,
            },
            (haystack, _) => {
                return Err(ExecError::function_failed(
                    "IndexOf",
                    format!("cannot search a {}", haystack.type_name()),
                ));
            }
        };
        Ok(Value::Number(position))
    }
}

define_function! {
    first,
    name: "First",
    params: [Parameter::required("items", ValueType::Array)],
    returns: None,
    doc: "First element, or null for an empty array.",
    |args: &[Value], _ctx: &mut _| {
        Ok(arr_arg("First", args, 0)?.first().cloned().unwrap_or(Value::Null))
    }
}

define_function! {
    last,
    name: "Last",
    params: [Parameter::required("items", ValueType::Array)],
    returns: None,
    doc: "Last element, or null for an empty array.",
    |args: &[Value], _ctx: &mut _| {
        Ok(arr_arg("Last", args, 0)?.last().cloned().unwrap_or(Value::Null))
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Arc::new(AppendFunction));
    registry.register(Arc::new(InsertFunction));
    registry.register(Arc::new(RemoveAtFunction));
    registry.register(Arc::new(SortFunction));
    registry.register(Arc::new(ReverseFunction));
    registry.register(Arc::new(IndexOfFunction));
    registry.register(Arc::new(FirstFunction));
    registry.register(Arc::new(LastFunction));
}

inventory::submit! {
    BuiltinModule {
        name: "arrays",
        register,
    }
}
