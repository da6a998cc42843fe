//! Numeric helper functions: Abs, Min, Max, Round, Floor, Ceiling, Sqrt

use super::{define_function, num_arg, opt_num_arg, BuiltinModule};
use crate::error::ExecError;
use crate::functions::FunctionRegistry;
use crate::signature::Parameter;
use crate::value::{Value, ValueType};
use std::sync::Arc;

define_function! {
    abs,
    name: "Abs",
    params: [Parameter::required("n", ValueType::Number)],
    returns: Some(ValueType::Number),
    doc: "Absolute value.",
    |args: &[Value], _ctx: &mut _| {
        Ok(Value::Number(num_arg("Abs", args, 0)?.abs()))
    }
}

define_function! {
    min,
    name: "Min",
    params: [
        Parameter::required("a", ValueType::Number),
        Parameter::required("b", ValueType::Number),
    ],
    returns: Some(ValueType::Number),
    doc: "Smaller of two numbers.",
    |args: &[Value], _ctx: &mut _| {
        let a = num_arg("Min", args, 0)?;
        let b = num_arg("Min", args, 1)?;
        Ok(Value::Number(a.min(b)))
    }
}

define_function! {
    max,
    name: "Max",
    params: [
        Parameter::required("a", ValueType::Number),
        Parameter::required("b", ValueType::Number),
    ],
    returns: Some(ValueType::Number),
    doc: "Larger of two numbers.",
    |args: &[Value], _ctx: &mut _| {
        let a = num_arg("Max", args, 0)?;
        let b = num_arg("Max", args, 1)?;
        Ok(Value::Number(a.max(b)))
    }
}

define_function! {
    round,
    name: "Round",
    params: [
        Parameter::required("n", ValueType::Number),
        Parameter::optional("digits", ValueType::Number),
    ],
    returns: Some(ValueType::Number),
    doc: "Rounds to the nearest integer, or to a number of decimal digits.",
    |args: &[Value], _ctx: &mut _| {
        let n = num_arg("Round", args, 0)?;
        let rounded = match opt_num_arg("Round", args, 1)? {
            None => n.round(),
            Some(digits) => {
                if digits < 0.0 || digits.fract() != 0.0 {
                    return Err(ExecError::function_failed(
                        "Round",
                        format!("digits {} is not a non-negative integer", digits),
                    ));
                }
                let factor = 10f64.powi(digits as i32);
                (n * factor).round() / factor
            }
        };
        Ok(Value::Number(rounded))
    }
}

define_function! {
    floor,
    name: "Floor",
    params: [Parameter::required("n", ValueType::Number)],
    returns: Some(ValueType::Number),
    doc: "Largest integer not above the argument.",
    |args: &[Value], _ctx: &mut _| {
        Ok(Value::Number(num_arg("Floor", args, 0)?.floor()))
    }
}

define_function! {
    ceiling,
    name: "Ceiling",
    params: [Parameter::required("n", ValueType::Number)],
    returns: Some(ValueType::Number),
    doc: "Smallest integer not below the argument.",
    |args: &[Value], _ctx: &mut _| {
        Ok(Value::Number(num_arg("Ceiling", args, 0)?.ceil()))
    }
}

define_function! {
    sqrt,
    name: "Sqrt",
    params: [Parameter::required("n", ValueType::Number)],
    returns: Some(ValueType::Number),
    doc: "Square root; negative input is an error.",
    |args: &[Value], _ctx: &mut _| {
        let n = num_arg("Sqrt", args, 0)?;
        if n < 0.0 {
            return Err(ExecError::function_failed(
                "Sqrt",
                format!("cannot take the square root of {}", n),
            ));
        }
        Ok(Value::Number(n.sqrt()))
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Arc::new(AbsFunction));
    registry.register(Arc::new(MinFunction));
    registry.register(Arc::new(MaxFunction));
    registry.register(Arc::new(RoundFunction));
    registry.register(Arc::new(FloorFunction));
    registry.register(Arc::new(CeilingFunction));
    registry.register(Arc::new(SqrtFunction));
}

inventory::submit! {
    BuiltinModule {
        name: "math",
        register,
    }
}
