// ABOUTME: Value types representing Jyro script data and the Data root

use crate::error::ExecError;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt;

/// Runtime type tag used by declarations and function signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ValueType {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Jyro value. Objects preserve insertion order so that `foreach` visits
/// keys in the order the script (or the host) created them.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    /// Truthiness projection used by conditionals and logical operators.
    /// Arrays and objects are truthy even when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Whether a number holds an integral value (within epsilon).
    pub fn is_integer(&self) -> bool {
        match self {
            Value::Number(n) => (n - n.round()).abs() < f64::EPSILON,
            _ => false,
        }
    }

    /// Language equality: epsilon compare for numbers, ordinal for strings,
    /// structural for containers, `false` across variants.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => (a - b).abs() < f64::EPSILON,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.equals(w)))
            }
            _ => false,
        }
    }

    /// Relational comparison, defined only for number/number and
    /// string/string pairs.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Stringification used by concatenation, object-key coercion, and
    /// diagnostics. Containers render as compact JSON.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => self.to_json().to_string(),
        }
    }

    /// Converts from the JSON object model. Numbers widen to f64.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts to the JSON object model. Non-finite numbers become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Coerces this value to a declared type, used by typed `var`
    /// declarations. `Null` passes through untouched.
    pub fn coerce_to(self, target: ValueType) -> Result<Value, ExecError> {
        if matches!(self, Value::Null) || self.value_type() == target {
            return Ok(self);
        }
        match (target, &self) {
            (ValueType::String, _) => Ok(Value::String(self.to_display_string())),
            (ValueType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|_| ExecError::coercion(&self, target)),
            (ValueType::Number, Value::Boolean(b)) => {
                Ok(Value::Number(if *b { 1.0 } else { 0.0 }))
            }
            (ValueType::Boolean, _) => Ok(Value::Boolean(self.is_truthy())),
            _ => Err(ExecError::coercion(&self, target)),
        }
    }
}

/// Integral values render without a fraction; everything else uses the
/// shortest round-trip form.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

// ============================================================================
// Operator semantics
// ============================================================================

/// `+` is numeric addition unless either side is a string, in which case it
/// concatenates using the other side's stringification.
pub fn add(left: &Value, right: &Value) -> Result<Value, ExecError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b.to_display_string()))),
        (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a.to_display_string(), b))),
        _ => Err(ExecError::binary_type("+", left, right)),
    }
}

pub fn subtract(left: &Value, right: &Value) -> Result<Value, ExecError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
        _ => Err(ExecError::binary_type("-", left, right)),
    }
}

pub fn multiply(left: &Value, right: &Value) -> Result<Value, ExecError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
        _ => Err(ExecError::binary_type("*", left, right)),
    }
}

pub fn divide(left: &Value, right: &Value) -> Result<Value, ExecError> {
    match (left, right) {
        (Value::Number(_), Value::Number(b)) if *b == 0.0 => Err(ExecError::division_by_zero()),
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
        _ => Err(ExecError::binary_type("/", left, right)),
    }
}

pub fn modulo(left: &Value, right: &Value) -> Result<Value, ExecError> {
    match (left, right) {
        (Value::Number(_), Value::Number(b)) if *b == 0.0 => Err(ExecError::division_by_zero()),
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a % b)),
        _ => Err(ExecError::binary_type("%", left, right)),
    }
}

pub fn negate(operand: &Value) -> Result<Value, ExecError> {
    match operand {
        Value::Number(n) => Ok(Value::Number(-n)),
        _ => Err(ExecError::unary_type("-", operand)),
    }
}

pub fn compare_op(op: &'static str, left: &Value, right: &Value) -> Result<Value, ExecError> {
    let ordering = left
        .compare(right)
        .ok_or_else(|| ExecError::binary_type(op, left, right))?;
    let result = match op {
        "<" => ordering == Ordering::Less,
        "<=" => ordering != Ordering::Greater,
        ">" => ordering == Ordering::Greater,
        ">=" => ordering != Ordering::Less,
        _ => unreachable!("not a relational operator: {op}"),
    };
    Ok(Value::Boolean(result))
}
