// ABOUTME: Function signatures and signature-based argument validation

use crate::error::{ExecError, ExecErrorKind};
use crate::value::{Value, ValueType};

/// One declared parameter. `param_type` of `None` is the `Any` wildcard.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub param_type: Option<ValueType>,
    pub optional: bool,
}

impl Parameter {
    pub fn required(name: &str, param_type: ValueType) -> Self {
        Parameter {
            name: name.to_string(),
            param_type: Some(param_type),
            optional: false,
        }
    }

    pub fn required_any(name: &str) -> Self {
        Parameter {
            name: name.to_string(),
            param_type: None,
            optional: false,
        }
    }

    pub fn optional(name: &str, param_type: ValueType) -> Self {
        Parameter {
            name: name.to_string(),
            param_type: Some(param_type),
            optional: true,
        }
    }

    pub fn optional_any(name: &str) -> Self {
        Parameter {
            name: name.to_string(),
            param_type: None,
            optional: true,
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self.param_type {
            None => true,
            Some(expected) => value.value_type() == expected,
        }
    }

    fn type_name(&self) -> &'static str {
        self.param_type.map(ValueType::name).unwrap_or("any")
    }
}

/// Name, ordered parameters, and return type of a host function.
///
/// Required parameters must precede optional ones; signatures are authored
/// in host code, so a violation panics at construction time rather than
/// surfacing as a script diagnostic.
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<ValueType>,
    pub description: String,
}

impl FunctionSignature {
    pub fn new(name: &str, parameters: Vec<Parameter>, return_type: Option<ValueType>) -> Self {
        let mut seen_optional = false;
        for parameter in &parameters {
            assert!(
                !(seen_optional && !parameter.optional),
                "signature '{}': required parameter '{}' after an optional one",
                name,
                parameter.name
            );
            seen_optional |= parameter.optional;
        }
        FunctionSignature {
            name: name.to_string(),
            parameters,
            return_type,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| !p.optional).count()
    }

    /// Checks arity, then per-position type compatibility.
    pub fn validate_args(&self, args: &[Value]) -> Result<(), ExecError> {
        let required = self.required_count();
        let total = self.parameters.len();
        if args.len() < required || args.len() > total {
            let expected = if required == total {
                required.to_string()
            } else {
                format!("{}-{}", required, total)
            };
            return Err(ExecErrorKind::ArgumentCount {
                function: self.name.clone(),
                expected,
                actual: args.len(),
            }
            .into());
        }
        for (position, (parameter, value)) in self.parameters.iter().zip(args.iter()).enumerate() {
            if !parameter.matches(value) {
                return Err(ExecErrorKind::ArgumentType {
                    function: self.name.clone(),
                    position: position + 1,
                    expected: parameter.type_name(),
                    actual: value.type_name(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Human-readable form used by the help system, e.g.
    /// `Substring(text: string, start: number, length?: number): string`.
    pub fn render(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| {
                format!(
                    "{}{}: {}",
                    p.name,
                    if p.optional { "?" } else { "" },
                    p.type_name()
                )
            })
            .collect();
        let ret = self.return_type.map(ValueType::name).unwrap_or("any");
        format!("{}({}): {}", self.name, params.join(", "), ret)
    }
}
