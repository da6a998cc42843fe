//! Opt-in HTTP function: HttpGet
//!
//! Never registered by default. A host that wants scripts fetching over the
//! network constructs [`HttpGet`] with an explicit [`NetworkConfig`] and
//! registers it; the CLI does this behind `--allow-network`. Requests block
//! the interpreter until they return, like any host function.

use crate::config::NetworkConfig;
use crate::error::ExecError;
use crate::functions::{FunctionContext, JyroFunction};
use crate::signature::{FunctionSignature, Parameter};
use crate::value::{Value, ValueType};
use indexmap::IndexMap;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpGet {
    config: NetworkConfig,
    signature: FunctionSignature,
}

impl HttpGet {
    pub fn new(config: NetworkConfig) -> Self {
        let signature = FunctionSignature::new(
            "HttpGet",
            vec![Parameter::required("url", ValueType::String)],
            Some(ValueType::Object),
        )
        .with_description("Fetches a URL; returns {status, headers, body}.");
        HttpGet { config, signature }
    }
}

impl JyroFunction for HttpGet {
    fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    fn execute(&self, args: &[Value], _ctx: &mut FunctionContext<'_>) -> Result<Value, ExecError> {
        let url = super::str_arg("HttpGet", args, 0)?;

        if !self.config.enabled {
            return Err(ExecError::function_failed(
                "HttpGet",
                "network access is disabled",
            ));
        }
        if !self.config.is_url_allowed(url) {
            return Err(ExecError::function_failed(
                "HttpGet",
                format!("address not allowed: {}", url),
            ));
        }

        let response = ureq::get(url)
            .timeout(REQUEST_TIMEOUT)
            .call()
            .map_err(|err| ExecError::function_failed("HttpGet", err.to_string()))?;

        let status = response.status();
        let mut headers = IndexMap::new();
        for name in response.headers_names() {
            let value = response.header(&name).unwrap_or("").to_string();
            headers.insert(name, Value::String(value));
        }
        let body = response
            .into_string()
            .map_err(|err| ExecError::function_failed("HttpGet", err.to_string()))?;

        let mut result = IndexMap::new();
        result.insert("status".to_string(), Value::Number(status as f64));
        result.insert("headers".to_string(), Value::Object(headers));
        result.insert("body".to_string(), Value::String(body));
        Ok(Value::Object(result))
    }
}
