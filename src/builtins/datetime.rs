//! Date and time functions: Now, Today, ParseDate, FormatDate, AddDays,
//! DiffDays
//!
//! Dates travel through scripts as strings: RFC 3339 timestamps or plain
//! `YYYY-MM-DD` dates. All arithmetic happens in UTC.

use super::{define_function, num_arg, str_arg, BuiltinModule};
use crate::error::ExecError;
use crate::functions::FunctionRegistry;
use crate::signature::Parameter;
use crate::value::{Value, ValueType};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::sync::Arc;

/// Accepts an RFC 3339 timestamp or a bare date, normalizing to UTC.
fn parse_instant(function: &str, text: &str) -> Result<DateTime<Utc>, ExecError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(ExecError::function_failed(
        function,
        format!("'{}' is not an RFC 3339 timestamp or YYYY-MM-DD date", text),
    ))
}

define_function! {
    now,
    name: "Now",
    params: [],
    returns: Some(ValueType::String),
    doc: "Current UTC time as an RFC 3339 timestamp.",
    |_args: &[Value], _ctx: &mut _| {
        Ok(Value::String(Utc::now().to_rfc3339()))
    }
}

define_function! {
    today,
    name: "Today",
    params: [],
    returns: Some(ValueType::String),
    doc: "Current UTC date as YYYY-MM-DD.",
    |_args: &[Value], _ctx: &mut _| {
        Ok(Value::String(Utc::now().format("%Y-%m-%d").to_string()))
    }
}

define_function! {
    parse_date,
    name: "ParseDate",
    params: [
        Parameter::required("text", ValueType::String),
        Parameter::required("format", ValueType::String),
    ],
    returns: Some(ValueType::String),
    doc: "Parses a date with a chrono format string, returning YYYY-MM-DD.",
    |args: &[Value], _ctx: &mut _| {
        let text = str_arg("ParseDate", args, 0)?;
        let format = str_arg("ParseDate", args, 1)?;
        match NaiveDate::parse_from_str(text, format) {
            Ok(date) => Ok(Value::String(date.format("%Y-%m-%d").to_string())),
            Err(err) => Err(ExecError::function_failed(
                "ParseDate",
                format!("cannot parse '{}' with '{}': {}", text, format, err),
            )),
        }
    }
}

define_function! {
    format_date,
    name: "FormatDate",
    params: [
        Parameter::required("date", ValueType::String),
        Parameter::required("format", ValueType::String),
    ],
    returns: Some(ValueType::String),
    doc: "Formats a timestamp or date with a chrono format string.",
    |args: &[Value], _ctx: &mut _| {
        let instant = parse_instant("FormatDate", str_arg("FormatDate", args, 0)?)?;
        let format = str_arg("FormatDate", args, 1)?;
        Ok(Value::String(instant.format(format).to_string()))
    }
}

define_function! {
    add_days,
    name: "AddDays",
    params: [
        Parameter::required("date", ValueType::String),
        Parameter::required("days", ValueType::Number),
    ],
    returns: Some(ValueType::String),
    doc: "Shifts a date by a whole number of days (negative moves backward).",
    |args: &[Value], _ctx: &mut _| {
        let instant = parse_instant("AddDays", str_arg("AddDays", args, 0)?)?;
        let days = num_arg("AddDays", args, 1)?;
        if days.fract() != 0.0 {
            return Err(ExecError::function_failed(
                "AddDays",
                format!("days {} is not an integer", days),
            ));
        }
        let shifted = instant + chrono::Duration::days(days as i64);
        Ok(Value::String(shifted.format("%Y-%m-%d").to_string()))
    }
}

define_function! {
    diff_days,
    name: "DiffDays",
    params: [
        Parameter::required("later", ValueType::String),
        Parameter::required("earlier", ValueType::String),
    ],
    returns: Some(ValueType::Number),
    doc: "Whole days from the second date to the first.",
    |args: &[Value], _ctx: &mut _| {
        let later = parse_instant("DiffDays", str_arg("DiffDays", args, 0)?)?;
        let earlier = parse_instant("DiffDays", str_arg("DiffDays", args, 1)?)?;
        Ok(Value::Number((later - earlier).num_days() as f64))
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Arc::new(NowFunction));
    registry.register(Arc::new(TodayFunction));
    registry.register(Arc::new(ParseDateFunction));
    registry.register(Arc::new(FormatDateFunction));
    registry.register(Arc::new(AddDaysFunction));
    registry.register(Arc::new(DiffDaysFunction));
}

inventory::submit! {
    BuiltinModule {
        name: "datetime",
        register,
    }
}
