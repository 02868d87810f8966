//! Cell value inference
//!
//! Turns raw element or attribute text into a JSON scalar. Parsing is total:
//! anything that isn't clearly a number or a boolean stays a string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

static INTEGER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?\d+$").unwrap()
});

static FLOAT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(\d+\.\d*|\.\d+|\d+)([eE][-+]?\d+)?$").unwrap()
});

/// Converts cell text into a value
pub trait ScalarParser {
    fn parse_scalar(&self, text: &str) -> Value;
}

impl<F> ScalarParser for F
where
    F: Fn(&str) -> Value,
{
    fn parse_scalar(&self, text: &str) -> Value {
        self(text)
    }
}

/// Detects integers, floats and booleans
#[derive(Debug, Clone, Copy, Default)]
pub struct InferScalar;

impl ScalarParser for InferScalar {
    fn parse_scalar(&self, text: &str) -> Value {
        infer_scalar(text)
    }
}

/// Keeps every value as a string
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl ScalarParser for PlainText {
    fn parse_scalar(&self, text: &str) -> Value {
        Value::String(text.to_string())
    }
}

/// Infer a scalar from text.
///
/// A value wrapped in double quotes is taken literally, without the quotes.
pub fn infer_scalar(text: &str) -> Value {
    let trimmed = text.trim();

    if trimmed.len() > 1 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return Value::String(trimmed[1..trimmed.len() - 1].to_string());
    }

    if INTEGER_REGEX.is_match(trimmed) {
        if let Ok(n) = trimmed.parse::<i64>() {
            return Value::Number(n.into());
        }
    }

    if FLOAT_REGEX.is_match(trimmed) {
        if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    Value::String(text.to_string())
}
