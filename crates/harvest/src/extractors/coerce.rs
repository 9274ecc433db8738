// ABOUTME: Built-in coercions that turn cleaned text into typed JSON values.
// ABOUTME: Every coercion receives absence as Value::Null and passes it through unchanged.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use serde_json::Value;

/// A cleaning step applied after the default trim: cleaned value in, typed value out.
///
/// Coercions see absence as `Value::Null`; failures propagate to the caller.
pub type Coercion = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

/// Looks up a built-in coercion by name.
///
/// Known names: `integer`, `float`, `lowercase`, `uppercase`.
pub fn builtin(name: &str) -> Option<Coercion> {
    let f: Coercion = match name {
        "integer" => Arc::new(integer),
        "float" => Arc::new(float),
        "lowercase" => Arc::new(|v| map_str(v, str::to_lowercase)),
        "uppercase" => Arc::new(|v| map_str(v, str::to_uppercase)),
        _ => return None,
    };
    Some(f)
}

fn map_str(value: Value, f: impl Fn(&str) -> String) -> anyhow::Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(f(&s))),
        other => Ok(other),
    }
}

/// Parses an integer, ignoring thousands separators.
pub fn integer(value: Value) -> anyhow::Result<Value> {
    match value {
        Value::String(s) => {
            let digits: String = s.chars().filter(|c| *c != ',').collect();
            let n: i64 = digits
                .trim()
                .parse()
                .with_context(|| format!("{:?} is not an integer", s))?;
            Ok(Value::from(n))
        }
        Value::Null => Ok(Value::Null),
        other => Err(anyhow!("cannot coerce {} to an integer", other)),
    }
}

/// Parses a floating point number, ignoring thousands separators.
pub fn float(value: Value) -> anyhow::Result<Value> {
    match value {
        Value::String(s) => {
            let digits: String = s.chars().filter(|c| *c != ',').collect();
            let n: f64 = digits
                .trim()
                .parse()
                .with_context(|| format!("{:?} is not a number", s))?;
            serde_json::Number::from_f64(n)
                .map(Value::Number)
                .ok_or_else(|| anyhow!("{:?} is not a finite number", s))
        }
        Value::Null => Ok(Value::Null),
        other => Err(anyhow!("cannot coerce {} to a number", other)),
    }
}
