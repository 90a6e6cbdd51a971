//! Query-path extraction of scalar values from decoded response bodies.

use jsonpath_lib::select;
use serde_json::{Number, Value};
use yuzu_common::{Error, Result};

/// Evaluate `expr` against `document` and reduce the first match to a string.
///
/// `key` names the result binding being populated and only appears in error
/// messages. An evaluation error or an empty match list is an
/// [`Error::Extraction`]; a matched object or array is an
/// [`Error::UnsupportedValue`].
pub fn extract(document: &Value, expr: &str, key: &str) -> Result<String> {
    let matches = select(document, expr).map_err(|e| Error::extraction(expr, format!("{e:?}")))?;
    let first = matches
        .first()
        .ok_or_else(|| Error::extraction(expr, "no value matched"))?;
    scalar_to_string(key, first)
}

/// Reduce a scalar JSON value to its stored string form.
///
/// Strings are stored verbatim, numbers in minimal non-exponential decimal
/// form, booleans as `true`/`false`, and null as the empty string.
pub fn scalar_to_string(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(format_number(n)),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) => Err(unsupported(key, "array")),
        Value::Object(_) => Err(unsupported(key, "object")),
    }
}

fn unsupported(key: &str, kind: &str) -> Error {
    Error::UnsupportedValue {
        key: key.to_string(),
        kind: kind.to_string(),
    }
}

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        // f64's Display never switches to exponent notation and prints the
        // shortest round-tripping digits.
        n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string())
    }
}
