//! Canonical JSON encoding
//!
//! Produces one byte string per JSON value, independent of map insertion
//! order or serializer settings:
//!
//! - object keys sorted byte-wise, no whitespace anywhere
//! - strings escaped as `\"`, `\\`, `\b`, `\f`, `\n`, `\r`, `\t`, other
//!   control characters as `\u00XX`; everything else emitted as UTF-8
//! - integers in plain decimal
//! - floats that are finite, integral and within ±2^53 are written as the
//!   integer; other floats use the shortest round-trip decimal
//!
//! Reading the shortest decimal back to the same `f64` needs serde_json's
//! `float_roundtrip` parser, enabled for the whole workspace. Without it a
//! large float can re-parse one ULP away and change the hash.
//!
//! The same bytes are used for hashing and for export, so exported evidence
//! is itself hash-stable.

use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt::Write as _;

use crate::hash::HashError;

/// Largest integer magnitude an f64 represents exactly
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Canonical encoding of `value`
#[must_use]
pub fn canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Canonical encoding of `value` as UTF-8 bytes
#[inline]
#[must_use]
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    canonical_string(value).into_bytes()
}

/// Canonical encoding of any serializable value
///
/// # Errors
/// Returns error if `value` cannot be represented as JSON (e.g. a map with
/// non-string keys).
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    let value = serde_json::to_value(value)?;
    Ok(canonical_bytes(&value))
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, &map[key.as_str()]);
            }
            out.push('}');
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn write_number(out: &mut String, n: &Number) {
    if let Some(i) = n.as_i64() {
        let _ = write!(out, "{i}");
    } else if let Some(u) = n.as_u64() {
        let _ = write!(out, "{u}");
    } else if let Some(f) = n.as_f64() {
        if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT_INT {
            let _ = write!(out, "{}", f as i64);
        } else {
            // serde_json's Display for a float Number is the shortest round-trip form
            let _ = write!(out, "{n}");
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if u32::from(c) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
