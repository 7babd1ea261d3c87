//! Deterministic JSON rendering for [`Value`].
//!
//! Object keys are sorted so equal values always render identically, which
//! also makes `$str` canonical. Non-finite numbers have no JSON form and
//! render as `null`.

use std::collections::HashMap;

use crate::value::Value;

/// Render a value as compact JSON.
///
/// ```
/// use jex::{to_json, Value};
///
/// let v = Value::from(serde_json::json!({"b": 1, "a": [true, null]}));
/// assert_eq!(to_json(&v), r#"{"a":[true,null],"b":1}"#);
/// ```
pub fn to_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, None);
    out
}

/// Render a value as pretty-printed JSON with two-space indentation.
pub fn to_json_pretty(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, Some(0));
    out
}

fn write_value(out: &mut String, value: &Value, indent: Option<usize>) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(out, *n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => write_array(out, items, indent),
        Value::Object(fields) => write_object(out, fields, indent),
    }
}

fn write_number(out: &mut String, n: f64) {
    if n.is_finite() {
        out.push_str(&n.to_string());
    } else {
        out.push_str("null");
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_array(out: &mut String, items: &[Value], indent: Option<usize>) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    match indent {
        Some(level) => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(out, level + 1);
                write_value(out, item, Some(level + 1));
            }
            out.push('\n');
            push_indent(out, level);
            out.push(']');
        }
        None => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item, None);
            }
            out.push(']');
        }
    }
}

fn write_object(out: &mut String, fields: &HashMap<String, Value>, indent: Option<usize>) {
    if fields.is_empty() {
        out.push_str("{}");
        return;
    }

    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort();

    match indent {
        Some(level) => {
            out.push_str("{\n");
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(out, level + 1);
                write_string(out, key);
                out.push_str(": ");
                if let Some(v) = fields.get(key) {
                    write_value(out, v, Some(level + 1));
                }
            }
            out.push('\n');
            push_indent(out, level);
            out.push('}');
        }
        None => {
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                if let Some(v) = fields.get(key) {
                    write_value(out, v, None);
                }
            }
            out.push('}');
        }
    }
}

fn push_indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}
