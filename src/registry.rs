use std::collections::HashMap;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;

use crate::evaluator::EvalError;
use crate::output::to_json;
use crate::value::Value;

/// Binary operator over two numbers.
pub type NumberOp = fn(f64, f64) -> Value;
/// Binary operator over two strings.
pub type StringOp = fn(&str, &str) -> Value;
/// Binary operator over two booleans.
pub type BoolOp = fn(bool, bool) -> Value;
/// Binary operator over values of any other shape.
pub type AnyOp = fn(&Value, &Value) -> Value;

/// A `$fn()` built-in.
pub type NullaryFn = Arc<dyn Fn() -> Result<Value, EvalError> + Send + Sync>;
/// A `$fn(a)` built-in.
pub type UnaryFn = Arc<dyn Fn(Value) -> Result<Value, EvalError> + Send + Sync>;
/// A `$fn(a, b)` built-in.
pub type BinaryFn = Arc<dyn Fn(Value, Value) -> Result<Value, EvalError> + Send + Sync>;

/// The bundle of operator tables and functions consulted during evaluation.
///
/// Operators are keyed by symbol within one table per operand type; the
/// evaluator picks the table from the left operand's runtime shape.
/// Functions are keyed by their `$`-prefixed name within one table per
/// arity.
///
/// A registry must not be mutated while evaluations against it are in
/// flight; clone the default and extend the clone instead:
///
/// ```
/// use jex::{compile, eval_with, Registry, Value};
///
/// let mut registry = Registry::default();
/// registry.add_unary("$upper", |v| match v {
///     Value::String(s) => Ok(Value::String(s.to_uppercase())),
///     _ => Ok(Value::Null),
/// });
///
/// let ast = compile("$upper(.name)").unwrap();
/// let msg = Value::from(serde_json::json!({"name": "ada"}));
/// assert_eq!(
///     eval_with(&registry, &ast, &msg).unwrap(),
///     Value::String("ADA".to_string()),
/// );
/// ```
#[derive(Clone)]
pub struct Registry {
    pub(crate) number_ops: HashMap<&'static str, NumberOp>,
    pub(crate) string_ops: HashMap<&'static str, StringOp>,
    pub(crate) bool_ops: HashMap<&'static str, BoolOp>,
    pub(crate) any_ops: HashMap<&'static str, AnyOp>,
    pub(crate) nullary: HashMap<String, NullaryFn>,
    pub(crate) unary: HashMap<String, UnaryFn>,
    pub(crate) binary: HashMap<String, BinaryFn>,
}

impl Default for Registry {
    fn default() -> Self {
        Registry {
            number_ops: default_number_ops(),
            string_ops: default_string_ops(),
            bool_ops: default_bool_ops(),
            any_ops: default_any_ops(),
            nullary: default_nullary(),
            unary: default_unary(),
            binary: default_binary(),
        }
    }
}

impl Registry {
    /// Register a one-argument function. `name` includes the leading `$`.
    pub fn add_unary<F>(&mut self, name: &str, f: F)
    where
        F: Fn(Value) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.unary.insert(name.to_string(), Arc::new(f));
    }

    /// Register a two-argument function. `name` includes the leading `$`.
    pub fn add_binary<F>(&mut self, name: &str, f: F)
    where
        F: Fn(Value, Value) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.binary.insert(name.to_string(), Arc::new(f));
    }
}

fn default_number_ops() -> HashMap<&'static str, NumberOp> {
    let mut ops: HashMap<&'static str, NumberOp> = HashMap::new();
    ops.insert("+", |a, b| Value::Number(a + b));
    ops.insert("-", |a, b| Value::Number(a - b));
    ops.insert("*", |a, b| Value::Number(a * b));
    // division by zero follows IEEE-754 and yields an infinity or NaN
    ops.insert("/", |a, b| Value::Number(a / b));
    ops.insert("==", |a, b| Value::Bool(a == b));
    ops.insert(">=", |a, b| Value::Bool(a >= b));
    ops.insert(">", |a, b| Value::Bool(a > b));
    ops.insert("<", |a, b| Value::Bool(a < b));
    ops.insert("<=", |a, b| Value::Bool(a <= b));
    ops.insert("!=", |a, b| Value::Bool(a != b));
    ops
}

fn default_string_ops() -> HashMap<&'static str, StringOp> {
    let mut ops: HashMap<&'static str, StringOp> = HashMap::new();
    ops.insert("+", |a, b| Value::String(format!("{}{}", a, b)));
    ops.insert("==", |a, b| Value::Bool(a == b));
    ops.insert("!=", |a, b| Value::Bool(a != b));
    ops
}

fn default_bool_ops() -> HashMap<&'static str, BoolOp> {
    let mut ops: HashMap<&'static str, BoolOp> = HashMap::new();
    ops.insert("&&", |a, b| Value::Bool(a && b));
    ops.insert("||", |a, b| Value::Bool(a || b));
    ops.insert("==", |a, b| Value::Bool(a == b));
    ops.insert("!=", |a, b| Value::Bool(a != b));
    ops
}

fn default_any_ops() -> HashMap<&'static str, AnyOp> {
    let mut ops: HashMap<&'static str, AnyOp> = HashMap::new();
    // structural equality over whole containers
    ops.insert("==", |a, b| Value::Bool(a == b));
    ops.insert("!=", |a, b| Value::Bool(a != b));
    ops
}

fn default_nullary() -> HashMap<String, NullaryFn> {
    let mut fns: HashMap<String, NullaryFn> = HashMap::new();
    fns.insert("$now".to_string(), Arc::new(now));
    fns
}

fn default_unary() -> HashMap<String, UnaryFn> {
    let mut fns: HashMap<String, UnaryFn> = HashMap::new();
    fns.insert("$sum".to_string(), Arc::new(sum));
    fns.insert("$min".to_string(), Arc::new(min));
    fns.insert("$max".to_string(), Arc::new(max));
    fns.insert("$len".to_string(), Arc::new(len));
    fns.insert("$sqrt".to_string(), Arc::new(sqrt));
    fns.insert("$abs".to_string(), Arc::new(abs));
    fns.insert("$floor".to_string(), Arc::new(floor));
    fns.insert("$keys".to_string(), Arc::new(keys));
    fns.insert("$str".to_string(), Arc::new(stringify));
    fns.insert("$num".to_string(), Arc::new(to_number));
    fns.insert("$bool".to_string(), Arc::new(to_bool));
    fns.insert("$~bool".to_string(), Arc::new(truthy));
    fns
}

fn default_binary() -> HashMap<String, BinaryFn> {
    let mut fns: HashMap<String, BinaryFn> = HashMap::new();
    fns.insert("$parseTime".to_string(), Arc::new(parse_time));
    fns.insert("$fmtTime".to_string(), Arc::new(fmt_time));
    fns.insert("$pow".to_string(), Arc::new(pow));
    fns.insert("$exists".to_string(), Arc::new(exists));
    fns.insert("$contains".to_string(), Arc::new(contains));
    fns.insert("$regex".to_string(), Arc::new(regex_match));
    fns.insert("$has".to_string(), Arc::new(has));
    fns
}

// Built-ins return null on an operand of the wrong shape; an error is
// reserved for inputs that fail inherently, like a malformed time string.

fn now() -> Result<Value, EvalError> {
    Ok(Value::Number(Utc::now().timestamp_millis() as f64))
}

fn numeric_items(val: &Value) -> Option<Vec<f64>> {
    let items = match val {
        Value::Array(items) => items,
        _ => return None,
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Number(n) => out.push(*n),
            _ => return None,
        }
    }
    Some(out)
}

fn sum(val: Value) -> Result<Value, EvalError> {
    match numeric_items(&val) {
        Some(ns) => Ok(Value::Number(ns.iter().sum())),
        None => Ok(Value::Null),
    }
}

fn min(val: Value) -> Result<Value, EvalError> {
    match numeric_items(&val) {
        Some(ns) if !ns.is_empty() => {
            Ok(Value::Number(ns.iter().copied().fold(f64::INFINITY, f64::min)))
        }
        _ => Ok(Value::Null),
    }
}

fn max(val: Value) -> Result<Value, EvalError> {
    match numeric_items(&val) {
        Some(ns) if !ns.is_empty() => Ok(Value::Number(
            ns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        )),
        _ => Ok(Value::Null),
    }
}

fn len(val: Value) -> Result<Value, EvalError> {
    match val {
        Value::Array(items) => Ok(Value::Number(items.len() as f64)),
        _ => Ok(Value::Null),
    }
}

fn sqrt(val: Value) -> Result<Value, EvalError> {
    match val {
        Value::Number(n) if n >= 0.0 => Ok(Value::Number(n.sqrt())),
        Value::Number(n) if n.is_nan() => Ok(Value::Number(f64::NAN)),
        _ => Ok(Value::Null),
    }
}

fn abs(val: Value) -> Result<Value, EvalError> {
    match val {
        Value::Number(n) => Ok(Value::Number(n.abs())),
        _ => Ok(Value::Null),
    }
}

fn floor(val: Value) -> Result<Value, EvalError> {
    match val {
        Value::Number(n) => Ok(Value::Number(n.floor())),
        _ => Ok(Value::Null),
    }
}

fn keys(val: Value) -> Result<Value, EvalError> {
    match val {
        Value::Object(fields) => Ok(Value::Array(
            fields.into_keys().map(Value::String).collect(),
        )),
        _ => Ok(Value::Null),
    }
}

fn stringify(val: Value) -> Result<Value, EvalError> {
    let text = match &val {
        Value::Array(_) | Value::Object(_) => to_json(&val),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    };
    Ok(Value::String(text))
}

fn to_number(val: Value) -> Result<Value, EvalError> {
    match val {
        Value::Number(n) => Ok(Value::Number(n)),
        Value::String(s) => match s.parse::<f64>() {
            Ok(n) => Ok(Value::Number(n)),
            Err(_) => Err(EvalError::FunctionError(format!(
                "$num: invalid number: {:?}",
                s
            ))),
        },
        Value::Bool(true) => Ok(Value::Number(1.0)),
        _ => Ok(Value::Number(0.0)),
    }
}

fn to_bool(val: Value) -> Result<Value, EvalError> {
    match val {
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::String(s) => match s.as_str() {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(Value::Bool(true)),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(Value::Bool(false)),
            _ => Err(EvalError::FunctionError(format!(
                "$bool: invalid syntax: {:?}",
                s
            ))),
        },
        _ => Ok(Value::Null),
    }
}

fn truthy(val: Value) -> Result<Value, EvalError> {
    let b = match &val {
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Number(n) => !n.is_nan() && *n > 0.0,
        Value::String(s) => !s.is_empty(),
        Value::Bool(b) => *b,
        Value::Null => false,
    };
    Ok(Value::Bool(b))
}

fn parse_time(layout: Value, value: Value) -> Result<Value, EvalError> {
    let (layout, value) = match (&layout, &value) {
        (Value::String(l), Value::String(v)) => (l.as_str(), v.as_str()),
        _ => return Ok(Value::Null),
    };

    let millis = if let Ok(zoned) = DateTime::parse_from_str(value, layout) {
        zoned.timestamp_millis()
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(value, layout) {
        naive.and_utc().timestamp_millis()
    } else {
        match NaiveDate::parse_from_str(value, layout) {
            Ok(date) => date.and_time(NaiveTime::MIN).and_utc().timestamp_millis(),
            Err(e) => {
                return Err(EvalError::FunctionError(format!(
                    "$parseTime: {}: {:?}",
                    e, value
                )))
            }
        }
    };
    Ok(Value::Number(millis as f64))
}

fn fmt_time(layout: Value, millis: Value) -> Result<Value, EvalError> {
    let layout = match &layout {
        Value::String(l) => l.as_str(),
        _ => return Ok(Value::Null),
    };
    let millis = match millis {
        Value::Number(n) => n,
        _ => return Ok(Value::Null),
    };

    let items: Vec<Item> = StrftimeItems::new(layout).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(EvalError::FunctionError(format!(
            "$fmtTime: invalid layout: {:?}",
            layout
        )));
    }

    let when = Utc
        .timestamp_millis_opt(millis as i64)
        .single()
        .ok_or_else(|| {
            EvalError::FunctionError("$fmtTime: timestamp out of range".to_string())
        })?;
    Ok(Value::String(
        when.format_with_items(items.into_iter()).to_string(),
    ))
}

fn pow(base: Value, exponent: Value) -> Result<Value, EvalError> {
    match (base, exponent) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.powf(b))),
        _ => Ok(Value::Null),
    }
}

fn exists(target: Value, key: Value) -> Result<Value, EvalError> {
    match (&target, &key) {
        // presence, not truthiness: a null-valued field still exists
        (Value::Object(fields), Value::String(k)) => Ok(Value::Bool(fields.contains_key(k))),
        _ => Ok(Value::Null),
    }
}

fn contains(haystack: Value, needle: Value) -> Result<Value, EvalError> {
    match (&haystack, &needle) {
        (Value::String(h), Value::String(n)) => Ok(Value::Bool(h.contains(n.as_str()))),
        _ => Ok(Value::Null),
    }
}

fn regex_match(subject: Value, pattern: Value) -> Result<Value, EvalError> {
    let (subject, pattern) = match (&subject, &pattern) {
        (Value::String(s), Value::String(p)) => (s.as_str(), p.as_str()),
        _ => return Ok(Value::Null),
    };
    let re = Regex::new(pattern)
        .map_err(|e| EvalError::FunctionError(format!("$regex: {}", e)))?;
    Ok(Value::Bool(re.is_match(subject)))
}

fn has(list: Value, needle: Value) -> Result<Value, EvalError> {
    match list {
        // equality only ever holds between like-shaped values
        Value::Array(items) => Ok(Value::Bool(items.iter().any(|item| *item == needle))),
        _ => Ok(Value::Null),
    }
}
