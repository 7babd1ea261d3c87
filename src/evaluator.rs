use std::mem;
use std::sync::OnceLock;

use crate::ast::{Node, NodeKind};
use crate::registry::Registry;
use crate::value::Value;

/// Errors that can occur while evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Mismatched or unsupported operand types for an operator
    TypeError(String),

    /// A path step applied to a value of the wrong shape
    AccessError(String),

    /// A `$function` that is not registered at the called arity
    UnknownFunction(String),

    /// A built-in that failed inherently (bad time string, bad pattern, ...)
    FunctionError(String),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::TypeError(msg) => write!(f, "type error: {}", msg),
            EvalError::AccessError(msg) => write!(f, "access error: {}", msg),
            EvalError::UnknownFunction(name) => write!(
                f,
                "function does not exist or wrong number of arguments: {}",
                name
            ),
            EvalError::FunctionError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for EvalError {}

/// Evaluate a parsed expression against a message using the default
/// registry.
///
/// The tree is only read, never written: the same tree can be evaluated
/// repeatedly, against different messages, from any number of threads.
///
/// # Examples
///
/// ```
/// use jex::{compile, eval, Value};
///
/// let ast = compile(".items[].price").unwrap();
/// let msg = Value::from(serde_json::json!({
///     "items": [{"price": 1.0}, {"price": 2.0}, {"price": 3.0}]
/// }));
///
/// assert_eq!(
///     eval(&ast, &msg).unwrap(),
///     Value::Array(vec![
///         Value::Number(1.0),
///         Value::Number(2.0),
///         Value::Number(3.0),
///     ]),
/// );
/// ```
pub fn eval(node: &Node, msg: &Value) -> Result<Value, EvalError> {
    static DEFAULT: OnceLock<Registry> = OnceLock::new();
    eval_with(DEFAULT.get_or_init(Registry::default), node, msg)
}

/// Evaluate a parsed expression with a caller-supplied [`Registry`].
pub fn eval_with(registry: &Registry, node: &Node, msg: &Value) -> Result<Value, EvalError> {
    match node.kind {
        NodeKind::Number | NodeKind::Str | NodeKind::Literal => Ok(node.value.clone()),
        NodeKind::Op => eval_op(registry, node, msg),
        NodeKind::Key => eval_path(registry, node, msg),
        NodeKind::Func => eval_call(registry, node, msg),
        _ => match node.children.first() {
            Some(child) => eval_with(registry, child, msg),
            None => Ok(Value::Null),
        },
    }
}

fn eval_op(registry: &Registry, node: &Node, msg: &Value) -> Result<Value, EvalError> {
    let symbol = match node.op_symbol() {
        Some(s) => s,
        None => return Err(EvalError::TypeError("operator without a symbol".to_string())),
    };

    match node.children.as_slice() {
        [operand] => {
            let value = eval_with(registry, operand, msg)?;
            match symbol {
                "-" => match value {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    other => Err(EvalError::TypeError(format!(
                        "cannot use - operator on {}",
                        other.type_name()
                    ))),
                },
                "!" => match value {
                    Value::Bool(b) => Ok(Value::Bool(!b)),
                    other => Err(EvalError::TypeError(format!(
                        "cannot use ! operator on {}",
                        other.type_name()
                    ))),
                },
                _ => Err(EvalError::TypeError(format!(
                    "invalid prefix operator: {}",
                    symbol
                ))),
            }
        }
        [left, right] => {
            let a = eval_with(registry, left, msg)?;
            let b = eval_with(registry, right, msg)?;
            apply_binary(registry, symbol, a, b)
        }
        children => Err(EvalError::TypeError(format!(
            "operator {} applied to {} operands",
            symbol,
            children.len()
        ))),
    }
}

// Dispatch on the left operand's runtime shape. Operands of two different
// shapes never error under == or !=; every other combination does.
fn apply_binary(
    registry: &Registry,
    symbol: &str,
    a: Value,
    b: Value,
) -> Result<Value, EvalError> {
    match (&a, &b) {
        (Value::Number(x), Value::Number(y)) => match registry.number_ops.get(symbol) {
            Some(op) => Ok(op(*x, *y)),
            None => Err(invalid_operator(symbol, &a)),
        },
        (Value::String(x), Value::String(y)) => match registry.string_ops.get(symbol) {
            Some(op) => Ok(op(x, y)),
            None => Err(invalid_operator(symbol, &a)),
        },
        (Value::Bool(x), Value::Bool(y)) => match registry.bool_ops.get(symbol) {
            Some(op) => Ok(op(*x, *y)),
            None => Err(invalid_operator(symbol, &a)),
        },
        (Value::Number(_), _) | (Value::String(_), _) | (Value::Bool(_), _) => match symbol {
            "!=" => Ok(Value::Bool(true)),
            "==" => Ok(Value::Bool(false)),
            _ => Err(EvalError::TypeError(format!(
                "cannot compare types: {}, {}",
                a.type_name(),
                b.type_name()
            ))),
        },
        _ => match registry.any_ops.get(symbol) {
            Some(op) => Ok(op(&a, &b)),
            None => Err(invalid_operator(symbol, &a)),
        },
    }
}

fn invalid_operator(symbol: &str, operand: &Value) -> EvalError {
    EvalError::TypeError(format!(
        "invalid operator for type: {}, {}",
        symbol,
        operand.type_name()
    ))
}

fn eval_call(registry: &Registry, node: &Node, msg: &Value) -> Result<Value, EvalError> {
    let name = match node.value.as_str() {
        Some(s) => s,
        None => return Err(EvalError::TypeError("function without a name".to_string())),
    };

    match node.children.as_slice() {
        [] => match registry.nullary.get(name) {
            Some(f) => f.as_ref()(),
            None => Err(EvalError::UnknownFunction(name.to_string())),
        },
        [arg] => match registry.unary.get(name) {
            Some(f) => {
                let value = eval_with(registry, arg, msg)?;
                f.as_ref()(value)
            }
            None => Err(EvalError::UnknownFunction(name.to_string())),
        },
        // the separator comma sits between the two arguments
        [first, _sep, second] => match registry.binary.get(name) {
            Some(f) => {
                let a = eval_with(registry, first, msg)?;
                let b = eval_with(registry, second, msg)?;
                f.as_ref()(a, b)
            }
            None => Err(EvalError::UnknownFunction(name.to_string())),
        },
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

// A path expression: the named field of the message, then each access step
// applied to every value produced so far. A wildcard step fans a list out
// into many values and forces the final result to stay a list.
fn eval_path(registry: &Registry, node: &Node, msg: &Value) -> Result<Value, EvalError> {
    let name = node.value.as_str().unwrap_or("");
    let first = if name.is_empty() {
        // a bare `.` selects the whole message
        msg.clone()
    } else {
        match msg {
            Value::Object(fields) => fields.get(name).cloned().unwrap_or(Value::Null),
            other => {
                return Err(EvalError::AccessError(format!(
                    "cannot read field '{}' of {}",
                    name,
                    other.type_name()
                )))
            }
        }
    };

    let mut output = vec![first];
    let mut fanned_out = false;

    for step in &node.children {
        match step.kind {
            NodeKind::Key => {
                let field = step.value.as_str().unwrap_or("");
                for slot in output.iter_mut() {
                    *slot = read_field(slot, field)?;
                }
            }
            NodeKind::Subscript => {
                let subscript = resolve_subscript(registry, step, msg)?;
                match subscript {
                    Value::String(field) => {
                        for slot in output.iter_mut() {
                            *slot = read_field(slot, &field)?;
                        }
                    }
                    Value::Number(index) => {
                        for slot in output.iter_mut() {
                            *slot = read_index(slot, index)?;
                        }
                    }
                    _ => {
                        fanned_out = true;
                        let mut widened = Vec::new();
                        for slot in mem::take(&mut output) {
                            match slot {
                                Value::Array(items) => widened.extend(items),
                                other => {
                                    return Err(EvalError::AccessError(format!(
                                        "cannot expand {} with []",
                                        other.type_name()
                                    )))
                                }
                            }
                        }
                        output = widened;
                    }
                }
            }
            _ => {}
        }
    }

    if output.len() == 1 && !fanned_out {
        Ok(output.remove(0))
    } else {
        Ok(Value::Array(output))
    }
}

// Subscript expressions are evaluated against the original message, fresh on
// every evaluation; nothing is cached in the tree.
fn resolve_subscript(registry: &Registry, step: &Node, msg: &Value) -> Result<Value, EvalError> {
    match step.children.first() {
        Some(expr) => eval_with(registry, expr, msg),
        None => Ok(step.value.clone()),
    }
}

fn read_field(slot: &Value, field: &str) -> Result<Value, EvalError> {
    match slot {
        Value::Object(fields) => Ok(fields.get(field).cloned().unwrap_or(Value::Null)),
        other => Err(EvalError::AccessError(format!(
            "cannot read field '{}' of {}",
            field,
            other.type_name()
        ))),
    }
}

fn read_index(slot: &Value, index: f64) -> Result<Value, EvalError> {
    match slot {
        Value::Array(items) => {
            let i = index as usize;
            if index < 0.0 || i >= items.len() {
                Ok(Value::Null)
            } else {
                Ok(items.get(i).cloned().unwrap_or(Value::Null))
            }
        }
        other => Err(EvalError::AccessError(format!(
            "cannot index {} with a number",
            other.type_name()
        ))),
    }
}
