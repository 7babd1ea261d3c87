use std::collections::HashMap;

/// A JSON-shaped value, the only datum the expression language manipulates.
///
/// Input messages, literals inside expressions, and evaluation results are
/// all `Value`s. Numbers are IEEE-754 doubles, like JSON's number type;
/// objects are string-keyed and unordered.
///
/// # Examples
///
/// ```
/// use jex::Value;
/// use std::collections::HashMap;
///
/// let null = Value::Null;
/// let flag = Value::Bool(true);
/// let n = Value::Number(3.5);
/// let s = Value::String("hello".to_string());
/// let list = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
///
/// let mut fields = HashMap::new();
/// fields.insert("price".to_string(), Value::Number(9.99));
/// let msg = Value::Object(fields);
/// ```
///
/// Messages are usually built from parsed JSON:
///
/// ```
/// use jex::Value;
///
/// let msg = Value::from(serde_json::json!({"a": {"b": 42}}));
/// assert!(matches!(msg, Value::Object(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// JSON null
    #[default]
    Null,

    /// JSON boolean
    Bool(bool),

    /// IEEE-754 double, covering every JSON number
    Number(f64),

    /// UTF-8 string
    String(String),

    /// Ordered list of values
    Array(Vec<Value>),

    /// String-keyed mapping
    Object(HashMap<String, Value>),
}

impl Value {
    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Get as number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}
