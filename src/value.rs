use std::collections::HashMap;
use std::fmt;

/// A stored payload. Exactly five shapes are supported; nothing nests
/// inside a hash.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Number(f64),
    Bool(bool),
    List(Vec<Value>),
    Hash(HashMap<String, Value>),
}

/// The type name reported by `type_of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    None,
    String,
    Number,
    Boolean,
    List,
    Hash,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::None => "none",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::List => "list",
            Kind::Hash => "hash",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Str(_) => Kind::String,
            Value::Number(_) => Kind::Number,
            Value::Bool(_) => Kind::Boolean,
            Value::List(_) => Kind::List,
            Value::Hash(_) => Kind::Hash,
        }
    }

    /// Scalars are the only values a hash field may hold.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Str(_) | Value::Number(_) | Value::Bool(_))
    }

    /// False for a hash holding a list or another hash. Lists may nest freely.
    pub fn is_storable(&self) -> bool {
        match self {
            Value::Hash(fields) => fields.values().all(Value::is_scalar),
            Value::List(items) => items.iter().all(Value::is_storable),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Parses a bare token the way the REPL and `VAT_SEED` do: booleans
    /// first, then finite numbers, anything else is a string.
    pub fn from_token(token: &str) -> Value {
        match token {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        match token.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Str(token.to_string()),
        }
    }

    /// Event payloads render a missing value as the `false` sentinel.
    pub(crate) fn or_sentinel(value: Option<Value>) -> Value {
        value.unwrap_or(Value::Bool(false))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Hash(map) => {
                let mut fields: Vec<_> = map.iter().collect();
                fields.sort_by(|a, b| a.0.cmp(b.0));
                f.write_str("{")?;
                for (i, (field, value)) in fields.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Hash(map)
    }
}
