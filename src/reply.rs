use std::collections::HashMap;
use std::fmt;

use crate::value::Value;

/// What the REPL prints after a command, rendered redis-cli style.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok,
    Nil,
    Integer(i64),
    Bulk(String),
    Status(String),
    Array(Vec<Reply>),
    Error(String),
}

impl Reply {
    pub fn error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    pub fn flag(value: bool) -> Self {
        Reply::Integer(i64::from(value))
    }

    pub fn from_value(value: Option<Value>) -> Self {
        match value {
            None => Reply::Nil,
            Some(Value::Str(s)) => Reply::Bulk(s),
            Some(Value::Number(n)) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                Reply::Integer(n as i64)
            }
            Some(Value::List(items)) => {
                Reply::Array(items.into_iter().map(|v| Reply::from_value(Some(v))).collect())
            }
            Some(Value::Hash(map)) => Reply::from_hash(map),
            Some(other) => Reply::Bulk(other.to_string()),
        }
    }

    pub fn from_number(value: Option<f64>) -> Self {
        Reply::from_value(value.map(Value::Number))
    }

    /// Field/value pairs flattened, fields sorted so output is stable.
    pub fn from_hash(map: HashMap<String, Value>) -> Self {
        let mut fields: Vec<_> = map.into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        Reply::Array(
            fields
                .into_iter()
                .flat_map(|(field, value)| [Reply::Bulk(field), Reply::from_value(Some(value))])
                .collect(),
        )
    }

    pub fn from_strings(items: Vec<String>) -> Self {
        Reply::Array(items.into_iter().map(Reply::Bulk).collect())
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Nil => f.write_str("(nil)"),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(s) => write!(f, "{:?}", s),
            Reply::Status(s) => f.write_str(s),
            Reply::Error(msg) => write!(f, "(error) {}", msg),
            Reply::Array(items) if items.is_empty() => f.write_str("(empty array)"),
            Reply::Array(items) => {
                let width = items.len().to_string().len();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "\n{:indent$}", "", indent = indent)?;
                    }
                    write!(f, "{:>width$}) ", i + 1, width = width)?;
                    item.render(f, indent + width + 2)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}
