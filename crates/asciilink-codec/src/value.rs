use std::fmt;

use serde::{Deserialize, Serialize};

/// A symbolic payload value, before encoding or after decoding.
///
/// Integer fields decode to [`Value::Int`], raw and enumeration fields to
/// [`Value::Text`], frames to a [`Value::Sequence`] in field order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Text(String),
    Sequence(Vec<Value>),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Text(_) => "text",
            Value::Sequence(_) => "sequence",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(values) => Some(values),
            _ => None,
        }
    }

    /// The empty text value, used as the body of argument-less writes.
    pub fn empty() -> Self {
        Value::Text(String::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Sequence(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(values: Vec<V>) -> Self {
        Value::Sequence(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_flattens_sequences() {
        let value = Value::Sequence(vec![
            Value::from("000123"),
            Value::Int(7),
            Value::from("Closed"),
        ]);
        assert_eq!(value.to_string(), "[000123, 7, Closed]");
    }

    #[test]
    fn serializes_untagged() {
        let value = Value::from(vec![Value::Int(5), Value::from("Opened")]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"[5,"Opened"]"#);
    }

    #[test]
    fn accessors_match_variant() {
        assert_eq!(Value::Int(3).as_int(), Some(3));
        assert_eq!(Value::from("x").as_text(), Some("x"));
        assert!(Value::from("x").as_int().is_none());
        assert_eq!(Value::empty().as_text(), Some(""));
        assert_eq!(Value::Sequence(vec![]).kind(), "sequence");
    }
}
