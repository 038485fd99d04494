//! Runtime values stored in entity rows and compared by filters.

use serde::{Deserialize, Serialize};

/// A runtime value for an entity field.
///
/// Maps to the scalar types declared in the schema. Rows are stored as
/// ordered `(field, value)` pairs so that decoding preserves declaration
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value (absent optional field or unset foreign key).
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// UTF-8 string.
    String(String),
    /// Entity identifier as 16 bytes.
    Uuid([u8; 16]),
}

/// A stored entity row: ordered field/value pairs.
pub type Row = Vec<(String, Value)>;

/// Look up a field value in a row by name.
pub fn row_get<'a>(row: &'a [(String, Value)], field: &str) -> Option<&'a Value> {
    row.iter().find(|(name, _)| name == field).map(|(_, v)| v)
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a UUID.
    pub fn as_uuid(&self) -> Option<[u8; 16]> {
        match self {
            Value::Uuid(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<[u8; 16]> for Value {
    fn from(id: [u8; 16]) -> Self {
        Value::Uuid(id)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int64(7).as_i64(), Some(7));
        assert_eq!(Value::String("x".into()).as_str(), Some("x"));
        assert_eq!(Value::Uuid([3; 16]).as_uuid(), Some([3; 16]));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Null.as_str(), None);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(Some("a")), Value::String("a".into()));
        assert_eq!(Value::from(None::<[u8; 16]>), Value::Null);
    }

    #[test]
    fn test_row_get() {
        let row: Row = vec![
            ("id".into(), Value::Uuid([1; 16])),
            ("name".into(), Value::String("Kibbles".into())),
        ];
        assert_eq!(row_get(&row, "name"), Some(&Value::String("Kibbles".into())));
        assert_eq!(row_get(&row, "missing"), None);
    }
}
