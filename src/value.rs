//! Runtime type tags for the dynamically typed values a store holds.

use serde_json::Value;

/// The runtime type of a stored value.
///
/// Numbers that fit an integer are reported as [`Integer`](Self::Integer),
/// everything else numeric as [`Float`](Self::Float).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// JSON `null`.
    Null,
    /// `true` / `false`.
    Bool,
    /// A number with no fractional part (`i64`/`u64` range).
    Integer,
    /// Any other number.
    Float,
    /// A string.
    String,
    /// A JSON array.
    Array,
    /// A nested JSON object.
    Object,
}

impl ValueKind {
    /// Tag for a given value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    Self::Integer
                } else {
                    Self::Float
                }
            }
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}
