//! Positional query arguments.

use serde_json::Value;
use sqlx::any::AnyArguments;
use sqlx::Arguments;

use crate::router::error::{RouterError, RouterResult};

/// A single argument bound to a forwarded query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Bound as a NULL of text type. SQLite and MySQL accept it for any
    /// column; Postgres may reject it for a non-text column unless the
    /// placeholder carries a cast (`$1::int`).
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Convert a JSON value, as produced by serializing a named argument.
    ///
    /// Arrays and objects are bound as their JSON text. Integers beyond the
    /// `i64` range are rejected rather than rounded through `f64`.
    pub fn from_json(value: &Value) -> RouterResult<Self> {
        Ok(match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => SqlValue::Int(i),
                _ if n.is_u64() => {
                    return Err(RouterError::InvalidNamedArgument(format!(
                        "integer {} does not fit in i64",
                        n
                    )))
                }
                (None, Some(f)) => SqlValue::Float(f),
                (None, None) => {
                    return Err(RouterError::InvalidNamedArgument(format!(
                        "unrepresentable number {}",
                        n
                    )))
                }
            },
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
        })
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v.into())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::Int(v.into())
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// Bind values into client arguments, in order.
pub(crate) fn to_arguments<'q>(values: &[SqlValue]) -> Result<AnyArguments<'q>, sqlx::Error> {
    let mut args = AnyArguments::default();
    for value in values {
        let added = match value {
            SqlValue::Null => args.add(None::<String>),
            SqlValue::Bool(v) => args.add(*v),
            SqlValue::Int(v) => args.add(*v),
            SqlValue::Float(v) => args.add(*v),
            SqlValue::Text(v) => args.add(v.clone()),
            SqlValue::Bytes(v) => args.add(v.clone()),
        };
        added.map_err(sqlx::Error::Encode)?;
    }
    Ok(args)
}

/// Build a `Vec<SqlValue>` from heterogeneous arguments.
///
/// ```ignore
/// router.select::<User>("SELECT * FROM users WHERE age > ? AND name = ?", &args![30, "ann"]).await?;
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::router::SqlValue>::new() };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::router::SqlValue::from($value)),+]
    };
}
