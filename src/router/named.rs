//! Named-parameter queries.
//!
//! # Data Flow
//! ```text
//! "INSERT INTO t (a, b) VALUES (:a, :b)"
//!     → compile (rewrite to the dialect's positional placeholders)
//!     → bind (serialize the argument, look up each name in order)
//!     → positional SqlValues forwarded to the primary
//! ```
//!
//! # Design Decisions
//! - `::` is kept verbatim so Postgres casts survive
//! - Nothing inside single-quoted literals or comments is rewritten
//! - Dotted names address nested fields

use serde::Serialize;
use serde_json::Value;
use crate::router::error::{RouterError, RouterResult};
use crate::router::value::SqlValue;

/// Positional placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindStyle {
    /// `$1, $2, ...`
    Dollar,
    /// `?`
    Question,
}

/// A query with named placeholders rewritten to positional ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    pub sql: String,
    /// Parameter names in placeholder order. Repeated names appear repeatedly.
    pub names: Vec<String>,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Rewrite `:name` placeholders.
pub fn compile(query: &str, style: BindStyle) -> NamedQuery {
    let mut sql = String::with_capacity(query.len());
    let mut names = Vec::new();
    let mut in_literal = false;
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\'' {
            in_literal = !in_literal;
            sql.push(c);
            continue;
        }
        if in_literal {
            sql.push(c);
            continue;
        }

        // Comments are copied through untouched.
        if c == '-' && chars.peek() == Some(&'-') {
            sql.push(c);
            for n in chars.by_ref() {
                sql.push(n);
                if n == '\n' {
                    break;
                }
            }
            continue;
        }
        if c == '/' && chars.peek() == Some(&'*') {
            sql.push(c);
            sql.push('*');
            chars.next();
            let mut prev = '\0';
            for n in chars.by_ref() {
                sql.push(n);
                if prev == '*' && n == '/' {
                    break;
                }
                prev = n;
            }
            continue;
        }

        if c != ':' {
            sql.push(c);
            continue;
        }

        match chars.peek() {
            Some(':') => {
                chars.next();
                sql.push_str("::");
            }
            Some(&next) if next.is_ascii_alphanumeric() || next == '_' => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if !is_name_char(n) {
                        break;
                    }
                    name.push(n);
                    chars.next();
                }
                // A trailing dot ends the sentence, not the name.
                let trailing = name.len() - name.trim_end_matches('.').len();
                name.truncate(name.len() - trailing);

                names.push(name);
                match style {
                    BindStyle::Dollar => sql.push_str(&format!("${}", names.len())),
                    BindStyle::Question => sql.push('?'),
                }
                sql.extend(std::iter::repeat('.').take(trailing));
            }
            _ => sql.push(c),
        }
    }

    NamedQuery { sql, names }
}

impl NamedQuery {
    /// Resolve every placeholder against a serializable argument.
    pub fn bind<A: Serialize + ?Sized>(&self, arg: &A) -> RouterResult<Vec<SqlValue>> {
        let value = serde_json::to_value(arg)
            .map_err(|e| RouterError::InvalidNamedArgument(e.to_string()))?;
        if !value.is_object() {
            return Err(RouterError::InvalidNamedArgument(format!(
                "expected a map or struct, got {}",
                kind_of(&value)
            )));
        }

        self.names
            .iter()
            .map(|name| {
                lookup(&value, name)
                    .ok_or_else(|| RouterError::MissingParameter(name.clone()))
                    .and_then(SqlValue::from_json)
            })
            .collect()
    }
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |value, key| value.get(key))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_compile_question() {
        let q = compile("INSERT INTO users (name, age) VALUES (:name, :age)", BindStyle::Question);
        assert_eq!(q.sql, "INSERT INTO users (name, age) VALUES (?, ?)");
        assert_eq!(q.names, vec!["name", "age"]);
    }

    #[test]
    fn test_compile_dollar_repeats() {
        let q = compile("UPDATE t SET a = :v WHERE b = :v OR c = :w", BindStyle::Dollar);
        assert_eq!(q.sql, "UPDATE t SET a = $1 WHERE b = $2 OR c = $3");
        assert_eq!(q.names, vec!["v", "v", "w"]);
    }

    #[test]
    fn test_compile_keeps_casts_and_literals() {
        let q = compile(
            "SELECT :id::text, ':skip', 'it''s :also' FROM t WHERE x = :x",
            BindStyle::Dollar,
        );
        assert_eq!(q.sql, "SELECT $1::text, ':skip', 'it''s :also' FROM t WHERE x = $2");
        assert_eq!(q.names, vec!["id", "x"]);
    }

    #[test]
    fn test_compile_dotted_and_trailing_dot() {
        let q = compile("WHERE city = :user.city AND id = :id.", BindStyle::Question);
        assert_eq!(q.sql, "WHERE city = ? AND id = ?.");
        assert_eq!(q.names, vec!["user.city", "id"]);
    }

    #[test]
    fn test_compile_skips_comments() {
        let q = compile(
            "SELECT a -- filter on :old\nFROM t /* was :legacy */ WHERE b = :b -- :tail",
            BindStyle::Dollar,
        );
        assert_eq!(
            q.sql,
            "SELECT a -- filter on :old\nFROM t /* was :legacy */ WHERE b = $1 -- :tail"
        );
        assert_eq!(q.names, vec!["b"]);
    }

    #[test]
    fn test_compile_single_dash_and_slash() {
        let q = compile("SELECT :a - :b / 2", BindStyle::Question);
        assert_eq!(q.sql, "SELECT ? - ? / 2");
        assert_eq!(q.names, vec!["a", "b"]);
    }

    #[test]
    fn test_compile_lone_colon() {
        let q = compile("SELECT ':' || a : b", BindStyle::Question);
        assert_eq!(q.sql, "SELECT ':' || a : b");
        assert!(q.names.is_empty());
    }

    #[derive(Serialize)]
    struct Address {
        city: String,
    }

    #[derive(Serialize)]
    struct User {
        name: String,
        age: i64,
        nickname: Option<String>,
        address: Address,
    }

    #[test]
    fn test_bind_struct() {
        let user = User {
            name: "ann".into(),
            age: 31,
            nickname: None,
            address: Address { city: "Oslo".into() },
        };
        let q = compile("VALUES (:name, :age, :nickname, :address.city)", BindStyle::Question);
        let values = q.bind(&user).unwrap();
        assert_eq!(
            values,
            vec![
                SqlValue::Text("ann".into()),
                SqlValue::Int(31),
                SqlValue::Null,
                SqlValue::Text("Oslo".into()),
            ]
        );
    }

    #[test]
    fn test_bind_map() {
        let mut arg = HashMap::new();
        arg.insert("id", 7);
        let values = compile("WHERE id = :id", BindStyle::Dollar).bind(&arg).unwrap();
        assert_eq!(values, vec![SqlValue::Int(7)]);
    }

    #[test]
    fn test_bind_missing() {
        let err = compile("WHERE id = :id AND k = :k", BindStyle::Dollar)
            .bind(&json!({"id": 1}))
            .unwrap_err();
        assert!(matches!(err, RouterError::MissingParameter(name) if name == "k"));
    }

    #[test]
    fn test_bind_rejects_scalars() {
        let err = compile("WHERE id = :id", BindStyle::Dollar).bind(&5).unwrap_err();
        assert!(matches!(err, RouterError::InvalidNamedArgument(_)));
    }
}
