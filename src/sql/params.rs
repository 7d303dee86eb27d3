//! Convert serde_json::Value to text parameters. Every placeholder carries an explicit cast,
//! so PostgreSQL parses the text into the column type.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// A value bound as TEXT (or NULL).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PgBindValue {
    Null,
    Text(String),
}

impl PgBindValue {
    /// Scalars become their literal text. Arrays become a PostgreSQL array literal when
    /// `as_array` is set and JSON text otherwise; objects are always JSON text.
    pub fn from_json(v: &Value, as_array: bool) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Bool(b) => PgBindValue::Text(b.to_string()),
            Value::Number(n) => PgBindValue::Text(n.to_string()),
            Value::String(s) => PgBindValue::Text(s.clone()),
            Value::Array(items) if as_array => PgBindValue::Text(array_literal(items)),
            Value::Array(_) | Value::Object(_) => PgBindValue::Text(v.to_string()),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        PgBindValue::Text(s.into())
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            PgBindValue::Null => Ok(IsNull::Yes),
            PgBindValue::Text(s) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf),
        }
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

/// Escape LIKE metacharacters (`\`, `%`, `_`) so the needle matches literally.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// PostgreSQL array literal: `{"a","b",NULL}`. Elements are always quoted.
pub fn array_literal(items: &[Value]) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|v| match v {
            Value::Null => "NULL".to_string(),
            Value::String(s) => quote_element(s),
            other => quote_element(&other.to_string()),
        })
        .collect();
    format!("{{{}}}", parts.join(","))
}

fn quote_element(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
