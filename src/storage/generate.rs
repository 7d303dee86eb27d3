//! Client-side default generators (`uuid()`, `cuid()`, `nanoid()`, `now()`, `@updatedAt`).

use crate::schema::ModelSchema;
use crate::storage::Row;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

/// Current instant as an RFC 3339 UTC string with millisecond precision.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Random lower-case alphanumeric id of `len` characters (max 32), prefixed like a cuid when `prefix` is set.
pub fn short_id(len: usize, prefix: Option<char>) -> String {
    let body = uuid::Uuid::new_v4().simple().to_string();
    let take = len.min(body.len());
    match prefix {
        Some(p) => format!("{}{}", p, &body[..take.saturating_sub(1)]),
        None => body[..take].to_string(),
    }
}

/// Fill absent columns whose default is generated by the client rather than the database.
pub fn fill_client_defaults(model: &ModelSchema, row: &mut Row, now: &str) {
    for field in model.scalar_fields() {
        if row.contains_key(&field.name) {
            continue;
        }
        let value = match field.default_generator() {
            Some("uuid") => Value::String(uuid::Uuid::new_v4().to_string()),
            Some("cuid") => Value::String(short_id(25, Some('c'))),
            Some("nanoid") => Value::String(short_id(21, None)),
            Some("now") => Value::String(now.to_string()),
            _ if field.is_updated_at => Value::String(now.to_string()),
            _ => continue,
        };
        row.insert(field.name.clone(), value);
    }
}

/// Stamp `@updatedAt` columns the payload leaves out. No-op for an empty payload.
pub fn touch_updated_at(model: &ModelSchema, data: &mut Row, now: &str) {
    if data.is_empty() {
        return;
    }
    for field in model.scalar_fields().filter(|f| f.is_updated_at) {
        if !data.contains_key(&field.name) {
            data.insert(field.name.clone(), Value::String(now.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ids_have_the_requested_shape() {
        let cuid = short_id(25, Some('c'));
        assert_eq!(cuid.len(), 25);
        assert!(cuid.starts_with('c'));
        let nano = short_id(21, None);
        assert_eq!(nano.len(), 21);
        assert!(nano.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
