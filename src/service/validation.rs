//! Payload validation against the model's field descriptors.

use crate::error::AppError;
use crate::schema::{FieldSchema, FieldType, FullSchema, ModelSchema, ScalarType};
use crate::storage::Row;
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create payload: every required column without a default must be present.
    pub fn validate(data: &Row, model: &ModelSchema, schema: &FullSchema) -> Result<(), AppError> {
        for field in model.scalar_fields() {
            let defaulted = field.has_default_value || field.default.is_some() || field.is_updated_at;
            if field.is_required && !field.is_list && !defaulted && !data.contains_key(&field.name) {
                return Err(AppError::BadRequest(format!("{} is required", field.name)));
            }
        }
        Self::validate_partial(data, model, schema)
    }

    /// Validate only the fields present in `data` (touched-field updates).
    pub fn validate_partial(data: &Row, model: &ModelSchema, schema: &FullSchema) -> Result<(), AppError> {
        for (name, v) in data {
            let field = model
                .field(name)
                .ok_or_else(|| AppError::BadRequest(format!("unknown field {}.{}", model.name, name)))?;
            if field.is_relation() {
                return Err(AppError::BadRequest(format!(
                    "{} is a relation; set its foreign key column instead",
                    name
                )));
            }
            validate_field(field, v, schema)?;
        }
        Ok(())
    }
}

fn validate_field(field: &FieldSchema, v: &Value, schema: &FullSchema) -> Result<(), AppError> {
    let name = &field.name;
    if v.is_null() {
        if field.is_required {
            return Err(AppError::BadRequest(format!("{} is required", name)));
        }
        return Ok(());
    }
    if field.is_list {
        let Value::Array(items) = v else {
            return Err(AppError::BadRequest(format!("{} must be an array", name)));
        };
        return items.iter().try_for_each(|item| validate_scalar(field, item, schema));
    }
    validate_scalar(field, v, schema)
}

fn validate_scalar(field: &FieldSchema, v: &Value, schema: &FullSchema) -> Result<(), AppError> {
    check_scalar(field, v, schema).map_err(AppError::BadRequest)
}

/// Type check for one non-list value; the error is a message naming the field.
pub(crate) fn check_scalar(field: &FieldSchema, v: &Value, schema: &FullSchema) -> Result<(), String> {
    let name = &field.name;
    let ok = match field.ty() {
        FieldType::Enum(enum_name) => match (v.as_str(), schema.enum_by_name(enum_name)) {
            (Some(s), Some(e)) => {
                if !e.values.iter().any(|m| m.name == s) {
                    return Err(format!(
                        "{} must be one of: {}",
                        name,
                        e.values.iter().map(|m| m.name.as_str()).collect::<Vec<_>>().join(", ")
                    ));
                }
                true
            }
            (s, _) => s.is_some(),
        },
        FieldType::Scalar(scalar) => match scalar {
            ScalarType::String | ScalarType::Bytes => v.is_string(),
            ScalarType::Int => v.as_i64().map(|n| i32::try_from(n).is_ok()).unwrap_or(false),
            ScalarType::BigInt => v.is_i64() || v.as_str().map(|s| s.parse::<i64>().is_ok()).unwrap_or(false),
            ScalarType::Float => v.is_number(),
            ScalarType::Decimal => v.is_number() || v.as_str().map(|s| s.parse::<f64>().is_ok()).unwrap_or(false),
            ScalarType::Boolean => v.is_boolean(),
            ScalarType::DateTime => v.as_str().map(is_datetime).unwrap_or(false),
            ScalarType::Json | ScalarType::Other => true,
        },
        FieldType::Relation(_) | FieldType::Unsupported(_) => true,
    };
    if ok {
        Ok(())
    } else {
        Err(format!("{} must be a valid {}", name, field.type_name))
    }
}

/// RFC 3339 instant, or a bare `YYYY-MM-DD` / `YYYY-MM-DDTHH:MM[:SS]` as a datetime-local input sends it.
fn is_datetime(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").is_ok()
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
