//! Filter expressions: the `where` tree passed from search/callers to the storage capability.
//!
//! JSON shape: `{ "AND": [..], "OR": [..], "NOT": {..}, "<field>": <value> | { "<op>": .. } }`.
//! Several keys in one object are an implicit AND. An empty `OR` matches nothing; an empty `AND`
//! matches everything.

use crate::error::AppError;
use crate::schema::{FieldSchema, FullSchema, ModelSchema, ScalarType};
use crate::service::check_scalar;
use crate::storage::Row;
use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Field { field: String, condition: Condition },
}

/// Single-field predicate.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// `null` means "is null".
    Equals(Value),
    Contains { value: String, insensitive: bool },
    In(Vec<Value>),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
}

impl Filter {
    pub fn field(field: impl Into<String>, condition: Condition) -> Self {
        Filter::Field {
            field: field.into(),
            condition,
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::field(field, Condition::Equals(value.into()))
    }

    /// Conjunction that drops the wrapper for a single operand.
    pub fn all(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            filters.remove(0)
        } else {
            Filter::And(filters)
        }
    }

    /// Parse an untrusted `where` object, checking every field and operand against the model.
    pub fn from_json(value: &Value, model: &ModelSchema, schema: &FullSchema) -> Result<Filter, AppError> {
        Parser { model, schema }.object(value)
    }

    pub fn to_json(&self) -> Value {
        match self {
            Filter::And(items) => {
                serde_json::json!({ "AND": items.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
            Filter::Or(items) => {
                serde_json::json!({ "OR": items.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
            Filter::Not(inner) => serde_json::json!({ "NOT": inner.to_json() }),
            Filter::Field { field, condition } => {
                let mut obj = Map::new();
                obj.insert(field.clone(), condition.to_json());
                Value::Object(obj)
            }
        }
    }

    /// Evaluate against an in-memory row. Missing columns read as null.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::And(items) => items.iter().all(|f| f.matches(row)),
            Filter::Or(items) => items.iter().any(|f| f.matches(row)),
            Filter::Not(inner) => !inner.matches(row),
            Filter::Field { field, condition } => condition.eval(row.get(field).unwrap_or(&Value::Null)),
        }
    }
}

impl Condition {
    fn to_json(&self) -> Value {
        match self {
            Condition::Equals(v @ (Value::Object(_) | Value::Array(_))) => serde_json::json!({ "equals": v }),
            Condition::Equals(v) => v.clone(),
            Condition::Contains { value, insensitive } => {
                if *insensitive {
                    serde_json::json!({ "contains": value, "mode": "insensitive" })
                } else {
                    serde_json::json!({ "contains": value })
                }
            }
            Condition::In(values) => serde_json::json!({ "in": values }),
            Condition::Lt(v) => serde_json::json!({ "lt": v }),
            Condition::Lte(v) => serde_json::json!({ "lte": v }),
            Condition::Gt(v) => serde_json::json!({ "gt": v }),
            Condition::Gte(v) => serde_json::json!({ "gte": v }),
        }
    }

    pub fn eval(&self, actual: &Value) -> bool {
        match self {
            Condition::Equals(expected) => values_equal(actual, expected),
            Condition::Contains { value, insensitive } => match actual.as_str() {
                Some(s) if *insensitive => s.to_lowercase().contains(&value.to_lowercase()),
                Some(s) => s.contains(value.as_str()),
                None => false,
            },
            Condition::In(values) => values.iter().any(|v| values_equal(actual, v)),
            Condition::Lt(v) => compare_values(actual, v) == Some(Ordering::Less),
            Condition::Lte(v) => matches!(compare_values(actual, v), Some(Ordering::Less | Ordering::Equal)),
            Condition::Gt(v) => compare_values(actual, v) == Some(Ordering::Greater),
            Condition::Gte(v) => matches!(compare_values(actual, v), Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

/// Numbers compare numerically (so `12` equals `12.0`); everything else structurally.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

/// Ordering for comparable scalars; `None` for nulls and mixed types.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64()?.partial_cmp(&m.as_f64()?),
        (Value::String(s), Value::String(t)) => Some(s.cmp(t)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::InvalidFilterInput(msg.into())
}

struct Parser<'a> {
    model: &'a ModelSchema,
    schema: &'a FullSchema,
}

impl Parser<'_> {
    fn object(&self, value: &Value) -> Result<Filter, AppError> {
        let Value::Object(obj) = value else {
            return Err(invalid("filter must be a JSON object"));
        };
        let mut parts = Vec::with_capacity(obj.len());
        for (key, v) in obj {
            match key.as_str() {
                "AND" => parts.push(Filter::And(self.list(v, "AND")?)),
                "OR" => match v {
                    Value::Array(_) => parts.push(Filter::Or(self.list(v, "OR")?)),
                    _ => return Err(invalid("OR must be an array")),
                },
                "NOT" => parts.push(Filter::Not(Box::new(Filter::all(self.list(v, "NOT")?)))),
                _ => parts.extend(self.field(key, v)?),
            }
        }
        Ok(Filter::all(parts))
    }

    /// AND/NOT accept an object or an array of objects.
    fn list(&self, value: &Value, op: &str) -> Result<Vec<Filter>, AppError> {
        match value {
            Value::Array(items) => items.iter().map(|item| self.object(item)).collect(),
            Value::Object(_) => Ok(vec![self.object(value)?]),
            _ => Err(invalid(format!("{} must be an object or an array", op))),
        }
    }

    fn field(&self, name: &str, value: &Value) -> Result<Vec<Filter>, AppError> {
        let model = self.model;
        let field = model
            .field(name)
            .ok_or_else(|| invalid(format!("unknown field {}.{}", model.name, name)))?;
        if field.is_relation() {
            return Err(invalid(format!("relation field {} cannot be filtered directly", name)));
        }
        let ops = match value {
            Value::Object(ops) => ops,
            Value::Array(_) => return Err(invalid(format!("{}: use {{ \"in\": [..] }} to match a list", name))),
            scalar => {
                self.operand(field, scalar)?;
                return Ok(vec![Filter::equals(name, scalar.clone())]);
            }
        };

        let insensitive = match ops.get("mode") {
            None => false,
            Some(Value::String(m)) if m == "insensitive" => true,
            Some(Value::String(m)) if m == "default" => false,
            Some(other) => return Err(invalid(format!("{}: unsupported mode {}", name, other))),
        };
        if ops.contains_key("mode") && !ops.contains_key("contains") {
            return Err(invalid(format!("{}: mode requires contains", name)));
        }

        let mut out = Vec::with_capacity(ops.len());
        for (op, arg) in ops {
            let condition = match op.as_str() {
                "mode" => continue,
                "contains" => {
                    if field.scalar_type() != Some(ScalarType::String) {
                        return Err(invalid(format!("{}: contains requires a text field", name)));
                    }
                    let s = arg
                        .as_str()
                        .ok_or_else(|| invalid(format!("{}: contains expects a string", name)))?;
                    Condition::Contains {
                        value: s.to_string(),
                        insensitive,
                    }
                }
                "in" => match arg {
                    Value::Array(values) => {
                        values.iter().try_for_each(|v| self.operand(field, v))?;
                        Condition::In(values.clone())
                    }
                    _ => return Err(invalid(format!("{}: in expects an array", name))),
                },
                "equals" | "lt" | "lte" | "gt" | "gte" => {
                    self.operand(field, arg)?;
                    match op.as_str() {
                        "equals" => Condition::Equals(arg.clone()),
                        "lt" => Condition::Lt(arg.clone()),
                        "lte" => Condition::Lte(arg.clone()),
                        "gt" => Condition::Gt(arg.clone()),
                        _ => Condition::Gte(arg.clone()),
                    }
                }
                other => return Err(invalid(format!("{}: unknown operator {}", name, other))),
            };
            out.push(Filter::field(name, condition));
        }
        Ok(out)
    }

    /// An operand must have the field's type; `null` stands for "is null". List fields take arrays.
    fn operand(&self, field: &FieldSchema, v: &Value) -> Result<(), AppError> {
        match v {
            Value::Null => Ok(()),
            Value::Array(items) if field.is_list => items
                .iter()
                .try_for_each(|item| check_scalar(field, item, self.schema))
                .map_err(invalid),
            _ if field.is_list => Err(invalid(format!("{} must be an array", field.name))),
            _ => check_scalar(field, v, self.schema).map_err(invalid),
        }
    }
}
