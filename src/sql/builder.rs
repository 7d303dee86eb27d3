//! Builds parameterized SELECT, COUNT, UPDATE, INSERT, DELETE for a model, compiling filters to WHERE.

use crate::error::AppError;
use crate::filter::{Condition, Filter};
use crate::schema::{EnumSchema, FieldSchema, FieldType, FullSchema, ModelSchema, ScalarType};
use crate::sort::SortDirection;
use crate::sql::params::{escape_like, PgBindValue};
use crate::storage::{FindMany, Row};
use serde_json::Value;
use std::borrow::Cow;

/// Quote identifier for PostgreSQL (names come from the schema, never from request bodies).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// The table a statement targets: the model plus the schema (for enum types) and optional namespace.
#[derive(Clone, Copy)]
pub struct TableRef<'a> {
    pub schema: &'a FullSchema,
    pub model: &'a ModelSchema,
    pub namespace: Option<&'a str>,
}

impl<'a> TableRef<'a> {
    pub fn new(schema: &'a FullSchema, model: &'a ModelSchema) -> Self {
        TableRef {
            schema,
            model,
            namespace: None,
        }
    }

    pub fn in_namespace(mut self, namespace: Option<&'a str>) -> Self {
        self.namespace = namespace;
        self
    }

    fn qualified(&self, name: &str) -> String {
        match self.namespace {
            Some(ns) => format!("{}.{}", quoted(ns), quoted(name)),
            None => quoted(name),
        }
    }

    fn table(&self) -> String {
        self.qualified(self.model.storage_name())
    }

    fn field(&self, name: &str) -> Result<&'a FieldSchema, AppError> {
        match self.model.field(name) {
            Some(f) if !f.is_relation() => Ok(f),
            _ => Err(AppError::InvalidFilterInput(format!(
                "unknown column {}.{}",
                self.model.name, name
            ))),
        }
    }

    /// PostgreSQL type the placeholder is cast to. `None` for bytea, which is decoded from base64 instead.
    fn column_type(&self, field: &FieldSchema) -> Option<String> {
        let base = match field.ty() {
            FieldType::Enum(name) => {
                let storage = self
                    .schema
                    .enum_by_name(name)
                    .map(|e| e.storage_name())
                    .unwrap_or(name);
                self.qualified(storage)
            }
            FieldType::Scalar(scalar) => scalar_pg_type(scalar, field)?.to_string(),
            FieldType::Relation(_) | FieldType::Unsupported(_) => "text".to_string(),
        };
        Some(if field.is_list { format!("{}[]", base) } else { base })
    }

    /// Enum behind `field` when some of its members are stored under another label.
    fn mapped_enum(&self, field: &FieldSchema) -> Option<&'a EnumSchema> {
        match field.ty() {
            FieldType::Enum(name) => self.schema.enum_by_name(name).filter(|e| e.has_mapped_members()),
            _ => None,
        }
    }

    /// Enum member names become their stored labels; other values bind as given.
    fn storage_value<'v>(&self, field: &FieldSchema, v: &'v Value) -> Cow<'v, Value> {
        match self.mapped_enum(field) {
            Some(e) => Cow::Owned(map_strings(v, &|s: &str| e.label_for(s).to_string())),
            None => Cow::Borrowed(v),
        }
    }

    fn is_plain_text(&self, field: &FieldSchema) -> bool {
        field.scalar_type() == Some(ScalarType::String) && !field.is_native("Uuid") && !field.is_list
    }
}

fn scalar_pg_type(scalar: ScalarType, field: &FieldSchema) -> Option<&'static str> {
    Some(match scalar {
        ScalarType::String if field.is_native("Uuid") => "uuid",
        ScalarType::String => "text",
        ScalarType::Int => "int4",
        ScalarType::BigInt => "int8",
        ScalarType::Float => "float8",
        ScalarType::Decimal => "numeric",
        ScalarType::Boolean => "bool",
        ScalarType::DateTime if field.is_native("Date") => "date",
        ScalarType::DateTime if field.is_native("Timestamptz") => "timestamptz",
        ScalarType::DateTime => "timestamp",
        ScalarType::Json if field.is_native("Json") => "json",
        ScalarType::Json => "jsonb",
        ScalarType::Bytes => return None,
        ScalarType::Other => "text",
    })
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }

    /// Bind `v` for `field` and return the typed placeholder.
    fn placeholder(&mut self, t: &TableRef<'_>, field: &FieldSchema, v: &Value) -> String {
        let v = t.storage_value(field, v);
        let n = self.push_param(PgBindValue::from_json(&v, field.is_list));
        match t.column_type(field) {
            Some(ty) => format!("${}::{}", n, ty),
            None if field.is_list => format!("(SELECT array_agg(decode(x, 'base64')) FROM unnest(${}::text[]) x)", n),
            None => format!("decode(${}, 'base64')", n),
        }
    }
}

fn map_strings(v: &Value, f: &dyn Fn(&str) -> String) -> Value {
    match v {
        Value::String(s) => Value::String(f(s)),
        Value::Array(items) => Value::Array(items.iter().map(|item| map_strings(item, f)).collect()),
        other => other.clone(),
    }
}

/// Rewrite stored enum labels in a decoded row back to member names.
pub fn decode_enum_labels(t: &TableRef<'_>, row: &mut Row) {
    for field in t.model.scalar_fields() {
        let Some(e) = t.mapped_enum(field) else {
            continue;
        };
        if let Some(v) = row.get_mut(&field.name) {
            *v = map_strings(v, &|s: &str| e.member_for(s).to_string());
        }
    }
}

/// SELECT list: every scalar field aliased to its field name. Enum and numeric come back as text,
/// bytea as base64, lists as JSON, so row decoding never needs the column type.
fn select_column_list(t: &TableRef<'_>) -> String {
    t.model
        .scalar_fields()
        .map(|f| {
            let col = quoted(f.column_name());
            let expr = if f.is_list {
                format!("to_jsonb({})", col)
            } else {
                match f.ty() {
                    FieldType::Enum(_) => format!("{}::text", col),
                    FieldType::Scalar(ScalarType::Decimal) => format!("{}::text", col),
                    FieldType::Scalar(ScalarType::Bytes) => format!("encode({}, 'base64')", col),
                    FieldType::Scalar(ScalarType::Other) | FieldType::Unsupported(_) => format!("{}::text", col),
                    _ => col,
                }
            };
            format!("{} AS {}", expr, quoted(&f.name))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compile a filter tree to a boolean SQL expression, binding its values into `q`.
pub fn where_expr(q: &mut QueryBuf, t: &TableRef<'_>, filter: &Filter) -> Result<String, AppError> {
    Ok(match filter {
        Filter::And(items) if items.is_empty() => "TRUE".to_string(),
        Filter::Or(items) if items.is_empty() => "FALSE".to_string(),
        Filter::And(items) => join_exprs(q, t, items, " AND ")?,
        Filter::Or(items) => join_exprs(q, t, items, " OR ")?,
        Filter::Not(inner) => format!("NOT ({})", where_expr(q, t, inner)?),
        Filter::Field { field, condition } => {
            let f = t.field(field)?;
            let col = quoted(f.column_name());
            match condition {
                Condition::Equals(Value::Null) => format!("{} IS NULL", col),
                Condition::Equals(v) => format!("{} = {}", col, q.placeholder(t, f, v)),
                Condition::Contains { value, insensitive } => {
                    let n = q.push_param(PgBindValue::text(format!("%{}%", escape_like(value))));
                    let lhs = if t.is_plain_text(f) { col } else { format!("{}::text", col) };
                    let op = if *insensitive { "ILIKE" } else { "LIKE" };
                    format!("{} {} ${}", lhs, op, n)
                }
                Condition::In(values) if values.is_empty() => "FALSE".to_string(),
                Condition::In(values) => {
                    let phs: Vec<String> = values.iter().map(|v| q.placeholder(t, f, v)).collect();
                    format!("{} IN ({})", col, phs.join(", "))
                }
                Condition::Lt(v) => format!("{} < {}", col, q.placeholder(t, f, v)),
                Condition::Lte(v) => format!("{} <= {}", col, q.placeholder(t, f, v)),
                Condition::Gt(v) => format!("{} > {}", col, q.placeholder(t, f, v)),
                Condition::Gte(v) => format!("{} >= {}", col, q.placeholder(t, f, v)),
            }
        }
    })
}

fn join_exprs(q: &mut QueryBuf, t: &TableRef<'_>, items: &[Filter], sep: &str) -> Result<String, AppError> {
    let parts = items
        .iter()
        .map(|f| where_expr(q, t, f))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({})", parts.join(sep)))
}

fn where_clause(q: &mut QueryBuf, t: &TableRef<'_>, filter: Option<&Filter>) -> Result<String, AppError> {
    match filter {
        Some(f) => Ok(format!(" WHERE {}", where_expr(q, t, f)?)),
        None => Ok(String::new()),
    }
}

/// SELECT with filter, ORDER BY (primary key appended as tie-breaker), LIMIT/OFFSET.
pub fn select_many(t: &TableRef<'_>, args: FindMany<'_>) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, t, args.filter)?;

    let mut order = Vec::new();
    for s in args.order_by {
        let f = t.field(&s.field)?;
        let dir = match s.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        order.push(format!("{} {}", quoted(f.column_name()), dir));
    }
    for pk in t.model.primary_key_fields() {
        if args.order_by.iter().any(|s| s.field == pk) {
            continue;
        }
        let f = t.field(pk)?;
        order.push(format!("{} ASC", quoted(f.column_name())));
    }
    let order_sql = if order.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", order.join(", "))
    };

    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
        select_column_list(t),
        t.table(),
        where_sql,
        order_sql,
        args.take,
        args.skip
    );
    Ok(q)
}

pub fn count(t: &TableRef<'_>, filter: Option<&Filter>) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, t, filter)?;
    q.sql = format!("SELECT COUNT(*) FROM {}{}", t.table(), where_sql);
    Ok(q)
}

/// UPDATE: SET only the columns present in `data`. Caller handles empty `data`.
pub fn update_many(t: &TableRef<'_>, filter: &Filter, data: &Row) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(data.len());
    for (k, v) in data {
        let f = t.field(k).map_err(|_| unknown_column(t, k))?;
        let rhs = q.placeholder(t, f, v);
        sets.push(format!("{} = {}", quoted(f.column_name()), rhs));
    }
    if sets.is_empty() {
        return Err(AppError::BadRequest("update needs at least one column".into()));
    }
    let where_sql = format!(" WHERE {}", where_expr(&mut q, t, filter)?);
    q.sql = format!("UPDATE {} SET {}{}", t.table(), sets.join(", "), where_sql);
    Ok(q)
}

/// INSERT: only the columns present in `data`, so the database fills the rest from its defaults.
pub fn insert(t: &TableRef<'_>, data: &Row) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(data.len());
    let mut placeholders = Vec::with_capacity(data.len());
    for (k, v) in data {
        let f = t.field(k).map_err(|_| unknown_column(t, k))?;
        placeholders.push(q.placeholder(t, f, v));
        cols.push(quoted(f.column_name()));
    }
    let returning = select_column_list(t);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", t.table(), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            t.table(),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    Ok(q)
}

pub fn delete_many(t: &TableRef<'_>, filter: &Filter) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = format!(" WHERE {}", where_expr(&mut q, t, filter)?);
    q.sql = format!("DELETE FROM {}{}", t.table(), where_sql);
    Ok(q)
}

fn unknown_column(t: &TableRef<'_>, name: &str) -> AppError {
    AppError::BadRequest(format!("unknown column {}.{}", t.model.name, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::load_from_value;
    use crate::sort::Sort;
    use serde_json::json;

    fn schema() -> FullSchema {
        load_from_value(json!({
            "enums": [{ "name": "Role", "dbName": "user_role", "values": [{ "name": "ADMIN" }, { "name": "USER" }] }],
            "models": [{ "name": "User", "dbName": "users", "fields": [
                { "kind": "scalar", "name": "id", "type": "String", "isId": true, "nativeType": ["Uuid", []] },
                { "kind": "scalar", "name": "email", "type": "String", "dbName": "email_address" },
                { "kind": "scalar", "name": "age", "type": "Int" },
                { "kind": "enum", "name": "role", "type": "Role" },
                { "kind": "scalar", "name": "tags", "type": "String", "isList": true },
                { "kind": "scalar", "name": "avatar", "type": "Bytes" }
            ]}]
        }))
        .unwrap()
    }

    fn texts(q: &QueryBuf) -> Vec<Option<&str>> {
        q.params
            .iter()
            .map(|p| match p {
                PgBindValue::Null => None,
                PgBindValue::Text(s) => Some(s.as_str()),
            })
            .collect()
    }

    #[test]
    fn select_orders_by_requested_then_primary_key() {
        let s = schema();
        let t = TableRef::new(&s, s.model("User").unwrap());
        let filter = Filter::Or(vec![
            Filter::field("email", Condition::Contains { value: "a_b".into(), insensitive: true }),
            Filter::field("age", Condition::Gte(json!(18))),
        ]);
        let sort = [Sort::desc("age")];
        let q = select_many(&t, FindMany { filter: Some(&filter), order_by: &sort, skip: 50, take: 25 }).unwrap();
        assert!(q.sql.starts_with(
            "SELECT \"id\" AS \"id\", \"email_address\" AS \"email\", \"age\" AS \"age\", \"role\"::text AS \"role\", \
             to_jsonb(\"tags\") AS \"tags\", encode(\"avatar\", 'base64') AS \"avatar\" FROM \"users\""
        ));
        assert!(q.sql.ends_with(
            " WHERE (\"email_address\" ILIKE $1 OR \"age\" >= $2::int4) ORDER BY \"age\" DESC, \"id\" ASC LIMIT 25 OFFSET 50"
        ));
        assert_eq!(texts(&q), vec![Some("%a\\_b%"), Some("18")]);
    }

    #[test]
    fn empty_junctions_and_in_lists_are_constants() {
        let s = schema();
        let t = TableRef::new(&s, s.model("User").unwrap());
        let q = count(&t, Some(&Filter::Or(vec![]))).unwrap();
        assert_eq!(q.sql, "SELECT COUNT(*) FROM \"users\" WHERE FALSE");
        let f = Filter::And(vec![
            Filter::field("age", Condition::In(vec![])),
            Filter::Not(Box::new(Filter::equals("email", Value::Null))),
        ]);
        let q = delete_many(&t, &f).unwrap();
        assert_eq!(q.sql, "DELETE FROM \"users\" WHERE (FALSE AND NOT (\"email_address\" IS NULL))");
        assert!(q.params.is_empty());
    }

    #[test]
    fn writes_cast_enum_uuid_and_list_columns() {
        let s = schema();
        let t = TableRef::new(&s, s.model("User").unwrap()).in_namespace(Some("app"));
        let data: Row = json!({ "role": "ADMIN", "tags": ["x", "y"] }).as_object().unwrap().clone();
        let q = update_many(&t, &Filter::equals("id", "7b0c5a1e-0000-4000-8000-000000000000"), &data).unwrap();
        assert_eq!(
            q.sql,
            "UPDATE \"app\".\"users\" SET \"role\" = $1::\"app\".\"user_role\", \"tags\" = $2::text[] WHERE \"id\" = $3::uuid"
        );
        assert_eq!(texts(&q)[1], Some("{\"x\",\"y\"}"));

        let q = insert(&t, &Row::new()).unwrap();
        assert!(q.sql.starts_with("INSERT INTO \"app\".\"users\" DEFAULT VALUES RETURNING "));
    }

    #[test]
    fn mapped_enum_members_bind_and_read_as_stored_labels() {
        let s = load_from_value(json!({
            "enums": [{ "name": "Role", "dbName": "user_role", "values": [
                { "name": "ADMIN", "dbName": "admin" }, { "name": "USER", "dbName": "user" }
            ] }],
            "models": [{ "name": "User", "fields": [
                { "kind": "scalar", "name": "id", "type": "Int", "isId": true },
                { "kind": "enum", "name": "role", "type": "Role" },
                { "kind": "enum", "name": "past", "type": "Role", "isList": true }
            ]}]
        }))
        .unwrap();
        let t = TableRef::new(&s, s.model("User").unwrap());

        let q = count(&t, Some(&Filter::equals("role", "ADMIN"))).unwrap();
        assert_eq!(q.sql, "SELECT COUNT(*) FROM \"User\" WHERE \"role\" = $1::\"user_role\"");
        assert_eq!(texts(&q), vec![Some("admin")]);

        let f = Filter::field("role", Condition::In(vec![json!("USER"), json!("ADMIN")]));
        let data: Row = json!({ "past": ["USER"] }).as_object().unwrap().clone();
        let q = update_many(&t, &f, &data).unwrap();
        assert_eq!(texts(&q), vec![Some("{\"user\"}"), Some("user"), Some("admin")]);

        let mut row: Row = json!({ "id": 1, "role": "admin", "past": ["user", "admin"] })
            .as_object()
            .unwrap()
            .clone();
        decode_enum_labels(&t, &mut row);
        assert_eq!(Value::Object(row), json!({ "id": 1, "role": "ADMIN", "past": ["USER", "ADMIN"] }));
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let s = schema();
        let t = TableRef::new(&s, s.model("User").unwrap());
        let data: Row = json!({ "nope": 1 }).as_object().unwrap().clone();
        assert!(matches!(insert(&t, &data), Err(AppError::BadRequest(_))));
        assert!(matches!(
            count(&t, Some(&Filter::equals("nope", 1))),
            Err(AppError::InvalidFilterInput(_))
        ));
    }
}
