//! In-process storage: one row vector per model behind a lock. Used by tests and demos.

use crate::error::AppError;
use crate::filter::{compare_values, Filter};
use crate::schema::{DefaultValue, FieldSchema, ModelSchema};
use crate::sort::{Sort, SortDirection};
use crate::storage::{fill_client_defaults, timestamp_now, touch_updated_at, FindMany, Row, Storage};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const DB_RANDOM_UUID: &[&str] = &["gen_random_uuid()", "uuid_generate_v4()"];

#[derive(Default)]
struct Table {
    rows: Vec<Row>,
    /// Last value handed out per autoincrement column.
    sequences: HashMap<String, i64>,
}

#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Table>>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::Storage("storage lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Table>>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::Storage("storage lock poisoned".into()))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn find_many(&self, model: &ModelSchema, args: FindMany<'_>) -> Result<Vec<Row>, AppError> {
        let tables = self.read()?;
        let mut rows: Vec<Row> = tables
            .get(&model.name)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|r| args.filter.map(|f| f.matches(r)).unwrap_or(true))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| compare_rows(a, b, args.order_by));
        let skip = usize::try_from(args.skip).unwrap_or(usize::MAX);
        let take = usize::try_from(args.take).unwrap_or(usize::MAX);
        tracing::debug!(model = %model.name, matched = rows.len(), skip, take, "memory find_many");
        Ok(rows.into_iter().skip(skip).take(take).collect())
    }

    async fn count(&self, model: &ModelSchema, filter: Option<&Filter>) -> Result<u64, AppError> {
        let tables = self.read()?;
        let n = tables
            .get(&model.name)
            .map(|t| t.rows.iter().filter(|r| filter.map(|f| f.matches(r)).unwrap_or(true)).count())
            .unwrap_or(0);
        Ok(n as u64)
    }

    async fn update_many(&self, model: &ModelSchema, filter: &Filter, data: &Row) -> Result<u64, AppError> {
        let mut data = data.clone();
        touch_updated_at(model, &mut data, &timestamp_now());

        let mut tables = self.write()?;
        let table = tables.entry(model.name.clone()).or_default();
        let mut next = table.rows.clone();
        let mut matched = 0u64;
        for row in next.iter_mut().filter(|r| filter.matches(r)) {
            matched += 1;
            for (k, v) in &data {
                row.insert(k.clone(), v.clone());
            }
        }
        if matched > 0 && !data.is_empty() {
            check_unique(model, &next)?;
            check_required(model, &next)?;
            table.rows = next;
            for (k, v) in &data {
                if let Some(field) = model.field(k) {
                    bump_sequence(table, field, v);
                }
            }
        }
        tracing::debug!(model = %model.name, matched, columns = data.len(), "memory update_many");
        Ok(matched)
    }

    async fn create(&self, model: &ModelSchema, data: &Row) -> Result<Row, AppError> {
        let mut tables = self.write()?;
        let table = tables.entry(model.name.clone()).or_default();

        let mut row = data.clone();
        fill_client_defaults(model, &mut row, &timestamp_now());
        for field in model.scalar_fields() {
            let value = match row.get(&field.name) {
                Some(v) => {
                    bump_sequence(table, field, v);
                    continue;
                }
                None => storage_default(table, field),
            };
            row.insert(field.name.clone(), value);
        }

        table.rows.push(row.clone());
        if let Err(e) = check_unique(model, &table.rows).and_then(|_| check_required(model, &table.rows)) {
            table.rows.pop();
            return Err(e);
        }
        tracing::debug!(model = %model.name, "memory create");
        Ok(row)
    }

    async fn delete_many(&self, model: &ModelSchema, filter: &Filter) -> Result<u64, AppError> {
        let mut tables = self.write()?;
        let Some(table) = tables.get_mut(&model.name) else {
            return Ok(0);
        };
        let before = table.rows.len();
        table.rows.retain(|r| !filter.matches(r));
        let removed = (before - table.rows.len()) as u64;
        tracing::debug!(model = %model.name, removed, "memory delete_many");
        Ok(removed)
    }
}

/// Value the database would fill for an absent column.
fn storage_default(table: &mut Table, field: &FieldSchema) -> Value {
    match &field.default {
        Some(DefaultValue::Generator { name, .. }) if name == "autoincrement" => {
            let seq = table.sequences.entry(field.name.clone()).or_insert(0);
            *seq += 1;
            Value::from(*seq)
        }
        Some(DefaultValue::Generator { name, args }) if name == "dbgenerated" => {
            let random_uuid = args.iter().filter_map(Value::as_str).any(|expr| {
                let expr = expr.to_lowercase();
                DB_RANDOM_UUID.iter().any(|e| expr.contains(e))
            });
            if random_uuid {
                Value::String(uuid::Uuid::new_v4().to_string())
            } else {
                Value::Null
            }
        }
        Some(DefaultValue::Literal(v)) => v.clone(),
        _ if field.is_list => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}

/// Explicit ids keep the sequence ahead of them.
fn bump_sequence(table: &mut Table, field: &FieldSchema, value: &Value) {
    if field.default_generator() != Some("autoincrement") {
        return;
    }
    if let Some(n) = value.as_i64() {
        let seq = table.sequences.entry(field.name.clone()).or_insert(0);
        *seq = (*seq).max(n);
    }
}

fn compare_rows(a: &Row, b: &Row, order_by: &[Sort]) -> Ordering {
    for s in order_by {
        let ord = compare_nullable(a.get(&s.field), b.get(&s.field));
        let ord = match s.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Nulls sort after every value, as PostgreSQL does for ascending order.
fn compare_nullable(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
    }
}

/// Column groups that must be unique: id, `@unique` fields, `@@unique` groups, compound key.
fn unique_groups(model: &ModelSchema) -> Vec<Vec<&str>> {
    let mut groups: Vec<Vec<&str>> = model
        .scalar_fields()
        .filter(|f| f.is_id || f.is_unique)
        .map(|f| vec![f.name.as_str()])
        .collect();
    groups.extend(model.unique_fields.iter().map(|g| g.iter().map(String::as_str).collect()));
    if let Some(pk) = &model.primary_key {
        groups.push(pk.fields.iter().map(String::as_str).collect());
    }
    groups
}

fn check_unique(model: &ModelSchema, rows: &[Row]) -> Result<(), AppError> {
    for group in unique_groups(model) {
        let mut seen = HashSet::new();
        for row in rows {
            let key: Vec<&Value> = group.iter().map(|c| row.get(*c).unwrap_or(&Value::Null)).collect();
            if key.iter().any(|v| v.is_null()) {
                continue;
            }
            if !seen.insert(serde_json::to_string(&key).unwrap_or_default()) {
                return Err(AppError::Storage(format!(
                    "unique constraint failed on {}({})",
                    model.name,
                    group.join(", ")
                )));
            }
        }
    }
    Ok(())
}

fn check_required(model: &ModelSchema, rows: &[Row]) -> Result<(), AppError> {
    for field in model.scalar_fields().filter(|f| f.is_required) {
        if rows.iter().any(|r| r.get(&field.name).map(Value::is_null).unwrap_or(true)) {
            return Err(AppError::Storage(format!(
                "null value in required column {}.{}",
                model.name, field.name
            )));
        }
    }
    Ok(())
}
