//! PostgreSQL storage via sqlx. Statements come from `crate::sql`; rows decode to JSON by column.

use crate::error::AppError;
use crate::filter::Filter;
use crate::schema::{FullSchema, ModelSchema};
use crate::sql::{self, QueryBuf, TableRef};
use crate::storage::{fill_client_defaults, timestamp_now, touch_updated_at, FindMany, Row, Storage};
use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PgStorage {
    pool: PgPool,
    schema: Arc<FullSchema>,
    namespace: Option<String>,
}

impl PgStorage {
    pub fn new(pool: PgPool, schema: Arc<FullSchema>) -> Self {
        Self {
            pool,
            schema,
            namespace: None,
        }
    }

    /// Qualify every table (and enum type) with a PostgreSQL schema name.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn table<'a>(&'a self, model: &'a ModelSchema) -> TableRef<'a> {
        TableRef::new(&self.schema, model).in_namespace(self.namespace.as_deref())
    }

    /// Run a row-returning statement; stored enum labels come back as member names.
    async fn query_many(&self, t: &TableRef<'_>, q: &QueryBuf) -> Result<Vec<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|r| {
                let mut row = row_to_json(r);
                sql::decode_enum_labels(t, &mut row);
                row
            })
            .collect())
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.execute(&self.pool).await?.rows_affected())
    }

    async fn fetch_count(&self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "count");
        let mut query = sqlx::query_scalar::<sqlx::Postgres, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let n = query.fetch_one(&self.pool).await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn find_many(&self, model: &ModelSchema, args: FindMany<'_>) -> Result<Vec<Row>, AppError> {
        let t = self.table(model);
        let q = sql::select_many(&t, args)?;
        self.query_many(&t, &q).await
    }

    async fn count(&self, model: &ModelSchema, filter: Option<&Filter>) -> Result<u64, AppError> {
        let q = sql::count(&self.table(model), filter)?;
        self.fetch_count(&q).await
    }

    async fn update_many(&self, model: &ModelSchema, filter: &Filter, data: &Row) -> Result<u64, AppError> {
        if data.is_empty() {
            // Nothing to set: report how many rows matched, touch none.
            return self.count(model, Some(filter)).await;
        }
        let mut data = data.clone();
        touch_updated_at(model, &mut data, &timestamp_now());
        let q = sql::update_many(&self.table(model), filter, &data)?;
        self.execute(&q).await
    }

    async fn create(&self, model: &ModelSchema, data: &Row) -> Result<Row, AppError> {
        let mut data = data.clone();
        fill_client_defaults(model, &mut data, &timestamp_now());
        let t = self.table(model);
        let q = sql::insert(&t, &data)?;
        self.query_many(&t, &q)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Storage(format!("insert into {} returned no row", model.name)))
    }

    async fn delete_many(&self, model: &ModelSchema, filter: &Filter) -> Result<u64, AppError> {
        let q = sql::delete_many(&self.table(model), filter)?;
        self.execute(&q).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}
