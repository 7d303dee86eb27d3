//! Storage capability: the five per-model primitives the resource engine calls into.

mod generate;
mod memory;
mod postgres;

pub use generate::{fill_client_defaults, short_id, timestamp_now, touch_updated_at};
pub use memory::MemoryStorage;
pub use postgres::PgStorage;

use crate::error::AppError;
use crate::filter::Filter;
use crate::schema::ModelSchema;
use crate::sort::Sort;
use async_trait::async_trait;

/// One record, keyed by field name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Arguments of a bounded, ordered fetch.
#[derive(Clone, Copy, Debug)]
pub struct FindMany<'a> {
    pub filter: Option<&'a Filter>,
    pub order_by: &'a [Sort],
    pub skip: u64,
    pub take: u64,
}

/// Data-access primitives for one storage backend. Failures come back as-is; nothing here retries.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn find_many(&self, model: &ModelSchema, args: FindMany<'_>) -> Result<Vec<Row>, AppError>;

    async fn count(&self, model: &ModelSchema, filter: Option<&Filter>) -> Result<u64, AppError>;

    /// Set only the columns present in `data` on every matching row. Returns rows matched.
    async fn update_many(&self, model: &ModelSchema, filter: &Filter, data: &Row) -> Result<u64, AppError>;

    /// Insert one row; returns it with generated and defaulted columns filled in.
    async fn create(&self, model: &ModelSchema, data: &Row) -> Result<Row, AppError>;

    async fn delete_many(&self, model: &ModelSchema, filter: &Filter) -> Result<u64, AppError>;

    /// Readiness probe.
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
