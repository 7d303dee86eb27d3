//! Generic resource engine: list/update/create/delete for any model in the schema.

use crate::error::AppError;
use crate::filter::Filter;
use crate::schema::{FullSchema, ModelSchema};
use crate::search;
use crate::service::RequestValidator;
use crate::sort::{check_sort_fields, Sort};
use crate::storage::{FindMany, Row, Storage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: u64 = 25;
pub const MAX_PAGE_SIZE: u64 = 1000;

/// 0-based page index and page size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(rename = "page", default)]
    pub page_index: u64,
    #[serde(rename = "perPage", default = "default_page_size")]
    pub page_size: u64,
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page_index: u64, page_size: u64) -> Self {
        Pagination { page_index, page_size }
    }

    /// Rows before this page, capped at the largest OFFSET PostgreSQL accepts.
    pub fn skip(&self) -> u64 {
        self.page_index.saturating_mul(self.page_size).min(i64::MAX as u64)
    }

    /// `ceil(count / page_size)`; zero rows means zero pages.
    pub fn total_pages(&self, count: u64) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        count.div_ceil(self.page_size)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    pub filter: Option<Filter>,
    pub sort: Vec<Sort>,
    pub pagination: Pagination,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourcePage {
    #[serde(rename = "results")]
    pub rows: Vec<Row>,
    #[serde(rename = "numPages")]
    pub total_pages: u64,
    /// Rows matching the filter across all pages.
    #[serde(skip)]
    pub count: u64,
}

pub struct ResourceEngine {
    schema: Arc<FullSchema>,
    storage: Arc<dyn Storage>,
    max_page_size: u64,
}

impl ResourceEngine {
    pub fn new(schema: Arc<FullSchema>, storage: Arc<dyn Storage>) -> Self {
        Self {
            schema,
            storage,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    /// Page sizes above `max` are clamped to it.
    pub fn with_max_page_size(mut self, max: u64) -> Self {
        self.max_page_size = max.max(1);
        self
    }

    pub fn schema(&self) -> &FullSchema {
        &self.schema
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Resolve a table name (first letter case-insensitive) to its model.
    pub fn model(&self, table: &str) -> Result<&ModelSchema, AppError> {
        self.schema.resolve_table(table).ok_or_else(|| {
            tracing::warn!(table = %table, "unknown resource");
            AppError::ResourceNotFound(table.to_string())
        })
    }

    /// Compile a free-text query against the table's fields. `None` means list unfiltered.
    pub fn search(&self, table: &str, raw: &str) -> Result<Option<Filter>, AppError> {
        let model = self.model(table)?;
        Ok(search::compile(raw, model, &self.schema))
    }

    pub async fn list(&self, table: &str, query: ListQuery) -> Result<ResourcePage, AppError> {
        let model = self.model(table)?;
        if query.pagination.page_size == 0 {
            return Err(AppError::BadRequest("perPage must be greater than 0".into()));
        }
        check_sort_fields(&query.sort, model)?;
        let pagination = Pagination {
            page_size: query.pagination.page_size.min(self.max_page_size),
            ..query.pagination
        };
        let filter = query.filter.as_ref();
        let args = FindMany {
            filter,
            order_by: &query.sort,
            skip: pagination.skip(),
            take: pagination.page_size,
        };
        tracing::debug!(model = %model.name, page = pagination.page_index, per_page = pagination.page_size, "list");
        let (count, rows) = tokio::try_join!(
            self.storage.count(model, filter),
            self.storage.find_many(model, args)
        )?;
        Ok(ResourcePage {
            rows,
            total_pages: pagination.total_pages(count),
            count,
        })
    }

    /// Apply a touched-field payload to every matching row. Absent fields stay as they are.
    pub async fn update(&self, table: &str, filter: &Filter, data: Row) -> Result<u64, AppError> {
        let model = self.model(table)?;
        RequestValidator::validate_partial(&data, model, &self.schema)?;
        tracing::debug!(model = %model.name, fields = data.len(), "update");
        self.storage.update_many(model, filter, &data).await
    }

    pub async fn create(&self, table: &str, data: Row) -> Result<Row, AppError> {
        let model = self.model(table)?;
        RequestValidator::validate(&data, model, &self.schema)?;
        tracing::debug!(model = %model.name, "create");
        self.storage.create(model, &data).await
    }

    pub async fn delete(&self, table: &str, filter: &Filter) -> Result<u64, AppError> {
        let model = self.model(table)?;
        tracing::debug!(model = %model.name, "delete");
        self.storage.delete_many(model, filter).await
    }
}
