//! Resource procedure handlers: getSchema, getResource, updateResource, createResource, deleteResource.

use crate::error::AppError;
use crate::filter::Filter;
use crate::response::{success_count, success_created, success_ok, CountBody};
use crate::schema::{FullSchema, ModelSchema};
use crate::service::{ListQuery, Pagination, ResourcePage};
use crate::sort::sort_from_json;
use crate::state::AppState;
use crate::storage::Row;
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct PaginationInput {
    pub page: Option<u64>,
    #[serde(rename = "perPage")]
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResourceInput {
    pub table: String,
    #[serde(default, rename = "where")]
    pub filter: Option<Value>,
    #[serde(default)]
    pub order_by: Option<Value>,
    #[serde(default)]
    pub pagination: Option<PaginationInput>,
    /// Free-text search, compiled per field and AND-ed with `where`.
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResourceInput {
    pub table: String,
    #[serde(default, rename = "where")]
    pub filter: Option<Value>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct CreateResourceInput {
    pub table: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct DeleteResourceInput {
    pub table: String,
    #[serde(default, rename = "where")]
    pub filter: Option<Value>,
}

fn body_to_row(value: Value) -> Result<Row, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        Value::Null => Ok(Row::new()),
        _ => Err(AppError::BadRequest("data must be a JSON object".into())),
    }
}

/// Mutations must name their rows; an absent `where` is rejected rather than read as "all rows".
fn required_filter(value: Option<Value>, model: &ModelSchema, schema: &FullSchema) -> Result<Filter, AppError> {
    match value {
        Some(v) if !v.is_null() => Filter::from_json(&v, model, schema),
        _ => Err(AppError::BadRequest("where is required".into())),
    }
}

pub async fn get_schema(State(state): State<AppState>) -> (StatusCode, Json<FullSchema>) {
    success_ok(state.engine.schema().clone())
}

pub async fn get_resource(
    State(state): State<AppState>,
    Json(input): Json<GetResourceInput>,
) -> Result<(StatusCode, Json<ResourcePage>), AppError> {
    let engine = &state.engine;
    let model = engine.model(&input.table)?;

    let mut parts = Vec::new();
    if let Some(v) = input.filter.as_ref().filter(|v| !v.is_null()) {
        parts.push(Filter::from_json(v, model, engine.schema())?);
    }
    if let Some(raw) = input.search.as_deref() {
        if let Some(f) = engine.search(&input.table, raw)? {
            parts.push(f);
        }
    }
    let filter = if parts.is_empty() { None } else { Some(Filter::all(parts)) };

    let sort = match &input.order_by {
        Some(v) => sort_from_json(v, model)?,
        None => Vec::new(),
    };
    let p = input.pagination.unwrap_or_default();
    let pagination = Pagination::new(
        p.page.unwrap_or(0),
        p.per_page.unwrap_or(state.settings.default_page_size),
    );

    let page = engine
        .list(&input.table, ListQuery { filter, sort, pagination })
        .await?;
    Ok(success_ok(page))
}

pub async fn update_resource(
    State(state): State<AppState>,
    Json(input): Json<UpdateResourceInput>,
) -> Result<(StatusCode, Json<CountBody>), AppError> {
    let model = state.engine.model(&input.table)?;
    let filter = required_filter(input.filter, model, state.engine.schema())?;
    let data = body_to_row(input.data)?;
    let n = state.engine.update(&input.table, &filter, data).await?;
    Ok(success_count(n))
}

pub async fn create_resource(
    State(state): State<AppState>,
    Json(input): Json<CreateResourceInput>,
) -> Result<(StatusCode, Json<Row>), AppError> {
    let data = body_to_row(input.data)?;
    let row = state.engine.create(&input.table, data).await?;
    Ok(success_created(row))
}

pub async fn delete_resource(
    State(state): State<AppState>,
    Json(input): Json<DeleteResourceInput>,
) -> Result<(StatusCode, Json<CountBody>), AppError> {
    let model = state.engine.model(&input.table)?;
    let filter = required_filter(input.filter, model, state.engine.schema())?;
    let n = state.engine.delete(&input.table, &filter).await?;
    Ok(success_count(n))
}
