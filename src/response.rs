//! Response bodies for the procedure surface.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct CountBody {
    pub count: u64,
}

/// `{ "count": n }` for update and delete.
pub fn success_count(count: u64) -> (StatusCode, Json<CountBody>) {
    (StatusCode::OK, Json(CountBody { count }))
}

pub fn success_ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn success_created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}
