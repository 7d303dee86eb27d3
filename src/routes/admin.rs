//! Resource procedure routes: one POST endpoint per procedure, JSON in and out.

use crate::handlers::resource::{create_resource, delete_resource, get_resource, get_schema, update_resource};
use crate::state::AppState;
use axum::{routing::post, Router};
use tower_http::limit::RequestBodyLimitLayer;

pub fn admin_routes(state: AppState) -> Router {
    let limit = state.settings.body_limit;
    Router::new()
        .route("/getSchema", post(get_schema))
        .route("/getResource", post(get_resource))
        .route("/updateResource", post(update_resource))
        .route("/createResource", post(create_resource))
        .route("/deleteResource", post(delete_resource))
        .layer(RequestBodyLimitLayer::new(limit))
        .with_state(state)
}
