//! Demo server: loads a reflected schema descriptor, serves it from in-memory storage,
//! mounts common and resource routes under /api/autoAdmin.
//!
//! `AUTOADMIN_SCHEMA_PATH=demos/schema.json cargo run --example server`

use autoadmin_sdk::{
    admin_routes, common_routes_with_ready, load_from_path, AppState, MemoryStorage, ResourceEngine, Settings,
};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("autoadmin_sdk=info".parse()?))
        .init();

    let settings = Settings::from_env();
    let schema = Arc::new(load_from_path(&settings.schema_path).await?);
    tracing::info!(
        models = schema.models.len(),
        path = %settings.schema_path.display(),
        "schema loaded"
    );

    let engine = ResourceEngine::new(schema, Arc::new(MemoryStorage::new()));
    let state = AppState::new(engine, settings.clone());

    let app = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api/autoAdmin", admin_routes(state));

    let listener = TcpListener::bind(settings.bind.as_str()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
