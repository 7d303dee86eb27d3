//! Example consumer: a separate Rust project that uses autoadmin-sdk as a dependency,
//! serving the admin procedures over an existing PostgreSQL database.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Set `AUTOADMIN_PG_SCHEMA` to qualify tables with a PostgreSQL schema other than the search path.

use autoadmin_sdk::{
    admin_routes, common_routes_with_ready, load_from_path, AppState, PgStorage, ResourceEngine, Settings,
};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("autoadmin_sdk=info")),
        )
        .init();

    let settings = Settings::from_env();
    let schema = Arc::new(load_from_path(&settings.schema_path).await?);
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await?;

    let mut storage = PgStorage::new(pool, schema.clone());
    if let Ok(ns) = std::env::var("AUTOADMIN_PG_SCHEMA") {
        storage = storage.with_namespace(ns);
    }
    let engine = ResourceEngine::new(schema, Arc::new(storage));
    let state = AppState::new(engine, settings.clone());

    let app = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api/autoAdmin", admin_routes(state));

    let listener = TcpListener::bind(settings.bind.as_str()).await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
