//! Autoadmin SDK: schema-driven admin data layer. Typed free-text search, generic resource CRUD
//! over a pluggable storage capability, and presentation rules for admin UIs.

pub mod case;
pub mod error;
pub mod filter;
pub mod presentation;
pub mod response;
pub mod schema;
pub mod search;
pub mod settings;
pub mod sort;
pub mod sql;
pub mod state;
pub mod storage;
pub mod service;
pub mod handlers;
pub mod routes;

pub use error::{AppError, SchemaError};
pub use filter::{Condition, Filter};
pub use schema::{load_from_path, load_from_str, resolve, FullSchema, ModelSchema, StorageDialect};
pub use search::{classify_foreign_key, compile, compile_with, IdKind};
pub use settings::Settings;
pub use sort::{parse_sort, toggle_sort, Sort, SortDirection};
pub use state::AppState;
pub use storage::{MemoryStorage, PgStorage, Row, Storage};
pub use routes::{admin_routes, common_routes, common_routes_with_ready};
pub use service::{ListQuery, Pagination, ResourceEngine, ResourcePage};
