//! ResourceEngine: generic CRUD over the storage capability, validated against the schema.

mod resource;
mod validation;
pub use resource::{ListQuery, Pagination, ResourceEngine, ResourcePage, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub(crate) use validation::check_scalar;
pub use validation::RequestValidator;
