//! HTTP handlers for the resource procedures.

pub mod resource;
pub use resource::*;
