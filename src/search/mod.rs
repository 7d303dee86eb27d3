//! Free-text search: foreign-key id classification and the typed predicate compiler.

mod classify;
mod compile;
mod lexical;

pub use classify::{classify_foreign_key, ForeignKey, IdKind};
pub use compile::{compile, compile_with, field_candidates};
pub use lexical::{is_uuid, parse_float, parse_int};
