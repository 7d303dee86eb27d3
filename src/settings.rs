//! Process settings read from the environment. Binaries call `dotenvy::dotenv()` first.

use crate::service::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use std::path::PathBuf;

pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    /// Reflected schema descriptor (JSON).
    pub schema_path: PathBuf,
    pub bind: String,
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub body_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "postgres://localhost/autoadmin".into(),
            schema_path: PathBuf::from("schema.json"),
            bind: "0.0.0.0:3000".into(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing or unparseable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Settings::default();
        let num = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok()).filter(|n| *n > 0);
        let max_page_size = num("AUTOADMIN_MAX_PAGE_SIZE").unwrap_or(d.max_page_size);
        Settings {
            database_url: lookup("DATABASE_URL").unwrap_or(d.database_url),
            schema_path: lookup("AUTOADMIN_SCHEMA_PATH").map(PathBuf::from).unwrap_or(d.schema_path),
            bind: lookup("AUTOADMIN_BIND").unwrap_or(d.bind),
            default_page_size: num("AUTOADMIN_DEFAULT_PAGE_SIZE")
                .unwrap_or(d.default_page_size)
                .min(max_page_size),
            max_page_size,
            body_limit: num("AUTOADMIN_BODY_LIMIT")
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(d.body_limit),
        }
    }
}
