//! Resolved schema: validated descriptors indexed for lookup. Built once, shared read-only.

use crate::case::uncapitalize;
use crate::schema::{EnumSchema, ModelSchema, StorageDialect};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullSchema {
    pub dialect: StorageDialect,
    pub models: BTreeMap<String, ModelSchema>,
    pub enums: Vec<EnumSchema>,
    /// Uncapitalized model name -> model name.
    #[serde(skip)]
    pub(crate) table_index: HashMap<String, String>,
}

impl FullSchema {
    pub fn model(&self, name: &str) -> Option<&ModelSchema> {
        self.models.get(name)
    }

    /// Look up a model by table name; the first letter is case-insensitive (`User`, `user`).
    pub fn resolve_table(&self, table: &str) -> Option<&ModelSchema> {
        self.table_index
            .get(&uncapitalize(table))
            .and_then(|name| self.models.get(name))
    }

    pub fn enum_by_name(&self, name: &str) -> Option<&EnumSchema> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}
