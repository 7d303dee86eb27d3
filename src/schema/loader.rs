//! Build the resolved schema from a reflected descriptor (in memory, string or file).

use crate::case::uncapitalize;
use crate::error::SchemaError;
use crate::schema::{validate, FullSchema, SchemaDescriptor};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Validate and index a descriptor.
pub fn resolve(descriptor: SchemaDescriptor) -> Result<FullSchema, SchemaError> {
    let models = descriptor.models.clone().into_vec();
    validate(&descriptor, &models)?;

    let table_index: HashMap<String, String> = models
        .iter()
        .map(|m| (uncapitalize(&m.name), m.name.clone()))
        .collect();
    let models: BTreeMap<String, _> = models.into_iter().map(|m| (m.name.clone(), m)).collect();

    tracing::debug!(models = models.len(), enums = descriptor.enums.len(), "schema resolved");
    Ok(FullSchema {
        dialect: descriptor.dialect,
        models,
        enums: descriptor.enums,
        table_index,
    })
}

pub fn load_from_str(json: &str) -> Result<FullSchema, SchemaError> {
    let descriptor: SchemaDescriptor =
        serde_json::from_str(json).map_err(|e| SchemaError::Load(e.to_string()))?;
    resolve(descriptor)
}

pub fn load_from_value(value: serde_json::Value) -> Result<FullSchema, SchemaError> {
    let descriptor: SchemaDescriptor =
        serde_json::from_value(value).map_err(|e| SchemaError::Load(e.to_string()))?;
    resolve(descriptor)
}

/// Read the descriptor file written by the reflection provider.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<FullSchema, SchemaError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SchemaError::Load(format!("{}: {}", path.display(), e)))?;
    load_from_str(&raw)
}
