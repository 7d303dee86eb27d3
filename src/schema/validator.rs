//! Schema validation: referential integrity between models, relations and enums.

use crate::case::uncapitalize;
use crate::error::SchemaError;
use crate::schema::{FieldKind, ModelSchema, SchemaDescriptor};
use std::collections::HashSet;

pub fn validate(descriptor: &SchemaDescriptor, models: &[ModelSchema]) -> Result<(), SchemaError> {
    let mut model_names = HashSet::new();
    let mut table_names = HashSet::new();
    for m in models {
        if !model_names.insert(m.name.as_str()) {
            return Err(SchemaError::Duplicate {
                kind: "model",
                name: m.name.clone(),
            });
        }
        // Table lookup ignores the first letter's case, so `User` and `user` collide.
        if !table_names.insert(uncapitalize(&m.name)) {
            return Err(SchemaError::Duplicate {
                kind: "table",
                name: m.name.clone(),
            });
        }
    }

    let mut enum_names = HashSet::new();
    for e in &descriptor.enums {
        if !enum_names.insert(e.name.as_str()) {
            return Err(SchemaError::Duplicate {
                kind: "enum",
                name: e.name.clone(),
            });
        }
        let mut members = HashSet::new();
        for v in &e.values {
            if !members.insert(v.name.as_str()) {
                return Err(SchemaError::Duplicate {
                    kind: "enum member",
                    name: format!("{}.{}", e.name, v.name),
                });
            }
        }
    }

    for m in models {
        let mut field_names = HashSet::new();
        for f in &m.fields {
            if !field_names.insert(f.name.as_str()) {
                return Err(SchemaError::Duplicate {
                    kind: "field",
                    name: format!("{}.{}", m.name, f.name),
                });
            }
        }

        for f in &m.fields {
            match f.kind {
                FieldKind::Object => {
                    if !model_names.contains(f.type_name.as_str()) {
                        return Err(SchemaError::MissingReference {
                            kind: "model",
                            name: f.type_name.clone(),
                            owner: format!("{}.{}", m.name, f.name),
                        });
                    }
                    for col in &f.relation_from_fields {
                        let local = m.field(col).filter(|c| !c.is_relation());
                        if local.is_none() {
                            return Err(SchemaError::MissingReference {
                                kind: "relation column",
                                name: col.clone(),
                                owner: format!("{}.{}", m.name, f.name),
                            });
                        }
                    }
                }
                FieldKind::Enum => {
                    if !enum_names.contains(f.type_name.as_str()) {
                        return Err(SchemaError::MissingReference {
                            kind: "enum",
                            name: f.type_name.clone(),
                            owner: format!("{}.{}", m.name, f.name),
                        });
                    }
                }
                FieldKind::Scalar | FieldKind::Unsupported => {}
            }
        }

        if m.primary_key_fields().is_empty() {
            return Err(SchemaError::MissingIdentifier(m.name.clone()));
        }
    }

    Ok(())
}
