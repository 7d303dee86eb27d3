//! Foreign-key identifier classification from default-value generators.

use crate::schema::{DefaultValue, FieldSchema, FullSchema, ModelSchema, ScalarType};
use serde_json::Value;

/// How identifiers in a referenced column are generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdKind {
    /// Auto-incremented integer.
    SequentialInt,
    /// Random UUID, generated client-side or by the database.
    RandomUuid,
    /// Collision-resistant short id (cuid, nanoid). Any text may match.
    ShortId,
}

#[derive(Clone, Copy, Debug)]
pub struct ForeignKey<'a> {
    pub relation: &'a FieldSchema,
    pub target: &'a ModelSchema,
    pub id_kind: IdKind,
}

const SHORT_ID_GENERATORS: &[&str] = &["cuid", "nanoid"];
const UUID_GENERATORS: &[&str] = &["uuid"];
const DB_GENERATED: &str = "dbgenerated";
const RANDOM_UUID_EXPRESSIONS: &[&str] = &["gen_random_uuid()", "uuid_generate_v4()"];

/// Classify `field` (a column of `owning_model`) as a foreign key, if some relation on the
/// model is implemented by it and its id kind can be told from the column's default generator.
pub fn classify_foreign_key<'a>(
    field: &FieldSchema,
    owning_model: &'a ModelSchema,
    schema: &'a FullSchema,
) -> Option<ForeignKey<'a>> {
    let relation = owning_model.relation_for_column(&field.name)?;
    let target = schema.model(&relation.type_name)?;
    target.id_field()?;
    let id_kind = id_kind_of(field)?;
    Some(ForeignKey {
        relation,
        target,
        id_kind,
    })
}

fn id_kind_of(field: &FieldSchema) -> Option<IdKind> {
    if let Some(generator) = field.default_generator() {
        if SHORT_ID_GENERATORS.contains(&generator) {
            return Some(IdKind::ShortId);
        }
        if UUID_GENERATORS.contains(&generator) || is_random_uuid_expression(field) {
            return Some(IdKind::RandomUuid);
        }
    }
    match field.scalar_type() {
        Some(ScalarType::Int) => Some(IdKind::SequentialInt),
        _ => None,
    }
}

fn is_random_uuid_expression(field: &FieldSchema) -> bool {
    let Some(DefaultValue::Generator { name, args }) = &field.default else {
        return false;
    };
    name == DB_GENERATED
        && args.iter().any(|arg| match arg {
            Value::String(expr) => {
                let expr = expr.to_lowercase();
                RANDOM_UUID_EXPRESSIONS.iter().any(|e| expr.contains(e))
            }
            _ => false,
        })
}
