//! Reflected schema descriptors, shaped like the reflection provider's JSON (camelCase keys).

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Storage engine family. Decides which predicate options the search compiler emits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDialect {
    #[default]
    Postgresql,
    Cockroachdb,
    Mysql,
    Sqlite,
    Sqlserver,
    Mongodb,
}

impl StorageDialect {
    /// True when plain string comparisons are already case-insensitive under the default collation.
    pub fn has_case_insensitive_collation(self) -> bool {
        match self {
            StorageDialect::Mysql | StorageDialect::Sqlserver | StorageDialect::Sqlite => true,
            StorageDialect::Postgresql | StorageDialect::Cockroachdb | StorageDialect::Mongodb => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Scalar,
    /// Relation side pointing at another model.
    Object,
    Enum,
    Unsupported,
}

/// Built-in scalar types. Anything the provider reports that is not listed here is `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Boolean,
    DateTime,
    BigInt,
    Decimal,
    Bytes,
    Json,
    Other,
}

impl ScalarType {
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "String" => ScalarType::String,
            "Int" => ScalarType::Int,
            "Float" => ScalarType::Float,
            "Boolean" => ScalarType::Boolean,
            "DateTime" => ScalarType::DateTime,
            "BigInt" => ScalarType::BigInt,
            "Decimal" => ScalarType::Decimal,
            "Bytes" => ScalarType::Bytes,
            "Json" | "JSON" => ScalarType::Json,
            _ => ScalarType::Other,
        }
    }
}

/// Field type resolved from `kind` + `type`. Enum and relation variants carry the referenced name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType<'a> {
    Scalar(ScalarType),
    Enum(&'a str),
    Relation(&'a str),
    Unsupported(&'a str),
}

/// Column default: a named generator (`uuid()`, `autoincrement()`, `dbgenerated("...")`) or a literal.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Generator {
        name: String,
        args: Vec<serde_json::Value>,
    },
    Literal(serde_json::Value),
}

impl DefaultValue {
    pub fn generator_name(&self) -> Option<&str> {
        match self {
            DefaultValue::Generator { name, .. } => Some(name),
            DefaultValue::Literal(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;
        match v {
            serde_json::Value::Object(mut obj) if obj.contains_key("name") => {
                let name = match obj.remove("name") {
                    Some(serde_json::Value::String(s)) => s,
                    other => {
                        return Err(serde::de::Error::custom(format!(
                            "default generator name must be a string; got {:?}",
                            other
                        )))
                    }
                };
                let args = match obj.remove("args") {
                    None | Some(serde_json::Value::Null) => Vec::new(),
                    Some(serde_json::Value::Array(a)) => a,
                    Some(other) => vec![other],
                };
                Ok(DefaultValue::Generator { name, args })
            }
            other => Ok(DefaultValue::Literal(other)),
        }
    }
}

/// Native storage type annotation, e.g. `["Uuid", []]` or `["VarChar", ["255"]]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeType(pub String, pub Vec<String>);

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub kind: FieldKind,
    pub name: String,
    /// Scalar type name, enum name or related model name depending on `kind`.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_list: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_id: bool,
    #[serde(default)]
    pub is_read_only: bool,
    #[serde(default)]
    pub is_updated_at: bool,
    #[serde(default)]
    pub has_default_value: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub relation_from_fields: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub relation_to_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_type: Option<NativeType>,
}

impl FieldSchema {
    pub fn ty(&self) -> FieldType<'_> {
        match self.kind {
            FieldKind::Scalar => FieldType::Scalar(ScalarType::from_type_name(&self.type_name)),
            FieldKind::Enum => FieldType::Enum(&self.type_name),
            FieldKind::Object => FieldType::Relation(&self.type_name),
            FieldKind::Unsupported => FieldType::Unsupported(&self.type_name),
        }
    }

    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self.ty() {
            FieldType::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_relation(&self) -> bool {
        self.kind == FieldKind::Object
    }

    /// Physical column name.
    pub fn column_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or(&self.name)
    }

    pub fn default_generator(&self) -> Option<&str> {
        self.default.as_ref().and_then(DefaultValue::generator_name)
    }

    pub fn is_native(&self, native: &str) -> bool {
        self.native_type
            .as_ref()
            .map(|n| n.0.eq_ignore_ascii_case(native))
            .unwrap_or(false)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrimaryKey {
    #[serde(default)]
    pub name: Option<String>,
    pub fields: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSchema {
    pub name: String,
    #[serde(default)]
    pub db_name: Option<String>,
    pub fields: Vec<FieldSchema>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub unique_fields: Vec<Vec<String>>,
    #[serde(default)]
    pub primary_key: Option<PrimaryKey>,
}

impl ModelSchema {
    /// Physical table name.
    pub fn storage_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or(&self.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The single identifier field (`isId`). Models keyed by a compound primary key have none.
    pub fn id_field(&self) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.is_id)
    }

    /// Field names that address one row: the `isId` field, else the compound primary key.
    pub fn primary_key_fields(&self) -> Vec<&str> {
        if let Some(f) = self.id_field() {
            return vec![f.name.as_str()];
        }
        self.primary_key
            .as_ref()
            .map(|pk| pk.fields.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Non-relation fields: the columns a table or form renders.
    pub fn scalar_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| !f.is_relation())
    }

    /// Relation field implemented by the given local column, if any.
    pub fn relation_for_column(&self, column: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| f.is_relation() && f.relation_from_fields.iter().any(|c| c == column))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumMember {
    pub name: String,
    #[serde(default)]
    pub db_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumSchema {
    pub name: String,
    #[serde(default)]
    pub db_name: Option<String>,
    pub values: Vec<EnumMember>,
}

impl EnumMember {
    /// Label the database stores for this member.
    pub fn storage_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or(&self.name)
    }
}

impl EnumSchema {
    pub fn storage_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or(&self.name)
    }

    /// True when any member is stored under a label other than its name.
    pub fn has_mapped_members(&self) -> bool {
        self.values.iter().any(|m| m.db_name.is_some())
    }

    /// Member name -> stored label. Unknown names pass through.
    pub fn label_for<'a>(&'a self, member: &'a str) -> &'a str {
        self.values
            .iter()
            .find(|m| m.name == member)
            .map(EnumMember::storage_name)
            .unwrap_or(member)
    }

    /// Stored label -> member name. Unknown labels pass through.
    pub fn member_for<'a>(&'a self, label: &'a str) -> &'a str {
        self.values
            .iter()
            .find(|m| m.storage_name() == label)
            .map(|m| m.name.as_str())
            .unwrap_or(label)
    }
}

/// Models as either a list or a name-keyed map (`modelMap`).
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ModelsDescriptor {
    List(Vec<ModelSchema>),
    Map(BTreeMap<String, ModelSchema>),
}

impl Default for ModelsDescriptor {
    fn default() -> Self {
        ModelsDescriptor::List(Vec::new())
    }
}

impl ModelsDescriptor {
    pub fn into_vec(self) -> Vec<ModelSchema> {
        match self {
            ModelsDescriptor::List(v) => v,
            ModelsDescriptor::Map(m) => m.into_values().collect(),
        }
    }
}

/// Everything the reflection provider hands over, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescriptor {
    #[serde(default, alias = "dbEngineType")]
    pub dialect: StorageDialect,
    #[serde(default, alias = "modelMap")]
    pub models: ModelsDescriptor,
    #[serde(default)]
    pub enums: Vec<EnumSchema>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generator_and_literal_defaults_decode() {
        let f: FieldSchema = serde_json::from_value(json!({
            "kind": "scalar", "name": "id", "type": "String", "isId": true,
            "hasDefaultValue": true, "default": { "name": "uuid", "args": [4] }
        }))
        .unwrap();
        assert_eq!(f.default_generator(), Some("uuid"));

        let f: FieldSchema = serde_json::from_value(json!({
            "kind": "enum", "name": "role", "type": "Role", "default": "USER"
        }))
        .unwrap();
        assert_eq!(f.default, Some(DefaultValue::Literal(json!("USER"))));
        assert_eq!(f.ty(), FieldType::Enum("Role"));
    }

    #[test]
    fn null_relation_lists_decode_as_empty() {
        let f: FieldSchema = serde_json::from_value(json!({
            "kind": "scalar", "name": "title", "type": "String",
            "relationFromFields": null
        }))
        .unwrap();
        assert!(f.relation_from_fields.is_empty());
        assert_eq!(f.scalar_type(), Some(ScalarType::String));
    }

    #[test]
    fn enum_members_map_to_stored_labels_and_back() {
        let e: EnumSchema = serde_json::from_value(json!({
            "name": "Role", "values": [{ "name": "ADMIN", "dbName": "admin" }, { "name": "USER" }]
        }))
        .unwrap();
        assert!(e.has_mapped_members());
        assert_eq!(e.label_for("ADMIN"), "admin");
        assert_eq!(e.label_for("USER"), "USER");
        assert_eq!(e.member_for("admin"), "ADMIN");
        assert_eq!(e.member_for("USER"), "USER");
    }

    #[test]
    fn unknown_scalar_names_are_other() {
        assert_eq!(ScalarType::from_type_name("Geometry"), ScalarType::Other);
        assert_eq!(ScalarType::from_type_name("BigInt"), ScalarType::BigInt);
    }

    #[test]
    fn model_map_descriptor_is_accepted() {
        let d: SchemaDescriptor = serde_json::from_value(json!({
            "dbEngineType": "mysql",
            "modelMap": { "Tag": { "name": "Tag", "fields": [] } }
        }))
        .unwrap();
        assert_eq!(d.dialect, StorageDialect::Mysql);
        assert_eq!(d.models.into_vec().len(), 1);
    }
}
