//! Typed predicate compiler: free-text query -> OR of single-field candidates.

use crate::filter::{Condition, Filter};
use crate::schema::{FieldSchema, FieldType, FullSchema, ModelSchema, ScalarType};
use crate::search::{classify_foreign_key, is_uuid, parse_float, parse_int, IdKind};
use serde_json::Value;

/// Compile `raw` against every field of `model`.
///
/// `None` for an empty query: list unfiltered. Otherwise an `Or` of candidates, possibly
/// empty, and an empty `Or` matches no rows. Never fails: text a field cannot hold simply
/// contributes no candidate for that field.
pub fn compile(raw: &str, model: &ModelSchema, schema: &FullSchema) -> Option<Filter> {
    compile_with(raw, model, schema, |_| Vec::new())
}

/// Like [`compile`], appending the clauses `extra` returns for the query (derived search fields).
pub fn compile_with<F>(raw: &str, model: &ModelSchema, schema: &FullSchema, extra: F) -> Option<Filter>
where
    F: Fn(&str) -> Vec<Filter>,
{
    if raw.is_empty() {
        return None;
    }
    let mut candidates: Vec<Filter> = model
        .fields
        .iter()
        .flat_map(|f| field_candidates(raw, f, model, schema))
        .collect();
    candidates.extend(extra(raw));
    tracing::debug!(model = %model.name, candidates = candidates.len(), "search compiled");
    Some(Filter::Or(candidates))
}

/// Candidates one field contributes for `raw`.
pub fn field_candidates(raw: &str, field: &FieldSchema, model: &ModelSchema, schema: &FullSchema) -> Vec<Filter> {
    if field.is_relation() || field.is_list {
        return Vec::new();
    }
    let eq = |v: Value| vec![Filter::equals(field.name.as_str(), v)];

    if let Some(fk) = classify_foreign_key(field, model, schema) {
        return match fk.id_kind {
            IdKind::ShortId => eq(Value::from(raw)),
            IdKind::RandomUuid if is_uuid(raw) => eq(Value::from(raw)),
            IdKind::RandomUuid => Vec::new(),
            IdKind::SequentialInt => parse_int(raw).map(|i| eq(Value::from(i))).unwrap_or_default(),
        };
    }

    match field.ty() {
        FieldType::Enum(name) => {
            let needle = raw.to_uppercase();
            schema
                .enum_by_name(name)
                .map(|e| {
                    e.values
                        .iter()
                        .filter(|v| v.name.to_uppercase().contains(&needle))
                        .map(|v| Filter::equals(field.name.as_str(), v.name.as_str()))
                        .collect()
                })
                .unwrap_or_default()
        }
        FieldType::Scalar(scalar) => match scalar {
            ScalarType::String => vec![Filter::field(
                field.name.as_str(),
                Condition::Contains {
                    value: raw.to_string(),
                    insensitive: !schema.dialect.has_case_insensitive_collation(),
                },
            )],
            ScalarType::Int => parse_int(raw).map(|i| eq(Value::from(i))).unwrap_or_default(),
            ScalarType::Float => parse_float(raw).map(|f| eq(Value::from(f))).unwrap_or_default(),
            ScalarType::Boolean
            | ScalarType::DateTime
            | ScalarType::BigInt
            | ScalarType::Decimal
            | ScalarType::Bytes
            | ScalarType::Json
            | ScalarType::Other => Vec::new(),
        },
        FieldType::Relation(_) | FieldType::Unsupported(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::load_from_value;
    use serde_json::json;

    fn schema(dialect: &str) -> FullSchema {
        load_from_value(json!({
            "dialect": dialect,
            "models": [
                { "name": "Team", "fields": [
                    { "kind": "scalar", "name": "id", "type": "Int", "isId": true,
                      "default": { "name": "autoincrement", "args": [] } }
                ]},
                { "name": "Player", "fields": [
                    { "kind": "scalar", "name": "id", "type": "String", "isId": true,
                      "default": { "name": "uuid", "args": [] } },
                    { "kind": "scalar", "name": "name", "type": "String" },
                    { "kind": "scalar", "name": "rating", "type": "Float" },
                    { "kind": "scalar", "name": "active", "type": "Boolean" },
                    { "kind": "scalar", "name": "nicknames", "type": "String", "isList": true },
                    { "kind": "enum", "name": "position", "type": "Position" },
                    { "kind": "scalar", "name": "teamId", "type": "Int" },
                    { "kind": "object", "name": "team", "type": "Team", "relationFromFields": ["teamId"] }
                ]}
            ],
            "enums": [{ "name": "Position", "values": [
                { "name": "GOALKEEPER" }, { "name": "DEFENDER" }, { "name": "FORWARD" }
            ]}]
        }))
        .unwrap()
    }

    fn fields_of(f: &Filter) -> Vec<String> {
        let Filter::Or(items) = f else { panic!("expected OR, got {:?}", f) };
        items
            .iter()
            .map(|c| match c {
                Filter::Field { field, .. } => field.clone(),
                other => panic!("unexpected clause {:?}", other),
            })
            .collect()
    }

    #[test]
    fn empty_query_means_unfiltered() {
        let s = schema("postgresql");
        assert_eq!(compile("", s.model("Player").unwrap(), &s), None);
    }

    #[test]
    fn text_only_query_hits_text_columns() {
        let s = schema("postgresql");
        let f = compile("ali", s.model("Player").unwrap(), &s).unwrap();
        assert_eq!(fields_of(&f), vec!["id", "name"]);
        let Filter::Or(items) = &f else { unreachable!() };
        assert_eq!(
            items[1],
            Filter::field("name", Condition::Contains { value: "ali".into(), insensitive: true })
        );
    }

    #[test]
    fn case_insensitive_collation_skips_mode() {
        let s = schema("mysql");
        let f = compile("ali", s.model("Player").unwrap(), &s).unwrap();
        let Filter::Or(items) = &f else { unreachable!() };
        assert_eq!(
            items[1],
            Filter::field("name", Condition::Contains { value: "ali".into(), insensitive: false })
        );
    }

    #[test]
    fn numeric_query_hits_numeric_columns_and_integer_foreign_keys() {
        let s = schema("postgresql");
        let f = compile("12", s.model("Player").unwrap(), &s).unwrap();
        assert_eq!(fields_of(&f), vec!["id", "name", "rating", "teamId"]);
        let Filter::Or(items) = &f else { unreachable!() };
        assert!(items.contains(&Filter::equals("teamId", 12)));
        assert!(items.contains(&Filter::equals("rating", 12.0)));
    }

    #[test]
    fn enum_members_match_by_substring() {
        let s = schema("postgresql");
        let f = compile("er", s.model("Player").unwrap(), &s).unwrap();
        let Filter::Or(items) = &f else { unreachable!() };
        assert!(items.contains(&Filter::equals("position", "GOALKEEPER")));
        assert!(items.contains(&Filter::equals("position", "DEFENDER")));
        assert!(!items.contains(&Filter::equals("position", "FORWARD")));
    }

    #[test]
    fn extension_clauses_are_appended() {
        let s = schema("postgresql");
        let f = compile_with("zz", s.model("Player").unwrap(), &s, |q| {
            vec![Filter::equals("name", format!("{}-alias", q))]
        })
        .unwrap();
        let Filter::Or(items) = &f else { unreachable!() };
        assert_eq!(items.last(), Some(&Filter::equals("name", "zz-alias")));
    }

    #[test]
    fn model_without_searchable_fields_matches_nothing() {
        let s = schema("postgresql");
        let f = compile("zz", s.model("Team").unwrap(), &s).unwrap();
        assert_eq!(f, Filter::Or(vec![]));
        assert!(!f.matches(&serde_json::Map::new()));
    }
}
