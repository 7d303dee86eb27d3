//! Presentation rules for admin UIs: field labels, blank form values, input widgets,
//! table cell rendering, pagination links and touched-field payloads.
//!
//! Everything here is a pure function of the schema and the values passed in.

use crate::case::{capitalize, split_camel_words};
use crate::schema::{EnumSchema, FieldSchema, FieldType, ModelSchema, ScalarType};
use crate::storage::{timestamp_now, Row};
use serde::Serialize;
use serde_json::Value;

/// Fields a form shows but never lets the user edit.
pub const READ_ONLY_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

/// Human label for a field: camelCase split into words, `Id` normalised to `ID`,
/// datetimes suffixed with ` (UTC)`. `"authorId"` -> `"Author ID"`.
pub fn title_for(field: &FieldSchema) -> String {
    let words: Vec<String> = split_camel_words(&field.name)
        .into_iter()
        .map(|w| if w.eq_ignore_ascii_case("id") { "ID".to_string() } else { w })
        .collect();
    let title = capitalize(&words.join(" "));
    if field.scalar_type() == Some(ScalarType::DateTime) {
        format!("{} (UTC)", title)
    } else {
        title
    }
}

/// Blank value a form starts from when a nullable field is switched on, or a new record is drafted.
pub fn default_value_for(field: &FieldSchema, enums: &[EnumSchema]) -> Value {
    default_value_at(field, enums, &timestamp_now())
}

/// `default_value_for` with the current instant supplied by the caller.
pub fn default_value_at(field: &FieldSchema, enums: &[EnumSchema], now: &str) -> Value {
    match field.ty() {
        FieldType::Scalar(ScalarType::String) => Value::String(String::new()),
        FieldType::Scalar(ScalarType::Int | ScalarType::Float) => Value::from(0),
        FieldType::Scalar(ScalarType::Boolean) => Value::Bool(false),
        FieldType::Scalar(ScalarType::DateTime) => Value::String(now.to_string()),
        FieldType::Enum(name) => enums
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.values.first())
            .map(|m| Value::String(m.name.clone()))
            .unwrap_or_else(|| Value::String(String::new())),
        _ => Value::String(String::new()),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WidgetKind {
    Select { options: Vec<String> },
    /// `reference` names the model a foreign-key column points at.
    Text { reference: Option<String> },
    Number { integer: bool },
    Checkbox,
    DateTimeLocal,
    /// Types without a dedicated editor get a plain text box tagged with the type name.
    Fallback {
        #[serde(rename = "typeName")]
        type_name: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputWidget {
    pub kind: WidgetKind,
    pub read_only: bool,
}

pub fn input_widget_for(field: &FieldSchema, model: &ModelSchema, enums: &[EnumSchema]) -> InputWidget {
    let kind = match field.ty() {
        FieldType::Enum(name) => match enums.iter().find(|e| e.name == name) {
            Some(e) => WidgetKind::Select {
                options: e.values.iter().map(|m| m.name.clone()).collect(),
            },
            None => WidgetKind::Fallback {
                type_name: field.type_name.clone(),
            },
        },
        FieldType::Scalar(ScalarType::String) => WidgetKind::Text {
            reference: model
                .relation_for_column(&field.name)
                .map(|r| r.type_name.clone()),
        },
        FieldType::Scalar(ScalarType::Int) => WidgetKind::Number { integer: true },
        FieldType::Scalar(ScalarType::Float) => WidgetKind::Number { integer: false },
        FieldType::Scalar(ScalarType::Boolean) => WidgetKind::Checkbox,
        FieldType::Scalar(ScalarType::DateTime) => WidgetKind::DateTimeLocal,
        _ => WidgetKind::Fallback {
            type_name: field.type_name.clone(),
        },
    };
    InputWidget {
        kind,
        read_only: READ_ONLY_FIELDS.contains(&field.name.as_str()),
    }
}

/// Value for a `datetime-local` input: the stored instant without fractional seconds or zone.
pub fn datetime_input_value(stored: &str) -> &str {
    stored.split('.').next().unwrap_or(stored)
}

/// Stored instant from a `datetime-local` input value (interpreted as UTC).
pub fn datetime_from_input(input: &str) -> String {
    format!("{}.000Z", input)
}

/// How one table cell renders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CellDisplay {
    Null,
    Text { text: String },
    /// The `id` column shows only its first `-`-separated segment.
    ShortId { text: String },
    /// A foreign-key column, linking to the referenced record.
    Reference { target: String, id: String, label: String },
    /// Datetimes show the date part.
    Date { text: String },
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn first_segment(s: &str) -> String {
    s.split('-').next().unwrap_or(s).to_string()
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

pub fn display_value(model: &ModelSchema, field: &FieldSchema, value: &Value) -> CellDisplay {
    if field.name == "id" {
        if value.is_null() {
            return CellDisplay::Null;
        }
        return CellDisplay::ShortId {
            text: first_segment(&value_text(value)),
        };
    }
    if field.name.to_uppercase().ends_with("ID") && is_truthy(value) {
        if let Some(relation) = model.relation_for_column(&field.name) {
            let id = value_text(value);
            return CellDisplay::Reference {
                target: relation.type_name.clone(),
                label: first_segment(&id),
                id,
            };
        }
    }
    if value.is_null() {
        return CellDisplay::Null;
    }
    let text = value_text(value);
    if field.scalar_type() == Some(ScalarType::DateTime) {
        return CellDisplay::Date {
            text: text.split('T').next().unwrap_or(&text).to_string(),
        };
    }
    CellDisplay::Text { text }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PageLink {
    Page { number: u64, current: bool },
    Gap,
}

/// Pagination links around 1-based `page`: two pages either side, the first and last page,
/// and a gap wherever pages are skipped.
pub fn pagination_window(page: u64, num_pages: u64) -> Vec<PageLink> {
    let first = 1i64;
    let cur = page as i64;
    let last = num_pages as i64;
    let link = |n: i64| PageLink::Page {
        number: n as u64,
        current: n == cur,
    };
    let mut out = Vec::new();
    if cur - 2 > first {
        out.push(link(first));
    }
    if cur - 2 > first + 1 {
        out.push(PageLink::Gap);
    }
    for n in [cur - 2, cur - 1] {
        if n >= 1 {
            out.push(link(n));
        }
    }
    out.push(link(cur));
    for n in [cur + 1, cur + 2] {
        if n <= last {
            out.push(link(n));
        }
    }
    if cur + 2 < last - 1 {
        out.push(PageLink::Gap);
    }
    if cur + 2 < last {
        out.push(link(last));
    }
    out
}

/// Update payload holding only the fields the user touched.
pub fn touched_payload<'a, I>(form: &Row, touched: I) -> Row
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Row::new();
    for name in touched {
        if let Some(v) = form.get(name) {
            out.insert(name.to_string(), v.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::load_from_value;
    use serde_json::json;

    fn schema() -> crate::schema::FullSchema {
        load_from_value(json!({
            "enums": [{ "name": "Role", "values": [{ "name": "READER" }, { "name": "EDITOR" }] }],
            "models": [
                { "name": "User", "fields": [
                    { "kind": "scalar", "name": "id", "type": "String", "isId": true }
                ]},
                { "name": "Post", "fields": [
                    { "kind": "scalar", "name": "id", "type": "String", "isId": true },
                    { "kind": "scalar", "name": "createdAt", "type": "DateTime" },
                    { "kind": "scalar", "name": "authorId", "type": "String" },
                    { "kind": "object", "name": "author", "type": "User", "relationFromFields": ["authorId"] },
                    { "kind": "enum", "name": "audience", "type": "Role" },
                    { "kind": "scalar", "name": "rating", "type": "Float" },
                    { "kind": "scalar", "name": "videoURL", "type": "String" },
                    { "kind": "scalar", "name": "payload", "type": "Json" }
                ]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn titles_normalise_id_and_mark_utc() {
        let s = schema();
        let post = s.model("Post").unwrap();
        let title = |name: &str| title_for(post.field(name).unwrap());
        assert_eq!(title("id"), "ID");
        assert_eq!(title("authorId"), "Author ID");
        assert_eq!(title("createdAt"), "Created At (UTC)");
        assert_eq!(title("videoURL"), "Video URL");
    }

    #[test]
    fn blank_values_follow_the_field_type() {
        let s = schema();
        let post = s.model("Post").unwrap();
        let now = "2024-01-02T03:04:05.000Z";
        let blank = |name: &str| default_value_at(post.field(name).unwrap(), &s.enums, now);
        assert_eq!(blank("authorId"), json!(""));
        assert_eq!(blank("rating"), json!(0));
        assert_eq!(blank("createdAt"), json!(now));
        assert_eq!(blank("audience"), json!("READER"));
        assert_eq!(blank("payload"), json!(""));
    }

    #[test]
    fn widgets_by_type() {
        let s = schema();
        let post = s.model("Post").unwrap();
        let w = |name: &str| input_widget_for(post.field(name).unwrap(), post, &s.enums);
        assert_eq!(w("authorId").kind, WidgetKind::Text { reference: Some("User".into()) });
        assert_eq!(w("audience").kind, WidgetKind::Select { options: vec!["READER".into(), "EDITOR".into()] });
        assert!(w("id").read_only);
        assert!(w("createdAt").read_only);
        assert!(!w("rating").read_only);
        assert_eq!(w("payload").kind, WidgetKind::Fallback { type_name: "Json".into() });
        assert_eq!(datetime_input_value("2023-06-02T16:24:17.129Z"), "2023-06-02T16:24:17");
        assert_eq!(datetime_from_input("2023-06-02T16:24"), "2023-06-02T16:24.000Z");
    }

    #[test]
    fn cells_shorten_ids_and_link_foreign_keys() {
        let s = schema();
        let post = s.model("Post").unwrap();
        let cell = |name: &str, v: Value| display_value(post, post.field(name).unwrap(), &v);
        assert_eq!(
            cell("id", json!("3f2c9a10-aaaa-4bbb-8ccc-000000000000")),
            CellDisplay::ShortId { text: "3f2c9a10".into() }
        );
        assert_eq!(
            cell("authorId", json!("9d1e-77")),
            CellDisplay::Reference { target: "User".into(), id: "9d1e-77".into(), label: "9d1e".into() }
        );
        assert_eq!(cell("authorId", Value::Null), CellDisplay::Null);
        assert_eq!(cell("createdAt", json!("2024-03-01T10:00:00Z")), CellDisplay::Date { text: "2024-03-01".into() });
        assert_eq!(cell("rating", json!(4.5)), CellDisplay::Text { text: "4.5".into() });
    }

    #[test]
    fn pagination_window_elides_far_pages() {
        use PageLink::*;
        let p = |n: u64, current: bool| Page { number: n, current };
        assert_eq!(
            pagination_window(6, 12),
            vec![p(1, false), Gap, p(4, false), p(5, false), p(6, true), p(7, false), p(8, false), Gap, p(12, false)]
        );
        assert_eq!(pagination_window(1, 2), vec![p(1, true), p(2, false)]);
        assert_eq!(
            pagination_window(4, 5),
            vec![p(1, false), p(2, false), p(3, false), p(4, true), p(5, false)]
        );
    }

    #[test]
    fn touched_payload_keeps_only_touched_fields() {
        let form: Row = json!({ "title": "new", "body": "old", "rating": null }).as_object().unwrap().clone();
        let payload = touched_payload(&form, ["title", "rating", "missing"]);
        assert_eq!(Value::Object(payload), json!({ "title": "new", "rating": null }));
    }
}
