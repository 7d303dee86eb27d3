//! Sort descriptors: priority-ordered (field, direction) pairs.

use crate::error::AppError;
use crate::schema::ModelSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Sort {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Sort::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Sort::new(field, SortDirection::Desc)
    }
}

/// Parse the URL form `"name:asc,createdAt:desc"`. Malformed entries are skipped.
pub fn parse_sort(s: &str) -> Vec<Sort> {
    s.split(',')
        .filter_map(|part| {
            let (col, dir) = part.split_once(':')?;
            if col.is_empty() {
                return None;
            }
            Some(Sort::new(col, SortDirection::parse(dir)?))
        })
        .collect()
}

pub fn format_sort(sort: &[Sort]) -> String {
    sort.iter()
        .map(|s| format!("{}:{}", s.field, s.direction.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Header-click rule: a column already sorted moves to the front with its direction flipped;
/// a new column is prepended ascending. Other columns keep their relative order.
pub fn toggle_sort(current: &[Sort], column: &str) -> Vec<Sort> {
    let head = match current.iter().find(|s| s.field == column) {
        Some(existing) => Sort::new(column, existing.direction.flip()),
        None => Sort::asc(column),
    };
    std::iter::once(head)
        .chain(current.iter().filter(|s| s.field != column).cloned())
        .collect()
}

/// Parse a JSON `orderBy`: `[{ "field": "asc" | "desc" }, ..]` (a single object is accepted too).
pub fn sort_from_json(value: &Value, model: &ModelSchema) -> Result<Vec<Sort>, AppError> {
    let entries = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items.as_slice(),
        Value::Object(_) => std::slice::from_ref(value),
        _ => return Err(AppError::BadRequest("orderBy must be an array".into())),
    };
    let mut out = Vec::new();
    for entry in entries {
        let obj = entry
            .as_object()
            .ok_or_else(|| AppError::BadRequest("orderBy entries must be objects".into()))?;
        for (field, dir) in obj {
            let direction = dir
                .as_str()
                .and_then(SortDirection::parse)
                .ok_or_else(|| AppError::BadRequest(format!("orderBy {}: direction must be asc or desc", field)))?;
            out.push(Sort::new(field.as_str(), direction));
        }
    }
    check_sort_fields(&out, model)?;
    Ok(out)
}

/// Every sorted field must be a non-relation field of the model.
pub fn check_sort_fields(sort: &[Sort], model: &ModelSchema) -> Result<(), AppError> {
    for s in sort {
        match model.field(&s.field) {
            Some(f) if !f.is_relation() => {}
            _ => {
                return Err(AppError::BadRequest(format!(
                    "cannot sort {} by {}",
                    model.name, s.field
                )))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_a_sorted_column_flips_it_to_the_front() {
        let current = vec![Sort::asc("name"), Sort::desc("createdAt"), Sort::asc("id")];
        let next = toggle_sort(&current, "createdAt");
        assert_eq!(next, vec![Sort::asc("createdAt"), Sort::asc("name"), Sort::asc("id")]);

        let next = toggle_sort(&next, "createdAt");
        assert_eq!(next, vec![Sort::desc("createdAt"), Sort::asc("name"), Sort::asc("id")]);
    }

    #[test]
    fn toggling_an_unsorted_column_prepends_ascending() {
        let next = toggle_sort(&[Sort::desc("name")], "email");
        assert_eq!(next, vec![Sort::asc("email"), Sort::desc("name")]);
    }

    #[test]
    fn url_form_skips_garbage() {
        let parsed = parse_sort("name:asc,bogus,age:sideways,:desc,id:desc");
        assert_eq!(parsed, vec![Sort::asc("name"), Sort::desc("id")]);
        assert_eq!(format_sort(&parsed), "name:asc,id:desc");
        assert!(parse_sort("").is_empty());
    }
}
