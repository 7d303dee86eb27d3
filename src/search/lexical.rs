//! Lexical checks deciding whether query text can match a typed column.

use regex::Regex;
use std::sync::LazyLock;

static INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("static regex"));
static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").expect("static regex"));
static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-8][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("static regex")
});

/// 32-bit integer text, optional sign. Overflow yields `None`.
pub fn parse_int(s: &str) -> Option<i32> {
    if !INT.is_match(s) {
        return None;
    }
    s.parse().ok()
}

/// Decimal text with optional sign and fraction.
pub fn parse_float(s: &str) -> Option<f64> {
    if !FLOAT.is_match(s) {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Canonical 8-4-4-4-12 form with a valid version nibble and RFC 4122 variant.
pub fn is_uuid(s: &str) -> bool {
    UUID.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers() {
        assert_eq!(parse_int("12"), Some(12));
        assert_eq!(parse_int("-7"), Some(-7));
        assert_eq!(parse_int("+3"), Some(3));
        assert_eq!(parse_int("12a"), None);
        assert_eq!(parse_int("-"), None);
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("99999999999"), None);
        assert_eq!(parse_int("1.5"), None);
    }

    #[test]
    fn floats() {
        assert_eq!(parse_float("1.5"), Some(1.5));
        assert_eq!(parse_float("-.5"), Some(-0.5));
        assert_eq!(parse_float("3."), Some(3.0));
        assert_eq!(parse_float("42"), Some(42.0));
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("1e5"), None);
        assert_eq!(parse_float("NaN"), None);
    }

    #[test]
    fn uuids() {
        assert!(is_uuid("3f2504e0-4f89-41d3-9a0c-0305e82c3301"));
        assert!(is_uuid("3F2504E0-4F89-41D3-9A0C-0305E82C3301"));
        assert!(!is_uuid("3f2504e0-4f89-01d3-9a0c-0305e82c3301"));
        assert!(!is_uuid("3f2504e0-4f89-41d3-7a0c-0305e82c3301"));
        assert!(!is_uuid("3f2504e04f8941d39a0c0305e82c3301"));
        assert!(!is_uuid("3f2504e0-4f89-41d3-9a0c-0305e82c3301x"));
        assert!(!is_uuid("alice"));
    }
}
