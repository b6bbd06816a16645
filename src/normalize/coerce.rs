//! Scalar coercions for loosely typed JSON.
//!
//! The estimator serializes every value through a dynamically typed runtime,
//! so a scalar may arrive as `5`, `"5.0"`, `[5]`, `[[5]]`, `null` or `[]`.
//! Each coercion here:
//!
//! 1. unwraps container nesting by taking the first element, repeatedly
//! 2. converts the remaining scalar to the target type
//! 3. falls back to the caller's default on `null`, an empty container, or a
//!    value that does not convert
//!
//! These functions never fail.

use serde_json::Value;

/// String tokens accepted as boolean `true` (compared case-insensitively).
const TRUE_TOKENS: [&str; 5] = ["true", "t", "1", "yes", "y"];

/// Characters left behind by serialized list syntax, e.g. `['3PL']`.
const LIST_SYNTAX: [char; 4] = ['\'', '"', '[', ']'];

/// Unwrap arrays until a scalar is reached.
///
/// Returns `None` for `null` and for an empty array at any depth. Objects are
/// returned as-is; no coercion accepts them.
pub fn unwrap_scalar(value: &Value) -> Option<&Value> {
    let mut current = value;
    loop {
        match current {
            Value::Null => return None,
            Value::Array(items) => current = items.first()?,
            other => return Some(other),
        }
    }
}

/// Coerce to a finite `f64`, or `default`.
pub fn to_f64(value: Option<&Value>, default: f64) -> f64 {
    value
        .and_then(unwrap_scalar)
        .and_then(scalar_f64)
        .unwrap_or(default)
}

/// Coerce to `i64` through float parsing (so `"3.0"` reads as `3`), or `default`.
pub fn to_i64(value: Option<&Value>, default: i64) -> i64 {
    value
        .and_then(unwrap_scalar)
        .and_then(scalar_f64)
        .map(|v| v.trunc() as i64)
        .unwrap_or(default)
}

/// Coerce to `bool`, or `default` when the value is missing.
///
/// Native booleans pass through; strings are matched against the true-token
/// set; the number `1` is true. Anything else present is `false`.
pub fn to_bool(value: Option<&Value>, default: bool) -> bool {
    match value.and_then(unwrap_scalar) {
        None => default,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            let token = s.trim();
            TRUE_TOKENS.iter().any(|t| token.eq_ignore_ascii_case(t))
        }
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(_) => false,
    }
}

/// Coerce to a cleaned string, or `default` when nothing usable remains.
pub fn to_clean_string(value: Option<&Value>, default: &str) -> String {
    let raw = match value.and_then(unwrap_scalar) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => return default.to_string(),
    };
    let cleaned = clean_str(&raw);
    if cleaned.is_empty() {
        default.to_string()
    } else {
        cleaned
    }
}

/// Strip quote/bracket characters and surrounding whitespace.
pub fn clean_str(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !LIST_SYNTAX.contains(ch))
        .collect::<String>()
        .trim()
        .to_string()
}

fn scalar_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => return None,
    };
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(5.0))]
    #[case(json!([5.0]))]
    #[case(json!([[5.0]]))]
    #[case(json!([[[5]]]))]
    #[case(json!("5"))]
    #[case(json!(["5.0", 7]))]
    fn nested_scalars_unwrap_to_the_same_float(#[case] raw: Value) {
        assert_eq!(to_f64(Some(&raw), -1.0), 5.0);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(json!(null)))]
    #[case(Some(json!([])))]
    #[case(Some(json!([[]])))]
    #[case(Some(json!("not a number")))]
    #[case(Some(json!({"value": 5})))]
    #[case(Some(json!("NaN")))]
    #[case(Some(json!("inf")))]
    fn unusable_values_fall_back_to_default(#[case] raw: Option<Value>) {
        assert_eq!(to_f64(raw.as_ref(), 2.5), 2.5);
        assert_eq!(to_i64(raw.as_ref(), 7), 7);
    }

    #[rstest]
    #[case(json!(true), 1.0)]
    #[case(json!([[false]]), 0.0)]
    #[case(json!([true, false]), 1.0)]
    fn booleans_coerce_to_unit_floats(#[case] raw: Value, #[case] expected: f64) {
        assert_eq!(to_f64(Some(&raw), -1.0), expected);
        assert_eq!(to_i64(Some(&raw), -1), expected as i64);
    }

    #[rstest]
    #[case(json!(3), 3)]
    #[case(json!("3.0"), 3)]
    #[case(json!([["12"]]), 12)]
    #[case(json!(4.9), 4)]
    #[case(json!(-2.7), -2)]
    fn integers_parse_through_floats(#[case] raw: Value, #[case] expected: i64) {
        assert_eq!(to_i64(Some(&raw), 0), expected);
    }

    #[rstest]
    #[case(json!(true), true)]
    #[case(json!([false]), false)]
    #[case(json!("TRUE"), true)]
    #[case(json!(" yes "), true)]
    #[case(json!(["Y"]), true)]
    #[case(json!("t"), true)]
    #[case(json!("1"), true)]
    #[case(json!(1), true)]
    #[case(json!(0), false)]
    #[case(json!(2), false)]
    #[case(json!("no"), false)]
    #[case(json!("false"), false)]
    #[case(json!("converged"), false)]
    fn booleans_accept_native_and_token_forms(#[case] raw: Value, #[case] expected: bool) {
        assert_eq!(to_bool(Some(&raw), !expected), expected);
    }

    #[test]
    fn missing_booleans_use_default() {
        assert!(to_bool(None, true));
        assert!(!to_bool(Some(&json!([])), false));
        assert!(to_bool(Some(&json!(null)), true));
    }

    #[rstest]
    #[case(json!("['3PL']"), "3PL")]
    #[case(json!(["2PL"]), "2PL")]
    #[case(json!("  \"Rasch\" "), "Rasch")]
    #[case(json!([["[3PL]"]]), "3PL")]
    #[case(json!(3), "3")]
    #[case(json!(true), "true")]
    fn strings_are_cleaned(#[case] raw: Value, #[case] expected: &str) {
        assert_eq!(to_clean_string(Some(&raw), "default"), expected);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(json!(null)))]
    #[case(Some(json!([])))]
    #[case(Some(json!("['']")))]
    #[case(Some(json!({"type": "3PL"})))]
    fn empty_strings_fall_back_to_default(#[case] raw: Option<Value>) {
        assert_eq!(to_clean_string(raw.as_ref(), "3PL"), "3PL");
    }
}
