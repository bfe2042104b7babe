//! Lenient field parsing for loosely-typed records.
//!
//! Records are written by many callers and fields may arrive as numbers,
//! numeric strings (`"50000"`, `"12.5 kg"`), `null`, or be missing. These
//! helpers read them the forgiving way: a finite number is used as is, a
//! string contributes its leading decimal number, and everything else is `0`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Read a JSON value as an amount, `0.0` when it is not numeric.
#[must_use]
pub fn parse_amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_leading_float(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parse the longest leading decimal number of a string.
///
/// Leading whitespace is skipped. Accepts an optional sign, digits, one
/// decimal point and an exponent. Returns `None` when no digits lead.
#[must_use]
pub fn parse_leading_float(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read a form amount written with `.` thousands separators (`"50.000"`).
///
/// Strings have every `.` removed before the leading number is read; numbers
/// are used as is. Anything else is `0`.
#[must_use]
pub fn parse_grouped_amount(value: &Value) -> f64 {
    match value {
        Value::String(s) => parse_leading_float(&s.replace('.', "")).unwrap_or(0.0),
        other => parse_amount(other),
    }
}

/// Read a whole count such as a stock level.
///
/// Numbers are truncated toward zero; strings contribute their leading
/// integer (`"12.5"` reads as `12`). Anything else is `0`.
#[must_use]
pub fn parse_count(value: &Value) -> f64 {
    match value {
        Value::Number(_) => parse_amount(value).trunc(),
        Value::String(s) => {
            let s = s.trim_start();
            let sign_len = usize::from(matches!(s.as_bytes().first(), Some(b'+' | b'-')));
            let digits = s[sign_len..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            if digits == 0 {
                return 0.0;
            }
            s[..sign_len + digits].parse::<f64>().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Convert an amount back to JSON, as an integer when it is whole.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn amount_to_json(amount: f64) -> Value {
    if amount.fract() == 0.0 && amount.abs() <= MAX_EXACT_INT {
        Value::from(amount as i64)
    } else {
        serde_json::Number::from_f64(amount).map_or(Value::Null, Value::Number)
    }
}

/// Serde helper: deserialize any JSON value as a lenient amount.
///
/// Use with `#[serde(default, deserialize_with = "lenient::amount")]`.
///
/// # Errors
///
/// Only fails when the underlying deserializer fails to produce a value.
pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_amount(&value))
}

/// Serde helper: write whole amounts as JSON integers.
///
/// # Errors
///
/// Propagates serializer errors.
#[allow(clippy::trivially_copy_pass_by_ref, clippy::cast_possible_truncation)]
pub fn write_amount<S>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if amount.fract() == 0.0 && amount.abs() <= MAX_EXACT_INT {
        serializer.serialize_i64(*amount as i64)
    } else {
        serializer.serialize_f64(*amount)
    }
}

/// Serde helper: like [`write_amount`] for optional amounts.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn write_opt_amount<S>(amount: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match amount {
        Some(amount) => write_amount(amount, serializer),
        None => serializer.serialize_none(),
    }
}

/// Serde helper: fall back to `T::default()` when the value does not fit.
///
/// # Errors
///
/// Only fails when the underlying deserializer fails to produce a value.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Serde helper: read a list, skipping elements that do not deserialize.
///
/// A non-array value reads as an empty list.
///
/// # Errors
///
/// Only fails when the underlying deserializer fails to produce a value.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Serde helper: keep the value only when it is a JSON number.
///
/// Strings, booleans and `null` become `None`.
///
/// # Errors
///
/// Only fails when the underlying deserializer fails to produce a value.
pub fn number_only<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| v.is_finite()))
}

/// Serde helper: keep a possibly-present raw value, mapping `null` to `None`.
///
/// # Errors
///
/// Only fails when the underlying deserializer fails to produce a value.
pub fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(if value.is_null() { None } else { Some(value) })
}

/// Serde helper: read a text field, `""` for `null` or non-text values.
///
/// Numbers are rendered with their JSON text so ids stored as numbers still
/// compare as strings.
///
/// # Errors
///
/// Only fails when the underlying deserializer fails to produce a value.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_text(deserializer)?.unwrap_or_default())
}

/// Serde helper: read an optional text field, `None` for `null`.
///
/// # Errors
///
/// Only fails when the underlying deserializer fails to produce a value.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_pass_through() {
        assert_eq!(parse_amount(&json!(50000)), 50000.0);
        assert_eq!(parse_amount(&json!(2.5)), 2.5);
        assert_eq!(parse_amount(&json!(-3)), -3.0);
    }

    #[test]
    fn numeric_strings_use_leading_number() {
        assert_eq!(parse_amount(&json!("20000")), 20000.0);
        assert_eq!(parse_amount(&json!("  12.5kg")), 12.5);
        assert_eq!(parse_amount(&json!("3e2")), 300.0);
        assert_eq!(parse_amount(&json!(".5")), 0.5);
        assert_eq!(parse_amount(&json!("7.")), 7.0);
    }

    #[test]
    fn non_numeric_is_zero() {
        assert_eq!(parse_amount(&json!("abc")), 0.0);
        assert_eq!(parse_amount(&json!("")), 0.0);
        assert_eq!(parse_amount(&json!(".")), 0.0);
        assert_eq!(parse_amount(&json!("-")), 0.0);
        assert_eq!(parse_amount(&json!(null)), 0.0);
        assert_eq!(parse_amount(&json!(true)), 0.0);
        assert_eq!(parse_amount(&json!({"v": 1})), 0.0);
    }

    #[test]
    fn dangling_exponent_is_ignored() {
        assert_eq!(parse_leading_float("5e"), Some(5.0));
        assert_eq!(parse_leading_float("5e+"), Some(5.0));
    }

    #[test]
    fn grouped_amounts_drop_separators() {
        assert_eq!(parse_grouped_amount(&json!("50.000")), 50000.0);
        assert_eq!(parse_grouped_amount(&json!("1.250.000")), 1_250_000.0);
        assert_eq!(parse_grouped_amount(&json!(7500)), 7500.0);
        assert_eq!(parse_grouped_amount(&json!("")), 0.0);
        assert_eq!(parse_grouped_amount(&json!("Rp")), 0.0);
    }

    #[test]
    fn counts_keep_the_leading_integer() {
        assert_eq!(parse_count(&json!("12")), 12.0);
        assert_eq!(parse_count(&json!(" 12.5")), 12.0);
        assert_eq!(parse_count(&json!("-3 pcs")), -3.0);
        assert_eq!(parse_count(&json!(9.9)), 9.0);
        assert_eq!(parse_count(&json!("pcs")), 0.0);
        assert_eq!(parse_count(&json!("+")), 0.0);
        assert_eq!(parse_count(&json!(null)), 0.0);
    }

    #[test]
    fn whole_amounts_become_integers() {
        assert_eq!(amount_to_json(97.0), json!(97));
        assert_eq!(amount_to_json(-2.0), json!(-2));
        assert_eq!(amount_to_json(2.5), json!(2.5));
    }
}
