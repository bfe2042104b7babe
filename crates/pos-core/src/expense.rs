//! Expense records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{lenient, time};

/// An operating expense.
///
/// The amount lives in `jumlah`; older records use `amount` instead. The
/// date may be in `tanggal`, `createdAt` or `date`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Record id.
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,

    /// Category name.
    #[serde(default, deserialize_with = "lenient::text")]
    pub kategori: String,

    /// Description.
    #[serde(default, deserialize_with = "lenient::text")]
    pub deskripsi: String,

    /// Payment method ("tunai", "transfer", ...).
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "String::is_empty"
    )]
    pub metode: String,

    /// Id of the user who recorded the expense.
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "String::is_empty"
    )]
    pub user_id: String,

    /// Amount (primary field).
    #[serde(
        default,
        deserialize_with = "lenient::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub jumlah: Option<Value>,

    /// Amount (alternate field).
    #[serde(
        default,
        deserialize_with = "lenient::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Value>,

    /// Expense date.
    #[serde(
        default,
        deserialize_with = "lenient::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub tanggal: Option<Value>,

    /// Creation timestamp.
    #[serde(
        default,
        deserialize_with = "lenient::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<Value>,

    /// Date under its alternate field name.
    #[serde(
        default,
        deserialize_with = "lenient::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<Value>,

    /// Last update timestamp.
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
}

impl Expense {
    /// The expense amount.
    ///
    /// `jumlah` wins whenever it is present, even if unparseable (which reads
    /// as `0`); `amount` is consulted only when `jumlah` is absent or null.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.jumlah
            .as_ref()
            .or(self.amount.as_ref())
            .map_or(0.0, lenient::parse_amount)
    }

    /// When the expense occurred, from the first date field that is set.
    #[must_use]
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        [&self.tanggal, &self.created_at, &self.date]
            .into_iter()
            .flatten()
            .find(|raw| !is_blank(raw))
            .and_then(time::parse_timestamp)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Null => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expense(value: Value) -> Expense {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn jumlah_then_amount() {
        assert_eq!(expense(json!({"jumlah": 20000})).value(), 20000.0);
        assert_eq!(expense(json!({"amount": 5000})).value(), 5000.0);
        assert_eq!(expense(json!({"jumlah": null, "amount": "750"})).value(), 750.0);
        assert_eq!(expense(json!({})).value(), 0.0);
    }

    #[test]
    fn unparseable_jumlah_does_not_fall_back() {
        assert_eq!(expense(json!({"jumlah": "n/a", "amount": 5000})).value(), 0.0);
    }

    #[test]
    fn date_fields_in_order() {
        let e = expense(json!({
            "tanggal": "2024-02-01",
            "createdAt": "2024-03-01T00:00:00.000Z"
        }));
        assert_eq!(e.occurred_at().unwrap().to_rfc3339(), "2024-02-01T00:00:00+00:00");

        let e = expense(json!({"tanggal": "", "date": "2024-04-01"}));
        assert_eq!(e.occurred_at().unwrap().to_rfc3339(), "2024-04-01T00:00:00+00:00");

        assert!(expense(json!({"jumlah": 1})).occurred_at().is_none());
    }
}
