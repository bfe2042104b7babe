//! Store settings (`pos_settings`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;

/// Store-wide settings.
///
/// Fields this type does not know about are kept in `extra` so a
/// read-modify-write does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Whether checkout charges tax. Absent means no tax.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub tax_enabled: bool,

    /// Tax rate in percent.
    #[serde(
        default = "default_tax_rate",
        deserialize_with = "lenient::amount",
        serialize_with = "lenient::write_amount"
    )]
    pub tax_rate: f64,

    /// ISO currency code.
    #[serde(default = "default_currency", deserialize_with = "lenient::text")]
    pub currency: String,

    /// Currency symbol printed on receipts.
    #[serde(default = "default_currency_symbol", deserialize_with = "lenient::text")]
    pub currency_symbol: String,

    /// Company name.
    #[serde(default, deserialize_with = "lenient::text")]
    pub company_name: String,

    /// Company address.
    #[serde(default, deserialize_with = "lenient::text")]
    pub company_address: String,

    /// Company phone.
    #[serde(default, deserialize_with = "lenient::text")]
    pub company_phone: String,

    /// Company email.
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub company_email: Option<String>,

    /// Footer line printed on receipts.
    #[serde(default, deserialize_with = "lenient::text")]
    pub receipt_footer: String,

    /// Logo as a data URL.
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub logo: Option<String>,

    /// Unrecognized fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_tax_rate() -> f64 {
    10.0
}

fn default_currency() -> String {
    "IDR".into()
}

fn default_currency_symbol() -> String {
    "Rp".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tax_enabled: false,
            tax_rate: default_tax_rate(),
            currency: default_currency(),
            currency_symbol: default_currency_symbol(),
            company_name: "PT. Toko Maju Jaya".into(),
            company_address: "Jl. Raya No. 123".into(),
            company_phone: "081234567890".into(),
            company_email: None,
            receipt_footer: "Terima kasih atas kunjungan Anda".into(),
            logo: None,
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Tax rate to apply at checkout, `0` when tax is disabled.
    #[must_use]
    pub fn effective_tax_rate(&self) -> f64 {
        if self.tax_enabled {
            self.tax_rate
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_value(json!({})).unwrap();
        assert!(!settings.tax_enabled);
        assert_eq!(settings.tax_rate, 10.0);
        assert_eq!(settings.currency, "IDR");
        assert_eq!(settings.effective_tax_rate(), 0.0);
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let settings: Settings = serde_json::from_value(json!({
            "taxEnabled": true,
            "taxRate": "11",
            "printerWidth": 58
        }))
        .unwrap();

        assert_eq!(settings.effective_tax_rate(), 11.0);
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["printerWidth"], json!(58));
        assert_eq!(value["taxRate"], json!(11));
    }
}
