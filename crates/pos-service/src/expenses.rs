//! Expense bookkeeping.
//!
//! The same roles that manage the catalog record expenses. New expenses are
//! stamped with the recording user's id.

use serde::Deserialize;
use serde_json::Value;

use pos_core::lenient::{amount_to_json, parse_grouped_amount};
use pos_core::{generate_id, keys, Expense, SessionUser};
use pos_store::{Record, StoreError};

use crate::error::{Result, ServiceError};
use crate::products::require_inventory;
use crate::state::AppState;

/// Payment method used when the form leaves it blank.
pub const DEFAULT_METHOD: &str = "tunai";

/// Expense form fields for [`AppState::create_expense`] and
/// [`AppState::update_expense`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    /// What was paid for. Required.
    pub deskripsi: String,
    /// Category name. Required.
    pub kategori: String,
    /// Amount, as a number or text such as `"150.000"`.
    #[serde(default)]
    pub jumlah: Value,
    /// Date of the expense (`YYYY-MM-DD`). Required.
    pub tanggal: String,
    /// Payment method.
    #[serde(default)]
    pub metode: String,
}

impl ExpenseInput {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("deskripsi", &self.deskripsi),
            ("kategori", &self.kategori),
            ("tanggal", &self.tanggal),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceError::BadRequest(format!("{field} is required")));
            }
        }
        Ok(())
    }

    fn into_record(self) -> Record {
        let metode = match self.metode.trim() {
            "" => DEFAULT_METHOD.to_string(),
            method => method.to_string(),
        };

        let mut record = Record::new();
        record.insert("deskripsi".into(), Value::String(self.deskripsi.trim().to_string()));
        record.insert("kategori".into(), Value::String(self.kategori.trim().to_string()));
        record.insert("jumlah".into(), amount_to_json(parse_grouped_amount(&self.jumlah)));
        record.insert("tanggal".into(), Value::String(self.tanggal.trim().to_string()));
        record.insert("metode".into(), Value::String(metode));
        record
    }
}

fn to_expense(record: Record) -> Result<Expense> {
    Ok(serde_json::from_value(Value::Object(record)).map_err(StoreError::from)?)
}

impl AppState {
    /// Every recorded expense.
    #[must_use]
    pub fn expenses(&self) -> Vec<Expense> {
        self.store.get_all_as(keys::EXPENSES)
    }

    /// Record an expense paid by `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` manages inventory,
    /// [`ServiceError::BadRequest`] for a missing description, category or
    /// date, or a storage error.
    pub fn create_expense(&self, actor: &SessionUser, input: ExpenseInput) -> Result<Expense> {
        require_inventory(actor)?;
        input.validate()?;

        let mut record = input.into_record();
        record.insert("id".into(), Value::String(generate_id()));
        record.insert("userId".into(), Value::String(actor.id.clone()));
        let expense = to_expense(self.store.add_one(keys::EXPENSES, &record)?)?;

        tracing::info!(
            expense_id = %expense.id,
            amount = expense.value(),
            by = %actor.id,
            "Expense recorded"
        );
        Ok(expense)
    }

    /// Replace an expense's form fields. The recording user is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` manages inventory,
    /// [`ServiceError::BadRequest`] for a missing description, category or
    /// date, [`ServiceError::NotFound`] for an unknown expense, or a storage
    /// error.
    pub fn update_expense(&self, actor: &SessionUser, id: &str, input: ExpenseInput) -> Result<Expense> {
        require_inventory(actor)?;
        input.validate()?;

        let merged = self
            .store
            .update_one(keys::EXPENSES, id, input.into_record())?
            .ok_or_else(|| ServiceError::NotFound(format!("expense {id}")))?;
        let expense = to_expense(merged)?;

        tracing::info!(expense_id = %id, by = %actor.id, "Expense updated");
        Ok(expense)
    }

    /// Delete an expense.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` manages inventory,
    /// [`ServiceError::NotFound`] for an unknown expense, or a storage error.
    pub fn delete_expense(&self, actor: &SessionUser, id: &str) -> Result<()> {
        require_inventory(actor)?;
        if self.store.find_one(keys::EXPENSES, id).is_none() {
            return Err(ServiceError::NotFound(format!("expense {id}")));
        }
        self.store.delete_one(keys::EXPENSES, id)?;

        tracing::info!(expense_id = %id, by = %actor.id, "Expense deleted");
        Ok(())
    }
}
