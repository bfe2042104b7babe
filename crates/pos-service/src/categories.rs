//! Product and expense category lists.
//!
//! Each list is a JSON array of names under its own key. An empty list is
//! replaced by the defaults the first time it is read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pos_core::keys;

use crate::error::{Result, ServiceError};
use crate::state::AppState;

/// Which category list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Product categories (`pos_categories`).
    Product,
    /// Expense categories (`pos_expense_categories`).
    Expense,
}

impl CategoryKind {
    /// Store key of the list.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Product => keys::CATEGORIES,
            Self::Expense => keys::EXPENSE_CATEGORIES,
        }
    }

    /// Names used when the list is empty.
    #[must_use]
    pub fn defaults(self) -> &'static [&'static str] {
        match self {
            Self::Product => &["Elektronik", "Fashion", "Makanan", "Minuman", "Kesehatan"],
            Self::Expense => &[
                "Operasional",
                "Listrik",
                "Air",
                "Internet",
                "Maintenance",
                "Lainnya",
            ],
        }
    }
}

fn names(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect()
}

fn default_items(kind: CategoryKind) -> Vec<Value> {
    kind.defaults().iter().map(|name| Value::from(*name)).collect()
}

impl AppState {
    /// Category names, seeding the defaults into an empty list.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the defaults cannot be written.
    pub fn categories(&self, kind: CategoryKind) -> Result<Vec<String>> {
        let seeded = self.store.modify_list(kind.key(), |items| {
            if !names(items).is_empty() {
                return None;
            }
            *items = default_items(kind);
            Some(())
        })?;
        if seeded.is_some() {
            tracing::info!(key = kind.key(), "Seeded default categories");
        }

        Ok(match self.store.get(kind.key()) {
            Some(Value::Array(items)) => names(&items),
            _ => Vec::new(),
        })
    }

    /// Add a category. The name is trimmed; returns `false` when it is
    /// already listed. An empty list gets the defaults first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::BadRequest`] for a blank name, or a storage
    /// error.
    pub fn add_category(&self, kind: CategoryKind, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("category name is required".into()));
        }

        let added = self.store.modify_list(kind.key(), |items| {
            if names(items).is_empty() {
                *items = default_items(kind);
            }
            if items.iter().any(|item| item.as_str() == Some(name)) {
                return None;
            }
            items.push(Value::from(name));
            Some(())
        })?;
        Ok(added.is_some())
    }

    /// Remove a category. Returns `false` when it was not listed.
    ///
    /// Products and expenses that use the name keep it.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn remove_category(&self, kind: CategoryKind, name: &str) -> Result<bool> {
        let removed = self.store.modify_list(kind.key(), |items| {
            let before = items.len();
            items.retain(|item| item.as_str() != Some(name));
            (items.len() != before).then_some(())
        })?;
        Ok(removed.is_some())
    }
}
