//! Store settings.

use pos_core::{keys, SessionUser, Settings};

use crate::error::{Result, ServiceError};
use crate::state::AppState;

impl AppState {
    /// Current settings. Defaults when none are stored or they do not parse.
    #[must_use]
    pub fn load_settings(&self) -> Settings {
        self.store.get_as(keys::SETTINGS).unwrap_or_default()
    }

    /// Replace the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` manages users,
    /// [`ServiceError::BadRequest`] for a negative or non-finite tax rate,
    /// or a storage error.
    pub fn save_settings(&self, actor: &SessionUser, settings: &Settings) -> Result<()> {
        if !actor.role.can_manage_users() {
            return Err(ServiceError::Forbidden);
        }
        if !settings.tax_rate.is_finite() || settings.tax_rate < 0.0 {
            return Err(ServiceError::BadRequest(format!(
                "tax rate must be a non-negative number, got {}",
                settings.tax_rate
            )));
        }

        self.store.set(keys::SETTINGS, settings)?;
        tracing::info!(by = %actor.id, tax_enabled = settings.tax_enabled, "Settings saved");
        Ok(())
    }
}
