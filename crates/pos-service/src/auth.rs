//! Login sessions.
//!
//! The logged-in user is kept under `pos_auth` as the user record without
//! its password. There is at most one session per store.

use serde_json::Value;

use pos_core::{keys, verify_password, SessionUser, User};
use pos_store::Record;

use crate::error::{Result, ServiceError};
use crate::state::AppState;

const PASSWORD: &str = "password";

impl AppState {
    /// Log in with a username and password.
    ///
    /// The account must exist, the password must verify and the status must
    /// be active. On success the whole user record, minus its password, is
    /// stored as the session.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unauthorized`] when no active account matches,
    /// or a storage error if the session cannot be written.
    pub fn login(&self, username: &str, password: &str) -> Result<SessionUser> {
        let users: Vec<User> = self.store.get_all_as(keys::USERS);
        let Some(user) = users.iter().find(|u| {
            u.username == username && u.is_active() && verify_password(password, &u.password)
        }) else {
            tracing::info!(username = %username, "Login rejected");
            return Err(ServiceError::Unauthorized);
        };

        let mut record = self
            .store
            .find_one(keys::USERS, &user.id)
            .ok_or(ServiceError::Unauthorized)?;
        record.remove(PASSWORD);
        self.store.set(keys::AUTH, &record)?;

        let session = self.require_user()?;
        tracing::info!(user_id = %session.id, role = %session.role, "Logged in");
        Ok(session)
    }

    /// End the session.
    pub fn logout(&self) {
        self.store.remove(keys::AUTH);
        tracing::info!("Logged out");
    }

    /// The logged-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<SessionUser> {
        self.store.get_as(keys::AUTH)
    }

    /// The logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unauthorized`] when nobody is logged in.
    pub fn require_user(&self) -> Result<SessionUser> {
        self.current_user().ok_or(ServiceError::Unauthorized)
    }

    /// Bring the session up to date with the user's stored record.
    ///
    /// The latest record, minus its password, is merged over the session.
    /// A session whose user no longer exists is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the refreshed session cannot be written.
    pub fn refresh_session(&self) -> Result<Option<SessionUser>> {
        let Some(Value::Object(mut session)) = self.store.get(keys::AUTH) else {
            return Ok(None);
        };
        let Some(id) = session.get("id").and_then(Value::as_str).map(str::to_owned) else {
            return Ok(self.current_user());
        };

        if let Some(mut latest) = self.store.find_one(keys::USERS, &id) {
            latest.remove(PASSWORD);
            session.extend(latest);
            self.store.set(keys::AUTH, &session)?;
            tracing::debug!(user_id = %id, "Session refreshed");
        }
        Ok(self.current_user())
    }

    /// Merge `updates` into the session. A `password` field is dropped.
    ///
    /// Only the session changes; the user record is left as is.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unauthorized`] when nobody is logged in, or a
    /// storage error if the session cannot be written.
    pub fn update_current_user(&self, mut updates: Record) -> Result<SessionUser> {
        let Some(Value::Object(mut session)) = self.store.get(keys::AUTH) else {
            return Err(ServiceError::Unauthorized);
        };

        updates.remove(PASSWORD);
        session.extend(updates);
        self.store.set(keys::AUTH, &session)?;
        self.require_user()
    }
}
