//! User management.
//!
//! Only super admins and admins manage users. An admin never sees, edits or
//! deletes a super admin and cannot grant that role.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pos_core::{
    check_policy, generate_id, hash_password, keys, verify_password, Role, SessionUser, User,
    UserStatus,
};
use pos_store::Record;

use crate::error::{Result, ServiceError};
use crate::state::AppState;

/// Input for [`AppState::create_user`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Login name; must be unique.
    pub username: String,
    /// Plain-text password.
    pub password: String,
    /// Display name.
    pub nama: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Phone number.
    #[serde(default)]
    pub no_telepon: String,
    /// Role.
    pub role: Role,
    /// Status.
    pub status: UserStatus,
}

/// Changes for [`AppState::update_user`]. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    /// New login name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// New plain-text password. Empty means unchanged.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nama: Option<String>,
    /// New email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_telepon: Option<String>,
    /// New role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// New status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

fn require_manager(actor: &SessionUser) -> Result<()> {
    if actor.role.can_manage_users() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

/// Whether `actor` may see and change `target`.
fn can_touch(actor: &SessionUser, target: &User) -> bool {
    target.role != Role::SuperAdmin || actor.role == Role::SuperAdmin
}

impl AppState {
    /// Users visible to `actor`, without passwords.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` manages users.
    pub fn list_users(&self, actor: &SessionUser) -> Result<Vec<SessionUser>> {
        require_manager(actor)?;
        Ok(self
            .store
            .get_all_as::<User>(keys::USERS)
            .iter()
            .filter(|user| can_touch(actor, user))
            .map(User::to_session)
            .collect())
    }

    /// Create a user with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] if `actor` may not assign the
    /// role, [`ServiceError::BadRequest`] for a blank username,
    /// [`ServiceError::Conflict`] for a taken username, a core error for a
    /// password that fails the policy, or a storage error.
    pub fn create_user(&self, actor: &SessionUser, new: NewUser) -> Result<SessionUser> {
        if !actor.role.can_assign(new.role) {
            return Err(ServiceError::Forbidden);
        }
        let username = new.username.trim().to_string();
        if username.is_empty() {
            return Err(ServiceError::BadRequest("username is required".into()));
        }
        self.ensure_username_free(&username, None)?;
        check_policy(&new.password)?;

        let user = User {
            id: generate_id(),
            username,
            password: hash_password(&new.password, self.config.password_iterations)?,
            nama: new.nama,
            email: new.email,
            no_telepon: new.no_telepon,
            role: new.role,
            status: new.status,
        };
        self.store.add_one(keys::USERS, &user)?;

        tracing::info!(user_id = %user.id, role = %user.role, by = %actor.id, "User created");
        Ok(user.to_session())
    }

    /// Apply `update` to a user. The password is re-hashed only when a new
    /// one is supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an unknown or hidden user,
    /// [`ServiceError::Forbidden`] for a role `actor` may not assign,
    /// [`ServiceError::Conflict`] for a taken username, a core error for a
    /// password that fails the policy, or a storage error.
    pub fn update_user(&self, actor: &SessionUser, id: &str, update: UserUpdate) -> Result<SessionUser> {
        require_manager(actor)?;
        let target = self.visible_user(actor, id)?;
        if let Some(role) = update.role {
            if role != target.role && !actor.role.can_assign(role) {
                return Err(ServiceError::Forbidden);
            }
        }
        if let Some(username) = &update.username {
            if username.trim().is_empty() {
                return Err(ServiceError::BadRequest("username is required".into()));
            }
            self.ensure_username_free(username.trim(), Some(id))?;
        }

        let mut partial = match serde_json::to_value(&update).map_err(pos_store::StoreError::from)? {
            Value::Object(map) => map,
            _ => Record::new(),
        };
        if let Some(username) = &update.username {
            partial.insert("username".into(), Value::String(username.trim().to_string()));
        }
        if let Some(password) = update.password.as_deref().filter(|p| !p.is_empty()) {
            check_policy(password)?;
            let hashed = hash_password(password, self.config.password_iterations)?;
            partial.insert("password".into(), Value::String(hashed));
        }

        let merged = self
            .store
            .update_one(keys::USERS, id, partial)?
            .ok_or_else(|| ServiceError::NotFound(format!("user {id}")))?;
        let user: User = serde_json::from_value(Value::Object(merged))
            .map_err(pos_store::StoreError::from)?;

        tracing::info!(user_id = %id, by = %actor.id, "User updated");
        Ok(user.to_session())
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` manages users,
    /// [`ServiceError::BadRequest`] when `actor` deletes themselves,
    /// [`ServiceError::NotFound`] for an unknown or hidden user, or a
    /// storage error.
    pub fn delete_user(&self, actor: &SessionUser, id: &str) -> Result<()> {
        require_manager(actor)?;
        if actor.id == id {
            return Err(ServiceError::BadRequest("cannot delete the logged-in user".into()));
        }
        self.visible_user(actor, id)?;
        self.store.delete_one(keys::USERS, id)?;

        tracing::info!(user_id = %id, by = %actor.id, "User deleted");
        Ok(())
    }

    /// Change the logged-in user's own password.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unauthorized`] when the current password does
    /// not verify, a core error when the new one fails the policy, or a
    /// storage error.
    pub fn change_password(&self, actor: &SessionUser, current: &str, new: &str) -> Result<()> {
        let user = self
            .store
            .find_one(keys::USERS, &actor.id)
            .and_then(|record| serde_json::from_value::<User>(Value::Object(record)).ok())
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", actor.id)))?;
        if !verify_password(current, &user.password) {
            return Err(ServiceError::Unauthorized);
        }
        check_policy(new)?;

        let mut partial = Record::new();
        partial.insert(
            "password".into(),
            Value::String(hash_password(new, self.config.password_iterations)?),
        );
        self.store.update_one(keys::USERS, &actor.id, partial)?;

        tracing::info!(user_id = %actor.id, "Password changed");
        Ok(())
    }

    fn visible_user(&self, actor: &SessionUser, id: &str) -> Result<User> {
        self.store
            .get_all_as::<User>(keys::USERS)
            .into_iter()
            .find(|user| user.id == id && can_touch(actor, user))
            .ok_or_else(|| ServiceError::NotFound(format!("user {id}")))
    }

    fn ensure_username_free(&self, username: &str, except_id: Option<&str>) -> Result<()> {
        let taken = self
            .store
            .get_all_as::<User>(keys::USERS)
            .iter()
            .any(|user| user.username == username && Some(user.id.as_str()) != except_id);
        if taken {
            return Err(ServiceError::Conflict(format!("username {username} is taken")));
        }
        Ok(())
    }
}
