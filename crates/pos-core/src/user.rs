//! User accounts, roles and the session snapshot.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// A user account as stored in `pos_users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Record id.
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,

    /// Login name.
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: String,

    /// Encoded password hash. Never leaves the users collection.
    #[serde(default, deserialize_with = "lenient::text")]
    pub password: String,

    /// Display name.
    #[serde(default, deserialize_with = "lenient::text")]
    pub nama: String,

    /// Email address.
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,

    /// Phone number.
    #[serde(default, deserialize_with = "lenient::text")]
    pub no_telepon: String,

    /// Role.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub role: Role,

    /// Account status.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: UserStatus,
}

impl User {
    /// Whether the account may log in.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// The session view of this user.
    #[must_use]
    pub fn to_session(&self) -> SessionUser {
        SessionUser {
            id: self.id.clone(),
            username: self.username.clone(),
            nama: self.nama.clone(),
            email: self.email.clone(),
            no_telepon: self.no_telepon.clone(),
            role: self.role,
            status: self.status,
        }
    }
}

/// The logged-in user, as stored in `pos_auth`. Carries no password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// User id.
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    /// Login name.
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: String,
    /// Display name.
    #[serde(default, deserialize_with = "lenient::text")]
    pub nama: String,
    /// Email address.
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,
    /// Phone number.
    #[serde(default, deserialize_with = "lenient::text")]
    pub no_telepon: String,
    /// Role.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub role: Role,
    /// Account status.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status: UserStatus,
}

/// User role, from most to least privileged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including other super admins.
    SuperAdmin,
    /// Store administrator.
    Admin,
    /// Store manager.
    Manager,
    /// Cashier. Unknown roles read as this.
    #[default]
    Kasir,
}

impl Role {
    /// The stored name of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Kasir => "kasir",
        }
    }

    /// Whether the role may create, edit and delete users.
    #[must_use]
    pub fn can_manage_users(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }

    /// Whether the role may assign `other` to a user.
    ///
    /// Only a super admin may grant super admin.
    #[must_use]
    pub fn can_assign(self, other: Role) -> bool {
        self.can_manage_users() && (other != Self::SuperAdmin || self == Self::SuperAdmin)
    }

    /// Whether the role may create, edit and delete products and expenses.
    #[must_use]
    pub fn can_manage_inventory(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin | Self::Manager)
    }

    /// Whether the role may see profit, inventory value and expense figures.
    #[must_use]
    pub fn can_view_financials(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin | Self::Manager)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// May log in.
    Active,
    /// May not log in. Unknown statuses read as this.
    #[default]
    Inactive,
}
