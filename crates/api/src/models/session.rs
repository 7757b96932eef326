//! Session-related types for caller identity.
//!
//! The login flow lives outside this service; it writes a [`CurrentUser`]
//! into the shared session store under [`session_keys::CURRENT_USER`].

use serde::{Deserialize, Serialize};

use shopforge_core::{UserId, UserRole};

/// Session-stored caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Platform role at login time.
    pub role: UserRole,
}

impl CurrentUser {
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.role == UserRole::SuperAdmin
    }
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
