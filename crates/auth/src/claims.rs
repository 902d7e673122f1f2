use std::collections::BTreeSet;

use portal_core::{RoleId, UserId};

use crate::{roles, Permission};

/// Authenticated facts about a principal, as embedded in a token.
///
/// `permissions` is a snapshot of the codes granted to `role_id` when the
/// token was issued; it is not re-read until the next refresh. Values are
/// never edited in place: a refreshed identity is a new `Claims`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    user_id: UserId,
    email: String,
    role_id: RoleId,
    role_name: String,
    permissions: BTreeSet<Permission>,
}

impl Claims {
    /// Build claims from a storage lookup. The role name is derived from the role id.
    pub fn new(
        user_id: UserId,
        email: impl Into<String>,
        role_id: RoleId,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            user_id,
            email: email.into(),
            role_id,
            role_name: roles::role_name(role_id).to_string(),
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Rebuild claims decoded from a verified token.
    pub(crate) fn from_parts(
        user_id: UserId,
        email: String,
        role_id: RoleId,
        role_name: String,
        permissions: BTreeSet<Permission>,
    ) -> Self {
        Self {
            user_id,
            email,
            role_id,
            role_name,
            permissions,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    /// Exact, case-sensitive membership test.
    pub fn has_permission(&self, code: &str) -> bool {
        self.permissions.iter().any(|p| p.as_str() == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_name_is_derived_from_role_id() {
        let claims = Claims::new(UserId::new(7), "agent@example.com", RoleId::new(2), []);
        assert_eq!(claims.role_name(), "agent");
    }

    #[test]
    fn duplicate_permissions_collapse() {
        let claims = Claims::new(
            UserId::new(1),
            "a@example.com",
            RoleId::new(1),
            [
                Permission::new("listing.create"),
                Permission::new("listing.create"),
            ],
        );
        assert_eq!(claims.permissions().len(), 1);
        assert!(claims.has_permission("listing.create"));
        assert!(!claims.has_permission("Listing.Create"));
    }
}
