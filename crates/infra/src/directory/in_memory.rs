use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use portal_auth::Permission;
use portal_core::{RoleId, UserId};

use super::{DirectoryError, UserDirectory, UserRecord};

#[derive(Debug, Clone)]
struct StoredUser {
    record: UserRecord,
    active: bool,
}

/// In-memory user directory.
///
/// Intended for tests/dev. Grants are kept per role, so changing a role's
/// grants or a user's role is visible to the next lookup.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, StoredUser>>,
    grants: RwLock<HashMap<RoleId, BTreeSet<Permission>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an active user.
    pub fn insert(&self, record: UserRecord) -> Result<(), DirectoryError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        users.insert(
            record.user_id,
            StoredUser {
                record,
                active: true,
            },
        );
        Ok(())
    }

    pub fn deactivate(&self, user_id: UserId) -> Result<(), DirectoryError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        if let Some(user) = users.get_mut(&user_id) {
            user.active = false;
        }
        Ok(())
    }

    pub fn assign_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), DirectoryError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        if let Some(user) = users.get_mut(&user_id) {
            user.record.role_id = role_id;
        }
        Ok(())
    }

    pub fn grant(&self, role_id: RoleId, permission: impl Into<Permission>) -> Result<(), DirectoryError> {
        let mut grants = self.grants.write().map_err(|_| poisoned())?;
        grants.entry(role_id).or_default().insert(permission.into());
        Ok(())
    }

    pub fn revoke(&self, role_id: RoleId, permission: &Permission) -> Result<(), DirectoryError> {
        let mut grants = self.grants.write().map_err(|_| poisoned())?;
        if let Some(set) = grants.get_mut(&role_id) {
            set.remove(permission);
        }
        Ok(())
    }

    fn active_user<F>(&self, predicate: F) -> Result<Option<UserRecord>, DirectoryError>
    where
        F: Fn(&UserRecord) -> bool,
    {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users
            .values()
            .find(|u| u.active && predicate(&u.record))
            .map(|u| u.record.clone()))
    }
}

fn poisoned() -> DirectoryError {
    DirectoryError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let email = email.trim();
        self.active_user(|u| u.email.eq_ignore_ascii_case(email))
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        self.active_user(|u| u.user_id == user_id)
    }

    async fn permissions_for(&self, user_id: UserId) -> Result<Vec<Permission>, DirectoryError> {
        let Some(user) = self.active_user(|u| u.user_id == user_id)? else {
            return Ok(Vec::new());
        };
        let grants = self.grants.read().map_err(|_| poisoned())?;
        Ok(grants
            .get(&user.role_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }
}
