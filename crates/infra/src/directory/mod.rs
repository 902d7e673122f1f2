//! User directory boundary.
//!
//! The auth flows only need three lookups: a user by email (login), a user by
//! id (refresh) and the permission codes currently granted to a user's role.
//! Only active users are ever returned.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use portal_auth::Permission;
use portal_core::{RoleId, UserId};

pub use in_memory::InMemoryUserDirectory;
pub use postgres::PostgresUserDirectory;

/// Login-relevant view of an active user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: UserId,
    pub email: String,
    pub role_id: RoleId,
    pub password_hash: String,
}

/// Storage failure. Never retried here; the API surfaces it as a 500.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),

    #[error("user directory query failed: {0}")]
    Query(String),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Case-insensitive email lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, DirectoryError>;

    /// Active permission codes granted to the user's current role.
    async fn permissions_for(&self, user_id: UserId) -> Result<Vec<Permission>, DirectoryError>;
}

#[async_trait]
impl<S> UserDirectory for Arc<S>
where
    S: UserDirectory + ?Sized,
{
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        (**self).find_by_email(email).await
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        (**self).find_by_id(user_id).await
    }

    async fn permissions_for(&self, user_id: UserId) -> Result<Vec<Permission>, DirectoryError> {
        (**self).permissions_for(user_id).await
    }
}
