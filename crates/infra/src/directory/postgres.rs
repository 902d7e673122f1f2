//! Postgres-backed user directory.
//!
//! Reads the portal schema (`real_estate`):
//!
//! | Table | Columns used |
//! |-------|--------------|
//! | `users` | `id`, `email`, `role_id`, `password_hash`, `is_active` |
//! | `role_permissions` | `role_id`, `permission_id` |
//! | `permissions` | `id`, `code`, `is_active` |
//!
//! ## Error Mapping
//!
//! | SQLx Error | DirectoryError |
//! |------------|----------------|
//! | `PoolClosed`, `PoolTimedOut`, `Io`, `Tls` | `Unavailable` |
//! | anything else | `Query` |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use portal_auth::Permission;
use portal_core::{RoleId, UserId};

use super::{DirectoryError, UserDirectory, UserRecord};

/// Postgres user directory.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; no extra locking.
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: Arc<PgPool>,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect a pool from a database URL.
    pub async fn connect(database_url: &str) -> Result<Self, DirectoryError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, role_id, password_hash
            FROM real_estate.users
            WHERE LOWER(email) = LOWER($1)
              AND is_active = TRUE
            LIMIT 1
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_email", e))?;

        row.map(|r| user_from_row(&r)).transpose()
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, role_id, password_hash
            FROM real_estate.users
            WHERE id = $1
              AND is_active = TRUE
            LIMIT 1
            "#,
        )
        .bind(user_id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.map(|r| user_from_row(&r)).transpose()
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn permissions_for(&self, user_id: UserId) -> Result<Vec<Permission>, DirectoryError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT p.code
            FROM real_estate.users u
            JOIN real_estate.role_permissions rp ON rp.role_id = u.role_id
            JOIN real_estate.permissions p ON p.id = rp.permission_id
            WHERE u.id = $1
              AND u.is_active = TRUE
              AND p.is_active = TRUE
            ORDER BY p.code
            "#,
        )
        .bind(user_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("permissions_for", e))?;

        rows.iter()
            .map(|r| {
                r.try_get::<String, _>("code")
                    .map(Permission::new)
                    .map_err(|e| map_sqlx_error("permissions_for", e))
            })
            .collect()
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<UserRecord, DirectoryError> {
    let decode = |e| map_sqlx_error("decode user row", e);
    Ok(UserRecord {
        user_id: UserId::new(row.try_get::<i64, _>("id").map_err(decode)?),
        email: row.try_get::<String, _>("email").map_err(decode)?,
        role_id: RoleId::new(row.try_get::<i32, _>("role_id").map_err(decode)?),
        password_hash: row.try_get::<String, _>("password_hash").map_err(decode)?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DirectoryError {
    match err {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            DirectoryError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => DirectoryError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => DirectoryError::Unavailable(format!("tls error in {operation}: {e}")),
        sqlx::Error::Database(db_err) => {
            DirectoryError::Query(format!("database error in {operation}: {}", db_err.message()))
        }
        other => DirectoryError::Query(format!("{operation}: {other}")),
    }
}
