//! Development-only demo accounts for the in-memory directory.

use anyhow::Context;

use portal_auth::PermissionCode;
use portal_core::{RoleId, UserId};
use portal_infra::{Argon2PasswordVerifier, InMemoryUserDirectory, UserRecord};

pub const DEFAULT_DEV_PASSWORD: &str = "ChangeMe123!";

/// Email and role id of each demo account.
const DEMO_USERS: [(&str, i32); 3] = [
    ("admin@portal.local", 1),
    ("agent@portal.local", 2),
    ("seller@portal.local", 3),
];

fn role_grants(role_id: i32) -> &'static [PermissionCode] {
    match role_id {
        1 => &PermissionCode::ALL,
        _ => &[PermissionCode::ListingCreate],
    }
}

/// Build a directory holding one account per role, all sharing `password`.
pub fn seeded_directory(
    hasher: &Argon2PasswordVerifier,
    password: &str,
) -> anyhow::Result<InMemoryUserDirectory> {
    let directory = InMemoryUserDirectory::new();

    for (idx, (email, role)) in DEMO_USERS.iter().enumerate() {
        let role_id = RoleId::new(*role);
        directory.insert(UserRecord {
            user_id: UserId::new(idx as i64 + 1),
            email: (*email).to_string(),
            role_id,
            password_hash: hasher.hash(password).context("hash seed password")?,
        })?;
        for code in role_grants(*role) {
            directory.grant(role_id, *code)?;
        }
    }

    tracing::warn!(
        accounts = ?DEMO_USERS.iter().map(|(email, _)| *email).collect::<Vec<_>>(),
        "seeded in-memory directory with demo accounts"
    );
    Ok(directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_infra::{PasswordVerifier, UserDirectory};

    #[tokio::test]
    async fn every_role_gets_an_account() {
        let hasher = Argon2PasswordVerifier::new();
        let dir = seeded_directory(&hasher, "pw").unwrap();

        let admin = dir.find_by_email("admin@portal.local").await.unwrap().unwrap();
        assert!(hasher.verify("pw", &admin.password_hash));
        assert_eq!(dir.permissions_for(admin.user_id).await.unwrap().len(), 2);

        let seller = dir.find_by_email("seller@portal.local").await.unwrap().unwrap();
        assert_eq!(seller.role_id, RoleId::new(3));
        assert_eq!(
            dir.permissions_for(seller.user_id).await.unwrap(),
            vec![PermissionCode::ListingCreate.into()]
        );
    }
}
