//! Infrastructure adapters: user/permission storage and password verification.

pub mod directory;
pub mod password;

pub use directory::{
    DirectoryError, InMemoryUserDirectory, PostgresUserDirectory, UserDirectory, UserRecord,
};
pub use password::{Argon2PasswordVerifier, PasswordError, PasswordVerifier, DUMMY_PASSWORD_HASH};
