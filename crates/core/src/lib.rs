//! `portal-core`: shared primitives for the listings portal.
//!
//! Pure types only: identifiers and the domain error model. No IO.

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{RoleId, UserId};
