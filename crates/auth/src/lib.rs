//! `portal-auth`: token lifecycle and permission-based authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage: it receives
//! already-loaded claims and configuration, and returns plain values.

pub mod authorize;
pub mod claims;
pub mod config;
pub mod permissions;
pub mod policy;
pub mod roles;
pub mod token;

pub use authorize::{
    authorize, evaluate, explain_authorization, AuthorizationExplanation, AuthzError, Decision,
    DenialKind,
};
pub use claims::Claims;
pub use config::{ConfigError, TokenConfig};
pub use permissions::{Permission, PermissionCode};
pub use policy::{
    parse_policy_name, NamedPolicies, PermissionRequirement, Policy, PolicyProvider,
    PolicyResolver, Resolution, AUTHENTICATED_POLICY, PERMISSION_POLICY_PREFIX,
};
pub use roles::{role_name, Role};
pub use token::{TokenError, TokenKind, TokenPair, TokenService};
