//! Policy-name resolution.
//!
//! Endpoints name the policy they require. Names carrying the
//! [`PERMISSION_POLICY_PREFIX`] marker become a requirement on the permission
//! code that follows it; every other name is handed, unchanged, to a fallback
//! [`PolicyProvider`].

use std::collections::HashMap;

use crate::{authorize, AuthzError, Claims, Decision, Permission, PermissionCode};

pub const PERMISSION_POLICY_PREFIX: &str = "PERM:";

/// Name of the built-in policy that only requires a valid access token.
pub const AUTHENTICATED_POLICY: &str = "authenticated";

/// A requirement on exactly one permission code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionRequirement {
    permission: Permission,
}

impl PermissionRequirement {
    pub fn new(permission: impl Into<Permission>) -> Self {
        Self {
            permission: permission.into(),
        }
    }

    pub fn permission(&self) -> &Permission {
        &self.permission
    }
}

/// A resolved authorization rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Any principal holding a valid access token.
    Authenticated,
    /// Principal must hold the permission code.
    Permission(PermissionRequirement),
}

impl Policy {
    pub fn permission(code: PermissionCode) -> Self {
        Policy::Permission(PermissionRequirement::new(code))
    }

    /// Decide this policy for an authenticated principal.
    pub fn check(&self, claims: &Claims) -> Decision {
        match self {
            Policy::Authenticated => Decision::Allow,
            Policy::Permission(requirement) => authorize::evaluate(requirement, claims),
        }
    }
}

/// Outcome of parsing a policy name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Requirement(PermissionRequirement),
    Fallback(&'a str),
}

/// Parse a policy name without consulting any registry.
///
/// The marker prefix is matched ASCII case-insensitively; the remainder is
/// taken verbatim (no trimming, no case folding, no catalog check).
pub fn parse_policy_name(name: &str) -> Resolution<'_> {
    let prefix_len = PERMISSION_POLICY_PREFIX.len();
    match name.get(..prefix_len) {
        Some(head) if head.eq_ignore_ascii_case(PERMISSION_POLICY_PREFIX) => {
            let code = name[prefix_len..].to_string();
            Resolution::Requirement(PermissionRequirement::new(Permission::new(code)))
        }
        _ => Resolution::Fallback(name),
    }
}

/// Source of policies that are not permission requirements.
pub trait PolicyProvider: Send + Sync {
    fn policy(&self, name: &str) -> Option<Policy>;
}

/// Default fallback: a fixed table of named policies.
#[derive(Debug, Clone)]
pub struct NamedPolicies {
    policies: HashMap<String, Policy>,
}

impl NamedPolicies {
    /// Table containing only [`AUTHENTICATED_POLICY`].
    pub fn new() -> Self {
        let mut policies = HashMap::new();
        policies.insert(AUTHENTICATED_POLICY.to_string(), Policy::Authenticated);
        Self { policies }
    }

    pub fn with(mut self, name: impl Into<String>, policy: Policy) -> Self {
        self.policies.insert(name.into(), policy);
        self
    }
}

impl Default for NamedPolicies {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyProvider for NamedPolicies {
    fn policy(&self, name: &str) -> Option<Policy> {
        self.policies.get(name).cloned()
    }
}

/// Resolves policy names into [`Policy`] values.
///
/// Resolution happens when routes are registered, so an unknown name fails at
/// startup rather than on a request.
#[derive(Debug, Clone, Default)]
pub struct PolicyResolver<F = NamedPolicies> {
    fallback: F,
}

impl<F: PolicyProvider> PolicyResolver<F> {
    pub fn new(fallback: F) -> Self {
        Self { fallback }
    }

    pub fn resolve(&self, name: &str) -> Result<Policy, AuthzError> {
        match parse_policy_name(name) {
            Resolution::Requirement(requirement) => Ok(Policy::Permission(requirement)),
            Resolution::Fallback(name) => self
                .fallback
                .policy(name)
                .ok_or_else(|| AuthzError::UnknownPolicy(name.to_string())),
        }
    }

    /// Resolve the gate for a catalog permission.
    pub fn for_permission(&self, code: PermissionCode) -> Result<Policy, AuthzError> {
        self.resolve(&code.policy_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::{RoleId, UserId};

    #[test]
    fn prefixed_name_becomes_requirement_verbatim() {
        assert_eq!(
            parse_policy_name("PERM:listing.create"),
            Resolution::Requirement(PermissionRequirement::new(Permission::new("listing.create")))
        );
        assert_eq!(
            parse_policy_name("PERM: Listing.Create "),
            Resolution::Requirement(PermissionRequirement::new(Permission::new(" Listing.Create ")))
        );
    }

    #[test]
    fn prefix_match_ignores_ascii_case() {
        assert!(matches!(
            parse_policy_name("perm:listing.approve"),
            Resolution::Requirement(r) if r.permission().as_str() == "listing.approve"
        ));
    }

    #[test]
    fn other_names_fall_through_unchanged() {
        assert_eq!(parse_policy_name("authenticated"), Resolution::Fallback("authenticated"));
        assert_eq!(parse_policy_name("PER"), Resolution::Fallback("PER"));
        assert_eq!(parse_policy_name("né"), Resolution::Fallback("né"));
    }

    #[test]
    fn resolver_delegates_to_fallback_registry() {
        let resolver = PolicyResolver::new(
            NamedPolicies::new().with("can_publish", Policy::permission(PermissionCode::ListingApprove)),
        );

        assert_eq!(resolver.resolve("authenticated").unwrap(), Policy::Authenticated);
        assert_eq!(
            resolver.resolve("can_publish").unwrap(),
            Policy::permission(PermissionCode::ListingApprove)
        );
        assert_eq!(
            resolver.resolve("nope"),
            Err(AuthzError::UnknownPolicy("nope".to_string()))
        );
    }

    #[test]
    fn unknown_permission_code_resolves_but_never_matches() {
        let resolver = PolicyResolver::<NamedPolicies>::default();
        let policy = resolver.resolve("PERM:does.not.exist").unwrap();
        let claims = Claims::new(
            UserId::new(1),
            "admin@example.com",
            RoleId::new(1),
            [Permission::new("listing.create")],
        );
        assert_eq!(policy.check(&claims), Decision::Deny);
    }

    #[test]
    fn catalog_permission_resolves_through_prefix() {
        let resolver = PolicyResolver::<NamedPolicies>::default();
        assert_eq!(
            resolver.for_permission(PermissionCode::ListingCreate).unwrap(),
            Policy::permission(PermissionCode::ListingCreate)
        );
    }
}
