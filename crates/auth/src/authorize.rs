use serde::Serialize;
use thiserror::Error;

use portal_core::{RoleId, UserId};

use crate::{Claims, PermissionRequirement};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("unknown policy '{0}'")]
    UnknownPolicy(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide a permission requirement for a principal.
///
/// Allowed iff the claims contain the exact code (case-sensitive). There is
/// no role shortcut: an `admin` without the grant is denied.
///
/// - No IO
/// - No panics
pub fn evaluate(requirement: &PermissionRequirement, claims: &Claims) -> Decision {
    if claims.has_permission(requirement.permission().as_str()) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// [`evaluate`] as a `Result`, for `?` at call sites.
pub fn authorize(requirement: &PermissionRequirement, claims: &Claims) -> Result<(), AuthzError> {
    match evaluate(requirement, claims) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(AuthzError::Forbidden(
            requirement.permission().as_str().to_string(),
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
///
/// Answers "why was this request denied?" without exposing anything the
/// principal's own token does not already carry.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    /// The permission that was being checked.
    pub required_permission: String,

    /// Whether the authorization was granted.
    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    /// Details about the principal's state.
    pub principal: PrincipalState,

    /// If denied, this explains what was missing.
    pub denial_reason: Option<DenialReason>,
}

/// Snapshot of the principal being checked.
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub role_name: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    MissingPermission,
    /// The principal holds the code with different letter case.
    CaseMismatch,
}

/// Explain why a requirement is (or would be) allowed or denied.
pub fn explain_authorization(
    requirement: &PermissionRequirement,
    claims: &Claims,
) -> AuthorizationExplanation {
    let required = requirement.permission().as_str();
    let principal = PrincipalState {
        user_id: claims.user_id(),
        role_id: claims.role_id(),
        role_name: claims.role_name().to_string(),
        permissions: claims
            .permissions()
            .iter()
            .map(|p| p.as_str().to_string())
            .collect(),
    };

    if evaluate(requirement, claims).is_allowed() {
        return AuthorizationExplanation {
            required_permission: required.to_string(),
            granted: true,
            reason: format!("Principal has explicit permission '{required}'"),
            principal,
            denial_reason: None,
        };
    }

    let near_miss = principal
        .permissions
        .iter()
        .find(|p| p.eq_ignore_ascii_case(required))
        .cloned();

    let denial_reason = match near_miss {
        Some(held) => DenialReason {
            kind: DenialKind::CaseMismatch,
            message: format!("Principal holds '{held}' but '{required}' is required (codes are case-sensitive)"),
            suggestions: vec![format!("Declare the endpoint with the exact code '{held}' or fix the grant")],
        },
        None => DenialReason {
            kind: DenialKind::MissingPermission,
            message: format!("Missing required permission: '{required}'"),
            suggestions: vec![
                format!("Grant '{required}' to role '{}' ({})", principal.role_name, principal.role_id),
                "Refresh the token after changing grants; permissions are snapshotted at issuance".to_string(),
            ],
        },
    };

    AuthorizationExplanation {
        required_permission: required.to_string(),
        granted: false,
        reason: format!(
            "Principal does not have permission '{}'. Current permissions: {:?}",
            required, principal.permissions
        ),
        principal,
        denial_reason: Some(denial_reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Permission, PermissionCode};
    use proptest::prelude::*;

    fn claims_with(perms: &[&'static str], role: i32) -> Claims {
        Claims::new(
            UserId::new(10),
            "user@example.com",
            RoleId::new(role),
            perms.iter().map(|p| Permission::new(*p)),
        )
    }

    #[test]
    fn allows_when_code_present() {
        let req = PermissionRequirement::new(PermissionCode::ListingCreate);
        let claims = claims_with(&["listing.create"], 3);
        assert_eq!(evaluate(&req, &claims), Decision::Allow);
        assert!(authorize(&req, &claims).is_ok());
    }

    #[test]
    fn admin_without_grants_is_denied() {
        let req = PermissionRequirement::new(PermissionCode::ListingApprove);
        let claims = claims_with(&[], 1);
        assert_eq!(claims.role_name(), "admin");
        assert_eq!(
            authorize(&req, &claims),
            Err(AuthzError::Forbidden("listing.approve".to_string()))
        );
    }

    #[test]
    fn case_mismatch_is_denied_and_explained() {
        let req = PermissionRequirement::new(Permission::new("listing.create"));
        let claims = claims_with(&["Listing.Create"], 2);
        assert_eq!(evaluate(&req, &claims), Decision::Deny);

        let explanation = explain_authorization(&req, &claims);
        assert!(!explanation.granted);
        assert_eq!(
            explanation.denial_reason.map(|d| d.kind),
            Some(DenialKind::CaseMismatch)
        );
    }

    #[test]
    fn explanation_for_granted_request_has_no_denial() {
        let req = PermissionRequirement::new(PermissionCode::ListingCreate);
        let explanation = explain_authorization(&req, &claims_with(&["listing.create"], 3));
        assert!(explanation.granted);
        assert!(explanation.denial_reason.is_none());
        assert_eq!(explanation.principal.role_name, "private_seller");
    }

    proptest! {
        /// Property: allow iff the code is literally in the permission set.
        #[test]
        fn allow_iff_literal_membership(
            held in prop::collection::btree_set("[a-zA-Z]{1,4}\\.[a-zA-Z]{1,4}", 0..6),
            required in "[a-zA-Z]{1,4}\\.[a-zA-Z]{1,4}",
        ) {
            let claims = Claims::new(
                UserId::new(1),
                "p@example.com",
                RoleId::new(1),
                held.iter().cloned().map(Permission::new),
            );
            let req = PermissionRequirement::new(Permission::new(required.clone()));
            prop_assert_eq!(evaluate(&req, &claims).is_allowed(), held.contains(&required));
        }
    }
}
