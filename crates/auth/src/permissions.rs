use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission code carried in token claims.
///
/// Permissions are opaque strings (e.g. "listing.create") compared exactly and
/// case-sensitively. Codes that are not in [`PermissionCode`] are still valid
/// claims; they simply never satisfy a gate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PermissionCode> for Permission {
    fn from(code: PermissionCode) -> Self {
        Self(Cow::Borrowed(code.as_str()))
    }
}

/// Catalog of permissions that portal endpoints gate on.
///
/// Endpoint declarations use these variants so a typo is a compile error; the
/// string form only appears once the gate is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionCode {
    ListingCreate,
    ListingApprove,
}

impl PermissionCode {
    pub const ALL: [PermissionCode; 2] = [PermissionCode::ListingCreate, PermissionCode::ListingApprove];

    pub const fn as_str(self) -> &'static str {
        match self {
            PermissionCode::ListingCreate => "listing.create",
            PermissionCode::ListingApprove => "listing.approve",
        }
    }

    /// Policy name that resolves to a requirement on this code.
    pub fn policy_name(self) -> String {
        format!("{}{}", crate::policy::PERMISSION_POLICY_PREFIX, self.as_str())
    }
}

impl core::fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_codes_are_dotted_lowercase() {
        for code in PermissionCode::ALL {
            let s = code.as_str();
            assert!(s.contains('.'), "{s}");
            assert_eq!(s, s.to_lowercase());
        }
    }

    #[test]
    fn policy_name_carries_marker_prefix() {
        assert_eq!(PermissionCode::ListingCreate.policy_name(), "PERM:listing.create");
    }

    #[test]
    fn permission_from_code_matches_string_form() {
        let p: Permission = PermissionCode::ListingApprove.into();
        assert_eq!(p, Permission::new("listing.approve"));
    }
}
