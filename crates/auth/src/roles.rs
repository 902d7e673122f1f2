use portal_core::RoleId;

/// Display role derived from a role id.
///
/// Roles are informational once claims are issued; gates only look at
/// permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Agent,
    PrivateSeller,
    Unknown,
}

impl Role {
    pub fn from_id(role_id: RoleId) -> Self {
        match role_id.get() {
            1 => Role::Admin,
            2 => Role::Agent,
            3 => Role::PrivateSeller,
            _ => Role::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agent => "agent",
            Role::PrivateSeller => "private_seller",
            Role::Unknown => "unknown",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role name for a role id (`1 → admin`, `2 → agent`, `3 → private_seller`).
pub fn role_name(role_id: RoleId) -> &'static str {
    Role::from_id(role_id).as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_role_ids_map_to_names() {
        assert_eq!(role_name(RoleId::new(1)), "admin");
        assert_eq!(role_name(RoleId::new(2)), "agent");
        assert_eq!(role_name(RoleId::new(3)), "private_seller");
    }

    #[test]
    fn other_role_ids_are_unknown() {
        assert_eq!(role_name(RoleId::new(0)), "unknown");
        assert_eq!(role_name(RoleId::new(-1)), "unknown");
        assert_eq!(role_name(RoleId::new(99)), "unknown");
    }
}
