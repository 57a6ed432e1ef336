//! Permission grants attached to groups.

use std::fmt;
use std::str::FromStr;

use super::GroupId;

/// Operation a group can be granted on the entities it owns
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    Create,
    Read,
    Update,
    Delete,
}

/// Error type for parsing Permission from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePermissionError(pub String);

impl fmt::Display for ParsePermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid permission: {}", self.0)
    }
}

impl std::error::Error for ParsePermissionError {}

impl FromStr for Permission {
    type Err = ParsePermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Permission::Create),
            "read" => Ok(Permission::Read),
            "update" => Ok(Permission::Update),
            "delete" => Ok(Permission::Delete),
            _ => Err(ParsePermissionError(s.to_string())),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::Create,
        Permission::Read,
        Permission::Update,
        Permission::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Create => "create",
            Permission::Read => "read",
            Permission::Update => "update",
            Permission::Delete => "delete",
        }
    }
}

/// A permission and whether it flows down to descendant groups
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PermissionGrant {
    pub permission: Permission,
    pub propagate: bool,
}

impl PermissionGrant {
    pub fn propagating(permission: Permission) -> Self {
        Self {
            permission,
            propagate: true,
        }
    }

    pub fn local(permission: Permission) -> Self {
        Self {
            permission,
            propagate: false,
        }
    }
}

/// Grant row recorded against a group
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupPermission {
    pub group_id: GroupId,
    pub permission: Permission,
    pub propagate: bool,
}

/// A grant reached from one of the user's direct memberships.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReachingGrant {
    /// Direct membership at or above the granting group.
    pub via: GroupId,
    pub grant: GroupPermission,
}
