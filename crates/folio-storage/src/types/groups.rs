//! Group and membership types.

use chrono::{DateTime, Utc};

use super::{GroupId, UserId};

/// Group record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    /// None for anonymous sharing groups.
    pub name: Option<String>,
    /// Hidden groups only exist to mediate cross-group sharing.
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Name for display; hidden or unnamed groups render as their id.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.id.to_string(),
        }
    }
}

/// Direct group membership record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupMember {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_id() {
        let mut group = Group {
            id: GroupId::new(),
            name: Some("  ".to_string()),
            hidden: true,
            created_at: Utc::now(),
        };
        assert_eq!(group.display_name(), group.id.to_string());

        group.name = None;
        assert_eq!(group.display_name(), group.id.to_string());

        group.name = Some("writers".to_string());
        assert_eq!(group.display_name(), "writers");
    }
}
