//! Generic entity registration and sharing links.

use chrono::{DateTime, Utc};

use super::{EntityId, GroupId};

/// The row every content object is registered as. `primary_group_id` is the owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    pub primary_group_id: GroupId,
    pub created_at: DateTime<Utc>,
}

/// Additional (non-primary) attachment of an entity to a sharing group
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityGroupLink {
    pub entity_id: EntityId,
    pub group_id: GroupId,
}
