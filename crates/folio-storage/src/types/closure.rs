//! Transitive-closure rows over the group hierarchy.

use super::GroupId;

/// One `(ancestor, descendant, depth)` row. Every group has a reflexive row with depth 0.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupClosure {
    pub ancestor_id: GroupId,
    pub descendant_id: GroupId,
    pub depth: u32,
}

impl GroupClosure {
    pub fn reflexive(group_id: GroupId) -> Self {
        Self {
            ancestor_id: group_id,
            descendant_id: group_id,
            depth: 0,
        }
    }
}
