//! The store traits that backends implement.
//!
//! Each trait covers one persistence concern. A backend's transaction type implements all
//! of them, which is what [`Transaction`] requires.

use crate::types::*;
use crate::StoreError;

/// Entry point of a backend: hands out transactions.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    type Txn: Transaction;

    /// Begin a transaction. Dropping it without calling `commit` rolls it back.
    async fn begin_txn(&self) -> Result<Self::Txn, StoreError>;
}

/// A unit of work spanning every store concern.
#[async_trait::async_trait]
pub trait Transaction:
    GroupStore + GroupClosureStore + GroupMembershipStore + PermissionGrantStore + EntityStore + Send
{
    async fn commit(self) -> Result<(), StoreError>;
    async fn rollback(self) -> Result<(), StoreError>;
}

// ───────────────────────────────────── Groups ─────────────────────────────────────────

#[async_trait::async_trait]
pub trait GroupStore: Send {
    /// Insert a group row. The caller is responsible for its reflexive closure row.
    async fn insert_group(&mut self, group: &Group) -> Result<(), StoreError>;

    /// Get group by ID.
    async fn get_group(&mut self, group_id: &GroupId) -> Result<Group, StoreError>;

    /// Groups the user is a direct member of, ordered by name.
    async fn list_member_groups(
        &mut self,
        user_id: &UserId,
        include_hidden: bool,
    ) -> Result<Vec<Group>, StoreError>;

    /// A hidden group that sits beneath both `a` and `b` and beneath nothing else outside
    /// their ancestry.
    async fn find_sharing_group(
        &mut self,
        a: &GroupId,
        b: &GroupId,
    ) -> Result<Option<GroupId>, StoreError>;

    /// Record the user's default group (Conflict if one is already recorded).
    async fn set_default_group(
        &mut self,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<(), StoreError>;

    async fn get_default_group(&mut self, user_id: &UserId)
        -> Result<Option<GroupId>, StoreError>;
}

// ───────────────────────────────────── Closure ────────────────────────────────────────

#[async_trait::async_trait]
pub trait GroupClosureStore: Send {
    /// Insert a closure row unless its `(ancestor, descendant)` pair already exists.
    /// Returns false when the row was skipped.
    async fn insert_closure(&mut self, row: &GroupClosure) -> Result<bool, StoreError>;

    /// Depth of the `(ancestor, descendant)` row, if any.
    async fn depth(
        &mut self,
        ancestor: &GroupId,
        descendant: &GroupId,
    ) -> Result<Option<u32>, StoreError>;

    /// Every row whose descendant is `group_id` (includes the reflexive row).
    async fn ancestors_of(&mut self, group_id: &GroupId) -> Result<Vec<GroupClosure>, StoreError>;

    /// Every row whose ancestor is `group_id` (includes the reflexive row).
    async fn descendants_of(&mut self, group_id: &GroupId)
        -> Result<Vec<GroupClosure>, StoreError>;

    async fn is_ancestor(
        &mut self,
        candidate: &GroupId,
        group_id: &GroupId,
    ) -> Result<bool, StoreError> {
        Ok(self.depth(candidate, group_id).await?.is_some())
    }
}

// ───────────────────────────────────── Membership ─────────────────────────────────────

#[async_trait::async_trait]
pub trait GroupMembershipStore: Send {
    /// Add a direct member (Conflict if already a member).
    async fn add_member(&mut self, user_id: &UserId, group_id: &GroupId)
        -> Result<(), StoreError>;

    /// Add a direct member unless present. Returns false when skipped.
    async fn add_member_if_absent(
        &mut self,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<bool, StoreError>;

    async fn is_member(&mut self, user_id: &UserId, group_id: &GroupId)
        -> Result<bool, StoreError>;

    async fn list_members(&mut self, group_id: &GroupId) -> Result<Vec<GroupMember>, StoreError>;
}

// ───────────────────────────────────── Permissions ────────────────────────────────────

#[async_trait::async_trait]
pub trait PermissionGrantStore: Send {
    /// Record a grant (Conflict if the group already grants this permission).
    async fn grant_permission(&mut self, grant: &GroupPermission) -> Result<(), StoreError>;

    /// Grants recorded directly on the group.
    async fn list_permissions(
        &mut self,
        group_id: &GroupId,
    ) -> Result<Vec<GroupPermission>, StoreError>;

    /// Grants of `permission` on a group G that lies between one of the user's direct
    /// groups M and `group_id`: M ancestor-or-self of G, G ancestor-or-self of `group_id`.
    /// Ordered nearest to `group_id` first.
    async fn grants_reaching(
        &mut self,
        user_id: &UserId,
        group_id: &GroupId,
        permission: Permission,
    ) -> Result<Vec<ReachingGrant>, StoreError>;
}

// ───────────────────────────────────── Entities ───────────────────────────────────────

#[async_trait::async_trait]
pub trait EntityStore: Send {
    /// Register an entity under its primary group (Conflict on duplicate id).
    async fn insert_entity(&mut self, entity: &Entity) -> Result<(), StoreError>;

    async fn get_entity(&mut self, entity_id: &EntityId) -> Result<Entity, StoreError>;

    /// Attach an entity to a sharing group. Returns false when already attached.
    async fn link_entity(&mut self, link: &EntityGroupLink) -> Result<bool, StoreError>;

    async fn list_entity_links(
        &mut self,
        entity_id: &EntityId,
    ) -> Result<Vec<EntityGroupLink>, StoreError>;
}
