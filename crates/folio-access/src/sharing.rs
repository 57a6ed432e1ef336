//! Cross-group sharing through hidden groups.

use std::sync::Arc;

use folio_storage::{
    EntityGroupLink, EntityId, EntityStore, GroupClosureStore, GroupId, GroupMembershipStore,
    GroupStore, Permission, PermissionGrant, Store, Transaction, UserId,
};
use tracing::{debug, info};

use crate::closure;
use crate::hierarchy::{create_group_in, CreateGroupParams};
use crate::txn::{finish, release};
use crate::AccessError;

pub struct EntitySharingManager<S> {
    store: Arc<S>,
}

impl<S> Clone for EntitySharingManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> EntitySharingManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Share an entity owned by `group_a` with `group_b`.
    ///
    /// The entity is attached to a hidden group sitting beneath both, reused when one
    /// already exists for the pair. Members of either side get what their own side grants
    /// on that group. `extra_users` become direct members of the hidden group and may read
    /// its entities. Returns the hidden group's id.
    pub async fn share_entity(
        &self,
        entity_id: &EntityId,
        group_a: &GroupId,
        group_b: &GroupId,
        extra_users: &[UserId],
    ) -> Result<GroupId, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = share_entity_in(&mut txn, entity_id, group_a, group_b, extra_users).await;
        finish(txn, result).await
    }

    /// Groups the entity is attached to besides its primary group.
    pub async fn shared_groups(&self, entity_id: &EntityId) -> Result<Vec<GroupId>, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = async {
            txn.get_entity(entity_id).await?;
            txn.list_entity_links(entity_id).await
        }
        .await;
        release(txn).await;
        Ok(result?.into_iter().map(|link| link.group_id).collect())
    }
}

pub(crate) async fn share_entity_in<T: Transaction>(
    txn: &mut T,
    entity_id: &EntityId,
    group_a: &GroupId,
    group_b: &GroupId,
    extra_users: &[UserId],
) -> Result<GroupId, AccessError> {
    let entity = txn.get_entity(entity_id).await?;
    txn.get_group(group_a).await?;
    txn.get_group(group_b).await?;

    // The sharing side must own the entity, directly or as an ancestor of its owner.
    if !txn.is_ancestor(group_a, &entity.primary_group_id).await? {
        return Err(AccessError::Forbidden);
    }

    let shared = match txn.find_sharing_group(group_a, group_b).await? {
        Some(group_id) => {
            debug!(group = %group_id, "reusing sharing group");
            group_id
        }
        None => {
            // Read for direct members only, i.e. the extra users.
            let params = CreateGroupParams {
                hidden: true,
                permissions: vec![PermissionGrant::local(Permission::Read)],
                ..Default::default()
            };
            let group = create_group_in(txn, &params).await?;
            closure::extend(txn, group_a, &group.id).await?;
            closure::extend(txn, group_b, &group.id).await?;
            group.id
        }
    };

    let attached = txn
        .link_entity(&EntityGroupLink {
            entity_id: *entity_id,
            group_id: shared,
        })
        .await?;

    let mut added = 0;
    for user_id in extra_users {
        if txn.add_member_if_absent(user_id, &shared).await? {
            added += 1;
        }
    }

    info!(
        entity = %entity_id,
        from = %group_a,
        to = %group_b,
        group = %shared,
        attached,
        members_added = added,
        "entity shared"
    );
    Ok(shared)
}
