//! Entry points for content handlers.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use folio_storage::{
    Entity, EntityId, EntityStore, Group, GroupId, GroupStore, Permission, Store, UserId,
};
use tracing::info;

use crate::decision::group_allows;
use crate::txn::finish;
use crate::{AccessDecisionEngine, AccessError, Decision, EntitySharingManager, GroupHierarchyManager};

/// Bundles the three managers over one store handle.
pub struct AccessControl<S> {
    hierarchy: GroupHierarchyManager<S>,
    sharing: EntitySharingManager<S>,
    decisions: AccessDecisionEngine<S>,
    store: Arc<S>,
}

impl<S> Clone for AccessControl<S> {
    fn clone(&self) -> Self {
        Self {
            hierarchy: self.hierarchy.clone(),
            sharing: self.sharing.clone(),
            decisions: self.decisions.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> AccessControl<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            hierarchy: GroupHierarchyManager::new(Arc::clone(&store)),
            sharing: EntitySharingManager::new(Arc::clone(&store)),
            decisions: AccessDecisionEngine::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn hierarchy(&self) -> &GroupHierarchyManager<S> {
        &self.hierarchy
    }

    pub fn sharing(&self) -> &EntitySharingManager<S> {
        &self.sharing
    }

    pub fn decisions(&self) -> &AccessDecisionEngine<S> {
        &self.decisions
    }

    /// Signup hook: make sure the user owns a default group.
    pub async fn register_user(&self, user_id: &UserId, name: &str) -> Result<Group, AccessError> {
        self.hierarchy.ensure_default_group(user_id, name).await
    }

    /// Store a new entity owned by `group_id`. The user needs `create` on that group.
    pub async fn create_entity_with_owner(
        &self,
        entity_id: &EntityId,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<Entity, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result: Result<Entity, AccessError> = async {
            txn.get_group(group_id).await?;
            if !group_allows(&mut txn, user_id, group_id, Permission::Create).await? {
                return Err(AccessError::Forbidden);
            }
            let entity = Entity {
                id: *entity_id,
                primary_group_id: *group_id,
                created_at: Utc::now().trunc_subsecs(0),
            };
            txn.insert_entity(&entity).await?;
            info!(entity = %entity_id, group = %group_id, user = %user_id, "entity created");
            Ok(entity)
        }
        .await;
        finish(txn, result).await
    }

    /// Like [`create_entity_with_owner`](Self::create_entity_with_owner), falling back to
    /// the user's default group.
    pub async fn create_entity(
        &self,
        entity_id: &EntityId,
        user_id: &UserId,
        group_id: Option<&GroupId>,
    ) -> Result<Entity, AccessError> {
        let group_id = match group_id {
            Some(group_id) => *group_id,
            None => {
                self.hierarchy
                    .default_group(user_id)
                    .await?
                    .ok_or(AccessError::NotFound)?
                    .id
            }
        };
        self.create_entity_with_owner(entity_id, user_id, &group_id)
            .await
    }

    pub async fn require_read(
        &self,
        user_id: &UserId,
        entity_id: &EntityId,
    ) -> Result<bool, AccessError> {
        Ok(self
            .decisions
            .check(user_id, entity_id, Permission::Read)
            .await?
            .allowed)
    }

    pub async fn require_update(
        &self,
        user_id: &UserId,
        entity_id: &EntityId,
    ) -> Result<bool, AccessError> {
        Ok(self
            .decisions
            .check(user_id, entity_id, Permission::Update)
            .await?
            .allowed)
    }

    pub async fn require_delete(
        &self,
        user_id: &UserId,
        entity_id: &EntityId,
    ) -> Result<bool, AccessError> {
        Ok(self
            .decisions
            .check(user_id, entity_id, Permission::Delete)
            .await?
            .allowed)
    }

    /// Check and turn a deny into [`AccessError::Forbidden`].
    pub async fn authorize(
        &self,
        user_id: &UserId,
        entity_id: &EntityId,
        permission: Permission,
    ) -> Result<Decision, AccessError> {
        let decision = self.decisions.check(user_id, entity_id, permission).await?;
        if decision.allowed {
            Ok(decision)
        } else {
            Err(AccessError::Forbidden)
        }
    }

    /// Share `entity_id` from its owning group with `target_group`; returns the hidden
    /// group the entity was attached to.
    pub async fn share_with_group(
        &self,
        entity_id: &EntityId,
        owner_group: &GroupId,
        target_group: &GroupId,
        extra_users: &[UserId],
    ) -> Result<GroupId, AccessError> {
        self.sharing
            .share_entity(entity_id, owner_group, target_group, extra_users)
            .await
    }
}
