//! Authorization decisions over the closure table.
//!
//! A user may perform `permission` against a target group `T` when some group `G` with
//! `G` ancestor-or-self of `T` grants it, and the user is a direct member of some `M` with
//! `M` ancestor-or-self of `G`. Permission flows down from `G`, membership is searched up
//! from `G`. A non-propagating grant only counts when `M`, `G` and `T` are the same group.
//!
//! An entity is checked against its primary group first, then against every group it
//! is shared into. Each check is a pair of indexed closure joins.

use std::collections::BTreeSet;
use std::sync::Arc;

use folio_storage::{
    EntityId, EntityStore, GroupId, GroupStore, Permission, PermissionGrantStore, ReachingGrant,
    Store, StoreError, Transaction, UserId,
};
use tracing::debug;

use crate::txn::release;
use crate::AccessError;

/// Outcome of a permission check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    /// Groups through which access was granted. Empty on deny.
    pub justifying_groups: BTreeSet<GroupId>,
}

impl Decision {
    pub fn deny() -> Self {
        Self::default()
    }

    pub fn from_groups(justifying_groups: BTreeSet<GroupId>) -> Self {
        Self {
            allowed: !justifying_groups.is_empty(),
            justifying_groups,
        }
    }
}

pub struct AccessDecisionEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for AccessDecisionEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> AccessDecisionEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check a permission given by name. Names that are not a known permission never
    /// match; a missing entity is `NotFound`.
    pub async fn check_permission(
        &self,
        user_id: &UserId,
        entity_id: &EntityId,
        permission: &str,
    ) -> Result<Decision, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = async {
            let entity = txn.get_entity(entity_id).await?;
            match permission.parse::<Permission>() {
                Ok(permission) => {
                    decide(&mut txn, user_id, entity_id, &entity.primary_group_id, permission)
                        .await
                }
                Err(err) => {
                    debug!(user = %user_id, entity = %entity_id, error = %err, "unknown permission");
                    Ok(Decision::deny())
                }
            }
        }
        .await;
        release(txn).await;
        Ok(result?)
    }

    pub async fn check(
        &self,
        user_id: &UserId,
        entity_id: &EntityId,
        permission: Permission,
    ) -> Result<Decision, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = check_in(&mut txn, user_id, entity_id, permission).await;
        release(txn).await;
        Ok(result?)
    }

    /// Same rule applied to a group directly; used before creating entities in it.
    pub async fn check_group_permission(
        &self,
        user_id: &UserId,
        group_id: &GroupId,
        permission: Permission,
    ) -> Result<bool, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = async {
            txn.get_group(group_id).await?;
            group_allows(&mut txn, user_id, group_id, permission).await
        }
        .await;
        release(txn).await;
        Ok(result?)
    }

    /// Keep the entities the user may access, in input order, with their justifying
    /// groups. Unknown ids are dropped.
    pub async fn filter_entities(
        &self,
        user_id: &UserId,
        entity_ids: &[EntityId],
        permission: Permission,
    ) -> Result<Vec<(EntityId, BTreeSet<GroupId>)>, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = async {
            let mut permitted = Vec::new();
            for entity_id in entity_ids {
                match check_in(&mut txn, user_id, entity_id, permission).await {
                    Ok(decision) if decision.allowed => {
                        permitted.push((*entity_id, decision.justifying_groups))
                    }
                    Ok(_) | Err(StoreError::NotFound) => {}
                    Err(err) => return Err(err),
                }
            }
            Ok(permitted)
        }
        .await;
        release(txn).await;
        Ok(result?)
    }
}

pub(crate) async fn check_in<T: Transaction>(
    txn: &mut T,
    user_id: &UserId,
    entity_id: &EntityId,
    permission: Permission,
) -> Result<Decision, StoreError> {
    let entity = txn.get_entity(entity_id).await?;
    decide(txn, user_id, entity_id, &entity.primary_group_id, permission).await
}

async fn decide<T: Transaction>(
    txn: &mut T,
    user_id: &UserId,
    entity_id: &EntityId,
    primary_group_id: &GroupId,
    permission: Permission,
) -> Result<Decision, StoreError> {
    if group_allows(txn, user_id, primary_group_id, permission).await? {
        debug!(
            user = %user_id,
            entity = %entity_id,
            %permission,
            via = %primary_group_id,
            "allowed by owning group"
        );
        return Ok(Decision::from_groups(BTreeSet::from([*primary_group_id])));
    }

    let mut justifying = BTreeSet::new();
    for link in txn.list_entity_links(entity_id).await? {
        if group_allows(txn, user_id, &link.group_id, permission).await? {
            justifying.insert(link.group_id);
        }
    }

    let decision = Decision::from_groups(justifying);
    debug!(
        user = %user_id,
        entity = %entity_id,
        %permission,
        allowed = decision.allowed,
        via = ?decision.justifying_groups,
        "checked shared groups"
    );
    Ok(decision)
}

pub(crate) async fn group_allows<T: Transaction>(
    txn: &mut T,
    user_id: &UserId,
    target: &GroupId,
    permission: Permission,
) -> Result<bool, StoreError> {
    let reaching = txn.grants_reaching(user_id, target, permission).await?;
    Ok(grants_cover(target, &reaching))
}

/// `reaching` holds grants for one permission on groups between one of the user's direct
/// groups and `target`.
fn grants_cover(target: &GroupId, reaching: &[ReachingGrant]) -> bool {
    reaching.iter().any(|r| {
        r.grant.propagate || (r.grant.group_id == *target && r.via == *target)
    })
}
