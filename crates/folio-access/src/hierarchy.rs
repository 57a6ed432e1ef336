//! Group creation, nesting and membership.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use folio_storage::{
    Group, GroupClosure, GroupClosureStore, GroupId, GroupMember, GroupMembershipStore,
    GroupPermission, GroupStore, Permission, PermissionGrant, PermissionGrantStore, Store,
    Transaction, UserId,
};
use tracing::info;

use crate::closure;
use crate::txn::{finish, release};
use crate::AccessError;

/// Parameters for [`GroupHierarchyManager::create_group`].
#[derive(Clone, Debug, Default)]
pub struct CreateGroupParams {
    pub name: Option<String>,
    pub hidden: bool,
    pub parent_id: Option<GroupId>,
    pub members: Vec<UserId>,
    pub permissions: Vec<PermissionGrant>,
}

impl CreateGroupParams {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn under(mut self, parent_id: GroupId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn member(mut self, user_id: UserId) -> Self {
        self.members.push(user_id);
        self
    }

    pub fn grant(mut self, grant: PermissionGrant) -> Self {
        self.permissions.push(grant);
        self
    }
}

pub struct GroupHierarchyManager<S> {
    store: Arc<S>,
}

impl<S> Clone for GroupHierarchyManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> GroupHierarchyManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a group with its reflexive closure row, optional parent link, initial
    /// members and grants. Nothing is written unless every step succeeds.
    pub async fn create_group(&self, params: &CreateGroupParams) -> Result<Group, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = create_group_in(&mut txn, params).await;
        finish(txn, result).await
    }

    /// Create the user's default group: visible, no parent, the user as sole member and
    /// every permission granted with propagation. `Conflict` if the user already has one.
    pub async fn create_default_group(
        &self,
        user_id: &UserId,
        name: &str,
    ) -> Result<Group, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = create_default_group_in(&mut txn, user_id, name).await;
        finish(txn, result).await
    }

    /// Return the user's default group, creating it on first use.
    pub async fn ensure_default_group(
        &self,
        user_id: &UserId,
        name: &str,
    ) -> Result<Group, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result: Result<Group, AccessError> = async {
            match txn.get_default_group(user_id).await? {
                Some(group_id) => Ok(txn.get_group(&group_id).await?),
                None => create_default_group_in(&mut txn, user_id, name).await,
            }
        }
        .await;
        finish(txn, result).await
    }

    pub async fn default_group(&self, user_id: &UserId) -> Result<Option<Group>, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result: Result<Option<Group>, AccessError> = async {
            match txn.get_default_group(user_id).await? {
                Some(group_id) => Ok(Some(txn.get_group(&group_id).await?)),
                None => Ok(None),
            }
        }
        .await;
        release(txn).await;
        result
    }

    /// Nest `child` (with its whole subtree) under `parent`. Hidden groups cannot be
    /// linked on either side.
    pub async fn link(&self, parent: &GroupId, child: &GroupId) -> Result<(), AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = link_in(&mut txn, parent, child).await;
        finish(txn, result).await
    }

    /// Add a direct member. Hidden groups only gain members through sharing.
    pub async fn add_member(&self, group_id: &GroupId, user_id: &UserId) -> Result<(), AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result: Result<(), AccessError> = async {
            let group = txn.get_group(group_id).await?;
            if group.hidden {
                return Err(AccessError::Forbidden);
            }
            if txn.is_member(user_id, group_id).await? {
                return Err(AccessError::Conflict);
            }
            txn.add_member(user_id, group_id).await?;
            info!(group = %group_id, user = %user_id, "member added");
            Ok(())
        }
        .await;
        finish(txn, result).await
    }

    /// Groups the user belongs to directly, hidden sharing groups excluded.
    pub async fn visible_groups(&self, user_id: &UserId) -> Result<Vec<Group>, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = txn.list_member_groups(user_id, false).await;
        release(txn).await;
        Ok(result?)
    }

    pub async fn get_group(&self, group_id: &GroupId) -> Result<Group, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = txn.get_group(group_id).await;
        release(txn).await;
        Ok(result?)
    }

    pub async fn group_members(&self, group_id: &GroupId) -> Result<Vec<GroupMember>, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = async {
            txn.get_group(group_id).await?;
            txn.list_members(group_id).await
        }
        .await;
        release(txn).await;
        Ok(result?)
    }

    pub async fn group_permissions(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<GroupPermission>, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = async {
            txn.get_group(group_id).await?;
            txn.list_permissions(group_id).await
        }
        .await;
        release(txn).await;
        Ok(result?)
    }

    /// Path length retained for the pair, if `ancestor` is ancestor-or-self of `descendant`.
    pub async fn depth(
        &self,
        ancestor: &GroupId,
        descendant: &GroupId,
    ) -> Result<Option<u32>, AccessError> {
        let mut txn = self.store.begin_txn().await?;
        let result = txn.depth(ancestor, descendant).await;
        release(txn).await;
        Ok(result?)
    }
}

pub(crate) async fn create_group_in<T: Transaction>(
    txn: &mut T,
    params: &CreateGroupParams,
) -> Result<Group, AccessError> {
    if params.hidden && !params.members.is_empty() {
        return Err(AccessError::Forbidden);
    }
    if let Some(parent_id) = &params.parent_id {
        if txn.get_group(parent_id).await?.hidden {
            return Err(AccessError::Forbidden);
        }
    }

    let group = Group {
        id: GroupId::new(),
        name: params
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        hidden: params.hidden,
        // Stored at second precision.
        created_at: Utc::now().trunc_subsecs(0),
    };
    txn.insert_group(&group).await?;
    txn.insert_closure(&GroupClosure::reflexive(group.id))
        .await?;

    if let Some(parent_id) = &params.parent_id {
        closure::extend(txn, parent_id, &group.id).await?;
    }
    for user_id in &params.members {
        txn.add_member(user_id, &group.id).await?;
    }
    for grant in &params.permissions {
        txn.grant_permission(&GroupPermission {
            group_id: group.id,
            permission: grant.permission,
            propagate: grant.propagate,
        })
        .await?;
    }

    info!(
        group = %group.id,
        name = group.name.as_deref().unwrap_or(""),
        hidden = group.hidden,
        parent = ?params.parent_id,
        "group created"
    );
    Ok(group)
}

pub(crate) async fn create_default_group_in<T: Transaction>(
    txn: &mut T,
    user_id: &UserId,
    name: &str,
) -> Result<Group, AccessError> {
    if txn.get_default_group(user_id).await?.is_some() {
        return Err(AccessError::Conflict);
    }
    let params = CreateGroupParams {
        name: Some(name.to_string()),
        hidden: false,
        parent_id: None,
        members: vec![*user_id],
        permissions: Permission::ALL
            .into_iter()
            .map(PermissionGrant::propagating)
            .collect(),
    };
    let group = create_group_in(txn, &params).await?;
    txn.set_default_group(user_id, &group.id).await?;
    Ok(group)
}

pub(crate) async fn link_in<T: Transaction>(
    txn: &mut T,
    parent: &GroupId,
    child: &GroupId,
) -> Result<(), AccessError> {
    let parent_group = txn.get_group(parent).await?;
    let child_group = txn.get_group(child).await?;
    // Hidden groups only ever sit beneath the two groups they were shared between.
    if parent_group.hidden || child_group.hidden {
        return Err(AccessError::Forbidden);
    }
    // Covers parent == child through the reflexive row.
    if txn.is_ancestor(child, parent).await? {
        return Err(AccessError::Conflict);
    }
    let inserted = closure::extend(txn, parent, child).await?;
    info!(parent = %parent, child = %child, rows = inserted, "groups linked");
    Ok(())
}
