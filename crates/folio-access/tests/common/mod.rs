#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use folio_access::AccessControl;
use folio_storage::{
    Entity, EntityGroupLink, EntityId, EntityStore, Group, GroupClosure, GroupClosureStore,
    GroupId, GroupMember, GroupMembershipStore, GroupPermission, GroupStore, Permission,
    PermissionGrantStore, ReachingGrant, Store, StoreError, Transaction, UserId,
};
use folio_store_sqlite::{SqliteStore, SqliteTxn};

pub async fn access() -> AccessControl<SqliteStore> {
    AccessControl::new(Arc::new(SqliteStore::open_in_memory().await.unwrap()))
}

/// Storage operations that [`FaultyStore`] can be told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    GrantPermission,
    LinkEntity,
    AddMemberIfAbsent,
    GrantsReaching,
    Commit,
}

/// SQLite store whose transactions fail one chosen operation with a backend error.
pub struct FaultyStore {
    inner: SqliteStore,
    fault: Mutex<Option<Fault>>,
}

impl FaultyStore {
    pub async fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().await.unwrap(),
            fault: Mutex::new(None),
        }
    }

    pub fn inject(&self, fault: Option<Fault>) {
        *self.fault.lock().unwrap() = fault;
    }
}

pub async fn faulty_access() -> (Arc<FaultyStore>, AccessControl<FaultyStore>) {
    let store = Arc::new(FaultyStore::new().await);
    (store.clone(), AccessControl::new(store))
}

pub struct FaultyTxn {
    inner: SqliteTxn,
    fault: Option<Fault>,
}

impl FaultyTxn {
    fn trip(&self, op: Fault) -> Result<(), StoreError> {
        if self.fault == Some(op) {
            Err(StoreError::Backend(format!("injected failure in {op:?}")))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl Store for FaultyStore {
    type Txn = FaultyTxn;

    async fn begin_txn(&self) -> Result<FaultyTxn, StoreError> {
        let fault = *self.fault.lock().unwrap();
        Ok(FaultyTxn {
            inner: self.inner.begin_txn().await?,
            fault,
        })
    }
}

#[async_trait::async_trait]
impl Transaction for FaultyTxn {
    async fn commit(self) -> Result<(), StoreError> {
        self.trip(Fault::Commit)?;
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.inner.rollback().await
    }
}

#[async_trait::async_trait]
impl GroupStore for FaultyTxn {
    async fn insert_group(&mut self, group: &Group) -> Result<(), StoreError> {
        self.inner.insert_group(group).await
    }

    async fn get_group(&mut self, group_id: &GroupId) -> Result<Group, StoreError> {
        self.inner.get_group(group_id).await
    }

    async fn list_member_groups(
        &mut self,
        user_id: &UserId,
        include_hidden: bool,
    ) -> Result<Vec<Group>, StoreError> {
        self.inner.list_member_groups(user_id, include_hidden).await
    }

    async fn find_sharing_group(
        &mut self,
        a: &GroupId,
        b: &GroupId,
    ) -> Result<Option<GroupId>, StoreError> {
        self.inner.find_sharing_group(a, b).await
    }

    async fn set_default_group(
        &mut self,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<(), StoreError> {
        self.inner.set_default_group(user_id, group_id).await
    }

    async fn get_default_group(
        &mut self,
        user_id: &UserId,
    ) -> Result<Option<GroupId>, StoreError> {
        self.inner.get_default_group(user_id).await
    }
}

#[async_trait::async_trait]
impl GroupClosureStore for FaultyTxn {
    async fn insert_closure(&mut self, row: &GroupClosure) -> Result<bool, StoreError> {
        self.inner.insert_closure(row).await
    }

    async fn depth(
        &mut self,
        ancestor: &GroupId,
        descendant: &GroupId,
    ) -> Result<Option<u32>, StoreError> {
        self.inner.depth(ancestor, descendant).await
    }

    async fn ancestors_of(&mut self, group_id: &GroupId) -> Result<Vec<GroupClosure>, StoreError> {
        self.inner.ancestors_of(group_id).await
    }

    async fn descendants_of(
        &mut self,
        group_id: &GroupId,
    ) -> Result<Vec<GroupClosure>, StoreError> {
        self.inner.descendants_of(group_id).await
    }
}

#[async_trait::async_trait]
impl GroupMembershipStore for FaultyTxn {
    async fn add_member(&mut self, user_id: &UserId, group_id: &GroupId) -> Result<(), StoreError> {
        self.inner.add_member(user_id, group_id).await
    }

    async fn add_member_if_absent(
        &mut self,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<bool, StoreError> {
        self.trip(Fault::AddMemberIfAbsent)?;
        self.inner.add_member_if_absent(user_id, group_id).await
    }

    async fn is_member(&mut self, user_id: &UserId, group_id: &GroupId) -> Result<bool, StoreError> {
        self.inner.is_member(user_id, group_id).await
    }

    async fn list_members(&mut self, group_id: &GroupId) -> Result<Vec<GroupMember>, StoreError> {
        self.inner.list_members(group_id).await
    }
}

#[async_trait::async_trait]
impl PermissionGrantStore for FaultyTxn {
    async fn grant_permission(&mut self, grant: &GroupPermission) -> Result<(), StoreError> {
        self.trip(Fault::GrantPermission)?;
        self.inner.grant_permission(grant).await
    }

    async fn list_permissions(
        &mut self,
        group_id: &GroupId,
    ) -> Result<Vec<GroupPermission>, StoreError> {
        self.inner.list_permissions(group_id).await
    }

    async fn grants_reaching(
        &mut self,
        user_id: &UserId,
        group_id: &GroupId,
        permission: Permission,
    ) -> Result<Vec<ReachingGrant>, StoreError> {
        self.trip(Fault::GrantsReaching)?;
        self.inner.grants_reaching(user_id, group_id, permission).await
    }
}

#[async_trait::async_trait]
impl EntityStore for FaultyTxn {
    async fn insert_entity(&mut self, entity: &Entity) -> Result<(), StoreError> {
        self.inner.insert_entity(entity).await
    }

    async fn get_entity(&mut self, entity_id: &EntityId) -> Result<Entity, StoreError> {
        self.inner.get_entity(entity_id).await
    }

    async fn link_entity(&mut self, link: &EntityGroupLink) -> Result<bool, StoreError> {
        self.trip(Fault::LinkEntity)?;
        self.inner.link_entity(link).await
    }

    async fn list_entity_links(
        &mut self,
        entity_id: &EntityId,
    ) -> Result<Vec<EntityGroupLink>, StoreError> {
        self.inner.list_entity_links(entity_id).await
    }
}
