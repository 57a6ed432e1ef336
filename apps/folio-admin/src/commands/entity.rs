use folio_access::AccessControl;
use folio_storage::{EntityId, GroupId, Store, UserId};

pub async fn cmd_entity_create<S: Store>(
    access: &AccessControl<S>,
    user: &UserId,
    group: Option<&GroupId>,
    id: Option<EntityId>,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = id.unwrap_or_default();
    let entity = access.create_entity(&id, user, group).await?;

    println!("Created entity: {}", entity.id);
    println!("  Owner: {}", entity.primary_group_id);

    Ok(())
}

pub async fn cmd_entity_share<S: Store>(
    access: &AccessControl<S>,
    entity: &EntityId,
    from: &GroupId,
    to: &GroupId,
    with: &[UserId],
) -> Result<(), Box<dyn std::error::Error>> {
    let shared = access.share_with_group(entity, from, to, with).await?;

    println!("Shared {} with {}", entity, to);
    println!("  Sharing group: {}", shared);

    Ok(())
}

pub async fn cmd_entity_shares<S: Store>(
    access: &AccessControl<S>,
    entity: &EntityId,
) -> Result<(), Box<dyn std::error::Error>> {
    let groups = access.sharing().shared_groups(entity).await?;

    if groups.is_empty() {
        println!("Not shared");
        return Ok(());
    }

    println!("Shared through:");
    for group in groups {
        println!("  {}", group);
    }

    Ok(())
}

pub async fn cmd_entity_check<S: Store>(
    access: &AccessControl<S>,
    user: &UserId,
    entity: &EntityId,
    permission: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let decision = access
        .decisions()
        .check_permission(user, entity, permission)
        .await?;

    if !decision.allowed {
        println!("denied");
        return Ok(());
    }

    println!("allowed");
    for group in &decision.justifying_groups {
        println!("  via {}", group);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{cmd_group_default, cmd_group_list};
    use folio_access::AccessError;
    use folio_store_sqlite::SqliteStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn share_flow_runs_end_to_end() {
        let access = AccessControl::new(Arc::new(SqliteStore::open_in_memory().await.unwrap()));
        let (u1, u2) = (UserId::new(), UserId::new());
        cmd_group_default(&access, &u1, "one").await.unwrap();
        cmd_group_default(&access, &u2, "two").await.unwrap();
        let g1 = access.register_user(&u1, "one").await.unwrap();
        let g2 = access.register_user(&u2, "two").await.unwrap();

        let e = EntityId::new();
        cmd_entity_create(&access, &u1, None, Some(e)).await.unwrap();
        cmd_entity_share(&access, &e, &g1.id, &g2.id, &[]).await.unwrap();
        cmd_entity_shares(&access, &e).await.unwrap();
        cmd_entity_check(&access, &u2, &e, "read").await.unwrap();
        cmd_group_list(&access, &u2).await.unwrap();

        assert!(access.require_read(&u2, &e).await.unwrap());
    }

    #[tokio::test]
    async fn errors_reach_the_caller() {
        let access = AccessControl::new(Arc::new(SqliteStore::open_in_memory().await.unwrap()));
        let err = cmd_entity_check(&access, &UserId::new(), &EntityId::new(), "read")
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<AccessError>(),
            Some(&AccessError::NotFound)
        );
    }
}
