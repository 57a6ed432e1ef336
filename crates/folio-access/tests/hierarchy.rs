mod common;

use folio_access::{AccessError, CreateGroupParams};
use folio_storage::{GroupId, Permission, PermissionGrant, UserId};

#[tokio::test]
async fn every_group_is_its_own_ancestor() {
    let ac = common::access().await;
    let g = ac
        .hierarchy()
        .create_group(&CreateGroupParams::named("solo"))
        .await
        .unwrap();
    assert_eq!(ac.hierarchy().depth(&g.id, &g.id).await.unwrap(), Some(0));
}

#[tokio::test]
async fn nested_groups_record_transitive_depth() {
    let ac = common::access().await;
    let h = ac.hierarchy();
    let a = h.create_group(&CreateGroupParams::named("a")).await.unwrap();
    let b = h
        .create_group(&CreateGroupParams::named("b").under(a.id))
        .await
        .unwrap();
    let c = h
        .create_group(&CreateGroupParams::named("c").under(b.id))
        .await
        .unwrap();

    assert_eq!(h.depth(&a.id, &b.id).await.unwrap(), Some(1));
    assert_eq!(h.depth(&a.id, &c.id).await.unwrap(), Some(2));
    assert_eq!(h.depth(&c.id, &a.id).await.unwrap(), None);
}

#[tokio::test]
async fn missing_parent_is_not_found() {
    let ac = common::access().await;
    let err = ac
        .hierarchy()
        .create_group(&CreateGroupParams::named("orphan").under(GroupId::new()))
        .await
        .unwrap_err();
    assert_eq!(err, AccessError::NotFound);
}

#[tokio::test]
async fn failed_creation_leaves_nothing_behind() {
    let ac = common::access().await;
    let user = UserId::new();
    let params = CreateGroupParams::named("twice")
        .member(user)
        .member(user)
        .grant(PermissionGrant::propagating(Permission::Read));

    assert_eq!(
        ac.hierarchy().create_group(&params).await.unwrap_err(),
        AccessError::Conflict
    );
    assert!(ac.hierarchy().visible_groups(&user).await.unwrap().is_empty());
}

#[tokio::test]
async fn default_group_is_unique_per_user() {
    let ac = common::access().await;
    let h = ac.hierarchy();
    let user = UserId::new();

    let first = h.create_default_group(&user, "Alice").await.unwrap();
    assert_eq!(
        h.create_default_group(&user, "Alice again").await.unwrap_err(),
        AccessError::Conflict
    );
    assert_eq!(h.ensure_default_group(&user, "ignored").await.unwrap(), first);
    assert_eq!(ac.register_user(&user, "ignored").await.unwrap(), first);
    assert_eq!(h.visible_groups(&user).await.unwrap(), vec![first]);
}

#[tokio::test]
async fn ensure_default_group_creates_on_first_use() {
    let ac = common::access().await;
    let user = UserId::new();
    assert_eq!(ac.hierarchy().default_group(&user).await.unwrap(), None);

    let g = ac.register_user(&user, "Bob").await.unwrap();
    assert_eq!(g.name.as_deref(), Some("Bob"));
    assert!(!g.hidden);
    assert_eq!(ac.hierarchy().default_group(&user).await.unwrap(), Some(g));
}

#[tokio::test]
async fn link_grafts_subtree_and_rejects_cycles() {
    let ac = common::access().await;
    let h = ac.hierarchy();
    let a = h.create_group(&CreateGroupParams::named("a")).await.unwrap();
    let b = h.create_group(&CreateGroupParams::named("b")).await.unwrap();
    let c = h
        .create_group(&CreateGroupParams::named("c").under(b.id))
        .await
        .unwrap();

    h.link(&a.id, &b.id).await.unwrap();
    assert_eq!(h.depth(&a.id, &c.id).await.unwrap(), Some(2));

    // Linking again changes nothing.
    h.link(&a.id, &b.id).await.unwrap();
    assert_eq!(h.depth(&a.id, &b.id).await.unwrap(), Some(1));

    assert_eq!(h.link(&c.id, &a.id).await.unwrap_err(), AccessError::Conflict);
    assert_eq!(
        h.link(&a.id, &GroupId::new()).await.unwrap_err(),
        AccessError::NotFound
    );
}

#[tokio::test]
async fn membership_is_direct_only() {
    let ac = common::access().await;
    let h = ac.hierarchy();
    let user = UserId::new();
    let a = h
        .create_group(&CreateGroupParams::named("a").member(user))
        .await
        .unwrap();
    let b = h
        .create_group(&CreateGroupParams::named("b").under(a.id))
        .await
        .unwrap();

    assert!(h.group_members(&b.id).await.unwrap().is_empty());
    assert_eq!(h.visible_groups(&user).await.unwrap(), vec![a]);
}

#[tokio::test]
async fn add_member_rules() {
    let ac = common::access().await;
    let h = ac.hierarchy();
    let user = UserId::new();
    let open = h.create_group(&CreateGroupParams::named("open")).await.unwrap();
    let hidden = h
        .create_group(&CreateGroupParams {
            hidden: true,
            ..Default::default()
        })
        .await
        .unwrap();

    h.add_member(&open.id, &user).await.unwrap();
    assert_eq!(
        h.add_member(&open.id, &user).await.unwrap_err(),
        AccessError::Conflict
    );
    assert_eq!(
        h.add_member(&hidden.id, &user).await.unwrap_err(),
        AccessError::Forbidden
    );
    assert_eq!(
        h.add_member(&GroupId::new(), &user).await.unwrap_err(),
        AccessError::NotFound
    );
}

#[tokio::test]
async fn visible_groups_are_ordered_by_name() {
    let ac = common::access().await;
    let h = ac.hierarchy();
    let user = UserId::new();
    for name in ["zeta", "alpha", "mu"] {
        h.create_group(&CreateGroupParams::named(name).member(user))
            .await
            .unwrap();
    }
    let names: Vec<_> = h
        .visible_groups(&user)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.display_name())
        .collect();
    assert_eq!(names, ["alpha", "mu", "zeta"]);
}

#[tokio::test]
async fn group_queries_on_missing_group_are_not_found() {
    let ac = common::access().await;
    let missing = GroupId::new();
    assert_eq!(
        ac.hierarchy().group_members(&missing).await.unwrap_err(),
        AccessError::NotFound
    );
    assert_eq!(
        ac.hierarchy().group_permissions(&missing).await.unwrap_err(),
        AccessError::NotFound
    );
}
