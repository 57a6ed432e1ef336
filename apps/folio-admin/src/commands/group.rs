use folio_access::{AccessControl, CreateGroupParams};
use folio_storage::{GroupId, PermissionGrant, Store, UserId};

pub async fn cmd_group_create<S: Store>(
    access: &AccessControl<S>,
    name: String,
    parent: Option<GroupId>,
    members: Vec<UserId>,
    grants: Vec<PermissionGrant>,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = CreateGroupParams {
        name: Some(name),
        hidden: false,
        parent_id: parent,
        members,
        permissions: grants,
    };
    let group = access.hierarchy().create_group(&params).await?;

    println!("Created group: {}", group.display_name());
    println!("  ID: {}", group.id);
    if let Some(parent) = parent {
        println!("  Parent: {}", parent);
    }

    Ok(())
}

pub async fn cmd_group_default<S: Store>(
    access: &AccessControl<S>,
    user: &UserId,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let group = access.register_user(user, name).await?;

    println!("Default group: {}", group.display_name());
    println!("  ID: {}", group.id);

    Ok(())
}

pub async fn cmd_group_link<S: Store>(
    access: &AccessControl<S>,
    parent: &GroupId,
    child: &GroupId,
) -> Result<(), Box<dyn std::error::Error>> {
    access.hierarchy().link(parent, child).await?;
    println!("Linked {} under {}", child, parent);
    Ok(())
}

pub async fn cmd_group_add_member<S: Store>(
    access: &AccessControl<S>,
    group: &GroupId,
    user: &UserId,
) -> Result<(), Box<dyn std::error::Error>> {
    access.hierarchy().add_member(group, user).await?;
    println!("Added {} to {}", user, group);
    Ok(())
}

pub async fn cmd_group_list<S: Store>(
    access: &AccessControl<S>,
    user: &UserId,
) -> Result<(), Box<dyn std::error::Error>> {
    let groups = access.hierarchy().visible_groups(user).await?;

    if groups.is_empty() {
        println!("No groups found");
        return Ok(());
    }

    println!("Groups:");
    for group in groups {
        println!("  {} ({})", group.display_name(), group.id);
    }

    Ok(())
}

pub async fn cmd_group_members<S: Store>(
    access: &AccessControl<S>,
    group: &GroupId,
) -> Result<(), Box<dyn std::error::Error>> {
    let members = access.hierarchy().group_members(group).await?;

    if members.is_empty() {
        println!("No members");
        return Ok(());
    }

    println!("Members:");
    for member in members {
        println!(
            "  {} (since {})",
            member.user_id,
            member.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

pub async fn cmd_group_permissions<S: Store>(
    access: &AccessControl<S>,
    group: &GroupId,
) -> Result<(), Box<dyn std::error::Error>> {
    let grants = access.hierarchy().group_permissions(group).await?;

    if grants.is_empty() {
        println!("No permissions granted");
        return Ok(());
    }

    println!("Permissions:");
    for grant in grants {
        let scope = if grant.propagate {
            "propagating"
        } else {
            "local"
        };
        println!("  {} ({})", grant.permission, scope);
    }

    Ok(())
}
