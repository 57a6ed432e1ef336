use clap::{Parser, Subcommand};
use folio_storage::{EntityId, GroupId, Permission, PermissionGrant, UserId};

#[derive(Parser)]
#[command(name = "folio-admin")]
#[command(about = "Manage folio groups, sharing and permissions")]
pub struct Cli {
    /// Database URL (defaults to ~/.folio/folio.db)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, env = "FOLIO_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Milliseconds to wait on a locked database
    #[arg(long, env = "FOLIO_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    pub busy_timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Group commands
    Group {
        #[command(subcommand)]
        group_cmd: GroupCommand,
    },
    /// Entity commands
    Entity {
        #[command(subcommand)]
        entity_cmd: EntityCommand,
    },
}

#[derive(Subcommand)]
pub enum GroupCommand {
    /// Create a group
    Create {
        /// Group name
        name: String,
        /// Parent group ID
        #[arg(long)]
        parent: Option<GroupId>,
        /// Initial member (repeatable)
        #[arg(long = "member")]
        members: Vec<UserId>,
        /// Grant as `read` (propagating) or `read:local` (repeatable)
        #[arg(long = "grant", value_parser = parse_grant)]
        grants: Vec<PermissionGrant>,
    },
    /// Show a user's default group, creating it if needed
    Default {
        /// User ID
        user: UserId,
        /// Name used when the group is created
        #[arg(long, default_value = "Personal")]
        name: String,
    },
    /// Nest a group under another
    Link {
        /// Parent group ID
        parent: GroupId,
        /// Child group ID
        child: GroupId,
    },
    /// Add a direct member
    AddMember {
        /// Group ID
        group: GroupId,
        /// User ID
        user: UserId,
    },
    /// List a user's visible groups
    List {
        /// User ID
        user: UserId,
    },
    /// List group members
    Members {
        /// Group ID
        group: GroupId,
    },
    /// List permissions granted to a group
    Permissions {
        /// Group ID
        group: GroupId,
    },
}

#[derive(Subcommand)]
pub enum EntityCommand {
    /// Register an entity on behalf of a user
    Create {
        /// Acting user ID
        user: UserId,
        /// Owning group ID (defaults to the user's default group)
        #[arg(long)]
        group: Option<GroupId>,
        /// Entity ID (generated when omitted)
        #[arg(long)]
        id: Option<EntityId>,
    },
    /// Share an entity from its owning group with another group
    Share {
        /// Entity ID
        entity: EntityId,
        /// Owning group ID
        from: GroupId,
        /// Target group ID
        to: GroupId,
        /// Extra user given access through the sharing group (repeatable)
        #[arg(long = "with")]
        with: Vec<UserId>,
    },
    /// Show the groups an entity is shared into
    Shares {
        /// Entity ID
        entity: EntityId,
    },
    /// Check whether a user may perform an operation on an entity
    Check {
        /// User ID
        user: UserId,
        /// Entity ID
        entity: EntityId,
        /// create, read, update or delete
        permission: String,
    },
}

/// `read` grants with propagation, `read:local` without.
pub fn parse_grant(s: &str) -> Result<PermissionGrant, String> {
    let (name, propagate) = match s.split_once(':') {
        Some((name, "local")) => (name, false),
        Some((name, "propagate")) => (name, true),
        Some((_, scope)) => return Err(format!("unknown grant scope: {scope}")),
        None => (s, true),
    };
    let permission = name.parse::<Permission>().map_err(|e| e.to_string())?;
    Ok(PermissionGrant {
        permission,
        propagate,
    })
}
