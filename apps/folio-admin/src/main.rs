use std::sync::Arc;

use clap::Parser;
use folio_access::AccessControl;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;

use cli::{Cli, Command, EntityCommand, GroupCommand};
use commands::*;
use config::AdminConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AdminConfig::new(cli.database_url, cli.max_connections, cli.busy_timeout_ms)?;
    let access = AccessControl::new(Arc::new(config.open_store().await?));

    match cli.command {
        Command::Group { group_cmd } => match group_cmd {
            GroupCommand::Create {
                name,
                parent,
                members,
                grants,
            } => {
                cmd_group_create(&access, name, parent, members, grants).await?;
            }
            GroupCommand::Default { user, name } => {
                cmd_group_default(&access, &user, &name).await?;
            }
            GroupCommand::Link { parent, child } => {
                cmd_group_link(&access, &parent, &child).await?;
            }
            GroupCommand::AddMember { group, user } => {
                cmd_group_add_member(&access, &group, &user).await?;
            }
            GroupCommand::List { user } => {
                cmd_group_list(&access, &user).await?;
            }
            GroupCommand::Members { group } => {
                cmd_group_members(&access, &group).await?;
            }
            GroupCommand::Permissions { group } => {
                cmd_group_permissions(&access, &group).await?;
            }
        },
        Command::Entity { entity_cmd } => match entity_cmd {
            EntityCommand::Create { user, group, id } => {
                cmd_entity_create(&access, &user, group.as_ref(), id).await?;
            }
            EntityCommand::Share {
                entity,
                from,
                to,
                with,
            } => {
                cmd_entity_share(&access, &entity, &from, &to, &with).await?;
            }
            EntityCommand::Shares { entity } => {
                cmd_entity_shares(&access, &entity).await?;
            }
            EntityCommand::Check {
                user,
                entity,
                permission,
            } => {
                cmd_entity_check(&access, &user, &entity, &permission).await?;
            }
        },
    }

    Ok(())
}
