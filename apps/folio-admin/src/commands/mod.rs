pub mod entity;
pub mod group;

pub use entity::{cmd_entity_check, cmd_entity_create, cmd_entity_share, cmd_entity_shares};
pub use group::{
    cmd_group_add_member, cmd_group_create, cmd_group_default, cmd_group_link, cmd_group_list,
    cmd_group_members, cmd_group_permissions,
};
