//! Group-based access control for folio.
//!
//! Groups nest into a hierarchy kept as a closure table, so every "is A above B"
//! question is a single lookup. Permissions are granted to groups and may propagate to
//! descendants; membership never does. Entities belong to one primary group and can be
//! shared into hidden groups that sit beneath two otherwise unrelated groups.
//!
//! [`AccessControl`] is the usual entry point; the individual managers are exposed for
//! callers that only need one concern.

pub mod closure;
mod control;
mod decision;
mod error;
mod hierarchy;
mod sharing;
mod txn;

pub use control::AccessControl;
pub use decision::{AccessDecisionEngine, Decision};
pub use error::AccessError;
pub use hierarchy::{CreateGroupParams, GroupHierarchyManager};
pub use sharing::EntitySharingManager;
