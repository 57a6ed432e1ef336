//! Type definitions for folio storage.

mod closure;
mod entities;
mod groups;
mod ids;
mod permissions;

pub use closure::*;
pub use entities::*;
pub use groups::*;
pub use ids::*;
pub use permissions::*;
