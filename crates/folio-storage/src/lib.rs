//! Storage abstraction for folio.
//!
//! Backend crates (e.g., folio-store-sqlite) implement these traits so the access engine
//! in `folio-access` doesn't depend on any specific database engine or schema details.
//! Every operation runs against an explicit [`Transaction`]; the engine decides where a
//! unit of work begins and ends.

use thiserror::Error;

mod store;
pub mod types;

pub use store::*;
pub use types::*;

/// Uniform error type for all storage backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error("backend error: {0}")]
    Backend(String),
}
