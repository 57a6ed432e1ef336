use folio_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by the access engine.
///
/// A denied permission check is not an error; only `authorize`-style calls turn a deny
/// into [`AccessError::Forbidden`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error("forbidden")]
    Forbidden,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AccessError {
    /// HTTP-equivalent status for the boundary layer.
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::NotFound => 404,
            AccessError::Conflict => 409,
            AccessError::Forbidden => 403,
            AccessError::Internal(_) => 500,
        }
    }
}

impl From<StoreError> for AccessError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AccessError::NotFound,
            StoreError::Conflict => AccessError::Conflict,
            StoreError::Backend(msg) => AccessError::Internal(msg),
        }
    }
}
