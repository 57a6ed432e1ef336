use folio_storage::Transaction;

use crate::AccessError;

/// Commit on success; on failure roll back and hand back the original error.
pub(crate) async fn finish<T: Transaction, R>(
    txn: T,
    result: Result<R, AccessError>,
) -> Result<R, AccessError> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, original = %err, "rollback failed");
            }
            Err(err)
        }
    }
}

/// End a read-only transaction. Nothing was written, so a failed rollback is only logged.
pub(crate) async fn release<T: Transaction>(txn: T) {
    if let Err(err) = txn.rollback().await {
        tracing::warn!(error = %err, "releasing read transaction failed");
    }
}
