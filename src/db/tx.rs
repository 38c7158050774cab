/// Transaction manager
///
/// Runs a unit of work against a single connection inside a database
/// transaction with all-or-nothing semantics:
///
/// - the unit of work returns `Err` → explicit rollback, the original error
///   propagates (wrapped only if the rollback itself fails);
/// - the unit of work returns `Ok` → commit; a commit failure is reported
///   as [`Error::Commit`], distinct from unit-of-work failure;
/// - the unit of work panics → the [`Transaction`] guard is dropped during
///   unwind and sqlx aborts it, so the transaction is never left open.
///
/// # Example
///
/// ```no_run
/// use taskhub::db::tx::with_transaction;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), taskhub::Error> {
/// let affected = with_transaction(&pool, |tx| {
///     Box::pin(async move {
///         let result = sqlx::query("UPDATE tasks SET completed = TRUE WHERE completed = FALSE")
///             .execute(&mut **tx)
///             .await?;
///         Ok(result.rows_affected())
///     })
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, error};

use crate::error::Error;

/// Executes `work` inside a single database transaction
///
/// The unit of work receives a transaction-scoped handle; every query issued
/// through `&mut **tx` participates in the same transaction. The transaction
/// spans only the unit of work, nothing longer.
///
/// # Errors
///
/// Propagates the unit-of-work error unchanged after rolling back. Commit
/// failures surface as [`Error::Commit`]; a failed rollback surfaces as
/// [`Error::RollbackFailed`] carrying both errors.
pub async fn with_transaction<T, F>(pool: &PgPool, work: F) -> Result<T, Error>
where
    F: for<'t> FnOnce(&'t mut Transaction<'static, Postgres>) -> BoxFuture<'t, Result<T, Error>>,
{
    let mut tx = pool.begin().await.map_err(Error::from)?;
    debug!("transaction started");

    match work(&mut tx).await {
        Ok(value) => {
            tx.commit().await.map_err(Error::Commit)?;
            debug!("transaction committed");
            Ok(value)
        }
        Err(cause) => match tx.rollback().await {
            Ok(()) => {
                debug!(%cause, "transaction rolled back");
                Err(cause)
            }
            Err(rollback) => {
                error!(%cause, %rollback, "rollback failed");
                Err(Error::RollbackFailed {
                    cause: Box::new(cause),
                    rollback,
                })
            }
        },
    }
}
