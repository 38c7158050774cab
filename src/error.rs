/// Error taxonomy for the taskhub core
///
/// Every fallible operation in this crate returns [`Error`]. Storage-driver
/// errors are translated at the repository boundary so callers never observe
/// raw `sqlx` types beyond the preserved sources attached here.
///
/// # Example
///
/// ```no_run
/// use taskhub::error::Error;
/// use taskhub::models::user::User;
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, id: Uuid) {
/// match User::find_by_id(&pool, id).await {
///     Ok(user) => println!("found {}", user.email),
///     Err(Error::NotFound { entity }) => println!("no such {entity}"),
///     Err(other) => eprintln!("lookup failed: {other}"),
/// }
/// # }
/// ```
use uuid::Uuid;

use crate::auth::password::PasswordError;
use crate::auth::token::TokenError;

/// Unified error type for repositories and services
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity does not exist
    #[error("{entity} not found")]
    NotFound {
        /// Which entity was looked up (e.g. "task", "user")
        entity: &'static str,
    },

    /// A uniqueness constraint was violated
    #[error("duplicate {entity}: violates {constraint}")]
    Duplicate {
        /// Which entity was being written
        entity: &'static str,
        /// Name of the violated constraint, for a meaningful caller message
        constraint: String,
    },

    /// The referenced owning user is missing or inactive
    #[error("owner user {0} not found or inactive")]
    OwnerNotFound(Uuid),

    /// Could not reach the database
    #[error("database connection failed")]
    Connection(#[source] sqlx::Error),

    /// Pool acquisition or a bounded operation exceeded its deadline
    ///
    /// Safe for the caller to retry.
    #[error("database operation timed out")]
    Timeout,

    /// The transaction's unit of work succeeded but the commit failed
    #[error("transaction commit failed")]
    Commit(#[source] sqlx::Error),

    /// Rollback itself failed; both the original cause and the rollback
    /// error are reported
    #[error("rollback failed after error: {cause}")]
    RollbackFailed {
        /// The unit-of-work error that triggered the rollback
        cause: Box<Error>,
        /// The error returned by the rollback attempt
        #[source]
        rollback: sqlx::Error,
    },

    /// Invalid settings detected at construction time (fatal at startup)
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Token issuance or validation failed
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Password hashing or verification failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Unknown email, wrong password, or disabled account
    ///
    /// Deliberately carries no detail about which check failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Any other database error
    #[error("database error")]
    Database(#[source] sqlx::Error),
}

/// PostgreSQL SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

impl Error {
    /// Shorthand used by repositories when a row is absent
    pub(crate) fn not_found(entity: &'static str) -> Self {
        Error::NotFound { entity }
    }

    /// Maps an insert/update error, tagging unique violations with the entity
    ///
    /// Everything that is not a unique violation goes through the generic
    /// [`From<sqlx::Error>`] mapping.
    pub(crate) fn map_constraint(entity: &'static str, err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Error::Duplicate {
                    entity,
                    constraint: db_err.constraint().unwrap_or("unique constraint").to_string(),
                }
            }
            _ => Error::from(err),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound { entity: "resource" },
            sqlx::Error::PoolTimedOut => Error::Timeout,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                Error::Connection(err)
            }
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                let constraint = db_err.constraint().unwrap_or("unique constraint").to_string();
                Error::Duplicate { entity: "resource", constraint }
            }
            _ => Error::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = Error::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_pool_timeout_maps_to_timeout() {
        let err = Error::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, Error::Timeout));
    }

    #[test]
    fn test_pool_closed_maps_to_connection() {
        let err = Error::from(sqlx::Error::PoolClosed);
        assert!(matches!(err, Error::Connection(_)));
    }

    #[test]
    fn test_not_found_display_names_entity() {
        let err = Error::not_found("task");
        assert_eq!(err.to_string(), "task not found");
    }

    #[test]
    fn test_duplicate_display_names_constraint() {
        let err = Error::Duplicate {
            entity: "category",
            constraint: "categories_user_id_name_key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate category: violates categories_user_id_name_key"
        );
    }

    #[test]
    fn test_rollback_failed_preserves_cause() {
        let err = Error::RollbackFailed {
            cause: Box::new(Error::not_found("task")),
            rollback: sqlx::Error::PoolClosed,
        };
        assert!(err.to_string().contains("task not found"));
    }
}
