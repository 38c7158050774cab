/// Entity repositories
///
/// Each model exposes a narrow CRUD + filtered-list contract as associated
/// functions taking a generic [`sqlx::PgExecutor`], so the same code runs
/// against the connection pool or a transaction-scoped handle. There is no
/// global storage state; the pool is owned by the services and passed by
/// reference.
///
/// # Models
///
/// - `user`: accounts with role and active flag
/// - `task`: tasks with priority, due date, and attached categories
/// - `category`: per-user labels, unique by (owner, name)
pub mod category;
pub mod task;
pub mod user;
