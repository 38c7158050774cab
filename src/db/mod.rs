/// Database layer
///
/// # Modules
///
/// - `pool`: bounded PostgreSQL connection pool with health checks and stats
/// - `tx`: transaction manager with all-or-nothing commit semantics
/// - `migrate`: embedded migration runner for local development and tests
///
/// Entity repositories live in the `models` module at crate root level.
pub mod migrate;
pub mod pool;
pub mod tx;
