/// Composition services
///
/// Services orchestrate repositories and the transaction manager; they own
/// the connection pool handle and expose the operations the request layer
/// calls with already-authenticated parameters.
///
/// # Modules
///
/// - `tasks`: atomic "create task with categories" workflow and the rest of
///   the task operations
/// - `auth`: account registration and login (token issuance paths)
pub mod auth;
pub mod tasks;
