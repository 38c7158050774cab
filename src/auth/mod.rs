/// Authentication primitives
///
/// # Modules
///
/// - [`token`]: stateless session tokens (HS256, expiring, self-contained)
/// - [`password`]: Argon2id credential hashing and verification
///
/// Neither module holds shared mutable state; the token service carries
/// only its signing keys.
pub mod password;
pub mod token;
