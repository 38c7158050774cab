/// Password hashing with Argon2id
///
/// Credentials are stored as Argon2id hashes in PHC string format and
/// verified in constant time. Plaintext passwords never touch the database.
///
/// # Example
///
/// ```
/// use taskhub::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse battery staple")?;
/// assert!(verify_password("correct horse battery staple", &hash)?);
/// assert!(!verify_password("wrong password", &hash)?);
/// # Ok(())
/// # }
/// ```
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Error type for password operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("stored password hash is not valid PHC format: {0}")]
    InvalidHash(String),
}

/// Hashes a plaintext password with Argon2id and a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordError::Hash(err.to_string()))
}

/// Verifies a plaintext password against a stored PHC hash
///
/// Returns `Ok(false)` for a wrong password; errors only when the stored
/// hash itself is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|err| PasswordError::InvalidHash(err.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PasswordError::InvalidHash(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("swordfish").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("swordfish", &hash).unwrap());
    }

    #[test]
    fn test_wrong_password_fails_verification() {
        let hash = hash_password("swordfish").unwrap();
        assert!(!verify_password("tunafish", &hash).unwrap());
    }

    #[test]
    fn test_same_password_hashes_differently() {
        // Fresh salt per hash.
        let a = hash_password("swordfish").unwrap();
        let b = hash_password("swordfish").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_password("swordfish", "not-a-phc-string").is_err());
    }
}
