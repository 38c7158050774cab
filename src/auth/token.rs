/// Stateless session tokens
///
/// Issues and validates signed, expiring tokens carrying subject identity
/// and role. Tokens are self-contained (no server-side session store):
/// HS256-signed JWTs whose claims are only trusted after the signature
/// verifies under the configured secret.
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use taskhub::auth::token::TokenService;
/// use taskhub::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = TokenService::new("a-signing-secret-of-at-least-32-bytes");
///
/// let user_id = Uuid::new_v4();
/// let token = service.issue(user_id, Role::User, Duration::hours(24))?;
///
/// let claims = service.validate(&token)?;
/// assert_eq!(claims.sub, user_id);
/// assert_eq!(claims.role, Role::User);
/// # Ok(())
/// # }
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

/// Issuer claim stamped into every token
const ISSUER: &str = "taskhub";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Signature is valid but the expiration instant has passed
    #[error("token has expired")]
    Expired,

    /// Signature does not verify under the configured secret
    #[error("token signature is invalid")]
    InvalidSignature,

    /// Token is not structurally a valid token for this service
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Failed to sign a new token
    #[error("failed to issue token: {0}")]
    Issue(String),
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID
    pub sub: Uuid,

    /// Subject's role at issuance time
    pub role: Role,

    /// Issuer, always "taskhub"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration instant (Unix timestamp)
    pub exp: i64,
}

/// Token issuance and validation
///
/// Holds only the signing keys derived from the secret; safe to share
/// across request handlers.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issues a signed token for `user_id` expiring after `ttl`
    pub fn issue(&self, user_id: Uuid, role: Role, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::Issue(err.to_string()))
    }

    /// Validates a token and extracts its claims
    ///
    /// The signature is verified before any claim is inspected. Expiration
    /// is checked with zero leeway: a token is rejected the instant its
    /// `exp` passes, even when the signature is valid.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InvalidSignature`] when the signature does not verify
    /// - [`TokenError::Expired`] when the expiration instant has passed
    /// - [`TokenError::Malformed`] for anything that does not parse as one
    ///   of this service's tokens (bad structure, wrong issuer, bad claims)
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(err.to_string()),
            }
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-signing-secret-at-least-32-bytes!!";

    fn service() -> TokenService {
        TokenService::new(SECRET)
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let user_id = Uuid::new_v4();
        let token = service()
            .issue(user_id, Role::Admin, Duration::hours(1))
            .unwrap();

        let claims = service().validate(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "taskhub");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_short_ttl_token_is_valid_immediately() {
        let token = service()
            .issue(Uuid::new_v4(), Role::User, Duration::seconds(1))
            .unwrap();
        assert!(service().validate(&token).is_ok());
    }

    #[test]
    fn test_token_expires_after_its_ttl() {
        let token = service()
            .issue(Uuid::new_v4(), Role::User, Duration::seconds(1))
            .unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2100));

        let err = service().validate(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn test_already_expired_token_rejected() {
        let token = service()
            .issue(Uuid::new_v4(), Role::User, Duration::seconds(-60))
            .unwrap();

        let err = service().validate(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn test_tampered_signature_rejected_regardless_of_claims() {
        let token = service()
            .issue(Uuid::new_v4(), Role::Admin, Duration::hours(1))
            .unwrap();

        // Replace the first signature character with a different valid
        // base64url character, keeping the token structurally intact.
        let sig_start = token.rfind('.').unwrap() + 1;
        let mut tampered = token.clone();
        let original = tampered.as_bytes()[sig_start];
        tampered.replace_range(
            sig_start..sig_start + 1,
            if original == b'A' { "B" } else { "A" },
        );

        let err = service().validate(&tampered).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service()
            .issue(Uuid::new_v4(), Role::User, Duration::hours(1))
            .unwrap();

        let other = TokenService::new("a-completely-different-secret-32-bytes");
        let err = other.validate(&token).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let err = service().validate("not-a-token").unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        // Same secret, different issuer claim.
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: Role::User,
            iss: "someone-else".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let err = service().validate(&token).unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
    }
}
