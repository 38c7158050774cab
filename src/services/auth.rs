/// Account service
///
/// Registration and login flows over the user repository, the password
/// hasher, and the token service. Successful calls return the user together
/// with a freshly issued session token.
use chrono::Duration;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenService;
use crate::config::TokenConfig;
use crate::error::Error;
use crate::models::user::{CreateUser, Role, User};

/// Input for account registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,

    /// Plaintext password; hashed before anything touches the database
    pub password: String,

    pub first_name: String,

    pub last_name: String,
}

/// A user plus their freshly issued session token
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub user: User,

    pub token: String,
}

/// Registration and login
#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    tokens: TokenService,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(pool: PgPool, config: &TokenConfig) -> Self {
        Self {
            pool,
            tokens: TokenService::new(&config.secret),
            token_ttl: Duration::hours(config.ttl_hours),
        }
    }

    /// Registers a new account and logs it in
    ///
    /// New accounts get the regular user role; promotion is a separate
    /// administrative update.
    ///
    /// # Errors
    ///
    /// [`Error::Duplicate`] when the email is already registered.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthenticatedUser, Error> {
        let password_hash = hash_password(&request.password)?;

        let user = User::create(
            &self.pool,
            CreateUser {
                email: request.email,
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
                role: Role::User,
            },
        )
        .await?;

        info!(user_id = %user.id, "user registered");

        let token = self.tokens.issue(user.id, user.role, self.token_ttl)?;
        Ok(AuthenticatedUser { user, token })
    }

    /// Authenticates by email and password, issuing a session token
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCredentials`] for an unknown email, a wrong password,
    /// or a disabled account; the caller cannot tell which.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, Error> {
        let user = User::find_by_email(&self.pool, email)
            .await?
            .ok_or(Error::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(Error::InvalidCredentials);
        }
        if !user.is_active {
            return Err(Error::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");

        let token = self.tokens.issue(user.id, user.role, self.token_ttl)?;
        Ok(AuthenticatedUser { user, token })
    }

    /// Validates a session token and loads its user
    ///
    /// The account must still exist and be active; a valid token for a
    /// since-disabled account is rejected.
    pub async fn authenticate(&self, token: &str) -> Result<User, Error> {
        let claims = self.tokens.validate(token)?;

        User::find_active(&self.pool, claims.sub)
            .await?
            .ok_or(Error::InvalidCredentials)
    }
}
