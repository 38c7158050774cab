/// User model and repository operations
///
/// Users own tasks and categories exclusively; deleting a user cascades to
/// everything they own at the storage level.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     role VARCHAR(20) NOT NULL DEFAULT 'user',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhub::models::user::{CreateUser, Role, User};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), taskhub::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     first_name: "Ada".to_string(),
///     last_name: "Lovelace".to_string(),
///     role: Role::User,
/// }).await?;
/// println!("created user {}", user.id);
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,

    /// Regular account
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id credential hash, never serialized outward
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub first_name: String,

    pub last_name: String,

    /// Account role
    pub role: Role,

    /// Disabled accounts cannot log in or own new tasks
    pub is_active: bool,

    /// Whether the email address has been verified
    pub email_verified: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,

    /// Argon2id hash, produced by [`crate::auth::password::hash_password`]
    pub password_hash: String,

    pub first_name: String,

    pub last_name: String,

    pub role: Role,
}

/// Input for partially updating a user
///
/// Each present field overwrites the corresponding column; absent fields
/// are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,

    pub password_hash: Option<String>,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    pub role: Option<Role>,

    pub is_active: Option<bool>,

    pub email_verified: Option<bool>,
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, \
     is_active, email_verified, created_at, updated_at";

impl User {
    /// Creates a new user
    ///
    /// New accounts start active and unverified (schema defaults).
    ///
    /// # Errors
    ///
    /// [`Error::Duplicate`] when the email is already taken.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateUser,
    ) -> Result<Self, Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, first_name, last_name, role,
                      is_active, email_verified, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.role)
        .fetch_one(executor)
        .await
        .map_err(|err| Error::map_constraint("user", err))
    }

    /// Finds a user by ID
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when no user has this ID.
    pub async fn find_by_id(executor: impl PgExecutor<'_>, id: Uuid) -> Result<Self, Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| Error::not_found("user"))
    }

    /// Finds a user by email address
    ///
    /// Returns `None` rather than an error so login flows can fold unknown
    /// emails into a generic credentials failure.
    pub async fn find_by_email(
        executor: impl PgExecutor<'_>,
        email: &str,
    ) -> Result<Option<Self>, Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(executor)
            .await?)
    }

    /// Finds a user by ID, only if the account is active
    ///
    /// Used by the composition service to validate task ownership.
    pub async fn find_active(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active = TRUE");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?)
    }

    /// Partially updates a user, refreshing `updated_at`
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the user does not exist;
    /// [`Error::Duplicate`] when a new email collides with another account.
    pub async fn update(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Self, Error> {
        // Build the SET list from the fields that are present.
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${bind_count}"));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${bind_count}"));
        }
        if data.first_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", first_name = ${bind_count}"));
        }
        if data.last_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", last_name = ${bind_count}"));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${bind_count}"));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${bind_count}"));
        }
        if data.email_verified.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email_verified = ${bind_count}"));
        }

        query.push_str(" WHERE id = $1 RETURNING ");
        query.push_str(USER_COLUMNS);

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(first_name) = data.first_name {
            q = q.bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            q = q.bind(last_name);
        }
        if let Some(role) = data.role {
            q = q.bind(role);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }
        if let Some(email_verified) = data.email_verified {
            q = q.bind(email_verified);
        }

        q.fetch_optional(executor)
            .await
            .map_err(|err| Error::map_constraint("user", err))?
            .ok_or_else(|| Error::not_found("user"))
    }

    /// Deletes a user
    ///
    /// Cascades to the user's tasks, categories, and task/category links.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the user does not exist.
    pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("user"));
        }
        Ok(())
    }

    /// Lists users with pagination, newest first
    pub async fn list(
        executor: impl PgExecutor<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id LIMIT $1 OFFSET $2"
        );
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await?)
    }

    /// Counts all users
    pub async fn count(executor: impl PgExecutor<'_>) -> Result<i64, Error> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(executor)
            .await?)
    }

    /// The user's display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_only_admin_is_admin() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::User.is_admin());
    }

    #[test]
    fn test_update_user_default_is_empty() {
        let update = UpdateUser::default();
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
        assert!(update.role.is_none());
        assert!(update.is_active.is_none());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: Role::User,
            is_active: true,
            email_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("ada@example.com"));
    }

    #[test]
    fn test_full_name() {
        let user = User {
            id: Uuid::new_v4(),
            email: "g@example.com".to_string(),
            password_hash: String::new(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            role: Role::Admin,
            is_active: true,
            email_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(user.full_name(), "Grace Hopper");
    }

    // Database-backed tests live in tests/repository_tests.rs
}
