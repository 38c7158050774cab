/// Category model and repository operations
///
/// Categories are per-user labels attached to tasks through the
/// `task_categories` junction. Names are unique within their owner's scope;
/// the composition service resolves names through [`Category::find_or_create`]
/// so concurrent requests never produce duplicate rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     color VARCHAR(7) NOT NULL DEFAULT '#3B82F6',
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT categories_user_id_name_key UNIQUE (user_id, name)
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::error::Error;

/// Default color assigned to categories created through find-or-create
pub const DEFAULT_COLOR: &str = "#3B82F6";

/// Per-user task label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Unique category ID
    pub id: Uuid,

    /// Label text, unique per owning user
    pub name: String,

    /// Display color (hex, e.g. "#3B82F6")
    pub color: String,

    /// Owning user
    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    pub name: String,

    pub color: String,

    pub user_id: Uuid,
}

/// Input for partially updating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,

    pub color: Option<String>,
}

const CATEGORY_COLUMNS: &str = "id, name, color, user_id, created_at, updated_at";

impl Category {
    /// Creates a new category
    ///
    /// # Errors
    ///
    /// [`Error::Duplicate`] when the owner already has a category with this
    /// name. The row is never silently overwritten.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateCategory,
    ) -> Result<Self, Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, color, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, color, user_id, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.color)
        .bind(data.user_id)
        .fetch_one(executor)
        .await
        .map_err(|err| Error::map_constraint("category", err))
    }

    /// Finds a category by ID
    pub async fn find_by_id(executor: impl PgExecutor<'_>, id: Uuid) -> Result<Self, Error> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| Error::not_found("category"))
    }

    /// Finds a category by its unique (owner, name) key
    pub async fn find_by_name(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Self>, Error> {
        let query =
            format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE user_id = $1 AND name = $2");
        Ok(sqlx::query_as::<_, Category>(&query)
            .bind(user_id)
            .bind(name)
            .fetch_optional(executor)
            .await?)
    }

    /// Resolves a category by name, creating it if absent
    ///
    /// Attempts the insert first with `ON CONFLICT DO NOTHING`; a concurrent
    /// creation of the same (owner, name) pair is a cue to re-fetch the
    /// now-existing row, not an error. Never pre-checks then inserts, which
    /// would race, and never aborts the surrounding transaction the way a
    /// raw unique violation would.
    ///
    /// Takes a connection rather than a generic executor because the resolve
    /// step may issue two statements; in practice this runs inside the
    /// composition service's transaction.
    pub async fn find_or_create(
        conn: &mut PgConnection,
        user_id: Uuid,
        name: &str,
        color: &str,
    ) -> Result<Self, Error> {
        let inserted = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, color, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, name) DO NOTHING
            RETURNING id, name, color, user_id, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(color)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(category) = inserted {
            return Ok(category);
        }

        // Lost the race (or the row predates us): the winner's row is
        // visible once its transaction commits.
        Self::find_by_name(&mut *conn, user_id, name)
            .await?
            .ok_or_else(|| Error::not_found("category"))
    }

    /// Partially updates a category, refreshing `updated_at`
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when absent; [`Error::Duplicate`] when renaming
    /// onto an existing (owner, name) pair.
    pub async fn update(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        data: UpdateCategory,
    ) -> Result<Self, Error> {
        let mut query = String::from("UPDATE categories SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if data.color.is_some() {
            bind_count += 1;
            query.push_str(&format!(", color = ${bind_count}"));
        }

        query.push_str(" WHERE id = $1 RETURNING ");
        query.push_str(CATEGORY_COLUMNS);

        let mut q = sqlx::query_as::<_, Category>(&query).bind(id);
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(color) = data.color {
            q = q.bind(color);
        }

        q.fetch_optional(executor)
            .await
            .map_err(|err| Error::map_constraint("category", err))?
            .ok_or_else(|| Error::not_found("category"))
    }

    /// Deletes a category; junction rows go with it via cascade
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the category does not exist.
    pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("category"));
        }
        Ok(())
    }

    /// Lists a user's categories, ordered by name
    pub async fn list_for_user(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<Vec<Self>, Error> {
        let query =
            format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE user_id = $1 ORDER BY name");
        Ok(sqlx::query_as::<_, Category>(&query)
            .bind(user_id)
            .fetch_all(executor)
            .await?)
    }

    /// Counts a user's categories
    pub async fn count_for_user(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<i64, Error> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(executor)
                .await?,
        )
    }
}
