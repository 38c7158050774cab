/// Task model and repository operations
///
/// Tasks are owned exclusively by one user and carry their resolved category
/// list on every read (single query, `LEFT JOIN` + `array_agg`, the same
/// shape the listing endpoint returns). Listing and counting share one
/// predicate builder so they always agree on filter semantics.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     priority VARCHAR(10) NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhub::models::task::{Task, TaskFilters};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), taskhub::Error> {
/// let filters = TaskFilters {
///     completed: Some(false),
///     search: Some("report".to_string()),
///     ..Default::default()
/// };
///
/// let tasks = Task::list_for_user(&pool, user_id, &filters).await?;
/// let total = Task::count_for_user(&pool, user_id, &filters).await?;
/// println!("{} of {} open tasks mention 'report'", tasks.len(), total);
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Task priority
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,

    #[default]
    Medium,

    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Category fields carried on a task read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: Uuid,

    pub name: String,

    pub color: String,
}

/// Task owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    pub title: String,

    pub description: String,

    pub completed: bool,

    pub priority: Priority,

    /// Optional deadline
    pub due_date: Option<DateTime<Utc>>,

    /// Owning user
    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Resolved categories, ordered by name; populated on reads that join
    /// the junction table
    #[sqlx(skip)]
    #[serde(default)]
    pub categories: Vec<CategorySummary>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,

    pub description: String,

    pub priority: Priority,

    pub due_date: Option<DateTime<Utc>>,

    pub user_id: Uuid,
}

/// Input for partially updating a task
///
/// Each present field overwrites the corresponding column; absent fields
/// are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,

    pub description: Option<String>,

    pub completed: Option<bool>,

    pub priority: Option<Priority>,

    pub due_date: Option<DateTime<Utc>>,
}

/// Filter set for task listing and counting
///
/// Absent filters impose no constraint; present filters combine with
/// logical AND. `search` is a case-insensitive substring match over title
/// OR description and keeps that meaning under any filter combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFilters {
    pub completed: Option<bool>,

    pub priority: Option<Priority>,

    /// Case-insensitive substring over title or description
    pub search: Option<String>,

    /// Tasks due at or before this instant
    pub due_before: Option<DateTime<Utc>>,

    /// Tasks due at or after this instant
    pub due_after: Option<DateTime<Utc>>,

    /// Tasks linked to at least one of these categories
    pub category_ids: Vec<Uuid>,

    /// Page size, clamped to 1..=100
    pub limit: i64,

    pub offset: i64,
}

/// Default page size when the caller does not specify one
pub const DEFAULT_LIMIT: i64 = 10;

/// Upper bound on page size
pub const MAX_LIMIT: i64 = 100;

impl Default for TaskFilters {
    fn default() -> Self {
        Self {
            completed: None,
            priority: None,
            search: None,
            due_before: None,
            due_after: None,
            category_ids: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl TaskFilters {
    /// Appends the WHERE predicates shared by listing and counting
    ///
    /// Both entry points call this one function, which is what guarantees
    /// `list` and `count` agree on filter semantics.
    fn push_predicates(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        if let Some(completed) = self.completed {
            qb.push(" AND t.completed = ").push_bind(completed);
        }
        if let Some(priority) = self.priority {
            qb.push(" AND t.priority = ").push_bind(priority);
        }
        if let Some(ref search) = self.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (t.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR t.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(due_before) = self.due_before {
            qb.push(" AND t.due_date <= ").push_bind(due_before);
        }
        if let Some(due_after) = self.due_after {
            qb.push(" AND t.due_date >= ").push_bind(due_after);
        }
        if !self.category_ids.is_empty() {
            qb.push(
                " AND t.id IN (SELECT tc2.task_id FROM task_categories tc2 \
                 WHERE tc2.category_id = ANY(",
            )
            .push_bind(self.category_ids.clone())
            .push("))");
        }
    }

    fn effective_limit(&self) -> i64 {
        self.limit.clamp(1, MAX_LIMIT)
    }
}

/// Row shape for reads that aggregate categories alongside the task
#[derive(sqlx::FromRow)]
struct TaskWithCategoriesRow {
    id: Uuid,
    title: String,
    description: String,
    completed: bool,
    priority: Priority,
    due_date: Option<DateTime<Utc>>,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_ids: Vec<Uuid>,
    category_names: Vec<String>,
    category_colors: Vec<String>,
}

impl From<TaskWithCategoriesRow> for Task {
    fn from(row: TaskWithCategoriesRow) -> Self {
        let categories = row
            .category_ids
            .into_iter()
            .zip(row.category_names)
            .zip(row.category_colors)
            .map(|((id, name), color)| CategorySummary { id, name, color })
            .collect();

        Task {
            id: row.id,
            title: row.title,
            description: row.description,
            completed: row.completed,
            priority: row.priority,
            due_date: row.due_date,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            categories,
        }
    }
}

/// Selected columns for aggregate reads; the three `array_agg`s share an
/// ORDER BY so the id/name/color positions stay aligned
const TASK_JOIN_SELECT: &str = "SELECT t.id, t.title, t.description, t.completed, t.priority, \
     t.due_date, t.user_id, t.created_at, t.updated_at, \
     COALESCE(array_agg(c.id ORDER BY c.name) FILTER (WHERE c.id IS NOT NULL), '{}') AS category_ids, \
     COALESCE(array_agg(c.name ORDER BY c.name) FILTER (WHERE c.id IS NOT NULL), '{}') AS category_names, \
     COALESCE(array_agg(c.color ORDER BY c.name) FILTER (WHERE c.id IS NOT NULL), '{}') AS category_colors \
     FROM tasks t \
     LEFT JOIN task_categories tc ON tc.task_id = t.id \
     LEFT JOIN categories c ON c.id = tc.category_id";

const TASK_COLUMNS: &str =
    "id, title, description, completed, priority, due_date, user_id, created_at, updated_at";

fn build_list_query(user_id: Uuid, filters: &TaskFilters) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("{TASK_JOIN_SELECT} WHERE t.user_id = "));
    qb.push_bind(user_id);
    filters.push_predicates(&mut qb);
    qb.push(" GROUP BY t.id ORDER BY t.created_at DESC, t.id LIMIT ");
    qb.push_bind(filters.effective_limit());
    qb.push(" OFFSET ");
    qb.push_bind(filters.offset.max(0));
    qb
}

fn build_count_query(user_id: Uuid, filters: &TaskFilters) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM tasks t WHERE t.user_id = ");
    qb.push_bind(user_id);
    filters.push_predicates(&mut qb);
    qb
}

impl Task {
    /// Creates a new task
    ///
    /// New tasks start not-completed. The returned task carries no
    /// categories; attach them with [`Task::link_category`] and re-read.
    pub async fn create(executor: impl PgExecutor<'_>, data: &CreateTask) -> Result<Self, Error> {
        Ok(sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, priority, due_date, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, completed, priority, due_date,
                      user_id, created_at, updated_at
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.user_id)
        .fetch_one(executor)
        .await?)
    }

    /// Finds a task by ID, categories attached
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when no task has this ID.
    pub async fn find_by_id(executor: impl PgExecutor<'_>, id: Uuid) -> Result<Self, Error> {
        let query = format!("{TASK_JOIN_SELECT} WHERE t.id = $1 GROUP BY t.id");
        let row = sqlx::query_as::<_, TaskWithCategoriesRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| Error::not_found("task"))?;

        Ok(row.into())
    }

    /// Lists a user's tasks under the given filters
    ///
    /// Ordered newest-created-first with a stable tie-break on ID, so pages
    /// are deterministic. Categories come attached.
    pub async fn list_for_user(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
        filters: &TaskFilters,
    ) -> Result<Vec<Self>, Error> {
        let mut qb = build_list_query(user_id, filters);
        let rows = qb
            .build_query_as::<TaskWithCategoriesRow>()
            .fetch_all(executor)
            .await?;

        Ok(rows.into_iter().map(Task::from).collect())
    }

    /// Counts a user's tasks under the same predicates as
    /// [`Task::list_for_user`], ignoring pagination
    pub async fn count_for_user(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
        filters: &TaskFilters,
    ) -> Result<i64, Error> {
        let mut qb = build_count_query(user_id, filters);
        let count: i64 = qb.build_query_scalar().fetch_one(executor).await?;
        Ok(count)
    }

    /// Partially updates a task, refreshing `updated_at`
    ///
    /// The returned task carries no categories; callers that need them
    /// re-read with [`Task::find_by_id`].
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the task does not exist.
    pub async fn update(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<Self, Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${bind_count}"));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${bind_count}"));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${bind_count}"));
        }

        query.push_str(" WHERE id = $1 RETURNING ");
        query.push_str(TASK_COLUMNS);

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(ref title) = data.title {
            q = q.bind(title);
        }
        if let Some(ref description) = data.description {
            q = q.bind(description);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        q.fetch_optional(executor)
            .await?
            .ok_or_else(|| Error::not_found("task"))
    }

    /// Hard-deletes a task; junction rows go with it via cascade
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the task does not exist.
    pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("task"));
        }
        Ok(())
    }

    /// Links a task to a category, idempotently
    ///
    /// Inserting an already-existing pair is a no-op, not an error.
    pub async fn link_category(
        executor: impl PgExecutor<'_>,
        task_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO task_categories (task_id, category_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(task_id)
        .bind(category_id)
        .execute(executor)
        .await?;

        Ok(())
    }
}
