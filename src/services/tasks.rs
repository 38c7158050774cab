/// Task composition service
///
/// Orchestrates the task and category repositories through the transaction
/// manager. The central operation is the atomic "create task with
/// categories" workflow: task insert, category find-or-create, and junction
/// linking either all commit together or leave no trace.
///
/// # Example
///
/// ```no_run
/// use taskhub::models::task::Priority;
/// use taskhub::services::tasks::{CreateTaskRequest, TaskService};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), taskhub::Error> {
/// let service = TaskService::new(pool);
///
/// let task = service
///     .create_task_with_categories(owner_id, CreateTaskRequest {
///         title: "Plan Q4".to_string(),
///         description: "Roadmap and budget".to_string(),
///         priority: Priority::High,
///         due_date: None,
///         category_names: vec!["Work".to_string(), "Planning".to_string()],
///     })
///     .await?;
///
/// assert_eq!(task.categories.len(), 2);
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::tx::with_transaction;
use crate::error::Error;
use crate::models::category::{self, Category};
use crate::models::task::{CreateTask, Priority, Task, TaskFilters, UpdateTask};
use crate::models::user::User;

/// Input for the composite task-creation workflow
///
/// Duplicate names in `category_names` collapse to one linkage; order is
/// irrelevant to the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,

    pub description: String,

    pub priority: Priority,

    pub due_date: Option<DateTime<Utc>>,

    /// Category names to attach; missing ones are created with the
    /// default color
    pub category_names: Vec<String>,
}

/// One page of a filtered task listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPage {
    /// Tasks on this page, newest first
    pub tasks: Vec<Task>,

    /// Total matching tasks across all pages, counted under the identical
    /// predicates as `tasks`
    pub total_count: i64,
}

/// Task operations, bound to a connection pool
#[derive(Clone)]
pub struct TaskService {
    pool: PgPool,
}

impl TaskService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomically creates a task together with its categories
    ///
    /// Single transaction:
    /// 1. the owner must exist and be active;
    /// 2. the task row is inserted, not completed;
    /// 3. each distinct category name is resolved via find-or-create
    ///    (existing categories are reused, concurrent creation races are
    ///    absorbed by the unique constraint);
    /// 4. junction rows are inserted idempotently;
    /// 5. the task is re-read with its full category list before commit.
    ///
    /// Any step failing rolls the whole operation back: no orphaned task,
    /// no stray categories from the failed attempt.
    ///
    /// # Errors
    ///
    /// [`Error::OwnerNotFound`] when the owner is missing or inactive;
    /// otherwise the failing step's error, unchanged.
    pub async fn create_task_with_categories(
        &self,
        owner_id: Uuid,
        request: CreateTaskRequest,
    ) -> Result<Task, Error> {
        // The unit of work takes ownership of the request so the boxed
        // future borrows nothing beyond the transaction handle.
        let task = with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                if User::find_active(&mut **tx, owner_id).await?.is_none() {
                    return Err(Error::OwnerNotFound(owner_id));
                }

                let task = Task::create(
                    &mut **tx,
                    &CreateTask {
                        title: request.title.clone(),
                        description: request.description.clone(),
                        priority: request.priority,
                        due_date: request.due_date,
                        user_id: owner_id,
                    },
                )
                .await?;

                let mut seen = HashSet::new();
                for name in &request.category_names {
                    if !seen.insert(name.as_str()) {
                        continue;
                    }

                    let category = Category::find_or_create(
                        &mut **tx,
                        owner_id,
                        name,
                        category::DEFAULT_COLOR,
                    )
                    .await?;
                    debug!(task_id = %task.id, category_id = %category.id, name = %name, "linking category");

                    Task::link_category(&mut **tx, task.id, category.id).await?;
                }

                // Read-your-writes: resolve the category list inside the
                // same transaction.
                Task::find_by_id(&mut **tx, task.id).await
            })
        })
        .await?;

        info!(task_id = %task.id, owner_id = %owner_id, categories = task.categories.len(),
              "task created");
        Ok(task)
    }

    /// Fetches one of the owner's tasks, categories attached
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the task is absent or owned by another user.
    pub async fn get_task(&self, owner_id: Uuid, task_id: Uuid) -> Result<Task, Error> {
        let task = Task::find_by_id(&self.pool, task_id).await?;
        if task.user_id != owner_id {
            return Err(Error::not_found("task"));
        }
        Ok(task)
    }

    /// Partially updates one of the owner's tasks
    ///
    /// Present fields overwrite, absent fields are untouched, and
    /// `updated_at` is refreshed. Returns the task with categories re-read.
    pub async fn update_task(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        patch: UpdateTask,
    ) -> Result<Task, Error> {
        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let existing = Task::find_by_id(&mut **tx, task_id).await?;
                if existing.user_id != owner_id {
                    return Err(Error::not_found("task"));
                }

                Task::update(&mut **tx, task_id, &patch).await?;
                Task::find_by_id(&mut **tx, task_id).await
            })
        })
        .await
    }

    /// Hard-deletes one of the owner's tasks
    ///
    /// No dependency check: links go with the task via cascade.
    pub async fn delete_task(&self, owner_id: Uuid, task_id: Uuid) -> Result<(), Error> {
        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let existing = Task::find_by_id(&mut **tx, task_id).await?;
                if existing.user_id != owner_id {
                    return Err(Error::not_found("task"));
                }
                Task::delete(&mut **tx, task_id).await
            })
        })
        .await?;

        info!(task_id = %task_id, owner_id = %owner_id, "task deleted");
        Ok(())
    }

    /// Lists the owner's tasks under the given filters, with the total
    /// count for pagination
    pub async fn list_tasks(
        &self,
        owner_id: Uuid,
        filters: &TaskFilters,
    ) -> Result<TaskPage, Error> {
        let tasks = Task::list_for_user(&self.pool, owner_id, filters).await?;
        let total_count = Task::count_for_user(&self.pool, owner_id, filters).await?;

        Ok(TaskPage { tasks, total_count })
    }

    /// Lists the owner's categories
    pub async fn list_categories(&self, owner_id: Uuid) -> Result<Vec<Category>, Error> {
        Category::list_for_user(&self.pool, owner_id).await
    }
}
