/// Integration tests for the composition and account services
///
/// Cover the atomic task-with-categories workflow, its rollback behavior,
/// the concurrent find-or-create race, and the register/login flows.
///
/// These tests require a running PostgreSQL database and are marked
/// `#[ignore]`; see tests/common/mod.rs for the run instructions.
mod common;

use taskhub::config::TokenConfig;
use taskhub::error::Error;
use taskhub::models::category::Category;
use taskhub::models::task::{Priority, TaskFilters, UpdateTask};
use taskhub::models::user::{UpdateUser, User};
use taskhub::services::auth::{AuthService, RegisterRequest};
use taskhub::services::tasks::{CreateTaskRequest, TaskService};

fn request(title: &str, category_names: &[&str]) -> CreateTaskRequest {
    CreateTaskRequest {
        title: title.to_string(),
        description: String::new(),
        priority: Priority::Medium,
        due_date: None,
        category_names: category_names.iter().map(|s| s.to_string()).collect(),
    }
}

fn token_config() -> TokenConfig {
    TokenConfig {
        secret: "integration-test-secret-32-bytes!!!!".to_string(),
        ttl_hours: 1,
    }
}

#[tokio::test]
#[ignore]
async fn test_create_task_with_categories_creates_missing_ones() {
    let pool = common::setup_pool().await;
    let user = common::create_test_user(&pool).await;
    let service = TaskService::new(pool.clone());

    let task = service
        .create_task_with_categories(user.id, request("Plan Q4", &["Work", "Planning"]))
        .await
        .expect("creation failed");

    assert!(!task.completed);
    let names: Vec<&str> = task.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Planning", "Work"], "categories come back sorted by name");
    assert!(
        task.categories.iter().all(|c| c.color == "#3B82F6"),
        "categories created on the fly get the default color"
    );
}

#[tokio::test]
#[ignore]
async fn test_duplicate_names_collapse_to_one_link() {
    let pool = common::setup_pool().await;
    let user = common::create_test_user(&pool).await;
    let service = TaskService::new(pool.clone());

    let task = service
        .create_task_with_categories(user.id, request("Dedupe", &["A", "B", "A"]))
        .await
        .expect("creation failed");

    assert_eq!(task.categories.len(), 2);

    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM task_categories WHERE task_id = $1")
        .bind(task.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(links, 2);
}

#[tokio::test]
#[ignore]
async fn test_existing_categories_are_reused_across_tasks() {
    let pool = common::setup_pool().await;
    let user = common::create_test_user(&pool).await;
    let service = TaskService::new(pool.clone());

    let first = service
        .create_task_with_categories(user.id, request("Plan Q4", &["Work"]))
        .await
        .unwrap();
    let second = service
        .create_task_with_categories(user.id, request("Review", &["Work", "Reading"]))
        .await
        .unwrap();

    // Same category row, not a second "Work".
    assert_eq!(first.categories[0].id, second.categories[1].id);
    assert_eq!(
        Category::count_for_user(&pool, user.id).await.unwrap(),
        2,
        "only Work and Reading exist"
    );
}

#[tokio::test]
#[ignore]
async fn test_unknown_owner_is_rejected_with_no_side_effects() {
    let pool = common::setup_pool().await;
    let service = TaskService::new(pool.clone());
    let ghost = uuid::Uuid::new_v4();

    let err = service
        .create_task_with_categories(ghost, request("Nobody's task", &["Work"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::OwnerNotFound(id) if id == ghost));
}

#[tokio::test]
#[ignore]
async fn test_inactive_owner_is_rejected() {
    let pool = common::setup_pool().await;
    let user = common::create_test_user(&pool).await;
    User::update(
        &pool,
        user.id,
        UpdateUser {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let service = TaskService::new(pool.clone());
    let err = service
        .create_task_with_categories(user.id, request("Disabled", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::OwnerNotFound(_)));
}

#[tokio::test]
#[ignore]
async fn test_mid_workflow_failure_rolls_everything_back() {
    let pool = common::setup_pool().await;
    let user = common::create_test_user(&pool).await;
    let service = TaskService::new(pool.clone());

    // The second category name exceeds the column limit, so the workflow
    // fails after the task insert and the first link.
    let too_long = "x".repeat(200);
    let result = service
        .create_task_with_categories(user.id, request("Doomed", &["Fine", too_long.as_str()]))
        .await;
    assert!(result.is_err());

    let tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(tasks, 0, "no orphaned task after rollback");

    assert_eq!(
        Category::count_for_user(&pool, user.id).await.unwrap(),
        0,
        "no stray categories from the failed attempt"
    );
}

#[tokio::test]
#[ignore]
async fn test_concurrent_creation_never_duplicates_categories() {
    let pool = common::setup_pool().await;
    let user = common::create_test_user(&pool).await;
    let service = TaskService::new(pool.clone());

    let mut handles = vec![];
    for i in 0..8 {
        let service = service.clone();
        let owner = user.id;
        handles.push(tokio::spawn(async move {
            service
                .create_task_with_categories(owner, request(&format!("Task {i}"), &["Shared"]))
                .await
        }));
    }

    for handle in handles {
        let task = handle.await.expect("task panicked").expect("creation failed");
        assert_eq!(task.categories.len(), 1);
        assert_eq!(task.categories[0].name, "Shared");
    }

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE user_id = $1 AND name = $2")
            .bind(user.id)
            .bind("Shared")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(rows, 1, "all eight tasks share a single category row");
}

#[tokio::test]
#[ignore]
async fn test_task_operations_are_owner_scoped() {
    let pool = common::setup_pool().await;
    let alice = common::create_test_user(&pool).await;
    let bob = common::create_test_user(&pool).await;
    let service = TaskService::new(pool.clone());

    let task = service
        .create_task_with_categories(alice.id, request("Alice's", &[]))
        .await
        .unwrap();

    // Bob cannot see, update, or delete Alice's task.
    assert!(matches!(
        service.get_task(bob.id, task.id).await.unwrap_err(),
        Error::NotFound { entity: "task" }
    ));
    assert!(matches!(
        service
            .update_task(
                bob.id,
                task.id,
                UpdateTask {
                    completed: Some(true),
                    ..Default::default()
                }
            )
            .await
            .unwrap_err(),
        Error::NotFound { entity: "task" }
    ));
    assert!(matches!(
        service.delete_task(bob.id, task.id).await.unwrap_err(),
        Error::NotFound { entity: "task" }
    ));

    // Alice still owns it, unchanged.
    let fetched = service.get_task(alice.id, task.id).await.unwrap();
    assert!(!fetched.completed);
}

#[tokio::test]
#[ignore]
async fn test_list_tasks_filters_by_category_and_counts() {
    let pool = common::setup_pool().await;
    let user = common::create_test_user(&pool).await;
    let service = TaskService::new(pool.clone());

    let tagged = service
        .create_task_with_categories(user.id, request("Tagged", &["Work"]))
        .await
        .unwrap();
    service
        .create_task_with_categories(user.id, request("Untagged", &[]))
        .await
        .unwrap();

    let filters = TaskFilters {
        category_ids: vec![tagged.categories[0].id],
        ..Default::default()
    };
    let page = service.list_tasks(user.id, &filters).await.unwrap();

    assert_eq!(page.total_count, 1);
    assert_eq!(page.tasks.len(), 1);
    assert_eq!(page.tasks[0].id, tagged.id);
    assert_eq!(page.tasks[0].categories[0].name, "Work");
}

#[tokio::test]
#[ignore]
async fn test_register_then_login() {
    let pool = common::setup_pool().await;
    let auth = AuthService::new(pool.clone(), &token_config());

    let email = format!("reg-{}@example.com", uuid::Uuid::new_v4());
    let registered = auth
        .register(RegisterRequest {
            email: email.clone(),
            password: "correct horse battery staple".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        })
        .await
        .expect("registration failed");
    assert!(!registered.token.is_empty());

    // The issued token authenticates back to the same user.
    let authed = auth.authenticate(&registered.token).await.unwrap();
    assert_eq!(authed.id, registered.user.id);

    let logged_in = auth
        .login(&email, "correct horse battery staple")
        .await
        .expect("login failed");
    assert_eq!(logged_in.user.id, registered.user.id);

    // Re-registration of the same email is a duplicate.
    let err = auth
        .register(RegisterRequest {
            email,
            password: "another password".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Duplicate { entity: "user", .. }));
}

#[tokio::test]
#[ignore]
async fn test_login_failures_are_indistinguishable() {
    let pool = common::setup_pool().await;
    let auth = AuthService::new(pool.clone(), &token_config());

    let email = format!("login-{}@example.com", uuid::Uuid::new_v4());
    let registered = auth
        .register(RegisterRequest {
            email: email.clone(),
            password: "right password".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
        })
        .await
        .unwrap();

    // Wrong password.
    assert!(matches!(
        auth.login(&email, "wrong password").await.unwrap_err(),
        Error::InvalidCredentials
    ));

    // Unknown email.
    assert!(matches!(
        auth.login("nobody@example.com", "right password").await.unwrap_err(),
        Error::InvalidCredentials
    ));

    // Disabled account, even with the right password.
    User::update(
        &pool,
        registered.user.id,
        UpdateUser {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(matches!(
        auth.login(&email, "right password").await.unwrap_err(),
        Error::InvalidCredentials
    ));

    // And the previously issued token stops authenticating.
    assert!(matches!(
        auth.authenticate(&registered.token).await.unwrap_err(),
        Error::InvalidCredentials
    ));
}
