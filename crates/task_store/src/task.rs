//! Persistence for scheduled tasks.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use entities::{Task, TaskStatus};

use crate::{
    init::{create_table_if_missing, SchemaInit},
    schema::{TaskRow, CREATE_TASKS_SQL, TASKS_TABLE, TASK_COLUMNS},
    validation, Database, TaskStore, TaskStoreError, TaskStoreResult,
};

const ENTITY: &str = "Task";

/// SQLite-backed storage for [`Task`] records.
pub struct TaskStorage {
    db: Arc<Database>,
    schema: SchemaInit,
}

impl TaskStorage {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            schema: SchemaInit::new(TASKS_TABLE),
        }
    }

    /// Creates the `tasks` table if needed. Safe to call concurrently and
    /// repeatedly.
    pub async fn initialize(&self) -> TaskStoreResult<()> {
        let db = Arc::clone(&self.db);
        self.schema
            .run(move || async move {
                create_table_if_missing(&db, TASKS_TABLE, CREATE_TASKS_SQL)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await
    }

    /// Inserts a new task.
    pub async fn create_task(&self, task: &Task) -> TaskStoreResult<()> {
        validation::validate_task(task)?;
        self.initialize().await?;

        let row = TaskRow::from(task);
        sqlx::query(&format!(
            "INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&row.id)
        .bind(&row.title)
        .bind(&row.description)
        .bind(&row.tags)
        .bind(&row.start_time)
        .bind(&row.end_time)
        .bind(&row.date)
        .bind(&row.status)
        .bind(&row.reminder_days)
        .bind(&row.category_id)
        .bind(&row.goal_id)
        .bind(&row.created_at)
        .bind(&row.updated_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| TaskStoreError::storage("insert task", Some(&task.id), e))?;

        tracing::debug!(id = %task.id, date = %task.date, "Task created");
        Ok(())
    }

    /// Overwrites every column of an existing task and refreshes
    /// `updated_at`. Returns the task as stored.
    pub async fn update_task(&self, task: &Task) -> TaskStoreResult<Task> {
        validation::validate_task(task)?;
        self.initialize().await?;

        let mut stored = task.clone();
        stored.updated_at = Utc::now();
        let row = TaskRow::from(&stored);

        let result = sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, tags = ?, start_time = ?, end_time = ?, \
             date = ?, status = ?, reminder_days = ?, category_id = ?, goal_id = ?, \
             created_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&row.title)
        .bind(&row.description)
        .bind(&row.tags)
        .bind(&row.start_time)
        .bind(&row.end_time)
        .bind(&row.date)
        .bind(&row.status)
        .bind(&row.reminder_days)
        .bind(&row.category_id)
        .bind(&row.goal_id)
        .bind(&row.created_at)
        .bind(&row.updated_at)
        .bind(&row.id)
        .execute(self.db.pool())
        .await
        .map_err(|e| TaskStoreError::storage("update task", Some(&task.id), e))?;

        if result.rows_affected() == 0 {
            return Err(TaskStoreError::not_found(ENTITY, &task.id));
        }

        tracing::debug!(id = %task.id, status = %task.status, "Task updated");
        Ok(stored)
    }

    /// Lists the tasks scheduled on `date`, optionally only those with
    /// `status`. Rows come back in database order.
    pub async fn load_tasks_by_date(
        &self,
        date: &str,
        status: Option<TaskStatus>,
    ) -> TaskStoreResult<Vec<Task>> {
        validation::validate_date(date)?;
        self.initialize().await?;

        let rows: Vec<TaskRow> = if let Some(status) = status {
            sqlx::query_as(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE date = ? AND status = ?"
            ))
            .bind(date)
            .bind(status.as_str())
            .fetch_all(self.db.pool())
            .await
        } else {
            sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE date = ?"))
                .bind(date)
                .fetch_all(self.db.pool())
                .await
        }
        .map_err(|e| TaskStoreError::storage("load tasks", None, e))?;

        rows.into_iter().map(Task::try_from).collect()
    }

    /// Fetches one task.
    pub async fn get_task_by_id(&self, id: &str) -> TaskStoreResult<Task> {
        validation::require_non_empty("id", id)?;
        self.initialize().await?;

        let row: Option<TaskRow> =
            sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.db.pool())
                .await
                .map_err(|e| TaskStoreError::storage("get task", Some(id), e))?;

        row.ok_or_else(|| TaskStoreError::not_found(ENTITY, id))?
            .try_into()
    }
}

#[async_trait]
impl TaskStore for TaskStorage {
    async fn initialize(&self) -> TaskStoreResult<()> {
        TaskStorage::initialize(self).await
    }

    async fn create_task(&self, task: &Task) -> TaskStoreResult<()> {
        TaskStorage::create_task(self, task).await
    }

    async fn update_task(&self, task: &Task) -> TaskStoreResult<Task> {
        TaskStorage::update_task(self, task).await
    }

    async fn load_tasks_by_date(
        &self,
        date: &str,
        status: Option<TaskStatus>,
    ) -> TaskStoreResult<Vec<Task>> {
        TaskStorage::load_tasks_by_date(self, date, status).await
    }

    async fn get_task_by_id(&self, id: &str) -> TaskStoreResult<Task> {
        TaskStorage::get_task_by_id(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use futures_util::future::join_all;
    use tempfile::TempDir;

    use super::*;

    async fn storage() -> TaskStorage {
        TaskStorage::new(Arc::new(Database::in_memory().await.unwrap()))
    }

    fn sample(id: &str, date: &str, status: TaskStatus) -> Task {
        Task::new(format!("Task {id}"), date, "09:00", "10:30")
            .with_id(id)
            .with_status(status)
    }

    async fn row_count(storage: &TaskStorage) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(storage.db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let storage = storage().await;
        let task = sample("t1", "2025-01-01", TaskStatus::Pending)
            .with_description("Focus block")
            .with_tags(["work", "deep", "am"])
            .with_reminder_days(["saturday", "monday"])
            .with_category("c1")
            .with_goal("g1");

        storage.create_task(&task).await.unwrap();
        let fetched = storage.get_task_by_id("t1").await.unwrap();

        assert_eq!(fetched, task);
        assert_eq!(fetched.tags, vec!["work", "deep", "am"]);
    }

    #[tokio::test]
    async fn test_invalid_tasks_are_rejected_before_writing() {
        let storage = storage().await;
        let valid = sample("t1", "2025-01-01", TaskStatus::Pending);
        storage.create_task(&valid).await.unwrap();

        // Same id as the stored row, so an update that reached the database would succeed.
        let invalid = vec![
            Task { date: "2025/01/01".into(), ..valid.clone() },
            Task { date: "۲۰۲۵-۰۱-۰۱".into(), ..valid.clone() },
            Task { start_time: "9:00".into(), ..valid.clone() },
            Task { start_time: "۰۹:۰۰".into(), ..valid.clone() },
            Task { end_time: "10.30".into(), ..valid.clone() },
            Task { title: "  ".into(), ..valid.clone() },
            Task { id: String::new(), ..valid.clone() },
        ];

        for task in &invalid {
            let err = storage.create_task(task).await.unwrap_err();
            assert!(err.is_validation(), "create {task:?}: {err:?}");
            let err = storage.update_task(task).await.unwrap_err();
            assert!(err.is_validation(), "update {task:?}: {err:?}");
        }

        assert_eq!(row_count(&storage).await, 1);
        assert_eq!(storage.get_task_by_id("t1").await.unwrap(), valid);
    }

    #[tokio::test]
    async fn test_check_constraints_back_up_validation() {
        let storage = storage().await;
        storage.initialize().await.unwrap();

        let err = sqlx::query(
            "INSERT INTO tasks (id, title, start_time, end_time, date, status, created_at, \
             updated_at) VALUES ('x', 'x', '09:00', '10:00', '2025-01-01', 'DONE', '', '')",
        )
        .execute(storage.db.pool())
        .await
        .unwrap_err();

        assert!(err.to_string().contains("CHECK"));
    }

    #[tokio::test]
    async fn test_duplicate_id_is_wrapped_storage_error() {
        let storage = storage().await;
        let task = sample("dup", "2025-01-01", TaskStatus::Pending);

        storage.create_task(&task).await.unwrap();
        let err = storage.create_task(&task).await.unwrap_err();

        match &err {
            TaskStoreError::Storage { operation, id, .. } => {
                assert_eq!(*operation, "insert task");
                assert_eq!(id.as_deref(), Some("dup"));
            }
            other => panic!("expected storage error, got {other:?}"),
        }
        assert!(err.to_string().contains("UNIQUE"));
    }

    #[tokio::test]
    async fn test_concurrent_initialize_creates_table_once() {
        let storage = storage().await;

        let results = join_all((0..10).map(|_| storage.initialize())).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(storage.schema.attempts(), 1);
        assert_eq!(storage.schema.tables_created(), 1);
        assert!(storage.db.table_exists("tasks").await.unwrap());

        storage.initialize().await.unwrap();
        assert_eq!(storage.schema.attempts(), 1);
        assert_eq!(storage.schema.tables_created(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_storages_on_separate_handles_create_table_once() {
        for round in 0..5 {
            let temp_dir = TempDir::new().unwrap();
            let path = temp_dir.path().join("daybook.db");
            let handles = [
                Arc::new(Database::open(&path, 5).await.unwrap()),
                Arc::new(Database::open(&path, 5).await.unwrap()),
            ];
            let storages: Vec<Arc<TaskStorage>> = (0..6)
                .map(|i| Arc::new(TaskStorage::new(Arc::clone(&handles[i % 2]))))
                .collect();

            let joins: Vec<_> = storages
                .iter()
                .map(|storage| {
                    let storage = Arc::clone(storage);
                    tokio::spawn(async move { storage.initialize().await })
                })
                .collect();
            for join in joins {
                join.await.unwrap().unwrap();
            }

            let created: usize = storages.iter().map(|s| s.schema.tables_created()).sum();
            assert_eq!(created, 1, "round {round}");

            for db in &handles {
                db.close().await;
            }
        }
    }

    #[tokio::test]
    async fn test_initialize_keeps_existing_table() {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let first = TaskStorage::new(Arc::clone(&db));
        first
            .create_task(&sample("kept", "2025-01-01", TaskStatus::Pending))
            .await
            .unwrap();

        let second = TaskStorage::new(db);
        second.initialize().await.unwrap();
        assert!(second.get_task_by_id("kept").await.is_ok());
        assert_eq!(first.schema.tables_created(), 1);
        assert_eq!(second.schema.tables_created(), 0);
    }

    #[tokio::test]
    async fn test_initialize_failure_is_retryable() {
        let db = Arc::new(Database::in_memory().await.unwrap());
        sqlx::query("CREATE VIEW tasks AS SELECT 1 AS id")
            .execute(db.pool())
            .await
            .unwrap();
        let storage = TaskStorage::new(Arc::clone(&db));

        let err = storage.initialize().await.unwrap_err();
        assert!(matches!(err, TaskStoreError::Initialization { table: "tasks", .. }));

        sqlx::query("DROP VIEW tasks").execute(db.pool()).await.unwrap();
        storage.initialize().await.unwrap();
        assert_eq!(storage.schema.attempts(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_task_is_not_found() {
        let storage = storage().await;
        storage
            .create_task(&sample("t1", "2025-01-01", TaskStatus::Pending))
            .await
            .unwrap();

        let ghost = sample("ghost", "2025-01-02", TaskStatus::Completed);
        let err = storage.update_task(&ghost).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(row_count(&storage).await, 1);
        assert!(storage.get_task_by_id("ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_overwrites_row_and_refreshes_timestamp() {
        let storage = storage().await;
        let mut task = sample("t1", "2025-01-01", TaskStatus::Pending);
        task.updated_at = task.created_at - chrono::Duration::days(3);
        storage.create_task(&task).await.unwrap();

        let edited = Task {
            title: "Renamed".into(),
            status: TaskStatus::Completed,
            tags: vec!["done".into()],
            goal_id: None,
            ..task.clone()
        };
        let stored = storage.update_task(&edited).await.unwrap();
        let fetched = storage.get_task_by_id("t1").await.unwrap();

        assert_eq!(fetched, stored);
        assert_eq!(fetched.title, "Renamed");
        assert_eq!(fetched.status, TaskStatus::Completed);
        assert_eq!(fetched.created_at, task.created_at);
        assert!(fetched.updated_at > task.updated_at);
    }

    #[tokio::test]
    async fn test_load_tasks_by_date_filters() {
        let storage = storage().await;
        let fixture = [
            sample("a", "2025-01-01", TaskStatus::Pending),
            sample("b", "2025-01-01", TaskStatus::Completed),
            sample("c", "2025-01-01", TaskStatus::Pending),
            sample("d", "2025-01-02", TaskStatus::Pending),
            sample("e", "2025-01-02", TaskStatus::Completed),
        ];
        for task in &fixture {
            storage.create_task(task).await.unwrap();
        }

        let mut ids: Vec<String> = storage
            .load_tasks_by_date("2025-01-01", None)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let pending = storage
            .load_tasks_by_date("2025-01-01", Some(TaskStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending
            .iter()
            .all(|t| t.date == "2025-01-01" && t.status == TaskStatus::Pending));

        let completed = storage
            .load_tasks_by_date("2025-01-02", Some(TaskStatus::Completed))
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, "e");

        assert!(storage
            .load_tasks_by_date("2025-01-03", None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_load_tasks_by_date_validates_date() {
        let storage = storage().await;
        let err = storage.load_tasks_by_date("tomorrow", None).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(storage.schema.attempts(), 0);
    }

    #[tokio::test]
    async fn test_get_task_requires_id() {
        let storage = storage().await;
        assert!(storage.get_task_by_id(" ").await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_corrupt_json_fails_the_read() {
        let storage = storage().await;
        storage
            .create_task(&sample("t1", "2025-01-01", TaskStatus::Pending))
            .await
            .unwrap();
        sqlx::query("UPDATE tasks SET reminder_days = '[\"mon\"' WHERE id = 't1'")
            .execute(storage.db.pool())
            .await
            .unwrap();

        let err = storage.get_task_by_id("t1").await.unwrap_err();
        assert!(matches!(
            err,
            TaskStoreError::CorruptRow { column: "reminder_days", .. }
        ));
    }

    #[tokio::test]
    async fn test_closed_database_surfaces_storage_error() {
        let storage = storage().await;
        storage.initialize().await.unwrap();
        storage.db.close().await;

        let err = storage.get_task_by_id("t1").await.unwrap_err();
        assert!(matches!(err, TaskStoreError::Storage { .. }));

        match storage.load_tasks_by_date("2025-01-01", None).await.unwrap_err() {
            TaskStoreError::Storage { operation, id, .. } => {
                assert_eq!(operation, "load tasks");
                assert!(id.is_none());
            }
            other => panic!("expected storage error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_usable_through_trait_object() {
        let store: Arc<dyn TaskStore> = Arc::new(storage().await);
        let task = sample("t1", "2025-01-01", TaskStatus::Pending);

        store.create_task(&task).await.unwrap();
        assert_eq!(store.get_task_by_id("t1").await.unwrap(), task);
    }
}
