//! Task store trait definitions.
//!
//! State containers hold these as `Arc<dyn TaskStore>` / `Arc<dyn TopicStore>`
//! and never talk to the database directly.

use async_trait::async_trait;
use entities::{Task, TaskStatus, Topic};

use crate::TaskStoreResult;

/// Storage operations for tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Sets up the schema. Idempotent.
    async fn initialize(&self) -> TaskStoreResult<()>;

    /// Creates a new task.
    async fn create_task(&self, task: &Task) -> TaskStoreResult<()>;

    /// Replaces a stored task, returning it with a fresh `updated_at`.
    async fn update_task(&self, task: &Task) -> TaskStoreResult<Task>;

    /// Lists tasks on a date, optionally filtered by status.
    async fn load_tasks_by_date(
        &self,
        date: &str,
        status: Option<TaskStatus>,
    ) -> TaskStoreResult<Vec<Task>>;

    /// Gets a task by ID.
    async fn get_task_by_id(&self, id: &str) -> TaskStoreResult<Task>;
}

/// Storage operations for topics.
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// Sets up the schema. Idempotent.
    async fn initialize(&self) -> TaskStoreResult<()>;

    /// Creates a new topic.
    async fn create_topic(&self, topic: &Topic) -> TaskStoreResult<()>;

    /// Lists every stored topic.
    async fn get_all_public_topics(&self) -> TaskStoreResult<Vec<Topic>>;

    /// Lists topics owned by a user.
    async fn get_user_topics(&self, user_id: &str) -> TaskStoreResult<Vec<Topic>>;

    /// Gets a topic by ID.
    async fn get_topic_by_id(&self, id: &str) -> TaskStoreResult<Topic>;

    /// Replaces a stored topic, returning it with a fresh `updated_at`.
    async fn update_topic(&self, topic: &Topic) -> TaskStoreResult<Topic>;

    /// Deletes a topic. Deleting a missing topic succeeds.
    async fn remove_topic(&self, id: &str) -> TaskStoreResult<()>;
}
