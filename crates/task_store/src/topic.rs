//! Persistence for user topics.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use entities::Topic;

use crate::{
    init::{create_table_if_missing, SchemaInit},
    schema::{TopicRow, CREATE_TOPICS_SQL, TOPICS_TABLE, TOPIC_COLUMNS},
    Database, TaskStoreError, TaskStoreResult, TopicStore,
};

const ENTITY: &str = "Topic";

/// SQLite-backed storage for [`Topic`] records.
///
/// Unlike tasks, topic fields are stored as given, without format checks.
pub struct TopicStorage {
    db: Arc<Database>,
    schema: SchemaInit,
}

impl TopicStorage {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            schema: SchemaInit::new(TOPICS_TABLE),
        }
    }

    /// Creates the `topics` table if needed.
    pub async fn initialize(&self) -> TaskStoreResult<()> {
        let db = Arc::clone(&self.db);
        self.schema
            .run(move || async move {
                create_table_if_missing(&db, TOPICS_TABLE, CREATE_TOPICS_SQL)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await
    }

    async fn ensure_initialized(&self) -> TaskStoreResult<()> {
        if self.schema.is_ready() {
            return Ok(());
        }
        self.initialize().await
    }

    async fn fetch_all(
        &self,
        operation: &'static str,
        sql: &str,
        param: Option<&str>,
    ) -> TaskStoreResult<Vec<Topic>> {
        let mut query = sqlx::query_as::<sqlx::Sqlite, TopicRow>(sql);
        if let Some(param) = param {
            query = query.bind(param);
        }
        let rows = query
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| TaskStoreError::storage(operation, param, e))?;

        rows.into_iter().map(Topic::try_from).collect()
    }

    /// Inserts a new topic.
    pub async fn create_topic(&self, topic: &Topic) -> TaskStoreResult<()> {
        self.ensure_initialized().await?;

        let row = TopicRow::from(topic);
        sqlx::query(&format!(
            "INSERT INTO topics ({TOPIC_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&row.id)
        .bind(&row.title)
        .bind(&row.user_id)
        .bind(&row.status)
        .bind(&row.category)
        .bind(&row.description)
        .bind(&row.created_at)
        .bind(&row.updated_at)
        .bind(row.likes)
        .bind(row.is_public)
        .execute(self.db.pool())
        .await
        .map_err(|e| TaskStoreError::storage("insert topic", Some(&topic.id), e))?;

        tracing::debug!(id = %topic.id, user_id = %topic.user_id, "Topic created");
        Ok(())
    }

    /// Returns every stored topic, private ones included. Callers filter on
    /// `is_public`.
    pub async fn get_all_public_topics(&self) -> TaskStoreResult<Vec<Topic>> {
        self.ensure_initialized().await?;
        self.fetch_all(
            "list topics",
            &format!("SELECT {TOPIC_COLUMNS} FROM topics"),
            None,
        )
        .await
    }

    /// Returns the topics owned by `user_id`.
    pub async fn get_user_topics(&self, user_id: &str) -> TaskStoreResult<Vec<Topic>> {
        self.ensure_initialized().await?;
        self.fetch_all(
            "list user topics",
            &format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE user_id = ?"),
            Some(user_id),
        )
        .await
    }

    /// Fetches one topic.
    pub async fn get_topic_by_id(&self, id: &str) -> TaskStoreResult<Topic> {
        self.ensure_initialized().await?;

        let row: Option<TopicRow> =
            sqlx::query_as(&format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.db.pool())
                .await
                .map_err(|e| TaskStoreError::storage("get topic", Some(id), e))?;

        row.ok_or_else(|| TaskStoreError::not_found(ENTITY, id))?
            .try_into()
    }

    /// Overwrites the mutable columns of a topic and refreshes `updated_at`.
    ///
    /// `user_id` and `created_at` are never changed.
    pub async fn update_topic(&self, topic: &Topic) -> TaskStoreResult<Topic> {
        self.ensure_initialized().await?;

        let mut stored = topic.clone();
        stored.updated_at = Utc::now();
        let row = TopicRow::from(&stored);

        let result = sqlx::query(
            "UPDATE topics SET title = ?, description = ?, category = ?, status = ?, \
             is_public = ?, likes = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&row.title)
        .bind(&row.description)
        .bind(&row.category)
        .bind(&row.status)
        .bind(row.is_public)
        .bind(row.likes)
        .bind(&row.updated_at)
        .bind(&row.id)
        .execute(self.db.pool())
        .await
        .map_err(|e| TaskStoreError::storage("update topic", Some(&topic.id), e))?;

        if result.rows_affected() == 0 {
            return Err(TaskStoreError::not_found(ENTITY, &topic.id));
        }

        tracing::debug!(id = %topic.id, "Topic updated");
        Ok(stored)
    }

    /// Deletes a topic. Removing an unknown id is not an error.
    pub async fn remove_topic(&self, id: &str) -> TaskStoreResult<()> {
        self.ensure_initialized().await?;

        let result = sqlx::query("DELETE FROM topics WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await
            .map_err(|e| TaskStoreError::storage("delete topic", Some(id), e))?;

        tracing::debug!(id, removed = result.rows_affected(), "Topic removed");
        Ok(())
    }
}

#[async_trait]
impl TopicStore for TopicStorage {
    async fn initialize(&self) -> TaskStoreResult<()> {
        TopicStorage::initialize(self).await
    }

    async fn create_topic(&self, topic: &Topic) -> TaskStoreResult<()> {
        TopicStorage::create_topic(self, topic).await
    }

    async fn get_all_public_topics(&self) -> TaskStoreResult<Vec<Topic>> {
        TopicStorage::get_all_public_topics(self).await
    }

    async fn get_user_topics(&self, user_id: &str) -> TaskStoreResult<Vec<Topic>> {
        TopicStorage::get_user_topics(self, user_id).await
    }

    async fn get_topic_by_id(&self, id: &str) -> TaskStoreResult<Topic> {
        TopicStorage::get_topic_by_id(self, id).await
    }

    async fn update_topic(&self, topic: &Topic) -> TaskStoreResult<Topic> {
        TopicStorage::update_topic(self, topic).await
    }

    async fn remove_topic(&self, id: &str) -> TaskStoreResult<()> {
        TopicStorage::remove_topic(self, id).await
    }
}
