//! Table definitions and row mapping.

use chrono::{DateTime, Utc};
use entities::{Task, TaskStatus, Topic};
use sqlx::FromRow;

use crate::{codec, TaskStoreError, TaskStoreResult};

pub const TASKS_TABLE: &str = "tasks";

pub const TOPICS_TABLE: &str = "topics";

pub const CREATE_TASKS_SQL: &str = r#"
CREATE TABLE tasks (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT DEFAULT '',
    tags TEXT NOT NULL DEFAULT '[]',
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING',
    reminder_days TEXT NOT NULL DEFAULT '[]',
    category_id TEXT DEFAULT NULL,
    goal_id TEXT DEFAULT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK(date LIKE '____-__-__'),
    CHECK(start_time LIKE '__:__'),
    CHECK(end_time LIKE '__:__'),
    CHECK(status IN ('PENDING', 'COMPLETED', 'CANCELLED'))
)
"#;

pub const CREATE_TOPICS_SQL: &str = r#"
CREATE TABLE topics (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    user_id TEXT NOT NULL,
    status TEXT DEFAULT NULL,
    category TEXT DEFAULT NULL,
    description TEXT DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    likes INTEGER DEFAULT 0,
    is_public INTEGER NOT NULL DEFAULT 0
)
"#;

pub const TASK_COLUMNS: &str = "id, title, description, tags, start_time, end_time, date, \
                                status, reminder_days, category_id, goal_id, created_at, \
                                updated_at";

pub const TOPIC_COLUMNS: &str = "id, title, user_id, status, category, description, created_at, \
                                 updated_at, likes, is_public";

fn parse_timestamp(
    entity_type: &'static str,
    id: &str,
    column: &'static str,
    value: &str,
) -> TaskStoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TaskStoreError::corrupt_row(entity_type, id, column, e))
}

/// Database row for Task
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub date: String,
    pub status: String,
    pub reminder_days: Option<String>,
    pub category_id: Option<String>,
    pub goal_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: Some(task.description.clone()),
            tags: Some(codec::encode(&task.tags)),
            start_time: task.start_time.clone(),
            end_time: task.end_time.clone(),
            date: task.date.clone(),
            status: task.status.as_str().to_string(),
            reminder_days: Some(codec::encode(&task.reminder_days)),
            category_id: task.category_id.clone(),
            goal_id: task.goal_id.clone(),
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
        }
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = TaskStoreError;

    fn try_from(row: TaskRow) -> TaskStoreResult<Self> {
        const ENTITY: &str = "Task";

        let tags = codec::decode(row.tags.as_deref())
            .map_err(|e| TaskStoreError::corrupt_row(ENTITY, &row.id, "tags", e))?;
        let reminder_days = codec::decode(row.reminder_days.as_deref())
            .map_err(|e| TaskStoreError::corrupt_row(ENTITY, &row.id, "reminder_days", e))?;
        let status = TaskStatus::parse(&row.status).ok_or_else(|| {
            TaskStoreError::corrupt_row(ENTITY, &row.id, "status", format!("{:?}", row.status))
        })?;
        let created_at = parse_timestamp(ENTITY, &row.id, "created_at", &row.created_at)?;
        let updated_at = parse_timestamp(ENTITY, &row.id, "updated_at", &row.updated_at)?;

        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            tags,
            start_time: row.start_time,
            end_time: row.end_time,
            date: row.date,
            status,
            reminder_days,
            category_id: row.category_id,
            goal_id: row.goal_id,
            created_at,
            updated_at,
        })
    }
}

/// Database row for Topic
#[derive(Debug, Clone, FromRow)]
pub struct TopicRow {
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub status: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub likes: Option<i64>,
    pub is_public: i64,
}

impl From<&Topic> for TopicRow {
    fn from(topic: &Topic) -> Self {
        Self {
            id: topic.id.clone(),
            title: topic.title.clone(),
            user_id: topic.user_id.clone(),
            status: topic.status.clone(),
            category: topic.category.clone(),
            description: Some(topic.description.clone()),
            created_at: topic.created_at.to_rfc3339(),
            updated_at: topic.updated_at.to_rfc3339(),
            likes: Some(i64::from(topic.likes)),
            is_public: i64::from(topic.is_public),
        }
    }
}

impl TryFrom<TopicRow> for Topic {
    type Error = TaskStoreError;

    fn try_from(row: TopicRow) -> TaskStoreResult<Self> {
        const ENTITY: &str = "Topic";

        let likes = u32::try_from(row.likes.unwrap_or(0))
            .map_err(|e| TaskStoreError::corrupt_row(ENTITY, &row.id, "likes", e))?;
        let created_at = parse_timestamp(ENTITY, &row.id, "created_at", &row.created_at)?;
        let updated_at = parse_timestamp(ENTITY, &row.id, "updated_at", &row.updated_at)?;

        Ok(Topic {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            category: row.category,
            is_public: row.is_public != 0,
            status: row.status,
            created_at,
            updated_at,
            likes,
        })
    }
}
