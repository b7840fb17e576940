//! Task (todo) entity definitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a Task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not done yet.
    #[default]
    Pending,
    /// Done.
    Completed,
    /// Dropped by the user.
    Cancelled,
}

impl TaskStatus {
    /// All statuses, in storage order.
    pub const ALL: [TaskStatus; 3] = [Self::Pending, Self::Completed, Self::Cancelled];

    /// Converts the status to a string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from its storage string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled, time-boxed user activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, chosen by the caller.
    pub id: String,
    /// Title shown in lists.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Tags in the order the user entered them.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Start of the time box, `HH:MM`.
    pub start_time: String,
    /// End of the time box, `HH:MM`.
    pub end_time: String,
    /// Day the task is scheduled on, `YYYY-MM-DD`.
    pub date: String,
    /// Current status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Weekday identifiers the reminder fires on.
    #[serde(default)]
    pub reminder_days: Vec<String>,
    /// Linked category, if any.
    pub category_id: Option<String>,
    /// Linked goal, if any.
    pub goal_id: Option<String>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new pending task with a generated id.
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            date: date.into(),
            status: TaskStatus::default(),
            reminder_days: Vec::new(),
            category_id: None,
            goal_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the reminder weekdays.
    pub fn with_reminder_days<I, S>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reminder_days = days.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Links the task to a category.
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Links the task to a goal.
    pub fn with_goal(mut self, goal_id: impl Into<String>) -> Self {
        self.goal_id = Some(goal_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_creation() {
        let task = Task::new("Morning run", "2025-01-01", "07:00", "07:45");

        assert!(!task.id.is_empty());
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.tags.is_empty());
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn test_status_round_trip() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("pending"), None);
        assert_eq!(TaskStatus::parse("DONE"), None);
    }

    #[test]
    fn test_serde_wire_shape() {
        let task = Task::new("Read", "2025-01-01", "20:00", "21:00")
            .with_id("t-1")
            .with_status(TaskStatus::Completed);
        let value = serde_json::to_value(&task).unwrap();

        assert_eq!(value["id"], "t-1");
        assert_eq!(value["status"], "COMPLETED");
        assert_eq!(value["startTime"], "20:00");
        assert!(value["reminderDays"].is_array());
    }
}
