//! Field-format checks applied before any task write.

use std::sync::LazyLock;

use entities::{Task, TaskStatus};
use regex::Regex;

use crate::{TaskStoreError, TaskStoreResult};

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"));

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}:[0-9]{2}$").expect("valid time pattern"));

/// Fails when `value` is empty after trimming.
pub fn require_non_empty(field: &'static str, value: &str) -> TaskStoreResult<()> {
    if value.trim().is_empty() {
        return Err(TaskStoreError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Checks a `YYYY-MM-DD` date.
pub fn validate_date(date: &str) -> TaskStoreResult<()> {
    if !DATE_RE.is_match(date) {
        return Err(TaskStoreError::validation(
            "date",
            format!("expected YYYY-MM-DD, got {date:?}"),
        ));
    }
    Ok(())
}

/// Checks an `HH:MM` time.
pub fn validate_time(field: &'static str, time: &str) -> TaskStoreResult<()> {
    if !TIME_RE.is_match(time) {
        return Err(TaskStoreError::validation(
            field,
            format!("expected HH:MM, got {time:?}"),
        ));
    }
    Ok(())
}

/// Parses a status string, rejecting anything outside the known set.
pub fn parse_status(status: &str) -> TaskStoreResult<TaskStatus> {
    TaskStatus::parse(status).ok_or_else(|| {
        TaskStoreError::validation(
            "status",
            format!("expected PENDING, COMPLETED or CANCELLED, got {status:?}"),
        )
    })
}

/// Validates every constrained field of a task.
pub fn validate_task(task: &Task) -> TaskStoreResult<()> {
    require_non_empty("id", &task.id)?;
    require_non_empty("title", &task.title)?;
    validate_date(&task.date)?;
    validate_time("startTime", &task.start_time)?;
    validate_time("endTime", &task.end_time)?;
    Ok(())
}
