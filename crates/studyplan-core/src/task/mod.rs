//! Study tasks: a name, a due date, and a completion flag.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Remote table holding tasks.
pub const TASKS_TABLE: &str = "tasks";

/// A task row as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub user_id: String,
    pub task_name: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; the service assigns `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub user_id: String,
    pub task_name: String,
    pub due_date: NaiveDate,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl NewTask {
    /// Validate the name and build an incomplete task stamped `now`.
    pub fn new(
        user_id: &str,
        task_name: &str,
        due_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let name = task_name.trim();
        if name.is_empty() {
            return Err(ValidationError::TaskNameRequired);
        }
        Ok(Self {
            user_id: user_id.to_string(),
            task_name: name.to_string(),
            due_date,
            completed: false,
            created_at: now,
        })
    }
}

/// Parse a `YYYY-MM-DD` due date entered by a user.
pub fn parse_due_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::DueDateRequired);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDueDate(input.to_string()))
}
