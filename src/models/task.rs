use serde::{Deserialize, Serialize};
use std::fmt;

use super::remote::RemoteError;

/// Task status as reported by `task_info`. Anything the service adds later
/// lands in `Unknown` and is polled like `Pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Success,
    CreateTaskFailed,
    GenerateFailed,
    Unknown(String),
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PENDING" => TaskStatus::Pending,
            "SUCCESS" => TaskStatus::Success,
            "CREATE_TASK_FAILED" => TaskStatus::CreateTaskFailed,
            "GENERATE_FAILED" => TaskStatus::GenerateFailed,
            other => TaskStatus::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Success => "SUCCESS",
            TaskStatus::CreateTaskFailed => "CREATE_TASK_FAILED",
            TaskStatus::GenerateFailed => "GENERATE_FAILED",
            TaskStatus::Unknown(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Success | TaskStatus::CreateTaskFailed | TaskStatus::GenerateFailed
        )
    }

    /// Fallback explanation when a failed task carries no message of its own.
    pub fn failure_phrase(&self) -> Option<&'static str> {
        match self {
            TaskStatus::CreateTaskFailed => Some("failed to create the task"),
            TaskStatus::GenerateFailed => Some("image generation failed"),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `data` of a successful `generate` call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub task_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub result_urls: Option<Vec<String>>,
}

/// `data` of a `task_info` call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    #[serde(default)]
    pub status: String,
    pub response: Option<TaskResult>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Pending(TaskStatus),
    Success(Vec<String>),
    Failure { status: TaskStatus, reason: String },
}

impl TaskOutcome {
    /// A `SUCCESS` without `response.resultUrls` is malformed data, not a
    /// finished task with no images.
    pub fn from_info(info: TaskInfo) -> Result<Self, RemoteError> {
        let status = TaskStatus::parse(&info.status);
        let outcome = match status {
            TaskStatus::Success => {
                let urls = info
                    .response
                    .and_then(|r| r.result_urls)
                    .ok_or_else(|| {
                        RemoteError::new(
                            500,
                            "Malformed task_info response: SUCCESS without resultUrls",
                            "ParseError",
                        )
                    })?;
                TaskOutcome::Success(urls)
            }
            TaskStatus::CreateTaskFailed | TaskStatus::GenerateFailed => {
                let reason = info
                    .error_message
                    .filter(|message| !message.is_empty())
                    .or_else(|| status.failure_phrase().map(String::from))
                    .unwrap_or_default();
                TaskOutcome::Failure { status, reason }
            }
            _ => TaskOutcome::Pending(status),
        };
        Ok(outcome)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskOutcome::Pending(_))
    }
}
