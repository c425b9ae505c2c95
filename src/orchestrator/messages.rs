//! Natural-language replies handed back to the calling agent.

use serde_json::Value;

use crate::models::ToolName;

pub const URL_SEPARATOR: &str = ", ";

pub fn task_submitted(task_id: &str) -> String {
    format!(
        "Image generation task created, task ID: {}.\nCall the {} tool with this task ID to check its progress, and keep checking until the task succeeds.",
        task_id,
        ToolName::CheckTask
    )
}

pub fn submit_failed(reason: &str) -> String {
    format!("Image generation failed, reason: {}", reason)
}

pub fn task_completed(task_id: &str, urls: &[String]) -> String {
    format!(
        "Task {} completed.\nImage URLs: {}\nDisplay the images using Markdown, for example: ![image description](image URL)",
        task_id,
        urls.join(URL_SEPARATOR)
    )
}

pub fn task_failed(task_id: &str, reason: &str) -> String {
    format!("Task {} failed.\nReason: {}", task_id, reason)
}

pub fn task_still_pending(task_id: &str) -> String {
    format!(
        "Image generation task {} is not finished yet.\nCall the {} tool again to keep checking its progress until the task succeeds.",
        task_id,
        ToolName::CheckTask
    )
}

pub fn task_busy(task_id: &str) -> String {
    format!(
        "Task {} is already being checked by another call.\nWait for that call to finish, then call the {} tool again.",
        task_id,
        ToolName::CheckTask
    )
}

/// The quota value is reported as the service sent it.
pub fn remaining_quota(remains: &Value) -> String {
    let value = match remains {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("Remaining image generations for this user: {}", value)
}
