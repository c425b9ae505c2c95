pub mod catalog;
pub mod clock;
pub mod messages;
pub mod polling;

use crate::{
    client::{HttpRemoteClient, RemoteApi},
    config::GhiblioConfig,
    error::{GhiblioError, Result},
    models::{ApiRequest, GenerationRequest, SubmitResponse, ToolDefinition, ToolName, ToolResult},
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::sync::Arc;

pub use clock::{Clock, ManualClock, SystemClock};
pub use polling::{poll_interval, PollOutcome, PollState, TaskPoller, CHECK_CEILING};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckTaskArgs {
    task_id: String,
}

/// Exposes the generation service as three tools and owns the polling state.
pub struct Orchestrator {
    config: Arc<GhiblioConfig>,
    api: Arc<dyn RemoteApi>,
    clock: Arc<dyn Clock>,
    poll_state: PollState,
}

impl Orchestrator {
    pub fn new(config: GhiblioConfig) -> Result<Self> {
        let api = HttpRemoteClient::new(&config)?;
        log::info!("Using generation API at {}", api.base_url());
        Ok(Self::with_parts(config, Arc::new(api), Arc::new(SystemClock)))
    }

    pub fn with_parts(config: GhiblioConfig, api: Arc<dyn RemoteApi>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: Arc::new(config),
            api,
            clock,
            poll_state: PollState::new(),
        }
    }

    pub fn config(&self) -> &GhiblioConfig {
        &self.config
    }

    pub fn poll_state(&self) -> &PollState {
        &self.poll_state
    }

    pub fn tools(&self) -> Vec<ToolDefinition> {
        catalog::definitions()
    }

    /// Runs the named tool. Never fails: every error becomes an
    /// error-flagged `Error: <message>` result.
    pub async fn invoke(&self, name: &str, args: Value, call_auth: Option<&str>) -> ToolResult {
        match self.dispatch(name, args, call_auth).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("Tool {} failed: {}", name, e);
                ToolResult::error(e)
            }
        }
    }

    async fn dispatch(&self, name: &str, args: Value, call_auth: Option<&str>) -> Result<ToolResult> {
        let tool: ToolName = name.parse()?;
        let credential = self
            .config
            .credential(call_auth)
            .ok_or(GhiblioError::MissingCredential)?;

        match tool {
            ToolName::ImageGenerate => {
                let request: GenerationRequest = parse_args(args)?;
                self.submit_generation(credential, request).await
            }
            ToolName::CheckTask => {
                let CheckTaskArgs { task_id } = parse_args(args)?;
                self.check_task(credential, &task_id).await
            }
            ToolName::Remains => self.query_remains(credential).await,
        }
    }

    /// One `generate` call; never polls.
    pub async fn submit_generation(
        &self,
        credential: &str,
        request: GenerationRequest,
    ) -> Result<ToolResult> {
        request.validate()?;
        let body = request.to_body(&self.config.source);

        let text = match self.api.call(credential, ApiRequest::post("generate", body)).await {
            Ok(data) => {
                let submitted: SubmitResponse = serde_json::from_value(data).map_err(|e| {
                    GhiblioError::ResponseError(format!("generate response has no taskId: {}", e))
                })?;
                messages::task_submitted(&submitted.task_id)
            }
            Err(e) => messages::submit_failed(&e.error_message),
        };

        log::info!("Generation task submit result: {}", text);
        Ok(ToolResult::text(text))
    }

    /// Long-polls `task_id` for at most [`CHECK_CEILING`], then answers with
    /// either a terminal message or "still pending, call again".
    pub async fn check_task(&self, credential: &str, task_id: &str) -> Result<ToolResult> {
        let started = self.clock.now();
        if task_id.trim().is_empty() {
            return Err(GhiblioError::InvalidArguments("taskId must not be empty".into()));
        }

        let Some(_claim) = self.poll_state.try_begin(task_id) else {
            log::warn!("Task {} is already being checked, not starting a second poll", task_id);
            return Ok(ToolResult::text(messages::task_busy(task_id)));
        };

        let attempt = self.poll_state.record_attempt(task_id);
        let interval = poll_interval(attempt);
        log::info!(
            "Checking task {}, attempt {}, poll interval {}ms",
            task_id,
            attempt,
            interval.as_millis()
        );

        let (outcome, queries) =
            TaskPoller::new(self.api.as_ref(), self.clock.as_ref(), credential, task_id, interval)
                .started_at(started)
                .run()
                .await;

        if outcome.is_terminal() {
            self.poll_state.finish(task_id);
        }

        let text = match outcome {
            PollOutcome::Completed(urls) => messages::task_completed(task_id, &urls),
            PollOutcome::Failed { status, reason } => {
                log::warn!("Task {} ended with {}", task_id, status);
                messages::task_failed(task_id, &reason)
            }
            PollOutcome::StillPending => messages::task_still_pending(task_id),
            PollOutcome::Errored(e) => return Err(e.into()),
        };

        log::info!("Task {} check returned after {} queries: {}", task_id, queries, text);
        Ok(ToolResult::text(text))
    }

    pub async fn query_remains(&self, credential: &str) -> Result<ToolResult> {
        let remains = self.api.call(credential, ApiRequest::get("remains")).await?;
        Ok(ToolResult::text(messages::remaining_quota(&remains)))
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| GhiblioError::InvalidArguments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_arguments_read_as_empty_object() {
        let request: GenerationRequest = parse_args(Value::Null).unwrap();
        assert_eq!(request, GenerationRequest::default());
    }

    #[test]
    fn missing_task_id_is_invalid() {
        let err = parse_args::<CheckTaskArgs>(json!({})).unwrap_err();
        assert!(matches!(err, GhiblioError::InvalidArguments(_)));

        let args: CheckTaskArgs = parse_args(json!({"taskId": "T9"})).unwrap();
        assert_eq!(args.task_id, "T9");
    }
}
