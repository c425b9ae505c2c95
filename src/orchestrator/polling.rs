use crate::{
    client::RemoteApi,
    models::{ApiRequest, RemoteError, TaskInfo, TaskOutcome, TaskStatus},
    orchestrator::clock::Clock,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

pub const BASE_INTERVAL: Duration = Duration::from_millis(10_000);
pub const MIN_INTERVAL: Duration = Duration::from_millis(2_000);
pub const INTERVAL_STEP: Duration = Duration::from_millis(2_500);

/// Longest a single check may keep polling before answering "still pending".
/// The invoking transport gives up on slower responses.
pub const CHECK_CEILING: Duration = Duration::from_secs(25);

/// Wait between `task_info` queries for the given attempt (1-based).
/// Shrinks by 2.5s per attempt from 10s down to a 2s floor.
pub fn poll_interval(attempt: u32) -> Duration {
    let shrink = INTERVAL_STEP.saturating_mul(attempt.saturating_sub(1));
    BASE_INTERVAL.saturating_sub(shrink).max(MIN_INTERVAL)
}

/// Per-task attempt counters, plus the set of tasks with a check in flight.
///
/// A handle absent from the counters was either never polled or already
/// reached a terminal status. Counts are never zero once present.
#[derive(Debug, Default)]
pub struct PollState {
    attempts: Mutex<HashMap<String, u32>>,
    in_flight: Mutex<HashSet<String>>,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic elsewhere never leaves a half-written counter, so a poisoned
    // map is still accurate.
    fn counters(&self) -> MutexGuard<'_, HashMap<String, u32>> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn claims(&self) -> MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn attempts(&self, task_id: &str) -> Option<u32> {
        self.counters().get(task_id).copied()
    }

    /// Bumps the counter for `task_id` and returns the new value.
    pub fn record_attempt(&self, task_id: &str) -> u32 {
        let mut attempts = self.counters();
        let count = attempts.entry(task_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn finish(&self, task_id: &str) {
        self.counters().remove(task_id);
    }

    pub fn tracked(&self) -> usize {
        self.counters().len()
    }

    /// Claims the task for one check. `None` while another check of the same
    /// task is still running.
    pub fn try_begin(&self, task_id: &str) -> Option<InFlight<'_>> {
        if !self.claims().insert(task_id.to_string()) {
            return None;
        }
        Some(InFlight {
            state: self,
            task_id: task_id.to_string(),
        })
    }

    pub fn is_in_flight(&self, task_id: &str) -> bool {
        self.claims().contains(task_id)
    }
}

/// Releases the task's in-flight claim when dropped.
#[derive(Debug)]
pub struct InFlight<'a> {
    state: &'a PollState,
    task_id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.claims().remove(&self.task_id);
    }
}

/// How one check invocation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(Vec<String>),
    Failed { status: TaskStatus, reason: String },
    StillPending,
    Errored(RemoteError),
}

impl PollOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollOutcome::Completed(_) | PollOutcome::Failed { .. })
    }
}

#[derive(Debug)]
enum PollPhase {
    Checking,
    Waiting(Duration),
    Done(PollOutcome),
}

/// Bounded long-poll of one task: query, wait `interval`, query again, until
/// a terminal status or until [`CHECK_CEILING`] has passed since `started`.
/// The last wait is cut short so the final query lands on the ceiling.
pub struct TaskPoller<'a> {
    api: &'a dyn RemoteApi,
    clock: &'a dyn Clock,
    credential: &'a str,
    task_id: &'a str,
    interval: Duration,
    started: Instant,
    queries: u32,
}

impl<'a> TaskPoller<'a> {
    pub fn new(
        api: &'a dyn RemoteApi,
        clock: &'a dyn Clock,
        credential: &'a str,
        task_id: &'a str,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            clock,
            credential,
            task_id,
            interval,
            started: clock.now(),
            queries: 0,
        }
    }

    pub fn started_at(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }

    /// Drives the state machine to completion. Returns the outcome and the
    /// number of `task_info` queries made.
    pub async fn run(mut self) -> (PollOutcome, u32) {
        let mut phase = PollPhase::Checking;
        loop {
            phase = match phase {
                PollPhase::Checking => self.check().await,
                PollPhase::Waiting(wait) => {
                    self.clock.sleep(wait).await;
                    PollPhase::Checking
                }
                PollPhase::Done(outcome) => return (outcome, self.queries),
            };
        }
    }

    async fn check(&mut self) -> PollPhase {
        self.queries += 1;
        let request = ApiRequest::get("task_info")
            .with_query("taskId", self.task_id)
            .with_query("t", self.clock.timestamp_millis().to_string());

        let data = match self.api.call(self.credential, request).await {
            Ok(data) => data,
            Err(e) => return PollPhase::Done(PollOutcome::Errored(e)),
        };

        let info: TaskInfo = match serde_json::from_value(data) {
            Ok(info) => info,
            Err(e) => {
                return PollPhase::Done(PollOutcome::Errored(RemoteError::new(
                    500,
                    format!("Malformed task_info response: {}", e),
                    "ParseError",
                )))
            }
        };

        let outcome = match TaskOutcome::from_info(info) {
            Ok(outcome) => outcome,
            Err(e) => return PollPhase::Done(PollOutcome::Errored(e)),
        };

        match outcome {
            TaskOutcome::Success(urls) => PollPhase::Done(PollOutcome::Completed(urls)),
            TaskOutcome::Failure { status, reason } => {
                PollPhase::Done(PollOutcome::Failed { status, reason })
            }
            TaskOutcome::Pending(status) => {
                if let TaskStatus::Unknown(raw) = &status {
                    log::warn!(
                        "Task {} reported unrecognised status '{}', treating it as pending",
                        self.task_id,
                        raw
                    );
                }

                let elapsed = self.clock.now().saturating_duration_since(self.started);
                if elapsed >= CHECK_CEILING {
                    PollPhase::Done(PollOutcome::StillPending)
                } else {
                    PollPhase::Waiting(self.interval.min(CHECK_CEILING - elapsed))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteResult;
    use crate::orchestrator::clock::ManualClock;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;

    struct Script(Mutex<VecDeque<RemoteResult<Value>>>);

    impl Script {
        fn new(responses: Vec<RemoteResult<Value>>) -> Self {
            Self(Mutex::new(responses.into()))
        }
    }

    #[async_trait]
    impl RemoteApi for Script {
        async fn call(&self, _credential: &str, _request: ApiRequest) -> RemoteResult<Value> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({"status": "PENDING"})))
        }
    }

    #[test]
    fn interval_schedule_shrinks_to_floor() {
        let schedule: Vec<u128> = (1..=6).map(|n| poll_interval(n).as_millis()).collect();
        assert_eq!(schedule, vec![10_000, 7_500, 5_000, 2_500, 2_000, 2_000]);
        assert_eq!(poll_interval(1_000), MIN_INTERVAL);
        assert_eq!(poll_interval(0), BASE_INTERVAL);
    }

    #[test]
    fn counters_increment_and_clear() {
        let state = PollState::new();
        assert_eq!(state.attempts("T1"), None);
        assert_eq!(state.record_attempt("T1"), 1);
        assert_eq!(state.record_attempt("T1"), 2);
        assert_eq!(state.record_attempt("T2"), 1);
        assert_eq!(state.tracked(), 2);

        state.finish("T1");
        assert_eq!(state.attempts("T1"), None);
        assert_eq!(state.record_attempt("T1"), 1);
    }

    #[test]
    fn in_flight_claim_is_exclusive_until_dropped() {
        let state = PollState::new();
        let claim = state.try_begin("T1");
        assert!(claim.is_some());
        assert!(state.is_in_flight("T1"));
        assert!(state.try_begin("T1").is_none());
        assert!(state.try_begin("T2").is_some());

        drop(claim);
        assert!(!state.is_in_flight("T1"));
        assert!(state.try_begin("T1").is_some());
    }

    #[tokio::test]
    async fn pending_then_success_sleeps_between_queries() {
        let api = Script::new(vec![
            Ok(json!({"status": "PENDING"})),
            Ok(json!({"status": "PENDING"})),
            Ok(json!({"status": "SUCCESS", "response": {"resultUrls": ["http://x/1.png"]}})),
        ]);
        let clock = ManualClock::new();

        let (outcome, queries) =
            TaskPoller::new(&api, &clock, "key", "T1", poll_interval(2)).run().await;

        assert_eq!(outcome, PollOutcome::Completed(vec!["http://x/1.png".into()]));
        assert_eq!(queries, 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(7_500); 2]);
    }

    #[tokio::test]
    async fn gives_up_after_ceiling() {
        let api = Script::new(vec![]);
        let clock = ManualClock::new();

        let (outcome, queries) =
            TaskPoller::new(&api, &clock, "key", "T2", poll_interval(1)).run().await;

        assert_eq!(outcome, PollOutcome::StillPending);
        // queries at 0s, 10s, 20s and 25s
        assert_eq!(queries, 4);
        assert_eq!(clock.elapsed(), CHECK_CEILING);
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_secs(10),
                Duration::from_secs(10),
                Duration::from_secs(5)
            ]
        );
    }

    #[tokio::test]
    async fn last_wait_is_clamped_to_the_ceiling() {
        let api = Script::new(vec![]);
        let clock = ManualClock::new();
        let started = clock.now();
        clock.advance(Duration::from_secs(24));

        let (outcome, queries) = TaskPoller::new(&api, &clock, "key", "T5", poll_interval(5))
            .started_at(started)
            .run()
            .await;

        assert_eq!(outcome, PollOutcome::StillPending);
        assert_eq!(queries, 2);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn success_without_response_is_malformed() {
        let api = Script::new(vec![Ok(json!({"status": "SUCCESS"}))]);
        let clock = ManualClock::new();

        let (outcome, queries) =
            TaskPoller::new(&api, &clock, "key", "T6", poll_interval(1)).run().await;

        assert!(matches!(outcome, PollOutcome::Errored(e) if e.error_name == "ParseError"));
        assert_eq!(queries, 1);
    }

    #[test]
    fn poisoned_counters_keep_their_count() {
        let state = PollState::new();
        state.record_attempt("T1");

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = state.attempts.lock().unwrap();
            panic!("worker died while holding the counters");
        }));
        assert!(poisoned.is_err());
        assert!(state.attempts.is_poisoned());

        assert_eq!(state.record_attempt("T1"), 2);
        assert_eq!(state.attempts("T1"), Some(2));
    }

    #[tokio::test]
    async fn remote_error_stops_polling() {
        let api = Script::new(vec![Err(RemoteError::new(503, "Service Unavailable", "HttpError"))]);
        let clock = ManualClock::new();

        let (outcome, queries) =
            TaskPoller::new(&api, &clock, "key", "T3", poll_interval(1)).run().await;

        assert!(matches!(outcome, PollOutcome::Errored(e) if e.error_code == 503));
        assert_eq!(queries, 1);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn null_data_is_reported_as_malformed() {
        let api = Script::new(vec![Ok(Value::Null)]);
        let clock = ManualClock::new();

        let (outcome, _) = TaskPoller::new(&api, &clock, "key", "T4", poll_interval(1)).run().await;

        assert!(matches!(outcome, PollOutcome::Errored(e) if e.error_name == "ParseError"));
    }
}
