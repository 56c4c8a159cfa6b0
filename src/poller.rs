//! Run polling for cite-chat
//!
//! A run is an asynchronous job on the service side. [`RunPoller::wait`]
//! re-reads its status at a fixed interval until it leaves the pending set
//! (`queued`, `in_progress`). The wait is bounded by a deadline and a maximum
//! number of status checks, and stops as soon as its cancellation token fires.

use crate::assistant::{AssistantApi, Run, RunStatus};
use crate::config::PollingConfig;
use crate::error::{CiteChatError, Result};

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Waits for runs to finish
#[derive(Debug, Clone)]
pub struct RunPoller {
    interval: Duration,
    timeout: Duration,
    max_attempts: u32,
}

impl RunPoller {
    /// Create a poller
    ///
    /// # Arguments
    ///
    /// * `interval` - Delay between status checks
    /// * `timeout` - Overall time budget for one wait
    /// * `max_attempts` - Maximum number of status checks for one wait
    pub fn new(interval: Duration, timeout: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            timeout,
            max_attempts,
        }
    }

    /// Create a poller from the `polling` configuration section
    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.interval(), config.timeout(), config.max_attempts)
    }

    /// Wait until `run` on `thread_id` is no longer pending
    ///
    /// A run that is already out of the pending set is returned (or
    /// rejected) without any remote call.
    ///
    /// # Returns
    ///
    /// Returns the run once its status is `completed`
    ///
    /// # Errors
    ///
    /// - `RunNotCompleted` if the run ends in any other status
    /// - `PollTimeout` / `PollAttemptsExceeded` if the budget runs out
    /// - `Cancelled` if `cancel` fires
    /// - any error from `retrieve_run`
    pub async fn wait(
        &self,
        api: &dyn AssistantApi,
        thread_id: &str,
        mut run: Run,
        cancel: &CancellationToken,
    ) -> Result<Run> {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut attempts: u32 = 0;

        while run.status.is_pending() {
            if cancel.is_cancelled() {
                return Err(CiteChatError::Cancelled { run_id: run.id }.into());
            }
            if attempts >= self.max_attempts {
                tracing::warn!(run_id = %run.id, attempts, "Giving up on pending run");
                return Err(CiteChatError::PollAttemptsExceeded {
                    run_id: run.id,
                    attempts,
                }
                .into());
            }
            if Instant::now() >= deadline {
                tracing::warn!(run_id = %run.id, "Run did not finish before deadline");
                return Err(CiteChatError::PollTimeout {
                    run_id: run.id,
                    elapsed_secs: started.elapsed().as_secs(),
                }
                .into());
            }

            let previous = run.status;
            let retrieved = tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(CiteChatError::Cancelled { run_id: run.id.clone() }.into());
                }
                retrieved = api.retrieve_run(thread_id, &run.id) => retrieved?,
            };
            run = retrieved;
            attempts += 1;

            if run.status != previous {
                tracing::debug!(
                    run_id = %run.id,
                    from = %previous,
                    to = %run.status,
                    attempts,
                    "Run status changed"
                );
            }

            if run.status.is_pending() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(CiteChatError::Cancelled { run_id: run.id }.into());
                    }
                    _ = tokio::time::sleep_until(deadline.min(Instant::now() + self.interval)) => {}
                }
            }
        }

        match run.status {
            RunStatus::Completed => {
                tracing::info!(
                    run_id = %run.id,
                    attempts,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Run completed"
                );
                Ok(run)
            }
            status => {
                let message = run
                    .last_error
                    .as_ref()
                    .map(|e| {
                        if e.code.is_empty() {
                            e.message.clone()
                        } else {
                            format!("{}: {}", e.code, e.message)
                        }
                    })
                    .unwrap_or_else(|| "no reason given".to_string());
                tracing::warn!(run_id = %run.id, %status, "Run did not complete: {}", message);
                Err(CiteChatError::RunNotCompleted {
                    run_id: run.id,
                    status,
                    message,
                }
                .into())
            }
        }
    }
}

impl Default for RunPoller {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{MockAssistantApi, RunError};
    use mockall::Sequence;

    fn fast_poller() -> RunPoller {
        RunPoller::new(Duration::from_millis(1), Duration::from_secs(5), 50)
    }

    fn run(status: RunStatus) -> Run {
        Run::new("run_1", "thread_1", status)
    }

    fn expect_statuses(api: &mut MockAssistantApi, statuses: &[RunStatus]) {
        let mut seq = Sequence::new();
        for status in statuses.iter().copied() {
            api.expect_retrieve_run()
                .withf(|thread_id, run_id| thread_id == "thread_1" && run_id == "run_1")
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_, _| Ok(run(status)));
        }
    }

    #[tokio::test]
    async fn test_wait_stops_when_status_leaves_pending_set() {
        let mut api = MockAssistantApi::new();
        expect_statuses(
            &mut api,
            &[RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed],
        );

        let done = fast_poller()
            .wait(&api, "thread_1", run(RunStatus::Queued), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(done.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_for_completed_run() {
        let api = MockAssistantApi::new();
        let done = fast_poller()
            .wait(&api, "thread_1", run(RunStatus::Completed), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(done.id, "run_1");
    }

    #[tokio::test]
    async fn test_wait_reports_failed_run() {
        let mut api = MockAssistantApi::new();
        api.expect_retrieve_run().times(1).returning(|_, _| {
            let mut failed = run(RunStatus::Failed);
            failed.last_error = Some(RunError {
                code: "server_error".to_string(),
                message: "boom".to_string(),
            });
            Ok(failed)
        });

        let err = fast_poller()
            .wait(&api, "thread_1", run(RunStatus::InProgress), &CancellationToken::new())
            .await
            .unwrap_err();
        match err.downcast_ref::<CiteChatError>() {
            Some(CiteChatError::RunNotCompleted {
                status, message, ..
            }) => {
                assert_eq!(*status, RunStatus::Failed);
                assert_eq!(message, "server_error: boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_rejects_cancelled_and_expired_runs() {
        for terminal in [RunStatus::Cancelled, RunStatus::Expired, RunStatus::RequiresAction] {
            let mut api = MockAssistantApi::new();
            expect_statuses(&mut api, &[terminal]);

            let err = fast_poller()
                .wait(&api, "thread_1", run(RunStatus::Queued), &CancellationToken::new())
                .await
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<CiteChatError>(),
                Some(CiteChatError::RunNotCompleted { status, .. }) if *status == terminal
            ));
        }
    }

    #[tokio::test]
    async fn test_wait_gives_up_after_max_attempts() {
        let mut api = MockAssistantApi::new();
        api.expect_retrieve_run()
            .times(3)
            .returning(|_, _| Ok(run(RunStatus::InProgress)));

        let poller = RunPoller::new(Duration::from_millis(1), Duration::from_secs(5), 3);
        let err = poller
            .wait(&api, "thread_1", run(RunStatus::Queued), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CiteChatError>(),
            Some(CiteChatError::PollAttemptsExceeded { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let mut api = MockAssistantApi::new();
        api.expect_retrieve_run()
            .returning(|_, _| Ok(run(RunStatus::InProgress)));

        let poller = RunPoller::new(Duration::from_millis(20), Duration::from_millis(50), 1000);
        let err = poller
            .wait(&api, "thread_1", run(RunStatus::Queued), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CiteChatError>(),
            Some(CiteChatError::PollTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_wait_cancelled_before_first_check() {
        let api = MockAssistantApi::new();
        let token = CancellationToken::new();
        token.cancel();

        let err = fast_poller()
            .wait(&api, "thread_1", run(RunStatus::Queued), &token)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CiteChatError>(),
            Some(CiteChatError::Cancelled { .. })
        ));
    }

    #[tokio::test]
    async fn test_wait_cancelled_while_sleeping() {
        let mut api = MockAssistantApi::new();
        api.expect_retrieve_run()
            .times(1)
            .returning(|_, _| Ok(run(RunStatus::InProgress)));

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let poller = RunPoller::new(Duration::from_secs(60), Duration::from_secs(120), 10);
        let err = poller
            .wait(&api, "thread_1", run(RunStatus::Queued), &token)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CiteChatError>(),
            Some(CiteChatError::Cancelled { .. })
        ));
    }

    #[tokio::test]
    async fn test_wait_propagates_retrieve_errors() {
        let mut api = MockAssistantApi::new();
        api.expect_retrieve_run()
            .times(1)
            .returning(|_, _| Err(CiteChatError::service("retrieve_run", 500, "oops").into()));

        let err = fast_poller()
            .wait(&api, "thread_1", run(RunStatus::Queued), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("oops"));
    }
}
