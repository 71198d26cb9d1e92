//! Polling a remote job until it reaches a terminal state.
//!
//! The loop itself knows nothing about HTTP: it is handed a closure that
//! fetches one [`JobSnapshot`] and decides, from the [`PollPolicy`], how long
//! to wait before asking again and when to give up.

use std::future::Future;
use std::time::Duration;

use super::error::TranscriptionError;
use super::job::{JobSnapshot, JobStatus};

/// Default polling interval (AssemblyAI recommends 3 seconds between polls)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default number of status checks before giving up (5 minutes at 3-second intervals)
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 100;

/// Default upper bound for a single wait when backoff is enabled
pub const DEFAULT_MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// How often to check a job and when to stop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Wait before the second status check.
    pub interval: Duration,
    /// Total status checks allowed; `None` polls until the job is terminal.
    pub max_attempts: Option<u32>,
    /// Factor applied to the wait after every check. Values below 1.0 are treated as 1.0.
    pub backoff_multiplier: f64,
    /// Cap on any single wait.
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: Some(DEFAULT_MAX_POLL_ATTEMPTS),
            backoff_multiplier: 1.0,
            max_interval: DEFAULT_MAX_POLL_INTERVAL,
        }
    }
}

impl PollPolicy {
    /// Fixed interval, no attempt bound.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            backoff_multiplier: 1.0,
            max_interval: interval,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Wait before the next check, given how many waits already happened.
    pub fn delay(&self, waits_done: u32) -> Duration {
        let multiplier = self.backoff_multiplier.max(1.0);
        let exponent = i32::try_from(waits_done).unwrap_or(i32::MAX);
        let secs = self.interval.as_secs_f64() * multiplier.powi(exponent);
        let cap = self.max_interval.max(self.interval);

        if !secs.is_finite() || secs >= cap.as_secs_f64() {
            cap
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Checks a job until it completes, fails, or the policy runs out.
///
/// `check` receives the 1-based attempt number. The first check runs
/// immediately; every non-terminal status is followed by one sleep.
pub async fn poll_until_terminal<F, Fut>(
    policy: &PollPolicy,
    mut check: F,
) -> Result<String, TranscriptionError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<JobSnapshot, TranscriptionError>>,
{
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let snapshot = check(attempts).await?;

        tracing::debug!(
            attempt = attempts,
            max_attempts = ?policy.max_attempts,
            status = %snapshot.status,
            "Polled transcription job"
        );

        match snapshot.status {
            JobStatus::Completed => {
                let text = snapshot.text.ok_or_else(|| {
                    TranscriptionError::MalformedResponse(
                        "completed status but no transcript text".to_string(),
                    )
                })?;
                return Ok(text.trim().to_string());
            }
            JobStatus::Error => {
                let error = snapshot
                    .error
                    .unwrap_or_else(|| "Unknown transcription error".to_string());
                return Err(TranscriptionError::JobFailed(error));
            }
            _ => {
                if policy.exhausted(attempts) {
                    return Err(TranscriptionError::PollTimeout { attempts });
                }
                tokio::time::sleep(policy.delay(attempts - 1)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn snapshot(status: &str, text: Option<&str>, error: Option<&str>) -> JobSnapshot {
        JobSnapshot {
            status: JobStatus::parse(status),
            text: text.map(str::to_string),
            error: error.map(str::to_string),
        }
    }

    fn scripted(
        responses: Vec<JobSnapshot>,
    ) -> (
        Arc<Mutex<VecDeque<JobSnapshot>>>,
        Arc<Mutex<u32>>,
    ) {
        (
            Arc::new(Mutex::new(responses.into_iter().collect())),
            Arc::new(Mutex::new(0)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_pending_checks_then_completed() {
        let (queue, calls) = scripted(vec![
            snapshot("processing", None, None),
            snapshot("processing", None, None),
            snapshot("completed", Some(" final text "), None),
        ]);
        let policy = PollPolicy::fixed(Duration::from_secs(3));
        let started = tokio::time::Instant::now();

        let result = poll_until_terminal(&policy, |_| {
            let queue = Arc::clone(&queue);
            let calls = Arc::clone(&calls);
            async move {
                *calls.lock().unwrap() += 1;
                Ok::<_, TranscriptionError>(queue.lock().unwrap().pop_front().unwrap())
            }
        })
        .await;

        assert_eq!(result.unwrap(), "final text");
        assert_eq!(*calls.lock().unwrap(), 3);
        // Exactly two waits of one interval each.
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_completion_does_not_sleep() {
        let policy = PollPolicy::default();
        let started = tokio::time::Instant::now();

        let result = poll_until_terminal(&policy, |_| async {
            Ok::<_, TranscriptionError>(snapshot("completed", Some("hello world"), None))
        })
        .await;

        assert_eq!(result.unwrap(), "hello world");
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_surfaces_remote_message() {
        let policy = PollPolicy::default();

        let result = poll_until_terminal(&policy, |_| async {
            Ok::<_, TranscriptionError>(snapshot("error", None, Some("bad audio")))
        })
        .await;

        match result {
            Err(TranscriptionError::JobFailed(message)) => assert_eq!(message, "bad audio"),
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let policy = PollPolicy::fixed(Duration::from_secs(1)).with_max_attempts(4);
        let calls = Arc::new(Mutex::new(0u32));
        let started = tokio::time::Instant::now();

        let result = poll_until_terminal(&policy, |_| {
            let calls = Arc::clone(&calls);
            async move {
                *calls.lock().unwrap() += 1;
                Ok::<_, TranscriptionError>(snapshot("queued", None, None))
            }
        })
        .await;

        assert!(matches!(result, Err(TranscriptionError::PollTimeout { attempts: 4 })));
        assert_eq!(*calls.lock().unwrap(), 4);
        // No wait after the last check.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_without_text_is_malformed() {
        let result = poll_until_terminal(&PollPolicy::default(), |_| async {
            Ok::<_, TranscriptionError>(snapshot("completed", None, None))
        })
        .await;

        assert!(matches!(result, Err(TranscriptionError::MalformedResponse(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_error_stops_polling() {
        let result = poll_until_terminal(&PollPolicy::default(), |_| async {
            Err::<JobSnapshot, _>(TranscriptionError::Network("connection reset".to_string()))
        })
        .await;

        assert!(matches!(result, Err(TranscriptionError::Network(_))));
    }

    #[test]
    fn test_fixed_policy_delay_is_constant() {
        let policy = PollPolicy::fixed(Duration::from_secs(3));
        assert_eq!(policy.delay(0), Duration::from_secs(3));
        assert_eq!(policy.delay(10), Duration::from_secs(3));
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let policy = PollPolicy {
            interval: Duration::from_secs(1),
            max_attempts: None,
            backoff_multiplier: 2.0,
            max_interval: Duration::from_secs(5),
        };
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(3), Duration::from_secs(5));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_multiplier_below_one_does_not_shrink_delay() {
        let policy = PollPolicy {
            backoff_multiplier: 0.5,
            ..PollPolicy::default()
        };
        assert_eq!(policy.delay(4), DEFAULT_POLL_INTERVAL);
    }
}
