//! Bounded fixed-interval polling of a remote task.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::stage::StageKind;
use crate::types::{TaskState, TaskStatus};

/// How often, and how many times, a task's status is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    interval: Duration,
    max_attempts: u32,
}

impl PollPolicy {
    /// Both values must be non-zero.
    pub fn new(interval: Duration, max_attempts: u32) -> Result<Self> {
        if interval.is_zero() {
            return Err(PipelineError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if max_attempts == 0 {
            return Err(PipelineError::InvalidConfig(
                "max attempts must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            interval,
            max_attempts,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.poll_interval, config.max_attempts)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Upper bound on how long [`poll`] waits before timing out.
    pub fn worst_case_wait(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

/// Attempt bookkeeping for one poll loop.
#[derive(Debug)]
struct PollSession {
    attempts: u32,
    max_attempts: u32,
}

impl PollSession {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
        }
    }

    /// Count a non-terminal response. Returns `true` once the budget is spent.
    fn record_pending(&mut self) -> bool {
        self.attempts += 1;
        self.attempts >= self.max_attempts
    }
}

/// Poll `query` until the task completes, fails, or the attempt budget runs out.
///
/// The first query goes out immediately, later ones on a fixed interval.
/// `on_progress` and `on_message` fire only for pending responses, and never
/// after this function returns. An error from `query` itself ends the loop
/// and is returned unchanged.
///
/// # Errors
///
/// - [`PipelineError::Protocol`] when a response has `success=false`
/// - [`PipelineError::Task`] when the task reports `status=error`
/// - [`PipelineError::Timeout`] after `max_attempts` pending responses
pub async fn poll<Q, Fut, P, M>(
    stage: StageKind,
    policy: PollPolicy,
    mut query: Q,
    mut on_progress: P,
    mut on_message: M,
) -> Result<TaskStatus>
where
    Q: FnMut() -> Fut,
    Fut: Future<Output = Result<TaskStatus>>,
    P: FnMut(f64),
    M: FnMut(&str),
{
    let mut ticker = tokio::time::interval(policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut session = PollSession::new(policy.max_attempts);

    loop {
        ticker.tick().await;
        let status = query().await?;

        if !status.success {
            return Err(PipelineError::Protocol {
                stage,
                message: status.message_or("status query rejected"),
            });
        }

        match status.status {
            TaskState::Completed => return Ok(status),
            TaskState::Error => {
                return Err(PipelineError::Task {
                    stage,
                    message: status.message_or("task reported an error"),
                })
            }
            TaskState::Pending => {
                on_progress(status.progress);
                if let Some(message) = status.message.as_deref() {
                    on_message(message);
                }
                if session.record_pending() {
                    return Err(PipelineError::Timeout {
                        stage,
                        attempts: session.attempts,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max: u32) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(5), max).unwrap()
    }

    /// Replays `script`, then keeps answering pending.
    fn scripted(
        script: Vec<Result<TaskStatus>>,
        calls: &AtomicU32,
    ) -> impl FnMut() -> std::future::Ready<Result<TaskStatus>> + '_ {
        let mut script = VecDeque::from(script);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let next = script
                .pop_front()
                .unwrap_or_else(|| Ok(TaskStatus::pending(0.0)));
            std::future::ready(next)
        }
    }

    #[test]
    fn test_policy_validation() {
        assert!(PollPolicy::new(Duration::ZERO, 5).is_err());
        assert!(PollPolicy::new(Duration::from_secs(1), 0).is_err());
        let p = PollPolicy::new(Duration::from_secs(2), 30).unwrap();
        assert_eq!(p.worst_case_wait(), Duration::from_secs(60));
        assert_eq!(PollPolicy::default().max_attempts(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_after_pending() {
        let calls = AtomicU32::new(0);
        let mut progress = Vec::new();
        let mut messages = Vec::new();

        let result = poll(
            StageKind::Narration,
            policy(10),
            scripted(
                vec![
                    Ok(TaskStatus::pending(30.0).with_message("Generating narration...")),
                    Ok(TaskStatus::pending(70.0)),
                    Ok(TaskStatus::completed().with_audio_url("/output/audio/n.wav")),
                ],
                &calls,
            ),
            |p| progress.push(p),
            |m| messages.push(m.to_string()),
        )
        .await
        .unwrap();

        assert_eq!(result.audio_url.as_deref(), Some("/output/audio/n.wav"));
        assert_eq!(progress, vec![30.0, 70.0]);
        assert_eq!(messages, vec!["Generating narration..."]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_query_is_immediate_then_interval() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();
        poll(
            StageKind::Subtitles,
            policy(10),
            scripted(
                vec![Ok(TaskStatus::pending(0.0)), Ok(TaskStatus::completed())],
                &calls,
            ),
            |_| {},
            |_| {},
        )
        .await
        .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let err = poll(
            StageKind::Video,
            policy(4),
            scripted(Vec::new(), &calls),
            |_| {},
            |_| {},
        )
        .await
        .unwrap_err();

        match err {
            PipelineError::Timeout { stage, attempts } => {
                assert_eq!(stage, StageKind::Video);
                assert_eq!(attempts, 4);
            }
            other => panic!("Expected Timeout, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_response_fails_without_retry() {
        let calls = AtomicU32::new(0);
        let mut progress_calls = 0;
        let err = poll(
            StageKind::Images,
            policy(10),
            scripted(vec![Ok(TaskStatus::rejected("quota exceeded"))], &calls),
            |_| progress_calls += 1,
            |_| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Protocol { ref message, .. } if message == "quota exceeded"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(progress_calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_error_status() {
        let calls = AtomicU32::new(0);
        let err = poll(
            StageKind::Narration,
            policy(10),
            scripted(
                vec![
                    Ok(TaskStatus::pending(10.0)),
                    Ok(TaskStatus::failed("No story data available")),
                ],
                &calls,
            ),
            |_| {},
            |_| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Task { ref message, .. } if message == "No story data available"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_error_stops_loop() {
        let calls = AtomicU32::new(0);
        let err = poll(
            StageKind::Images,
            policy(10),
            scripted(
                vec![
                    Ok(TaskStatus::pending(5.0)),
                    Err(PipelineError::InvalidResponse("garbled".into())),
                ],
                &calls,
            ),
            |_| {},
            |_| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::InvalidResponse(_)));
        // Let virtual time run well past the interval; nothing else is queried.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_on_last_allowed_attempt() {
        let calls = AtomicU32::new(0);
        let result = poll(
            StageKind::Video,
            policy(3),
            scripted(
                vec![
                    Ok(TaskStatus::pending(10.0)),
                    Ok(TaskStatus::pending(50.0)),
                    Ok(TaskStatus::completed().with_video_url("/output/videos/v.mp4")),
                ],
                &calls,
            ),
            |_| {},
            |_| {},
        )
        .await;
        assert!(result.is_ok());
    }
}
