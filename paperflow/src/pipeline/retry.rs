//! Retry/timeout executor.
//!
//! [`execute_with_policy`] runs one collaborator call under the shared
//! [`RetryPolicy`]: every attempt is bounded by the policy timeout, failures
//! and timeouts are reported to an [`AttemptRecorder`], and the call is
//! retried with backoff until it succeeds or the attempts run out.

use super::store::AttemptRecorder;
use crate::config::RetryPolicy;
use crate::core::PipelineStage;
use crate::errors::{AgentError, SupervisorError};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{debug, info, warn};

/// Executes `operation` with per-attempt timeout and retry.
///
/// The operation is called once per attempt and must produce a fresh future
/// each time. A panic inside the future counts as a failed attempt.
///
/// Returns the first successful value, or
/// [`SupervisorError::RetryExhausted`] after `max_retries + 1` attempts. An
/// invalid policy is rejected with [`SupervisorError::Config`] before the
/// first attempt.
pub async fn execute_with_policy<T, F, Fut>(
    policy: &RetryPolicy,
    stage: PipelineStage,
    run_id: &str,
    recorder: &dyn AttemptRecorder,
    mut operation: F,
) -> Result<T, SupervisorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AgentError>>,
{
    policy.validate()?;
    let mut attempt: u32 = 0;

    loop {
        let number = attempt + 1;
        recorder.attempt_started(run_id, stage, number);
        debug!(run_id, stage = %stage, attempt = number, "Starting attempt");

        let outcome = tokio::time::timeout(
            policy.timeout(),
            AssertUnwindSafe(operation()).catch_unwind(),
        )
        .await;

        let error = match outcome {
            Ok(Ok(Ok(value))) => {
                debug!(run_id, stage = %stage, attempt = number, "Stage attempt succeeded");
                if attempt > 0 {
                    info!(run_id, stage = %stage, attempt = number, "Stage recovered after retry");
                }
                return Ok(value);
            }
            Ok(Ok(Err(err))) => SupervisorError::AttemptFailure {
                stage,
                attempt: number,
                message: err.to_string(),
            },
            Ok(Err(panic)) => SupervisorError::AttemptFailure {
                stage,
                attempt: number,
                message: panic_message(panic.as_ref()),
            },
            Err(_) => SupervisorError::AttemptTimeout {
                stage,
                attempt: number,
                timeout_seconds: policy.timeout_seconds,
            },
        };

        warn!(run_id, stage = %stage, attempt = number, error = %error, "Stage attempt failed");
        recorder.attempt_failed(run_id, stage, &error);

        if attempt >= policy.max_retries {
            return Err(SupervisorError::RetryExhausted {
                stage,
                attempts: number,
                last_error: error.to_string(),
                timed_out: error.is_timeout(),
            });
        }

        let delay = policy.delay_for_attempt(attempt);
        info!(
            run_id,
            stage = %stage,
            attempt = number,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Retrying stage"
        );
        recorder.retry_scheduled(run_id, stage, number, delay);
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: <non-string payload>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackoffStrategy;
    use crate::core::AgentStatus;
    use crate::pipeline::{NoopRecorder, RunStore};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn policy(retries: u32) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_retries(retries)
            .with_base_delay_seconds(1.0)
            .with_timeout_seconds(5.0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_has_no_delay() {
        let start = Instant::now();
        let result = execute_with_policy(
            &policy(3),
            PipelineStage::Retrieval,
            "run",
            &NoopRecorder,
            || async { Ok::<_, AgentError>(7) },
        )
        .await
        .unwrap();

        assert_eq!(result, 7);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_attempts_n_plus_one_with_backoff() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let attempt_times = parking_lot::Mutex::new(Vec::new());

        let err = execute_with_policy(
            &policy(3),
            PipelineStage::Summarization,
            "run",
            &NoopRecorder,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                attempt_times.lock().push(start.elapsed());
                async { Err::<(), _>(AgentError::network("down")) }
            },
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            *attempt_times.lock(),
            vec![
                Duration::ZERO,
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(7),
            ]
        );
        match err {
            SupervisorError::RetryExhausted {
                stage,
                attempts,
                timed_out,
                ..
            } => {
                assert_eq!(stage, PipelineStage::Summarization);
                assert_eq!(attempts, 4);
                assert!(!timed_out);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_attempts_once() {
        let calls = AtomicU32::new(0);
        let err = execute_with_policy(
            &policy(0),
            PipelineStage::Citation,
            "run",
            &NoopRecorder,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(AgentError::other("nope")) }
            },
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, SupervisorError::RetryExhausted { attempts: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_success_records_timeout() {
        let store = RunStore::new();
        store.begin_run("run", "q");
        let calls = AtomicU32::new(0);

        let value = execute_with_policy(
            &policy(2),
            PipelineStage::Generation,
            "run",
            &store,
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        std::future::pending::<()>().await;
                    }
                    Ok::<_, AgentError>("draft")
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(value, "draft");
        let run = store.snapshot("run").unwrap();
        assert_eq!(run.retries, 1);
        assert_eq!(run.errors.len(), 1);
        assert_eq!(run.errors[0].kind, crate::pipeline::ErrorKind::Timeout);
        assert_eq!(run.errors[0].attempt, Some(1));
        assert_eq!(
            store.status_of("run", PipelineStage::Generation),
            Some(AgentStatus::Running)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_message_is_verbatim() {
        let store = RunStore::new();
        store.begin_run("run", "q");

        let _ = execute_with_policy(
            &policy(0),
            PipelineStage::Analytics,
            "run",
            &store,
            || async { Err::<(), _>(AgentError::other("quota exceeded for key abc")) },
        )
        .await;

        let run = store.snapshot("run").unwrap();
        assert_eq!(run.errors[0].message, "quota exceeded for key abc");
        assert_eq!(
            store.status_of("run", PipelineStage::Analytics),
            Some(AgentStatus::Failed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_is_contained() {
        let calls = AtomicU32::new(0);
        let value = execute_with_policy(
            &policy(1),
            PipelineStage::Citation,
            "run",
            &NoopRecorder,
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    assert!(n != 0, "collaborator bug");
                    Ok::<_, AgentError>(n)
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(value, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_timeouts_flag_timed_out() {
        let err = execute_with_policy(
            &policy(1).with_backoff(BackoffStrategy::Constant),
            PipelineStage::Retrieval,
            "run",
            &NoopRecorder,
            || async {
                std::future::pending::<()>().await;
                Ok::<(), AgentError>(())
            },
        )
        .await
        .unwrap_err();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_invalid_policy_rejected_before_first_attempt() {
        let calls = AtomicU32::new(0);
        let err = execute_with_policy(
            &policy(3).with_timeout_seconds(1e20),
            PipelineStage::Retrieval,
            "run",
            &NoopRecorder,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, AgentError>(1) }
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SupervisorError::Config(_)));
        assert_eq!(err.stage(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "panic: boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "panic: bang");
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "panic: <non-string payload>");
    }
}
