//! Polling helper shared by explicit waits

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::errors::{AutomationError, AutomationResult};

/// Default interval between two condition probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Re-run `probe` every `interval` until it yields `true` or `timeout` elapses.
///
/// Probe errors are returned immediately; the probe decides which conditions
/// are transient (report `false`) and which are fatal (report an error).
/// The probe always runs at least once, even with a zero timeout.
pub async fn poll_until<F, Fut>(
    timeout: Duration,
    interval: Duration,
    describe: &str,
    mut probe: F,
) -> AutomationResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AutomationResult<bool>>,
{
    let deadline = Instant::now() + timeout;
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        if probe().await? {
            debug!(attempts, condition = describe, "wait condition met");
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(AutomationError::WaitTimeout(format!(
                "{} not met after {}s",
                describe,
                timeout.as_secs_f64()
            )));
        }
        sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn resolves_once_probe_turns_true() {
        let calls = AtomicU32::new(0);
        let result = poll_until(
            Duration::from_secs(1),
            Duration::from_millis(1),
            "third probe",
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n >= 2) }
            },
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn times_out_with_wait_timeout() {
        let result = poll_until(Duration::from_millis(5), Duration::from_millis(1), "never", || async {
            Ok(false)
        })
        .await;
        assert!(matches!(result, Err(AutomationError::WaitTimeout(_))));
    }

    #[tokio::test]
    async fn probe_errors_short_circuit() {
        let result = poll_until(Duration::from_secs(5), Duration::from_millis(1), "bad", || async {
            Err(AutomationError::InvalidSelector("//[".into()))
        })
        .await;
        assert_eq!(result, Err(AutomationError::InvalidSelector("//[".into())));
    }

    #[tokio::test]
    async fn zero_timeout_still_probes_once() {
        let result = poll_until(Duration::ZERO, Duration::from_millis(1), "ready", || async {
            Ok(true)
        })
        .await;
        assert!(result.is_ok());
    }
}
