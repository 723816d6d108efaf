// src/workflow/readiness.rs

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{DevstrapError, Result};

/// Poll `check` up to `attempts` times, sleeping `interval` between polls,
/// until it reports ready.
///
/// Used to wait for services started by a previous command (containers,
/// registries) to accept connections.
pub async fn poll_until_ready<F, Fut>(
    probe: &str,
    attempts: u32,
    interval: Duration,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let attempts = attempts.max(1);

    for poll in 1..=attempts {
        match check().await {
            Ok(true) => {
                info!(probe = %probe, poll, "ready");
                return Ok(());
            }
            Ok(false) => debug!(probe = %probe, poll, attempts, "not ready yet"),
            Err(err @ DevstrapError::Interrupted { .. }) => return Err(err),
            Err(err) => warn!(probe = %probe, poll, error = %err, "readiness probe errored"),
        }

        if poll < attempts {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(DevstrapError::Interrupted { step: None });
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    Err(DevstrapError::NotReady {
        probe: probe.to_string(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn becomes_ready_on_third_poll() {
        let mut polls = 0;
        poll_until_ready("curl health", 5, Duration::ZERO, &CancellationToken::new(), || {
            polls += 1;
            let ready = polls == 3;
            async move { Ok(ready) }
        })
        .await
        .unwrap();

        assert_eq!(polls, 3);
    }

    #[tokio::test]
    async fn gives_up_after_bounded_polls() {
        let mut polls = 0;
        let err = poll_until_ready("curl health", 4, Duration::ZERO, &CancellationToken::new(), || {
            polls += 1;
            async { Ok(false) }
        })
        .await
        .unwrap_err();

        assert_eq!(polls, 4);
        assert!(matches!(err, DevstrapError::NotReady { attempts: 4, .. }));
    }
}
