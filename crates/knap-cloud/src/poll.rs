//! Fixed-interval polling with cooperative cancellation.

use std::future::Future;
use std::time::Duration;

use knap_core::PollPolicy;
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("{subject} did not finish after {polls} polls")]
    Timeout { subject: String, polls: u32 },

    #[error("run '{run}' reported no status condition")]
    NoConditionReported { run: String },

    #[error("{subject}: cancelled")]
    Cancelled { subject: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Stops a poll loop at its next pause. A default signal never fires.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    rx: Option<watch::Receiver<bool>>,
}

/// Trips every [`AbortSignal`] cloned from its pair.
#[derive(Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

pub fn abort_pair() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx }, AbortSignal { rx: Some(rx) })
}

impl AbortHandle {
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

impl AbortSignal {
    pub fn never() -> Self {
        Self::default()
    }

    pub fn is_aborted(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Sleep for `interval`. Returns `false` if aborted before it elapses.
    pub async fn sleep(&self, interval: Duration) -> bool {
        let deadline = Instant::now() + interval;
        let Some(rx) = &self.rx else {
            sleep_until(deadline).await;
            return true;
        };

        let mut rx = rx.clone();
        let aborted = tokio::select! {
            _ = sleep_until(deadline) => return true,
            res = rx.wait_for(|aborted| *aborted) => res.is_ok(),
        };
        if aborted {
            return false;
        }

        // Handle dropped without aborting; nothing can fire any more.
        tracing::debug!("abort handle dropped");
        sleep_until(deadline).await;
        true
    }
}

/// Wait one interval, then call `probe` until it yields a value or the
/// budget of `policy.max_polls` probes is spent.
///
/// `probe` receives the 1-based attempt number. Errors from `probe` end the
/// loop immediately.
pub async fn poll_until<T, F, Fut>(
    policy: PollPolicy,
    signal: &AbortSignal,
    subject: &str,
    mut probe: F,
) -> Result<T, WatchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, WatchError>>,
{
    pause(policy.interval, signal, subject).await?;
    for attempt in 1..=policy.max_polls {
        if let Some(done) = probe(attempt).await? {
            return Ok(done);
        }
        if attempt < policy.max_polls {
            pause(policy.interval, signal, subject).await?;
        }
    }
    Err(WatchError::Timeout {
        subject: subject.to_owned(),
        polls: policy.max_polls,
    })
}

async fn pause(interval: Duration, signal: &AbortSignal, subject: &str) -> Result<(), WatchError> {
    if signal.sleep(interval).await {
        Ok(())
    } else {
        Err(WatchError::Cancelled {
            subject: subject.to_owned(),
        })
    }
}
