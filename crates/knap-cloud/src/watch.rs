//! Start a build run and wait for it to succeed.

use knap_core::{ConditionStatus, PollPolicy, Run, RunStatusSnapshot};
use tracing::info;

use crate::poll::{AbortSignal, WatchError, poll_until};
use crate::store::ResourceStore;

pub const SUCCEEDED: &str = "Succeeded";

/// Whether the run has finished successfully.
///
/// Only the first condition is consulted. A run that reports no condition
/// at all is an error rather than "not yet".
pub fn is_terminal_success(snapshot: &RunStatusSnapshot) -> Result<bool, WatchError> {
    let first = snapshot
        .conditions
        .first()
        .ok_or_else(|| WatchError::NoConditionReported {
            run: snapshot.name.clone(),
        })?;
    Ok(first.kind == SUCCEEDED && first.status == ConditionStatus::True)
}

pub struct RunWatcher<'a, S> {
    store: &'a S,
    policy: PollPolicy,
}

impl<'a, S: ResourceStore> RunWatcher<'a, S> {
    pub fn new(store: &'a S, policy: PollPolicy) -> Self {
        Self { store, policy }
    }

    /// Create `run` and poll it until it succeeds. Returns the store-assigned
    /// run name.
    ///
    /// A failed run is not terminal here: it keeps polling until the budget
    /// runs out.
    pub async fn start_and_watch(
        &self,
        run: &Run,
        signal: &AbortSignal,
    ) -> Result<String, WatchError> {
        let name = self.store.create_run(run).await?;
        info!(
            run = %name,
            kind = run.kind.as_str(),
            builder = %run.referenced_builder,
            "build run started"
        );

        let store = self.store;
        let kind = run.kind;
        let run_name = name.as_str();
        let subject = format!("{} '{name}'", kind.as_str());

        poll_until(self.policy, signal, &subject, |attempt| async move {
            let snapshot = store.get_run_status(kind, run_name).await?;
            if is_terminal_success(&snapshot)? {
                if let Some(done) = snapshot.conditions.first() {
                    info!(
                        run = run_name,
                        start = done.start_time.as_deref().unwrap_or("-"),
                        completion = done.completion_time.as_deref().unwrap_or("-"),
                        "build run succeeded"
                    );
                }
                return Ok(Some(()));
            }
            let reason = snapshot
                .conditions
                .first()
                .map(|c| c.reason.as_str())
                .unwrap_or("");
            info!(run = run_name, attempt, reason, "build run in progress");
            Ok(None)
        })
        .await?;

        Ok(name)
    }
}
