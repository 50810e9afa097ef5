//! Create-or-update of declarative resources under optimistic concurrency.

use knap_core::{DeclarativeResource, RetryPolicy};
use tracing::{info, warn};

use crate::store::{ResourceStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    Created,
    Updated,
}

pub struct Reconciler<'a, S> {
    store: &'a S,
    retry: RetryPolicy,
}

impl<'a, S: ResourceStore> Reconciler<'a, S> {
    pub fn new(store: &'a S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Make the stored resource match `desired`.
    ///
    /// Updates re-read the current object before every attempt and write
    /// `desired` with the freshly observed token. Only conflicts are retried.
    pub async fn reconcile(
        &self,
        desired: &DeclarativeResource,
    ) -> Result<ReconcileAction, StoreError> {
        if self
            .store
            .resource_exists(desired.kind, &desired.name)
            .await?
        {
            info!(kind = %desired.kind, name = %desired.name, "exists, updating");
            self.update_with_retry(desired).await?;
            Ok(ReconcileAction::Updated)
        } else {
            info!(kind = %desired.kind, name = %desired.name, "not found, creating");
            self.store.create_resource(desired).await?;
            Ok(ReconcileAction::Created)
        }
    }

    async fn update_with_retry(&self, desired: &DeclarativeResource) -> Result<(), StoreError> {
        let mut retries = 0;
        loop {
            let current = self
                .store
                .get_resource(desired.kind, &desired.name)
                .await?
                .ok_or_else(|| StoreError::NotFound {
                    kind: desired.kind.as_str().to_owned(),
                    name: desired.name.clone(),
                })?;

            let mut update = desired.clone();
            update.set_concurrency_token(current.concurrency_token().map(str::to_owned));

            match self.store.update_resource(&update).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_conflict() && retries < self.retry.max_retries => {
                    retries += 1;
                    warn!(
                        kind = %desired.kind,
                        name = %desired.name,
                        retries,
                        "update conflicted, retrying with fresh version"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}
