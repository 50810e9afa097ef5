//! Deploy an image as a serverless service and wait for it to come up.

use knap_core::{PollPolicy, ReplacePolicy, RetryPolicy, ServiceDescriptor};
use tracing::{info, warn};

use crate::poll::{AbortSignal, WatchError, poll_until};
use crate::store::{ResourceStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("service '{name}' already exists in namespace '{namespace}', use --force to replace it")]
    AlreadyExists { name: String, namespace: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ready(#[from] WatchError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployAction {
    Created,
    Replaced,
}

pub struct ServiceDeployer<'a, S> {
    store: &'a S,
    replace: ReplacePolicy,
    retry: RetryPolicy,
    ready: PollPolicy,
}

impl<'a, S: ResourceStore> ServiceDeployer<'a, S> {
    pub fn new(
        store: &'a S,
        replace: ReplacePolicy,
        retry: RetryPolicy,
        ready: PollPolicy,
    ) -> Self {
        Self {
            store,
            replace,
            retry,
            ready,
        }
    }

    /// Create the service, or replace its container when it already exists
    /// and replacement is allowed.
    pub async fn deploy(
        &self,
        name: &str,
        namespace: &str,
        image: &str,
        service_account: &str,
        force: bool,
    ) -> Result<DeployAction, DeployError> {
        if self.store.get_service(name).await?.is_none() {
            let service = ServiceDescriptor::new(name, namespace, image, service_account);
            self.store.create_service(&service).await?;
            info!(service = name, namespace, image, "service created");
            return Ok(DeployAction::Created);
        }

        if !force && self.replace == ReplacePolicy::RequireForce {
            return Err(DeployError::AlreadyExists {
                name: name.to_owned(),
                namespace: namespace.to_owned(),
            });
        }

        self.replace_with_retry(name, image, service_account).await?;
        info!(service = name, namespace, image, "service replaced");
        Ok(DeployAction::Replaced)
    }

    async fn replace_with_retry(
        &self,
        name: &str,
        image: &str,
        service_account: &str,
    ) -> Result<(), StoreError> {
        let mut retries = 0;
        loop {
            let mut current =
                self.store
                    .get_service(name)
                    .await?
                    .ok_or_else(|| StoreError::NotFound {
                        kind: "service".to_owned(),
                        name: name.to_owned(),
                    })?;
            current.replace_container(image, service_account);

            match self.store.update_service(&current).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_conflict() && retries < self.retry.max_retries => {
                    retries += 1;
                    warn!(service = name, retries, "service update conflicted, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Poll until a revision is ready and return the service URL.
    pub async fn await_ready(
        &self,
        name: &str,
        signal: &AbortSignal,
    ) -> Result<String, DeployError> {
        let store = self.store;
        let subject = format!("service '{name}'");

        let url = poll_until(self.ready, signal, &subject, |attempt| async move {
            let status = store.get_service_status(name).await?;
            if status.is_ready() {
                return Ok(Some(status.resolved_url().to_owned()));
            }
            info!(service = name, attempt, "service not ready yet");
            Ok(None)
        })
        .await?;

        info!(service = name, url = %url, "service ready");
        Ok(url)
    }
}
