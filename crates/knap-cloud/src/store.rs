use knap_core::{
    DeclarativeResource, ResourceKind, Run, RunKind, RunStatusSnapshot, ServiceDescriptor,
    ServiceStatusSnapshot,
};

use crate::kubectl::KubectlError;

/// Typed access to the declarative control plane for one namespace.
///
/// Production code uses [`crate::KubectlStore`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait ResourceStore: Send + Sync {
    /// Read a resource; `Ok(None)` when it does not exist.
    async fn get_resource(
        &self,
        kind: ResourceKind,
        name: &str,
    ) -> Result<Option<DeclarativeResource>, StoreError>;

    /// Create a resource. The resource must not carry a concurrency token.
    async fn create_resource(&self, resource: &DeclarativeResource) -> Result<(), StoreError>;

    /// Write a resource back; fails with [`StoreError::Conflict`] when its token is stale.
    async fn update_resource(&self, resource: &DeclarativeResource) -> Result<(), StoreError>;

    /// `NotFound` maps to `Ok(false)`; any other failure propagates.
    async fn resource_exists(&self, kind: ResourceKind, name: &str) -> Result<bool, StoreError>;

    /// Create a run and return the name the store assigned to it.
    async fn create_run(&self, run: &Run) -> Result<String, StoreError>;

    async fn get_run_status(
        &self,
        kind: RunKind,
        name: &str,
    ) -> Result<RunStatusSnapshot, StoreError>;

    async fn get_service(&self, name: &str) -> Result<Option<ServiceDescriptor>, StoreError>;

    async fn create_service(&self, service: &ServiceDescriptor) -> Result<(), StoreError>;

    async fn update_service(&self, service: &ServiceDescriptor) -> Result<(), StoreError>;

    async fn get_service_status(&self, name: &str) -> Result<ServiceStatusSnapshot, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    #[error("{kind} '{name}' was modified concurrently — the write used a stale version")]
    Conflict { kind: String, name: String },

    #[error("control plane request for {kind} '{name}' failed")]
    Transport {
        kind: String,
        name: String,
        source: KubectlError,
    },

    #[error("unexpected {kind} object from control plane: {detail}")]
    Decode { kind: String, detail: String },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Classify a kubectl failure by the API status reason it reported.
    pub fn from_kubectl(kind: &str, name: &str, err: KubectlError) -> Self {
        let kind = kind.to_owned();
        let name = name.to_owned();
        match err.reason() {
            Some("NotFound") => Self::NotFound { kind, name },
            Some("Conflict") => Self::Conflict { kind, name },
            _ => Self::Transport {
                kind,
                name,
                source: err,
            },
        }
    }
}
