//! [`ResourceStore`] backed by the kubectl CLI.

use std::path::PathBuf;

use knap_core::{
    DeclarativeResource, ResourceKind, Run, RunKind, RunStatusSnapshot, ServiceDescriptor,
    ServiceStatusSnapshot,
};
use serde_json::Value;

use crate::executor::{KubectlExecutor, RealExecutor};
use crate::manifest;
use crate::store::{ResourceStore, StoreError};

const SERVICE_KIND: &str = "service";

/// Store scoped to a single namespace. Objects are exchanged as JSON on
/// kubectl's stdin and stdout.
pub struct KubectlStore<E: KubectlExecutor = RealExecutor> {
    executor: E,
    namespace: String,
}

impl KubectlStore<RealExecutor> {
    pub fn new(kubeconfig: Option<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            executor: RealExecutor::new(kubeconfig),
            namespace: namespace.into(),
        }
    }
}

impl<E: KubectlExecutor> KubectlStore<E> {
    pub fn with_executor(executor: E, namespace: impl Into<String>) -> Self {
        Self {
            executor,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `kubectl get`, with `NotFound` mapped to `Ok(None)`.
    async fn get_json(
        &self,
        resource_type: &str,
        kind: &str,
        name: &str,
    ) -> Result<Option<String>, StoreError> {
        let args = args(["get", resource_type, name, "-n", &self.namespace, "-o", "json"]);
        match self.executor.exec(&args).await {
            Ok(json) => Ok(Some(json)),
            Err(e) => match StoreError::from_kubectl(kind, name, e) {
                StoreError::NotFound { .. } => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn get_existing_json(
        &self,
        resource_type: &str,
        kind: &str,
        name: &str,
    ) -> Result<String, StoreError> {
        self.get_json(resource_type, kind, name)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.to_owned(),
                name: name.to_owned(),
            })
    }

    /// Pipe a manifest to `kubectl create` or `kubectl replace`.
    async fn submit(
        &self,
        verb: &str,
        manifest: &Value,
        kind: &str,
        name: &str,
    ) -> Result<String, StoreError> {
        let body = serde_json::to_vec(manifest).map_err(|e| decode(kind, e))?;
        let args = args([verb, "-f", "-", "-n", &self.namespace, "-o", "json"]);
        self.executor
            .exec_with_stdin(&args, &body)
            .await
            .map_err(|e| StoreError::from_kubectl(kind, name, e))
    }
}

impl<E: KubectlExecutor> ResourceStore for KubectlStore<E> {
    async fn get_resource(
        &self,
        kind: ResourceKind,
        name: &str,
    ) -> Result<Option<DeclarativeResource>, StoreError> {
        let Some(json) = self
            .get_json(manifest::resource_type(kind), kind.as_str(), name)
            .await?
        else {
            return Ok(None);
        };
        manifest::parse_resource(kind, &json)
            .map(Some)
            .map_err(|e| decode(kind.as_str(), e))
    }

    async fn create_resource(&self, resource: &DeclarativeResource) -> Result<(), StoreError> {
        let manifest = manifest::render_resource(resource);
        self.submit("create", &manifest, resource.kind.as_str(), &resource.name)
            .await?;
        tracing::debug!(kind = %resource.kind, name = %resource.name, "created");
        Ok(())
    }

    async fn update_resource(&self, resource: &DeclarativeResource) -> Result<(), StoreError> {
        let manifest = manifest::render_resource(resource);
        self.submit("replace", &manifest, resource.kind.as_str(), &resource.name)
            .await?;
        tracing::debug!(kind = %resource.kind, name = %resource.name, "replaced");
        Ok(())
    }

    async fn resource_exists(&self, kind: ResourceKind, name: &str) -> Result<bool, StoreError> {
        let found = self
            .get_json(manifest::resource_type(kind), kind.as_str(), name)
            .await?;
        Ok(found.is_some())
    }

    async fn create_run(&self, run: &Run) -> Result<String, StoreError> {
        let manifest = manifest::render_run(run);
        let json = self
            .submit(
                "create",
                &manifest,
                run.kind.as_str(),
                &run.generated_name_prefix,
            )
            .await?;
        manifest::parse_name(&json).map_err(|e| decode(run.kind.as_str(), e))
    }

    async fn get_run_status(
        &self,
        kind: RunKind,
        name: &str,
    ) -> Result<RunStatusSnapshot, StoreError> {
        let json = self
            .get_existing_json(manifest::run_type(kind), kind.as_str(), name)
            .await?;
        manifest::parse_run_status(&json).map_err(|e| decode(kind.as_str(), e))
    }

    async fn get_service(&self, name: &str) -> Result<Option<ServiceDescriptor>, StoreError> {
        let Some(json) = self
            .get_json(manifest::SERVICE_TYPE, SERVICE_KIND, name)
            .await?
        else {
            return Ok(None);
        };
        manifest::parse_service(&json)
            .map(Some)
            .map_err(|e| decode(SERVICE_KIND, e))
    }

    async fn create_service(&self, service: &ServiceDescriptor) -> Result<(), StoreError> {
        let manifest = manifest::render_service(service);
        self.submit("create", &manifest, SERVICE_KIND, &service.name)
            .await?;
        Ok(())
    }

    async fn update_service(&self, service: &ServiceDescriptor) -> Result<(), StoreError> {
        let manifest = manifest::render_service(service);
        self.submit("replace", &manifest, SERVICE_KIND, &service.name)
            .await?;
        Ok(())
    }

    async fn get_service_status(&self, name: &str) -> Result<ServiceStatusSnapshot, StoreError> {
        let json = self
            .get_existing_json(manifest::SERVICE_TYPE, SERVICE_KIND, name)
            .await?;
        manifest::parse_service_status(&json).map_err(|e| decode(SERVICE_KIND, e))
    }
}

fn decode(kind: &str, err: serde_json::Error) -> StoreError {
    StoreError::Decode {
        kind: kind.to_owned(),
        detail: err.to_string(),
    }
}

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}
