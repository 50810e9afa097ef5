mod build;
mod builder;
mod deploy;
mod redeploy;

use std::path::Path;

use knap_build::RunBuilder;
use knap_cloud::{AbortSignal, BuildOrchestrator, KubectlStore, ServiceDeployer, abort_pair};
use knap_core::KnapConfig;

pub use build::{BuildArgs, build};
pub use builder::builder_install;
pub use deploy::{DeployArgs, deploy};
pub use redeploy::{RedeployArgs, redeploy};

/// Configuration and store shared by every command.
pub(crate) struct Context {
    pub config: KnapConfig,
    pub namespace: String,
    pub store: KubectlStore,
}

impl Context {
    /// Load knap.toml from the working directory and resolve the target cluster.
    pub fn load(kubeconfig: Option<&Path>, namespace: Option<&str>) -> anyhow::Result<Self> {
        let config = KnapConfig::load(Path::new("."))?;
        let kubeconfig = config.resolve_kubeconfig(kubeconfig, std::env::var_os("KUBECONFIG"));
        let namespace = namespace
            .filter(|ns| !ns.is_empty())
            .unwrap_or(&config.cluster.namespace)
            .to_owned();
        tracing::debug!(?kubeconfig, namespace, "resolved cluster");

        let store = KubectlStore::new(kubeconfig, namespace.clone());
        Ok(Self {
            config,
            namespace,
            store,
        })
    }

    pub fn orchestrator(&self) -> BuildOrchestrator<'_, KubectlStore> {
        BuildOrchestrator::new(
            &self.store,
            RunBuilder::new(self.config.builders.clone()),
            self.config.build.clone(),
        )
    }

    pub fn deployer(&self) -> ServiceDeployer<'_, KubectlStore> {
        let deploy = &self.config.deploy;
        ServiceDeployer::new(
            &self.store,
            deploy.replace,
            deploy.retry_policy(),
            deploy.ready_poll_policy(self.config.build.poll_interval_secs),
        )
    }
}

/// Signal tripped on Ctrl-C; poll loops stop at their next pause.
pub(crate) fn interrupt_signal() -> AbortSignal {
    let (handle, signal) = abort_pair();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("interrupted, stopping at the next poll");
                handle.abort();
            }
            Err(e) => tracing::error!(error = %e, "cannot listen for Ctrl-C"),
        }
    });
    signal
}
