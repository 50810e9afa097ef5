use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// knap.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnapConfig {
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub builders: BuilderImages,
    #[serde(default)]
    pub deploy: DeployConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// kubeconfig path used when neither --kubeconfig nor $KUBECONFIG is set
    pub kubeconfig: Option<PathBuf>,
    /// Default namespace for builds and services
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// How the returned image reference is tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagMode {
    /// `<image>:<source generation>.0`
    Generation,
    /// The target image exactly as supplied by the caller.
    #[default]
    AsGiven,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Polling budget for resource-backed builds
    #[serde(default = "default_build_timeout_secs")]
    pub timeout_secs: u64,
    /// Polling budget for the embedded single-task flow
    #[serde(default = "default_embedded_timeout_secs")]
    pub embedded_timeout_secs: u64,
    /// Interval between status polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub tag_mode: TagMode,
    /// Conflict retries when updating an existing resource
    #[serde(default = "default_max_update_retries")]
    pub max_update_retries: u32,
    /// Runtime repository checked out for inline-code builds
    #[serde(default = "default_runtime_repo_url")]
    pub runtime_repo_url: String,
    #[serde(default = "default_runtime_repo_revision")]
    pub runtime_repo_revision: String,
}

/// Container images passed to the single-task builders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderImages {
    #[serde(default = "default_buildpacks_image")]
    pub buildpacks_image: String,
    #[serde(default = "default_kaniko_image")]
    pub kaniko_image: String,
}

/// What to do when the target service already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplacePolicy {
    /// Replace only when the caller passes `--force`.
    #[default]
    RequireForce,
    /// Always replace.
    Always,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
    #[serde(default)]
    pub replace: ReplacePolicy,
    #[serde(default = "default_max_update_retries")]
    pub max_update_retries: u32,
}

/// Fixed-interval polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl PollPolicy {
    /// Budget of `ceil(timeout / interval)` polls. A zero interval counts as one second.
    pub fn from_secs(timeout_secs: u64, interval_secs: u64) -> Self {
        let interval_secs = interval_secs.max(1);
        let polls = timeout_secs.div_ceil(interval_secs);
        Self {
            interval: Duration::from_secs(interval_secs),
            max_polls: polls.min(u64::from(u32::MAX)) as u32,
        }
    }
}

/// Bounded optimistic-concurrency retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_update_retries(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            namespace: default_namespace(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_build_timeout_secs(),
            embedded_timeout_secs: default_embedded_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            tag_mode: TagMode::default(),
            max_update_retries: default_max_update_retries(),
            runtime_repo_url: default_runtime_repo_url(),
            runtime_repo_revision: default_runtime_repo_revision(),
        }
    }
}

impl Default for BuilderImages {
    fn default() -> Self {
        Self {
            buildpacks_image: default_buildpacks_image(),
            kaniko_image: default_kaniko_image(),
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            ready_timeout_secs: default_ready_timeout_secs(),
            replace: ReplacePolicy::default(),
            max_update_retries: default_max_update_retries(),
        }
    }
}

impl BuildConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::from_secs(self.timeout_secs, self.poll_interval_secs)
    }

    pub fn embedded_poll_policy(&self) -> PollPolicy {
        PollPolicy::from_secs(self.embedded_timeout_secs, self.poll_interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_update_retries,
        }
    }
}

impl DeployConfig {
    /// Readiness polling shares the build poll interval.
    pub fn ready_poll_policy(&self, interval_secs: u64) -> PollPolicy {
        PollPolicy::from_secs(self.ready_timeout_secs, interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_update_retries,
        }
    }
}

impl KnapConfig {
    /// Load from knap.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join("knap.toml");
        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            let config: Self = toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path.clone(),
                source: e,
            })?;
            tracing::debug!(path = %config_path.display(), "loaded knap.toml");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Pick the kubeconfig: explicit flag, then `$KUBECONFIG`, then knap.toml.
    pub fn resolve_kubeconfig(
        &self,
        flag: Option<&Path>,
        env: Option<OsString>,
    ) -> Option<PathBuf> {
        if let Some(path) = flag.filter(|p| !p.as_os_str().is_empty()) {
            return Some(path.to_path_buf());
        }
        if let Some(env) = env.filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(env));
        }
        self.cluster.kubeconfig.clone()
    }
}

fn default_namespace() -> String {
    "default".to_owned()
}

fn default_build_timeout_secs() -> u64 {
    600
}

fn default_embedded_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_update_retries() -> u32 {
    3
}

fn default_runtime_repo_url() -> String {
    "https://github.com/apache/openwhisk-runtime-nodejs.git".to_owned()
}

fn default_runtime_repo_revision() -> String {
    "master".to_owned()
}

fn default_buildpacks_image() -> String {
    "cloudfoundry/cnb:bionic".to_owned()
}

fn default_kaniko_image() -> String {
    "gcr.io/kaniko-project/executor:v0.13.0".to_owned()
}

fn default_ready_timeout_secs() -> u64 {
    300
}
