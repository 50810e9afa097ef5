//! Control-plane side of knap.
//!
//! Everything here talks to the declarative store through
//! [`ResourceStore`]. [`KubectlStore`] is the production implementation;
//! tests substitute mocks.
//!
//! ```text
//! BuildOrchestrator ──► Reconciler ──► ResourceStore ──► KubectlStore ──► kubectl
//!        │
//!        └──────────► RunWatcher ──► poll_until
//! ServiceDeployer ─────────────────► poll_until
//! ```

pub mod client;
pub mod deployer;
pub mod executor;
pub mod kubectl;
pub mod manifest;
pub mod orchestrator;
pub mod poll;
pub mod reconcile;
pub mod redeploy;
pub mod store;
pub mod watch;

pub use client::KubectlStore;
pub use deployer::{DeployAction, DeployError, ServiceDeployer};
pub use executor::{KubectlExecutor, RealExecutor};
pub use kubectl::KubectlError;
pub use orchestrator::{BuildError, BuildOrchestrator, image_reference, install_default_builder};
pub use poll::{AbortHandle, AbortSignal, WatchError, abort_pair, poll_until};
pub use reconcile::{ReconcileAction, Reconciler};
pub use redeploy::{RedeployError, RedeployOverrides, RedeployPlanner};
pub use store::{ResourceStore, StoreError};
pub use watch::{RunWatcher, is_terminal_success};
