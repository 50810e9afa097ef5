//! Core types and configuration for knap.
//!
//! This crate defines the build/deploy data model ([`BuildIntent`],
//! [`DeclarativeResource`], [`Run`], [`ServiceDescriptor`]), the `knap.toml`
//! schema ([`KnapConfig`]), and shared error types.

pub mod config;
pub mod error;
pub mod intent;
pub mod resource;
pub mod run;
pub mod service;

pub use config::{
    BuildConfig, BuilderImages, ClusterConfig, DeployConfig, KnapConfig, PollPolicy,
    ReplacePolicy, RetryPolicy, TagMode,
};
pub use error::{Error, Result};
pub use intent::{BuildIntent, SourceLocator};
pub use resource::{DeclarativeResource, ResourceKind};
pub use run::{
    BindingSource, Condition, ConditionStatus, Param, ParamValue, ResourceBinding, Run, RunKind,
    RunStatusSnapshot,
};
pub use service::{ServiceDescriptor, ServiceStatusSnapshot};
