#![allow(dead_code)]

use std::time::Duration;

use knap_cloud::{ResourceStore, StoreError};
use knap_core::{
    BuildIntent, Condition, ConditionStatus, DeclarativeResource, PollPolicy, ResourceKind, Run,
    RunKind, RunStatusSnapshot, ServiceDescriptor, ServiceStatusSnapshot, SourceLocator,
};
use mockall::mock;

mock! {
    pub Store {}

    impl ResourceStore for Store {
        async fn get_resource(
            &self,
            kind: ResourceKind,
            name: &str,
        ) -> Result<Option<DeclarativeResource>, StoreError>;
        async fn create_resource(&self, resource: &DeclarativeResource) -> Result<(), StoreError>;
        async fn update_resource(&self, resource: &DeclarativeResource) -> Result<(), StoreError>;
        async fn resource_exists(&self, kind: ResourceKind, name: &str) -> Result<bool, StoreError>;
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
}

pub fn git_intent(builder: &str) -> BuildIntent {
    BuildIntent::new(
        "demo",
        "default",
        builder,
        SourceLocator::Git {
            url: "https://github.com/example/demo".to_owned(),
            revision: "master".to_owned(),
            path: ".".to_owned(),
        },
        "reg/demo",
        "default",
    )
    .unwrap()
}

pub fn conflict(kind: &str, name: &str) -> StoreError {
    StoreError::Conflict {
        kind: kind.to_owned(),
        name: name.to_owned(),
    }
}

pub fn run_status(name: &str, kind: &str, status: ConditionStatus) -> RunStatusSnapshot {
    RunStatusSnapshot {
        name: name.to_owned(),
        conditions: vec![Condition {
            kind: kind.to_owned(),
            status,
            reason: "Running".to_owned(),
            ..Condition::default()
        }],
    }
}

pub fn succeeded(name: &str) -> RunStatusSnapshot {
    run_status(name, "Succeeded", ConditionStatus::True)
}

pub fn running(name: &str) -> RunStatusSnapshot {
    run_status(name, "Succeeded", ConditionStatus::Unknown)
}

pub fn poll_policy(max_polls: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_secs(5),
        max_polls,
    }
}
