//! Tekton `v1alpha1` and Knative serving object shapes.

use std::collections::BTreeMap;

use knap_core::{
    BindingSource, Condition, ConditionStatus, DeclarativeResource, ResourceBinding, ResourceKind,
    Run, RunKind, RunStatusSnapshot, ServiceDescriptor, ServiceStatusSnapshot,
};
use serde::Deserialize;
use serde_json::{Value, json};

const TEKTON_API_VERSION: &str = "tekton.dev/v1alpha1";
const SERVING_API_VERSION: &str = "serving.knative.dev/v1alpha1";

pub const SERVICE_TYPE: &str = "services.serving.knative.dev";

/// kubectl resource type for a resource kind.
pub fn resource_type(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Source | ResourceKind::Image => "pipelineresources.tekton.dev",
        ResourceKind::Task => "tasks.tekton.dev",
        ResourceKind::Pipeline => "pipelines.tekton.dev",
    }
}

pub fn run_type(kind: RunKind) -> &'static str {
    match kind {
        RunKind::TaskRun => "taskruns.tekton.dev",
        RunKind::PipelineRun => "pipelineruns.tekton.dev",
    }
}

fn object_kind(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Source | ResourceKind::Image => "PipelineResource",
        ResourceKind::Task => "Task",
        ResourceKind::Pipeline => "Pipeline",
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMeta {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    annotations: BTreeMap<String, String>,
    resource_version: Option<String>,
    generation: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    spec: Value,
    #[serde(default)]
    status: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRunStatus {
    #[serde(default)]
    conditions: Vec<RawCondition>,
    start_time: Option<String>,
    completion_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawServiceStatus {
    #[serde(default)]
    latest_ready_revision_name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    domain: String,
}

fn metadata(
    name: &str,
    namespace: &str,
    labels: &BTreeMap<String, String>,
    annotations: &BTreeMap<String, String>,
    token: Option<&str>,
) -> Value {
    let mut meta = json!({
        "name": name,
        "namespace": namespace,
    });
    if !labels.is_empty() {
        meta["labels"] = json!(labels);
    }
    if !annotations.is_empty() {
        meta["annotations"] = json!(annotations);
    }
    if let Some(token) = token {
        meta["resourceVersion"] = json!(token);
    }
    meta
}

// ── Resources ──

pub fn render_resource(resource: &DeclarativeResource) -> Value {
    json!({
        "apiVersion": TEKTON_API_VERSION,
        "kind": object_kind(resource.kind),
        "metadata": metadata(
            &resource.name,
            &resource.namespace,
            &resource.labels,
            &resource.annotations,
            resource.concurrency_token(),
        ),
        "spec": resource.spec,
    })
}

pub fn parse_resource(kind: ResourceKind, json: &str) -> serde_json::Result<DeclarativeResource> {
    let raw: RawObject = serde_json::from_str(json)?;
    let meta = raw.metadata;

    let mut resource = DeclarativeResource::new(kind, meta.name, meta.namespace, raw.spec)
        .observed(meta.resource_version, meta.generation);
    resource.labels = meta.labels;
    resource.annotations = meta.annotations;
    Ok(resource)
}

/// `metadata.name` of any object, e.g. the name assigned to a generated run.
pub fn parse_name(json: &str) -> serde_json::Result<String> {
    let raw: RawObject = serde_json::from_str(json)?;
    Ok(raw.metadata.name)
}

// ── Runs ──

fn render_binding(binding: &ResourceBinding) -> Value {
    match &binding.source {
        BindingSource::Reference(name) => json!({
            "name": binding.name,
            "resourceRef": {"name": name},
        }),
        BindingSource::Embedded(spec) => json!({
            "name": binding.name,
            "resourceSpec": spec,
        }),
    }
}

fn render_bindings<'a>(bindings: impl IntoIterator<Item = &'a ResourceBinding>) -> Vec<Value> {
    bindings.into_iter().map(render_binding).collect()
}

pub fn render_run(run: &Run) -> Value {
    let params: Vec<Value> = run
        .parameters
        .iter()
        .map(|p| json!({"name": p.name, "value": p.value}))
        .collect();
    let meta = json!({
        "generateName": run.generated_name_prefix,
        "namespace": run.namespace,
    });

    match run.kind {
        RunKind::TaskRun => json!({
            "apiVersion": TEKTON_API_VERSION,
            "kind": "TaskRun",
            "metadata": meta,
            "spec": {
                "taskRef": {"name": run.referenced_builder},
                "inputs": {
                    "resources": render_bindings(&run.input_resources),
                    "params": params,
                },
                "outputs": {
                    "resources": render_bindings(&run.output_resources),
                },
                "serviceAccountName": run.service_account,
            },
        }),
        RunKind::PipelineRun => json!({
            "apiVersion": TEKTON_API_VERSION,
            "kind": "PipelineRun",
            "metadata": meta,
            "spec": {
                "pipelineRef": {"name": run.referenced_builder},
                "resources": render_bindings(
                    run.input_resources.iter().chain(&run.output_resources),
                ),
                "params": params,
                "serviceAccountName": run.service_account,
            },
        }),
    }
}

fn condition_status(status: &str) -> ConditionStatus {
    match status {
        "True" => ConditionStatus::True,
        "False" => ConditionStatus::False,
        _ => ConditionStatus::Unknown,
    }
}

pub fn parse_run_status(json: &str) -> serde_json::Result<RunStatusSnapshot> {
    let raw: RawObject = serde_json::from_str(json)?;
    let status: RawRunStatus = if raw.status.is_null() {
        RawRunStatus::default()
    } else {
        serde_json::from_value(raw.status)?
    };

    let conditions = status
        .conditions
        .into_iter()
        .map(|c| Condition {
            status: condition_status(&c.status),
            kind: c.kind,
            reason: c.reason,
            start_time: status.start_time.clone(),
            completion_time: status.completion_time.clone(),
        })
        .collect();

    Ok(RunStatusSnapshot {
        name: raw.metadata.name,
        conditions,
    })
}

// ── Services ──

pub fn render_service(service: &ServiceDescriptor) -> Value {
    json!({
        "apiVersion": SERVING_API_VERSION,
        "kind": "Service",
        "metadata": metadata(
            &service.name,
            &service.namespace,
            &BTreeMap::new(),
            &BTreeMap::new(),
            service.concurrency_token(),
        ),
        "spec": {
            "template": {
                "spec": {
                    "serviceAccountName": service.service_account,
                    "containers": [
                        {"image": service.image}
                    ],
                },
            },
        },
    })
}

pub fn parse_service(json: &str) -> serde_json::Result<ServiceDescriptor> {
    let raw: RawObject = serde_json::from_str(json)?;
    let pod = &raw.spec["template"]["spec"];
    let image = pod["containers"][0]["image"].as_str().unwrap_or("");
    let service_account = pod["serviceAccountName"].as_str().unwrap_or("");

    Ok(ServiceDescriptor::new(
        raw.metadata.name,
        raw.metadata.namespace,
        image,
        service_account,
    )
    .observed(raw.metadata.resource_version))
}

pub fn parse_service_status(json: &str) -> serde_json::Result<ServiceStatusSnapshot> {
    let raw: RawObject = serde_json::from_str(json)?;
    let status: RawServiceStatus = if raw.status.is_null() {
        RawServiceStatus::default()
    } else {
        serde_json::from_value(raw.status)?
    };

    Ok(ServiceStatusSnapshot {
        latest_ready_revision_name: status.latest_ready_revision_name,
        url: status.url,
        deprecated_domain: status.domain,
    })
}
