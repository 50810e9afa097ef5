use serde::{Deserialize, Serialize};

/// Shape of a build run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunKind {
    TaskRun,
    PipelineRun,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskRun => "TaskRun",
            Self::PipelineRun => "PipelineRun",
        }
    }
}

/// Where a run binding gets its resource from.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingSource {
    /// Reference to a reconciled resource by name.
    Reference(String),
    /// Resource spec embedded directly in the run.
    Embedded(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceBinding {
    pub name: String,
    pub source: BindingSource,
}

impl ResourceBinding {
    pub fn reference(name: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: BindingSource::Reference(resource.into()),
        }
    }

    pub fn embedded(name: impl Into<String>, spec: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            source: BindingSource::Embedded(spec),
        }
    }

    /// Name of the referenced resource, if this binding is a reference.
    pub fn resource_name(&self) -> Option<&str> {
        match &self.source {
            BindingSource::Reference(name) => Some(name),
            BindingSource::Embedded(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Array(Vec<String>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Array(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: ParamValue,
}

impl Param {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: ParamValue::String(value.into()),
        }
    }
}

/// A one-shot build execution. Created once, never updated; the store
/// assigns the final name from `generated_name_prefix`.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub generated_name_prefix: String,
    pub namespace: String,
    pub kind: RunKind,
    pub referenced_builder: String,
    pub input_resources: Vec<ResourceBinding>,
    pub output_resources: Vec<ResourceBinding>,
    pub parameters: Vec<Param>,
    pub service_account: String,
}

impl Run {
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Condition {
    pub kind: String,
    pub status: ConditionStatus,
    pub reason: String,
    pub start_time: Option<String>,
    pub completion_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunStatusSnapshot {
    pub name: String,
    pub conditions: Vec<Condition>,
}
