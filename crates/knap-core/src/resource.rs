use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kinds of declarative objects reconciled by knap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Source descriptor (git repository).
    Source,
    /// Output-image descriptor.
    Image,
    /// Single-task builder definition.
    Task,
    /// Multi-task builder definition.
    Pipeline,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Image => "image",
            Self::Task => "task",
            Self::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named object describing desired state, owned by the remote store.
///
/// The concurrency token and generation are only populated on objects read
/// back from the store; a freshly constructed resource never carries them.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarativeResource {
    pub name: String,
    pub namespace: String,
    pub kind: ResourceKind,
    pub spec: serde_json::Value,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    concurrency_token: Option<String>,
    generation: Option<i64>,
}

impl DeclarativeResource {
    pub fn new(
        kind: ResourceKind,
        name: impl Into<String>,
        namespace: impl Into<String>,
        spec: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            kind,
            spec,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            concurrency_token: None,
            generation: None,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Attach the state observed in the store.
    pub fn observed(mut self, concurrency_token: Option<String>, generation: Option<i64>) -> Self {
        self.concurrency_token = concurrency_token;
        self.generation = generation;
        self
    }

    /// Copy the concurrency token from a freshly read copy of this object.
    pub fn set_concurrency_token(&mut self, token: Option<String>) {
        self.concurrency_token = token;
    }

    pub fn concurrency_token(&self) -> Option<&str> {
        self.concurrency_token.as_deref()
    }

    pub fn generation(&self) -> Option<i64> {
        self.generation
    }

    /// Value of the `index`-th entry in `spec.params`.
    pub fn spec_param(&self, index: usize) -> Option<&str> {
        self.spec
            .get("params")?
            .get(index)?
            .get("value")?
            .as_str()
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_resource_has_no_token_or_generation() {
        let res = DeclarativeResource::new(ResourceKind::Source, "demo-git", "default", json!({}));
        assert!(res.concurrency_token().is_none());
        assert!(res.generation().is_none());
    }

    #[test]
    fn spec_param_reads_by_position() {
        let res = DeclarativeResource::new(
            ResourceKind::Source,
            "demo-git",
            "default",
            json!({
                "type": "git",
                "params": [
                    {"name": "url", "value": "https://example/repo"},
                    {"name": "revision", "value": "main"}
                ]
            }),
        );

        assert_eq!(res.spec_param(0), Some("https://example/repo"));
        assert_eq!(res.spec_param(1), Some("main"));
        assert_eq!(res.spec_param(2), None);
    }
}
