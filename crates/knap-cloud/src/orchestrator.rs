//! End-to-end image build: builder check, resource reconcile, run, watch.

use knap_build::{RunBuildError, RunBuilder, RunRefs, resources, templates};
use knap_core::{
    BuildConfig, BuildIntent, DeclarativeResource, ResourceKind, RetryPolicy, RunKind, TagMode,
};
use tracing::info;

use crate::poll::{AbortSignal, WatchError};
use crate::reconcile::{ReconcileAction, Reconciler};
use crate::store::{ResourceStore, StoreError};
use crate::watch::RunWatcher;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("builder {kind} '{name}' not found — install it first (e.g. `knap builder install`)")]
    BuilderNotFound { kind: ResourceKind, name: String },

    #[error("source resource '{name}' has no generation to tag the image with")]
    MissingGeneration { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Run(#[from] RunBuildError),

    #[error(transparent)]
    Watch(#[from] WatchError),
}

pub struct BuildOrchestrator<'a, S> {
    store: &'a S,
    runs: RunBuilder,
    config: BuildConfig,
}

impl<'a, S: ResourceStore> BuildOrchestrator<'a, S> {
    pub fn new(store: &'a S, runs: RunBuilder, config: BuildConfig) -> Self {
        Self {
            store,
            runs,
            config,
        }
    }

    /// Build `intent` into an image and return its reference.
    ///
    /// Fails before touching any resource when the builder is not installed.
    pub async fn build(
        &self,
        intent: &BuildIntent,
        signal: &AbortSignal,
    ) -> Result<String, BuildError> {
        info!(
            name = intent.name(),
            namespace = intent.namespace(),
            builder = intent.builder(),
            "building image"
        );
        let builder_kind = match self.runs.shape_for(intent) {
            RunKind::TaskRun => ResourceKind::Task,
            RunKind::PipelineRun => ResourceKind::Pipeline,
        };
        self.ensure_builder(builder_kind, intent.builder()).await?;

        let reconciler = Reconciler::new(self.store, self.config.retry_policy());
        let source = resources::source_resource(intent, &self.config);
        reconciler.reconcile(&source).await?;

        let tag = match self.config.tag_mode {
            TagMode::Generation => Some(self.generation_tag(&source.name).await?),
            TagMode::AsGiven => None,
        };
        // builders push to the image resource url, so it carries the tag
        let reference = image_reference(intent.target_image(), tag.as_deref());
        let image = resources::image_resource(intent, &reference);
        reconciler.reconcile(&image).await?;

        let run = self
            .runs
            .build_run(
                intent,
                RunRefs {
                    source: &source.name,
                    image: &image.name,
                    image_tag: tag.as_deref(),
                },
            )
            .await?;
        let watcher = RunWatcher::new(self.store, self.config.poll_policy());
        let run_name = watcher.start_and_watch(&run, signal).await?;

        info!(run = %run_name, image = %reference, "image built");
        Ok(reference)
    }

    /// Build with source and image declared inline in the run, so no
    /// resources are reconciled. Returns the target image as given.
    pub async fn build_embedded(
        &self,
        intent: &BuildIntent,
        signal: &AbortSignal,
    ) -> Result<String, BuildError> {
        info!(
            name = intent.name(),
            builder = intent.builder(),
            "building image with embedded resources"
        );
        self.ensure_builder(ResourceKind::Task, intent.builder())
            .await?;

        let run = self.runs.build_embedded_run(intent)?;
        let watcher = RunWatcher::new(self.store, self.config.embedded_poll_policy());
        let run_name = watcher.start_and_watch(&run, signal).await?;

        info!(run = %run_name, image = intent.target_image(), "image built");
        Ok(intent.target_image().to_owned())
    }

    async fn ensure_builder(&self, kind: ResourceKind, name: &str) -> Result<(), BuildError> {
        if self.store.resource_exists(kind, name).await? {
            Ok(())
        } else {
            Err(BuildError::BuilderNotFound {
                kind,
                name: name.to_owned(),
            })
        }
    }

    async fn generation_tag(&self, source_name: &str) -> Result<String, BuildError> {
        let source = self
            .store
            .get_resource(ResourceKind::Source, source_name)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind: ResourceKind::Source.as_str().to_owned(),
                name: source_name.to_owned(),
            })?;
        let generation = source
            .generation()
            .ok_or_else(|| BuildError::MissingGeneration {
                name: source_name.to_owned(),
            })?;
        Ok(format!("{generation}.0"))
    }
}

/// `target` with `:tag` appended when a tag is given.
pub fn image_reference(target: &str, tag: Option<&str>) -> String {
    match tag {
        Some(tag) => format!("{target}:{tag}"),
        None => target.to_owned(),
    }
}

/// Reconcile the bundled source-to-image Task into `namespace`.
pub async fn install_default_builder<S: ResourceStore>(
    store: &S,
    namespace: &str,
    retry: RetryPolicy,
) -> Result<(DeclarativeResource, ReconcileAction), StoreError> {
    let task = templates::source_to_image_task(namespace);
    let action = Reconciler::new(store, retry).reconcile(&task).await?;
    info!(task = %task.name, ?action, "default builder installed");
    Ok((task, action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_reference_appends_tag() {
        assert_eq!(image_reference("reg/demo", Some("3.0")), "reg/demo:3.0");
        assert_eq!(image_reference("reg/demo", None), "reg/demo");
    }
}
