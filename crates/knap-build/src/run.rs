use knap_core::{BuildIntent, BuilderImages, Param, ResourceBinding, Run, RunKind, SourceLocator};

use crate::dispatch::{self, BuilderKind, RunContext};
use crate::resources::{git_source_spec, image_output_spec};
use crate::source::{SourceError, SourceResolver};

/// Names of the reconciled resources a run binds to.
#[derive(Debug, Clone, Copy)]
pub struct RunRefs<'a> {
    pub source: &'a str,
    pub image: &'a str,
    /// Tag for builders that take it as a parameter (`build-to-image`).
    pub image_tag: Option<&'a str>,
}

/// Constructs TaskRun / PipelineRun objects from a [`BuildIntent`].
#[derive(Debug, Clone, Default)]
pub struct RunBuilder {
    images: BuilderImages,
    resolver: SourceResolver,
}

impl RunBuilder {
    pub fn new(images: BuilderImages) -> Self {
        Self {
            images,
            resolver: SourceResolver::new(),
        }
    }

    pub fn with_resolver(images: BuilderImages, resolver: SourceResolver) -> Self {
        Self { images, resolver }
    }

    /// Run shape the dispatch table selects for this intent.
    pub fn shape_for(&self, intent: &BuildIntent) -> RunKind {
        let kind = BuilderKind::parse(intent.builder());
        dispatch::profile(&kind, &self.images, intent.source()).shape
    }

    /// Build the run for a resource-backed build. Inline code is resolved
    /// first; a read or fetch failure means no run is constructed.
    pub async fn build_run(
        &self,
        intent: &BuildIntent,
        refs: RunRefs<'_>,
    ) -> Result<Run, RunBuildError> {
        let code = match intent.source() {
            SourceLocator::Inline { code } => Some(self.resolver.resolve(code).await?),
            SourceLocator::Git { .. } => None,
        };

        Ok(self.assemble(intent, refs, code.as_deref()))
    }

    /// Assemble a run from already-resolved inputs.
    pub fn assemble(
        &self,
        intent: &BuildIntent,
        refs: RunRefs<'_>,
        inline_code: Option<&str>,
    ) -> Run {
        let kind = BuilderKind::parse(intent.builder());
        let profile = dispatch::profile(&kind, &self.images, intent.source());

        let bindings = (profile.bind)(&RunContext {
            intent,
            source_resource: refs.source,
            image_resource: refs.image,
            builder_image: profile.image,
            image_tag: refs.image_tag,
            inline_code,
        });

        tracing::debug!(
            builder = intent.builder(),
            shape = profile.shape.as_str(),
            "assembled build run"
        );

        Run {
            generated_name_prefix: format!("{}-build-", intent.name()),
            namespace: intent.namespace().to_owned(),
            kind: profile.shape,
            referenced_builder: intent.builder().to_owned(),
            input_resources: bindings.inputs,
            output_resources: bindings.outputs,
            parameters: bindings.params,
            service_account: intent.service_account().to_owned(),
        }
    }

    /// Build a single TaskRun with the git source and output image embedded
    /// in its bindings; nothing needs reconciling beforehand.
    pub fn build_embedded_run(&self, intent: &BuildIntent) -> Result<Run, RunBuildError> {
        let SourceLocator::Git { url, revision, .. } = intent.source() else {
            return Err(RunBuildError::EmbeddedInline);
        };

        let kind = BuilderKind::parse(intent.builder());
        let parameters = match kind.builder_image(&self.images) {
            Some(image) => vec![Param::string("BUILDER_IMAGE", image)],
            None => Vec::new(),
        };

        Ok(Run {
            generated_name_prefix: format!("{}-", intent.name()),
            namespace: intent.namespace().to_owned(),
            kind: RunKind::TaskRun,
            referenced_builder: intent.builder().to_owned(),
            input_resources: vec![ResourceBinding::embedded(
                "source",
                git_source_spec(url, revision),
            )],
            output_resources: vec![ResourceBinding::embedded(
                "image",
                image_output_spec(intent.target_image()),
            )],
            parameters,
            service_account: intent.service_account().to_owned(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunBuildError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("embedded builds need a git source — use the resource-backed build for inline code")]
    EmbeddedInline,
}
