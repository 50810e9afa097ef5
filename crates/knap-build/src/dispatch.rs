use knap_core::{BuildIntent, BuilderImages, Param, ResourceBinding, RunKind, SourceLocator};

pub const BUILDPACKS_BUILDER: &str = "buildpacks-v3";
pub const KANIKO_BUILDER: &str = "kaniko";
pub const OPENWHISK_BUILDER: &str = "build-openwhisk-app";
/// Name of the embedded default task, see [`crate::templates`].
pub const SOURCE_TO_IMAGE_BUILDER: &str = "build-to-image";

/// Runtime repositories the OpenWhisk pipeline expects to be pre-installed.
const OPENWHISK_RUNTIME_RESOURCES: &[&str] = &["java-runtime-git", "javascript-runtime-git"];

const INLINE_DOCKERFILE: &str = "./runtime-git/core/nodejs10Action/knative/Dockerfile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderKind {
    Buildpacks,
    Kaniko,
    OpenwhiskApp,
    SourceToImage,
    Custom(String),
}

impl BuilderKind {
    pub fn parse(name: &str) -> Self {
        match name {
            BUILDPACKS_BUILDER => Self::Buildpacks,
            KANIKO_BUILDER => Self::Kaniko,
            OPENWHISK_BUILDER => Self::OpenwhiskApp,
            SOURCE_TO_IMAGE_BUILDER => Self::SourceToImage,
            other => Self::Custom(other.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Buildpacks => BUILDPACKS_BUILDER,
            Self::Kaniko => KANIKO_BUILDER,
            Self::OpenwhiskApp => OPENWHISK_BUILDER,
            Self::SourceToImage => SOURCE_TO_IMAGE_BUILDER,
            Self::Custom(name) => name,
        }
    }

    /// Container image handed to the builder task, if this kind has one.
    pub fn builder_image<'a>(&self, images: &'a BuilderImages) -> Option<&'a str> {
        match self {
            Self::Buildpacks => Some(&images.buildpacks_image),
            Self::Kaniko => Some(&images.kaniko_image),
            _ => None,
        }
    }
}

/// Values a binding function can draw on.
pub struct RunContext<'a> {
    pub intent: &'a BuildIntent,
    pub source_resource: &'a str,
    pub image_resource: &'a str,
    pub builder_image: Option<&'a str>,
    pub image_tag: Option<&'a str>,
    pub inline_code: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct Bindings {
    pub inputs: Vec<ResourceBinding>,
    pub outputs: Vec<ResourceBinding>,
    pub params: Vec<Param>,
}

pub type BindFn = fn(&RunContext<'_>) -> Bindings;

/// One row of the dispatch table.
#[derive(Clone, Copy)]
pub struct BuilderProfile<'a> {
    pub shape: RunKind,
    pub image: Option<&'a str>,
    pub bind: BindFn,
}

/// Select the run shape, builder image, and binding function.
///
/// Inline-code sources always take the inline profile whatever the builder.
pub fn profile<'a>(
    kind: &BuilderKind,
    images: &'a BuilderImages,
    source: &SourceLocator,
) -> BuilderProfile<'a> {
    if source.is_inline() {
        return BuilderProfile {
            shape: RunKind::TaskRun,
            image: None,
            bind: bind_inline,
        };
    }

    match kind {
        BuilderKind::OpenwhiskApp => BuilderProfile {
            shape: RunKind::PipelineRun,
            image: None,
            bind: bind_openwhisk,
        },
        BuilderKind::SourceToImage => BuilderProfile {
            shape: RunKind::TaskRun,
            image: None,
            bind: bind_source_to_image,
        },
        BuilderKind::Buildpacks | BuilderKind::Kaniko | BuilderKind::Custom(_) => BuilderProfile {
            shape: RunKind::TaskRun,
            image: kind.builder_image(images),
            bind: bind_single,
        },
    }
}

fn bind_single(ctx: &RunContext<'_>) -> Bindings {
    let params = match ctx.builder_image {
        Some(image) => vec![Param::string("BUILDER_IMAGE", image)],
        None => Vec::new(),
    };

    Bindings {
        inputs: vec![ResourceBinding::reference("source", ctx.source_resource)],
        outputs: vec![ResourceBinding::reference("image", ctx.image_resource)],
        params,
    }
}

fn bind_openwhisk(ctx: &RunContext<'_>) -> Bindings {
    let mut inputs: Vec<ResourceBinding> = OPENWHISK_RUNTIME_RESOURCES
        .iter()
        .map(|name| ResourceBinding::reference(*name, *name))
        .collect();
    inputs.push(ResourceBinding::reference("app-git", ctx.source_resource));

    Bindings {
        inputs,
        outputs: vec![ResourceBinding::reference("app-image", ctx.image_resource)],
        params: vec![
            Param::string("OW_ACTION_NAME", ctx.intent.name()),
            Param::string("OW_APP_PATH", git_path(ctx.intent)),
        ],
    }
}

fn bind_source_to_image(ctx: &RunContext<'_>) -> Bindings {
    Bindings {
        inputs: vec![ResourceBinding::reference("git-source", ctx.source_resource)],
        outputs: Vec::new(),
        params: vec![
            Param::string("pathToContext", git_path(ctx.intent)),
            Param::string("pathToDockerFile", "Dockerfile"),
            Param::string("imageUrl", ctx.intent.target_image()),
            Param::string("imageTag", ctx.image_tag.unwrap_or("latest")),
        ],
    }
}

fn bind_inline(ctx: &RunContext<'_>) -> Bindings {
    Bindings {
        inputs: vec![ResourceBinding::reference("runtime-git", ctx.source_resource)],
        outputs: vec![ResourceBinding::reference(
            "runtime-image",
            ctx.image_resource,
        )],
        params: vec![
            Param::string("DOCKERFILE", INLINE_DOCKERFILE),
            Param::string("OW_ACTION_NAME", format!("nodejs-{}", ctx.intent.name())),
            Param::string("OW_ACTION_CODE", ctx.inline_code.unwrap_or("")),
            Param::string("OW_PROJECT_URL", ""),
        ],
    }
}

fn git_path(intent: &BuildIntent) -> &str {
    match intent.source() {
        SourceLocator::Git { path, .. } => path,
        SourceLocator::Inline { .. } => SourceLocator::DEFAULT_PATH,
    }
}
