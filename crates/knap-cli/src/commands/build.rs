use std::path::Path;

use clap::Args;
use knap_cloud::AbortSignal;
use knap_core::{BuildIntent, SourceLocator};

use super::{Context, interrupt_signal};

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Name of the function or application
    pub name: String,

    /// Namespace for build resources (default: [cluster].namespace)
    #[arg(long, short = 'n', env = "KNAP_NAMESPACE")]
    pub namespace: Option<String>,

    /// Builder Task or Pipeline, e.g. kaniko, buildpacks-v3, build-openwhisk-app
    #[arg(long, short = 'b', default_value_t)]
    pub builder: String,

    /// Git repository to build from
    #[arg(long, short = 'u')]
    pub git_url: Option<String>,

    /// Git revision (default: master)
    #[arg(long, short = 'r')]
    pub git_revision: Option<String>,

    /// Application path inside the repository (default: .)
    #[arg(long)]
    pub git_path: Option<String>,

    /// Inline code: a file path, an http(s) URL, or the code itself
    #[arg(long, short = 'f')]
    pub file: Option<String>,

    /// Image to build and push
    #[arg(long, short = 'i', visible_alias = "saved-image", default_value_t)]
    pub image: String,

    /// Service account used by the build
    #[arg(long = "serviceaccount", short = 's', default_value = "default")]
    pub service_account: String,

    /// Declare source and image inline in a single TaskRun
    #[arg(long)]
    pub embedded: bool,
}

impl BuildArgs {
    pub fn intent(&self, namespace: &str) -> knap_core::Result<BuildIntent> {
        let source = SourceLocator::from_flags(
            self.git_url.as_deref(),
            self.git_revision.as_deref(),
            self.git_path.as_deref(),
            self.file.as_deref(),
        )?;
        BuildIntent::new(
            &self.name,
            namespace,
            &self.builder,
            source,
            &self.image,
            &self.service_account,
        )
    }
}

pub async fn build(kubeconfig: Option<&Path>, args: &BuildArgs) -> anyhow::Result<()> {
    let ctx = Context::load(kubeconfig, args.namespace.as_deref())?;
    let intent = args.intent(&ctx.namespace)?;
    let signal = interrupt_signal();

    println!("Building {} with {}...", intent.name(), intent.builder());
    let image = run_build(&ctx, &intent, args.embedded, &signal).await?;
    println!("Image built: {image}");
    Ok(())
}

pub(super) async fn run_build(
    ctx: &Context,
    intent: &BuildIntent,
    embedded: bool,
    signal: &AbortSignal,
) -> anyhow::Result<String> {
    let orchestrator = ctx.orchestrator();
    let image = if embedded {
        orchestrator.build_embedded(intent, signal).await?
    } else {
        orchestrator.build(intent, signal).await?
    };
    Ok(image)
}
