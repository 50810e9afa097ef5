use std::path::Path;

use clap::Args;
use knap_cloud::{RedeployOverrides, RedeployPlanner};

use super::build::run_build;
use super::deploy::publish;
use super::{Context, interrupt_signal};

/// Flags left out are recovered from the `<name>-image` and `<name>-git`
/// resources of the previous build.
#[derive(Args, Debug)]
pub struct RedeployArgs {
    /// Name of the function or application
    pub name: String,

    /// Namespace of the previous build (default: [cluster].namespace)
    #[arg(long, short = 'n', env = "KNAP_NAMESPACE")]
    pub namespace: Option<String>,

    #[arg(long, short = 'b')]
    pub builder: Option<String>,

    #[arg(long, short = 'u')]
    pub git_url: Option<String>,

    #[arg(long, short = 'r')]
    pub git_revision: Option<String>,

    #[arg(long)]
    pub git_path: Option<String>,

    #[arg(long, short = 'f')]
    pub file: Option<String>,

    #[arg(long, short = 'i', visible_alias = "saved-image")]
    pub image: Option<String>,

    #[arg(long = "serviceaccount", short = 's')]
    pub service_account: Option<String>,
}

impl RedeployArgs {
    fn overrides(&self) -> RedeployOverrides {
        RedeployOverrides {
            builder: self.builder.clone(),
            service_account: self.service_account.clone(),
            git_url: self.git_url.clone(),
            git_revision: self.git_revision.clone(),
            git_path: self.git_path.clone(),
            file: self.file.clone(),
            image: self.image.clone(),
        }
    }
}

pub async fn redeploy(kubeconfig: Option<&Path>, args: &RedeployArgs) -> anyhow::Result<()> {
    let ctx = Context::load(kubeconfig, args.namespace.as_deref())?;
    let intent = RedeployPlanner::new(&ctx.store)
        .plan(&args.name, &ctx.namespace, &args.overrides())
        .await?;
    let signal = interrupt_signal();

    println!("Rebuilding {} with {}...", intent.name(), intent.builder());
    let image = run_build(&ctx, &intent, false, &signal).await?;
    println!("Image built: {image}");

    publish(&ctx, &intent, &image, true, &signal).await
}
