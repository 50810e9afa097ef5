use std::path::Path;

use clap::Args;
use knap_cloud::{AbortSignal, DeployAction};
use knap_core::BuildIntent;

use super::build::{BuildArgs, run_build};
use super::{Context, interrupt_signal};

#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Replace the service if it already exists
    #[arg(long)]
    pub force: bool,
}

pub async fn deploy(kubeconfig: Option<&Path>, args: &DeployArgs) -> anyhow::Result<()> {
    let ctx = Context::load(kubeconfig, args.build.namespace.as_deref())?;
    let intent = args.build.intent(&ctx.namespace)?;
    let signal = interrupt_signal();

    println!("Building {} with {}...", intent.name(), intent.builder());
    let image = run_build(&ctx, &intent, args.build.embedded, &signal).await?;
    println!("Image built: {image}");

    publish(&ctx, &intent, &image, args.force, &signal).await
}

/// Create or replace the service for `intent` and wait until it serves.
pub(super) async fn publish(
    ctx: &Context,
    intent: &BuildIntent,
    image: &str,
    force: bool,
    signal: &AbortSignal,
) -> anyhow::Result<()> {
    let deployer = ctx.deployer();
    let action = deployer
        .deploy(
            intent.name(),
            intent.namespace(),
            image,
            intent.service_account(),
            force,
        )
        .await?;
    match action {
        DeployAction::Created => println!("Service '{}' created", intent.name()),
        DeployAction::Replaced => println!("Service '{}' updated", intent.name()),
    }

    println!("Waiting for the service to become ready...");
    let url = deployer.await_ready(intent.name(), signal).await?;
    println!();
    println!("Service URL: {url}");
    Ok(())
}
