use std::path::Path;

use knap_cloud::{ReconcileAction, install_default_builder};

use super::Context;

pub async fn builder_install(
    kubeconfig: Option<&Path>,
    namespace: Option<&str>,
) -> anyhow::Result<()> {
    let ctx = Context::load(kubeconfig, namespace)?;
    let (task, action) =
        install_default_builder(&ctx.store, &ctx.namespace, ctx.config.build.retry_policy())
            .await?;

    let verb = match action {
        ReconcileAction::Created => "installed",
        ReconcileAction::Updated => "updated",
    };
    println!(
        "Builder task '{}' {verb} in namespace '{}'",
        task.name, ctx.namespace
    );
    println!(
        "Use it with: knap build <name> -b {} -u <git-url> -i <image>",
        task.name
    );
    Ok(())
}
