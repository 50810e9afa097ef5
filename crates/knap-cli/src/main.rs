mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{BuildArgs, DeployArgs, RedeployArgs};

#[derive(Parser)]
#[command(
    name = "knap",
    about = "Build images with Tekton and serve them with Knative"
)]
#[command(version)]
struct Cli {
    /// Path to the kubeconfig file (default: $KUBECONFIG, then knap.toml)
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an image from a git repository or inline code
    Build(BuildArgs),
    /// Build an image and deploy it as a Knative service
    Deploy(DeployArgs),
    /// Rebuild and redeploy, recovering omitted flags from the last build
    Redeploy(RedeployArgs),
    /// Manage builder templates
    Builder {
        #[command(subcommand)]
        action: BuilderAction,
    },
}

#[derive(Subcommand)]
enum BuilderAction {
    /// Install the default source-to-image Task
    Install {
        /// Namespace to install into (default: [cluster].namespace)
        #[arg(long, short = 'n', env = "KNAP_NAMESPACE")]
        namespace: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let kubeconfig = cli.kubeconfig.as_deref();

    match cli.command {
        Commands::Build(args) => commands::build(kubeconfig, &args).await?,
        Commands::Deploy(args) => commands::deploy(kubeconfig, &args).await?,
        Commands::Redeploy(args) => commands::redeploy(kubeconfig, &args).await?,
        Commands::Builder { action } => match action {
            BuilderAction::Install { namespace } => {
                commands::builder_install(kubeconfig, namespace.as_deref()).await?
            }
        },
    }

    Ok(())
}
