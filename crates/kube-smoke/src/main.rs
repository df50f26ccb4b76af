//! kube-smoke CLI.
//!
//! Post-deployment smoke tests: checks that the pods behind a deployment or
//! inside a namespace are actually healthy right now.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::deployment::DeploymentCommand;
use commands::namespace::NamespaceCommand;
use commands::run::RunCommand;
use commands::CheckOptions;

/// kube-smoke - Kubernetes smoke tests.
#[derive(Parser)]
#[command(
    name = "kube-smoke",
    version,
    about = "Smoke test Kubernetes deployments and namespaces",
    long_about = "Check that the pods behind a deployment, or every pod in a namespace,\n\
                  are Running or Succeeded. Failing pods are explained with their\n\
                  warning events. Missing targets are skipped; targets that exist\n\
                  but have no pods fail."
)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    options: CheckOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the pods selected by a deployment.
    Deployment(DeploymentCommand),

    /// Check every pod in a namespace.
    Namespace(NamespaceCommand),

    /// Check all targets listed in a suite file.
    Run(RunCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info,kube_smoke=debug")
    } else {
        EnvFilter::new("warn,kube_smoke=info")
    };

    // Logs go to stderr so `--json` output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Deployment(cmd) => cmd.run(&cli.options).await,
        Commands::Namespace(cmd) => cmd.run(&cli.options).await,
        Commands::Run(cmd) => cmd.run(&cli.options).await,
    }
}
