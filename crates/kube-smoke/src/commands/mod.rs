//! Subcommands of the `kube-smoke` CLI.

pub mod deployment;
pub mod namespace;
pub mod run;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use kube_smoke::{ClusterClient, EvaluationPolicy, KubeCluster, Target, TestResults};

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckOptions {
    /// Path to kubeconfig file. Falls back to in-cluster or default config.
    #[arg(long, env = "KUBECONFIG", global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Fail running pods that report a condition with status False.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Fail pods with a container restarted more than this many times.
    #[arg(long, value_name = "N", global = true)]
    pub max_restarts: Option<u32>,

    /// Output results as JSON.
    #[arg(long, global = true)]
    pub json: bool,
}

impl CheckOptions {
    /// Policy from the command line flags alone.
    pub fn policy(&self) -> EvaluationPolicy {
        EvaluationPolicy {
            strict_conditions: self.strict,
            max_restarts: self.max_restarts_limit(),
        }
    }

    pub fn max_restarts_limit(&self) -> Option<i32> {
        self.max_restarts
            .map(|n| i32::try_from(n).unwrap_or(i32::MAX))
    }

    /// Connect to the cluster.
    pub async fn connect(&self) -> Result<KubeCluster> {
        match &self.kubeconfig {
            Some(path) => {
                info!("Kubeconfig: {}", path.display());
                KubeCluster::from_kubeconfig(path).await
            }
            None => KubeCluster::try_default().await,
        }
    }

    /// Print the results and turn failures into an error exit.
    pub fn finish(&self, results: &TestResults) -> Result<()> {
        if self.json {
            println!("{}", results.to_json()?);
        } else {
            results.print_summary();
        }

        if results.all_passed() {
            Ok(())
        } else {
            anyhow::bail!(
                "{} of {} smoke checks failed",
                results.failed_count(),
                results.total_checks()
            );
        }
    }
}

/// Check targets in order into one result book.
pub async fn check_all(
    cluster: &dyn ClusterClient,
    targets: &[Target],
    policy: &EvaluationPolicy,
) -> TestResults {
    let mut results = TestResults::new();
    for target in targets {
        info!("Checking {target}");
        kube_smoke::check_target(cluster, target, policy, &mut results).await;
    }
    results
}
