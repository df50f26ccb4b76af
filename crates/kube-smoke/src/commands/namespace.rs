//! Namespace command - smoke test every pod in a namespace.

use anyhow::Result;
use clap::Args;

use kube_smoke::Target;

use super::{check_all, CheckOptions};

/// Check all pods in a namespace.
#[derive(Args)]
pub struct NamespaceCommand {
    /// Namespace to check.
    namespace: String,
}

impl NamespaceCommand {
    /// Run the namespace check.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster is unreachable or the check fails.
    pub async fn run(&self, options: &CheckOptions) -> Result<()> {
        let cluster = options.connect().await?;
        let target = Target::Namespace {
            namespace: self.namespace.clone(),
        };
        let results = check_all(&cluster, &[target], &options.policy()).await;
        options.finish(&results)
    }
}
