//! Deployment command - smoke test the pods behind one deployment.

use anyhow::Result;
use clap::Args;

use kube_smoke::Target;

use super::{check_all, CheckOptions};

/// Check the pods selected by a deployment.
#[derive(Args)]
pub struct DeploymentCommand {
    /// Namespace of the deployment.
    namespace: String,

    /// Deployment name.
    name: String,
}

impl DeploymentCommand {
    /// Run the deployment check.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster is unreachable or the check fails.
    pub async fn run(&self, options: &CheckOptions) -> Result<()> {
        let cluster = options.connect().await?;
        let target = Target::Deployment {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        };
        let results = check_all(&cluster, &[target], &options.policy()).await;
        options.finish(&results)
    }
}
