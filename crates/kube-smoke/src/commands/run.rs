//! Run command - check every target listed in a suite file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use kube_smoke::SuiteConfig;

use super::{check_all, CheckOptions};

/// Run a suite of smoke checks from a YAML file.
#[derive(Args)]
pub struct RunCommand {
    /// Suite configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,
}

impl RunCommand {
    /// Run the suite.
    ///
    /// # Errors
    ///
    /// Returns an error if the suite cannot be loaded, the cluster is
    /// unreachable, or any target fails.
    pub async fn run(&self, options: &CheckOptions) -> Result<()> {
        let suite = SuiteConfig::from_file(&self.config)?
            .with_overrides(options.strict, options.max_restarts_limit());
        info!(
            "Loaded {} targets from {}",
            suite.targets.len(),
            self.config.display()
        );

        let cluster = options.connect().await?;
        let results = check_all(&cluster, &suite.targets, &suite.policy).await;
        options.finish(&results)
    }
}
