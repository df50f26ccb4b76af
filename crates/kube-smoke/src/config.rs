//! Suite configuration.
//!
//! A suite file lists the targets to check and the evaluation policy:
//!
//! ```yaml
//! strictConditions: false
//! maxRestarts: 3
//! targets:
//!   - kind: deployment
//!     namespace: platform
//!     name: controller
//!   - kind: namespace
//!     namespace: kube-system
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::evaluate::EvaluationPolicy;
use crate::targets::Target;

/// Targets plus the policy used to judge them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteConfig {
    #[serde(flatten)]
    pub policy: EvaluationPolicy,
    pub targets: Vec<Target>,
}

impl SuiteConfig {
    /// Load and validate a suite from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read suite config from {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid suite config {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate a suite from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).context("Failed to parse suite config YAML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            anyhow::bail!("Suite config must list at least one target");
        }
        for target in &self.targets {
            if target.namespace().is_empty() || target.name().is_empty() {
                anyhow::bail!("Target {target} has an empty namespace or name");
            }
        }
        if let Some(limit) = self.policy.max_restarts {
            if limit < 0 {
                anyhow::bail!("maxRestarts must not be negative, got {limit}");
            }
        }
        Ok(())
    }

    /// Apply command line overrides on top of the file policy.
    #[must_use]
    pub fn with_overrides(mut self, strict: bool, max_restarts: Option<i32>) -> Self {
        if strict {
            self.policy.strict_conditions = true;
        }
        if max_restarts.is_some() {
            self.policy.max_restarts = max_restarts;
        }
        self
    }
}
