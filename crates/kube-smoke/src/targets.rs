//! Resolve a deployment or namespace to its pods and judge them.
//!
//! Absent targets are skipped, existing targets without pods fail, and any
//! other API error fails the target with the error text. Nothing here returns
//! an error to the caller: every path ends in a [`Verdict`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::evaluate_pods;
use crate::cluster::{selector_string, ClusterClient};
use crate::evaluate::EvaluationPolicy;
use crate::model::PodSnapshot;
use crate::report::{Reporter, Verdict};

/// Something to smoke test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Target {
    /// Pods selected by a deployment's selector.
    Deployment { namespace: String, name: String },
    /// Every pod in a namespace.
    Namespace { namespace: String },
}

impl Target {
    /// Name the verdict is reported under.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Deployment { name, .. } => name,
            Self::Namespace { namespace } => namespace,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::Deployment { namespace, .. } | Self::Namespace { namespace } => namespace,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deployment { namespace, name } => write!(f, "deployment/{namespace}/{name}"),
            Self::Namespace { namespace } => write!(f, "namespace/{namespace}"),
        }
    }
}

/// Check a target and report the verdict under its name.
pub async fn check_target<C>(
    cluster: &C,
    target: &Target,
    policy: &EvaluationPolicy,
    reporter: &mut dyn Reporter,
) where
    C: ClusterClient + ?Sized,
{
    let verdict = match target {
        Target::Deployment { namespace, name } => {
            resolve_deployment(cluster, namespace, name, policy).await
        }
        Target::Namespace { namespace } => resolve_namespace(cluster, namespace, policy).await,
    };
    verdict.report(target.name(), reporter);
}

/// Judge the pods selected by a deployment.
pub async fn resolve_deployment<C>(
    cluster: &C,
    namespace: &str,
    name: &str,
    policy: &EvaluationPolicy,
) -> Verdict
where
    C: ClusterClient + ?Sized,
{
    let deployment = match cluster.get_deployment(namespace, name).await {
        Ok(deployment) => deployment,
        Err(e) if e.is_not_found() => {
            info!(namespace = %namespace, deployment = %name, "Deployment not found, skipping");
            return Verdict::Skip("deployment not found".to_string());
        }
        Err(e) => {
            return Verdict::Fail(format!(
                "Failed to get deployment {namespace}/{name}: {e}"
            ))
        }
    };

    let Some(spec) = deployment.spec.as_ref() else {
        return Verdict::Fail(format!("Deployment {namespace}/{name} has no spec"));
    };
    let selector = match selector_string(&spec.selector) {
        Ok(selector) => selector,
        Err(e) => {
            return Verdict::Fail(format!(
                "Invalid selector for deployment {namespace}/{name}: {e}"
            ))
        }
    };
    debug!(namespace = %namespace, deployment = %name, selector = %selector, "Resolved selector");

    let pods = match cluster.list_pods(namespace, Some(&selector)).await {
        Ok(pods) => pods,
        Err(e) => return Verdict::Fail(format!("Failed to get pods for {name}: {e}")),
    };
    if pods.is_empty() {
        warn!(namespace = %namespace, deployment = %name, "No pods matched deployment selector");
        return Verdict::Fail(format!("No pods found for {name}"));
    }

    let snapshots: Vec<PodSnapshot> = pods
        .iter()
        .map(|p| PodSnapshot::from_pod(p, namespace))
        .collect();
    evaluate_pods(cluster, &snapshots, policy).await.verdict()
}

/// Judge every pod in a namespace.
pub async fn resolve_namespace<C>(
    cluster: &C,
    namespace: &str,
    policy: &EvaluationPolicy,
) -> Verdict
where
    C: ClusterClient + ?Sized,
{
    let pods = match cluster.list_pods(namespace, None).await {
        Ok(pods) => pods,
        Err(e) => return Verdict::Fail(format!("Failed to get pods for {namespace}: {e}")),
    };

    if pods.is_empty() {
        return match cluster.get_namespace(namespace).await {
            Err(e) if e.is_not_found() => {
                info!(namespace = %namespace, "Namespace not found, skipping");
                Verdict::Skip(format!("[{namespace}] namespace not found, skipping"))
            }
            Err(e) => Verdict::Fail(format!("[{namespace}] Failed to get namespace: {e}")),
            Ok(_) => Verdict::Fail(format!(
                "[{namespace}] Expected pods but none running - did you deploy?"
            )),
        };
    }

    let snapshots: Vec<PodSnapshot> = pods
        .iter()
        .map(|p| PodSnapshot::from_pod(p, namespace))
        .collect();
    evaluate_pods(cluster, &snapshots, policy).await.verdict()
}
