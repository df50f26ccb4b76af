//! Kubernetes smoke tests.
//!
//! Judges the pods behind a deployment or inside a namespace and reports one
//! pass, fail or skip verdict per target.
//!
//! # Example
//!
//! ```ignore
//! use kube_smoke::{check_target, EvaluationPolicy, KubeCluster, Target, TestResults};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cluster = KubeCluster::try_default().await?;
//!     let mut results = TestResults::new();
//!     let target = Target::Namespace { namespace: "kube-system".into() };
//!     check_target(&cluster, &target, &EvaluationPolicy::default(), &mut results).await;
//!     results.print_summary();
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod digest;
pub mod evaluate;
pub mod model;
pub mod report;
pub mod targets;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types at the crate root
pub use aggregate::{evaluate_pods, AggregateOutcome};
pub use cluster::{ClusterClient, ClusterError, KubeCluster};
pub use config::SuiteConfig;
pub use evaluate::{evaluate_pod, EvaluationOutcome, EvaluationPolicy, PodFailure};
pub use model::{DiagnosticEvent, Phase, PodRef, PodSnapshot};
pub use report::{CheckStatus, Reporter, TestResults, Verdict};
pub use targets::{check_target, resolve_deployment, resolve_namespace, Target};
