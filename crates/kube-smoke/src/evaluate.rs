//! Per-pod health evaluation.
//!
//! A pod is healthy when its phase is `Running` or `Succeeded` and the
//! [`EvaluationPolicy`] raises no findings. Anything else is explained with
//! the pod's non-`Normal` events, fetched only for pods that need them.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cluster::ClusterClient;
use crate::digest::digest_events;
use crate::model::{DiagnosticEvent, Phase, PodRef, PodSnapshot};

/// Extra rules applied on top of the phase check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationPolicy {
    /// Treat any condition with status `False` on a running pod as a failure.
    #[serde(default)]
    pub strict_conditions: bool,
    /// Fail pods with a container restarted more often than this.
    #[serde(default)]
    pub max_restarts: Option<i32>,
}

impl EvaluationPolicy {
    /// Findings the policy raises against a snapshot, in a stable order.
    ///
    /// Conditions are only checked on `Running` pods: the kubelet leaves
    /// `Ready=False` on every completed pod.
    #[must_use]
    pub fn findings(&self, snapshot: &PodSnapshot) -> Vec<Finding> {
        let mut findings = Vec::new();

        if self.strict_conditions && snapshot.phase == Phase::Running {
            for condition in snapshot.conditions.iter().filter(|c| c.is_false()) {
                findings.push(Finding::ConditionFalse {
                    kind: condition.kind.clone(),
                    message: condition.message.clone(),
                });
            }
        }

        if let Some(limit) = self.max_restarts {
            for restarts in snapshot.restarts.iter().filter(|r| r.count > limit) {
                findings.push(Finding::Restarts {
                    container: restarts.container.clone(),
                    count: restarts.count,
                    limit,
                });
            }
        }

        findings
    }
}

/// A policy violation on an otherwise running pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    ConditionFalse { kind: String, message: String },
    Restarts { container: String, count: i32, limit: i32 },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConditionFalse { kind, message } if message.is_empty() => {
                write!(f, "{kind}=False")
            }
            Self::ConditionFalse { kind, message } => write!(f, "{kind}=False: {message}"),
            Self::Restarts {
                container,
                count,
                limit,
            } => write!(f, "{container} restarted {count} times (limit {limit})"),
        }
    }
}

/// Why a pod was judged unhealthy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// Policy findings plus the digest of the pod's warning events.
    Diagnosed {
        findings: Vec<Finding>,
        digest: String,
    },
    /// The events could not be fetched.
    EventFetch { error: String },
}

/// Structured description of an unhealthy pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodFailure {
    pub pod: PodRef,
    pub phase: Phase,
    pub cause: FailureCause,
}

impl fmt::Display for PodFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            FailureCause::EventFetch { error } => write!(
                f,
                "{} => {}, failed to get events {error}",
                self.pod.name, self.phase
            ),
            FailureCause::Diagnosed { findings, digest } => {
                write!(f, "{}={}", self.pod, self.phase)?;
                for finding in findings {
                    write!(f, " {finding}")?;
                }
                if !digest.is_empty() {
                    write!(f, " {digest}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for PodFailure {}

/// Result of evaluating one pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    Healthy,
    Unhealthy(PodFailure),
}

/// Evaluate a single pod.
///
/// Events are only fetched when the pod is not healthy. A failed event fetch
/// still yields an unhealthy outcome; nothing is retried.
pub async fn evaluate_pod<C>(
    cluster: &C,
    snapshot: &PodSnapshot,
    policy: &EvaluationPolicy,
) -> EvaluationOutcome
where
    C: ClusterClient + ?Sized,
{
    let findings = policy.findings(snapshot);
    if snapshot.phase.is_healthy() && findings.is_empty() {
        debug!(pod = %snapshot.pod, phase = %snapshot.phase, "Pod healthy");
        return EvaluationOutcome::Healthy;
    }

    let cause = match cluster
        .list_events(&snapshot.pod.namespace, &snapshot.pod.name)
        .await
    {
        Ok(events) => {
            let events: Vec<DiagnosticEvent> = events.iter().map(DiagnosticEvent::from).collect();
            FailureCause::Diagnosed {
                findings,
                digest: digest_events(&events),
            }
        }
        Err(e) => FailureCause::EventFetch {
            error: e.to_string(),
        },
    };

    let failure = PodFailure {
        pod: snapshot.pod.clone(),
        phase: snapshot.phase,
        cause,
    };
    warn!(pod = %snapshot.pod, phase = %snapshot.phase, "Pod unhealthy: {failure}");
    EvaluationOutcome::Unhealthy(failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerRestarts, PodCondition};
    use crate::testing::FakeCluster;

    fn snapshot(name: &str, phase: Phase) -> PodSnapshot {
        PodSnapshot {
            pod: PodRef {
                namespace: "platform".into(),
                name: name.into(),
            },
            phase,
            conditions: vec![],
            restarts: vec![],
        }
    }

    #[tokio::test]
    async fn test_running_pod_is_healthy_despite_warnings() {
        let cluster = FakeCluster::default().with_event(
            "platform",
            "api-0",
            "Warning",
            "BackOff",
            "restarting",
        );
        let outcome =
            evaluate_pod(&cluster, &snapshot("api-0", Phase::Running), &EvaluationPolicy::default())
                .await;
        assert_eq!(outcome, EvaluationOutcome::Healthy);
        assert_eq!(cluster.event_calls(), 0);
    }

    #[tokio::test]
    async fn test_succeeded_pod_is_healthy() {
        let cluster = FakeCluster::default();
        let outcome = evaluate_pod(
            &cluster,
            &snapshot("job-0", Phase::Succeeded),
            &EvaluationPolicy::default(),
        )
        .await;
        assert_eq!(outcome, EvaluationOutcome::Healthy);
    }

    #[tokio::test]
    async fn test_failed_pod_reports_events() {
        let cluster = FakeCluster::default()
            .with_event("platform", "api-0", "Normal", "Pulled", "image pulled")
            .with_event("platform", "api-0", "Warning", "BackOff", "restarting")
            .with_event("platform", "api-1", "Warning", "OOMKilled", "other pod");

        let outcome =
            evaluate_pod(&cluster, &snapshot("api-0", Phase::Failed), &EvaluationPolicy::default())
                .await;
        let EvaluationOutcome::Unhealthy(failure) = outcome else {
            panic!("expected unhealthy outcome");
        };
        assert_eq!(failure.to_string(), "platform/api-0=Failed BackOff: restarting");
    }

    #[tokio::test]
    async fn test_pending_pod_without_events() {
        let cluster = FakeCluster::default();
        let outcome = evaluate_pod(
            &cluster,
            &snapshot("api-0", Phase::Pending),
            &EvaluationPolicy::default(),
        )
        .await;
        let EvaluationOutcome::Unhealthy(failure) = outcome else {
            panic!("expected unhealthy outcome");
        };
        assert_eq!(failure.to_string(), "platform/api-0=Pending");
    }

    #[tokio::test]
    async fn test_event_fetch_failure() {
        let cluster = FakeCluster::default().failing_events("connection refused");
        let outcome = evaluate_pod(
            &cluster,
            &snapshot("api-0", Phase::Unknown),
            &EvaluationPolicy::default(),
        )
        .await;
        let EvaluationOutcome::Unhealthy(failure) = outcome else {
            panic!("expected unhealthy outcome");
        };
        assert!(matches!(failure.cause, FailureCause::EventFetch { .. }));
        let message = failure.to_string();
        assert!(message.starts_with("api-0 => Unknown, failed to get events"));
        assert!(message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_strict_conditions() {
        let cluster = FakeCluster::default();
        let mut pod = snapshot("api-0", Phase::Running);
        pod.conditions = vec![
            PodCondition {
                kind: "PodScheduled".into(),
                status: "True".into(),
                message: String::new(),
            },
            PodCondition {
                kind: "Ready".into(),
                status: "False".into(),
                message: "containers with unready status: [api]".into(),
            },
        ];

        let relaxed = evaluate_pod(&cluster, &pod, &EvaluationPolicy::default()).await;
        assert_eq!(relaxed, EvaluationOutcome::Healthy);

        let strict = EvaluationPolicy {
            strict_conditions: true,
            ..Default::default()
        };
        let EvaluationOutcome::Unhealthy(failure) = evaluate_pod(&cluster, &pod, &strict).await
        else {
            panic!("expected unhealthy outcome");
        };
        assert_eq!(
            failure.to_string(),
            "platform/api-0=Running Ready=False: containers with unready status: [api]"
        );
    }

    #[tokio::test]
    async fn test_strict_conditions_ignore_completed_pods() {
        let cluster = FakeCluster::default();
        let mut pod = snapshot("migrate-x", Phase::Succeeded);
        pod.conditions = vec![
            PodCondition {
                kind: "Ready".into(),
                status: "False".into(),
                message: String::new(),
            },
            PodCondition {
                kind: "ContainersReady".into(),
                status: "False".into(),
                message: String::new(),
            },
        ];

        let strict = EvaluationPolicy {
            strict_conditions: true,
            ..Default::default()
        };
        assert!(strict.findings(&pod).is_empty());
        assert_eq!(
            evaluate_pod(&cluster, &pod, &strict).await,
            EvaluationOutcome::Healthy
        );
        assert_eq!(cluster.event_calls(), 0);
    }

    #[tokio::test]
    async fn test_restart_limit() {
        let cluster = FakeCluster::default();
        let mut pod = snapshot("api-0", Phase::Running);
        pod.restarts = vec![
            ContainerRestarts {
                container: "api".into(),
                count: 5,
            },
            ContainerRestarts {
                container: "sidecar".into(),
                count: 1,
            },
        ];

        let policy = EvaluationPolicy {
            max_restarts: Some(3),
            ..Default::default()
        };
        let EvaluationOutcome::Unhealthy(failure) = evaluate_pod(&cluster, &pod, &policy).await
        else {
            panic!("expected unhealthy outcome");
        };
        assert_eq!(
            failure.to_string(),
            "platform/api-0=Running api restarted 5 times (limit 3)"
        );

        let lenient = EvaluationPolicy {
            max_restarts: Some(5),
            ..Default::default()
        };
        assert_eq!(
            evaluate_pod(&cluster, &pod, &lenient).await,
            EvaluationOutcome::Healthy
        );
    }

    #[tokio::test]
    async fn test_evaluation_is_repeatable() {
        let cluster = FakeCluster::default().with_event(
            "platform",
            "api-0",
            "Warning",
            "Failed",
            "bad image",
        );
        let pod = snapshot("api-0", Phase::Pending);
        let policy = EvaluationPolicy::default();

        let first = evaluate_pod(&cluster, &pod, &policy).await;
        let second = evaluate_pod(&cluster, &pod, &policy).await;
        assert_eq!(first, second);
    }
}
