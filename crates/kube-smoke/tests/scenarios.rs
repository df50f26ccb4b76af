//! End-to-end smoke scenarios against an in-memory cluster.

use kube_smoke::testing::FakeCluster;
use kube_smoke::{
    check_target, resolve_namespace, CheckStatus, EvaluationPolicy, Reporter, Target, TestResults,
    Verdict,
};

/// Reporter that keeps raw calls for assertions.
#[derive(Default)]
struct RecordingReporter {
    calls: Vec<(CheckStatus, String, String)>,
}

impl Reporter for RecordingReporter {
    fn pass(&mut self, target: &str, message: String) {
        self.calls.push((CheckStatus::Pass, target.to_string(), message));
    }

    fn fail(&mut self, target: &str, message: String) {
        self.calls.push((CheckStatus::Fail, target.to_string(), message));
    }

    fn skip(&mut self, target: &str, message: String) {
        self.calls.push((CheckStatus::Skip, target.to_string(), message));
    }
}

fn deployment(name: &str) -> Target {
    Target::Deployment {
        namespace: "platform".into(),
        name: name.into(),
    }
}

fn namespace(name: &str) -> Target {
    Target::Namespace {
        namespace: name.into(),
    }
}

async fn check(cluster: &FakeCluster, target: &Target) -> (CheckStatus, String, String) {
    let mut reporter = RecordingReporter::default();
    check_target(cluster, target, &EvaluationPolicy::default(), &mut reporter).await;
    assert_eq!(reporter.calls.len(), 1, "exactly one verdict per target");
    reporter.calls.remove(0)
}

#[tokio::test]
async fn test_missing_deployment_is_skipped() {
    let cluster = FakeCluster::default().with_namespace("platform");

    let (status, target, message) = check(&cluster, &deployment("api")).await;
    assert_eq!(status, CheckStatus::Skip);
    assert_eq!(target, "api");
    assert!(message.contains("not found"));
}

#[tokio::test]
async fn test_healthy_deployment_passes() {
    let cluster = FakeCluster::default()
        .with_deployment("platform", "api", &[("app", "api")])
        .with_pod("platform", "api-0", "Running", &[("app", "api")])
        .with_pod("platform", "api-1", "Running", &[("app", "api")])
        .with_pod("platform", "api-2", "Running", &[("app", "api")]);

    let (status, target, message) = check(&cluster, &deployment("api")).await;
    assert_eq!(status, CheckStatus::Pass);
    assert_eq!(target, "api");
    assert_eq!(message, "3 of 3 pods passed");
    assert_eq!(cluster.event_calls(), 0);
}

#[tokio::test]
async fn test_failing_deployment_lists_each_failure() {
    let cluster = FakeCluster::default()
        .with_deployment("platform", "api", &[("app", "api")])
        .with_pod("platform", "api-0", "Failed", &[("app", "api")])
        .with_pod("platform", "api-1", "Running", &[("app", "api")])
        .with_pod("platform", "api-2", "Failed", &[("app", "api")])
        .with_event(
            "platform",
            "api-0",
            "Warning",
            "BackOff",
            "Back-off restarting failed container",
        )
        .with_event("platform", "api-2", "Normal", "Pulled", "Container image pulled")
        .with_event("platform", "api-2", "Warning", "OOMKilled", "Container exceeded memory limit");

    let (status, target, message) = check(&cluster, &deployment("api")).await;
    assert_eq!(status, CheckStatus::Fail);
    assert_eq!(target, "api");
    assert_eq!(
        message,
        "2 of 3 pods failed: \
         platform/api-0=Failed BackOff: Back-off restarting failed container. \
         platform/api-2=Failed OOMKilled: Container exceeded memory limit"
    );
}

#[tokio::test]
async fn test_deployment_without_pods_fails() {
    let cluster = FakeCluster::default()
        .with_deployment("platform", "api", &[("app", "api")])
        .with_pod("platform", "web-0", "Running", &[("app", "web")]);

    let (status, _, message) = check(&cluster, &deployment("api")).await;
    assert_eq!(status, CheckStatus::Fail);
    assert_eq!(message, "No pods found for api");
}

#[tokio::test]
async fn test_missing_namespace_is_skipped() {
    let cluster = FakeCluster::default();

    let (status, target, message) = check(&cluster, &namespace("feature-x")).await;
    assert_eq!(status, CheckStatus::Skip);
    assert_eq!(target, "feature-x");
    assert!(message.contains("namespace not found"));
}

#[tokio::test]
async fn test_empty_namespace_fails() {
    let cluster = FakeCluster::default().with_namespace("platform");

    let (status, target, message) = check(&cluster, &namespace("platform")).await;
    assert_eq!(status, CheckStatus::Fail);
    assert_eq!(target, "platform");
    assert!(message.contains("Expected pods but none running"));
}

#[tokio::test]
async fn test_strict_policy_catches_unready_pod() {
    let cluster = FakeCluster::default()
        .with_namespace("platform")
        .with_pod_manifest(serde_json::json!({
            "metadata": { "name": "api-0", "namespace": "platform" },
            "status": {
                "phase": "Running",
                "conditions": [
                    { "type": "Ready", "status": "False", "message": "readiness probe failed" }
                ]
            }
        }))
        .with_event("platform", "api-0", "Warning", "Unhealthy", "Readiness probe failed: 503");

    let mut results = TestResults::new();
    let target = namespace("platform");
    check_target(&cluster, &target, &EvaluationPolicy::default(), &mut results).await;
    let strict = EvaluationPolicy {
        strict_conditions: true,
        max_restarts: None,
    };
    check_target(&cluster, &target, &strict, &mut results).await;

    assert_eq!(results.checks[0].status, CheckStatus::Pass);
    assert_eq!(results.checks[1].status, CheckStatus::Fail);
    assert_eq!(
        results.checks[1].details,
        "1 of 1 pods failed: platform/api-0=Running Ready=False: readiness probe failed \
         Unhealthy: Readiness probe failed: 503"
    );
}

#[tokio::test]
async fn test_strict_policy_passes_completed_job_pods() {
    let cluster = FakeCluster::default().with_pod_manifest(serde_json::json!({
        "metadata": { "name": "migrate-x", "namespace": "platform" },
        "status": {
            "phase": "Succeeded",
            "conditions": [
                { "type": "Ready", "status": "False", "reason": "PodCompleted" },
                { "type": "ContainersReady", "status": "False", "reason": "PodCompleted" }
            ]
        }
    }));

    let strict = EvaluationPolicy {
        strict_conditions: true,
        max_restarts: None,
    };
    let verdict = resolve_namespace(&cluster, "platform", &strict).await;
    assert_eq!(verdict, Verdict::Pass("1 of 1 pods passed".into()));
}

#[tokio::test]
async fn test_suite_collects_every_target() {
    let cluster = FakeCluster::default()
        .with_deployment("platform", "api", &[("app", "api")])
        .with_pod("platform", "api-0", "Running", &[("app", "api")])
        .with_pod("platform", "worker-0", "Pending", &[("app", "worker")]);

    let targets = vec![
        deployment("api"),
        deployment("billing"),
        namespace("platform"),
        namespace("empty"),
    ];

    let mut results = TestResults::new();
    for target in &targets {
        check_target(&cluster, target, &EvaluationPolicy::default(), &mut results).await;
    }

    let statuses: Vec<CheckStatus> = results.checks.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![
            CheckStatus::Pass,
            CheckStatus::Skip,
            CheckStatus::Fail,
            CheckStatus::Skip
        ]
    );
    assert_eq!(results.checks[2].details, "1 of 2 pods failed: platform/worker-0=Pending");
    assert!(!results.all_passed());
}

#[tokio::test]
async fn test_repeated_checks_are_identical() {
    let cluster = FakeCluster::default()
        .with_deployment("platform", "api", &[("app", "api")])
        .with_pod("platform", "api-0", "Unknown", &[("app", "api")])
        .with_event("platform", "api-0", "Warning", "NodeLost", "node unreachable");

    let first = check(&cluster, &deployment("api")).await;
    let second = check(&cluster, &deployment("api")).await;
    assert_eq!(first, second);
}
