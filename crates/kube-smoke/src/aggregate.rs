//! Roll per-pod outcomes up into one verdict.

use crate::cluster::ClusterClient;
use crate::evaluate::{evaluate_pod, EvaluationOutcome, EvaluationPolicy, PodFailure};
use crate::model::PodSnapshot;
use crate::report::Verdict;

/// Counts and failure descriptions for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateOutcome {
    /// Number of pods evaluated.
    pub total: usize,
    /// Unhealthy pods, in evaluation order.
    pub failures: Vec<PodFailure>,
}

impl AggregateOutcome {
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.total.saturating_sub(self.failures.len())
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Render the pass or fail message.
    #[must_use]
    pub fn message(&self) -> String {
        if self.all_passed() {
            return format!("{} of {} pods passed", self.total, self.total);
        }
        let descriptions = self
            .failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(". ");
        format!(
            "{} of {} pods failed: {descriptions}",
            self.failed_count(),
            self.total
        )
    }

    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.all_passed() {
            Verdict::Pass(self.message())
        } else {
            Verdict::Fail(self.message())
        }
    }
}

/// Evaluate every pod in order and collect the failures.
pub async fn evaluate_pods<C>(
    cluster: &C,
    pods: &[PodSnapshot],
    policy: &EvaluationPolicy,
) -> AggregateOutcome
where
    C: ClusterClient + ?Sized,
{
    let mut outcome = AggregateOutcome {
        total: pods.len(),
        failures: Vec::new(),
    };

    for pod in pods {
        if let EvaluationOutcome::Unhealthy(failure) = evaluate_pod(cluster, pod, policy).await {
            outcome.failures.push(failure);
        }
    }

    outcome
}
