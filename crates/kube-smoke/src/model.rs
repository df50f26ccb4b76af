//! Snapshots of the cluster objects the health checks read.
//!
//! Pods and events arrive as `k8s_openapi` objects; they are reduced here to
//! the handful of fields the evaluator looks at so the rest of the crate never
//! has to dig through nested `Option`s.

use std::fmt;

use k8s_openapi::api::core::v1::{Event, Pod};

/// Coarse lifecycle phase of a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl Phase {
    /// Parse the `status.phase` string reported by the API server.
    ///
    /// A missing or unrecognised phase is treated as `Unknown`.
    #[must_use]
    pub fn from_status(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => Self::Pending,
            Some("Running") => Self::Running,
            Some("Succeeded") => Self::Succeeded,
            Some("Failed") => Self::Failed,
            _ => Self::Unknown,
        }
    }

    /// Running and completed pods both count as healthy.
    #[must_use]
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Running | Self::Succeeded)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Namespace and name of a pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRef {
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A single entry of `status.conditions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodCondition {
    /// Condition type, e.g. `Ready` or `ContainersReady`.
    pub kind: String,
    /// `True`, `False` or `Unknown`.
    pub status: String,
    pub message: String,
}

impl PodCondition {
    #[must_use]
    pub fn is_false(&self) -> bool {
        self.status == "False"
    }
}

/// Restart bookkeeping for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRestarts {
    pub container: String,
    pub count: i32,
}

/// Read-only view of a pod at the moment it was listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodSnapshot {
    pub pod: PodRef,
    pub phase: Phase,
    pub conditions: Vec<PodCondition>,
    pub restarts: Vec<ContainerRestarts>,
}

impl PodSnapshot {
    /// Build a snapshot from a listed pod.
    ///
    /// `fallback_namespace` is used when the object carries no namespace,
    /// which happens with some fake or trimmed list responses.
    #[must_use]
    pub fn from_pod(pod: &Pod, fallback_namespace: &str) -> Self {
        let namespace = pod
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| fallback_namespace.to_string());
        let name = pod
            .metadata
            .name
            .clone()
            .unwrap_or_else(|| "unknown".to_string());

        let status = pod.status.as_ref();
        let phase = Phase::from_status(status.and_then(|s| s.phase.as_deref()));

        let conditions = status
            .and_then(|s| s.conditions.as_ref())
            .map(|conditions| {
                conditions
                    .iter()
                    .map(|c| PodCondition {
                        kind: c.type_.clone(),
                        status: c.status.clone(),
                        message: c.message.clone().unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let restarts = status
            .and_then(|s| s.container_statuses.as_ref())
            .map(|statuses| {
                statuses
                    .iter()
                    .map(|c| ContainerRestarts {
                        container: c.name.clone(),
                        count: c.restart_count,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            pod: PodRef { namespace, name },
            phase,
            conditions,
            restarts,
        }
    }
}

/// Event severity. Anything other than `Normal` is worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Other(String),
}

impl Severity {
    #[must_use]
    pub fn from_type(type_: Option<&str>) -> Self {
        match type_ {
            Some("Normal") => Self::Normal,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other(String::new()),
        }
    }
}

/// A cluster-emitted note about a pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    /// Name of the involved object.
    pub object: String,
    pub severity: Severity,
    pub reason: String,
    pub message: String,
}

impl From<&Event> for DiagnosticEvent {
    fn from(event: &Event) -> Self {
        Self {
            object: event.involved_object.name.clone().unwrap_or_default(),
            severity: Severity::from_type(event.type_.as_deref()),
            reason: event.reason.clone().unwrap_or_default(),
            message: event.message.clone().unwrap_or_default(),
        }
    }
}
