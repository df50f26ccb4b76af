//! In-memory [`ClusterClient`] for tests.
//!
//! Only compiled for unit tests or with the `testing` feature.
//!
//! Objects are built from JSON manifests so they deserialize exactly like
//! API server responses.

// Builders panic on malformed manifests; they only run in tests.
#![allow(clippy::missing_panics_doc)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Event, Namespace, Pod};
use serde_json::json;

use crate::cluster::{ClusterClient, ClusterError};

/// A fake cluster holding deployments, pods, events and namespaces.
#[derive(Default)]
pub struct FakeCluster {
    namespaces: BTreeSet<String>,
    deployments: Vec<Deployment>,
    pods: Vec<Pod>,
    events: Vec<Event>,
    deployment_error: Option<String>,
    pod_error: Option<String>,
    event_error: Option<String>,
    namespace_error: Option<String>,
    event_calls: AtomicUsize,
}

impl FakeCluster {
    #[must_use]
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespaces.insert(namespace.to_string());
        self
    }

    /// Add a deployment selecting pods by `match_labels`. Also registers the namespace.
    #[must_use]
    pub fn with_deployment(
        mut self,
        namespace: &str,
        name: &str,
        labels: &[(&str, &str)],
    ) -> Self {
        let match_labels: BTreeMap<&str, &str> = labels.iter().copied().collect();
        self.namespaces.insert(namespace.to_string());
        self.deployments.push(
            serde_json::from_value(json!({
                "metadata": { "name": name, "namespace": namespace },
                "spec": {
                    "selector": { "matchLabels": match_labels },
                    "template": { "metadata": { "labels": match_labels } }
                }
            }))
            .expect("valid deployment manifest"),
        );
        self
    }

    /// Add a raw deployment manifest.
    #[must_use]
    pub fn with_deployment_manifest(mut self, manifest: serde_json::Value) -> Self {
        let deployment: Deployment =
            serde_json::from_value(manifest).expect("valid deployment manifest");
        if let Some(ns) = &deployment.metadata.namespace {
            self.namespaces.insert(ns.clone());
        }
        self.deployments.push(deployment);
        self
    }

    /// Add a pod in the given phase. Also registers the namespace.
    #[must_use]
    pub fn with_pod(
        mut self,
        namespace: &str,
        name: &str,
        phase: &str,
        labels: &[(&str, &str)],
    ) -> Self {
        let labels: BTreeMap<&str, &str> = labels.iter().copied().collect();
        self.namespaces.insert(namespace.to_string());
        self.pods.push(
            serde_json::from_value(json!({
                "metadata": { "name": name, "namespace": namespace, "labels": labels },
                "status": { "phase": phase }
            }))
            .expect("valid pod manifest"),
        );
        self
    }

    /// Add a raw pod manifest.
    #[must_use]
    pub fn with_pod_manifest(mut self, manifest: serde_json::Value) -> Self {
        let pod: Pod = serde_json::from_value(manifest).expect("valid pod manifest");
        if let Some(ns) = &pod.metadata.namespace {
            self.namespaces.insert(ns.clone());
        }
        self.pods.push(pod);
        self
    }

    #[must_use]
    pub fn with_event(
        mut self,
        namespace: &str,
        pod: &str,
        type_: &str,
        reason: &str,
        message: &str,
    ) -> Self {
        let name = format!("{pod}.{}", self.events.len());
        self.events.push(
            serde_json::from_value(json!({
                "metadata": { "name": name, "namespace": namespace },
                "involvedObject": { "kind": "Pod", "name": pod, "namespace": namespace },
                "type": type_,
                "reason": reason,
                "message": message
            }))
            .expect("valid event manifest"),
        );
        self
    }

    #[must_use]
    pub fn failing_deployments(mut self, message: &str) -> Self {
        self.deployment_error = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn failing_pods(mut self, message: &str) -> Self {
        self.pod_error = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn failing_events(mut self, message: &str) -> Self {
        self.event_error = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn failing_namespaces(mut self, message: &str) -> Self {
        self.namespace_error = Some(message.to_string());
        self
    }

    /// Number of `list_events` calls served so far.
    pub fn event_calls(&self) -> usize {
        self.event_calls.load(Ordering::SeqCst)
    }
}

fn server_error(message: &str) -> ClusterError {
    ClusterError::Api {
        code: 500,
        message: message.to_string(),
    }
}

/// Match pod labels against a selector string of the form rendered by
/// [`crate::cluster::selector_string`].
fn selector_matches(selector: &str, labels: &BTreeMap<String, String>) -> bool {
    split_selector(selector).iter().all(|req| {
        let req = req.trim();
        if let Some((key, rest)) = req.split_once(" notin ") {
            let values = set_values(rest);
            labels.get(key).is_none_or(|v| !values.contains(&v.as_str()))
        } else if let Some((key, rest)) = req.split_once(" in ") {
            let values = set_values(rest);
            labels.get(key).is_some_and(|v| values.contains(&v.as_str()))
        } else if let Some((key, value)) = req.split_once('=') {
            labels.get(key).is_some_and(|v| v == value)
        } else if let Some(key) = req.strip_prefix('!') {
            !labels.contains_key(key)
        } else {
            labels.contains_key(req)
        }
    })
}

fn set_values(rest: &str) -> Vec<&str> {
    rest.trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .collect()
}

fn split_selector(selector: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in selector.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&selector[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < selector.len() {
        parts.push(&selector[start..]);
    }
    parts
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Deployment, ClusterError> {
        if let Some(message) = &self.deployment_error {
            return Err(server_error(message));
        }
        self.deployments
            .iter()
            .find(|d| {
                d.metadata.namespace.as_deref() == Some(namespace)
                    && d.metadata.name.as_deref() == Some(name)
            })
            .cloned()
            .ok_or_else(|| ClusterError::NotFound {
                kind: "deployment",
                name: name.to_string(),
            })
    }

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Pod>, ClusterError> {
        if let Some(message) = &self.pod_error {
            return Err(server_error(message));
        }
        let empty = BTreeMap::new();
        Ok(self
            .pods
            .iter()
            .filter(|p| p.metadata.namespace.as_deref() == Some(namespace))
            .filter(|p| {
                let labels = p.metadata.labels.as_ref().unwrap_or(&empty);
                label_selector.is_none_or(|s| selector_matches(s, labels))
            })
            .cloned()
            .collect())
    }

    async fn list_events(
        &self,
        namespace: &str,
        pod_name: &str,
    ) -> Result<Vec<Event>, ClusterError> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.event_error {
            return Err(server_error(message));
        }
        Ok(self
            .events
            .iter()
            .filter(|e| e.metadata.namespace.as_deref() == Some(namespace))
            .filter(|e| e.involved_object.name.as_deref() == Some(pod_name))
            .cloned()
            .collect())
    }

    async fn get_namespace(&self, name: &str) -> Result<Namespace, ClusterError> {
        if let Some(message) = &self.namespace_error {
            return Err(server_error(message));
        }
        if self.namespaces.contains(name) {
            Ok(serde_json::from_value(json!({ "metadata": { "name": name } }))
                .map_err(|e| server_error(&e.to_string()))?)
        } else {
            Err(ClusterError::NotFound {
                kind: "namespace",
                name: name.to_string(),
            })
        }
    }
}
