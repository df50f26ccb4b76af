//! Cluster access used by the smoke checks.
//!
//! The checks only need four read calls, so they go through the small
//! [`ClusterClient`] trait. [`KubeCluster`] implements it on top of
//! `kube::Client`; tests substitute an in-memory cluster.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Event, Namespace, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use thiserror::Error;
use tracing::debug;

/// Errors returned by cluster reads.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The requested object does not exist.
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    /// The API server answered with an error status.
    #[error("API error: {code} - {message}")]
    Api { code: u16, message: String },

    /// Transport, decoding or client configuration failure.
    #[error("Kubernetes client error: {0}")]
    Kube(#[source] kube::Error),
}

impl ClusterError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    fn from_kube(err: kube::Error, kind: &'static str, name: &str) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 404 => Self::NotFound {
                kind,
                name: name.to_string(),
            },
            kube::Error::Api(ae) => Self::Api {
                code: ae.code,
                message: ae.message,
            },
            other => Self::Kube(other),
        }
    }
}

/// Read-only cluster operations needed to smoke test a target.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Get a deployment by name.
    async fn get_deployment(&self, namespace: &str, name: &str)
        -> Result<Deployment, ClusterError>;

    /// List pods in a namespace, optionally filtered by a label selector.
    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Pod>, ClusterError>;

    /// List the events whose involved object is the named pod.
    async fn list_events(&self, namespace: &str, pod_name: &str)
        -> Result<Vec<Event>, ClusterError>;

    /// Get a namespace by name.
    async fn get_namespace(&self, name: &str) -> Result<Namespace, ClusterError>;
}

/// [`ClusterClient`] backed by a live API server.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a client from a kubeconfig file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the kubeconfig cannot be read or the client cannot be created.
    pub async fn from_kubeconfig(path: &Path) -> anyhow::Result<Self> {
        let kubeconfig = Kubeconfig::read_from(path)
            .with_context(|| format!("Failed to read kubeconfig from {}", path.display()))?;

        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .context("Failed to create Kubernetes config from kubeconfig")?;

        let client = Client::try_from(config).context("Failed to create Kubernetes client")?;

        Ok(Self { client })
    }

    /// Create a client from the environment (in-cluster or default kubeconfig).
    ///
    /// # Errors
    ///
    /// Returns an error if no usable configuration is found.
    pub async fn try_default() -> anyhow::Result<Self> {
        let client = Client::try_default()
            .await
            .context("Failed to create Kubernetes client from default config")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Deployment, ClusterError> {
        debug!(namespace = %namespace, deployment = %name, "Fetching deployment");
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        deployments
            .get(name)
            .await
            .map_err(|e| ClusterError::from_kube(e, "deployment", name))
    }

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Pod>, ClusterError> {
        debug!(namespace = %namespace, selector = ?label_selector, "Listing pods");
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let mut lp = ListParams::default();
        if let Some(selector) = label_selector.filter(|s| !s.is_empty()) {
            lp = lp.labels(selector);
        }
        pods.list(&lp)
            .await
            .map(|list| list.items)
            .map_err(|e| ClusterError::from_kube(e, "namespace", namespace))
    }

    async fn list_events(
        &self,
        namespace: &str,
        pod_name: &str,
    ) -> Result<Vec<Event>, ClusterError> {
        debug!(namespace = %namespace, pod = %pod_name, "Listing events");
        let events: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        let lp = ListParams::default().fields(&format!("involvedObject.name={pod_name}"));
        events
            .list(&lp)
            .await
            .map(|list| list.items)
            .map_err(|e| ClusterError::from_kube(e, "pod", pod_name))
    }

    async fn get_namespace(&self, name: &str) -> Result<Namespace, ClusterError> {
        debug!(namespace = %name, "Fetching namespace");
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        namespaces
            .get(name)
            .await
            .map_err(|e| ClusterError::from_kube(e, "namespace", name))
    }
}

/// Errors raised while turning a `LabelSelector` into a query string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("unsupported selector operator '{operator}' for key {key}")]
    UnsupportedOperator { key: String, operator: String },

    #[error("selector operator {operator} for key {key} requires values")]
    MissingValues { key: String, operator: String },
}

/// Render a `LabelSelector` in the string form accepted by `labelSelector=`.
///
/// An empty selector renders as an empty string, which matches everything.
pub fn selector_string(selector: &LabelSelector) -> Result<String, SelectorError> {
    let mut parts = Vec::new();

    if let Some(labels) = &selector.match_labels {
        for (key, value) in labels {
            parts.push(format!("{key}={value}"));
        }
    }

    for req in selector.match_expressions.iter().flatten() {
        let values = req.values.clone().unwrap_or_default();
        let part = match req.operator.as_str() {
            "In" | "NotIn" => {
                if values.is_empty() {
                    return Err(SelectorError::MissingValues {
                        key: req.key.clone(),
                        operator: req.operator.clone(),
                    });
                }
                let op = if req.operator == "In" { "in" } else { "notin" };
                format!("{} {op} ({})", req.key, values.join(","))
            }
            "Exists" => req.key.clone(),
            "DoesNotExist" => format!("!{}", req.key),
            other => {
                return Err(SelectorError::UnsupportedOperator {
                    key: req.key.clone(),
                    operator: other.to_string(),
                })
            }
        };
        parts.push(part);
    }

    Ok(parts.join(","))
}
