//! Types exchanged with the cluster CLI.
//!
//! Only the fields the sequencer reads are modelled; everything else in
//! `kubectl -o json` output is ignored.

use serde::Deserialize;

/// Outcome of a namespace creation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceCreation {
    /// The namespace was created.
    Created,
    /// Another actor created it first.
    AlreadyExists,
}

/// Outcome of the rollout wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutOutcome {
    /// The deployment reported `Available`.
    Available,
    /// The timeout elapsed first.
    TimedOut,
}

/// `kubectl get pods -o json` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodList {
    /// Pods in the list.
    #[serde(default)]
    pub items: Vec<Pod>,
}

/// A single pod.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pod {
    /// Object metadata.
    #[serde(default)]
    pub metadata: PodMetadata,
    /// Observed status.
    #[serde(default)]
    pub status: PodStatus,
}

/// Pod metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodMetadata {
    /// Pod name.
    #[serde(default)]
    pub name: String,
}

/// Pod status.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodStatus {
    /// Lifecycle phase.
    #[serde(default)]
    pub phase: Option<String>,
    /// Status conditions.
    #[serde(default)]
    pub conditions: Vec<PodCondition>,
    /// Per-container status.
    #[serde(default)]
    pub container_statuses: Vec<ContainerStatus>,
}

/// A pod status condition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodCondition {
    /// Condition type, e.g. `Ready`.
    #[serde(rename = "type")]
    pub condition_type: String,
    /// `True`, `False` or `Unknown`.
    pub status: String,
}

/// Container status.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    /// Whether the container passes its readiness probe.
    #[serde(default)]
    pub ready: bool,
    /// Restart count.
    #[serde(default)]
    pub restart_count: u32,
}

/// Flattened view of a pod for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodSummary {
    /// Pod name.
    pub name: String,
    /// Lifecycle phase.
    pub phase: String,
    /// Whether the `Ready` condition is true.
    pub ready: bool,
    /// Ready containers.
    pub ready_containers: usize,
    /// Total containers.
    pub total_containers: usize,
    /// Restarts summed over containers.
    pub restarts: u32,
}

impl Pod {
    /// Returns true if the pod's `Ready` condition is `True`.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status
            .conditions
            .iter()
            .any(|c| c.condition_type == "Ready" && c.status == "True")
    }
}

impl PodList {
    /// Counts pods whose `Ready` condition is `True`.
    #[must_use]
    pub fn ready_count(&self) -> usize {
        self.items.iter().filter(|p| p.is_ready()).count()
    }

    /// Converts to display summaries.
    #[must_use]
    pub fn summaries(&self) -> Vec<PodSummary> {
        self.items.iter().map(PodSummary::from).collect()
    }
}

impl From<&Pod> for PodSummary {
    fn from(pod: &Pod) -> Self {
        let containers = &pod.status.container_statuses;
        Self {
            name: pod.metadata.name.clone(),
            phase: pod
                .status
                .phase
                .clone()
                .unwrap_or_else(|| String::from("Unknown")),
            ready: pod.is_ready(),
            ready_containers: containers.iter().filter(|c| c.ready).count(),
            total_containers: containers.len(),
            restarts: containers.iter().map(|c| c.restart_count).sum(),
        }
    }
}
