//! Cluster access for the deployment sequencer.
//!
//! All cluster interaction goes through the [`ClusterCli`] trait. The
//! production implementation, [`Kubectl`], shells out to the `kubectl`
//! binary; tests substitute a mock.

mod kubectl;
mod types;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::config::PortForwardConfig;
use crate::error::Result;

pub use kubectl::{CommandOutput, Kubectl};
pub use types::{NamespaceCreation, PodList, PodSummary, RolloutOutcome};

/// Operations the sequencer needs from the cluster.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterCli: Send + Sync {
    /// Returns true if the cluster CLI can be executed.
    async fn tool_available(&self) -> Result<bool>;

    /// Returns true if `namespace` exists.
    async fn namespace_exists(&self, namespace: &str) -> Result<bool>;

    /// Creates `namespace`.
    async fn create_namespace(&self, namespace: &str) -> Result<NamespaceCreation>;

    /// Returns true if the StatefulSet `name` exists in `namespace`.
    async fn statefulset_exists(&self, namespace: &str, name: &str) -> Result<bool>;

    /// Counts pods matching `selector` whose `Ready` condition is true.
    async fn ready_pod_count(&self, namespace: &str, selector: &str) -> Result<usize>;

    /// Applies the manifest at `manifest`.
    async fn apply_manifest(&self, namespace: &str, manifest: &Path) -> Result<()>;

    /// Blocks until `deployment` is available or `timeout` elapses.
    async fn wait_available(
        &self,
        namespace: &str,
        deployment: &str,
        timeout: Duration,
    ) -> Result<RolloutOutcome>;

    /// Lists pods matching `selector`.
    async fn list_pods(&self, namespace: &str, selector: &str) -> Result<Vec<PodSummary>>;

    /// Fetches the last `lines` log lines of pods matching `selector`.
    async fn logs_tail(&self, namespace: &str, selector: &str, lines: u32) -> Result<String>;

    /// Forwards a local port to `service` until the tunnel exits or is interrupted.
    async fn port_forward(
        &self,
        namespace: &str,
        service: &str,
        ports: PortForwardConfig,
    ) -> Result<()>;
}
