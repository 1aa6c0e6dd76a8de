//! Configuration specification types for the deployment sequencer.
//!
//! Every field carries a compiled-in default, so running without any
//! configuration file deploys the stock dashboard. A `dashboard-deploy.yaml`
//! only needs to name the fields it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default rollout timeout in seconds.
pub const DEFAULT_ROLLOUT_TIMEOUT_SECS: u64 = 300;

/// Default number of log lines fetched when the rollout times out.
pub const DEFAULT_LOG_TAIL_LINES: u32 = 50;

/// The root configuration structure for a deployment run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeployConfig {
    /// What gets deployed and where.
    #[serde(flatten)]
    pub target: Target,
    /// Stateful workload the dashboard depends on.
    pub dependency: DependencyConfig,
    /// Label selector of the dashboard's own pods.
    pub app_selector: String,
    /// How long to wait for the deployment to become available.
    pub rollout_timeout_secs: u64,
    /// Log lines to fetch from the dashboard's pods on timeout.
    pub log_tail_lines: u32,
    /// Local tunnel settings.
    pub port_forward: PortForwardConfig,
    /// Cluster CLI binary.
    pub kubectl: String,
    /// Optional kube context.
    pub context: Option<String>,
}

/// The deployment target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Target {
    /// Namespace to deploy into.
    pub namespace: String,
    /// Name of the dashboard deployment.
    pub deployment: String,
    /// Name of the dashboard service.
    pub service: String,
    /// Path of the manifest file.
    pub manifest: PathBuf,
}

/// The dependent stateful workload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DependencyConfig {
    /// StatefulSet name.
    pub statefulset: String,
    /// Label selector of the StatefulSet's pods.
    pub selector: String,
}

/// Port-forward settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PortForwardConfig {
    /// Port bound on localhost.
    pub local_port: u16,
    /// Service port inside the cluster.
    pub remote_port: u16,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            target: Target::default(),
            dependency: DependencyConfig::default(),
            app_selector: String::from("app=dashboard"),
            rollout_timeout_secs: DEFAULT_ROLLOUT_TIMEOUT_SECS,
            log_tail_lines: DEFAULT_LOG_TAIL_LINES,
            port_forward: PortForwardConfig::default(),
            kubectl: String::from("kubectl"),
            context: None,
        }
    }
}

impl Default for Target {
    fn default() -> Self {
        Self {
            namespace: String::from("monitoring"),
            deployment: String::from("dashboard"),
            service: String::from("dashboard"),
            manifest: PathBuf::from("dashboard.yaml"),
        }
    }
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            statefulset: String::from("prometheus"),
            selector: String::from("app=prometheus"),
        }
    }
}

impl Default for PortForwardConfig {
    fn default() -> Self {
        Self {
            local_port: 3000,
            remote_port: 80,
        }
    }
}

impl DeployConfig {
    /// Resolves a relative manifest path against `base`.
    #[must_use]
    pub fn with_manifest_base(mut self, base: &Path) -> Self {
        if self.target.manifest.is_relative() {
            self.target.manifest = base.join(&self.target.manifest);
        }
        self
    }

    /// Local URL the dashboard is reachable at once forwarded.
    #[must_use]
    pub fn local_url(&self) -> String {
        format!("http://localhost:{}", self.port_forward.local_port)
    }
}

impl PortForwardConfig {
    /// Renders the `<local>:<remote>` port pair.
    #[must_use]
    pub fn port_pair(&self) -> String {
        format!("{}:{}", self.local_port, self.remote_port)
    }
}
