//! `kubectl`-backed implementation of [`ClusterCli`].
//!
//! Every call spawns one `kubectl` process. Queries capture output; the
//! port-forward inherits the terminal so the operator sees tunnel logs.

use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{DeployConfig, PortForwardConfig};
use crate::error::{DeployError, Result};

use super::ClusterCli;
use super::types::{NamespaceCreation, PodList, PodSummary, RolloutOutcome};

/// Extra time granted past `kubectl wait --timeout` before the process is killed.
const WAIT_GRACE_SECS: u64 = 15;

/// Captured result of a `kubectl` invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the command succeeded.
    pub success: bool,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit code if available.
    pub exit_code: Option<i32>,
}

/// Cluster access through the `kubectl` binary.
#[derive(Debug, Clone)]
pub struct Kubectl {
    /// Binary to execute.
    binary: String,
    /// Kube context passed to every cluster call.
    context: Option<String>,
    /// Extra time granted past `kubectl wait --timeout`.
    wait_grace: Duration,
}

impl Kubectl {
    /// Creates a client for `binary`.
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            context: None,
            wait_grace: Duration::from_secs(WAIT_GRACE_SECS),
        }
    }

    /// Creates a client from the deployment configuration.
    #[must_use]
    pub fn from_config(config: &DeployConfig) -> Self {
        Self::new(config.kubectl.clone()).with_context(config.context.clone())
    }

    /// Pins every cluster call to a kube context.
    #[must_use]
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    /// Full argument list for a cluster call, context first.
    fn cluster_args<I, S>(&self, args: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut all: Vec<OsString> = Vec::new();
        if let Some(context) = &self.context {
            all.push(OsString::from("--context"));
            all.push(OsString::from(context));
        }
        all.extend(args.into_iter().map(Into::into));
        all
    }

    /// Renders a command line for logs and error messages.
    fn render(&self, args: &[OsString]) -> String {
        let mut line = self.binary.clone();
        for arg in args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Maps a spawn failure: a missing binary is `ToolNotFound`.
    fn spawn_error(&self, e: std::io::Error) -> DeployError {
        if e.kind() == ErrorKind::NotFound {
            DeployError::ToolNotFound {
                tool: self.binary.clone(),
            }
        } else {
            DeployError::Io(e)
        }
    }

    /// Runs a cluster call and captures its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    pub async fn run(&self, args: &[OsString]) -> Result<CommandOutput> {
        debug!("Executing: {}", self.render(args));

        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        let result = CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code(),
        };

        if !result.success {
            debug!("Command exited with {:?}: {}", result.exit_code, result.stderr);
        }

        Ok(result)
    }

    /// Runs a cluster call that must succeed.
    async fn run_checked(&self, args: &[OsString]) -> Result<CommandOutput> {
        let output = self.run(args).await?;
        if output.success {
            Ok(output)
        } else {
            Err(DeployError::CommandFailed {
                command: self.render(args),
                code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }

    /// Runs a `get` query; a non-zero exit means the object is absent.
    async fn exists(&self, args: &[OsString]) -> Result<bool> {
        Ok(self.run(args).await?.success)
    }

    fn get_pods_args(&self, namespace: &str, selector: &str) -> Vec<OsString> {
        self.cluster_args(["get", "pods", "-n", namespace, "-l", selector, "-o", "json"])
    }

    async fn get_pods(&self, namespace: &str, selector: &str) -> Result<PodList> {
        let output = self
            .run_checked(&self.get_pods_args(namespace, selector))
            .await?;

        serde_json::from_str(&output.stdout).map_err(|e| {
            DeployError::internal(format!("Unexpected pod list from {}: {e}", self.binary))
        })
    }

    fn wait_args(&self, namespace: &str, deployment: &str, timeout: Duration) -> Vec<OsString> {
        self.cluster_args([
            String::from("wait"),
            String::from("--for=condition=available"),
            format!("--timeout={}s", timeout.as_secs()),
            format!("deployment/{deployment}"),
            String::from("-n"),
            namespace.to_string(),
        ])
    }

    fn port_forward_args(
        &self,
        namespace: &str,
        service: &str,
        ports: PortForwardConfig,
    ) -> Vec<OsString> {
        self.cluster_args([
            String::from("port-forward"),
            String::from("-n"),
            namespace.to_string(),
            format!("svc/{service}"),
            ports.port_pair(),
        ])
    }
}

#[async_trait]
impl ClusterCli for Kubectl {
    async fn tool_available(&self) -> Result<bool> {
        let status = Command::new(&self.binary)
            .args(["version", "--client"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                debug!("{} cannot be executed: {e}", self.binary);
                Ok(false)
            }
            Err(e) => Err(DeployError::Io(e)),
        }
    }

    async fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        self.exists(&self.cluster_args(["get", "namespace", namespace]))
            .await
    }

    async fn create_namespace(&self, namespace: &str) -> Result<NamespaceCreation> {
        let args = self.cluster_args(["create", "namespace", namespace]);
        let output = self.run(&args).await?;

        if output.success {
            Ok(NamespaceCreation::Created)
        } else if output.stderr.contains("AlreadyExists") {
            Ok(NamespaceCreation::AlreadyExists)
        } else {
            Err(DeployError::CommandFailed {
                command: self.render(&args),
                code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }

    async fn statefulset_exists(&self, namespace: &str, name: &str) -> Result<bool> {
        self.exists(&self.cluster_args(["get", "statefulset", name, "-n", namespace]))
            .await
    }

    async fn ready_pod_count(&self, namespace: &str, selector: &str) -> Result<usize> {
        Ok(self.get_pods(namespace, selector).await?.ready_count())
    }

    async fn apply_manifest(&self, namespace: &str, manifest: &Path) -> Result<()> {
        let mut args = self.cluster_args(["apply", "-f"]);
        args.push(manifest.as_os_str().to_os_string());
        args.extend(["-n", namespace].map(OsString::from));

        let output = self.run(&args).await?;
        if output.success {
            info!("{}", output.stdout.trim());
            Ok(())
        } else {
            Err(DeployError::ApplyFailed {
                manifest: manifest.to_path_buf(),
                code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }

    async fn wait_available(
        &self,
        namespace: &str,
        deployment: &str,
        timeout: Duration,
    ) -> Result<RolloutOutcome> {
        let args = self.wait_args(namespace, deployment, timeout);
        debug!("Executing: {}", self.render(&args));

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let guard = timeout + self.wait_grace;
        match tokio::time::timeout(guard, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => Ok(RolloutOutcome::Available),
            Ok(Ok(output)) => {
                debug!(
                    "Rollout wait exited with {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                Ok(RolloutOutcome::TimedOut)
            }
            Ok(Err(e)) => Err(DeployError::Io(e)),
            Err(_) => {
                warn!("Rollout wait did not return within {}s, killing it", guard.as_secs());
                Ok(RolloutOutcome::TimedOut)
            }
        }
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> Result<Vec<PodSummary>> {
        Ok(self.get_pods(namespace, selector).await?.summaries())
    }

    async fn logs_tail(&self, namespace: &str, selector: &str, lines: u32) -> Result<String> {
        let args = self.cluster_args([
            String::from("logs"),
            String::from("-n"),
            namespace.to_string(),
            String::from("-l"),
            selector.to_string(),
            format!("--tail={lines}"),
            String::from("--all-containers=true"),
        ]);
        Ok(self.run_checked(&args).await?.stdout)
    }

    async fn port_forward(
        &self,
        namespace: &str,
        service: &str,
        ports: PortForwardConfig,
    ) -> Result<()> {
        let args = self.port_forward_args(namespace, service, ports);
        debug!("Executing: {}", self.render(&args));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let exited = tokio::select! {
            status = child.wait() => Some(status?),
            signal = tokio::signal::ctrl_c() => {
                signal?;
                None
            }
        };

        match exited {
            Some(status) if status.success() => Ok(()),
            Some(status) => Err(DeployError::CommandFailed {
                command: self.render(&args),
                code: status.code(),
                stderr: String::from("port-forward exited unexpectedly"),
            }),
            None => {
                info!("Interrupted, stopping port-forward");
                child.kill().await?;
                Ok(())
            }
        }
    }
}
