//! The readiness-gated deployment sequence.
//!
//! Six steps run strictly in order, each advancing the [`Stage`] state
//! machine:
//!
//! 1. check that the cluster CLI is installed
//! 2. ensure the namespace exists
//! 3. probe the dependent StatefulSet
//! 4. apply the manifest
//! 5. wait for the deployment to become available
//! 6. offer a browser tab and a port-forward
//!
//! The first failure ends the run. There are no retries and nothing
//! already created is rolled back. Two conditions only warn: a namespace
//! that already exists, and a dependency with zero ready pods.

mod stage;

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cli::Console;
use crate::cluster::{ClusterCli, NamespaceCreation, RolloutOutcome};
use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::interact::{Browser, Prompter};

pub use stage::Stage;

/// How the namespace step was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceStatus {
    /// The namespace was already there.
    Existing,
    /// The namespace was created by this run.
    Created,
}

/// What the dependency probe found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    /// The StatefulSet is missing; the operator chose to continue.
    Absent,
    /// The StatefulSet exists but none of its pods are ready.
    NotReady,
    /// The StatefulSet has this many ready pods.
    Ready(usize),
}

/// What happened after the rollout succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostDeploy {
    /// The offer was disabled.
    Skipped,
    /// The operator declined the offer.
    Declined,
    /// The tunnel ran and has ended.
    Forwarded {
        /// Opener that launched the browser, if any did.
        opener: Option<String>,
    },
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceReport {
    /// Stages visited, in order.
    pub stages: Vec<Stage>,
    /// Namespace outcome.
    pub namespace: NamespaceStatus,
    /// Dependency outcome.
    pub dependency: DependencyStatus,
    /// Post-deploy outcome.
    pub post_deploy: PostDeploy,
}

/// Runs the deployment sequence against a cluster.
pub struct DeploymentSequencer<'a> {
    /// Immutable run configuration.
    config: &'a DeployConfig,
    /// Cluster access.
    cluster: &'a dyn ClusterCli,
    /// Operator confirmations.
    prompter: &'a dyn Prompter,
    /// Browser launcher.
    browser: &'a dyn Browser,
    /// Status output.
    console: Console,
    /// Whether step 6 offers the browser and tunnel.
    offer_port_forward: bool,
    /// Stages visited so far.
    stages: Vec<Stage>,
}

impl<'a> DeploymentSequencer<'a> {
    /// Creates a sequencer at [`Stage::Start`].
    #[must_use]
    pub fn new(
        config: &'a DeployConfig,
        cluster: &'a dyn ClusterCli,
        prompter: &'a dyn Prompter,
        browser: &'a dyn Browser,
    ) -> Self {
        Self {
            config,
            cluster,
            prompter,
            browser,
            console: Console::new(),
            offer_port_forward: true,
            stages: vec![Stage::Start],
        }
    }

    /// Sets whether the post-deploy browser and port-forward offer is made.
    #[must_use]
    pub const fn with_port_forward_offer(mut self, offer: bool) -> Self {
        self.offer_port_forward = offer;
        self
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Start)
    }

    /// Stages visited so far.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Runs every step in order.
    ///
    /// # Errors
    ///
    /// Returns the first unrecoverable failure: a missing cluster CLI, a
    /// declined continuation, a failed apply, a rollout timeout, or any
    /// failing cluster call.
    pub async fn run(&mut self) -> Result<SequenceReport> {
        let stage = self.stage();
        if stage.is_terminal() {
            return Err(DeployError::internal(format!(
                "sequence already ended at stage: {stage}"
            )));
        }

        info!(
            "Deploying {}/{} from {}",
            self.config.target.namespace,
            self.config.target.deployment,
            self.config.target.manifest.display()
        );

        self.check_tool().await?;
        let namespace = self.ensure_namespace().await?;
        let dependency = self.probe_dependency().await?;
        self.apply().await?;
        self.wait_for_rollout().await?;
        let post_deploy = self.post_deploy().await?;
        self.advance(Stage::Done)?;

        Ok(SequenceReport {
            stages: self.stages.clone(),
            namespace,
            dependency,
            post_deploy,
        })
    }

    /// Moves the state machine to `next`.
    fn advance(&mut self, next: Stage) -> Result<()> {
        let current = self.stage();
        if !current.can_advance_to(next) {
            return Err(DeployError::internal(format!(
                "illegal stage transition: {current} -> {next}"
            )));
        }

        debug!("Stage: {current} -> {next}");
        self.stages.push(next);
        if next.is_terminal() {
            info!("Sequence ended at stage: {next}");
        }
        Ok(())
    }

    /// Step 1: the cluster CLI must be installed.
    async fn check_tool(&mut self) -> Result<()> {
        self.console
            .step(&format!("Checking for {}", self.config.kubectl));

        if !self.cluster.tool_available().await? {
            self.console
                .error(&format!("{} is not installed", self.config.kubectl));
            return Err(DeployError::ToolNotFound {
                tool: self.config.kubectl.clone(),
            });
        }

        self.advance(Stage::ToolChecked)
    }

    /// Step 2: create the namespace unless it already exists.
    async fn ensure_namespace(&mut self) -> Result<NamespaceStatus> {
        let namespace = &self.config.target.namespace;
        self.console
            .step(&format!("Ensuring namespace '{namespace}'"));

        let status = if self.cluster.namespace_exists(namespace).await? {
            self.console
                .warning(&format!("Namespace '{namespace}' already exists"));
            NamespaceStatus::Existing
        } else {
            match self.cluster.create_namespace(namespace).await? {
                NamespaceCreation::Created => {
                    self.console
                        .success(&format!("Created namespace '{namespace}'"));
                    NamespaceStatus::Created
                }
                NamespaceCreation::AlreadyExists => {
                    self.console
                        .warning(&format!("Namespace '{namespace}' already exists"));
                    NamespaceStatus::Existing
                }
            }
        };

        self.advance(Stage::NamespaceEnsured)?;
        Ok(status)
    }

    /// Step 3: probe the dependent StatefulSet.
    ///
    /// A missing StatefulSet needs the operator's go-ahead; zero ready pods
    /// only warns.
    async fn probe_dependency(&mut self) -> Result<DependencyStatus> {
        let namespace = &self.config.target.namespace;
        let dependency = &self.config.dependency;
        self.console
            .step(&format!("Checking StatefulSet '{}'", dependency.statefulset));

        let status = if self
            .cluster
            .statefulset_exists(namespace, &dependency.statefulset)
            .await?
        {
            let ready = self
                .cluster
                .ready_pod_count(namespace, &dependency.selector)
                .await?;

            if ready == 0 {
                warn!("{} has no ready pods", dependency.statefulset);
                self.console.warning(&format!(
                    "StatefulSet '{}' has no ready pods yet; the dashboard may show no data",
                    dependency.statefulset
                ));
                DependencyStatus::NotReady
            } else {
                self.console.success(&format!(
                    "StatefulSet '{}' has {ready} ready pod(s)",
                    dependency.statefulset
                ));
                DependencyStatus::Ready(ready)
            }
        } else {
            self.console.warning(&format!(
                "StatefulSet '{}' not found in namespace '{namespace}'",
                dependency.statefulset
            ));

            if !self.prompter.confirm("Continue with the deployment anyway?")? {
                self.console.error("Deployment cancelled");
                return Err(DeployError::DependencyAbsentDeclined {
                    statefulset: dependency.statefulset.clone(),
                });
            }

            DependencyStatus::Absent
        };

        self.advance(Stage::DependencyChecked)?;
        Ok(status)
    }

    /// Step 4: apply the manifest.
    async fn apply(&mut self) -> Result<()> {
        let manifest = &self.config.target.manifest;
        self.console
            .step(&format!("Applying {}", manifest.display()));

        self.cluster
            .apply_manifest(&self.config.target.namespace, manifest)
            .await?;

        self.console.success("Manifest applied");
        self.advance(Stage::Applied)
    }

    /// Step 5: wait for availability; on timeout dump diagnostics and fail.
    async fn wait_for_rollout(&mut self) -> Result<()> {
        let target = &self.config.target;
        let timeout_secs = self.config.rollout_timeout_secs;
        self.console.step(&format!(
            "Waiting up to {timeout_secs}s for deployment '{}'",
            target.deployment
        ));

        let outcome = self
            .cluster
            .wait_available(
                &target.namespace,
                &target.deployment,
                Duration::from_secs(timeout_secs),
            )
            .await?;

        match outcome {
            RolloutOutcome::Available => {
                self.console
                    .success(&format!("Deployment '{}' is available", target.deployment));
                self.advance(Stage::Ready)
            }
            RolloutOutcome::TimedOut => {
                self.advance(Stage::TimedOut)?;
                self.console.error(&format!(
                    "Deployment '{}' did not become available within {timeout_secs}s",
                    target.deployment
                ));
                self.dump_diagnostics().await;
                Err(DeployError::RolloutTimeout {
                    deployment: target.deployment.clone(),
                    timeout_secs,
                })
            }
        }
    }

    /// Prints the pod list and log tail. Fetch failures are logged only.
    async fn dump_diagnostics(&self) {
        let namespace = &self.config.target.namespace;
        let selector = &self.config.app_selector;

        let pods = match self.cluster.list_pods(namespace, selector).await {
            Ok(pods) => Some(pods),
            Err(e) => {
                warn!("Could not list pods: {e}");
                None
            }
        };

        let logs = match self
            .cluster
            .logs_tail(namespace, selector, self.config.log_tail_lines)
            .await
        {
            Ok(logs) => Some(logs),
            Err(e) => {
                warn!("Could not fetch logs: {e}");
                None
            }
        };

        self.console.diagnostics(pods.as_deref(), logs.as_deref());
    }

    /// Step 6: print access instructions, then offer browser and tunnel.
    async fn post_deploy(&mut self) -> Result<PostDeploy> {
        self.console.deployed(self.config);

        if !self.offer_port_forward {
            return Ok(PostDeploy::Skipped);
        }

        if !self
            .prompter
            .confirm("Open the dashboard in your browser and start port-forwarding?")?
        {
            return Ok(PostDeploy::Declined);
        }

        let url = self.config.local_url();
        let opener = self.browser.open(&url);
        match &opener {
            Some(program) => debug!("Opened {url} with {program}"),
            None => self
                .console
                .warning(&format!("Could not open a browser, visit {url} manually")),
        }

        let target = &self.config.target;
        self.console.step(&format!(
            "Forwarding {} to svc/{} (Ctrl+C to stop)",
            url, target.service
        ));
        self.cluster
            .port_forward(&target.namespace, &target.service, self.config.port_forward)
            .await?;

        Ok(PostDeploy::Forwarded { opener })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{MockClusterCli, PodSummary};
    use crate::interact::{MockBrowser, MockPrompter};

    fn config() -> DeployConfig {
        DeployConfig::default()
    }

    /// Cluster where the tool is installed and the namespace exists.
    fn base_cluster() -> MockClusterCli {
        let mut cluster = MockClusterCli::new();
        cluster.expect_tool_available().returning(|| Ok(true));
        cluster
            .expect_namespace_exists()
            .withf(|ns| ns == "monitoring")
            .returning(|_| Ok(true));
        cluster.expect_create_namespace().never();
        cluster
    }

    fn with_healthy_dependency(cluster: &mut MockClusterCli, ready: usize) {
        cluster
            .expect_statefulset_exists()
            .withf(|ns, name| ns == "monitoring" && name == "prometheus")
            .returning(|_, _| Ok(true));
        cluster
            .expect_ready_pod_count()
            .withf(|_, selector| selector == "app=prometheus")
            .returning(move |_, _| Ok(ready));
    }

    fn no_prompts() -> MockPrompter {
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().never();
        prompter
    }

    fn no_browser() -> MockBrowser {
        let mut browser = MockBrowser::new();
        browser.expect_open().never();
        browser
    }

    #[tokio::test]
    async fn test_missing_tool_halts_before_any_cluster_call() {
        let config = config();
        let mut cluster = MockClusterCli::new();
        cluster.expect_tool_available().times(1).returning(|| Ok(false));
        cluster.expect_namespace_exists().never();
        cluster.expect_create_namespace().never();
        cluster.expect_apply_manifest().never();
        let prompter = no_prompts();
        let browser = no_browser();

        let mut sequencer = DeploymentSequencer::new(&config, &cluster, &prompter, &browser);
        let err = sequencer.run().await.expect_err("tool is missing");

        assert!(matches!(err, DeployError::ToolNotFound { ref tool } if tool == "kubectl"));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(sequencer.stage(), Stage::Start);
    }

    #[tokio::test]
    async fn test_absent_dependency_declined_skips_apply() {
        let config = config();
        let mut cluster = base_cluster();
        cluster
            .expect_statefulset_exists()
            .returning(|_, _| Ok(false));
        cluster.expect_ready_pod_count().never();
        cluster.expect_apply_manifest().never();
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(1).returning(|_| Ok(false));
        let browser = no_browser();

        let mut sequencer = DeploymentSequencer::new(&config, &cluster, &prompter, &browser);
        let err = sequencer.run().await.expect_err("operator declined");

        assert!(matches!(err, DeployError::DependencyAbsentDeclined { .. }));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(sequencer.stage(), Stage::NamespaceEnsured);
    }

    #[tokio::test]
    async fn test_zero_ready_replicas_still_applies() {
        let config = config();
        let mut cluster = base_cluster();
        with_healthy_dependency(&mut cluster, 0);
        cluster
            .expect_apply_manifest()
            .times(1)
            .withf(|ns, manifest| {
                ns == "monitoring" && manifest == std::path::Path::new("dashboard.yaml")
            })
            .returning(|_, _| Ok(()));
        cluster
            .expect_wait_available()
            .returning(|_, _, _| Ok(RolloutOutcome::Available));
        let prompter = no_prompts();
        let browser = no_browser();

        let mut sequencer = DeploymentSequencer::new(&config, &cluster, &prompter, &browser)
            .with_port_forward_offer(false);
        let report = sequencer.run().await.expect("sequence succeeds");

        assert_eq!(report.namespace, NamespaceStatus::Existing);
        assert_eq!(report.dependency, DependencyStatus::NotReady);
        assert_eq!(report.post_deploy, PostDeploy::Skipped);
    }

    #[tokio::test]
    async fn test_apply_failure_propagates_exit_code() {
        let config = config();
        let mut cluster = base_cluster();
        with_healthy_dependency(&mut cluster, 2);
        cluster.expect_apply_manifest().returning(|_, manifest| {
            Err(DeployError::ApplyFailed {
                manifest: manifest.to_path_buf(),
                code: Some(3),
                stderr: String::from("error validating data"),
            })
        });
        cluster.expect_wait_available().never();
        let prompter = no_prompts();
        let browser = no_browser();

        let mut sequencer = DeploymentSequencer::new(&config, &cluster, &prompter, &browser);
        let err = sequencer.run().await.expect_err("apply fails");

        assert_eq!(err.exit_code(), 3);
        assert_eq!(sequencer.stage(), Stage::DependencyChecked);
    }

    #[tokio::test]
    async fn test_rollout_timeout_dumps_diagnostics() {
        let config = config();
        let mut cluster = base_cluster();
        with_healthy_dependency(&mut cluster, 1);
        cluster.expect_apply_manifest().returning(|_, _| Ok(()));
        cluster
            .expect_wait_available()
            .withf(|_, deployment, timeout| {
                deployment == "dashboard" && *timeout == Duration::from_secs(300)
            })
            .returning(|_, _, _| Ok(RolloutOutcome::TimedOut));
        cluster
            .expect_list_pods()
            .times(1)
            .withf(|ns, selector| ns == "monitoring" && selector == "app=dashboard")
            .returning(|_, _| {
                Ok(vec![PodSummary {
                    name: String::from("dashboard-5d8f-x2x9q"),
                    phase: String::from("Pending"),
                    ready: false,
                    ready_containers: 0,
                    total_containers: 1,
                    restarts: 4,
                }])
            });
        cluster
            .expect_logs_tail()
            .times(1)
            .withf(|_, _, lines| *lines == 50)
            .returning(|_, _, _| Ok(String::from("listen tcp :3000: bind: address in use")));
        cluster.expect_port_forward().never();
        let prompter = no_prompts();
        let browser = no_browser();

        let mut sequencer = DeploymentSequencer::new(&config, &cluster, &prompter, &browser);
        let err = sequencer.run().await.expect_err("rollout times out");

        assert!(matches!(
            err,
            DeployError::RolloutTimeout { timeout_secs: 300, .. }
        ));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(sequencer.stage(), Stage::TimedOut);
    }

    #[tokio::test]
    async fn test_diagnostic_failures_do_not_mask_timeout() {
        let config = config();
        let mut cluster = base_cluster();
        with_healthy_dependency(&mut cluster, 1);
        cluster.expect_apply_manifest().returning(|_, _| Ok(()));
        cluster
            .expect_wait_available()
            .returning(|_, _, _| Ok(RolloutOutcome::TimedOut));
        cluster
            .expect_list_pods()
            .returning(|_, _| Err(DeployError::internal("connection refused")));
        cluster
            .expect_logs_tail()
            .returning(|_, _, _| Err(DeployError::internal("connection refused")));
        let prompter = no_prompts();
        let browser = no_browser();

        let mut sequencer = DeploymentSequencer::new(&config, &cluster, &prompter, &browser);
        let err = sequencer.run().await.expect_err("rollout times out");

        assert!(matches!(err, DeployError::RolloutTimeout { .. }));
    }

    #[tokio::test]
    async fn test_fresh_cluster_happy_path() {
        let config = config();
        let mut cluster = MockClusterCli::new();
        cluster.expect_tool_available().returning(|| Ok(true));
        cluster.expect_namespace_exists().returning(|_| Ok(false));
        cluster
            .expect_create_namespace()
            .times(1)
            .withf(|ns| ns == "monitoring")
            .returning(|_| Ok(NamespaceCreation::Created));
        cluster
            .expect_statefulset_exists()
            .returning(|_, _| Ok(false));
        cluster.expect_apply_manifest().times(1).returning(|_, _| Ok(()));
        cluster
            .expect_wait_available()
            .returning(|_, _, _| Ok(RolloutOutcome::Available));
        cluster
            .expect_port_forward()
            .times(1)
            .withf(|ns, service, ports| {
                ns == "monitoring" && service == "dashboard" && ports.port_pair() == "3000:80"
            })
            .returning(|_, _, _| Ok(()));

        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(2).returning(|_| Ok(true));
        let mut browser = MockBrowser::new();
        browser
            .expect_open()
            .times(1)
            .withf(|url| url == "http://localhost:3000")
            .returning(|_| Some(String::from("xdg-open")));

        let mut sequencer = DeploymentSequencer::new(&config, &cluster, &prompter, &browser);
        let report = sequencer.run().await.expect("sequence succeeds");

        assert_eq!(
            report.stages,
            [
                Stage::Start,
                Stage::ToolChecked,
                Stage::NamespaceEnsured,
                Stage::DependencyChecked,
                Stage::Applied,
                Stage::Ready,
                Stage::Done,
            ]
        );
        assert_eq!(report.namespace, NamespaceStatus::Created);
        assert_eq!(report.dependency, DependencyStatus::Absent);
        assert_eq!(
            report.post_deploy,
            PostDeploy::Forwarded {
                opener: Some(String::from("xdg-open"))
            }
        );
    }

    #[tokio::test]
    async fn test_namespace_race_is_only_a_warning() {
        let config = config();
        let mut cluster = MockClusterCli::new();
        cluster.expect_tool_available().returning(|| Ok(true));
        cluster.expect_namespace_exists().returning(|_| Ok(false));
        cluster
            .expect_create_namespace()
            .returning(|_| Ok(NamespaceCreation::AlreadyExists));
        with_healthy_dependency(&mut cluster, 1);
        cluster.expect_apply_manifest().returning(|_, _| Ok(()));
        cluster
            .expect_wait_available()
            .returning(|_, _, _| Ok(RolloutOutcome::Available));
        let prompter = no_prompts();
        let browser = no_browser();

        let mut sequencer = DeploymentSequencer::new(&config, &cluster, &prompter, &browser)
            .with_port_forward_offer(false);
        let report = sequencer.run().await.expect("sequence succeeds");

        assert_eq!(report.namespace, NamespaceStatus::Existing);
        assert_eq!(report.dependency, DependencyStatus::Ready(1));
    }

    #[tokio::test]
    async fn test_finished_sequence_does_not_rerun() {
        let config = config();
        let mut cluster = MockClusterCli::new();
        cluster.expect_tool_available().times(1).returning(|| Ok(true));
        cluster.expect_namespace_exists().times(1).returning(|_| Ok(true));
        with_healthy_dependency(&mut cluster, 1);
        cluster.expect_apply_manifest().times(1).returning(|_, _| Ok(()));
        cluster
            .expect_wait_available()
            .times(1)
            .returning(|_, _, _| Ok(RolloutOutcome::Available));
        let prompter = no_prompts();
        let browser = no_browser();

        let mut sequencer = DeploymentSequencer::new(&config, &cluster, &prompter, &browser)
            .with_port_forward_offer(false);
        sequencer.run().await.expect("first run succeeds");
        assert_eq!(sequencer.stage(), Stage::Done);

        let err = sequencer.run().await.expect_err("second run is refused");
        assert!(matches!(err, DeployError::Internal(_)));
        assert_eq!(sequencer.stages().len(), 7);
    }

    #[tokio::test]
    async fn test_declined_port_forward_and_failed_browser() {
        let config = config();

        let mut cluster = base_cluster();
        with_healthy_dependency(&mut cluster, 1);
        cluster.expect_apply_manifest().returning(|_, _| Ok(()));
        cluster
            .expect_wait_available()
            .returning(|_, _, _| Ok(RolloutOutcome::Available));
        cluster.expect_port_forward().never();
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(1).returning(|_| Ok(false));
        let browser = no_browser();

        let mut sequencer = DeploymentSequencer::new(&config, &cluster, &prompter, &browser);
        let report = sequencer.run().await.expect("sequence succeeds");
        assert_eq!(report.post_deploy, PostDeploy::Declined);

        let mut cluster = base_cluster();
        with_healthy_dependency(&mut cluster, 1);
        cluster.expect_apply_manifest().returning(|_, _| Ok(()));
        cluster
            .expect_wait_available()
            .returning(|_, _, _| Ok(RolloutOutcome::Available));
        cluster.expect_port_forward().times(1).returning(|_, _, _| Ok(()));
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(1).returning(|_| Ok(true));
        let mut browser = MockBrowser::new();
        browser.expect_open().returning(|_| None);

        let mut sequencer = DeploymentSequencer::new(&config, &cluster, &prompter, &browser);
        let report = sequencer.run().await.expect("sequence succeeds");
        assert_eq!(report.post_deploy, PostDeploy::Forwarded { opener: None });
    }
}
