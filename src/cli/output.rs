//! Terminal output for the deployment sequence.
//!
//! Status lines go to stderr with colored markers. Formatting is split from
//! printing so the rendered text can be checked without a terminal.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::cluster::PodSummary;
use crate::config::DeployConfig;

/// Console printer for sequencer status messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct Console;

/// Pod row for table display.
#[derive(Tabled)]
struct PodRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Restarts")]
    restarts: u32,
}

impl Console {
    /// Creates a console printer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Prints a step header.
    pub fn step(&self, message: &str) {
        eprintln!("{} {message}", "==>".blue().bold());
    }

    /// Prints a success message.
    pub fn success(&self, message: &str) {
        eprintln!("{} {message}", "✓".green());
    }

    /// Prints a warning message.
    pub fn warning(&self, message: &str) {
        eprintln!("{} {message}", "⚠".yellow());
    }

    /// Prints an error message.
    pub fn error(&self, message: &str) {
        eprintln!("{} {message}", "✗".red());
    }

    /// Prints the post-rollout banner and access instructions.
    pub fn deployed(&self, config: &DeployConfig) {
        eprintln!("{}", Self::format_access(config));
    }

    /// Prints the timeout diagnostic dump.
    pub fn diagnostics(&self, pods: Option<&[PodSummary]>, logs: Option<&str>) {
        eprintln!("{}", Self::format_diagnostics(pods, logs));
    }

    /// Formats the success banner and how to reach the dashboard.
    #[must_use]
    pub fn format_access(config: &DeployConfig) -> String {
        let mut output = String::new();
        let target = &config.target;

        let _ = writeln!(
            output,
            "\n{} Dashboard '{}' is available in namespace '{}'\n",
            "✓".green(),
            target.deployment,
            target.namespace
        );
        output.push_str("Access the dashboard:\n");
        let _ = writeln!(
            output,
            "   kubectl port-forward -n {} svc/{} {}",
            target.namespace,
            target.service,
            config.port_forward.port_pair()
        );
        let _ = writeln!(output, "   then open {}", config.local_url());

        output
    }

    /// Formats the pod list and log tail gathered after a rollout timeout.
    #[must_use]
    pub fn format_diagnostics(pods: Option<&[PodSummary]>, logs: Option<&str>) -> String {
        let mut output = format!("\n{}\n", "Current pods:".bold());

        match pods {
            Some([]) => output.push_str("   No pods found.\n"),
            Some(pods) => {
                let rows: Vec<PodRow> = pods.iter().map(PodRow::from).collect();
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');
            }
            None => output.push_str("   Pod list unavailable.\n"),
        }

        let _ = write!(output, "\n{}\n", "Recent logs:".bold());
        match logs.map(str::trim) {
            Some("") => output.push_str("   No log output.\n"),
            Some(logs) => {
                for line in logs.lines() {
                    let _ = writeln!(output, "   {line}");
                }
            }
            None => output.push_str("   Logs unavailable.\n"),
        }

        output
    }
}

impl From<&PodSummary> for PodRow {
    fn from(pod: &PodSummary) -> Self {
        let ready = format!("{}/{}", pod.ready_containers, pod.total_containers);
        Self {
            name: pod.name.clone(),
            ready: if pod.ready {
                ready.green().to_string()
            } else {
                ready.red().to_string()
            },
            status: pod.phase.clone(),
            restarts: pod.restarts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod(name: &str, ready: bool) -> PodSummary {
        PodSummary {
            name: name.to_string(),
            phase: String::from(if ready { "Running" } else { "Pending" }),
            ready,
            ready_containers: usize::from(ready),
            total_containers: 1,
            restarts: 3,
        }
    }

    #[test]
    fn test_access_instructions() {
        let output = Console::format_access(&DeployConfig::default());
        assert!(output.contains("kubectl port-forward -n monitoring svc/dashboard 3000:80"));
        assert!(output.contains("http://localhost:3000"));
    }

    #[test]
    fn test_diagnostics_table() {
        let pods = vec![pod("dashboard-7c9f-abcde", false), pod("dashboard-7c9f-fghij", true)];
        let output =
            Console::format_diagnostics(Some(pods.as_slice()), Some("panic: bad config\n"));

        assert!(output.contains("dashboard-7c9f-abcde"));
        assert!(output.contains("Pending"));
        assert!(output.contains("Restarts"));
        assert!(output.contains("   panic: bad config"));
    }

    #[test]
    fn test_diagnostics_placeholders() {
        let none: Vec<PodSummary> = Vec::new();
        let output = Console::format_diagnostics(Some(none.as_slice()), Some("  \n"));
        assert!(output.contains("No pods found."));
        assert!(output.contains("No log output."));

        let output = Console::format_diagnostics(None, None);
        assert!(output.contains("Pod list unavailable."));
        assert!(output.contains("Logs unavailable."));
    }
}
