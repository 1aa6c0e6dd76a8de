//! CLI argument definitions.
//!
//! Every flag is optional: a bare invocation runs the full deployment with
//! the built-in defaults.

use clap::Parser;
use std::path::PathBuf;

/// Deploys the dashboard manifest once its dependencies are in place.
#[derive(Parser, Debug)]
#[command(name = "dashboard-deploy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, env = "DASHBOARD_DEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Answer yes to every prompt.
    #[arg(short, long)]
    pub yes: bool,

    /// Skip the browser and port-forward offer after a successful rollout.
    #[arg(long)]
    pub no_port_forward: bool,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags() {
        let cli = Cli::try_parse_from(["dashboard-deploy"]).expect("bare invocation parses");
        assert!(!cli.verbose);
        assert!(!cli.yes);
        assert!(!cli.no_port_forward);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "dashboard-deploy",
            "--config",
            "ops/dashboard-deploy.yaml",
            "-v",
            "-y",
            "--no-port-forward",
        ])
        .expect("flags parse");

        assert_eq!(cli.config, Some(PathBuf::from("ops/dashboard-deploy.yaml")));
        assert!(cli.verbose && cli.yes && cli.no_port_forward);
    }
}
