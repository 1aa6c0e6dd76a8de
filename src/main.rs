//! Dashboard deploy CLI entrypoint.
//!
//! This is the main entrypoint for the dashboard-deploy command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dashboard_deploy::cli::Cli;
use dashboard_deploy::cluster::Kubectl;
use dashboard_deploy::config::{ConfigParser, ConfigValidator, DeployConfig, find_config_file};
use dashboard_deploy::error::Result;
use dashboard_deploy::interact::{AutoConfirm, BrowserLauncher, Prompter, StdinPrompter};
use dashboard_deploy::sequencer::DeploymentSequencer;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    let cluster = Kubectl::from_config(&config);
    let browser = BrowserLauncher::default();
    let prompter: Box<dyn Prompter> = if cli.yes {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(StdinPrompter::stdin())
    };

    let mut sequencer =
        DeploymentSequencer::new(&config, &cluster, prompter.as_ref(), &browser)
            .with_port_forward_offer(!cli.no_port_forward);

    let report = sequencer.run().await?;
    debug!(
        "Run report: {}",
        serde_json::to_string(&report).unwrap_or_default()
    );
    info!("Deployment finished");

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Loads, overrides and validates the configuration.
fn load_config(explicit: Option<&Path>) -> Result<DeployConfig> {
    let config_file = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(std::env::current_dir()?),
    };

    let base = config_file
        .as_deref()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    match &config_file {
        Some(path) => debug!("Using configuration file: {}", path.display()),
        None => debug!("No configuration file found, using defaults"),
    }

    let parser = ConfigParser::new().with_base_path(base);
    parser.load_dotenv()?;

    let config = parser.load(config_file.as_deref())?;
    ConfigValidator::new().validate(&config)?;

    Ok(config)
}
