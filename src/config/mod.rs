//! Configuration module for the deployment sequencer.
//!
//! This module handles all configuration-related functionality:
//! - Compiled-in defaults for the dashboard target
//! - Optional `dashboard-deploy.yaml` and `DASHBOARD_*` overrides
//! - Validation of configuration values

mod parser;
mod spec;
mod validator;

pub use parser::{ConfigParser, DEFAULT_CONFIG_FILE, find_config_file};
pub use spec::{
    DEFAULT_LOG_TAIL_LINES, DEFAULT_ROLLOUT_TIMEOUT_SECS, DependencyConfig, DeployConfig,
    PortForwardConfig, Target,
};
pub use validator::{ConfigValidator, ValidationResult};
