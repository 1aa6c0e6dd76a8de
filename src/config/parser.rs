//! Configuration parser for loading the optional configuration file.
//!
//! Precedence, lowest first: compiled-in defaults, the YAML file, then
//! `DASHBOARD_*` environment variables (a `.env` file is honoured).

use crate::error::{ConfigError, DeployError, Result};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::spec::DeployConfig;

/// Configuration parser for loading deployment configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Returns the base path, defaulting to the working directory.
    #[must_use]
    pub fn base_path(&self) -> PathBuf {
        self.base_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<DeployConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(DeployError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<DeployConfig> {
        debug!("Parsing YAML configuration");

        if content.trim().is_empty() {
            return Ok(DeployConfig::default());
        }

        let config: DeployConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            DeployError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        if let Ok(document) = serde_yaml::from_str::<serde_yaml::Value>(content) {
            for key in ignored_keys(&document) {
                warn!("Ignoring unknown configuration key '{key}'");
            }
        }

        debug!(
            "Parsed configuration for deployment {}/{}",
            config.target.namespace, config.target.deployment
        );
        Ok(config)
    }

    /// Loads the configuration, falling back to defaults when `path` is `None`,
    /// then applies environment overrides and resolves the manifest path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an
    /// override has the wrong shape.
    pub fn load(&self, path: Option<&Path>) -> Result<DeployConfig> {
        let mut config = match path {
            Some(path) => self.load_file(path)?,
            None => {
                debug!("No configuration file, using built-in defaults");
                DeployConfig::default()
            }
        };

        Self::apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

        Ok(config.with_manifest_base(&self.base_path()))
    }

    /// Applies environment variable overrides to the configuration.
    ///
    /// `lookup` resolves a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns an error if `DASHBOARD_ROLLOUT_TIMEOUT` is not a number.
    pub fn apply_env_overrides<F>(config: &mut DeployConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(namespace) = lookup("DASHBOARD_NAMESPACE") {
            debug!("Overriding namespace from environment");
            config.target.namespace = namespace;
        }

        if let Some(deployment) = lookup("DASHBOARD_DEPLOYMENT") {
            debug!("Overriding deployment from environment");
            config.target.deployment = deployment;
        }

        if let Some(service) = lookup("DASHBOARD_SERVICE") {
            debug!("Overriding service from environment");
            config.target.service = service;
        }

        if let Some(manifest) = lookup("DASHBOARD_MANIFEST") {
            debug!("Overriding manifest from environment");
            config.target.manifest = PathBuf::from(manifest);
        }

        if let Some(kubectl) = lookup("DASHBOARD_KUBECTL") {
            debug!("Overriding kubectl binary from environment");
            config.kubectl = kubectl;
        }

        if let Some(context) = lookup("DASHBOARD_CONTEXT") {
            debug!("Overriding kube context from environment");
            config.context = Some(context);
        }

        if let Some(timeout) = lookup("DASHBOARD_ROLLOUT_TIMEOUT") {
            config.rollout_timeout_secs = timeout.trim().parse().map_err(|_| {
                DeployError::Config(ConfigError::InvalidEnvVar {
                    name: String::from("DASHBOARD_ROLLOUT_TIMEOUT"),
                    value: timeout.clone(),
                })
            })?;
        }

        Ok(())
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self.base_path().join(".env");

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                DeployError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Dotted paths of keys in `document` that no configuration field reads.
///
/// The known keys are taken from the serialized defaults, so flattened and
/// nested sections are covered without a separate list.
fn ignored_keys(document: &Value) -> Vec<String> {
    let mut ignored = Vec::new();
    if let Ok(known) = serde_yaml::to_value(DeployConfig::default()) {
        collect_ignored(document, &known, "", &mut ignored);
    }
    ignored
}

fn collect_ignored(document: &Value, known: &Value, prefix: &str, ignored: &mut Vec<String>) {
    let (Value::Mapping(document), Value::Mapping(known)) = (document, known) else {
        return;
    };

    for (key, value) in document {
        let name = key
            .as_str()
            .map_or_else(|| format!("{key:?}"), ToString::to_string);
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}.{name}")
        };

        match known.get(key) {
            Some(known_value) => collect_ignored(value, known_value, &path, ignored),
            None => ignored.push(path),
        }
    }
}

/// Configuration file name searched for in the working directory and its parents.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard-deploy.yaml";

/// Finds the configuration file.
///
/// Searches `start_dir` and its parents, then the user configuration
/// directory. Returns `None` when no file exists anywhere.
///
/// A relative `start_dir` is canonicalized first so that the walk reaches
/// the parents of the working directory.
#[must_use]
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let start_dir = start_dir.as_ref();
    let mut current =
        std::fs::canonicalize(start_dir).unwrap_or_else(|_| start_dir.to_path_buf());

    loop {
        let config_path = current.join(DEFAULT_CONFIG_FILE);
        if config_path.exists() {
            info!("Found configuration file: {}", config_path.display());
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("dashboard-deploy").join("config.yaml"))
        .filter(|path| path.exists())
}
