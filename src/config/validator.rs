//! Configuration validation.
//!
//! Runs before any cluster call so a bad value never reaches `kubectl`.

use crate::error::{ConfigError, DeployError, Result};
use tracing::debug;

use super::spec::DeployConfig;

/// Maximum length of a DNS label.
const MAX_LABEL_LEN: usize = 63;

/// Maximum length of a DNS-1123 subdomain.
const MAX_SUBDOMAIN_LEN: usize = 253;

/// Naming rule the API server applies to an object kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameKind {
    /// DNS-1123 label: namespaces.
    Label,
    /// DNS-1035 label: services, which must start with a letter.
    ServiceLabel,
    /// DNS-1123 subdomain: deployments and statefulsets.
    Subdomain,
}

impl NameKind {
    fn accepts(self, name: &str) -> bool {
        match self {
            Self::Label => is_dns1123_label(name),
            Self::ServiceLabel => {
                is_dns1123_label(name) && name.starts_with(|c: char| c.is_ascii_lowercase())
            }
            Self::Subdomain => is_dns1123_subdomain(name),
        }
    }

    const fn describe(self) -> &'static str {
        match self {
            Self::Label => "DNS-1123 label",
            Self::ServiceLabel => "DNS-1035 label",
            Self::Subdomain => "DNS-1123 subdomain",
        }
    }
}

/// Validator for deployment configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a deployment configuration.
    ///
    /// # Errors
    ///
    /// Returns a single validation error listing every violation found.
    pub fn validate(&self, config: &DeployConfig) -> Result<ValidationResult> {
        debug!("Validating configuration");

        let mut result = ValidationResult::default();

        let names = [
            ("namespace", config.target.namespace.as_str(), NameKind::Label),
            ("deployment", config.target.deployment.as_str(), NameKind::Subdomain),
            ("service", config.target.service.as_str(), NameKind::ServiceLabel),
            (
                "dependency.statefulset",
                config.dependency.statefulset.as_str(),
                NameKind::Subdomain,
            ),
        ];
        for (field, value, kind) in names {
            if !kind.accepts(value) {
                result.add_error(
                    field,
                    format!("'{value}' is not a valid {}", kind.describe()),
                );
            }
        }

        if config.target.manifest.as_os_str().is_empty() {
            result.add_error("manifest", "must not be empty");
        }

        for (field, value) in [
            ("dependency.selector", config.dependency.selector.as_str()),
            ("app_selector", config.app_selector.as_str()),
            ("kubectl", config.kubectl.as_str()),
        ] {
            if value.trim().is_empty() {
                result.add_error(field, "must not be empty");
            }
        }

        if config.context.as_deref().is_some_and(|c| c.trim().is_empty()) {
            result.add_error("context", "must not be empty when set");
        }

        if config.rollout_timeout_secs == 0 {
            result.add_error("rollout_timeout_secs", "must be greater than zero");
        }

        if config.port_forward.local_port == 0 {
            result.add_error("port_forward.local_port", "must be greater than zero");
        }

        if config.port_forward.remote_port == 0 {
            result.add_error("port_forward.remote_port", "must be greater than zero");
        }

        match result.errors.as_slice() {
            [] => Ok(result),
            [single] => Err(DeployError::Config(ConfigError::validation(
                single.to_string(),
                single.field.clone(),
            ))),
            errors => {
                let message = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(DeployError::Config(ConfigError::validation_general(message)))
            }
        }
    }
}

impl ValidationResult {
    fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Lowercase alphanumerics and `-`, starting and ending alphanumeric.
fn is_label_shaped(part: &str) -> bool {
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    match part.as_bytes() {
        [] => false,
        [first, .., last] => {
            alnum(*first) && alnum(*last) && part.bytes().all(|b| alnum(b) || b == b'-')
        }
        [only] => alnum(*only),
    }
}

/// Checks that `name` is a DNS-1123 label.
fn is_dns1123_label(name: &str) -> bool {
    name.len() <= MAX_LABEL_LEN && is_label_shaped(name)
}

/// Checks that `name` is a DNS-1123 subdomain: dot-separated label-shaped parts.
fn is_dns1123_subdomain(name: &str) -> bool {
    name.len() <= MAX_SUBDOMAIN_LEN && name.split('.').all(is_label_shaped)
}
