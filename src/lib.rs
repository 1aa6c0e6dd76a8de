// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
// mockall's generated Mock* types carry no docs, so test builds skip this lint
#![cfg_attr(not(test), deny(missing_docs))] // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Dashboard Deploy
//!
//! A readiness-gated deployment sequencer for a Kubernetes dashboard.
//!
//! ## Overview
//!
//! The tool applies a static dashboard manifest once its surroundings are
//! in place, in one strictly ordered pass:
//!
//! 1. `kubectl` must be installed
//! 2. the namespace is created if missing
//! 3. the dependent StatefulSet is probed (missing asks the operator,
//!    no ready pods only warns)
//! 4. the manifest is applied
//! 5. the deployment must report `Available` within the timeout, otherwise
//!    pods and recent logs are printed and the run fails
//! 6. the operator may open a browser and a port-forward
//!
//! ## Modules
//!
//! - [`config`]: Defaults, configuration file, environment overrides, validation
//! - [`cluster`]: The `ClusterCli` seam and its `kubectl` implementation
//! - [`interact`]: Operator prompts and browser launching
//! - [`sequencer`]: The stage machine driving the six steps
//! - [`cli`]: Command-line arguments and colored output
//!
//! ## Example
//!
//! ```yaml
//! # dashboard-deploy.yaml (every key is optional)
//! namespace: monitoring
//! manifest: dashboard.yaml
//! dependency:
//!   statefulset: prometheus
//!   selector: app=prometheus
//! rollout_timeout_secs: 300
//! port_forward:
//!   local_port: 3000
//!   remote_port: 80
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod interact;
pub mod sequencer;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Console};
pub use cluster::{ClusterCli, Kubectl};
pub use config::{ConfigParser, ConfigValidator, DeployConfig, Target};
pub use error::{DeployError, Result};
pub use interact::{AutoConfirm, Browser, BrowserLauncher, Prompter, StdinPrompter};
pub use sequencer::{DeploymentSequencer, SequenceReport, Stage};
