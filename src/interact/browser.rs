//! Best-effort browser launching.
//!
//! Openers are tried in priority order. A failure to spawn, or a non-zero
//! exit, moves on to the next opener; running out of openers is not an error.

use std::process::{Command, Stdio};
use tracing::debug;

/// Opens a URL in the operator's browser.
#[cfg_attr(test, mockall::automock)]
pub trait Browser: Send + Sync {
    /// Opens `url`, returning the name of the opener that succeeded.
    fn open(&self, url: &str) -> Option<String>;
}

/// A platform URL opener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opener {
    /// Program to execute.
    pub program: String,
    /// Arguments placed before the URL.
    pub args: Vec<String>,
}

impl Opener {
    /// Creates an opener for `program` with leading `args`.
    #[must_use]
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    /// Runs the opener for `url`; true if it exited successfully.
    fn launch(&self, url: &str) -> bool {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                debug!("Opener {} unavailable: {e}", self.program);
                false
            }
        }
    }
}

/// Tries each opener in turn.
#[derive(Debug, Clone)]
pub struct BrowserLauncher {
    /// Openers in priority order.
    openers: Vec<Opener>,
}

impl Default for BrowserLauncher {
    fn default() -> Self {
        Self::new(vec![
            Opener::new("xdg-open", &[]),
            Opener::new("open", &[]),
            Opener::new("cmd", &["/C", "start", ""]),
        ])
    }
}

impl BrowserLauncher {
    /// Creates a launcher with the given openers.
    #[must_use]
    pub const fn new(openers: Vec<Opener>) -> Self {
        Self { openers }
    }

    /// Tries `attempt` on each opener until one returns true.
    pub fn first_success<F>(&self, mut attempt: F) -> Option<&Opener>
    where
        F: FnMut(&Opener) -> bool,
    {
        self.openers.iter().find(|opener| attempt(opener))
    }
}

impl Browser for BrowserLauncher {
    fn open(&self, url: &str) -> Option<String> {
        self.first_success(|opener| opener.launch(url))
            .map(|opener| opener.program.clone())
    }
}
