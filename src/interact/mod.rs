//! Operator interaction: confirmations and browser launching.

mod browser;
mod prompt;

pub use browser::{Browser, BrowserLauncher, Opener};
pub use prompt::{AutoConfirm, Prompter, StdinPrompter};

#[cfg(test)]
pub use browser::MockBrowser;
#[cfg(test)]
pub use prompt::MockPrompter;
