//! Yes/no operator confirmations.

use std::io::{BufRead, BufReader, Stdin, Write};
use std::sync::Mutex;

use crate::error::{DeployError, Result};

/// Asks the operator a yes/no question.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter: Send + Sync {
    /// Returns true if the operator affirmed `question`.
    ///
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read.
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Prompts on stderr and reads the answer from a line-oriented reader.
#[derive(Debug)]
pub struct StdinPrompter<R> {
    /// Answer source.
    input: Mutex<R>,
}

impl StdinPrompter<BufReader<Stdin>> {
    /// Reads answers from the process's standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(std::io::stdin()))
    }
}

impl<R: BufRead> StdinPrompter<R> {
    /// Reads answers from `input`.
    pub const fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

impl<R: BufRead + Send> Prompter for StdinPrompter<R> {
    fn confirm(&self, question: &str) -> Result<bool> {
        eprint!("{question} [y/N]: ");
        std::io::stderr().flush()?;

        let mut answer = String::new();
        self.input
            .lock()
            .map_err(|_| DeployError::internal("prompt input lock poisoned"))?
            .read_line(&mut answer)?;

        Ok(is_affirmative(&answer))
    }
}

/// Answers every question with a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Prompter for AutoConfirm {
    fn confirm(&self, _question: &str) -> Result<bool> {
        Ok(self.0)
    }
}

/// Only an explicit `y` or `yes` counts; end of input is a refusal.
fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
