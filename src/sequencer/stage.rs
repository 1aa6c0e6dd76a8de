//! Stages of the deployment sequence.

use serde::Serialize;
use std::fmt;

/// A point in the linear deployment sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing has run yet.
    Start,
    /// The cluster CLI is installed.
    ToolChecked,
    /// The namespace exists.
    NamespaceEnsured,
    /// The dependent workload was probed (or waived by the operator).
    DependencyChecked,
    /// The manifest was applied.
    Applied,
    /// The deployment reported available.
    Ready,
    /// The rollout wait expired. Terminal.
    TimedOut,
    /// The sequence finished.
    Done,
}

impl Stage {
    /// Returns true if the sequence may move from `self` to `next`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Start, Self::ToolChecked)
                | (Self::ToolChecked, Self::NamespaceEnsured)
                | (Self::NamespaceEnsured, Self::DependencyChecked)
                | (Self::DependencyChecked, Self::Applied)
                | (Self::Applied, Self::Ready | Self::TimedOut)
                | (Self::Ready, Self::Done)
        )
    }

    /// Returns true if no further stage follows.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::TimedOut | Self::Done)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::ToolChecked => "tool checked",
            Self::NamespaceEnsured => "namespace ensured",
            Self::DependencyChecked => "dependency checked",
            Self::Applied => "applied",
            Self::Ready => "ready",
            Self::TimedOut => "timed out",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN: [Stage; 7] = [
        Stage::Start,
        Stage::ToolChecked,
        Stage::NamespaceEnsured,
        Stage::DependencyChecked,
        Stage::Applied,
        Stage::Ready,
        Stage::Done,
    ];

    #[test]
    fn test_linear_chain() {
        for pair in CHAIN.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(Stage::Applied.can_advance_to(Stage::TimedOut));
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!Stage::Start.can_advance_to(Stage::Applied));
        assert!(!Stage::NamespaceEnsured.can_advance_to(Stage::ToolChecked));
        assert!(!Stage::Applied.can_advance_to(Stage::Done));
        assert!(!Stage::Ready.can_advance_to(Stage::Ready));
    }

    #[test]
    fn test_terminal_stages() {
        for stage in CHAIN {
            assert_eq!(stage.is_terminal(), stage == Stage::Done);
        }
        assert!(Stage::TimedOut.is_terminal());
        assert!(!Stage::TimedOut.can_advance_to(Stage::Done));
    }
}
