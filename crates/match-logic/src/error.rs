//! Error types for decisions and matches

use serde::{Deserialize, Serialize};

/// Failure of a single decision call.
///
/// Never escapes the match engine: every variant is converted into the
/// configured fallback move for that round.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    #[error("decision timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    #[error("malformed decision reply: {raw:?}")]
    Malformed { raw: String },

    #[error("decision transport failure: {detail}")]
    Transport { detail: String },
}

impl DecisionError {
    pub fn malformed(raw: impl Into<String>) -> Self {
        Self::Malformed { raw: raw.into() }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::Transport {
            detail: detail.into(),
        }
    }

    /// Whether the collaborator could not be reached at all (as opposed to
    /// answering with garbage).
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. })
    }
}

/// Audit marker stored on a round whose move was substituted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FallbackReason {
    Timeout,
    Malformed,
    Transport,
}

impl From<&DecisionError> for FallbackReason {
    fn from(err: &DecisionError) -> Self {
        match err {
            DecisionError::Timeout { .. } => Self::Timeout,
            DecisionError::Malformed { .. } => Self::Malformed,
            DecisionError::Transport { .. } => Self::Transport,
        }
    }
}

/// A whole match could not be played because one side's collaborator was
/// unreachable on every round.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("match {match_index} aborted: {agent} unreachable for all {rounds} rounds (last error: {last_error})")]
pub struct MatchAborted {
    pub match_index: u32,
    pub agent: String,
    pub rounds: u32,
    pub last_error: DecisionError,
}

/// Payoff values that do not form a Prisoner's Dilemma
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error(
    "payoffs must satisfy temptation > reward > punishment > sucker \
     (got T={temptation}, R={reward}, P={punishment}, S={sucker})"
)]
pub struct InvalidPayoff {
    pub reward: u32,
    pub sucker: u32,
    pub temptation: u32,
    pub punishment: u32,
}
