//! Tournament configuration errors
//!
//! Everything in here is raised before the first match starts. Failures
//! that happen while a tournament runs (bad decisions, unreachable agents)
//! are recovered inside the run and never surface as errors.

use match_logic::InvalidPayoff;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("a tournament needs at least 2 agents, got {count}")]
    TooFewAgents { count: usize },

    #[error("agent name {name:?} is used more than once")]
    DuplicateAgent { name: String },

    #[error("agent at position {position} has an empty name")]
    EmptyAgentName { position: usize },

    #[error("rounds per match must be positive")]
    InvalidRoundCount,

    #[error("repeats per pairing must be positive")]
    InvalidRepeatCount,

    #[error("max concurrent matches must be positive")]
    InvalidConcurrency,

    #[error("decision timeout must be positive")]
    InvalidTimeout,

    #[error("tournament would schedule {matches} matches, more than can be indexed")]
    TooManyMatches { matches: u64 },

    #[error(transparent)]
    Payoff(#[from] InvalidPayoff),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;
