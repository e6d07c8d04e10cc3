//! Dilemma Arena tournaments
//!
//! Runs round-robin Iterated Prisoner's Dilemma tournaments between
//! [`Agent`]s and derives behavioral profiles from the resulting ledgers.
//!
//! ```no_run
//! use arena_tournament::{
//!     analyze, leaderboard, run_tournament, Agent, Disposition, Strategy, StrategyBase,
//!     TournamentConfig,
//! };
//!
//! # async fn demo() -> Result<(), arena_tournament::ConfigurationError> {
//! let agents = vec![
//!     Agent::new("dove", Disposition::Altruistic, Strategy::new(StrategyBase::AlwaysCooperate)),
//!     Agent::new("hawk", Disposition::Exploitative, Strategy::new(StrategyBase::AlwaysDefect)),
//!     Agent::new("mirror", Disposition::Retaliatory, Strategy::new(StrategyBase::TitForTat)),
//! ];
//! let result = run_tournament(agents, TournamentConfig::default()).await?;
//! let profiles = analyze(&result);
//! for profile in leaderboard(&profiles) {
//!     println!("{} {}", profile.name, profile.total_score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod error;
pub mod scheduler;
pub mod state;
pub mod telemetry;

pub use analytics::{
    analyze, analyze_pairs, first_blood, first_defection, leaderboard, AgentProfile, BreakingPoint,
    FirstBlood, PairSummary,
};
pub use error::{ConfigResult, ConfigurationError};
pub use scheduler::{run_tournament, CancelHandle, TournamentScheduler};
pub use state::{
    validate_roster, Agent, AgentScore, Disposition, SkippedMatch, TournamentConfig,
    TournamentResult,
};
pub use telemetry::init_tracing;

pub use match_logic::{
    from_fn, parse_choice, payoff, Decision, DecisionError, FallbackReason, MatchLedger,
    MatchOutcome, MatchView, Move, PayoffMatrix, RoundRecord, Side, Strategy, StrategyBase,
    StrategyParams,
};
