//! Match Logic for Dilemma Arena
//!
//! Core game logic for Iterated Prisoner's Dilemma tournaments:
//! - the payoff model
//! - the [`Decision`] collaborator interface and built-in rule strategies
//! - the match engine (simultaneous moves, per-call timeouts, fallbacks)
//! - deterministic round-robin pairing

mod decision;
mod error;
mod game;
mod pairing;
mod payoff;
mod random;
mod strategy;

pub use decision::{from_fn, parse_choice, Decision, FnDecision, MatchView};
pub use error::{DecisionError, FallbackReason, InvalidPayoff, MatchAborted};
pub use game::{run_match, Contestant, MatchConfig, MatchLedger, MatchOutcome, RoundRecord, Side};
pub use pairing::{
    calculate_match_count, generate_all_pairings, get_pairing_for_match, pair_count, Pairing,
};
pub use payoff::{payoff, PayoffMatrix};
pub use random::SeededRng;
pub use strategy::{execute_strategy, Move, Strategy, StrategyBase, StrategyParams};
