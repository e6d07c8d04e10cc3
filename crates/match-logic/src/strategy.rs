//! Moves and built-in rule strategies
//!
//! The rule strategies are ordinary [`Decision`] implementations. The
//! engine treats them exactly like a remote collaborator.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::decision::{Decision, MatchView};
use crate::error::DecisionError;
use crate::random::SeededRng;

/// A move in the Prisoner's Dilemma
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Cooperate,
    Defect,
}

impl Move {
    pub fn opposite(self) -> Self {
        match self {
            Move::Cooperate => Move::Defect,
            Move::Defect => Move::Cooperate,
        }
    }

    pub fn is_defect(self) -> bool {
        self == Move::Defect
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Cooperate => f.write_str("cooperate"),
            Move::Defect => f.write_str("defect"),
        }
    }
}

/// Base strategy type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyBase {
    /// Copy opponent's last move. Start with cooperate.
    TitForTat,
    /// Always defect, never cooperate.
    AlwaysDefect,
    /// Always cooperate, never defect.
    AlwaysCooperate,
    /// Cooperate until opponent defects once, then always defect.
    GrimTrigger,
    /// Win-stay, lose-switch.
    Pavlov,
    /// Tit-for-Tat but start with defect.
    SuspiciousTitForTat,
    /// Random choice each round.
    Random,
    /// Defect only if opponent defected twice in a row.
    TitForTwoTats,
    /// Retaliate with increasing defection streaks, then forgive.
    Gradual,
}

/// Strategy parameters for fine-tuning behavior
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Percentage chance to cooperate after opponent defects (0-100)
    pub forgiveness: u8,
    /// Rounds to wait before retaliating
    pub retaliation_delay: u8,
    /// Number of defections to ignore before retaliating
    pub noise_tolerance: u8,
    /// Bitmask of the first 8 rounds (1 = defect, 0 = use strategy)
    pub initial_moves: u8,
    /// Bias toward cooperation for Random strategy (0-100)
    pub cooperate_bias: u8,
    /// Seed for the randomized parts (Random, forgiveness)
    pub seed: u64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            forgiveness: 0,
            retaliation_delay: 0,
            noise_tolerance: 0,
            initial_moves: 0,
            cooperate_bias: 50,
            seed: 0,
        }
    }
}

/// Complete strategy with base type and parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub base: StrategyBase,
    #[serde(default)]
    pub params: StrategyParams,
}

impl Strategy {
    /// Create a new strategy with default parameters
    pub fn new(base: StrategyBase) -> Self {
        Self {
            base,
            params: StrategyParams::default(),
        }
    }

    /// Create with custom parameters
    pub fn with_params(base: StrategyBase, params: StrategyParams) -> Self {
        Self { base, params }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::new(StrategyBase::TitForTat)
    }
}

#[async_trait]
impl Decision for Strategy {
    async fn decide(
        &self,
        agent: &str,
        view: &MatchView<'_>,
        round: u32,
    ) -> Result<Move, DecisionError> {
        let mut rng =
            SeededRng::labelled(self.params.seed, agent, view.match_index).for_round(round);
        Ok(execute_strategy(self, view, round, &mut rng))
    }
}

/// Execute a strategy for one round
///
/// # Arguments
/// * `strategy` - The strategy to execute
/// * `view` - This player's view of the match so far
/// * `round` - Current round number (1-based)
/// * `rng` - Random number generator for this round
pub fn execute_strategy(
    strategy: &Strategy,
    view: &MatchView<'_>,
    round: u32,
    rng: &mut SeededRng,
) -> Move {
    // Check initial_moves override (first 8 rounds)
    if (1..=8).contains(&round) {
        let bit = (strategy.params.initial_moves >> (round - 1)) & 1;
        if bit == 1 {
            return Move::Defect;
        }
    }

    let opponent = view.opponent_moves;
    match strategy.base {
        StrategyBase::TitForTat => match opponent.last() {
            None | Some(Move::Cooperate) => Move::Cooperate,
            Some(Move::Defect) => retaliate(opponent, &strategy.params, rng),
        },
        StrategyBase::AlwaysDefect => Move::Defect,
        StrategyBase::AlwaysCooperate => Move::Cooperate,
        StrategyBase::GrimTrigger => {
            if view.opponent_defections() > strategy.params.noise_tolerance as usize {
                Move::Defect
            } else {
                Move::Cooperate
            }
        }
        StrategyBase::Pavlov => execute_pavlov(view),
        StrategyBase::SuspiciousTitForTat => match opponent.last() {
            None => Move::Defect,
            Some(Move::Cooperate) => Move::Cooperate,
            Some(Move::Defect) => retaliate(opponent, &strategy.params, rng),
        },
        StrategyBase::Random => {
            if rng.next_percent() < strategy.params.cooperate_bias {
                Move::Cooperate
            } else {
                Move::Defect
            }
        }
        StrategyBase::TitForTwoTats => execute_tit_for_two_tats(opponent),
        StrategyBase::Gradual => execute_gradual(view),
    }
}

/// Answer to an opponent defection, honouring delay and forgiveness
fn retaliate(opponent_history: &[Move], params: &StrategyParams, rng: &mut SeededRng) -> Move {
    if params.retaliation_delay > 0 {
        if let Some(pos) = opponent_history.iter().rposition(|m| *m == Move::Defect) {
            let rounds_since = opponent_history.len() - 1 - pos;
            if rounds_since < params.retaliation_delay as usize {
                return Move::Cooperate;
            }
        }
    }
    if params.forgiveness > 0 && rng.next_percent() < params.forgiveness {
        Move::Cooperate
    } else {
        Move::Defect
    }
}

/// Pavlov: repeat the last move after the opponent cooperated (reward or
/// temptation), switch after the opponent defected (sucker or punishment).
fn execute_pavlov(view: &MatchView<'_>) -> Move {
    match (view.last_own_move(), view.last_opponent_move()) {
        (Some(mine), Some(Move::Cooperate)) => mine,
        (Some(mine), Some(Move::Defect)) => mine.opposite(),
        _ => Move::Cooperate,
    }
}

fn execute_tit_for_two_tats(opponent_history: &[Move]) -> Move {
    match opponent_history {
        [.., Move::Defect, Move::Defect] => Move::Defect,
        _ => Move::Cooperate,
    }
}

/// Gradual: after N opponent defections, have made N(N+1)/2 defections
fn execute_gradual(view: &MatchView<'_>) -> Move {
    let theirs = view.opponent_defections();
    let expected = theirs * (theirs + 1) / 2;

    if view.own_defections() < expected {
        Move::Defect
    } else {
        Move::Cooperate
    }
}
