//! Match execution engine

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::decision::{Decision, MatchView};
use crate::error::{DecisionError, FallbackReason, MatchAborted};
use crate::payoff::PayoffMatrix;
use crate::strategy::Move;

/// Which seat of a match an agent occupies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

/// Result of a single round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round index
    pub round: u32,
    pub move_a: Move,
    pub move_b: Move,
    pub score_a: u32,
    pub score_b: u32,
    /// Set when A's move was substituted
    pub fallback_a: Option<FallbackReason>,
    /// Set when B's move was substituted
    pub fallback_b: Option<FallbackReason>,
}

impl RoundRecord {
    /// (own move, opponent move) from the given seat
    pub fn moves_for(&self, side: Side) -> (Move, Move) {
        match side {
            Side::A => (self.move_a, self.move_b),
            Side::B => (self.move_b, self.move_a),
        }
    }

    pub fn score_for(&self, side: Side) -> u32 {
        match side {
            Side::A => self.score_a,
            Side::B => self.score_b,
        }
    }

    pub fn fallback_for(&self, side: Side) -> Option<FallbackReason> {
        match side {
            Side::A => self.fallback_a,
            Side::B => self.fallback_b,
        }
    }
}

/// Winner of a completed match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    WinA,
    WinB,
    Draw,
}

/// Complete round-by-round record of one match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLedger {
    pub match_index: u32,
    pub agent_a: String,
    pub agent_b: String,
    /// Which of the pair's repeated matches this was, set by the scheduler
    #[serde(default)]
    pub repeat: u32,
    pub rounds: Vec<RoundRecord>,
    pub total_score_a: u64,
    pub total_score_b: u64,
}

impl MatchLedger {
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Seat occupied by `agent`, if it played this match
    pub fn side_of(&self, agent: &str) -> Option<Side> {
        if self.agent_a == agent {
            Some(Side::A)
        } else if self.agent_b == agent {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn agent(&self, side: Side) -> &str {
        match side {
            Side::A => &self.agent_a,
            Side::B => &self.agent_b,
        }
    }

    pub fn opponent(&self, side: Side) -> &str {
        match side {
            Side::A => &self.agent_b,
            Side::B => &self.agent_a,
        }
    }

    pub fn total_for(&self, side: Side) -> u64 {
        match side {
            Side::A => self.total_score_a,
            Side::B => self.total_score_b,
        }
    }

    pub fn outcome(&self) -> MatchOutcome {
        match self.total_score_a.cmp(&self.total_score_b) {
            std::cmp::Ordering::Greater => MatchOutcome::WinA,
            std::cmp::Ordering::Less => MatchOutcome::WinB,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
        }
    }

    /// Rounds in which at least one move was substituted
    pub fn fallback_rounds(&self) -> impl Iterator<Item = &RoundRecord> {
        self.rounds
            .iter()
            .filter(|r| r.fallback_a.is_some() || r.fallback_b.is_some())
    }
}

/// Per-match settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchConfig {
    pub rounds: u32,
    pub payoff: PayoffMatrix,
    /// Substituted when a decision fails
    pub fallback_move: Move,
    /// Upper bound on a single decision call
    pub decision_timeout: Duration,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rounds: 20,
            payoff: PayoffMatrix::default(),
            fallback_move: Move::Defect,
            decision_timeout: Duration::from_secs(30),
        }
    }
}

/// One seat at the table: a name plus whoever decides for it
#[derive(Clone, Copy)]
pub struct Contestant<'a> {
    pub name: &'a str,
    pub decision: &'a dyn Decision,
}

impl<'a> Contestant<'a> {
    pub fn new(name: &'a str, decision: &'a dyn Decision) -> Self {
        Self { name, decision }
    }
}

/// Failure bookkeeping for one seat across a match
#[derive(Default)]
struct SeatHealth {
    unreachable: u32,
    last_error: Option<DecisionError>,
}

/// Run a complete match between two contestants
///
/// Both decisions of a round are requested concurrently from views frozen
/// before the round, so neither side can see the other's current move.
/// Failed decisions are replaced by `config.fallback_move` and marked on the
/// round; the ledger always has exactly `config.rounds` entries.
///
/// # Errors
/// [`MatchAborted`] when one side was unreachable (timeout or transport
/// failure) on every round.
pub async fn run_match(
    a: &Contestant<'_>,
    b: &Contestant<'_>,
    config: &MatchConfig,
    match_index: u32,
) -> Result<MatchLedger, MatchAborted> {
    let capacity = config.rounds as usize;
    let mut history_a: Vec<Move> = Vec::with_capacity(capacity);
    let mut history_b: Vec<Move> = Vec::with_capacity(capacity);
    let mut rounds: Vec<RoundRecord> = Vec::with_capacity(capacity);
    let mut total_a = 0u64;
    let mut total_b = 0u64;
    let mut health_a = SeatHealth::default();
    let mut health_b = SeatHealth::default();

    for round in 1..=config.rounds {
        let view_a = MatchView {
            match_index,
            own_moves: &history_a,
            opponent_moves: &history_b,
            own_score: total_a,
            opponent_score: total_b,
        };
        let view_b = MatchView {
            match_index,
            own_moves: &history_b,
            opponent_moves: &history_a,
            own_score: total_b,
            opponent_score: total_a,
        };

        let (decided_a, decided_b) = tokio::join!(
            decide_within(a, &view_a, round, config.decision_timeout),
            decide_within(b, &view_b, round, config.decision_timeout),
        );

        let (move_a, fallback_a) =
            settle(a.name, match_index, round, decided_a, config, &mut health_a);
        let (move_b, fallback_b) =
            settle(b.name, match_index, round, decided_b, config, &mut health_b);

        let (score_a, score_b) = config.payoff.score(move_a, move_b);
        total_a += score_a as u64;
        total_b += score_b as u64;

        debug!(
            match_index,
            round,
            %move_a,
            %move_b,
            score_a,
            score_b,
            "round played"
        );

        rounds.push(RoundRecord {
            round,
            move_a,
            move_b,
            score_a,
            score_b,
            fallback_a,
            fallback_b,
        });

        history_a.push(move_a);
        history_b.push(move_b);
    }

    for (name, health) in [(a.name, health_a), (b.name, health_b)] {
        if config.rounds > 0 && health.unreachable == config.rounds {
            if let Some(last_error) = health.last_error {
                return Err(MatchAborted {
                    match_index,
                    agent: name.to_string(),
                    rounds: config.rounds,
                    last_error,
                });
            }
        }
    }

    Ok(MatchLedger {
        match_index,
        agent_a: a.name.to_string(),
        agent_b: b.name.to_string(),
        repeat: 0,
        rounds,
        total_score_a: total_a,
        total_score_b: total_b,
    })
}

async fn decide_within(
    contestant: &Contestant<'_>,
    view: &MatchView<'_>,
    round: u32,
    limit: Duration,
) -> Result<Move, DecisionError> {
    let call = contestant.decision.decide(contestant.name, view, round);
    match tokio::time::timeout(limit, call).await {
        Ok(decided) => decided,
        Err(_) => Err(DecisionError::Timeout {
            elapsed_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Turn a decision result into the move actually played
fn settle(
    agent: &str,
    match_index: u32,
    round: u32,
    decided: Result<Move, DecisionError>,
    config: &MatchConfig,
    health: &mut SeatHealth,
) -> (Move, Option<FallbackReason>) {
    match decided {
        Ok(m) => (m, None),
        Err(err) => {
            warn!(
                event = "decision.fallback",
                agent = %agent,
                match_index,
                round,
                fallback = %config.fallback_move,
                error = %err,
                "decision failed, substituting fallback move"
            );
            let reason = FallbackReason::from(&err);
            if err.is_unreachable() {
                health.unreachable += 1;
                health.last_error = Some(err);
            }
            (config.fallback_move, Some(reason))
        }
    }
}
