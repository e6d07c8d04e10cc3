//! Behavioral analytics over finished tournaments
//!
//! Pure reductions over the match ledgers. Nothing here touches the
//! ledgers themselves, so profiles can be recomputed at will.

use match_logic::{MatchLedger, MatchOutcome, Move, Side};
use serde::{Deserialize, Serialize};

use crate::state::{Disposition, TournamentResult};

/// The first broken truce of a match: after one or more rounds of mutual
/// cooperation, one side defects while the other still cooperates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstBlood {
    pub match_index: u32,
    pub round: u32,
    pub defector: String,
    pub victim: String,
}

/// First defection of a cooperative agent within one match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakingPoint {
    pub match_index: u32,
    pub opponent: String,
    /// `None` if the agent never defected in this match
    pub round: Option<u32>,
}

/// Behavioral profile of one agent across a tournament
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    pub disposition: Disposition,
    pub total_score: u64,
    pub matches_played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub rounds_played: u64,
    pub cooperations: u64,
    pub defections: u64,
    /// Rounds where the agent cooperated and the opponent defected
    pub sucker_index: u64,
    /// Rounds where the agent defected against a cooperating opponent
    pub exploit_count: u64,
    /// Defections / rounds played, 0.0 when the agent never defected
    pub betrayal_rate: f64,
    /// Rounds where this agent's move was a substituted fallback
    pub fallback_rounds: u64,
    /// First Blood events this agent committed
    pub first_blood: Vec<FirstBlood>,
    /// Per-match breaking points; empty unless the disposition opens cooperatively
    pub breaking_points: Vec<BreakingPoint>,
    /// Earliest breaking point across all matches
    pub breaking_point: Option<u32>,
}

impl AgentProfile {
    fn empty(name: &str, disposition: Disposition) -> Self {
        Self {
            name: name.to_string(),
            disposition,
            total_score: 0,
            matches_played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            rounds_played: 0,
            cooperations: 0,
            defections: 0,
            sucker_index: 0,
            exploit_count: 0,
            betrayal_rate: 0.0,
            fallback_rounds: 0,
            first_blood: Vec::new(),
            breaking_points: Vec::new(),
            breaking_point: None,
        }
    }
}

/// Head-to-head summary of one pair of agents
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSummary {
    pub agent_a: String,
    pub agent_b: String,
    pub matches: u32,
    pub score_a: u64,
    pub score_b: u64,
    pub mutual_cooperation: u64,
    pub mutual_defection: u64,
    pub first_blood_events: u32,
}

/// Find the First Blood event of a match, if any.
///
/// Requires a non-empty prefix of mutual cooperation. The prefix must end
/// in a one-sided defection; a mutual defection ends it with no event.
pub fn first_blood(ledger: &MatchLedger) -> Option<FirstBlood> {
    let mut truce = 0u32;
    for record in &ledger.rounds {
        let defector = match (record.move_a, record.move_b) {
            (Move::Cooperate, Move::Cooperate) => {
                truce += 1;
                continue;
            }
            (Move::Defect, Move::Cooperate) if truce > 0 => Side::A,
            (Move::Cooperate, Move::Defect) if truce > 0 => Side::B,
            _ => return None,
        };
        return Some(FirstBlood {
            match_index: ledger.match_index,
            round: record.round,
            defector: ledger.agent(defector).to_string(),
            victim: ledger.opponent(defector).to_string(),
        });
    }
    None
}

/// Round of the first defection by `side` in a match
pub fn first_defection(ledger: &MatchLedger, side: Side) -> Option<u32> {
    ledger
        .rounds
        .iter()
        .find(|r| r.moves_for(side).0 == Move::Defect)
        .map(|r| r.round)
}

/// Compute a profile for every agent, in roster order
pub fn analyze(result: &TournamentResult) -> Vec<AgentProfile> {
    let mut profiles: Vec<AgentProfile> = result
        .standings
        .iter()
        .map(|s| AgentProfile::empty(&s.name, s.disposition))
        .collect();

    for profile in &mut profiles {
        let name = profile.name.clone();
        for (ledger, side) in result.ledgers_for(&name) {
            accumulate(profile, ledger, side);
        }
        profile.betrayal_rate = if profile.rounds_played == 0 || profile.defections == 0 {
            0.0
        } else {
            profile.defections as f64 / profile.rounds_played as f64
        };
        profile.breaking_point = profile.breaking_points.iter().filter_map(|b| b.round).min();
    }

    profiles
}

fn accumulate(profile: &mut AgentProfile, ledger: &MatchLedger, side: Side) {
    profile.matches_played += 1;
    profile.total_score += ledger.total_for(side);
    match (ledger.outcome(), side) {
        (MatchOutcome::Draw, _) => profile.draws += 1,
        (MatchOutcome::WinA, Side::A) | (MatchOutcome::WinB, Side::B) => profile.wins += 1,
        _ => profile.losses += 1,
    }

    for record in &ledger.rounds {
        profile.rounds_played += 1;
        if record.fallback_for(side).is_some() {
            profile.fallback_rounds += 1;
        }
        match record.moves_for(side) {
            (Move::Cooperate, Move::Cooperate) => profile.cooperations += 1,
            (Move::Cooperate, Move::Defect) => {
                profile.cooperations += 1;
                profile.sucker_index += 1;
            }
            (Move::Defect, Move::Cooperate) => {
                profile.defections += 1;
                profile.exploit_count += 1;
            }
            (Move::Defect, Move::Defect) => profile.defections += 1,
        }
    }

    if let Some(event) = first_blood(ledger) {
        if event.defector == profile.name {
            profile.first_blood.push(event);
        }
    }

    if profile.disposition.opens_with_cooperation() {
        profile.breaking_points.push(BreakingPoint {
            match_index: ledger.match_index,
            opponent: ledger.opponent(side).to_string(),
            round: first_defection(ledger, side),
        });
    }
}

/// Summaries per pair of agents, in the order pairs were first scheduled
pub fn analyze_pairs(result: &TournamentResult) -> Vec<PairSummary> {
    let mut pairs: Vec<PairSummary> = Vec::new();

    for ledger in &result.ledgers {
        let position = pairs
            .iter()
            .position(|p| p.agent_a == ledger.agent_a && p.agent_b == ledger.agent_b);
        let summary = match position {
            Some(i) => &mut pairs[i],
            None => {
                pairs.push(PairSummary {
                    agent_a: ledger.agent_a.clone(),
                    agent_b: ledger.agent_b.clone(),
                    matches: 0,
                    score_a: 0,
                    score_b: 0,
                    mutual_cooperation: 0,
                    mutual_defection: 0,
                    first_blood_events: 0,
                });
                let last = pairs.len() - 1;
                &mut pairs[last]
            }
        };

        summary.matches += 1;
        summary.score_a += ledger.total_score_a;
        summary.score_b += ledger.total_score_b;
        for record in &ledger.rounds {
            match (record.move_a, record.move_b) {
                (Move::Cooperate, Move::Cooperate) => summary.mutual_cooperation += 1,
                (Move::Defect, Move::Defect) => summary.mutual_defection += 1,
                _ => {}
            }
        }
        if first_blood(ledger).is_some() {
            summary.first_blood_events += 1;
        }
    }

    pairs
}

/// Profiles ranked by total score, highest first; ties keep roster order
pub fn leaderboard(profiles: &[AgentProfile]) -> Vec<&AgentProfile> {
    let mut ranked: Vec<&AgentProfile> = profiles.iter().collect();
    ranked.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    ranked
}
