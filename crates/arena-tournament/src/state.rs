//! Tournament state: agents, configuration and results

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use match_logic::{
    calculate_match_count, Decision, MatchConfig, MatchLedger, Move, PayoffMatrix, Side,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigResult, ConfigurationError};

/// Declared behavioral tendency of an agent.
///
/// Bookkeeping only: behaviour comes from the agent's [`Decision`]. The
/// analytics use it to decide which agents have a breaking point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    /// Cooperates no matter what
    Altruistic,
    /// Cooperates until wronged, then punishes
    Retaliatory,
    /// Defects to extract value
    Exploitative,
    /// Cooperates or defects depending on what pays
    Opportunistic,
    #[default]
    Unspecified,
}

impl Disposition {
    /// Whether agents of this disposition open every match cooperating
    pub fn opens_with_cooperation(self) -> bool {
        matches!(self, Disposition::Altruistic | Disposition::Retaliatory)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Disposition::Altruistic => "altruistic",
            Disposition::Retaliatory => "retaliatory",
            Disposition::Exploitative => "exploitative",
            Disposition::Opportunistic => "opportunistic",
            Disposition::Unspecified => "unspecified",
        };
        f.write_str(label)
    }
}

/// A tournament participant
#[derive(Clone)]
pub struct Agent {
    pub name: String,
    pub disposition: Disposition,
    pub decision: Arc<dyn Decision>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        disposition: Disposition,
        decision: impl Decision + 'static,
    ) -> Self {
        Self::with_shared(name, disposition, Arc::new(decision))
    }

    /// Build an agent around an already shared decision maker (e.g. one
    /// inference client serving several agents)
    pub fn with_shared(
        name: impl Into<String>,
        disposition: Disposition,
        decision: Arc<dyn Decision>,
    ) -> Self {
        Self {
            name: name.into(),
            disposition,
            decision,
        }
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("disposition", &self.disposition)
            .finish_non_exhaustive()
    }
}

/// Tournament parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    pub rounds_per_match: u32,
    /// Matches played per unordered pair
    pub repeats: u32,
    /// Move substituted when a decision fails
    pub fallback_move: Move,
    /// Upper bound on a single decision call, in milliseconds
    pub decision_timeout_ms: u64,
    /// Matches in flight at once; anything above the match count behaves
    /// like the match count
    pub max_concurrent_matches: usize,
    pub payoff: PayoffMatrix,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            rounds_per_match: 20,
            repeats: 1,
            fallback_move: Move::Defect,
            decision_timeout_ms: 30_000,
            max_concurrent_matches: 4,
            payoff: PayoffMatrix::default(),
        }
    }
}

impl TournamentConfig {
    pub fn decision_timeout(&self) -> Duration {
        Duration::from_millis(self.decision_timeout_ms)
    }

    /// Settings handed to every match of the tournament
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            rounds: self.rounds_per_match,
            payoff: self.payoff,
            fallback_move: self.fallback_move,
            decision_timeout: self.decision_timeout(),
        }
    }

    /// Check the parameters that do not depend on the roster
    pub fn validate(&self) -> ConfigResult<()> {
        if self.rounds_per_match == 0 {
            return Err(ConfigurationError::InvalidRoundCount);
        }
        if self.repeats == 0 {
            return Err(ConfigurationError::InvalidRepeatCount);
        }
        if self.max_concurrent_matches == 0 {
            return Err(ConfigurationError::InvalidConcurrency);
        }
        if self.decision_timeout_ms == 0 {
            return Err(ConfigurationError::InvalidTimeout);
        }
        self.payoff.validate()?;
        Ok(())
    }
}

/// Check the roster: at least two agents, unique non-empty names, and a
/// schedule small enough to index.
pub fn validate_roster(agents: &[Agent], repeats: u32) -> ConfigResult<()> {
    if agents.len() < 2 {
        return Err(ConfigurationError::TooFewAgents {
            count: agents.len(),
        });
    }

    let mut seen = HashSet::with_capacity(agents.len());
    for (position, agent) in agents.iter().enumerate() {
        if agent.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyAgentName { position });
        }
        if !seen.insert(agent.name.as_str()) {
            return Err(ConfigurationError::DuplicateAgent {
                name: agent.name.clone(),
            });
        }
    }

    let count = u32::try_from(agents.len()).map_err(|_| ConfigurationError::TooManyMatches {
        matches: u64::MAX,
    })?;
    let matches = calculate_match_count(count, repeats);
    if matches > u32::MAX as u64 {
        return Err(ConfigurationError::TooManyMatches { matches });
    }
    Ok(())
}

/// Cumulative score of one agent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentScore {
    pub name: String,
    pub disposition: Disposition,
    pub score: u64,
}

/// A match that could not be played even after a retry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedMatch {
    pub match_index: u32,
    pub agent_a: String,
    pub agent_b: String,
    pub reason: String,
}

/// Everything a tournament produced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentResult {
    pub rounds_per_match: u32,
    /// Completed matches, ordered by match index
    pub ledgers: Vec<MatchLedger>,
    pub skipped: Vec<SkippedMatch>,
    /// Final scores, in roster order
    pub standings: Vec<AgentScore>,
    pub matches_scheduled: u32,
    /// Set when the run was cancelled before every match started
    pub incomplete: bool,
}

impl TournamentResult {
    pub fn matches_completed(&self) -> usize {
        self.ledgers.len()
    }

    /// Matches that never started because the run was cancelled
    pub fn matches_not_started(&self) -> usize {
        (self.matches_scheduled as usize).saturating_sub(self.ledgers.len() + self.skipped.len())
    }

    pub fn score_of(&self, name: &str) -> Option<u64> {
        self.standings.iter().find(|s| s.name == name).map(|s| s.score)
    }

    /// Ledgers of every match `name` played, with the seat it occupied
    pub fn ledgers_for<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (&'a MatchLedger, Side)> + 'a {
        self.ledgers
            .iter()
            .filter_map(move |ledger| ledger.side_of(name).map(|side| (ledger, side)))
    }

    /// Check that every agent's score equals the sum of its round payoffs
    /// and that every ledger is full length.
    pub fn verify_scores(&self) -> bool {
        if self
            .ledgers
            .iter()
            .any(|l| l.len() != self.rounds_per_match as usize)
        {
            return false;
        }

        self.standings.iter().all(|standing| {
            let from_rounds: u64 = self
                .ledgers_for(&standing.name)
                .flat_map(|(ledger, side)| {
                    ledger.rounds.iter().map(move |r| r.score_for(side) as u64)
                })
                .sum();
            from_rounds == standing.score
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use match_logic::{Strategy, StrategyBase};

    fn agent(name: &str) -> Agent {
        Agent::new(name, Disposition::Unspecified, Strategy::new(StrategyBase::TitForTat))
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TournamentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fallback_move, Move::Defect);
        assert_eq!(config.decision_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_rejects_zero_values() {
        let zero_rounds = TournamentConfig {
            rounds_per_match: 0,
            ..Default::default()
        };
        assert_eq!(zero_rounds.validate(), Err(ConfigurationError::InvalidRoundCount));

        let zero_repeats = TournamentConfig {
            repeats: 0,
            ..Default::default()
        };
        assert_eq!(zero_repeats.validate(), Err(ConfigurationError::InvalidRepeatCount));

        let zero_workers = TournamentConfig {
            max_concurrent_matches: 0,
            ..Default::default()
        };
        assert_eq!(zero_workers.validate(), Err(ConfigurationError::InvalidConcurrency));

        let zero_timeout = TournamentConfig {
            decision_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(zero_timeout.validate(), Err(ConfigurationError::InvalidTimeout));
    }

    #[test]
    fn test_config_accepts_any_positive_concurrency() {
        let huge = TournamentConfig {
            max_concurrent_matches: usize::MAX,
            ..Default::default()
        };
        assert!(huge.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_payoff() {
        let config = TournamentConfig {
            payoff: PayoffMatrix {
                reward: 1,
                sucker: 0,
                temptation: 5,
                punishment: 3,
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigurationError::Payoff(_))));
    }

    #[test]
    fn test_config_from_partial_json() {
        let raw = r#"{"rounds_per_match": 11, "fallback_move": "Cooperate"}"#;
        let config: TournamentConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.rounds_per_match, 11);
        assert_eq!(config.fallback_move, Move::Cooperate);
        assert_eq!(config.repeats, 1);
        assert_eq!(config.match_config().rounds, 11);
    }

    #[test]
    fn test_roster_validation() {
        assert_eq!(
            validate_roster(&[agent("solo")], 1),
            Err(ConfigurationError::TooFewAgents { count: 1 })
        );
        assert_eq!(
            validate_roster(&[agent("a"), agent("b"), agent("a")], 1),
            Err(ConfigurationError::DuplicateAgent {
                name: "a".to_string(),
            })
        );
        assert_eq!(
            validate_roster(&[agent("a"), agent("  ")], 1),
            Err(ConfigurationError::EmptyAgentName { position: 1 })
        );
        assert!(validate_roster(&[agent("a"), agent("b")], 3).is_ok());
    }

    #[test]
    fn test_disposition_openers() {
        assert!(Disposition::Altruistic.opens_with_cooperation());
        assert!(Disposition::Retaliatory.opens_with_cooperation());
        assert!(!Disposition::Exploitative.opens_with_cooperation());
        assert!(!Disposition::Opportunistic.opens_with_cooperation());
        assert!(!Disposition::Unspecified.opens_with_cooperation());
        assert_eq!(Disposition::Retaliatory.to_string(), "retaliatory");
    }

    #[test]
    fn test_agent_debug_hides_decision() {
        let rendered = format!("{:?}", agent("enforcer"));
        assert!(rendered.contains("enforcer"));
        assert!(rendered.contains(".."));
    }
}
