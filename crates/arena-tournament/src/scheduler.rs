//! Tournament scheduler
//!
//! Plays every pairing of the roster, `repeats` times each, on a bounded
//! window of tokio tasks. Scores are folded in match-index order once the
//! matches have finished, so the result does not depend on which task
//! happened to finish first.

use std::sync::Arc;

use match_logic::{
    calculate_match_count, get_pairing_for_match, run_match, Contestant, MatchConfig,
    MatchLedger, Pairing,
};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn, Instrument};

use crate::error::ConfigResult;
use crate::state::{
    validate_roster, Agent, AgentScore, SkippedMatch, TournamentConfig, TournamentResult,
};

/// Attempts per match before it is skipped
const MATCH_ATTEMPTS: u32 = 2;

/// Stops a running tournament between matches.
///
/// Matches already in progress finish; matches not yet started are dropped
/// and the result is flagged incomplete.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

enum MatchSlot {
    Played(MatchLedger),
    Skipped(SkippedMatch),
}

/// A validated tournament, ready to run
#[derive(Debug)]
pub struct TournamentScheduler {
    agents: Vec<Agent>,
    config: TournamentConfig,
    cancel: CancelHandle,
}

impl TournamentScheduler {
    /// Validate the roster and configuration. Nothing is played yet.
    pub fn new(agents: Vec<Agent>, config: TournamentConfig) -> ConfigResult<Self> {
        config.validate()?;
        validate_roster(&agents, config.repeats)?;
        Ok(Self {
            agents,
            config,
            cancel: CancelHandle::new(),
        })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Play the tournament.
    ///
    /// Never fails: aborted matches are retried once and then skipped, and
    /// cancellation yields a result flagged `incomplete`. Dropping the
    /// returned future aborts every match still in flight.
    #[instrument(
        name = "tournament",
        skip_all,
        fields(
            agents = self.agents.len(),
            rounds = self.config.rounds_per_match,
            repeats = self.config.repeats
        )
    )]
    pub async fn run(&self) -> TournamentResult {
        // validate_roster guarantees both counts fit in u32
        let participant_count = self.agents.len() as u32;
        let repeats = self.config.repeats;
        let total = calculate_match_count(participant_count, repeats) as u32;
        info!(event = "tournament.started", matches = total, "tournament started");

        let match_config = Arc::new(self.config.match_config());
        let workers = self.config.max_concurrent_matches.min(total as usize);
        let mut slots: Vec<Option<MatchSlot>> = Vec::new();
        slots.resize_with(total as usize, || None);

        let mut in_flight = JoinSet::new();
        let mut next = 0u32;
        let mut done = 0u32;
        loop {
            while in_flight.len() < workers && next < total && !self.cancel.is_cancelled() {
                if let Some(pairing) = get_pairing_for_match(participant_count, repeats, next) {
                    let a = self.agents[pairing.a as usize].clone();
                    let b = self.agents[pairing.b as usize].clone();
                    let match_config = Arc::clone(&match_config);
                    in_flight.spawn(
                        async move {
                            let slot = play_pairing(&a, &b, &match_config, pairing).await;
                            (pairing, slot)
                        }
                        .in_current_span(),
                    );
                }
                next += 1;
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            match joined {
                Ok((pairing, slot)) => {
                    done += 1;
                    info!(
                        event = "match.completed",
                        match_index = pairing.match_index,
                        agent_a = %self.agents[pairing.a as usize].name,
                        agent_b = %self.agents[pairing.b as usize].name,
                        done,
                        total,
                        "match completed"
                    );
                    slots[pairing.match_index as usize] = Some(slot);
                }
                // The slot stays empty and is reported as skipped below
                Err(join_error) => {
                    error!(event = "match.failed", error = %join_error, "match task failed");
                }
            }
        }

        let mut standings: Vec<AgentScore> = self
            .agents
            .iter()
            .map(|agent| AgentScore {
                name: agent.name.clone(),
                disposition: agent.disposition,
                score: 0,
            })
            .collect();
        let mut ledgers = Vec::with_capacity(done as usize);
        let mut skipped = Vec::new();
        let mut not_started = 0usize;

        let schedule =
            (0..total).filter_map(|i| get_pairing_for_match(participant_count, repeats, i));
        for (pairing, slot) in schedule.zip(slots) {
            match slot {
                Some(MatchSlot::Played(ledger)) => {
                    standings[pairing.a as usize].score += ledger.total_score_a;
                    standings[pairing.b as usize].score += ledger.total_score_b;
                    ledgers.push(ledger);
                }
                Some(MatchSlot::Skipped(skip)) => skipped.push(skip),
                None if pairing.match_index < next => {
                    skipped.push(self.skipped(pairing, "match task failed".to_string()));
                }
                None => not_started += 1,
            }
        }

        let incomplete = not_started > 0;
        if incomplete {
            warn!(
                event = "tournament.cancelled",
                not_started,
                completed = ledgers.len(),
                "tournament cancelled before all matches started"
            );
        }
        info!(
            event = "tournament.finished",
            completed = ledgers.len(),
            skipped = skipped.len(),
            incomplete,
            "tournament finished"
        );

        TournamentResult {
            rounds_per_match: self.config.rounds_per_match,
            ledgers,
            skipped,
            standings,
            matches_scheduled: total,
            incomplete,
        }
    }

    fn skipped(&self, pairing: Pairing, reason: String) -> SkippedMatch {
        SkippedMatch {
            match_index: pairing.match_index,
            agent_a: self.agents[pairing.a as usize].name.clone(),
            agent_b: self.agents[pairing.b as usize].name.clone(),
            reason,
        }
    }
}

/// Validate and play a tournament in one call
pub async fn run_tournament(
    agents: Vec<Agent>,
    config: TournamentConfig,
) -> ConfigResult<TournamentResult> {
    let scheduler = TournamentScheduler::new(agents, config)?;
    Ok(scheduler.run().await)
}

/// Play one pairing, retrying once if the match aborts
async fn play_pairing(
    a: &Agent,
    b: &Agent,
    config: &MatchConfig,
    pairing: Pairing,
) -> MatchSlot {
    let seat_a = Contestant::new(&a.name, a.decision.as_ref());
    let seat_b = Contestant::new(&b.name, b.decision.as_ref());

    let mut attempt = 1;
    loop {
        match run_match(&seat_a, &seat_b, config, pairing.match_index).await {
            Ok(mut ledger) => {
                ledger.repeat = pairing.repeat;
                return MatchSlot::Played(ledger);
            }
            Err(aborted) if attempt < MATCH_ATTEMPTS => {
                warn!(
                    event = "match.retry",
                    match_index = pairing.match_index,
                    attempt,
                    error = %aborted,
                    "match aborted, retrying"
                );
                attempt += 1;
            }
            Err(aborted) => {
                error!(
                    event = "match.skipped",
                    match_index = pairing.match_index,
                    agent_a = %a.name,
                    agent_b = %b.name,
                    error = %aborted,
                    "match skipped after retry"
                );
                return MatchSlot::Skipped(SkippedMatch {
                    match_index: pairing.match_index,
                    agent_a: a.name.clone(),
                    agent_b: b.name.clone(),
                    reason: aborted.to_string(),
                });
            }
        }
    }
}
