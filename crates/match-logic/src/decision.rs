//! Decision collaborator interface
//!
//! The match engine never knows how a move is chosen. Hand-coded rules,
//! closures and remote inference services all sit behind [`Decision`].

use std::str::FromStr;

use async_trait::async_trait;

use crate::error::DecisionError;
use crate::strategy::Move;

/// One agent's view of the match so far.
///
/// Holds only what happened on the board: both move histories and both
/// running scores. The opponent's name, disposition and internals are never
/// exposed.
#[derive(Clone, Copy, Debug)]
pub struct MatchView<'a> {
    /// Index of the match within its tournament
    pub match_index: u32,
    pub own_moves: &'a [Move],
    pub opponent_moves: &'a [Move],
    pub own_score: u64,
    pub opponent_score: u64,
}

impl<'a> MatchView<'a> {
    /// Number of rounds already played
    pub fn rounds_played(&self) -> usize {
        self.own_moves.len()
    }

    pub fn is_opening(&self) -> bool {
        self.own_moves.is_empty()
    }

    pub fn last_own_move(&self) -> Option<Move> {
        self.own_moves.last().copied()
    }

    pub fn last_opponent_move(&self) -> Option<Move> {
        self.opponent_moves.last().copied()
    }

    pub fn opponent_defections(&self) -> usize {
        self.opponent_moves.iter().filter(|m| **m == Move::Defect).count()
    }

    pub fn own_defections(&self) -> usize {
        self.own_moves.iter().filter(|m| **m == Move::Defect).count()
    }
}

/// Maps an agent's match history to its next move.
///
/// `round` is 1-based. Implementations must not assume they are called
/// exactly once per round: the engine may retry a whole match.
#[async_trait]
pub trait Decision: Send + Sync {
    async fn decide(
        &self,
        agent: &str,
        view: &MatchView<'_>,
        round: u32,
    ) -> Result<Move, DecisionError>;
}

/// Decision backed by a plain synchronous function
pub struct FnDecision<F> {
    f: F,
}

/// Wrap a closure `(view, round) -> Move` as a [`Decision`]
pub fn from_fn<F>(f: F) -> FnDecision<F>
where
    F: Fn(&MatchView<'_>, u32) -> Move + Send + Sync,
{
    FnDecision { f }
}

#[async_trait]
impl<F> Decision for FnDecision<F>
where
    F: Fn(&MatchView<'_>, u32) -> Move + Send + Sync,
{
    async fn decide(
        &self,
        _agent: &str,
        view: &MatchView<'_>,
        round: u32,
    ) -> Result<Move, DecisionError> {
        Ok((self.f)(view, round))
    }
}

/// Parse a free-form reply into a move.
///
/// Accepts a bare word (`cooperate`, `Defect`, `c`, `betray`, ...) or a JSON
/// object carrying an `action` field, optionally wrapped in a markdown code
/// fence or surrounded by prose.
pub fn parse_choice(raw: &str) -> Result<Move, DecisionError> {
    let text = strip_code_fence(raw.trim());

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            let value: serde_json::Value = serde_json::from_str(&text[start..=end])
                .map_err(|_| DecisionError::malformed(raw))?;
            let action = value
                .get("action")
                .and_then(|a| a.as_str())
                .ok_or_else(|| DecisionError::malformed(raw))?;
            return parse_word(action).ok_or_else(|| DecisionError::malformed(raw));
        }
    }

    parse_word(text).ok_or_else(|| DecisionError::malformed(raw))
}

fn strip_code_fence(text: &str) -> &str {
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn parse_word(word: &str) -> Option<Move> {
    let word = word
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '!')
        .to_ascii_lowercase();

    match word.as_str() {
        "cooperate" | "cooperation" | "c" => return Some(Move::Cooperate),
        "defect" | "defection" | "betray" | "d" => return Some(Move::Defect),
        _ => {}
    }

    let cooperates = word.contains("cooperate");
    let defects = word.contains("defect") || word.contains("betray");
    match (cooperates, defects) {
        (true, false) => Some(Move::Cooperate),
        (false, true) => Some(Move::Defect),
        _ => None,
    }
}

impl FromStr for Move {
    type Err = DecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view<'a>(own: &'a [Move], opp: &'a [Move]) -> MatchView<'a> {
        MatchView {
            match_index: 0,
            own_moves: own,
            opponent_moves: opp,
            own_score: 0,
            opponent_score: 0,
        }
    }

    #[test]
    fn test_view_accessors() {
        let own = [Move::Cooperate, Move::Defect];
        let opp = [Move::Defect, Move::Defect];
        let v = view(&own, &opp);

        assert_eq!(v.rounds_played(), 2);
        assert!(!v.is_opening());
        assert_eq!(v.last_own_move(), Some(Move::Defect));
        assert_eq!(v.last_opponent_move(), Some(Move::Defect));
        assert_eq!(v.opponent_defections(), 2);
        assert_eq!(v.own_defections(), 1);
    }

    #[test]
    fn test_opening_view() {
        let v = view(&[], &[]);
        assert!(v.is_opening());
        assert_eq!(v.last_opponent_move(), None);
    }

    #[tokio::test]
    async fn test_from_fn_decision() {
        let mirror = from_fn(|v, _round| v.last_opponent_move().unwrap_or(Move::Cooperate));
        let opp = [Move::Defect];
        let own = [Move::Cooperate];

        let m = mirror.decide("mirror", &view(&own, &opp), 2).await;
        assert_eq!(m, Ok(Move::Defect));
    }

    #[test]
    fn test_parse_bare_words() {
        assert_eq!(parse_choice("cooperate"), Ok(Move::Cooperate));
        assert_eq!(parse_choice("  DEFECT \n"), Ok(Move::Defect));
        assert_eq!(parse_choice("C"), Ok(Move::Cooperate));
        assert_eq!(parse_choice("betray"), Ok(Move::Defect));
        assert_eq!(parse_choice("\"Cooperate.\""), Ok(Move::Cooperate));
    }

    #[test]
    fn test_parse_json_reply() {
        let reply = r#"{"thought": "they retaliated twice", "action": "Defect"}"#;
        assert_eq!(parse_choice(reply), Ok(Move::Defect));
    }

    #[test]
    fn test_parse_fenced_json_reply() {
        let reply = "```json\n{\"thought\": \"build trust\", \"action\": \"cooperate\"}\n```";
        assert_eq!(parse_choice(reply), Ok(Move::Cooperate));
    }

    #[test]
    fn test_parse_json_with_surrounding_prose() {
        let reply = "Here is my answer: {\"action\": \"defect\"} good luck";
        assert_eq!(parse_choice(reply), Ok(Move::Defect));
    }

    #[test]
    fn test_parse_sentence_containing_one_choice() {
        assert_eq!(parse_choice("I will cooperate this round"), Ok(Move::Cooperate));
    }

    #[test]
    fn test_parse_rejects_ambiguous_and_garbage() {
        assert!(matches!(
            parse_choice("cooperate or defect?"),
            Err(DecisionError::Malformed { .. })
        ));
        assert!(matches!(parse_choice("maybe"), Err(DecisionError::Malformed { .. })));
        assert!(matches!(parse_choice(""), Err(DecisionError::Malformed { .. })));
    }

    #[test]
    fn test_parse_json_missing_action() {
        let err = parse_choice(r#"{"thought": "hmm"}"#).unwrap_err();
        assert_eq!(err, DecisionError::malformed(r#"{"thought": "hmm"}"#));
    }

    #[test]
    fn test_move_from_str() {
        let m: Move = "defect".parse().unwrap();
        assert_eq!(m, Move::Defect);
        assert!("yes".parse::<Move>().is_err());
    }
}
