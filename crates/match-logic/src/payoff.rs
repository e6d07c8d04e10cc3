//! Payoff matrix for the Prisoner's Dilemma

use serde::{Deserialize, Serialize};

use crate::error::InvalidPayoff;
use crate::strategy::Move;

/// Payoff values for the four outcomes of a round.
///
/// The classic table is the default: R=3, S=0, T=5, P=1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffMatrix {
    /// Both cooperate
    pub reward: u32,
    /// Cooperated against a defector
    pub sucker: u32,
    /// Defected against a cooperator
    pub temptation: u32,
    /// Both defect
    pub punishment: u32,
}

impl Default for PayoffMatrix {
    fn default() -> Self {
        Self {
            reward: 3,
            sucker: 0,
            temptation: 5,
            punishment: 1,
        }
    }
}

impl PayoffMatrix {
    /// Score one round. Returns (score_a, score_b)
    pub fn score(&self, a: Move, b: Move) -> (u32, u32) {
        match (a, b) {
            (Move::Cooperate, Move::Cooperate) => (self.reward, self.reward),
            (Move::Cooperate, Move::Defect) => (self.sucker, self.temptation),
            (Move::Defect, Move::Cooperate) => (self.temptation, self.sucker),
            (Move::Defect, Move::Defect) => (self.punishment, self.punishment),
        }
    }

    /// Check the dilemma ordering T > R > P > S
    pub fn validate(&self) -> Result<(), InvalidPayoff> {
        if self.temptation > self.reward
            && self.reward > self.punishment
            && self.punishment > self.sucker
        {
            Ok(())
        } else {
            Err(InvalidPayoff {
                reward: self.reward,
                sucker: self.sucker,
                temptation: self.temptation,
                punishment: self.punishment,
            })
        }
    }
}

/// Classic payoff table. Returns (score_a, score_b)
pub fn payoff(a: Move, b: Move) -> (u32, u32) {
    PayoffMatrix::default().score(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_move() -> impl Strategy<Value = Move> {
        prop_oneof![Just(Move::Cooperate), Just(Move::Defect)]
    }

    #[test]
    fn test_payoff_matrix() {
        assert_eq!(payoff(Move::Cooperate, Move::Cooperate), (3, 3));
        assert_eq!(payoff(Move::Cooperate, Move::Defect), (0, 5));
        assert_eq!(payoff(Move::Defect, Move::Cooperate), (5, 0));
        assert_eq!(payoff(Move::Defect, Move::Defect), (1, 1));
    }

    #[test]
    fn test_default_is_valid_dilemma() {
        assert!(PayoffMatrix::default().validate().is_ok());
    }

    #[test]
    fn test_mutual_cooperation_beats_mutual_defection() {
        let (cc, _) = payoff(Move::Cooperate, Move::Cooperate);
        let (dd, _) = payoff(Move::Defect, Move::Defect);
        assert!(cc > dd);
    }

    #[test]
    fn test_defection_dominates_for_defector() {
        let (defector, sucker) = payoff(Move::Defect, Move::Cooperate);
        assert!(defector > sucker);
    }

    #[test]
    fn test_custom_matrix() {
        let m = PayoffMatrix {
            reward: 4,
            sucker: 0,
            temptation: 7,
            punishment: 2,
        };
        assert!(m.validate().is_ok());
        assert_eq!(m.score(Move::Defect, Move::Cooperate), (7, 0));
        assert_eq!(m.score(Move::Defect, Move::Defect), (2, 2));
    }

    #[test]
    fn test_rejects_non_dilemma() {
        // Defection is not tempting
        let m = PayoffMatrix {
            reward: 5,
            sucker: 0,
            temptation: 3,
            punishment: 1,
        };
        assert!(m.validate().is_err());

        // Mutual defection as good as cooperation
        let m = PayoffMatrix {
            reward: 3,
            sucker: 0,
            temptation: 5,
            punishment: 3,
        };
        let err = m.validate().unwrap_err();
        assert_eq!(err.punishment, 3);
    }

    proptest! {
        #[test]
        fn prop_payoff_swap_symmetry(a in any_move(), b in any_move()) {
            let (x, y) = payoff(a, b);
            prop_assert_eq!(payoff(b, a), (y, x));
        }

        #[test]
        fn prop_payoff_sum_in_table(a in any_move(), b in any_move()) {
            let (x, y) = payoff(a, b);
            prop_assert!([6u32, 5, 2].contains(&(x + y)));
        }

        #[test]
        fn prop_valid_matrix_symmetric(
            s in 0u32..10,
            gap_p in 1u32..10,
            gap_r in 1u32..10,
            gap_t in 1u32..10,
            a in any_move(),
            b in any_move(),
        ) {
            let m = PayoffMatrix {
                sucker: s,
                punishment: s + gap_p,
                reward: s + gap_p + gap_r,
                temptation: s + gap_p + gap_r + gap_t,
            };
            prop_assert!(m.validate().is_ok());
            let (x, y) = m.score(a, b);
            prop_assert_eq!(m.score(b, a), (y, x));
        }
    }
}
