//! Deterministic pairing generation for tournament matches
//!
//! Every unordered pair of distinct participants, in colexicographic order
//! of participant index: (0,1), (0,2), (1,2), (0,3), ... Each pair is played
//! `repeats` times back to back, so match indices are dense and a given
//! index always resolves to the same pairing.

use serde::{Deserialize, Serialize};

/// One scheduled match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    /// Dense match index in [0, match count)
    pub match_index: u32,
    /// Participant index of seat A (always < b)
    pub a: u32,
    /// Participant index of seat B
    pub b: u32,
    /// 0-based repetition of this pair
    pub repeat: u32,
}

/// Number of unordered pairs, C(n,2)
pub fn pair_count(participant_count: u32) -> u64 {
    let n = participant_count as u64;
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}

/// Total number of matches, computed in O(1)
pub fn calculate_match_count(participant_count: u32, repeats: u32) -> u64 {
    pair_count(participant_count) * repeats as u64
}

/// Generate every match of a round-robin tournament, in match-index order
///
/// # Returns
/// Empty when fewer than 2 participants, zero repeats, or more matches than
/// a `u32` index can address.
pub fn generate_all_pairings(participant_count: u32, repeats: u32) -> Vec<Pairing> {
    let total = calculate_match_count(participant_count, repeats);
    if total == 0 || total > u32::MAX as u64 {
        return Vec::new();
    }

    let mut pairings = Vec::with_capacity(total as usize);
    let mut match_index = 0u32;
    for b in 1..participant_count {
        for a in 0..b {
            for repeat in 0..repeats {
                pairings.push(Pairing {
                    match_index,
                    a,
                    b,
                    repeat,
                });
                match_index += 1;
            }
        }
    }
    pairings
}

/// Resolve a single match index to its pairing without enumerating the schedule
pub fn get_pairing_for_match(
    participant_count: u32,
    repeats: u32,
    match_index: u32,
) -> Option<Pairing> {
    let total = calculate_match_count(participant_count, repeats);
    if match_index as u64 >= total {
        return None;
    }

    let rank = match_index as u64 / repeats as u64;
    let repeat = match_index % repeats;
    let (a, b) = unrank_pair(rank);
    Some(Pairing {
        match_index,
        a,
        b,
        repeat,
    })
}

/// Colexicographic combination unranking: rank → (a, b) with a < b.
///
/// rank = C(b,2) + a = b*(b−1)/2 + a
fn unrank_pair(rank: u64) -> (u32, u32) {
    // Estimate b via integer floor(sqrt(1 + 8·rank))
    let val = 1u64 + 8 * rank;
    let mut s = val;
    let mut t = (s + 1) / 2;
    while t < s {
        s = t;
        t = (s + val / s) / 2;
    }
    // s = floor(sqrt(val))
    let mut b = (1 + s) / 2;

    // Correct estimate
    while b > 0 && b * (b - 1) / 2 > rank {
        b -= 1;
    }
    while (b + 1) * b / 2 <= rank {
        b += 1;
    }

    let a = rank - b * (b - 1) / 2;
    (a as u32, b as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_empty_tournament() {
        assert!(generate_all_pairings(0, 3).is_empty());
        assert!(generate_all_pairings(1, 3).is_empty());
        assert!(generate_all_pairings(5, 0).is_empty());
        assert_eq!(get_pairing_for_match(1, 3, 0), None);
    }

    #[test]
    fn test_two_players() {
        let pairings = generate_all_pairings(2, 5);
        assert_eq!(pairings.len(), 5);
        for (i, p) in pairings.iter().enumerate() {
            assert_eq!((p.a, p.b), (0, 1));
            assert_eq!(p.repeat, i as u32);
            assert_eq!(p.match_index, i as u32);
        }
    }

    #[test]
    fn test_colex_order() {
        let pairs: Vec<(u32, u32)> = generate_all_pairings(4, 1)
            .iter()
            .map(|p| (p.a, p.b))
            .collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2), (0, 3), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_every_pair_exactly_once_per_repeat() {
        let n = 9;
        let repeats = 3;
        let pairings = generate_all_pairings(n, repeats);
        assert_eq!(pairings.len() as u64, calculate_match_count(n, repeats));

        let unique: HashSet<(u32, u32, u32)> =
            pairings.iter().map(|p| (p.a, p.b, p.repeat)).collect();
        assert_eq!(unique.len(), pairings.len());
        assert!(pairings.iter().all(|p| p.a < p.b && p.b < n));
    }

    #[test]
    fn test_each_player_meets_everyone() {
        let n = 6u32;
        let pairings = generate_all_pairings(n, 2);

        let mut counts = vec![0u32; n as usize];
        for p in &pairings {
            counts[p.a as usize] += 1;
            counts[p.b as usize] += 1;
        }
        for (i, count) in counts.iter().enumerate() {
            assert_eq!(*count, (n - 1) * 2, "player {} played {} matches", i, count);
        }
    }

    #[test]
    fn test_match_count_formula() {
        assert_eq!(calculate_match_count(5, 1), 10);
        assert_eq!(calculate_match_count(5, 3), 30);
        assert_eq!(calculate_match_count(100, 2), 9900);
        assert_eq!(calculate_match_count(1, 10), 0);
    }

    #[test]
    fn test_out_of_range_index() {
        assert_eq!(get_pairing_for_match(4, 2, 12), None);
        assert!(get_pairing_for_match(4, 2, 11).is_some());
    }

    #[test]
    fn test_unrank_pair_small() {
        assert_eq!(unrank_pair(0), (0, 1));
        assert_eq!(unrank_pair(1), (0, 2));
        assert_eq!(unrank_pair(2), (1, 2));
        assert_eq!(unrank_pair(3), (0, 3));
        assert_eq!(unrank_pair(5), (2, 3));
    }

    proptest! {
        #[test]
        fn prop_lookup_matches_generation(n in 2u32..40, repeats in 1u32..5) {
            let pairings = generate_all_pairings(n, repeats);
            for p in &pairings {
                prop_assert_eq!(get_pairing_for_match(n, repeats, p.match_index), Some(*p));
            }
        }

        #[test]
        fn prop_unrank_large(rank in 0u64..5_000_000_000) {
            let (a, b) = unrank_pair(rank);
            prop_assert!(a < b);
            let (a, b) = (a as u64, b as u64);
            prop_assert_eq!(b * (b - 1) / 2 + a, rank);
        }
    }
}
