use std::collections::HashMap;

use skillratings::{
    glicko2::{glicko2_rating_period, Glicko2Config, Glicko2Rating},
    Outcomes
};
use tracing::warn;

use crate::{
    identity::identity::IdentityId,
    model::{
        constants::{DEFAULT_RATING, GLICKO_SCALE, TAU},
        domain::RatingState,
        seeding::RatingSeed
    }
};

impl From<RatingState> for Glicko2Rating {
    fn from(state: RatingState) -> Glicko2Rating {
        Glicko2Rating {
            rating: state.rating,
            deviation: state.deviation,
            volatility: state.volatility
        }
    }
}

impl From<Glicko2Rating> for RatingState {
    fn from(rating: Glicko2Rating) -> RatingState {
        RatingState {
            rating: rating.rating,
            deviation: rating.deviation,
            volatility: rating.volatility
        }
    }
}

/// Owns every player's rating state and applies tournament batches.
///
/// All matches of one tournament are treated as one Glicko-2 rating period
/// played against the ratings as they stood before the tournament: an
/// offline bracket is concurrent evidence, not a sequential chain, so no
/// player's mid-tournament result feeds back into the same event.
pub struct RatingEngine {
    config: Glicko2Config,
    ratings: HashMap<IdentityId, RatingState>
}

impl Default for RatingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RatingEngine {
    pub fn new() -> RatingEngine {
        RatingEngine {
            config: Glicko2Config {
                tau: TAU,
                ..Glicko2Config::new()
            },
            ratings: HashMap::new()
        }
    }

    pub fn get(&self, identity_id: IdentityId) -> Option<&RatingState> {
        self.ratings.get(&identity_id)
    }

    pub fn contains(&self, identity_id: IdentityId) -> bool {
        self.ratings.contains_key(&identity_id)
    }

    /// Creates the rating state for a first-seen player from the already
    /// evaluated seeding decision. Seeding happens exactly once: calling
    /// this again for a known player returns the existing state untouched.
    pub fn get_or_create(&mut self, identity_id: IdentityId, seed: &RatingSeed) -> RatingState {
        *self.ratings.entry(identity_id).or_insert(RatingState {
            rating: seed.rating,
            deviation: seed.deviation,
            volatility: seed.volatility
        })
    }

    /// Commits one tournament's matches atomically. Every update is
    /// computed against the same pre-tournament snapshot; a participant
    /// without rating state voids that single match, not the batch.
    pub fn apply_tournament_batch(&mut self, tournament_id: u64, matches: &[(IdentityId, IdentityId, bool)]) {
        let mut snapshot: HashMap<IdentityId, RatingState> = HashMap::new();
        let mut valid: Vec<&(IdentityId, IdentityId, bool)> = Vec::with_capacity(matches.len());

        for entry in matches {
            let (a, b, _) = entry;
            match (self.ratings.get(a), self.ratings.get(b)) {
                (Some(rating_a), Some(rating_b)) => {
                    snapshot.entry(*a).or_insert(*rating_a);
                    snapshot.entry(*b).or_insert(*rating_b);
                    valid.push(entry);
                }
                _ => {
                    warn!(
                        tournament_id,
                        player_a = a,
                        player_b = b,
                        "match references an unseeded player, skipping"
                    );
                }
            }
        }

        let mut results: HashMap<IdentityId, Vec<(Glicko2Rating, Outcomes)>> = HashMap::new();
        for (a, b, a_won) in valid {
            let outcome_a = if *a_won { Outcomes::WIN } else { Outcomes::LOSS };
            let outcome_b = if *a_won { Outcomes::LOSS } else { Outcomes::WIN };

            results.entry(*a).or_default().push((snapshot[b].into(), outcome_a));
            results.entry(*b).or_default().push((snapshot[a].into(), outcome_b));
        }

        for (player_id, player_results) in results {
            let pre = snapshot[&player_id];
            let post = glicko2_rating_period(&pre.into(), &player_results, &self.config);
            self.ratings.insert(player_id, post.into());
        }
    }

    /// Expected score for the first player, from the same rating scale the
    /// updater works on. Used as the exported pre-match win probability.
    pub fn win_probability(a: &RatingState, b: &RatingState) -> f64 {
        let mu_a = (a.rating - DEFAULT_RATING) / GLICKO_SCALE;
        let mu_b = (b.rating - DEFAULT_RATING) / GLICKO_SCALE;
        let phi_a = a.deviation / GLICKO_SCALE;
        let phi_b = b.deviation / GLICKO_SCALE;

        let g = 1.0 / (1.0 + 3.0 * (phi_a * phi_a + phi_b * phi_b) / (std::f64::consts::PI * std::f64::consts::PI)).sqrt();
        1.0 / (1.0 + (-g * (mu_a - mu_b)).exp())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use skillratings::{
        glicko2::{glicko2_rating_period, Glicko2Config, Glicko2Rating},
        Outcomes
    };

    use crate::{
        model::{
            constants::{DEFAULT_DEVIATION, DEFAULT_RATING, DEFAULT_VOLATILITY, TAU},
            rating_engine::RatingEngine,
            seeding::RatingSeed
        },
        utils::test_utils::generate_rating
    };

    fn default_seed() -> RatingSeed {
        RatingSeed {
            rating: DEFAULT_RATING,
            deviation: DEFAULT_DEVIATION,
            volatility: DEFAULT_VOLATILITY
        }
    }

    #[test]
    fn test_seeding_is_applied_exactly_once() {
        let mut engine = RatingEngine::new();
        engine.get_or_create(
            1,
            &RatingSeed {
                rating: 1250.0,
                deviation: 150.0,
                volatility: DEFAULT_VOLATILITY
            }
        );

        // A later (wrong) second seed attempt must not revisit the decision
        let state = engine.get_or_create(1, &default_seed());
        assert_abs_diff_eq!(state.rating, 1250.0);
        assert_abs_diff_eq!(state.deviation, 150.0);
    }

    #[test]
    fn test_winner_gains_loser_drops() {
        let mut engine = RatingEngine::new();
        engine.get_or_create(1, &default_seed());
        engine.get_or_create(2, &default_seed());

        engine.apply_tournament_batch(10, &[(1, 2, true)]);

        assert!(engine.get(1).unwrap().rating > DEFAULT_RATING);
        assert!(engine.get(2).unwrap().rating < DEFAULT_RATING);
    }

    #[test]
    fn test_batch_uses_pre_tournament_snapshot() {
        // B loses to A, then C beats B in the same tournament. C's update
        // must be computed against B's pre-tournament rating, not the one
        // B holds after losing to A.
        let mut engine = RatingEngine::new();
        let a = generate_rating(1700.0, 120.0, DEFAULT_VOLATILITY);
        let b = generate_rating(1500.0, 180.0, DEFAULT_VOLATILITY);
        let c = generate_rating(1400.0, 250.0, DEFAULT_VOLATILITY);

        engine.get_or_create(1, &RatingSeed { rating: a.rating, deviation: a.deviation, volatility: a.volatility });
        engine.get_or_create(2, &RatingSeed { rating: b.rating, deviation: b.deviation, volatility: b.volatility });
        engine.get_or_create(3, &RatingSeed { rating: c.rating, deviation: c.deviation, volatility: c.volatility });

        engine.apply_tournament_batch(10, &[(1, 2, true), (3, 2, true)]);

        let config = Glicko2Config {
            tau: TAU,
            ..Glicko2Config::new()
        };
        let expected_c = glicko2_rating_period(
            &Glicko2Rating {
                rating: c.rating,
                deviation: c.deviation,
                volatility: c.volatility
            },
            &[(
                Glicko2Rating {
                    rating: b.rating,
                    deviation: b.deviation,
                    volatility: b.volatility
                },
                Outcomes::WIN
            )],
            &config
        );

        assert_abs_diff_eq!(engine.get(3).unwrap().rating, expected_c.rating, epsilon = 1e-9);
        assert_abs_diff_eq!(engine.get(3).unwrap().deviation, expected_c.deviation, epsilon = 1e-9);
    }

    #[test]
    fn test_unseeded_player_voids_single_match_only() {
        let mut engine = RatingEngine::new();
        engine.get_or_create(1, &default_seed());
        engine.get_or_create(2, &default_seed());

        // Player 99 was never seeded; only the match touching it is skipped
        engine.apply_tournament_batch(10, &[(1, 99, true), (1, 2, true)]);

        assert!(engine.get(1).unwrap().rating > DEFAULT_RATING);
        assert!(engine.get(2).unwrap().rating < DEFAULT_RATING);
        assert!(engine.get(99).is_none());
    }

    #[test]
    fn test_win_probability_even_matchup() {
        let a = generate_rating(1500.0, 200.0, DEFAULT_VOLATILITY);
        let b = generate_rating(1500.0, 200.0, DEFAULT_VOLATILITY);

        assert_abs_diff_eq!(RatingEngine::win_probability(&a, &b), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_win_probability_favors_higher_rating() {
        let strong = generate_rating(1900.0, 80.0, DEFAULT_VOLATILITY);
        let weak = generate_rating(1300.0, 80.0, DEFAULT_VOLATILITY);

        let p = RatingEngine::win_probability(&strong, &weak);
        assert!(p > 0.9, "expected a heavy favorite, got {p}");
        assert_abs_diff_eq!(
            p + RatingEngine::win_probability(&weak, &strong),
            1.0,
            epsilon = 1e-12
        );
    }
}
