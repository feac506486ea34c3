use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    identity::{identity::Identity, registry::IdentityRegistry},
    model::{
        constants::{
            DEFAULT_DEVIATION, DEFAULT_RATING, DEFAULT_VOLATILITY, ENTRY_SERIES_DEVIATION, ENTRY_SERIES_RATING,
            SEED_DEVIATION_FLOOR
        },
        domain::HistoryEntry,
        history::HistoryTracker,
        structures::platform::Platform
    },
    source::tables::CustomSeedRow
};

/// The rating state a first-seen player starts from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSeed {
    pub rating: f64,
    pub deviation: f64,
    pub volatility: f64
}

impl RatingSeed {
    fn default_seed() -> RatingSeed {
        RatingSeed {
            rating: DEFAULT_RATING,
            deviation: DEFAULT_DEVIATION,
            volatility: DEFAULT_VOLATILITY
        }
    }
}

/// The seeding policy is an ordered rule list, evaluated exactly once per
/// identity at first observation. The first rule that yields a seed wins;
/// `Default` always yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedingRule {
    /// Curated seed table for players ranked in the predecessor system.
    CustomTable,
    /// Carryover from the sibling namespace's finalized history.
    SiblingCarryover,
    /// Entry-level tournament series participants start above the default.
    EntryLevelSeries,
    Default
}

pub const SEEDING_PRECEDENCE: &[SeedingRule] = &[
    SeedingRule::CustomTable,
    SeedingRule::SiblingCarryover,
    SeedingRule::EntryLevelSeries,
    SeedingRule::Default
];

pub struct SeedingContext<'a> {
    pub custom_seeds: &'a [CustomSeedRow],
    /// Finalized sibling-namespace history; `None` for the authoritative
    /// classic pass (the relationship is strictly one-directional).
    pub sibling: Option<&'a SiblingHistory>,
    pub entry_series_markers: &'a [&'a str]
}

/// Everything known about the identity at the moment of first observation.
pub struct SeedingInputs<'a> {
    pub identity: &'a Identity,
    /// Date of the identity's first event in this namespace.
    pub first_event_date: DateTime<Utc>,
    /// URLs of every tournament the identity participates in.
    pub event_urls: &'a [String]
}

pub fn seed_for(inputs: &SeedingInputs, ctx: &SeedingContext) -> (SeedingRule, RatingSeed) {
    for rule in SEEDING_PRECEDENCE {
        if let Some(seed) = evaluate(*rule, inputs, ctx) {
            return (*rule, seed);
        }
    }

    // SEEDING_PRECEDENCE ends in Default, which always yields
    unreachable!("seeding precedence must terminate with the default rule")
}

fn evaluate(rule: SeedingRule, inputs: &SeedingInputs, ctx: &SeedingContext) -> Option<RatingSeed> {
    match rule {
        SeedingRule::CustomTable => {
            let row = ctx.custom_seeds.iter().find(|row| anchors_match(row, inputs.identity))?;

            Some(RatingSeed {
                rating: row.rating,
                deviation: row.deviation.max(SEED_DEVIATION_FLOOR),
                volatility: DEFAULT_VOLATILITY
            })
        }
        SeedingRule::SiblingCarryover => {
            let snapshot = ctx
                .sibling?
                .snapshot_before(inputs.identity, inputs.first_event_date)?;

            Some(RatingSeed {
                rating: snapshot.rating,
                // Carried estimates re-enter at provisional confidence
                deviation: snapshot.deviation.max(SEED_DEVIATION_FLOOR),
                volatility: snapshot.volatility
            })
        }
        SeedingRule::EntryLevelSeries => {
            let played_entry_series = inputs.event_urls.iter().any(|url| {
                let url = url.to_lowercase();
                ctx.entry_series_markers.iter().any(|marker| url.contains(marker))
            });

            played_entry_series.then(|| RatingSeed {
                rating: ENTRY_SERIES_RATING,
                deviation: ENTRY_SERIES_DEVIATION,
                volatility: DEFAULT_VOLATILITY
            })
        }
        SeedingRule::Default => Some(RatingSeed::default_seed())
    }
}

fn anchors_match(row: &CustomSeedRow, identity: &Identity) -> bool {
    let bracket_hit = row
        .bracket_account_id
        .is_some_and(|anchor| identity.account_ids(Platform::Bracket).any(|id| id == anchor));
    let arena_hit = row
        .arena_user_id
        .is_some_and(|anchor| identity.account_ids(Platform::Arena).any(|id| id == anchor));

    bracket_hit || arena_hit
}

/// Read-only view over the classic pass's finalized histories, keyed by the
/// platform accounts the two namespaces share.
pub struct SiblingHistory {
    by_bracket_account: HashMap<u64, Vec<HistoryEntry>>,
    by_arena_user: HashMap<u64, Vec<HistoryEntry>>
}

impl SiblingHistory {
    pub fn from_finalized(registry: &IdentityRegistry, histories: &HistoryTracker) -> SiblingHistory {
        let mut by_bracket_account = HashMap::new();
        let mut by_arena_user = HashMap::new();

        for identity in registry.iter() {
            let Some(history) = histories.history(identity.id) else {
                continue;
            };

            for account_id in identity.account_ids(Platform::Bracket) {
                by_bracket_account.insert(account_id, history.to_vec());
            }
            for account_id in identity.account_ids(Platform::Arena) {
                by_arena_user.insert(account_id, history.to_vec());
            }
        }

        SiblingHistory {
            by_bracket_account,
            by_arena_user
        }
    }

    /// The most recent sibling snapshot strictly before `date`, across all
    /// of the identity's linked accounts.
    pub fn snapshot_before(&self, identity: &Identity, date: DateTime<Utc>) -> Option<&HistoryEntry> {
        let bracket_entries = identity
            .account_ids(Platform::Bracket)
            .filter_map(|id| self.by_bracket_account.get(&id))
            .flatten();
        let arena_entries = identity
            .account_ids(Platform::Arena)
            .filter_map(|id| self.by_arena_user.get(&id))
            .flatten();

        bracket_entries
            .chain(arena_entries)
            .filter(|entry| entry.tournament.date < date)
            .max_by_key(|entry| entry.tournament.date)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use approx::assert_abs_diff_eq;

    use crate::{
        model::{
            constants::{
                DEFAULT_DEVIATION, DEFAULT_RATING, DEFAULT_VOLATILITY, ENTRY_SERIES_RATING, SEED_DEVIATION_FLOOR
            },
            domain::{HistoryEntry, TournamentRef},
            seeding::{seed_for, RatingSeed, SeedingContext, SeedingInputs, SeedingRule, SiblingHistory},
            structures::platform::Platform
        },
        source::tables::CustomSeedRow,
        utils::test_utils::{date, generate_identity}
    };

    fn history_entry(date_str: &str, rating: f64, deviation: f64) -> HistoryEntry {
        HistoryEntry {
            tournament: TournamentRef {
                id: 1,
                platform: Platform::Bracket,
                date: date(date_str)
            },
            rating,
            deviation,
            volatility: DEFAULT_VOLATILITY,
            rank: 0
        }
    }

    fn sibling_with(account_id: u64, entries: Vec<HistoryEntry>) -> SiblingHistory {
        SiblingHistory {
            by_bracket_account: HashMap::from([(account_id, entries)]),
            by_arena_user: HashMap::new()
        }
    }

    #[test]
    fn test_custom_table_takes_precedence() {
        let identity = generate_identity(0, "veteran", &[111]);
        let seeds = vec![CustomSeedRow {
            display_name: "veteran".to_string(),
            rating: 1800.0,
            deviation: 90.0,
            bracket_account_id: Some(111),
            arena_user_id: None
        }];
        let sibling = sibling_with(111, vec![history_entry("2018-01-01T00:00:00Z", 1600.0, 120.0)]);

        let ctx = SeedingContext {
            custom_seeds: &seeds,
            sibling: Some(&sibling),
            entry_series_markers: &["rookie"]
        };
        let inputs = SeedingInputs {
            identity: &identity,
            first_event_date: date("2019-01-01T00:00:00Z"),
            event_urls: &["https://example.org/rookie-cup".to_string()]
        };

        let (rule, seed) = seed_for(&inputs, &ctx);
        assert_eq!(rule, SeedingRule::CustomTable);
        assert_abs_diff_eq!(seed.rating, 1800.0);
        // Curated deviations below the floor are widened
        assert_abs_diff_eq!(seed.deviation, SEED_DEVIATION_FLOOR);
    }

    #[test]
    fn test_carryover_uses_most_recent_prior_snapshot() {
        let identity = generate_identity(0, "crossover", &[111]);
        let sibling = sibling_with(
            111,
            vec![
                history_entry("2017-06-01T00:00:00Z", 1550.0, 170.0),
                history_entry("2018-03-01T00:00:00Z", 1620.0, 110.0),
                history_entry("2019-06-01T00:00:00Z", 1700.0, 90.0),
            ]
        );

        let ctx = SeedingContext {
            custom_seeds: &[],
            sibling: Some(&sibling),
            entry_series_markers: &[]
        };
        let inputs = SeedingInputs {
            identity: &identity,
            first_event_date: date("2018-11-01T00:00:00Z"),
            event_urls: &[]
        };

        let (rule, seed) = seed_for(&inputs, &ctx);
        assert_eq!(rule, SeedingRule::SiblingCarryover);
        // 2018-03 entry: latest one before the first sequel event
        assert_abs_diff_eq!(seed.rating, 1620.0);
        assert_abs_diff_eq!(seed.deviation, SEED_DEVIATION_FLOOR);
    }

    #[test]
    fn test_carryover_requires_prior_history() {
        let identity = generate_identity(0, "newcomer", &[111]);
        let sibling = sibling_with(111, vec![history_entry("2019-06-01T00:00:00Z", 1700.0, 90.0)]);

        let ctx = SeedingContext {
            custom_seeds: &[],
            sibling: Some(&sibling),
            entry_series_markers: &[]
        };
        let inputs = SeedingInputs {
            identity: &identity,
            first_event_date: date("2018-11-01T00:00:00Z"),
            event_urls: &[]
        };

        let (rule, _) = seed_for(&inputs, &ctx);
        assert_eq!(rule, SeedingRule::Default);
    }

    #[test]
    fn test_entry_series_seed() {
        let identity = generate_identity(0, "fresh", &[222]);
        let ctx = SeedingContext {
            custom_seeds: &[],
            sibling: None,
            entry_series_markers: &["rookie"]
        };
        let inputs = SeedingInputs {
            identity: &identity,
            first_event_date: date("2020-01-01T00:00:00Z"),
            event_urls: &["https://example.org/ROOKIE-series-12".to_string()]
        };

        let (rule, seed) = seed_for(&inputs, &ctx);
        assert_eq!(rule, SeedingRule::EntryLevelSeries);
        assert_abs_diff_eq!(seed.rating, ENTRY_SERIES_RATING);
    }

    #[test]
    fn test_default_seed() {
        let identity = generate_identity(0, "nobody", &[]);
        let ctx = SeedingContext {
            custom_seeds: &[],
            sibling: None,
            entry_series_markers: &["rookie"]
        };
        let inputs = SeedingInputs {
            identity: &identity,
            first_event_date: date("2020-01-01T00:00:00Z"),
            event_urls: &["https://example.org/weekly-90".to_string()]
        };

        let (rule, seed) = seed_for(&inputs, &ctx);
        assert_eq!(rule, SeedingRule::Default);
        assert_eq!(
            seed,
            RatingSeed {
                rating: DEFAULT_RATING,
                deviation: DEFAULT_DEVIATION,
                volatility: DEFAULT_VOLATILITY
            }
        );
    }
}
