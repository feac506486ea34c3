use std::{collections::HashMap, fs, path::Path};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    encoder::{self, EncodedOutputs},
    error::ProcessorError,
    identity::{
        discovery::{self, DiscoverySources},
        identity::IdentityId,
        registry::IdentityRegistry
    },
    model::{
        constants::{ENTRY_SERIES_URL_MARKERS, MIN_RANKED_EVENTS_CLASSIC, MIN_RANKED_EVENTS_SEQUEL},
        domain::{RatedMatch, Tournament, TournamentMatches},
        history::HistoryTracker,
        rating_engine::RatingEngine,
        seeding::{self, SeedingContext, SeedingInputs, SiblingHistory},
        structures::{namespace::Namespace, platform::Platform}
    },
    normalizer,
    source::{loader::NamespaceInputs, tables::OverrideTables},
    utils::progress_utils::progress_bar
};

pub struct NamespaceConfig {
    pub namespace: Namespace,
    pub min_ranked_events: usize,
    /// The classic pass snapshots the generated seed table the moment
    /// replay crosses this date.
    pub seed_boundary: DateTime<Utc>
}

impl NamespaceConfig {
    pub fn new(namespace: Namespace, seed_boundary: DateTime<Utc>) -> NamespaceConfig {
        let min_ranked_events = match namespace {
            Namespace::Classic => MIN_RANKED_EVENTS_CLASSIC,
            Namespace::Sequel => MIN_RANKED_EVENTS_SEQUEL
        };

        NamespaceConfig {
            namespace,
            min_ranked_events,
            seed_boundary
        }
    }
}

/// One row of the generated seed table artifact, shaped so the file can be
/// committed back verbatim as a `custom_seeds.csv` input.
pub struct GeneratedSeedRow {
    pub display_name: String,
    pub rating: i64,
    pub deviation: i64,
    pub bracket_account_id: Option<u64>,
    pub arena_user_id: Option<u64>
}

pub struct NamespaceResult {
    pub namespace: Namespace,
    pub registry: IdentityRegistry,
    pub engine: RatingEngine,
    pub histories: HistoryTracker,
    pub tournaments: Vec<Tournament>,
    pub rated: Vec<TournamentMatches>,
    pub generated_seeds: Vec<GeneratedSeedRow>
}

impl NamespaceResult {
    pub fn encode(&self, tables: &OverrideTables) -> EncodedOutputs {
        EncodedOutputs {
            players: encoder::players::encode_players(
                self.namespace,
                &self.registry,
                &self.engine,
                &self.histories,
                tables
            ),
            matches: encoder::matches::encode_matches(&self.rated),
            tournaments: encoder::tournaments::encode_tournaments(&self.tournaments, &self.registry, &self.histories)
        }
    }
}

/// One full namespace pass: normalize, discover identities, replay every
/// tournament chronologically, track history. Strictly sequential — each
/// tournament's ratings depend on the previous commit, and each rank
/// computation depends on the whole updated population.
pub fn run_namespace(
    inputs: &NamespaceInputs,
    config: &NamespaceConfig,
    sibling: Option<&SiblingHistory>
) -> NamespaceResult {
    let tournaments = normalizer::normalize_all(inputs);
    let registry = discovery::build_registry(&DiscoverySources {
        tournaments: &tournaments,
        bracket_accounts: &inputs.bracket_accounts,
        arena_players: &inputs.arena_players,
        tables: &inputs.tables
    });

    info!(
        namespace = %config.namespace,
        tournaments = tournaments.len(),
        identities = registry.len(),
        "starting replay"
    );

    // Seeding decisions need each identity's first event and full event
    // URL list up front, so they cannot depend on replay iteration order.
    let mut first_event: HashMap<IdentityId, DateTime<Utc>> = HashMap::new();
    let mut event_urls: HashMap<IdentityId, Vec<String>> = HashMap::new();
    for tournament in &tournaments {
        for participant in &tournament.participants {
            if let Some(identity_id) = registry.resolve_participant(tournament, participant) {
                first_event.entry(identity_id).or_insert(tournament.date);
                event_urls.entry(identity_id).or_default().push(tournament.url.clone());
            }
        }
    }

    let seeding_ctx = SeedingContext {
        custom_seeds: &inputs.tables.custom_seeds,
        sibling,
        entry_series_markers: ENTRY_SERIES_URL_MARKERS
    };

    let mut engine = RatingEngine::new();
    let mut histories = HistoryTracker::new(config.min_ranked_events);
    let mut rated: Vec<TournamentMatches> = Vec::with_capacity(tournaments.len());
    let mut generated_seeds: Vec<GeneratedSeedRow> = Vec::new();

    let bar = progress_bar(tournaments.len() as u64, format!("Replaying {} tournaments", config.namespace));

    for (index, tournament) in tournaments.iter().enumerate() {
        let mut batch: Vec<(IdentityId, IdentityId, bool)> = Vec::with_capacity(tournament.matches.len());
        let mut tournament_matches: Vec<RatedMatch> = Vec::with_capacity(tournament.matches.len());
        let mut participants: Vec<IdentityId> = Vec::new();

        for m in &tournament.matches {
            let Some(a) = registry.resolve_match_key(tournament, m.side_a) else {
                warn!(
                    tournament_id = tournament.id,
                    participant_key = m.side_a,
                    "could not resolve first participant, skipping match"
                );
                continue;
            };
            let Some(b) = registry.resolve_match_key(tournament, m.side_b) else {
                warn!(
                    tournament_id = tournament.id,
                    participant_key = m.side_b,
                    "could not resolve second participant, skipping match"
                );
                continue;
            };

            for identity_id in [a, b] {
                if engine.contains(identity_id) {
                    continue;
                }

                let identity = registry.get(identity_id).expect("resolved identity must exist");
                let seed_inputs = SeedingInputs {
                    identity,
                    first_event_date: first_event.get(&identity_id).copied().unwrap_or(tournament.date),
                    event_urls: event_urls.get(&identity_id).map(|urls| urls.as_slice()).unwrap_or(&[])
                };
                let (rule, seed) = seeding::seed_for(&seed_inputs, &seeding_ctx);
                debug!(identity = identity_id, ?rule, rating = seed.rating, "seeded first-seen player");
                engine.get_or_create(identity_id, &seed);
            }

            let probability = RatingEngine::win_probability(
                engine.get(a).expect("player a was just seeded"),
                engine.get(b).expect("player b was just seeded")
            );

            batch.push((a, b, m.a_won));
            tournament_matches.push(RatedMatch {
                player_a: a,
                player_b: b,
                a_win_probability: probability,
                a_won: m.a_won,
                played_at: m.played_at
            });
            if !participants.contains(&a) {
                participants.push(a);
            }
            if !participants.contains(&b) {
                participants.push(b);
            }
        }

        engine.apply_tournament_batch(tournament.id, &batch);
        histories.record_tournament(&tournament.reference(), &participants, &engine);
        rated.push(TournamentMatches {
            tournament: tournament.reference(),
            matches: tournament_matches
        });

        if config.namespace == Namespace::Classic && generated_seeds.is_empty() && tournament.date < config.seed_boundary
        {
            let next_crosses = tournaments
                .get(index + 1)
                .map_or(true, |next| next.date >= config.seed_boundary);
            if next_crosses {
                generated_seeds = snapshot_seed_table(&registry, &engine);
                info!(
                    rows = generated_seeds.len(),
                    boundary = %config.seed_boundary,
                    "generated sibling seed table at boundary"
                );
            }
        }

        bar.inc(1);
    }
    bar.finish();

    info!(namespace = %config.namespace, "replay complete");

    NamespaceResult {
        namespace: config.namespace,
        registry,
        engine,
        histories,
        tournaments,
        rated,
        generated_seeds
    }
}

/// The classic population's ratings as they stood at the boundary date,
/// keyed by the accounts the sibling namespace can anchor on.
fn snapshot_seed_table(registry: &IdentityRegistry, engine: &RatingEngine) -> Vec<GeneratedSeedRow> {
    registry
        .iter()
        .filter_map(|identity| {
            let state = engine.get(identity.id)?;

            Some(GeneratedSeedRow {
                display_name: identity.display_name.clone(),
                rating: state.rating.round() as i64,
                deviation: state.deviation.round() as i64,
                bracket_account_id: identity.account_ids(Platform::Bracket).next(),
                arena_user_id: identity.account_ids(Platform::Arena).next()
            })
        })
        .collect()
}

/// Writes the three encoded buffers (and the seed artifact, when one was
/// generated) under `<output_dir>/<namespace>/`.
pub fn write_outputs(
    result: &NamespaceResult,
    tables: &OverrideTables,
    output_dir: &Path
) -> Result<(), ProcessorError> {
    let ns_dir = output_dir.join(result.namespace.dir_name());
    fs::create_dir_all(&ns_dir).map_err(|source| ProcessorError::Io {
        path: ns_dir.clone(),
        source
    })?;

    let encoded = result.encode(tables);
    write_file(&ns_dir.join("players.json"), &encoded.players)?;
    write_file(&ns_dir.join("matches.json"), &encoded.matches)?;
    write_file(&ns_dir.join("tournaments.json"), &encoded.tournaments)?;

    if !result.generated_seeds.is_empty() {
        write_seed_table(&ns_dir.join("generated_seeds.csv"), &result.generated_seeds)?;
    }

    info!(namespace = %result.namespace, output = %ns_dir.display(), "outputs written");
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ProcessorError> {
    fs::write(path, bytes).map_err(|source| ProcessorError::Io {
        path: path.to_path_buf(),
        source
    })
}

fn write_seed_table(path: &Path, rows: &[GeneratedSeedRow]) -> Result<(), ProcessorError> {
    let to_error = |source: csv::Error| ProcessorError::Table {
        path: path.to_path_buf(),
        source
    };

    let mut writer = csv::Writer::from_path(path).map_err(to_error)?;
    writer
        .write_record(["display_name", "rating", "deviation", "bracket_account_id", "arena_user_id"])
        .map_err(to_error)?;

    for row in rows {
        writer
            .write_record([
                row.display_name.clone(),
                row.rating.to_string(),
                row.deviation.to_string(),
                row.bracket_account_id.map(|id| id.to_string()).unwrap_or_default(),
                row.arena_user_id.map(|id| id.to_string()).unwrap_or_default()
            ])
            .map_err(to_error)?;
    }

    writer.flush().map_err(|source| ProcessorError::Io {
        path: path.to_path_buf(),
        source
    })
}
