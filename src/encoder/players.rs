use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    encoder::{shorten_stats, short_id::{encode_id, encode_timestamp}},
    identity::{identity::Identity, registry::IdentityRegistry},
    model::{
        domain::{HistoryEntry, RatingState},
        history::HistoryTracker,
        rating_engine::RatingEngine,
        structures::{namespace::Namespace, platform::Platform}
    },
    source::tables::OverrideTables
};

/// Encodes the identity registry with final rating state and full history
/// sequences as positional tuples. Identities that never reached a counted
/// match carry no rating state and are excluded here — the only deliberate
/// data-dropping step in the pipeline.
pub fn encode_players(
    namespace: Namespace,
    registry: &IdentityRegistry,
    engine: &RatingEngine,
    histories: &HistoryTracker,
    tables: &OverrideTables
) -> Vec<u8> {
    let mut rows = Vec::with_capacity(registry.len());
    let mut excluded = 0usize;

    for identity in registry.iter() {
        let Some(state) = engine.get(identity.id) else {
            excluded += 1;
            continue;
        };

        let history = histories.history(identity.id).unwrap_or(&[]);
        rows.push(encode_player(namespace, identity, state, history, tables));
    }

    if excluded > 0 {
        info!(excluded, "excluded identities without committed rating state from player export");
    }

    serde_json::to_vec(&Value::Array(rows)).expect("player export serialization cannot fail")
}

fn encode_player(
    namespace: Namespace,
    identity: &Identity,
    state: &RatingState,
    history: &[HistoryEntry],
    tables: &OverrideTables
) -> Value {
    let bracket_accounts: Vec<Value> = identity
        .accounts
        .iter()
        .filter(|a| a.platform == Platform::Bracket)
        .map(|a| {
            json!([
                encode_id(a.id),
                a.handle,
                a.avatar_url.as_deref().and_then(shorten_bracket_avatar)
            ])
        })
        .collect();

    let bracket_participations: Vec<Value> = identity
        .participations
        .iter()
        .filter(|p| p.platform == Platform::Bracket)
        .map(|p| Value::String(encode_id(p.participant_id)))
        .collect();

    let arena_accounts: Vec<Value> = identity
        .accounts
        .iter()
        .filter(|a| a.platform == Platform::Arena)
        .map(|a| json!([encode_id(a.id), a.handle, a.discriminator, a.avatar_url]))
        .collect();

    let arena_entrants: Vec<Value> = identity
        .participations
        .iter()
        .filter(|p| p.platform == Platform::Arena)
        .map(|p| json!([encode_id(p.participant_id), identity.display_name]))
        .collect();

    let history_rows: Vec<Value> = history.iter().map(encode_history_entry).collect();

    let (stats_r, stats_d, stats_v) = shorten_stats(state.rating, state.deviation, state.volatility);

    let settings = identity
        .account_ids(Platform::Bracket)
        .find_map(|id| tables.player_settings.get(&id));
    let characters = settings
        .map(|s| {
            let (main, secondary) = match namespace {
                Namespace::Classic => (&s.classic_main, &s.classic_secondary),
                Namespace::Sequel => (&s.sequel_main, &s.sequel_secondary)
            };
            let mut chars = Vec::new();
            if let Some(main) = main {
                chars.push(Value::String(main.clone()));
            }
            if let Some(secondary) = secondary {
                chars.push(Value::String(secondary.clone()));
            }
            chars
        })
        .unwrap_or_default();
    let country = settings.and_then(|s| s.country.clone());
    let belt = identity
        .account_ids(Platform::Bracket)
        .find_map(|id| tables.belts.get(&id))
        .cloned();
    let playtime = identity
        .account_ids(Platform::Bracket)
        .find_map(|id| tables.playtime.get(&id))
        .and_then(|row| row.minutes(namespace));

    json!([
        encode_id(identity.id as u64),
        identity.display_name,
        [bracket_accounts, bracket_participations],
        [arena_accounts, arena_entrants],
        [stats_r, stats_d, stats_v],
        history_rows,
        characters,
        country,
        belt,
        playtime
    ])
}

fn encode_history_entry(entry: &HistoryEntry) -> Value {
    let (r, d, v) = shorten_stats(entry.rating, entry.deviation, entry.volatility);

    json!([
        [
            encode_id(entry.tournament.id),
            entry.tournament.platform as u8,
            encode_timestamp(&entry.tournament.date)
        ],
        r,
        d,
        v,
        entry.rank
    ])
}

/// The two known avatar URL families collapse to a one-byte prefix code.
/// Anything else is a structural inconsistency: logged, field left absent.
fn shorten_bracket_avatar(url: &str) -> Option<String> {
    if let Some(rest) = url.strip_prefix("https://assets.bracket.gg/users/images/") {
        return Some(format!("1{rest}"));
    }
    if let Some(rest) = url.strip_prefix("https://secure.gravatar.com/avatar/") {
        let hash = rest.split('?').next().unwrap_or(rest);
        return Some(format!("2{hash}"));
    }

    warn!(url, "unknown bracket avatar url format, omitting avatar");
    None
}
