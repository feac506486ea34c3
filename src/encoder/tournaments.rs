use serde_json::{json, Value};

use crate::{
    encoder::short_id::{encode_id, encode_timestamp},
    identity::registry::IdentityRegistry,
    model::{domain::Tournament, history::HistoryTracker}
};

/// Encodes the tournament record set. Participants are filtered down to
/// identities that actually have a history entry for the event — entries
/// whose every match was dropped (byes, DQs) would otherwise point at
/// players the other exports know nothing about.
pub fn encode_tournaments(
    tournaments: &[Tournament],
    registry: &IdentityRegistry,
    histories: &HistoryTracker
) -> Vec<u8> {
    let rows: Vec<Value> = tournaments
        .iter()
        .map(|t| encode_tournament(t, registry, histories))
        .collect();

    serde_json::to_vec(&Value::Array(rows)).expect("tournament export serialization cannot fail")
}

fn encode_tournament(tournament: &Tournament, registry: &IdentityRegistry, histories: &HistoryTracker) -> Value {
    let participants: Vec<Value> = tournament
        .participants
        .iter()
        .filter_map(|p| {
            let identity_id = registry.resolve_participant(tournament, p)?;
            let played_here = histories
                .history(identity_id)
                .is_some_and(|entries| entries.iter().any(|e| {
                    e.tournament.id == tournament.id && e.tournament.platform == tournament.platform
                }));

            played_here.then(|| {
                json!([
                    p.raw_id,
                    identity_id,
                    p.display_name,
                    p.placement,
                    p.seed
                ])
            })
        })
        .collect();

    json!([
        encode_id(tournament.id),
        tournament.name,
        tournament.url,
        encode_timestamp(&tournament.date),
        participants,
        tournament.kind.map(|k| k as u8),
        tournament.videos
    ])
}
