use serde_json::{json, Value};

use crate::{
    encoder::short_id::{encode_id, encode_timestamp},
    model::domain::TournamentMatches
};

/// Encodes the chronological match record set, grouped per tournament:
/// `[[date, id, platform], [[p1, p2, winProbability%, p1Won, date], ...]]`.
pub fn encode_matches(rated: &[TournamentMatches]) -> Vec<u8> {
    let rows: Vec<Value> = rated
        .iter()
        .map(|entry| {
            let matches: Vec<Value> = entry
                .matches
                .iter()
                .map(|m| {
                    json!([
                        m.player_a,
                        m.player_b,
                        rounded_percentage(m.a_win_probability),
                        if m.a_won { 1 } else { 0 },
                        encode_timestamp(&m.played_at)
                    ])
                })
                .collect();

            json!([
                [
                    encode_timestamp(&entry.tournament.date),
                    encode_id(entry.tournament.id),
                    entry.tournament.platform as u8
                ],
                matches
            ])
        })
        .collect();

    serde_json::to_vec(&Value::Array(rows)).expect("match export serialization cannot fail")
}

pub fn rounded_percentage(value: f64) -> i64 {
    (value * 100.0).round() as i64
}
