use std::collections::HashMap;

use chrono::DateTime;
use tracing::debug;

use crate::{
    model::{
        constants::DQ_SCORE_MARKER,
        domain::{MatchOutcome, Participant, Tournament},
        structures::platform::Platform
    },
    source::{
        raw::{ArenaEvent, ArenaSet},
        tables::MatchOverrideRow
    }
};

pub fn normalize_arena(raw: &[ArenaEvent], overrides: &HashMap<u64, MatchOverrideRow>) -> Vec<Tournament> {
    raw.iter().map(|e| normalize_event(e, overrides)).collect()
}

fn normalize_event(raw: &ArenaEvent, overrides: &HashMap<u64, MatchOverrideRow>) -> Tournament {
    let date = DateTime::from_timestamp(raw.start_at, 0).unwrap_or_default();

    let participants = raw
        .standings
        .iter()
        .map(|s| {
            // Seeds are reported per phase; the first phase carries the
            // original global seed.
            let seed = s
                .seeds
                .iter()
                .min_by_key(|seed| seed.phase_order)
                .map(|seed| seed.seed_num);

            Participant {
                raw_id: s.entrant_id,
                account_id: s.user_id,
                display_name: s.entrant_name.clone(),
                placement: s.placement,
                seed,
                group_member_ids: Vec::new()
            }
        })
        .collect();

    let adjusted: Vec<ArenaSet> = raw.sets.iter().map(|s| with_override(s, overrides)).collect();

    let dq_count = adjusted.iter().filter(|s| is_disqualified(s)).count();
    if dq_count > 0 {
        debug!(event_id = raw.id, dq_count, "skipped disqualified sets");
    }

    let matches = adjusted
        .iter()
        .filter(|s| is_decisive(s))
        .map(|s| MatchOutcome {
            id: s.id,
            side_a: s.entrant1_id.unwrap(),
            side_b: s.entrant2_id.unwrap(),
            a_won: s.winner_id == s.entrant1_id,
            played_at: s
                .completed_at
                .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
                .unwrap_or(date)
        })
        .collect();

    Tournament {
        id: raw.id,
        platform: Platform::Arena,
        name: raw.name.clone(),
        url: format!("https://arena.gg/{}", raw.slug),
        date,
        // Arena events are standings-based; no bracket structure is exposed.
        kind: None,
        participants,
        matches,
        videos: raw.videos.clone()
    }
}

fn with_override(s: &ArenaSet, overrides: &HashMap<u64, MatchOverrideRow>) -> ArenaSet {
    match overrides.get(&s.id) {
        Some(ow) if ow.forfeited => ArenaSet {
            forfeited: true,
            ..s.clone()
        },
        Some(ow) => ArenaSet {
            winner_id: ow.winner_id.or(s.winner_id),
            display_score: ow.score.clone().or_else(|| s.display_score.clone()),
            ..s.clone()
        },
        None => s.clone()
    }
}

fn is_disqualified(s: &ArenaSet) -> bool {
    s.forfeited
        || s.display_score
            .as_deref()
            .is_some_and(|score| score.eq_ignore_ascii_case(DQ_SCORE_MARKER))
}

fn is_decisive(s: &ArenaSet) -> bool {
    !is_disqualified(s) && s.winner_id.is_some() && s.entrant1_id.is_some() && s.entrant2_id.is_some()
}
