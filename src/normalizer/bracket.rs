use std::collections::HashMap;

use itertools::Itertools;
use tracing::debug;

use crate::{
    model::{
        constants::DQ_SCORE_MARKER,
        domain::{MatchOutcome, Participant, Tournament},
        structures::{platform::Platform, tournament_kind::TournamentKind}
    },
    normalizer::pools,
    source::{
        raw::{BracketMatch, BracketTournament},
        tables::MatchOverrideRow
    }
};

pub fn normalize_bracket(
    raw: &[BracketTournament],
    overrides: &HashMap<u64, MatchOverrideRow>
) -> Vec<Tournament> {
    raw.iter().map(|t| normalize_tournament(t, overrides)).collect()
}

fn normalize_tournament(raw: &BracketTournament, overrides: &HashMap<u64, MatchOverrideRow>) -> Tournament {
    let kind = if raw.group_stage {
        TournamentKind::TwoStage
    } else if raw.format.as_deref() == Some("round robin") {
        TournamentKind::RoundRobin
    } else {
        TournamentKind::SingleStage
    };

    let adjusted: Vec<BracketMatch> = raw.matches.iter().map(|m| with_override(m, overrides)).collect();

    let dropped = adjusted.iter().filter(|m| !is_decisive(m)).count();
    if dropped > 0 {
        debug!(
            tournament_id = raw.id,
            dropped, "dropped non-decisive bracket matches"
        );
    }

    let matches = adjusted
        .iter()
        .filter(|m| is_decisive(m))
        .map(|m| MatchOutcome {
            id: m.id,
            side_a: m.player1_id.unwrap(),
            side_b: m.player2_id.unwrap(),
            a_won: m.winner_id == m.player1_id,
            played_at: m.completed_at.or(m.updated_at).unwrap_or(raw.date)
        })
        .collect();

    let (group_ids, group_sizes) = group_layout(raw);

    let participant_count = raw.participants.len() as u32;
    let participants = raw
        .participants
        .iter()
        .map(|p| {
            // The platform reseeds after the group stage; the stored seed is
            // the post-group one, so pooled participants get theirs rebuilt.
            let seed = if kind == TournamentKind::TwoStage && !p.group_member_ids.is_empty() {
                pools::reconstruct_global_seed(p, &raw.matches, &group_ids, &group_sizes).or(p.seed)
            } else {
                p.seed
            };

            Participant {
                raw_id: p.id,
                account_id: p.account_id,
                display_name: p.display_name.clone(),
                placement: p.final_rank.unwrap_or(participant_count),
                seed,
                group_member_ids: p.group_member_ids.clone()
            }
        })
        .collect();

    Tournament {
        id: raw.id,
        platform: Platform::Bracket,
        name: raw.name.clone(),
        url: raw.url.clone(),
        date: raw.date,
        kind: Some(kind),
        participants,
        matches,
        videos: raw.videos.clone()
    }
}

/// Group ids in ascending order plus the member count of each group,
/// derived from which group each member id first plays in.
fn group_layout(raw: &BracketTournament) -> (Vec<u64>, HashMap<u64, usize>) {
    let group_ids: Vec<u64> = raw.matches.iter().filter_map(|m| m.group_id).sorted().dedup().collect();

    let mut group_sizes: HashMap<u64, usize> = HashMap::new();
    for participant in &raw.participants {
        for member_id in &participant.group_member_ids {
            let group = raw
                .matches
                .iter()
                .find(|m| m.player1_id == Some(*member_id) || m.player2_id == Some(*member_id))
                .and_then(|m| m.group_id);

            if let Some(group) = group {
                *group_sizes.entry(group).or_insert(0) += 1;
                break;
            }
        }
    }

    (group_ids, group_sizes)
}

fn with_override(m: &BracketMatch, overrides: &HashMap<u64, MatchOverrideRow>) -> BracketMatch {
    match overrides.get(&m.id) {
        Some(ow) if ow.forfeited => BracketMatch {
            forfeited: true,
            ..m.clone()
        },
        Some(ow) => BracketMatch {
            winner_id: ow.winner_id.or(m.winner_id),
            score: ow.score.clone().or_else(|| m.score.clone()),
            ..m.clone()
        },
        None => m.clone()
    }
}

/// A match counts for rating only when both slots are filled (no byes),
/// a winner is recorded and it was actually played out.
fn is_decisive(m: &BracketMatch) -> bool {
    !m.forfeited
        && m.winner_id.is_some()
        && m.player1_id.is_some()
        && m.player2_id.is_some()
        && m.score.as_deref().map_or(true, |s| !s.eq_ignore_ascii_case(DQ_SCORE_MARKER))
}
