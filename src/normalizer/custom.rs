use crate::{
    model::{
        domain::{MatchOutcome, Participant, Tournament},
        structures::{platform::Platform, tournament_kind::TournamentKind}
    },
    source::raw::CustomTournament
};

/// Manually authored tournaments already name a winner and loser per match,
/// so every row is decisive by construction.
pub fn normalize_custom(raw: &[CustomTournament]) -> Vec<Tournament> {
    raw.iter()
        .map(|t| {
            let count = t.participants.len() as u32;
            Tournament {
                id: t.id,
                platform: Platform::Custom,
                name: t.name.clone(),
                url: t.url.clone().unwrap_or_default(),
                date: t.date,
                kind: Some(TournamentKind::SingleStage),
                participants: t
                    .participants
                    .iter()
                    .map(|p| Participant {
                        raw_id: p.id,
                        account_id: p.account_id,
                        display_name: p.name.clone(),
                        placement: count,
                        seed: None,
                        group_member_ids: Vec::new()
                    })
                    .collect(),
                matches: t
                    .matches
                    .iter()
                    .map(|m| MatchOutcome {
                        id: m.id,
                        side_a: m.winner_id,
                        side_b: m.loser_id,
                        a_won: true,
                        played_at: m.played_at
                    })
                    .collect(),
                videos: t.videos.clone()
            }
        })
        .collect()
}
