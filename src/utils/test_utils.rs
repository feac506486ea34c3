use chrono::{DateTime, Utc};

use crate::{
    identity::identity::{Identity, IdentityId, PlatformAccount},
    model::{
        domain::{MatchOutcome, Participant, RatingState, Tournament, TournamentRef},
        structures::{platform::Platform, tournament_kind::TournamentKind}
    },
    source::raw::{
        ArenaEvent, ArenaPlayerRecord, ArenaSet, ArenaStanding, BracketAccountRecord, BracketMatch,
        BracketParticipant, BracketTournament
    }
};

pub fn date(value: &str) -> DateTime<Utc> {
    value.parse().expect("test dates must be RFC 3339")
}

pub fn generate_rating(rating: f64, deviation: f64, volatility: f64) -> RatingState {
    RatingState {
        rating,
        deviation,
        volatility
    }
}

pub fn generate_identity(id: IdentityId, display_name: &str, bracket_account_ids: &[u64]) -> Identity {
    Identity {
        id,
        display_name: display_name.to_string(),
        accounts: bracket_account_ids
            .iter()
            .map(|account_id| PlatformAccount {
                platform: Platform::Bracket,
                id: *account_id,
                handle: display_name.to_string(),
                discriminator: None,
                avatar_url: None
            })
            .collect(),
        participations: Vec::new()
    }
}

pub fn generate_tournament_ref(id: u64, platform: Platform, date_str: &str) -> TournamentRef {
    TournamentRef {
        id,
        platform,
        date: date(date_str)
    }
}

// ---------------------------------------------------------------------------
// Raw payload generators
// ---------------------------------------------------------------------------

pub fn generate_bracket_participant(id: u64, account_id: Option<u64>, display_name: &str) -> BracketParticipant {
    BracketParticipant {
        id,
        account_id,
        display_name: display_name.to_string(),
        final_rank: None,
        seed: None,
        group_member_ids: Vec::new()
    }
}

pub fn generate_bracket_match(id: u64, player1: u64, player2: u64, winner: u64) -> BracketMatch {
    BracketMatch {
        id,
        player1_id: Some(player1),
        player2_id: Some(player2),
        winner_id: Some(winner),
        group_id: None,
        play_order: None,
        identifier: None,
        score: None,
        forfeited: false,
        completed_at: None,
        updated_at: None
    }
}

pub fn generate_bracket_tournament(
    id: u64,
    date_str: &str,
    participants: Vec<BracketParticipant>,
    matches: Vec<BracketMatch>
) -> BracketTournament {
    BracketTournament {
        id,
        name: format!("Tournament {id}"),
        url: format!("https://bracket.gg/t{id}"),
        date: date(date_str),
        group_stage: false,
        format: None,
        participants,
        matches,
        videos: Vec::new()
    }
}

pub fn generate_bracket_account_record(account_id: u64, username: &str) -> BracketAccountRecord {
    BracketAccountRecord {
        account_id,
        username: username.to_string(),
        avatar_url: None
    }
}

pub fn generate_arena_standing(entrant_id: u64, user_id: Option<u64>, name: &str, placement: u32) -> ArenaStanding {
    ArenaStanding {
        placement,
        entrant_id,
        entrant_name: name.to_string(),
        user_id,
        seeds: Vec::new()
    }
}

pub fn generate_arena_set(id: u64, entrant1: u64, entrant2: u64, winner: u64) -> ArenaSet {
    ArenaSet {
        id,
        winner_id: Some(winner),
        display_score: Some("2-1".to_string()),
        completed_at: None,
        entrant1_id: Some(entrant1),
        entrant2_id: Some(entrant2),
        forfeited: false
    }
}

pub fn generate_arena_event(id: u64, start_at: i64, standings: Vec<ArenaStanding>, sets: Vec<ArenaSet>) -> ArenaEvent {
    ArenaEvent {
        id,
        name: format!("Event {id}"),
        slug: format!("event-{id}"),
        start_at,
        standings,
        sets,
        videos: Vec::new()
    }
}

pub fn generate_arena_player_record(entrant_id: u64, user_id: Option<u64>, gamer_tag: &str) -> ArenaPlayerRecord {
    ArenaPlayerRecord {
        entrant_id,
        gamer_tag: gamer_tag.to_string(),
        user_id,
        discriminator: None,
        avatar_url: None
    }
}

// ---------------------------------------------------------------------------
// Normalized tournament generators
// ---------------------------------------------------------------------------

/// `participants`: (raw id, account id, display name).
/// `matches`: (side a, side b, a won); match ids are assigned sequentially.
pub fn generate_bracket_tournament_normalized(
    id: u64,
    date_str: &str,
    participants: &[(u64, Option<u64>, &str)],
    matches: &[(u64, u64, bool)]
) -> Tournament {
    generate_normalized(id, Platform::Bracket, date_str, participants, matches)
}

pub fn generate_arena_tournament_normalized(
    id: u64,
    date_str: &str,
    participants: &[(u64, Option<u64>, &str)],
    matches: &[(u64, u64, bool)]
) -> Tournament {
    generate_normalized(id, Platform::Arena, date_str, participants, matches)
}

fn generate_normalized(
    id: u64,
    platform: Platform,
    date_str: &str,
    participants: &[(u64, Option<u64>, &str)],
    matches: &[(u64, u64, bool)]
) -> Tournament {
    let when = date(date_str);

    Tournament {
        id,
        platform,
        name: format!("Tournament {id}"),
        url: format!("https://example.gg/t{id}"),
        date: when,
        kind: (platform == Platform::Bracket).then_some(TournamentKind::SingleStage),
        participants: participants
            .iter()
            .enumerate()
            .map(|(index, (raw_id, account_id, name))| Participant {
                raw_id: *raw_id,
                account_id: *account_id,
                display_name: name.to_string(),
                placement: index as u32 + 1,
                seed: None,
                group_member_ids: Vec::new()
            })
            .collect(),
        matches: matches
            .iter()
            .enumerate()
            .map(|(index, (side_a, side_b, a_won))| MatchOutcome {
                id: index as u64 + 1,
                side_a: *side_a,
                side_b: *side_b,
                a_won: *a_won,
                played_at: when
            })
            .collect(),
        videos: Vec::new()
    }
}
