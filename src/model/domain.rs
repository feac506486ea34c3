use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    identity::identity::IdentityId,
    model::structures::{platform::Platform, tournament_kind::TournamentKind}
};

/// The uniform tournament shape every payload family is normalized into.
/// Immutable once produced by the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: u64,
    pub platform: Platform,
    pub name: String,
    pub url: String,
    pub date: DateTime<Utc>,
    /// `None` for platforms that don't expose a bracket structure
    /// (arena events are standings-based).
    pub kind: Option<TournamentKind>,
    pub participants: Vec<Participant>,
    /// Decisive matches only; byes, forfeits and DQs are already dropped.
    pub matches: Vec<MatchOutcome>,
    pub videos: Vec<String>
}

impl Tournament {
    pub fn reference(&self) -> TournamentRef {
        TournamentRef {
            id: self.id,
            platform: self.platform,
            date: self.date
        }
    }

    /// The participant a match slot key points at. Bracket group-stage
    /// matches reference group-scoped member ids rather than the
    /// participant id itself.
    pub fn participant_for_key(&self, key: u64) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.raw_id == key || p.group_member_ids.contains(&key))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Platform-scoped participant id (entrant id on the arena platform).
    pub raw_id: u64,
    /// Linked platform account, if the entry was made from a registered account.
    pub account_id: Option<u64>,
    pub display_name: String,
    pub placement: u32,
    /// Global seed. Reconstructed for two-stage tournaments.
    pub seed: Option<u32>,
    /// Bracket platform only: per-stage ids this participant competes under
    /// when the tournament has a group stage.
    pub group_member_ids: Vec<u64>
}

/// One decisive pairwise outcome. The timestamp is for display ordering
/// only; rating order is per-tournament, not per-match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub id: u64,
    pub side_a: u64,
    pub side_b: u64,
    pub a_won: bool,
    pub played_at: DateTime<Utc>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentRef {
    pub id: u64,
    pub platform: Platform,
    pub date: DateTime<Utc>
}

/// Current Glicko-2 skill estimate for one identity. Owned exclusively by
/// the rating engine; mutated only by sequential tournament batch commits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingState {
    pub rating: f64,
    pub deviation: f64,
    pub volatility: f64
}

/// Immutable snapshot appended after each tournament a player was rated in.
/// `rank` is the 1-based global rank at that boundary, 0 while the player
/// is below the minimum ranked-event threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub tournament: TournamentRef,
    pub rating: f64,
    pub deviation: f64,
    pub volatility: f64,
    pub rank: u32
}

/// A match after identity resolution and rating, ready for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatedMatch {
    pub player_a: IdentityId,
    pub player_b: IdentityId,
    /// Win probability for player A derived from the pre-tournament ratings.
    pub a_win_probability: f64,
    pub a_won: bool,
    pub played_at: DateTime<Utc>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentMatches {
    pub tournament: TournamentRef,
    pub matches: Vec<RatedMatch>
}
