use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw shapes as stored by the platform fetchers. These mirror what the
/// fetchers persist, not what the pipeline wants; the normalizer translates
/// them into `model::domain` records.

// ---------------------------------------------------------------------------
// Bracket platform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketTournament {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub group_stage: bool,
    #[serde(default)]
    pub format: Option<String>,
    pub participants: Vec<BracketParticipant>,
    pub matches: Vec<BracketMatch>,
    #[serde(default)]
    pub videos: Vec<String>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketParticipant {
    pub id: u64,
    /// Absent when the entry was made without logging in.
    pub account_id: Option<u64>,
    pub display_name: String,
    pub final_rank: Option<u32>,
    pub seed: Option<u32>,
    /// Stage-scoped ids this participant plays under in a group stage.
    #[serde(default)]
    pub group_member_ids: Vec<u64>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketMatch {
    pub id: u64,
    pub player1_id: Option<u64>,
    pub player2_id: Option<u64>,
    pub winner_id: Option<u64>,
    pub group_id: Option<u64>,
    /// Scheduling position inside a group; older exports only carry the
    /// `identifier` letter instead.
    pub play_order: Option<u32>,
    pub identifier: Option<String>,
    pub score: Option<String>,
    #[serde(default)]
    pub forfeited: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>
}

/// Account directory entry (handles and avatars), shared across namespaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketAccountRecord {
    pub account_id: u64,
    pub username: String,
    pub avatar_url: Option<String>
}

// ---------------------------------------------------------------------------
// Arena platform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaEvent {
    pub id: u64,
    pub name: String,
    pub slug: String,
    /// Event start, epoch seconds (that is what the platform exposes).
    pub start_at: i64,
    pub standings: Vec<ArenaStanding>,
    pub sets: Vec<ArenaSet>,
    #[serde(default)]
    pub videos: Vec<String>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaStanding {
    pub placement: u32,
    pub entrant_id: u64,
    pub entrant_name: String,
    /// Absent for unregistered entrants.
    pub user_id: Option<u64>,
    #[serde(default)]
    pub seeds: Vec<ArenaSeed>
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArenaSeed {
    pub phase_order: u32,
    pub seed_num: u32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaSet {
    pub id: u64,
    pub winner_id: Option<u64>,
    pub display_score: Option<String>,
    pub completed_at: Option<i64>,
    pub entrant1_id: Option<u64>,
    pub entrant2_id: Option<u64>,
    #[serde(default)]
    pub forfeited: bool
}

/// Per-event entrant directory row; `(entrant_id, user_id)` pairs plus the
/// profile data needed for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaPlayerRecord {
    pub entrant_id: u64,
    pub gamer_tag: String,
    pub user_id: Option<u64>,
    pub discriminator: Option<String>,
    pub avatar_url: Option<String>
}

// ---------------------------------------------------------------------------
// Manually authored tournaments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomTournament {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    pub date: DateTime<Utc>,
    pub participants: Vec<CustomParticipant>,
    pub matches: Vec<CustomMatch>,
    #[serde(default)]
    pub videos: Vec<String>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomParticipant {
    pub id: u64,
    pub name: String,
    /// Bracket-platform account of the player, when known.
    pub account_id: Option<u64>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomMatch {
    pub id: u64,
    pub winner_id: u64,
    pub loser_id: u64,
    pub played_at: DateTime<Utc>
}
