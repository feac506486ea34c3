use serde::{Deserialize, Serialize};

use crate::model::structures::platform::Platform;

/// Canonical player id, assigned by the registry in discovery order.
pub type IdentityId = u32;

/// A login/profile on one hosting platform, linked to a canonical identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformAccount {
    pub platform: Platform,
    pub id: u64,
    pub handle: String,
    /// Arena accounts only: the platform's tag discriminator.
    pub discriminator: Option<String>,
    pub avatar_url: Option<String>
}

/// A tournament entry that is not tied to any platform account, identified
/// only by its raw participant id. Custom-tournament participations are
/// scoped to their tournament because those ids are only unique per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationRef {
    pub platform: Platform,
    pub participant_id: u64,
    pub tournament_id: Option<u64>
}

/// One canonical player. Accounts and participations each map to at most
/// one identity; merges come from the override tables and are never
/// inferred from name similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub display_name: String,
    pub accounts: Vec<PlatformAccount>,
    pub participations: Vec<ParticipationRef>
}

impl Identity {
    pub fn account_ids(&self, platform: Platform) -> impl Iterator<Item = u64> + '_ {
        self.accounts
            .iter()
            .filter(move |a| a.platform == platform)
            .map(|a| a.id)
    }
}

/// A raw platform-side identifier to resolve against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountRef {
    Account {
        platform: Platform,
        id: u64
    },
    Participation {
        platform: Platform,
        participant_id: u64,
        tournament_id: Option<u64>
    }
}
