use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::warn;

use crate::{
    identity::identity::{AccountRef, Identity, IdentityId, ParticipationRef, PlatformAccount},
    model::{
        domain::{Participant, Tournament},
        structures::platform::Platform
    }
};

/// The single shared table of canonical identities. Grown during the
/// discovery phase, read-only afterwards. All mutation funnels through
/// `create_identity` / `merge_into_identity` / `add_participation` so the
/// at-most-one-identity invariants hold in one place.
pub struct IdentityRegistry {
    identities: IndexMap<IdentityId, Identity>,
    account_index: HashMap<(Platform, u64), IdentityId>,
    participation_index: HashMap<(Platform, Option<u64>, u64), IdentityId>,
    next_id: IdentityId
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityRegistry {
    pub fn new() -> IdentityRegistry {
        IdentityRegistry {
            identities: IndexMap::new(),
            account_index: HashMap::new(),
            participation_index: HashMap::new(),
            next_id: 0
        }
    }

    /// Resolves a raw platform identifier to a canonical identity.
    /// Linked accounts are consulted before unregistered participations.
    pub fn resolve(&self, account_ref: &AccountRef) -> Option<IdentityId> {
        match account_ref {
            AccountRef::Account { platform, id } => self.account_index.get(&(*platform, *id)).copied(),
            AccountRef::Participation {
                platform,
                participant_id,
                tournament_id
            } => self
                .participation_index
                .get(&(*platform, *tournament_id, *participant_id))
                .copied()
        }
    }

    pub fn create_identity(&mut self, display_name: &str) -> IdentityId {
        let id = self.next_id;
        self.next_id += 1;

        self.identities.insert(
            id,
            Identity {
                id,
                display_name: display_name.to_string(),
                accounts: Vec::new(),
                participations: Vec::new()
            }
        );

        id
    }

    /// Links a platform account to an existing identity. An account that is
    /// already linked elsewhere is left untouched: merges are explicit, a
    /// conflicting link is dirty reference data.
    pub fn merge_into_identity(&mut self, identity_id: IdentityId, account: PlatformAccount) {
        let key = (account.platform, account.id);
        if let Some(existing) = self.account_index.get(&key) {
            if *existing != identity_id {
                warn!(
                    account_id = account.id,
                    ?key,
                    existing_identity = existing,
                    requested_identity = identity_id,
                    "account already linked to another identity, keeping first link"
                );
            }
            return;
        }

        let identity = self
            .identities
            .get_mut(&identity_id)
            .unwrap_or_else(|| panic!("merge target identity {identity_id} does not exist"));

        identity.accounts.push(account);
        self.account_index.insert(key, identity_id);
    }

    /// Records an unregistered participation reference on an identity.
    pub fn add_participation(&mut self, identity_id: IdentityId, participation: ParticipationRef) {
        let key = (
            participation.platform,
            participation.tournament_id,
            participation.participant_id
        );
        if let Some(existing) = self.participation_index.get(&key) {
            if *existing != identity_id {
                warn!(
                    participant_id = participation.participant_id,
                    existing_identity = existing,
                    requested_identity = identity_id,
                    "participation already mapped to another identity, keeping first mapping"
                );
            }
            return;
        }

        let identity = self
            .identities
            .get_mut(&identity_id)
            .unwrap_or_else(|| panic!("participation target identity {identity_id} does not exist"));

        identity.participations.push(participation);
        self.participation_index.insert(key, identity_id);
    }

    /// Cross-platform anchor rows carry the player's preferred display name.
    pub fn set_display_name(&mut self, identity_id: IdentityId, display_name: &str) {
        if let Some(identity) = self.identities.get_mut(&identity_id) {
            identity.display_name = display_name.to_string();
        }
    }

    /// Resolves a tournament participant: linked account first, then the
    /// unregistered-participation mapping (tournament-scoped on the custom
    /// platform, where participant ids are only unique per event).
    pub fn resolve_participant(&self, tournament: &Tournament, participant: &Participant) -> Option<IdentityId> {
        if let Some(account_id) = participant.account_id {
            if let Some(identity_id) = self.resolve(&AccountRef::Account {
                platform: tournament.platform,
                id: account_id
            }) {
                return Some(identity_id);
            }
        }

        let tournament_id = (tournament.platform == Platform::Custom).then_some(tournament.id);
        self.resolve(&AccountRef::Participation {
            platform: tournament.platform,
            participant_id: participant.raw_id,
            tournament_id
        })
    }

    /// Resolves a match slot key to an identity via the tournament's
    /// participant list.
    pub fn resolve_match_key(&self, tournament: &Tournament, key: u64) -> Option<IdentityId> {
        let participant = tournament.participant_for_key(key)?;
        self.resolve_participant(tournament, participant)
    }

    pub fn get(&self, identity_id: IdentityId) -> Option<&Identity> {
        self.identities.get(&identity_id)
    }

    /// Identities in creation order (stable across runs for fixed inputs).
    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.values()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
