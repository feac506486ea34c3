use std::collections::HashSet;

use tracing::{debug, warn};

use crate::{
    identity::{
        identity::{AccountRef, IdentityId, ParticipationRef, PlatformAccount},
        registry::IdentityRegistry
    },
    model::{domain::Tournament, structures::platform::Platform},
    source::{
        raw::{ArenaPlayerRecord, BracketAccountRecord},
        tables::{ArenaUnregisteredRow, CrossPlatformRow, OverrideTables}
    }
};

/// Everything the discovery phase reads. Tournaments must already be
/// normalized so that "valid participation" means "appears in at least one
/// decisive match".
pub struct DiscoverySources<'a> {
    pub tournaments: &'a [Tournament],
    pub bracket_accounts: &'a [BracketAccountRecord],
    pub arena_players: &'a [ArenaPlayerRecord],
    pub tables: &'a OverrideTables
}

/// Builds the identity registry for one namespace. The passes run in the
/// fixed resolution precedence: explicit merge tables first, then the
/// unregistered-participant mappings, then automatic creation from
/// first-seen accounts — with the cross-platform anchor table consulted
/// before any automatic creation so a player already known cross-platform
/// is never fragmented.
pub fn build_registry(sources: &DiscoverySources) -> IdentityRegistry {
    let mut registry = IdentityRegistry::new();
    let active = ActiveKeys::collect(sources.tournaments);

    apply_merge_table(&mut registry, sources);
    apply_unregistered_bracket_rows(&mut registry, sources);
    discover_bracket_accounts(&mut registry, sources, &active);
    map_registered_unregistered_rows(&mut registry, sources);
    discover_arena_players(&mut registry, sources, &active);
    discover_custom_participants(&mut registry, sources, &active);

    debug!(identities = registry.len(), "discovery finished");
    registry
}

/// Participant keys that occur in at least one decisive match. Anything
/// outside these sets is platform metadata (spectators, admins, DQ-only
/// entrants) and must never trigger automatic identity creation.
struct ActiveKeys {
    bracket_accounts: HashSet<u64>,
    arena_users: HashSet<u64>,
    arena_entrants: HashSet<u64>,
    custom_participants: HashSet<(u64, u64)>
}

impl ActiveKeys {
    fn collect(tournaments: &[Tournament]) -> ActiveKeys {
        let mut keys = ActiveKeys {
            bracket_accounts: HashSet::new(),
            arena_users: HashSet::new(),
            arena_entrants: HashSet::new(),
            custom_participants: HashSet::new()
        };

        for tournament in tournaments {
            for m in &tournament.matches {
                for side in [m.side_a, m.side_b] {
                    let Some(participant) = tournament.participant_for_key(side) else {
                        continue;
                    };

                    match tournament.platform {
                        Platform::Bracket => {
                            if let Some(account_id) = participant.account_id {
                                keys.bracket_accounts.insert(account_id);
                            }
                        }
                        Platform::Arena => {
                            if let Some(user_id) = participant.account_id {
                                keys.arena_users.insert(user_id);
                            }
                            keys.arena_entrants.insert(participant.raw_id);
                        }
                        Platform::Custom => {
                            keys.custom_participants.insert((tournament.id, participant.raw_id));
                        }
                    }
                }
            }
        }

        keys
    }
}

fn apply_merge_table(registry: &mut IdentityRegistry, sources: &DiscoverySources) {
    for row in &sources.tables.merge_accounts {
        let identity_id = registry.create_identity(&row.display_name);

        for account in &row.accounts {
            let avatar_url = match account.platform {
                Platform::Bracket => bracket_avatar(sources.bracket_accounts, account.id),
                Platform::Arena => arena_avatar(sources.arena_players, account.id),
                Platform::Custom => None
            };

            registry.merge_into_identity(
                identity_id,
                PlatformAccount {
                    platform: account.platform,
                    id: account.id,
                    handle: account.handle.clone(),
                    discriminator: None,
                    avatar_url
                }
            );
        }
    }
}

/// Fully unregistered bracket participants (no account at all). Rows
/// sharing a cross-platform discriminator describe one player with several
/// one-off entries.
fn apply_unregistered_bracket_rows(registry: &mut IdentityRegistry, sources: &DiscoverySources) {
    let mut by_discriminator: Vec<(Option<&str>, IdentityId)> = Vec::new();

    for row in sources
        .tables
        .unregistered_participants
        .iter()
        .filter(|row| row.account_id.is_none())
    {
        let existing = row.discriminator.as_deref().and_then(|disc| {
            by_discriminator
                .iter()
                .find(|(d, _)| *d == Some(disc))
                .map(|(_, id)| *id)
        });

        let identity_id = match existing {
            Some(id) => id,
            None => {
                let id = registry.create_identity(&row.display_name);
                by_discriminator.push((row.discriminator.as_deref(), id));
                id
            }
        };

        registry.add_participation(
            identity_id,
            ParticipationRef {
                platform: Platform::Bracket,
                participant_id: row.participant_id,
                tournament_id: None
            }
        );
    }
}

/// Automatic creation from first-seen bracket accounts with at least one
/// valid participation.
fn discover_bracket_accounts(registry: &mut IdentityRegistry, sources: &DiscoverySources, active: &ActiveKeys) {
    let mut seen: HashSet<u64> = HashSet::new();

    for tournament in sources.tournaments.iter().filter(|t| t.platform == Platform::Bracket) {
        for participant in &tournament.participants {
            let Some(account_id) = participant.account_id else {
                continue;
            };
            if !seen.insert(account_id) {
                continue;
            }

            let reference = AccountRef::Account {
                platform: Platform::Bracket,
                id: account_id
            };
            if registry.resolve(&reference).is_some() {
                continue;
            }
            if !active.bracket_accounts.contains(&account_id) {
                // No decisive match anywhere; may still be attached later
                // through the cross-platform pass.
                continue;
            }

            let handle = bracket_username(sources.bracket_accounts, account_id)
                .unwrap_or_else(|| participant.display_name.clone());
            let identity_id = registry.create_identity(&handle);
            registry.merge_into_identity(
                identity_id,
                PlatformAccount {
                    platform: Platform::Bracket,
                    id: account_id,
                    handle,
                    discriminator: None,
                    avatar_url: bracket_avatar(sources.bracket_accounts, account_id)
                }
            );
        }
    }
}

/// Unregistered bracket participations owned by a known account.
fn map_registered_unregistered_rows(registry: &mut IdentityRegistry, sources: &DiscoverySources) {
    for row in &sources.tables.unregistered_participants {
        let Some(account_id) = row.account_id else {
            continue;
        };

        let reference = AccountRef::Account {
            platform: Platform::Bracket,
            id: account_id
        };
        let identity_id = match registry.resolve(&reference) {
            Some(id) => id,
            None => {
                // Dirty reference data: the mapped account has no resolvable
                // identity (e.g. zero valid participations on the account
                // itself). Synthesize one from the row instead of aborting.
                warn!(
                    account_id,
                    participant_id = row.participant_id,
                    "unregistered-participant mapping references unknown account, synthesizing identity"
                );
                let id = registry.create_identity(&row.display_name);
                registry.merge_into_identity(
                    id,
                    PlatformAccount {
                        platform: Platform::Bracket,
                        id: account_id,
                        handle: bracket_username(sources.bracket_accounts, account_id)
                            .unwrap_or_else(|| row.display_name.clone()),
                        discriminator: None,
                        avatar_url: bracket_avatar(sources.bracket_accounts, account_id)
                    }
                );
                id
            }
        };

        registry.add_participation(
            identity_id,
            ParticipationRef {
                platform: Platform::Bracket,
                participant_id: row.participant_id,
                tournament_id: None
            }
        );
    }
}

fn discover_arena_players(registry: &mut IdentityRegistry, sources: &DiscoverySources, active: &ActiveKeys) {
    // Registered records first so unregistered entries can land on the
    // account identities they belong to.
    let mut records: Vec<&ArenaPlayerRecord> = sources.arena_players.iter().collect();
    records.sort_by_key(|record| record.user_id.is_none());

    for record in records {
        let multi = sources
            .tables
            .arena_double_accounts
            .iter()
            .find(|row| record.user_id.is_some_and(|id| row.user_ids.contains(&id)));
        let unreg_mapped = sources
            .tables
            .arena_unregistered
            .iter()
            .find(|row| row.entrant_ids.contains(&record.entrant_id));
        let is_unregistered = record.user_id.is_none();

        let cross = sources.tables.cross_platform.iter().find(|row| {
            if multi.is_none() && unreg_mapped.is_none() && !is_unregistered {
                return row.arena_user_id == record.user_id;
            }
            if let Some(multi) = multi {
                return row.arena_user_id.is_some_and(|id| multi.user_ids.contains(&id));
            }
            if is_unregistered && unreg_mapped.is_none() {
                return row.arena_entrant_id == Some(record.entrant_id);
            }
            if let Some(mapped_user) = unreg_mapped.and_then(|row| row.user_id) {
                return row.arena_user_id == Some(mapped_user);
            }
            false
        });

        if let Some(cross) = cross {
            attach_cross_platform(registry, sources, cross, record, is_unregistered);
            continue;
        }

        if let Some(multi) = multi {
            let resolved = multi.user_ids.iter().find_map(|user_id| {
                registry.resolve(&AccountRef::Account {
                    platform: Platform::Arena,
                    id: *user_id
                })
            });

            match resolved {
                Some(identity_id) => attach_arena(registry, identity_id, record, is_unregistered),
                None => {
                    if has_valid_arena_participation(record, active) {
                        let identity_id = registry.create_identity(&record.gamer_tag);
                        attach_arena(registry, identity_id, record, is_unregistered);
                    }
                }
            }
            continue;
        }

        if let Some(unreg_mapped) = unreg_mapped {
            attach_mapped_entrant(registry, unreg_mapped, record, active);
            continue;
        }

        // Plain first-seen player
        let resolved = registry.resolve(&arena_reference(record, is_unregistered));
        if resolved.is_some() {
            continue;
        }
        if has_valid_arena_participation(record, active) {
            let identity_id = registry.create_identity(&record.gamer_tag);
            attach_arena(registry, identity_id, record, is_unregistered);
        }
    }
}

fn attach_cross_platform(
    registry: &mut IdentityRegistry,
    sources: &DiscoverySources,
    cross: &CrossPlatformRow,
    record: &ArenaPlayerRecord,
    is_unregistered: bool
) {
    let resolved = cross
        .bracket_account_id
        .and_then(|id| {
            registry.resolve(&AccountRef::Account {
                platform: Platform::Bracket,
                id
            })
        })
        .or_else(|| {
            cross.bracket_participant_id.and_then(|participant_id| {
                registry.resolve(&AccountRef::Participation {
                    platform: Platform::Bracket,
                    participant_id,
                    tournament_id: None
                })
            })
        });

    let identity_id = match resolved {
        Some(id) => id,
        None => {
            // Anchor points at a bracket account with no valid bracket
            // participation; synthesize so the arena history still lands on
            // one canonical player.
            warn!(
                display_name = %cross.display_name,
                bracket_account_id = cross.bracket_account_id,
                "cross-platform anchor has no resolvable bracket identity, synthesizing"
            );
            let id = registry.create_identity(&cross.display_name);
            if let Some(account_id) = cross.bracket_account_id {
                registry.merge_into_identity(
                    id,
                    PlatformAccount {
                        platform: Platform::Bracket,
                        id: account_id,
                        handle: bracket_username(sources.bracket_accounts, account_id)
                            .unwrap_or_else(|| cross.display_name.clone()),
                        discriminator: None,
                        avatar_url: bracket_avatar(sources.bracket_accounts, account_id)
                    }
                );
            }
            id
        }
    };

    attach_arena(registry, identity_id, record, is_unregistered);
    registry.set_display_name(identity_id, &cross.display_name);
}

fn attach_mapped_entrant(
    registry: &mut IdentityRegistry,
    row: &ArenaUnregisteredRow,
    record: &ArenaPlayerRecord,
    active: &ActiveKeys
) {
    if let Some(user_id) = row.user_id {
        let reference = AccountRef::Account {
            platform: Platform::Arena,
            id: user_id
        };
        match registry.resolve(&reference) {
            Some(identity_id) => attach_arena(registry, identity_id, record, true),
            None => {
                warn!(
                    user_id,
                    entrant_id = record.entrant_id,
                    "arena unregistered mapping references unknown account, synthesizing identity"
                );
                let identity_id = registry.create_identity(&row.display_name);
                attach_arena(registry, identity_id, record, true);
            }
        }
        return;
    }

    let resolved = row.entrant_ids.iter().find_map(|entrant_id| {
        registry.resolve(&AccountRef::Participation {
            platform: Platform::Arena,
            participant_id: *entrant_id,
            tournament_id: None
        })
    });

    match resolved {
        Some(identity_id) => attach_arena(registry, identity_id, record, true),
        None => {
            if has_valid_arena_participation(record, active) {
                let identity_id = registry.create_identity(&row.display_name);
                attach_arena(registry, identity_id, record, true);
            }
        }
    }
}

fn discover_custom_participants(registry: &mut IdentityRegistry, sources: &DiscoverySources, active: &ActiveKeys) {
    for tournament in sources.tournaments.iter().filter(|t| t.platform == Platform::Custom) {
        for participant in &tournament.participants {
            let participation = ParticipationRef {
                platform: Platform::Custom,
                participant_id: participant.raw_id,
                tournament_id: Some(tournament.id)
            };

            if let Some(account_id) = participant.account_id {
                let reference = AccountRef::Account {
                    platform: Platform::Bracket,
                    id: account_id
                };
                let identity_id = match registry.resolve(&reference) {
                    Some(id) => id,
                    None => {
                        warn!(
                            account_id,
                            participant = %participant.display_name,
                            "custom participant references unknown bracket account, synthesizing identity"
                        );
                        let id = registry.create_identity(&participant.display_name);
                        registry.merge_into_identity(
                            id,
                            PlatformAccount {
                                platform: Platform::Bracket,
                                id: account_id,
                                handle: bracket_username(sources.bracket_accounts, account_id)
                                    .unwrap_or_else(|| participant.display_name.clone()),
                                discriminator: None,
                                avatar_url: bracket_avatar(sources.bracket_accounts, account_id)
                            }
                        );
                        id
                    }
                };
                registry.add_participation(identity_id, participation);
                continue;
            }

            if registry
                .resolve(&AccountRef::Participation {
                    platform: Platform::Custom,
                    participant_id: participant.raw_id,
                    tournament_id: Some(tournament.id)
                })
                .is_some()
            {
                continue;
            }

            if active
                .custom_participants
                .contains(&(tournament.id, participant.raw_id))
            {
                let identity_id = registry.create_identity(&participant.display_name);
                registry.add_participation(identity_id, participation);
            }
        }
    }
}

fn attach_arena(registry: &mut IdentityRegistry, identity_id: IdentityId, record: &ArenaPlayerRecord, as_entrant: bool) {
    if as_entrant {
        registry.add_participation(
            identity_id,
            ParticipationRef {
                platform: Platform::Arena,
                participant_id: record.entrant_id,
                tournament_id: None
            }
        );
    } else {
        registry.merge_into_identity(
            identity_id,
            PlatformAccount {
                platform: Platform::Arena,
                id: record.user_id.expect("registered arena record must carry a user id"),
                handle: record.gamer_tag.clone(),
                discriminator: record.discriminator.clone(),
                avatar_url: record.avatar_url.clone()
            }
        );
    }
}

fn arena_reference(record: &ArenaPlayerRecord, is_unregistered: bool) -> AccountRef {
    if is_unregistered {
        AccountRef::Participation {
            platform: Platform::Arena,
            participant_id: record.entrant_id,
            tournament_id: None
        }
    } else {
        AccountRef::Account {
            platform: Platform::Arena,
            id: record.user_id.unwrap()
        }
    }
}

fn has_valid_arena_participation(record: &ArenaPlayerRecord, active: &ActiveKeys) -> bool {
    active.arena_entrants.contains(&record.entrant_id)
        || record.user_id.is_some_and(|id| active.arena_users.contains(&id))
}

fn bracket_username(directory: &[BracketAccountRecord], account_id: u64) -> Option<String> {
    directory
        .iter()
        .find(|record| record.account_id == account_id)
        .map(|record| record.username.clone())
}

fn bracket_avatar(directory: &[BracketAccountRecord], account_id: u64) -> Option<String> {
    directory
        .iter()
        .find(|record| record.account_id == account_id)
        .and_then(|record| record.avatar_url.clone())
}

fn arena_avatar(directory: &[ArenaPlayerRecord], user_id: u64) -> Option<String> {
    directory
        .iter()
        .find(|record| record.user_id == Some(user_id))
        .and_then(|record| record.avatar_url.clone())
}
