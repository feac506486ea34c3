use std::{fs, path::Path};

use serde::de::DeserializeOwned;
use tracing::info;

use crate::{
    error::ProcessorError,
    model::structures::namespace::Namespace,
    source::{
        raw::{ArenaEvent, ArenaPlayerRecord, BracketAccountRecord, BracketTournament, CustomTournament},
        tables::{
            self, BeltRow, CrossPlatformRow, CustomSeedRow, MatchOverrideRow, OverrideTables, PlayerSettingsRow,
            PlaytimeRow, UnregisteredParticipantRow
        }
    }
};

/// Everything one namespace pass reads, loaded fully before replay starts
/// (identity resolution needs the complete participant universe before the
/// first match is processed).
pub struct NamespaceInputs {
    pub namespace: Namespace,
    pub bracket_tournaments: Vec<BracketTournament>,
    pub arena_events: Vec<ArenaEvent>,
    pub custom_tournaments: Vec<CustomTournament>,
    pub bracket_accounts: Vec<BracketAccountRecord>,
    pub arena_players: Vec<ArenaPlayerRecord>,
    pub tables: OverrideTables
}

pub fn load_namespace_inputs(input_dir: &Path, namespace: Namespace) -> Result<NamespaceInputs, ProcessorError> {
    let ns_dir = input_dir.join(namespace.dir_name());
    let tables_dir = input_dir.join("tables");
    let ns_tables_dir = tables_dir.join(namespace.dir_name());

    let inputs = NamespaceInputs {
        namespace,
        bracket_tournaments: load_json(&ns_dir.join("bracket_tournaments.json"))?,
        arena_events: load_json(&ns_dir.join("arena_events.json"))?,
        custom_tournaments: load_json_optional(&ns_dir.join("custom_tournaments.json"))?,
        bracket_accounts: load_json(&input_dir.join("bracket_accounts.json"))?,
        arena_players: load_json(&input_dir.join("arena_players.json"))?,
        tables: load_tables(&tables_dir, &ns_tables_dir)?
    };

    info!(
        namespace = %namespace,
        bracket_tournaments = inputs.bracket_tournaments.len(),
        arena_events = inputs.arena_events.len(),
        custom_tournaments = inputs.custom_tournaments.len(),
        "loaded namespace inputs"
    );

    Ok(inputs)
}

fn load_tables(tables_dir: &Path, ns_tables_dir: &Path) -> Result<OverrideTables, ProcessorError> {
    let match_overrides_bracket: Vec<MatchOverrideRow> =
        load_csv_optional(&tables_dir.join("match_overrides_bracket.csv"), tables::parse_rows)?;
    let match_overrides_arena: Vec<MatchOverrideRow> =
        load_csv_optional(&tables_dir.join("match_overrides_arena.csv"), tables::parse_rows)?;
    let player_settings: Vec<PlayerSettingsRow> =
        load_csv_optional(&tables_dir.join("player_settings.csv"), tables::parse_rows)?;
    let belts: Vec<BeltRow> = load_csv_optional(&tables_dir.join("belts.csv"), tables::parse_rows)?;
    let playtime: Vec<PlaytimeRow> = load_csv_optional(&tables_dir.join("playtime.csv"), tables::parse_rows)?;

    let unregistered: Vec<UnregisteredParticipantRow> = load_csv_optional(
        &ns_tables_dir.join("unregistered_participants.csv"),
        tables::parse_rows
    )?;

    Ok(OverrideTables {
        merge_accounts: load_csv_optional(&tables_dir.join("merge_accounts.csv"), tables::parse_merge_accounts)?,
        unregistered_participants: unregistered,
        arena_double_accounts: load_csv_optional(
            &tables_dir.join("arena_double_accounts.csv"),
            tables::parse_arena_double_accounts
        )?,
        arena_unregistered: load_csv_optional(
            &tables_dir.join("arena_unregistered.csv"),
            tables::parse_arena_unregistered
        )?,
        cross_platform: load_csv_optional::<CrossPlatformRow, _>(
            &tables_dir.join("cross_platform.csv"),
            tables::parse_rows
        )?,
        custom_seeds: load_csv_optional::<CustomSeedRow, _>(&ns_tables_dir.join("custom_seeds.csv"), tables::parse_rows)?,
        match_overrides_bracket: match_overrides_bracket.into_iter().map(|r| (r.match_id, r)).collect(),
        match_overrides_arena: match_overrides_arena.into_iter().map(|r| (r.match_id, r)).collect(),
        player_settings: player_settings.into_iter().map(|r| (r.account_id, r)).collect(),
        belts: belts.into_iter().map(|r| (r.account_id, r.belt)).collect(),
        playtime: playtime.into_iter().map(|r| (r.account_id, r)).collect()
    })
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ProcessorError> {
    let raw = fs::read_to_string(path).map_err(|source| ProcessorError::Io {
        path: path.to_path_buf(),
        source
    })?;

    serde_json::from_str(&raw).map_err(|source| ProcessorError::Json {
        path: path.to_path_buf(),
        source
    })
}

/// Collections that are legitimately absent for a namespace (e.g. custom
/// tournaments only exist for the classic title) load as empty.
fn load_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ProcessorError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_json(path)
}

fn load_csv_optional<T, F>(path: &Path, parse: F) -> Result<Vec<T>, ProcessorError>
where
    F: FnOnce(fs::File) -> Result<Vec<T>, csv::Error>
{
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = fs::File::open(path).map_err(|source| ProcessorError::Io {
        path: path.to_path_buf(),
        source
    })?;

    parse(file).map_err(|source| ProcessorError::Table {
        path: path.to_path_buf(),
        source
    })
}
