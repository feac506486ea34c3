use std::collections::HashMap;

use serde::Deserialize;

use crate::model::structures::{namespace::Namespace, platform::Platform};

/// Hand-maintained override and attribute tables. All of them are CSV with
/// a header row; composite columns use `;`-separated entries and
/// `handle:id` pairs, matching how the tables are authored.

/// Multi-account merge table: one player known under several accounts.
/// Account tokens are `handle:id` (bracket platform, the common case) or
/// `arena:handle:id` for cross-platform rows.
#[derive(Debug, Clone)]
pub struct MergeAccountsRow {
    pub display_name: String,
    pub accounts: Vec<MergeAccount>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeAccount {
    pub platform: Platform,
    pub handle: String,
    pub id: u64
}

#[derive(Debug, Deserialize)]
struct MergeAccountsRaw {
    display_name: String,
    accounts: String
}

impl MergeAccountsRow {
    fn from_raw(raw: MergeAccountsRaw) -> MergeAccountsRow {
        let accounts = raw.accounts.split(';').filter_map(parse_merge_account).collect();

        MergeAccountsRow {
            display_name: raw.display_name,
            accounts
        }
    }
}

fn parse_merge_account(token: &str) -> Option<MergeAccount> {
    let parts: Vec<&str> = token.split(':').collect();
    match parts.as_slice() {
        [handle, id] => Some(MergeAccount {
            platform: Platform::Bracket,
            handle: handle.to_string(),
            id: id.trim().parse().ok()?
        }),
        ["arena", handle, id] => Some(MergeAccount {
            platform: Platform::Arena,
            handle: handle.to_string(),
            id: id.trim().parse().ok()?
        }),
        ["bracket", handle, id] => Some(MergeAccount {
            platform: Platform::Bracket,
            handle: handle.to_string(),
            id: id.trim().parse().ok()?
        }),
        _ => None
    }
}

/// Bracket participant entries not tied to any account. Rows without an
/// `account_id` describe a fully unregistered player; rows sharing a
/// `discriminator` belong to the same player.
#[derive(Debug, Clone, Deserialize)]
pub struct UnregisteredParticipantRow {
    pub participant_id: u64,
    pub account_id: Option<u64>,
    pub discriminator: Option<String>,
    pub display_name: String
}

/// Arena players with more than one platform user account.
#[derive(Debug, Clone)]
pub struct ArenaDoubleAccountRow {
    pub display_name: String,
    pub user_ids: Vec<u64>
}

#[derive(Debug, Deserialize)]
struct ArenaDoubleAccountRaw {
    display_name: String,
    user_ids: String
}

/// Unregistered arena entrants mapped to a player (optionally to one of
/// their registered user accounts).
#[derive(Debug, Clone)]
pub struct ArenaUnregisteredRow {
    pub entrant_ids: Vec<u64>,
    pub user_id: Option<u64>,
    pub display_name: String
}

#[derive(Debug, Deserialize)]
struct ArenaUnregisteredRaw {
    entrant_ids: String,
    user_id: Option<u64>,
    display_name: String
}

/// Cross-platform anchor table: one row per player known under accounts on
/// both platforms. Applied before automatic discovery so creation never
/// fragments a player already known cross-platform.
#[derive(Debug, Clone, Deserialize)]
pub struct CrossPlatformRow {
    pub display_name: String,
    pub bracket_account_id: Option<u64>,
    pub bracket_participant_id: Option<u64>,
    pub discriminator: Option<String>,
    pub arena_user_id: Option<u64>,
    pub arena_entrant_id: Option<u64>
}

/// Curated seed table for players already ranked before tracked history
/// begins (and the generated bootstrap table from the classic pass).
#[derive(Debug, Clone, Deserialize)]
pub struct CustomSeedRow {
    pub display_name: String,
    pub rating: f64,
    pub deviation: f64,
    pub bracket_account_id: Option<u64>,
    pub arena_user_id: Option<u64>
}

/// Manual match-outcome correction, keyed by platform match id.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchOverrideRow {
    pub match_id: u64,
    pub winner_id: Option<u64>,
    pub score: Option<String>,
    #[serde(default)]
    pub forfeited: bool
}

/// Cosmetic/demographic player settings, keyed by bracket account.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSettingsRow {
    pub display_name: String,
    pub account_id: u64,
    pub country: Option<String>,
    pub sequel_main: Option<String>,
    pub sequel_secondary: Option<String>,
    pub classic_main: Option<String>,
    pub classic_secondary: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeltRow {
    pub display_name: String,
    pub account_id: u64,
    pub belt: String
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaytimeRow {
    pub display_name: String,
    pub account_id: u64,
    pub sequel_minutes: Option<u32>,
    pub classic_minutes: Option<u32>
}

impl PlaytimeRow {
    pub fn minutes(&self, namespace: Namespace) -> Option<u32> {
        match namespace {
            Namespace::Classic => self.classic_minutes,
            Namespace::Sequel => self.sequel_minutes
        }
    }
}

/// All tables for one namespace pass, indexed where lookup patterns allow.
#[derive(Default)]
pub struct OverrideTables {
    pub merge_accounts: Vec<MergeAccountsRow>,
    pub unregistered_participants: Vec<UnregisteredParticipantRow>,
    pub arena_double_accounts: Vec<ArenaDoubleAccountRow>,
    pub arena_unregistered: Vec<ArenaUnregisteredRow>,
    pub cross_platform: Vec<CrossPlatformRow>,
    pub custom_seeds: Vec<CustomSeedRow>,
    pub match_overrides_bracket: HashMap<u64, MatchOverrideRow>,
    pub match_overrides_arena: HashMap<u64, MatchOverrideRow>,
    pub player_settings: HashMap<u64, PlayerSettingsRow>,
    pub belts: HashMap<u64, String>,
    pub playtime: HashMap<u64, PlaytimeRow>
}

fn parse_id_list(raw: &str) -> Vec<u64> {
    raw.split(';').filter_map(|id| id.trim().parse().ok()).collect()
}

pub fn parse_merge_accounts<R: std::io::Read>(reader: R) -> Result<Vec<MergeAccountsRow>, csv::Error> {
    csv::Reader::from_reader(reader)
        .deserialize::<MergeAccountsRaw>()
        .map(|raw| raw.map(MergeAccountsRow::from_raw))
        .collect()
}

pub fn parse_arena_double_accounts<R: std::io::Read>(reader: R) -> Result<Vec<ArenaDoubleAccountRow>, csv::Error> {
    csv::Reader::from_reader(reader)
        .deserialize::<ArenaDoubleAccountRaw>()
        .map(|raw| {
            raw.map(|raw| ArenaDoubleAccountRow {
                display_name: raw.display_name,
                user_ids: parse_id_list(&raw.user_ids)
            })
        })
        .collect()
}

pub fn parse_arena_unregistered<R: std::io::Read>(reader: R) -> Result<Vec<ArenaUnregisteredRow>, csv::Error> {
    csv::Reader::from_reader(reader)
        .deserialize::<ArenaUnregisteredRaw>()
        .map(|raw| {
            raw.map(|raw| ArenaUnregisteredRow {
                entrant_ids: parse_id_list(&raw.entrant_ids),
                user_id: raw.user_id,
                display_name: raw.display_name
            })
        })
        .collect()
}

/// Plain `#[derive(Deserialize)]` tables.
pub fn parse_rows<R: std::io::Read, T: serde::de::DeserializeOwned>(reader: R) -> Result<Vec<T>, csv::Error> {
    csv::Reader::from_reader(reader).deserialize().collect()
}

#[cfg(test)]
mod tests {
    use crate::{
        model::structures::platform::Platform,
        source::tables::{
            parse_arena_unregistered, parse_merge_accounts, parse_rows, CrossPlatformRow, MatchOverrideRow,
            MergeAccount
        }
    };

    #[test]
    fn test_parse_merge_accounts_composite_column() {
        let data = "display_name,accounts\nKaiser,kaiser_old:111;kaiser:222\n";
        let rows = parse_merge_accounts(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].display_name, "Kaiser");
        assert_eq!(
            rows[0].accounts,
            vec![
                MergeAccount {
                    platform: Platform::Bracket,
                    handle: "kaiser_old".to_string(),
                    id: 111
                },
                MergeAccount {
                    platform: Platform::Bracket,
                    handle: "kaiser".to_string(),
                    id: 222
                },
            ]
        );
    }

    #[test]
    fn test_parse_merge_accounts_platform_qualified() {
        let data = "display_name,accounts\nToast,toast:111;arena:toasty:222\n";
        let rows = parse_merge_accounts(data.as_bytes()).unwrap();

        assert_eq!(rows[0].accounts[0].platform, Platform::Bracket);
        assert_eq!(rows[0].accounts[1].platform, Platform::Arena);
        assert_eq!(rows[0].accounts[1].id, 222);
    }

    #[test]
    fn test_parse_arena_unregistered_entrant_list() {
        let data = "entrant_ids,user_id,display_name\n10;11;12,,Dockhand\n20,555,Scoot\n";
        let rows = parse_arena_unregistered(data.as_bytes()).unwrap();

        assert_eq!(rows[0].entrant_ids, vec![10, 11, 12]);
        assert_eq!(rows[0].user_id, None);
        assert_eq!(rows[1].entrant_ids, vec![20]);
        assert_eq!(rows[1].user_id, Some(555));
    }

    #[test]
    fn test_parse_cross_platform_optional_columns() {
        let data = "display_name,bracket_account_id,bracket_participant_id,discriminator,arena_user_id,arena_entrant_id\n\
                    Toast,123,,,777,\n";
        let rows: Vec<CrossPlatformRow> = parse_rows(data.as_bytes()).unwrap();

        assert_eq!(rows[0].bracket_account_id, Some(123));
        assert_eq!(rows[0].bracket_participant_id, None);
        assert_eq!(rows[0].arena_user_id, Some(777));
    }

    #[test]
    fn test_parse_match_override_forfeit_flag() {
        let data = "match_id,winner_id,score,forfeited\n900,,,true\n901,42,3-1,false\n";
        let rows: Vec<MatchOverrideRow> = parse_rows(data.as_bytes()).unwrap();

        assert!(rows[0].forfeited);
        assert_eq!(rows[0].winner_id, None);
        assert!(!rows[1].forfeited);
        assert_eq!(rows[1].winner_id, Some(42));
        assert_eq!(rows[1].score.as_deref(), Some("3-1"));
    }
}
