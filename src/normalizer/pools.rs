use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::source::raw::{BracketMatch, BracketParticipant};

/// Reconstruction of global seeds for two-stage (pooled) tournaments.
///
/// The hosting platform reseeds everyone once the bracket stage starts and
/// discards the original global seed, but the group-stage schedule is a
/// fixed function of the per-group seeds: match `k` of a group of size `n`
/// is always played between the same two group seeds. Walking that schedule
/// backwards from a player's first group match recovers their group seed,
/// and the group seed plus snake-order group assignment recovers the
/// original global seed.
lazy_static! {
    static ref ROUND_ROBIN_PAIRINGS: HashMap<usize, Vec<(u32, u32)>> = {
        let mut m = HashMap::new();
        for size in 2..=8 {
            m.insert(size, circle_schedule(size));
        }
        m
    };
}

/// Round-robin schedule for `n` group seeds, circle method with seed 1
/// fixed, round-major order. Odd sizes get a rotating bye.
fn circle_schedule(n: usize) -> Vec<(u32, u32)> {
    let mut rotation: Vec<u32> = (1..=n as u32).collect();
    if n % 2 == 1 {
        rotation.push(0); // bye marker
    }

    let slots = rotation.len();
    let mut schedule = Vec::new();

    for _ in 0..slots - 1 {
        for i in 0..slots / 2 {
            let a = rotation[i];
            let b = rotation[slots - 1 - i];
            if a != 0 && b != 0 {
                schedule.push((a, b));
            }
        }

        let last = rotation.pop().unwrap();
        rotation.insert(1, last);
    }

    schedule
}

/// The two group seeds playing match `match_index` in a group of
/// `group_size`, `slot` 0 for the first listed player.
pub fn group_seed(group_size: usize, match_index: usize, slot: usize) -> Option<u32> {
    let pairing = ROUND_ROBIN_PAIRINGS.get(&group_size)?.get(match_index)?;
    match slot {
        0 => Some(pairing.0),
        1 => Some(pairing.1),
        _ => None
    }
}

/// Snake-order mapping from (group seed, group) back to the global seed:
/// odd group seeds were dealt left-to-right across groups, even ones
/// right-to-left.
pub fn global_seed(group_seed: u32, group_count: u32, group_number: u32) -> u32 {
    group_count * (group_seed - 1)
        + if group_seed % 2 == 1 {
            group_number
        } else {
            group_count - group_number + 1
        }
}

fn identifier_index(identifier: &str) -> Option<usize> {
    let c = identifier.chars().next()?;
    if c.is_ascii_uppercase() {
        Some((c as u8 - b'A') as usize)
    } else {
        None
    }
}

/// Recovers the global seed for one participant of a two-stage tournament.
/// `group_ids` must be sorted ascending; `group_sizes` is keyed by group id.
/// Returns `None` when the schedule cannot be walked back (no group member
/// id, no group match found, unknown group size) — the caller keeps the
/// platform seed in that case.
pub fn reconstruct_global_seed(
    participant: &BracketParticipant,
    matches: &[BracketMatch],
    group_ids: &[u64],
    group_sizes: &HashMap<u64, usize>
) -> Option<u32> {
    let member_id = *participant.group_member_ids.first()?;
    let first_match = matches
        .iter()
        .find(|m| m.player1_id == Some(member_id) || m.player2_id == Some(member_id))?;

    let group_id = first_match.group_id?;
    let group_number = group_ids.iter().position(|g| *g == group_id)? as u32 + 1;
    let match_index = match first_match.play_order {
        Some(order) => (order as usize).checked_sub(1)?,
        None => identifier_index(first_match.identifier.as_deref()?)?
    };
    let slot = if first_match.player1_id == Some(member_id) { 0 } else { 1 };

    let group_size = *group_sizes.get(&group_id)?;
    let seed_in_group = group_seed(group_size, match_index, slot)?;

    Some(global_seed(seed_in_group, group_ids.len() as u32, group_number))
}
