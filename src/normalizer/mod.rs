pub mod arena;
pub mod bracket;
pub mod custom;
pub mod pools;

use crate::{model::domain::Tournament, source::loader::NamespaceInputs};

/// Normalizes every payload family into the uniform tournament shape and
/// orders the result for replay. Ordering is chronological with the id as
/// a tie-break so reruns over fixed inputs replay identically.
pub fn normalize_all(inputs: &NamespaceInputs) -> Vec<Tournament> {
    let mut all = Vec::new();
    all.extend(bracket::normalize_bracket(
        &inputs.bracket_tournaments,
        &inputs.tables.match_overrides_bracket
    ));
    all.extend(arena::normalize_arena(&inputs.arena_events, &inputs.tables.match_overrides_arena));
    all.extend(custom::normalize_custom(&inputs.custom_tournaments));

    all.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    all
}
