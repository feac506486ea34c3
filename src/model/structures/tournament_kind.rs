use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;

/// Structural shape of a tournament. The numeric tags are part of the
/// encoded tournament output.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TournamentKind {
    /// Single-stage bracket, everyone seeded into one elimination structure.
    SingleStage = 1,
    /// Pooled group stage followed by a bracket. The hosting platform
    /// discards the original global seeds for these, so they are
    /// reconstructed from per-group seeds (see `normalizer::pools`).
    TwoStage = 2,
    RoundRobin = 3
}

impl TryFrom<i32> for TournamentKind {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(TournamentKind::SingleStage),
            2 => Ok(TournamentKind::TwoStage),
            3 => Ok(TournamentKind::RoundRobin),
            _ => Err(())
        }
    }
}
