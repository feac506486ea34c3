use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::EnumIter;

/// Source platform a tournament was hosted on. The numeric tags are part of
/// the encoded output format and must not be reordered.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[repr(u8)]
pub enum Platform {
    /// Standings/sets platform: events expose entrants and per-set results.
    Arena = 0,
    /// Bracket platform: tournaments expose participants and bracket matches.
    Bracket = 1,
    /// Manually authored tournament records.
    Custom = 2
}

impl TryFrom<i32> for Platform {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Platform::Arena),
            1 => Ok(Platform::Bracket),
            2 => Ok(Platform::Custom),
            _ => Err(())
        }
    }
}
