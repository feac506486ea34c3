use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;

/// One independent ranking space. The classic title's pass is temporally
/// authoritative: it runs first and never reads sequel data, while the
/// sequel pass may seed new players from the classic pass's finalized
/// history (one direction only).
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Namespace {
    Classic = 0,
    Sequel = 1
}

impl Namespace {
    /// Directory name used for per-namespace inputs and outputs.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Namespace::Classic => "classic",
            Namespace::Sequel => "sequel"
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
