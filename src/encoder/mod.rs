pub mod matches;
pub mod players;
pub mod short_id;
pub mod tournaments;

use crate::model::constants::VOLATILITY_BASELINE;

/// Shortened rating stats: rating and deviation rounded to integers,
/// volatility as the offset from the baseline in 1e-4 steps (volatility
/// barely moves, so the offset is a small integer).
pub fn shorten_stats(rating: f64, deviation: f64, volatility: f64) -> (i64, i64, i64) {
    (
        rating.round() as i64,
        deviation.round() as i64,
        ((volatility / VOLATILITY_BASELINE - 1.0) * 10_000.0).round() as i64
    )
}

/// The three independently loadable byte buffers of one namespace export.
pub struct EncodedOutputs {
    pub players: Vec<u8>,
    pub matches: Vec<u8>,
    pub tournaments: Vec<u8>
}
