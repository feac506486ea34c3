// Rating model constants
pub const DEFAULT_RATING: f64 = 1500.0;
pub const DEFAULT_DEVIATION: f64 = 200.0;
pub const DEFAULT_VOLATILITY: f64 = 0.06;
// "Reasonable choices are between 0.3 and 1.2" (Glickman); lower values
// keep volatility changes conservative.
pub const TAU: f64 = 0.5;
// Glicko-2 scale factor between display ratings and the internal scale.
pub const GLICKO_SCALE: f64 = 173.7178;

// Seeding policy constants
pub const SEED_DEVIATION_FLOOR: f64 = 150.0;
pub const ENTRY_SERIES_RATING: f64 = 1250.0;
pub const ENTRY_SERIES_DEVIATION: f64 = 150.0;
// URL fragments marking the designated entry-level tournament series.
pub const ENTRY_SERIES_URL_MARKERS: &[&str] = &["rookie", "newcomer", "dojo"];

// Ranking constants
pub const LCB_DEVIATION_MULTIPLIER: f64 = 2.0;
pub const MIN_RANKED_EVENTS_SEQUEL: usize = 5;
pub const MIN_RANKED_EVENTS_CLASSIC: usize = 2;

// Normalizer constants
pub const DQ_SCORE_MARKER: &str = "DQ";

// Encoder constants
pub const SHORT_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
pub const VOLATILITY_BASELINE: f64 = DEFAULT_VOLATILITY;
