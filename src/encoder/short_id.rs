use chrono::{DateTime, Utc};

use crate::model::constants::SHORT_ID_ALPHABET;

/// Re-expresses a large monotonically-growing id in a 64-symbol alphabet,
/// most significant digit first. Purely textual shrinkage ahead of
/// general-purpose compression; the consuming side reverses it.
pub fn encode_id(mut n: u64) -> String {
    if n == 0 {
        return "A".to_string();
    }

    let mut digits = Vec::new();
    while n > 0 {
        digits.push(SHORT_ID_ALPHABET[(n % 64) as usize]);
        n /= 64;
    }
    digits.reverse();

    String::from_utf8(digits).expect("alphabet is ASCII")
}

/// Timestamps are encoded as epoch milliseconds in the same alphabet.
pub fn encode_timestamp(date: &DateTime<Utc>) -> String {
    encode_id(date.timestamp_millis().max(0) as u64)
}
