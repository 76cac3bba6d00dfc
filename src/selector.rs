//! Deterministic word-of-day selection.
//!
//! Every replica must land on the same word for the same calendar day
//! without coordinating, so the whole pipeline is a pure function of the
//! day key: hash it, seed a fresh generator, draw once. Nothing here reads
//! process-local entropy or reuses generator state between calls.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::AppError;

/// 32-bit polynomial rolling hash (`h = h * 31 + byte`) over the UTF-8
/// bytes of `day_key`, with unsigned wraparound.
///
/// A fixed algorithm rather than `DefaultHasher`, whose output is
/// randomized per process and would break cross-replica agreement.
pub fn day_hash(day_key: &str) -> u32 {
    day_key
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)))
}

/// Picks the day's offset into a population of `population` words,
/// uniformly in `[0, population)`.
pub fn select(day_key: &str, population: i64) -> Result<i64, AppError> {
    if population <= 0 {
        return Err(AppError::InvalidPopulation);
    }

    let mut rng = StdRng::seed_from_u64(u64::from(day_hash(day_key)));

    Ok(rng.random_range(0..population))
}
