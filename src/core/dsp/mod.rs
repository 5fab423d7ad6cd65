//! Digital Signal Processing utilities

pub mod stats;

pub use stats::{
    amplitude_to_db, db_to_amplitude, median, peak_amplitude, pearson_correlation,
    percentile_sorted, rms,
};

use std::ops::Range;

/// Split `len` frames into consecutive blocks of `block_len`.
///
/// The final block may be shorter. A zero `block_len` is treated as one frame.
pub fn blocks(len: usize, block_len: usize) -> impl Iterator<Item = Range<usize>> {
    let block_len = block_len.max(1);
    (0..len)
        .step_by(block_len)
        .map(move |start| start..(start + block_len).min(len))
}

/// Frame count for a duration at the given rate (at least one frame)
pub fn frames_for(seconds: f64, sample_rate: u32) -> usize {
    ((seconds * sample_rate as f64).round() as usize).max(1)
}
