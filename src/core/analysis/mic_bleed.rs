// src/core/analysis/mic_bleed.rs
//
// Cross-channel microphone bleed on two-speaker recordings.
//
// Only blocks with a clear single speaker (RMS ratio of at least 1.5) are used; the
// quieter channel in such a block is what the dominant speaker leaked into the other
// microphone. Two detectors run over the same blocks:
//
// - Method A (absolute): mean bleed level per direction above -60 dB.
// - Method B (separation): blocks separated by less than 15 dB whose channels are
//   also correlated (|r| > 0.3), i.e. the same voice rather than room noise. Flags
//   when these make up more than 0.5% of all blocks.
//
// Either method flagging means bleed is reported; A catches audible but well separated
// bleed, B catches quiet but poorly separated bleed.

use log::debug;
use serde::Serialize;

use crate::config::MicBleedConfig;
use crate::core::cancel::{StageContext, BLOCK_CHECK_INTERVAL};
use crate::core::dsp::{
    amplitude_to_db, blocks, frames_for, median, pearson_correlation, percentile_sorted, rms,
};
use crate::core::error::Result;

/// Bleed of one speaker into the other microphone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BleedDirection {
    /// Blocks where the source channel dominated
    pub dominant_blocks: usize,
    /// Mean (linear) level of the other channel over those blocks, in dB
    pub average_bleed_db: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MicBleedAnalysis {
    pub detected: bool,
    pub method_a_detected: bool,
    pub method_b_detected: bool,
    /// Left speaker heard on the right channel
    pub left_to_right: BleedDirection,
    /// Right speaker heard on the left channel
    pub right_to_left: BleedDirection,
    pub median_separation_db: Option<f64>,
    /// Separation of the worst 10% of dominant blocks
    pub worst_separation_db: Option<f64>,
    pub concerning_blocks: usize,
    pub confirmed_blocks: usize,
    pub total_blocks: usize,
    pub confirmed_percentage: f64,
}

#[derive(Default)]
struct DirectionAccumulator {
    blocks: usize,
    bleed_rms_sum: f64,
}

impl DirectionAccumulator {
    fn push(&mut self, bleed_rms: f64) {
        self.blocks += 1;
        self.bleed_rms_sum += bleed_rms;
    }

    fn finish(&self) -> BleedDirection {
        let average = if self.blocks == 0 {
            0.0
        } else {
            self.bleed_rms_sum / self.blocks as f64
        };
        BleedDirection {
            dominant_blocks: self.blocks,
            average_bleed_db: amplitude_to_db(average),
        }
    }
}

pub fn detect_mic_bleed(
    left: &[f32],
    right: &[f32],
    sample_rate: u32,
    config: &MicBleedConfig,
    ctx: &mut StageContext<'_, '_>,
) -> Result<MicBleedAnalysis> {
    let block = frames_for(config.block_seconds, sample_rate);
    let len = left.len().min(right.len());
    let total_blocks = len.div_ceil(block);

    ctx.report("Detecting mic bleed", 0.0);

    let mut left_to_right = DirectionAccumulator::default();
    let mut right_to_left = DirectionAccumulator::default();
    let mut separations = Vec::new();
    let mut concerning_blocks = 0usize;
    let mut confirmed_blocks = 0usize;

    for (index, range) in blocks(len, block).enumerate() {
        if index % BLOCK_CHECK_INTERVAL == 0 {
            ctx.check()?;
            ctx.report("Detecting mic bleed", index as f32 / total_blocks as f32);
        }

        let (block_left, block_right) = (&left[range.clone()], &right[range]);
        let rms_left = rms(block_left);
        let rms_right = rms(block_right);
        if rms_left < config.silence_rms && rms_right < config.silence_rms {
            continue;
        }

        let (dominant_rms, bleed_rms) = if rms_left > config.dominance_ratio * rms_right {
            left_to_right.push(rms_right);
            (rms_left, rms_right)
        } else if rms_right > config.dominance_ratio * rms_left {
            right_to_left.push(rms_left);
            (rms_right, rms_left)
        } else {
            continue;
        };

        let separation = amplitude_to_db(dominant_rms) - amplitude_to_db(bleed_rms);
        separations.push(separation);

        if separation < config.concerning_separation_db {
            concerning_blocks += 1;
            let correlation = pearson_correlation(block_left, block_right).abs();
            if correlation > config.correlation_threshold {
                confirmed_blocks += 1;
            }
        }
    }

    let left_to_right = left_to_right.finish();
    let right_to_left = right_to_left.finish();
    let method_a_detected = left_to_right.average_bleed_db > config.absolute_threshold_db
        || right_to_left.average_bleed_db > config.absolute_threshold_db;

    let confirmed_percentage = if total_blocks == 0 {
        0.0
    } else {
        confirmed_blocks as f64 / total_blocks as f64 * 100.0
    };
    let method_b_detected = confirmed_percentage > config.confirmed_fraction * 100.0;

    // Silent bleed against a speaking channel gives +inf separations; they sort last
    let median_separation_db = median(&mut separations);
    let worst_separation_db = percentile_sorted(&separations, config.worst_percentile);

    let detected = method_a_detected || method_b_detected;
    debug!(
        "mic bleed: A {} (L->R {:.1} dB, R->L {:.1} dB), B {} ({} of {} blocks confirmed)",
        method_a_detected,
        left_to_right.average_bleed_db,
        right_to_left.average_bleed_db,
        method_b_detected,
        confirmed_blocks,
        total_blocks
    );
    ctx.report("Mic bleed detected", 1.0);

    Ok(MicBleedAnalysis {
        detected,
        method_a_detected,
        method_b_detected,
        left_to_right,
        right_to_left,
        median_separation_db,
        worst_separation_db,
        concerning_blocks,
        confirmed_blocks,
        total_blocks,
        confirmed_percentage,
    })
}
