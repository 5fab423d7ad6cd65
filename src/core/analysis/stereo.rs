// src/core/analysis/stereo.rs
//
// Stereo separation: how the speech is distributed between the two channels.
//
// The pair is cut into 250 ms blocks; each non-silent block is left-dominant,
// right-dominant or balanced depending on the RMS ratio. The shares of each kind
// decide the layout label.

use log::debug;
use serde::Serialize;
use std::fmt;

use crate::config::StereoConfig;
use crate::core::cancel::{StageContext, BLOCK_CHECK_INTERVAL};
use crate::core::dsp::{blocks, frames_for, rms};
use crate::core::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StereoType {
    #[serde(rename = "Mono as Stereo")]
    MonoAsStereo,
    #[serde(rename = "Conversational Stereo")]
    Conversational,
    #[serde(rename = "Mono in Left Channel")]
    MonoLeft,
    #[serde(rename = "Mono in Right Channel")]
    MonoRight,
    #[serde(rename = "Mixed Stereo")]
    Mixed,
    Silent,
}

impl StereoType {
    pub fn label(&self) -> &'static str {
        match self {
            StereoType::MonoAsStereo => "Mono as Stereo",
            StereoType::Conversational => "Conversational Stereo",
            StereoType::MonoLeft => "Mono in Left Channel",
            StereoType::MonoRight => "Mono in Right Channel",
            StereoType::Mixed => "Mixed Stereo",
            StereoType::Silent => "Silent",
        }
    }
}

impl fmt::Display for StereoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stereo separation result. Fractions are over non-silent blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StereoAnalysis {
    pub stereo_type: StereoType,
    pub confidence: f64,
    pub left_fraction: f64,
    pub right_fraction: f64,
    pub balanced_fraction: f64,
    pub total_blocks: usize,
    pub silent_blocks: usize,
    pub left_blocks: usize,
    pub right_blocks: usize,
    pub balanced_blocks: usize,
}

/// Classify the layout of a stereo pair
pub fn analyze_stereo(
    left: &[f32],
    right: &[f32],
    sample_rate: u32,
    config: &StereoConfig,
    ctx: &mut StageContext<'_, '_>,
) -> Result<StereoAnalysis> {
    let block = frames_for(config.block_seconds, sample_rate);
    let len = left.len().min(right.len());
    let total_blocks = len.div_ceil(block);

    ctx.report("Analyzing stereo separation", 0.0);

    let (mut silent, mut left_blocks, mut right_blocks, mut balanced) = (0, 0, 0, 0);
    for (index, range) in blocks(len, block).enumerate() {
        if index % BLOCK_CHECK_INTERVAL == 0 {
            ctx.check()?;
            ctx.report(
                "Analyzing stereo separation",
                index as f32 / total_blocks as f32,
            );
        }

        let rms_left = rms(&left[range.clone()]);
        let rms_right = rms(&right[range]);
        if rms_left < config.silence_rms && rms_right < config.silence_rms {
            silent += 1;
            continue;
        }

        // rms_right may be zero here; the ratio is then infinite and left-dominant
        let ratio = rms_left / rms_right;
        if ratio > config.dominance_ratio {
            left_blocks += 1;
        } else if ratio < 1.0 / config.dominance_ratio {
            right_blocks += 1;
        } else {
            balanced += 1;
        }
    }

    let active = (total_blocks - silent) as f64;
    let fraction = |count: usize| if active > 0.0 { count as f64 / active } else { 0.0 };
    let (left_fraction, right_fraction, balanced_fraction) =
        (fraction(left_blocks), fraction(right_blocks), fraction(balanced));

    let (stereo_type, confidence) = if active == 0.0 {
        (StereoType::Silent, 1.0)
    } else if balanced_fraction > config.mono_fraction {
        (StereoType::MonoAsStereo, balanced_fraction)
    } else if left_fraction > config.conversational_fraction
        && right_fraction > config.conversational_fraction
    {
        (
            StereoType::Conversational,
            (left_fraction + right_fraction).min(1.0),
        )
    } else if left_fraction > config.mono_fraction {
        (StereoType::MonoLeft, left_fraction)
    } else if right_fraction > config.mono_fraction {
        (StereoType::MonoRight, right_fraction)
    } else {
        (StereoType::Mixed, 1.0 - balanced_fraction)
    };

    debug!(
        "stereo: {} ({:.2}), L {:.2} R {:.2} B {:.2}, {} of {} blocks silent",
        stereo_type, confidence, left_fraction, right_fraction, balanced_fraction, silent, total_blocks
    );
    ctx.report("Stereo separation analyzed", 1.0);

    Ok(StereoAnalysis {
        stereo_type,
        confidence,
        left_fraction,
        right_fraction,
        balanced_fraction,
        total_blocks,
        silent_blocks: silent,
        left_blocks,
        right_blocks,
        balanced_blocks: balanced,
    })
}
