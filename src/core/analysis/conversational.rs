// src/core/analysis/conversational.rs
//
// Overlap and channel consistency for two-speaker ("Conversational Stereo") material.
//
// A channel is speaking in a block when its level is more than `speech_above_noise_db`
// over the noise floor. There is no interjection filtering and no bleed awareness, so
// a loud bleed can read as overlap; thresholds live in `ConversationalConfig`.

use log::debug;
use serde::Serialize;

use crate::config::ConversationalConfig;
use crate::core::cancel::{StageContext, BLOCK_CHECK_INTERVAL};
use crate::core::dsp::{amplitude_to_db, blocks, frames_for, rms};
use crate::core::error::Result;

/// A stretch where both speakers talk at once
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapSegment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationalAnalysis {
    pub speech_threshold_db: f64,
    /// Overlap blocks over blocks with any speech
    pub overlap_percentage: f64,
    pub overlap_seconds: f64,
    pub segments: Vec<OverlapSegment>,
    /// Single-speaker blocks where the speaking channel is also clearly louder.
    /// `None` without any single-speaker block.
    pub channel_consistency_percentage: Option<f64>,
    pub left_active_seconds: f64,
    pub right_active_seconds: f64,
    pub speech_blocks: usize,
    pub overlap_blocks: usize,
    pub total_blocks: usize,
}

pub fn analyze_conversation(
    left: &[f32],
    right: &[f32],
    sample_rate: u32,
    noise_floor_db: f64,
    config: &ConversationalConfig,
    ctx: &mut StageContext<'_, '_>,
) -> Result<ConversationalAnalysis> {
    let block = frames_for(config.block_seconds, sample_rate);
    let len = left.len().min(right.len());
    let total_blocks = len.div_ceil(block);
    let rate = sample_rate as f64;
    let threshold_db = noise_floor_db + config.speech_above_noise_db;

    ctx.report("Analyzing conversation", 0.0);

    let mut speech_blocks = 0usize;
    let mut overlap_blocks = 0usize;
    let mut single_blocks = 0usize;
    let mut consistent_blocks = 0usize;
    let mut left_active = 0usize;
    let mut right_active = 0usize;
    let mut segments = Vec::new();
    let mut open: Option<(usize, usize)> = None;

    for (index, range) in blocks(len, block).enumerate() {
        if index % BLOCK_CHECK_INTERVAL == 0 {
            ctx.check()?;
            ctx.report("Analyzing conversation", index as f32 / total_blocks as f32);
        }

        let frames = range.len();
        let rms_left = rms(&left[range.clone()]);
        let rms_right = rms(&right[range.clone()]);
        let left_speaks = amplitude_to_db(rms_left) > threshold_db;
        let right_speaks = amplitude_to_db(rms_right) > threshold_db;

        if left_speaks {
            left_active += frames;
        }
        if right_speaks {
            right_active += frames;
        }
        if left_speaks || right_speaks {
            speech_blocks += 1;
        }

        if left_speaks && right_speaks {
            overlap_blocks += 1;
            open = Some(match open {
                Some((start, _)) => (start, range.end),
                None => (range.start, range.end),
            });
            continue;
        }
        segments.extend(open.take());

        if left_speaks != right_speaks {
            single_blocks += 1;
            let (active, other) = if left_speaks {
                (rms_left, rms_right)
            } else {
                (rms_right, rms_left)
            };
            if active >= config.consistency_ratio * other {
                consistent_blocks += 1;
            }
        }
    }
    segments.extend(open);

    let segments: Vec<OverlapSegment> = segments
        .into_iter()
        .map(|(start, end)| OverlapSegment {
            start_seconds: start as f64 / rate,
            end_seconds: end as f64 / rate,
            duration_seconds: (end - start) as f64 / rate,
        })
        .filter(|segment| segment.duration_seconds >= config.min_overlap_seconds)
        .collect();

    let overlap_percentage = if speech_blocks == 0 {
        0.0
    } else {
        overlap_blocks as f64 / speech_blocks as f64 * 100.0
    };
    let channel_consistency_percentage = (single_blocks > 0)
        .then(|| consistent_blocks as f64 / single_blocks as f64 * 100.0);
    let overlap_seconds = segments.iter().map(|s| s.duration_seconds).sum();

    debug!(
        "conversation: threshold {:.1} dB, overlap {:.1}% in {} segments, consistency {:?}",
        threshold_db,
        overlap_percentage,
        segments.len(),
        channel_consistency_percentage
    );
    ctx.report("Conversation analyzed", 1.0);

    Ok(ConversationalAnalysis {
        speech_threshold_db: threshold_db,
        overlap_percentage,
        overlap_seconds,
        segments,
        channel_consistency_percentage,
        left_active_seconds: left_active as f64 / rate,
        right_active_seconds: right_active as f64 / rate,
        speech_blocks,
        overlap_blocks,
        total_blocks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cancel::Stage;

    const RATE: u32 = 1_000; // 250 frames per block

    fn pair(levels: &[(f32, f32)]) -> (Vec<f32>, Vec<f32>) {
        let left = levels
            .iter()
            .flat_map(|&(l, _)| std::iter::repeat(l).take(250))
            .collect();
        let right = levels
            .iter()
            .flat_map(|&(_, r)| std::iter::repeat(r).take(250))
            .collect();
        (left, right)
    }

    /// 'L' left talks, 'R' right talks, 'B' both, '.' nobody
    fn pattern(blocks: &str) -> Vec<(f32, f32)> {
        blocks
            .chars()
            .map(|c| match c {
                'L' => (0.3, 0.0),
                'R' => (0.0, 0.3),
                'B' => (0.3, 0.3),
                _ => (0.0, 0.0),
            })
            .collect()
    }

    fn analyze_with(levels: &[(f32, f32)], config: &ConversationalConfig) -> ConversationalAnalysis {
        let (left, right) = pair(levels);
        // Threshold at -60 dB
        analyze_conversation(
            &left,
            &right,
            RATE,
            -80.0,
            config,
            &mut StageContext::standalone(Stage::Conversational),
        )
        .unwrap()
    }

    fn analyze(levels: &[(f32, f32)]) -> ConversationalAnalysis {
        analyze_with(levels, &ConversationalConfig::default())
    }

    #[test]
    fn test_overlap_segments() {
        let result = analyze(&pattern("LLBBRR..LB"));

        assert_eq!(result.speech_blocks, 8);
        assert_eq!(result.overlap_blocks, 3);
        assert!((result.overlap_percentage - 37.5).abs() < 1e-9);
        assert_eq!(result.segments.len(), 2);
        assert!((result.segments[0].start_seconds - 0.5).abs() < 1e-9);
        assert!((result.segments[0].end_seconds - 1.0).abs() < 1e-9);
        assert!((result.segments[1].start_seconds - 2.25).abs() < 1e-9);
        assert!((result.segments[1].duration_seconds - 0.25).abs() < 1e-9);
        assert!((result.overlap_seconds - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_short_overlaps_can_be_ignored() {
        let config = ConversationalConfig {
            min_overlap_seconds: 0.3,
            ..ConversationalConfig::default()
        };
        let result = analyze_with(&pattern("LLBBRR..LB"), &config);

        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.overlap_blocks, 3);
    }

    #[test]
    fn test_active_seconds_per_channel() {
        let result = analyze(&pattern("LLLBRR.."));
        assert!((result.left_active_seconds - 1.0).abs() < 1e-9);
        assert!((result.right_active_seconds - 0.75).abs() < 1e-9);
        assert_eq!(result.total_blocks, 8);
    }

    #[test]
    fn test_consistency() {
        // Left barely above threshold and only 1.33x louder than right: inconsistent
        let mut levels = pattern("LLRR");
        levels.push((0.0012, 0.0009));
        let result = analyze(&levels);

        assert_eq!(result.overlap_blocks, 0);
        assert!((result.channel_consistency_percentage.unwrap() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_speech() {
        let result = analyze(&pattern("...."));
        assert_eq!(result.overlap_percentage, 0.0);
        assert!(result.segments.is_empty());
        assert_eq!(result.channel_consistency_percentage, None);
    }
}
