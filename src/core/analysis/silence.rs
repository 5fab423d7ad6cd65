// src/core/analysis/silence.rs
//
// Leading, trailing and longest internal silence.
//
// The threshold sits a quarter of the way from the noise floor to the peak. Audio is
// classified in 50 ms chunks, then short bursts of sound (clicks, breaths, handling
// noise under 150 ms) are folded back into silence before the runs are measured.

use log::debug;
use serde::Serialize;

use crate::config::SilenceConfig;
use crate::core::buffer::SampleBuffer;
use crate::core::cancel::{StageContext, CHUNK_CHECK_INTERVAL};
use crate::core::dsp::{blocks, db_to_amplitude, frames_for, peak_amplitude};
use crate::core::error::Result;

/// Silence analysis result (seconds)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SilenceAnalysis {
    pub leading_seconds: f64,
    pub trailing_seconds: f64,
    pub longest_gap_seconds: f64,
    pub threshold_db: f64,
}

/// Threshold between noise floor and peak, in dB
pub fn silence_threshold_db(peak_db: f64, noise_floor_db: f64, fraction: f64) -> f64 {
    let range = peak_db - noise_floor_db;
    // NaN (both infinite) and negative ranges collapse to the floor
    let range = if range > 0.0 { range } else { 0.0 };
    noise_floor_db + fraction * range
}

pub fn analyze_silence(
    buffer: &SampleBuffer,
    peak_db: f64,
    noise_floor_db: f64,
    config: &SilenceConfig,
    ctx: &mut StageContext<'_, '_>,
) -> Result<SilenceAnalysis> {
    let threshold_db = silence_threshold_db(peak_db, noise_floor_db, config.threshold_fraction);
    let threshold = db_to_amplitude(threshold_db) as f32;
    let chunk = frames_for(config.chunk_seconds, buffer.sample_rate());
    let frames = buffer.frame_count();
    let chunk_count = frames.div_ceil(chunk);

    ctx.report("Detecting silence", 0.0);

    let mut sound = Vec::with_capacity(chunk_count);
    for (index, range) in blocks(frames, chunk).enumerate() {
        if index % CHUNK_CHECK_INTERVAL == 0 {
            ctx.check()?;
            ctx.report("Detecting silence", index as f32 / chunk_count as f32);
        }
        let loud = buffer
            .channels()
            .iter()
            .any(|samples| peak_amplitude(&samples[range.clone()]) > threshold);
        sound.push(loud);
    }

    let min_sound_chunks = (config.min_sound_seconds / config.chunk_seconds).round() as usize;
    remove_short_islands(&mut sound, min_sound_chunks);

    let runs = silence_runs(&sound);
    let rate = buffer.sample_rate() as f64;
    let to_seconds = |chunks: usize| (chunks * chunk).min(frames) as f64 / rate;

    let result = if sound.iter().all(|&s| !s) {
        let duration = buffer.duration_secs();
        SilenceAnalysis {
            leading_seconds: duration,
            trailing_seconds: duration,
            longest_gap_seconds: 0.0,
            threshold_db,
        }
    } else {
        let leading = runs
            .first()
            .filter(|run| run.start == 0)
            .map_or(0.0, |run| to_seconds(run.len));
        let trailing = runs
            .last()
            .filter(|run| run.start + run.len == sound.len())
            // The final chunk may be partial
            .map_or(0.0, |run| (frames - run.start * chunk) as f64 / rate);
        let longest_gap = runs
            .iter()
            .filter(|run| run.start > 0 && run.start + run.len < sound.len())
            .map(|run| to_seconds(run.len))
            .fold(0.0, f64::max);

        SilenceAnalysis {
            leading_seconds: leading,
            trailing_seconds: trailing,
            longest_gap_seconds: longest_gap,
            threshold_db,
        }
    };

    debug!(
        "silence: threshold {:.1} dB, leading {:.2}s, trailing {:.2}s, longest gap {:.2}s",
        threshold_db, result.leading_seconds, result.trailing_seconds, result.longest_gap_seconds
    );
    ctx.report("Silence detected", 1.0);

    Ok(result)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    start: usize,
    len: usize,
}

/// Reclassify sound runs shorter than `min_len` chunks as silence
fn remove_short_islands(sound: &mut [bool], min_len: usize) {
    let mut i = 0;
    while i < sound.len() {
        if !sound[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < sound.len() && sound[i] {
            i += 1;
        }
        if i - start < min_len {
            sound[start..i].iter_mut().for_each(|s| *s = false);
        }
    }
}

fn silence_runs(sound: &[bool]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut current: Option<Run> = None;
    for (index, &loud) in sound.iter().enumerate() {
        if loud {
            runs.extend(current.take());
        } else if let Some(run) = current.as_mut() {
            run.len += 1;
        } else {
            current = Some(Run { start: index, len: 1 });
        }
    }
    runs.extend(current);
    runs
}
