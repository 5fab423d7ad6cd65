// src/core/analysis/reverb.rs
//
// RT60 estimation from speech onsets.
//
// Each onset with enough headroom above the noise floor is followed until its level
// has dropped 25 dB; the measured time is extrapolated linearly to a 60 dB decay.
// The median over all onsets is reported so a single odd event cannot skew it.

use log::debug;
use serde::Serialize;
use std::fmt;

use crate::config::ReverbConfig;
use crate::core::cancel::{StageContext, ONSET_CHECK_INTERVAL, SAMPLE_YIELD_INTERVAL};
use crate::core::dsp::{amplitude_to_db, frames_for, median, rms};
use crate::core::error::Result;

/// Qualitative room rating derived from RT60
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReverbLabel {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
    #[serde(rename = "NA")]
    NotApplicable,
}

impl ReverbLabel {
    pub fn from_rt60(rt60_seconds: f64) -> Self {
        match rt60_seconds {
            t if t <= 0.0 => ReverbLabel::NotApplicable,
            t if t < 0.3 => ReverbLabel::Excellent,
            t if t < 0.5 => ReverbLabel::Good,
            t if t < 0.8 => ReverbLabel::Fair,
            t if t < 1.2 => ReverbLabel::Poor,
            _ => ReverbLabel::VeryPoor,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReverbLabel::Excellent => "Very dry room, ideal for speech",
            ReverbLabel::Good => "Slight room sound, acceptable for speech",
            ReverbLabel::Fair => "Noticeable reverberation",
            ReverbLabel::Poor => "Strong reverberation, reduced intelligibility",
            ReverbLabel::VeryPoor => "Very reverberant, speech clarity compromised",
            ReverbLabel::NotApplicable => "Not enough clean decays to measure",
        }
    }
}

impl fmt::Display for ReverbLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReverbLabel::VeryPoor => write!(f, "Very Poor"),
            ReverbLabel::NotApplicable => write!(f, "N/A"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Reverb analysis result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverbAnalysis {
    pub rt60_seconds: f64,
    pub label: ReverbLabel,
    pub description: String,
    /// Onsets found, before the headroom check
    pub onset_count: usize,
    /// Decays that contributed to the median
    pub candidate_count: usize,
}

/// Estimate RT60 on a single channel
pub fn estimate_reverb(
    samples: &[f32],
    sample_rate: u32,
    noise_floor_db: f64,
    config: &ReverbConfig,
    ctx: &mut StageContext<'_, '_>,
) -> Result<ReverbAnalysis> {
    let onset_window = config.onset_window.max(1);
    let decay_window = frames_for(config.decay_window_seconds, sample_rate);
    let max_decay = frames_for(config.max_decay_seconds, sample_rate);
    let min_peak_db = noise_floor_db + config.min_dynamic_range_db;

    ctx.report("Estimating reverberation", 0.0);

    let mut previous_rms = 0.0f64;
    let mut onset_count = 0usize;
    let mut candidates = Vec::new();

    for (index, window) in samples.chunks(onset_window).enumerate() {
        let start = index * onset_window;
        let end = start + window.len();
        if start / SAMPLE_YIELD_INTERVAL != end / SAMPLE_YIELD_INTERVAL {
            ctx.check()?;
            ctx.report("Estimating reverberation", end as f32 / samples.len() as f32);
        }

        let level = rms(window);
        let is_onset = level > config.onset_ratio * previous_rms && level > config.onset_min_rms;
        previous_rms = level;
        if !is_onset {
            continue;
        }

        if onset_count % ONSET_CHECK_INTERVAL == 0 {
            ctx.check()?;
        }
        onset_count += 1;

        let (offset, peak) = window
            .iter()
            .enumerate()
            .fold((0usize, 0.0f32), |best, (i, s)| {
                if s.abs() > best.1 {
                    (i, s.abs())
                } else {
                    best
                }
            });
        let peak_db = amplitude_to_db(peak as f64);
        if peak_db <= min_peak_db {
            continue;
        }

        let peak_index = start + offset;
        if let Some(rt60) = measure_decay(
            samples,
            peak_index,
            peak_db,
            sample_rate,
            decay_window,
            max_decay,
            config.decay_drop_db,
        ) {
            candidates.push(rt60);
        }
    }

    let candidate_count = candidates.len();
    let rt60_seconds = median(&mut candidates).unwrap_or(0.0);
    let label = ReverbLabel::from_rt60(rt60_seconds);

    debug!(
        "reverb: {} onsets, {} decays, RT60 {:.3}s ({})",
        onset_count, candidate_count, rt60_seconds, label
    );
    ctx.report("Reverberation estimated", 1.0);

    Ok(ReverbAnalysis {
        rt60_seconds,
        label,
        description: label.description().to_string(),
        onset_count,
        candidate_count,
    })
}

/// Time for the level after `peak_index` to fall `drop_db` below the peak, scaled to
/// a 60 dB decay
fn measure_decay(
    samples: &[f32],
    peak_index: usize,
    peak_db: f64,
    sample_rate: u32,
    decay_window: usize,
    max_decay: usize,
    drop_db: f64,
) -> Option<f64> {
    let target_db = peak_db - drop_db;
    let limit = (peak_index + max_decay).min(samples.len());

    let mut position = peak_index;
    while position < limit {
        let end = (position + decay_window).min(samples.len());
        if amplitude_to_db(rms(&samples[position..end])) < target_db {
            let seconds = (position - peak_index) as f64 / sample_rate as f64;
            return Some(seconds * 60.0 / drop_db);
        }
        position += decay_window;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cancel::Stage;
    use std::f32::consts::PI;

    const RATE: u32 = 16_000;

    /// Exponentially decaying 1 kHz tone bursts, each starting on an onset window
    fn bursts(time_constants: &[f32]) -> Vec<f32> {
        let spacing = 32 * 1024;
        let mut samples = vec![0.0f32; 8 * 1024 + spacing * time_constants.len()];
        for (k, &tau) in time_constants.iter().enumerate() {
            let start = 8 * 1024 + k * spacing;
            for n in 0..spacing {
                let t = n as f32 / RATE as f32;
                samples[start + n] = 0.5 * (-t / tau).exp() * (2.0 * PI * 1000.0 * t).sin();
            }
        }
        samples
    }

    fn estimate(samples: &[f32]) -> ReverbAnalysis {
        estimate_reverb(
            samples,
            RATE,
            -90.0,
            &ReverbConfig::default(),
            &mut StageContext::standalone(Stage::Reverb),
        )
        .unwrap()
    }

    #[test]
    fn test_labels() {
        assert_eq!(ReverbLabel::from_rt60(0.0), ReverbLabel::NotApplicable);
        assert_eq!(ReverbLabel::from_rt60(0.29), ReverbLabel::Excellent);
        assert_eq!(ReverbLabel::from_rt60(0.3), ReverbLabel::Good);
        assert_eq!(ReverbLabel::from_rt60(0.79), ReverbLabel::Fair);
        assert_eq!(ReverbLabel::from_rt60(1.0), ReverbLabel::Poor);
        assert_eq!(ReverbLabel::from_rt60(1.2), ReverbLabel::VeryPoor);
    }

    #[test]
    fn test_silence_is_not_applicable() {
        let result = estimate(&vec![0.0; RATE as usize * 2]);
        assert_eq!(result.onset_count, 0);
        assert_eq!(result.rt60_seconds, 0.0);
        assert_eq!(result.label, ReverbLabel::NotApplicable);
    }

    #[test]
    fn test_decay_is_measured_per_onset() {
        let result = estimate(&bursts(&[0.05, 0.05, 0.05]));
        assert_eq!(result.onset_count, 3);
        assert_eq!(result.candidate_count, 3);
        assert!(result.rt60_seconds > 0.2 && result.rt60_seconds < 0.4, "{}", result.rt60_seconds);
    }

    #[test]
    fn test_median_ignores_outlier() {
        let normal = estimate(&bursts(&[0.05; 5]));
        let with_outlier = estimate(&bursts(&[0.05, 0.05, 0.05, 0.05, 0.05, 0.5]));
        let outlier_alone = estimate(&bursts(&[0.5]));

        assert_eq!(with_outlier.candidate_count, 6);
        assert!(outlier_alone.rt60_seconds > 2.0);
        assert!((with_outlier.rt60_seconds - normal.rt60_seconds).abs() < 0.05);
        assert_eq!(with_outlier.label, normal.label);
    }

    #[test]
    fn test_quiet_onsets_need_headroom() {
        let samples = bursts(&[0.05, 0.05]);
        let result = estimate_reverb(
            &samples,
            RATE,
            -10.0,
            &ReverbConfig::default(),
            &mut StageContext::standalone(Stage::Reverb),
        )
        .unwrap();

        assert_eq!(result.onset_count, 2);
        assert_eq!(result.candidate_count, 0);
        assert_eq!(result.label, ReverbLabel::NotApplicable);
    }
}
