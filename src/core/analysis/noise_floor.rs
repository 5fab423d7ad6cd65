// src/core/analysis/noise_floor.rs
//
// Noise floor estimation.
//
// Two independent estimators run over all channels:
//
// - Quantile RMS: split each channel into ~100 windows, pool the window RMS values
//   across channels and average the quietest 20%. Cheap, always computed.
// - Histogram mode: fixed 50 ms windows (sized against a 44.1 kHz reference rate so
//   bins mean the same thing at every rate), RMS in dB clamped at -100 dB, binned into
//   1 dB buckets. The centre of the fullest bucket is the floor. Robust against
//   recordings dominated by loud speech; reverb and silence analysis depend on it.

use log::debug;
use serde::Serialize;

use crate::config::NoiseFloorConfig;
use crate::core::buffer::SampleBuffer;
use crate::core::cancel::{StageContext, SAMPLE_YIELD_INTERVAL, WINDOW_CHECK_INTERVAL};
use crate::core::dsp::{amplitude_to_db, rms};
use crate::core::error::Result;

/// Noise floor estimates in dBFS
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoiseFloorAnalysis {
    /// Quantile-RMS estimate, negative infinity for digital silence
    pub quantile_db: f64,
    /// Histogram-mode estimate, when requested
    pub histogram_db: Option<f64>,
}

/// Run the quantile estimator and, when `with_histogram` is set, the histogram one.
///
/// Stage-local progress: quantile [0, 0.5], histogram [0.5, 1].
pub fn estimate_noise_floor(
    buffer: &SampleBuffer,
    config: &NoiseFloorConfig,
    with_histogram: bool,
    ctx: &mut StageContext<'_, '_>,
) -> Result<NoiseFloorAnalysis> {
    let quantile_db = quantile_noise_floor(buffer, config, ctx)?;
    let histogram_db = if with_histogram {
        histogram_noise_floor(buffer, config, ctx)?
    } else {
        None
    };

    debug!(
        "noise floor: quantile {:.1} dB, histogram {:?}",
        quantile_db, histogram_db
    );

    Ok(NoiseFloorAnalysis {
        quantile_db,
        histogram_db,
    })
}

/// Average RMS of the quietest windows, in dB
pub fn quantile_noise_floor(
    buffer: &SampleBuffer,
    config: &NoiseFloorConfig,
    ctx: &mut StageContext<'_, '_>,
) -> Result<f64> {
    let window_count = config.quantile_window_count.max(1);
    let window = (buffer.frame_count() / window_count).max(1);
    let mut levels = Vec::with_capacity(window_count * buffer.channel_count());

    ctx.report("Estimating noise floor", 0.0);

    let total = (window * window_count * buffer.channel_count()).max(1);
    let mut processed = 0usize;
    let mut scanned = 0usize;
    for samples in buffer.channels() {
        for chunk in samples.chunks_exact(window).take(window_count) {
            if processed % WINDOW_CHECK_INTERVAL == 0 {
                ctx.check()?;
            }
            levels.push(rms(chunk));
            processed += 1;

            // Windows can be long, so progress follows samples rather than windows
            let before = scanned;
            scanned += chunk.len();
            if before / SAMPLE_YIELD_INTERVAL != scanned / SAMPLE_YIELD_INTERVAL {
                ctx.check()?;
                ctx.report("Estimating noise floor", 0.5 * scanned as f32 / total as f32);
            }
        }
    }

    levels.sort_by(|a, b| a.total_cmp(b));
    let quiet_count = ((levels.len() as f64 * config.quantile_fraction).floor() as usize)
        .max(1)
        .min(levels.len());
    let average = if quiet_count == 0 {
        0.0
    } else {
        levels[..quiet_count].iter().sum::<f64>() / quiet_count as f64
    };

    ctx.report("Estimating noise floor", 0.5);
    Ok(amplitude_to_db(average))
}

/// Mode of the per-window level distribution, in dB.
///
/// Returns `None` only when no window could be formed.
pub fn histogram_noise_floor(
    buffer: &SampleBuffer,
    config: &NoiseFloorConfig,
    ctx: &mut StageContext<'_, '_>,
) -> Result<Option<f64>> {
    let window = ((config.histogram_window_seconds * config.histogram_reference_rate as f64)
        .round() as usize)
        .max(1);
    let bins = config.histogram_bins.max(1);
    let floor_db = config.histogram_floor_db;
    let bin_width = -floor_db / bins as f64;
    let mut histogram = vec![0usize; bins];

    let windows_per_channel = (buffer.frame_count() / window).max(1);
    let total_windows = (windows_per_channel * buffer.channel_count()).max(1);
    let mut processed = 0usize;

    for samples in buffer.channels() {
        // Channels shorter than one window still contribute one measurement
        let channel_window = window.min(samples.len()).max(1);

        for chunk in samples.chunks_exact(channel_window) {
            if processed % WINDOW_CHECK_INTERVAL == 0 {
                ctx.check()?;
                ctx.report(
                    "Building level histogram",
                    0.5 + 0.5 * processed as f32 / total_windows as f32,
                );
            }
            let level_db = amplitude_to_db(rms(chunk)).max(floor_db);
            let bin = (((level_db - floor_db) / bin_width).floor() as usize).min(bins - 1);
            histogram[bin] += 1;
            processed += 1;
        }
    }

    ctx.report("Noise floor estimated", 1.0);

    if processed == 0 {
        return Ok(None);
    }

    // First fullest bin wins ties
    let mode_bin = histogram
        .iter()
        .enumerate()
        .fold((0usize, 0usize), |best, (bin, &count)| {
            if count > best.1 {
                (bin, count)
            } else {
                best
            }
        })
        .0;

    Ok(Some(floor_db + (mode_bin as f64 + 0.5) * bin_width))
}
