// src/core/analysis/peak.rs
//
// Global and per-channel sample peak measurement

use serde::Serialize;

use crate::core::buffer::SampleBuffer;
use crate::core::cancel::{StageContext, SAMPLE_CHECK_INTERVAL, SAMPLE_YIELD_INTERVAL};
use crate::core::dsp::amplitude_to_db;
use crate::core::error::Result;

/// Peak analysis result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakAnalysis {
    /// Largest absolute sample across all channels
    pub peak: f32,
    /// `peak` in dBFS, negative infinity for a silent buffer
    pub peak_db: f64,
    pub channel_peaks_db: Vec<f64>,
}

/// Scan every sample for the largest magnitude
pub fn analyze_peak(buffer: &SampleBuffer, ctx: &mut StageContext<'_, '_>) -> Result<PeakAnalysis> {
    let total = buffer.total_samples().max(1);
    let mut processed = 0usize;
    let mut global_peak = 0.0f32;
    let mut channel_peaks = Vec::with_capacity(buffer.channel_count());

    ctx.report("Measuring peak level", 0.0);

    for samples in buffer.channels() {
        let mut channel_peak = 0.0f32;
        for &sample in samples {
            if processed % SAMPLE_CHECK_INTERVAL == 0 {
                ctx.check()?;
                if processed % SAMPLE_YIELD_INTERVAL == 0 && processed > 0 {
                    ctx.report("Measuring peak level", processed as f32 / total as f32);
                }
            }
            channel_peak = channel_peak.max(sample.abs());
            processed += 1;
        }
        global_peak = global_peak.max(channel_peak);
        channel_peaks.push(amplitude_to_db(channel_peak as f64));
    }

    ctx.report("Peak level measured", 1.0);

    Ok(PeakAnalysis {
        peak: global_peak,
        peak_db: amplitude_to_db(global_peak as f64),
        channel_peaks_db: channel_peaks,
    })
}
