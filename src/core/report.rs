// src/core/report.rs
//
// The single result object returned by a successful analysis run.

use serde::Serialize;

use super::analysis::{
    ClippingAnalysis, ConversationalAnalysis, MicBleedAnalysis, NormalizationResult,
    ReverbAnalysis, SilenceAnalysis, StereoAnalysis,
};

/// Quality metrics for one buffer.
///
/// Levels are dBFS. Silent input yields negative infinity, which serializes to JSON as
/// `null`. Optional sections are `None` when they do not apply (basic mode, channel
/// count) or when an input they depend on is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub sample_rate: u32,
    pub channel_count: usize,
    pub frame_count: usize,
    pub duration_secs: f64,

    pub peak_db: f64,
    pub channel_peaks_db: Vec<f64>,
    /// Quantile-RMS estimate
    pub noise_floor_db: f64,
    /// Histogram-mode estimate (extended mode)
    pub noise_floor_histogram_db: Option<f64>,
    pub normalization: NormalizationResult,

    pub reverb: Option<ReverbAnalysis>,
    pub silence: Option<SilenceAnalysis>,
    pub clipping: Option<ClippingAnalysis>,
    pub stereo_separation: Option<StereoAnalysis>,
    pub mic_bleed: Option<MicBleedAnalysis>,
    pub conversational: Option<ConversationalAnalysis>,
}

impl AnalysisReport {
    /// Whether any extended analyzer produced a section
    pub fn is_extended(&self) -> bool {
        self.noise_floor_histogram_db.is_some() || self.clipping.is_some()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
