// src/config/thresholds.rs
//
// Tunable constants for every analyzer. Defaults reproduce the reference QC rules;
// hosts may load overrides from JSON.

use serde::{Deserialize, Serialize};

/// Peak normalization target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub target_db: f64,
    pub tolerance_db: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            target_db: -6.0,
            tolerance_db: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseFloorConfig {
    /// Windows per channel for the quantile estimator
    pub quantile_window_count: usize,
    /// Share of quietest windows averaged by the quantile estimator
    pub quantile_fraction: f64,
    pub histogram_window_seconds: f64,
    /// Histogram windows are sized against this rate, not the buffer's
    pub histogram_reference_rate: u32,
    pub histogram_floor_db: f64,
    pub histogram_bins: usize,
}

impl Default for NoiseFloorConfig {
    fn default() -> Self {
        Self {
            quantile_window_count: 100,
            quantile_fraction: 0.2,
            histogram_window_seconds: 0.05,
            histogram_reference_rate: 44_100,
            histogram_floor_db: -100.0,
            histogram_bins: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbConfig {
    /// Onset detection window in samples
    pub onset_window: usize,
    pub onset_ratio: f64,
    pub onset_min_rms: f64,
    /// Required headroom of an onset peak above the noise floor
    pub min_dynamic_range_db: f64,
    pub decay_window_seconds: f64,
    /// Measured decay, extrapolated linearly to 60 dB
    pub decay_drop_db: f64,
    /// Give up on a decay that has not ended after this long
    pub max_decay_seconds: f64,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            onset_window: 1024,
            onset_ratio: 1.5,
            onset_min_rms: 0.01,
            min_dynamic_range_db: 10.0,
            decay_window_seconds: 0.02,
            decay_drop_db: 25.0,
            max_decay_seconds: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceConfig {
    pub chunk_seconds: f64,
    /// Position of the threshold between noise floor (0.0) and peak (1.0)
    pub threshold_fraction: f64,
    /// Sound runs shorter than this are treated as silence
    pub min_sound_seconds: f64,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            chunk_seconds: 0.05,
            threshold_fraction: 0.25,
            min_sound_seconds: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClippingConfig {
    pub hard_threshold: f32,
    pub near_threshold: f32,
    /// Sub-threshold samples tolerated inside one region
    pub gap_tolerance: usize,
    pub min_consecutive_floor: usize,
    /// One extra required sample per this many Hz of sample rate
    pub rate_divisor: u32,
    pub max_reported_regions: usize,
    /// Scan channels on the rayon pool
    pub parallel_channels: bool,
}

impl Default for ClippingConfig {
    fn default() -> Self {
        Self {
            hard_threshold: 1.0,
            near_threshold: 0.98,
            gap_tolerance: 3,
            min_consecutive_floor: 2,
            rate_divisor: 20_000,
            max_reported_regions: 50,
            parallel_channels: true,
        }
    }
}

impl ClippingConfig {
    /// Minimum qualifying samples for a region at `sample_rate`
    pub fn min_consecutive(&self, sample_rate: u32) -> usize {
        let scaled = (sample_rate / self.rate_divisor.max(1)) as usize;
        scaled.max(self.min_consecutive_floor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoConfig {
    pub block_seconds: f64,
    pub silence_rms: f64,
    pub dominance_ratio: f64,
    /// Share of blocks needed for a mono classification
    pub mono_fraction: f64,
    /// Share of blocks each side needs for conversational stereo
    pub conversational_fraction: f64,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            block_seconds: 0.25,
            silence_rms: 0.001,
            dominance_ratio: 1.1,
            mono_fraction: 0.9,
            conversational_fraction: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicBleedConfig {
    pub block_seconds: f64,
    pub silence_rms: f64,
    pub dominance_ratio: f64,
    /// Method A: average bleed level above this flags bleed
    pub absolute_threshold_db: f64,
    /// Method B: blocks separated by less than this get a correlation check
    pub concerning_separation_db: f64,
    pub correlation_threshold: f64,
    /// Method B: share of confirmed blocks that flags bleed
    pub confirmed_fraction: f64,
    pub worst_percentile: f64,
}

impl Default for MicBleedConfig {
    fn default() -> Self {
        Self {
            block_seconds: 0.25,
            silence_rms: 0.001,
            dominance_ratio: 1.5,
            absolute_threshold_db: -60.0,
            concerning_separation_db: 15.0,
            correlation_threshold: 0.3,
            confirmed_fraction: 0.005,
            worst_percentile: 0.1,
        }
    }
}

/// Overlap and consistency settings for two-speaker recordings.
///
/// These values have not been tuned against production material; keep them
/// configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationalConfig {
    pub block_seconds: f64,
    /// A channel is speaking when its block level exceeds noise floor + this
    pub speech_above_noise_db: f64,
    pub consistency_ratio: f64,
    pub min_overlap_seconds: f64,
}

impl Default for ConversationalConfig {
    fn default() -> Self {
        Self {
            block_seconds: 0.25,
            speech_above_noise_db: 20.0,
            consistency_ratio: 1.5,
            min_overlap_seconds: 0.0,
        }
    }
}

/// Pass/warn limits used when a report is folded into a QC verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcCriteria {
    /// Noise floor at or below this passes
    pub noise_floor_pass_db: f64,
    /// Noise floor above this fails
    pub noise_floor_error_db: f64,
    pub max_edge_silence_seconds: f64,
    pub max_gap_seconds: f64,
    /// Overlap share in percent
    pub max_overlap_percentage: f64,
}

impl Default for QcCriteria {
    fn default() -> Self {
        Self {
            noise_floor_pass_db: -60.0,
            noise_floor_error_db: -50.0,
            max_edge_silence_seconds: 3.0,
            max_gap_seconds: 5.0,
            max_overlap_percentage: 10.0,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub normalization: NormalizationConfig,
    pub noise_floor: NoiseFloorConfig,
    pub reverb: ReverbConfig,
    pub silence: SilenceConfig,
    pub clipping: ClippingConfig,
    pub stereo: StereoConfig,
    pub mic_bleed: MicBleedConfig,
    pub conversational: ConversationalConfig,
    /// Only read by `QcSummary`, never by the analyzers
    pub qc: QcCriteria,
}

impl AnalysisConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
