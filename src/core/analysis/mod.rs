//! Speech QC analysis algorithms
//!
//! One module per measurement:
//! - Peak level and normalization against a target
//! - Noise floor (quantile RMS and histogram mode)
//! - Reverberation time (RT60) from speech onsets
//! - Leading, trailing and internal silence
//! - Hard and near clipping
//! - Stereo separation (channel layout)
//! - Cross-channel microphone bleed
//! - Overlap and consistency of two-speaker recordings

mod clipping;
mod conversational;
mod mic_bleed;
mod noise_floor;
mod normalization;
mod peak;
mod reverb;
mod silence;
mod stereo;

pub use clipping::{
    clipping_severity, detect_clipping, ChannelClipping, ClipRegion, ClipType, ClippingAnalysis,
};
pub use conversational::{analyze_conversation, ConversationalAnalysis, OverlapSegment};
pub use mic_bleed::{detect_mic_bleed, BleedDirection, MicBleedAnalysis};
pub use noise_floor::{
    estimate_noise_floor, histogram_noise_floor, quantile_noise_floor, NoiseFloorAnalysis,
};
pub use normalization::{check_normalization, NormalizationResult, NormalizationStatus};
pub use peak::{analyze_peak, PeakAnalysis};
pub use reverb::{estimate_reverb, ReverbAnalysis, ReverbLabel};
pub use silence::{analyze_silence, silence_threshold_db, SilenceAnalysis};
pub use stereo::{analyze_stereo, StereoAnalysis, StereoType};
