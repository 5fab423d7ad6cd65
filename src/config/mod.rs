//! Configuration module for SpeechCheckr

mod thresholds;

pub use thresholds::{
    AnalysisConfig, ClippingConfig, ConversationalConfig, MicBleedConfig, NoiseFloorConfig,
    NormalizationConfig, QcCriteria, ReverbConfig, SilenceConfig, StereoConfig,
};
