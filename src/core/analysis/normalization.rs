// src/core/analysis/normalization.rs
//
// Peak normalization check against a fixed target

use serde::Serialize;
use std::fmt;

use crate::config::NormalizationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationStatus {
    Normalized,
    TooLoud,
    TooQuiet,
}

impl fmt::Display for NormalizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationStatus::Normalized => write!(f, "normalized"),
            NormalizationStatus::TooLoud => write!(f, "too loud"),
            NormalizationStatus::TooQuiet => write!(f, "too quiet"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationResult {
    pub status: NormalizationStatus,
    pub peak_db: f64,
    pub target_db: f64,
}

/// Classify a peak level against the configured target
pub fn check_normalization(peak_db: f64, config: &NormalizationConfig) -> NormalizationResult {
    let status = if (peak_db - config.target_db).abs() <= config.tolerance_db {
        NormalizationStatus::Normalized
    } else if peak_db > config.target_db {
        NormalizationStatus::TooLoud
    } else {
        NormalizationStatus::TooQuiet
    };

    NormalizationResult {
        status,
        peak_db,
        target_db: config.target_db,
    }
}
