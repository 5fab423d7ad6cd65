// src/core/error.rs
//
// Error types for the analysis engine.

use thiserror::Error;

use super::cancel::Stage;

/// Reasons a sample buffer is rejected before any analyzer runs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BufferError {
    #[error("buffer has no channels")]
    NoChannels,

    #[error("buffer contains no frames")]
    Empty,

    #[error("channel {channel} has {actual} frames, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("sample rate must be positive")]
    InvalidSampleRate,

    #[error("non-finite sample at channel {channel}, frame {index}")]
    NonFiniteSample { channel: usize, index: usize },

    #[error("{len} interleaved samples cannot be split into {channels} channels")]
    InterleavedLength { len: usize, channels: usize },
}

/// Errors returned by [`crate::core::AudioAnalyzer::analyze`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The run was cancelled; no partial report exists.
    #[error("analysis cancelled during {stage} stage")]
    Cancelled { stage: Stage },

    #[error("invalid sample buffer: {0}")]
    InvalidBuffer(#[from] BufferError),
}

impl AnalysisError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisError::Cancelled { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
