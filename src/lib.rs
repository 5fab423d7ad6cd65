//! SpeechCheckr - Quality control for recorded speech
//!
//! Computes objective QC metrics over a decoded, in-memory sample buffer: peak level
//! and normalization, noise floor, reverberation (RT60), leading/trailing/internal
//! silence, hard and near clipping, stereo layout, cross-channel mic bleed and speaker
//! overlap in two-speaker recordings.
//!
//! ## Module Structure
//!
//! - `core` - Sample buffer, analysis algorithms and the coordinating analyzer
//! - `config` - Tunable thresholds, loadable from JSON
//! - `detection` - Pass/Warning/Error findings derived from a report
//! - `cli` - WAV loading and output formatting for the `speechcheckr` binary
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use speechcheckr::core::{AudioAnalyzer, ProgressEvent, SampleBuffer};
//! use speechcheckr::detection::QcSummary;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let buffer = SampleBuffer::new(vec![vec![0.0; 48_000]], 48_000)?;
//! let analyzer = AudioAnalyzer::builder().normalization_target(-3.0).build();
//!
//! let mut progress = |event: &ProgressEvent| println!("{:.0}% {}", event.progress * 100.0, event.message);
//! let report = analyzer.analyze(&buffer, Some(&mut progress), true)?;
//!
//! println!("Peak: {:.1} dBFS", report.peak_db);
//! println!("Verdict: {:?}", QcSummary::from_report(&report).verdict);
//! # Ok(())
//! # }
//! ```
//!
//! ## Cancellation
//!
//! `AudioAnalyzer::cancel()` (or a shared [`core::CancellationToken`]) stops every run
//! in flight at its next checkpoint. The run returns `AnalysisError::Cancelled` with
//! the stage it was in; no partial report is produced.

// Core analysis functionality
pub mod core;

// Command-line helpers
pub mod cli;

// Thresholds and configuration
pub mod config;

// QC findings
pub mod detection;

// Re-export commonly used types at crate root for convenience
pub use config::AnalysisConfig;
pub use core::{
    AnalysisError, AnalysisReport, AnalyzerBuilder, AudioAnalyzer, BufferError,
    CancellationToken, ProgressEvent, SampleBuffer, Stage,
};
pub use detection::{Finding, QcSummary, QcVerdict, Severity};
