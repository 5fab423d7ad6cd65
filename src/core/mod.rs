//! Core analysis engine
//!
//! Everything here works on an in-memory [`SampleBuffer`]; decoding and file handling
//! live outside the core.

pub mod analysis;
pub mod dsp;

mod analyzer;
mod buffer;
mod cancel;
mod error;
mod report;

pub use analyzer::{AnalyzerBuilder, AudioAnalyzer};
pub use buffer::SampleBuffer;
pub use cancel::{
    CancellationToken, Checkpoint, ProgressEvent, ProgressSink, RunGuard, RunScope, Stage,
    StageContext,
};
pub use error::{AnalysisError, BufferError, Result};
pub use report::AnalysisReport;
