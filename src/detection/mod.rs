//! QC findings for SpeechCheckr reports

mod result;

pub use result::{Check, Finding, QcSummary, QcVerdict, Severity};
