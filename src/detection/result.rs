//! QC findings derived from an analysis report

use serde::Serialize;

use crate::config::QcCriteria;
use crate::core::analysis::{NormalizationStatus, ReverbLabel, StereoType};
use crate::core::AnalysisReport;

/// Severity level for a QC finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Pass,
    Warning,
    Error,
}

impl Severity {
    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Pass => "✓",
            Severity::Warning => "⚠",
            Severity::Error => "✗",
        }
    }

    pub fn color_code(&self) -> &'static str {
        match self {
            Severity::Pass => "\x1b[32m",    // green
            Severity::Warning => "\x1b[33m", // yellow
            Severity::Error => "\x1b[31m",   // red
        }
    }
}

/// Which measurement a finding comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Normalization,
    NoiseFloor,
    Reverb,
    Silence,
    Clipping,
    StereoSeparation,
    MicBleed,
    Conversational,
}

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Check::Normalization => "Normalization",
            Check::NoiseFloor => "Noise floor",
            Check::Reverb => "Reverb",
            Check::Silence => "Silence",
            Check::Clipping => "Clipping",
            Check::StereoSeparation => "Stereo",
            Check::MicBleed => "Mic bleed",
            Check::Conversational => "Conversation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub check: Check,
    pub severity: Severity,
    pub description: String,
    pub details: Option<String>,
}

impl Finding {
    pub fn new(check: Check, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            check,
            severity,
            description: description.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Overall outcome for a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QcVerdict {
    Accepted,
    NeedsReview,
    Rejected,
}

impl QcVerdict {
    pub fn symbol(&self) -> &'static str {
        match self {
            QcVerdict::Accepted => "✓",
            QcVerdict::NeedsReview => "?",
            QcVerdict::Rejected => "✗",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            QcVerdict::Accepted => "Passes QC",
            QcVerdict::NeedsReview => "Needs review",
            QcVerdict::Rejected => "Fails QC",
        }
    }
}

/// Findings for one report plus the verdict they add up to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QcSummary {
    pub verdict: QcVerdict,
    pub findings: Vec<Finding>,
}

impl QcSummary {
    /// Evaluate against the default criteria
    pub fn from_report(report: &AnalysisReport) -> Self {
        Self::with_criteria(report, &QcCriteria::default())
    }

    pub fn with_criteria(report: &AnalysisReport, criteria: &QcCriteria) -> Self {
        let mut findings = vec![
            normalization_finding(report),
            noise_floor_finding(report, criteria),
        ];
        findings.extend(reverb_finding(report));
        findings.extend(silence_finding(report, criteria));
        findings.extend(clipping_finding(report));
        findings.extend(stereo_finding(report));
        findings.extend(mic_bleed_finding(report));
        findings.extend(conversational_finding(report, criteria));

        let verdict = match findings.iter().map(|f| f.severity).max() {
            Some(Severity::Error) => QcVerdict::Rejected,
            Some(Severity::Warning) => QcVerdict::NeedsReview,
            _ => QcVerdict::Accepted,
        };

        Self { verdict, findings }
    }

    /// Findings that are not a pass
    pub fn problems(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity > Severity::Pass)
    }

    pub fn worst_severity(&self) -> Severity {
        self.findings
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or(Severity::Pass)
    }
}

fn normalization_finding(report: &AnalysisReport) -> Finding {
    let n = &report.normalization;
    let severity = match n.status {
        NormalizationStatus::Normalized => Severity::Pass,
        _ => Severity::Warning,
    };
    Finding::new(
        Check::Normalization,
        severity,
        format!("Peak {:.2} dBFS is {}", n.peak_db, n.status),
    )
    .with_details(format!("target {:.1} dBFS", n.target_db))
}

fn noise_floor_finding(report: &AnalysisReport, criteria: &QcCriteria) -> Finding {
    let floor_db = report
        .noise_floor_histogram_db
        .unwrap_or(report.noise_floor_db);
    let severity = if floor_db <= criteria.noise_floor_pass_db {
        Severity::Pass
    } else if floor_db <= criteria.noise_floor_error_db {
        Severity::Warning
    } else {
        Severity::Error
    };
    Finding::new(
        Check::NoiseFloor,
        severity,
        format!("Noise floor {:.1} dBFS", floor_db),
    )
}

fn reverb_finding(report: &AnalysisReport) -> Option<Finding> {
    let reverb = report.reverb.as_ref()?;
    let severity = match reverb.label {
        ReverbLabel::Excellent | ReverbLabel::Good | ReverbLabel::NotApplicable => Severity::Pass,
        ReverbLabel::Fair => Severity::Warning,
        ReverbLabel::Poor | ReverbLabel::VeryPoor => Severity::Error,
    };
    Some(
        Finding::new(
            Check::Reverb,
            severity,
            format!("RT60 {:.2}s ({})", reverb.rt60_seconds, reverb.label),
        )
        .with_details(reverb.description.clone()),
    )
}

fn silence_finding(report: &AnalysisReport, criteria: &QcCriteria) -> Option<Finding> {
    let silence = report.silence.as_ref()?;
    let too_long = silence.leading_seconds > criteria.max_edge_silence_seconds
        || silence.trailing_seconds > criteria.max_edge_silence_seconds
        || silence.longest_gap_seconds > criteria.max_gap_seconds;
    let severity = if too_long {
        Severity::Warning
    } else {
        Severity::Pass
    };
    Some(Finding::new(
        Check::Silence,
        severity,
        format!(
            "Leading {:.2}s, trailing {:.2}s, longest gap {:.2}s",
            silence.leading_seconds, silence.trailing_seconds, silence.longest_gap_seconds
        ),
    ))
}

fn clipping_finding(report: &AnalysisReport) -> Option<Finding> {
    let clipping = report.clipping.as_ref()?;
    Some(
        Finding::new(
            Check::Clipping,
            clipping.severity,
            format!(
                "{} clipping events, {} near-clipping events",
                clipping.clipping_event_count, clipping.near_clipping_event_count
            ),
        )
        .with_details(format!(
            "{:.4}% clipped, {:.4}% near clipping",
            clipping.clipped_percentage, clipping.near_clipping_percentage
        )),
    )
}

fn stereo_finding(report: &AnalysisReport) -> Option<Finding> {
    let stereo = report.stereo_separation.as_ref()?;
    let severity = match stereo.stereo_type {
        StereoType::Silent => Severity::Error,
        StereoType::MonoLeft | StereoType::MonoRight | StereoType::Mixed => Severity::Warning,
        StereoType::MonoAsStereo | StereoType::Conversational => Severity::Pass,
    };
    Some(Finding::new(
        Check::StereoSeparation,
        severity,
        format!(
            "{} ({:.0}% confidence)",
            stereo.stereo_type,
            stereo.confidence * 100.0
        ),
    ))
}

fn mic_bleed_finding(report: &AnalysisReport) -> Option<Finding> {
    let bleed = report.mic_bleed.as_ref()?;
    let (severity, description) = if bleed.detected {
        (Severity::Warning, "Cross-channel bleed detected")
    } else {
        (Severity::Pass, "No cross-channel bleed")
    };
    let details = match bleed.median_separation_db {
        Some(separation) => format!(
            "median separation {:.1} dB, {} confirmed blocks",
            separation, bleed.confirmed_blocks
        ),
        None => "no single-speaker blocks".to_string(),
    };
    Some(Finding::new(Check::MicBleed, severity, description).with_details(details))
}

fn conversational_finding(report: &AnalysisReport, criteria: &QcCriteria) -> Option<Finding> {
    let conversation = report.conversational.as_ref()?;
    let severity = if conversation.overlap_percentage > criteria.max_overlap_percentage {
        Severity::Warning
    } else {
        Severity::Pass
    };
    Some(Finding::new(
        Check::Conversational,
        severity,
        format!(
            "{:.1}% overlapping speech in {} segments",
            conversation.overlap_percentage,
            conversation.segments.len()
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::NormalizationResult;

    fn basic_report(peak_db: f64, noise_floor_db: f64) -> AnalysisReport {
        AnalysisReport {
            sample_rate: 48_000,
            channel_count: 1,
            frame_count: 48_000,
            duration_secs: 1.0,
            peak_db,
            channel_peaks_db: vec![peak_db],
            noise_floor_db,
            noise_floor_histogram_db: None,
            normalization: NormalizationResult {
                status: if (peak_db + 6.0).abs() <= 0.1 {
                    NormalizationStatus::Normalized
                } else {
                    NormalizationStatus::TooQuiet
                },
                peak_db,
                target_db: -6.0,
            },
            reverb: None,
            silence: None,
            clipping: None,
            stereo_separation: None,
            mic_bleed: None,
            conversational: None,
        }
    }

    #[test]
    fn test_clean_basic_report_is_accepted() {
        let summary = QcSummary::from_report(&basic_report(-6.0, -70.0));
        assert_eq!(summary.verdict, QcVerdict::Accepted);
        assert_eq!(summary.findings.len(), 2);
        assert_eq!(summary.problems().count(), 0);
    }

    #[test]
    fn test_loud_noise_floor_is_rejected() {
        let summary = QcSummary::from_report(&basic_report(-6.0, -45.0));
        assert_eq!(summary.verdict, QcVerdict::Rejected);
        assert_eq!(summary.worst_severity(), Severity::Error);
    }

    #[test]
    fn test_histogram_floor_preferred() {
        let mut report = basic_report(-6.0, -45.0);
        report.noise_floor_histogram_db = Some(-65.5);
        let summary = QcSummary::from_report(&report);
        assert_eq!(summary.verdict, QcVerdict::Accepted);
    }

    #[test]
    fn test_custom_criteria_change_verdict() {
        let report = basic_report(-6.0, -55.0);
        assert_eq!(QcSummary::from_report(&report).verdict, QcVerdict::NeedsReview);

        let lenient = QcCriteria {
            noise_floor_pass_db: -50.0,
            noise_floor_error_db: -40.0,
            ..QcCriteria::default()
        };
        assert_eq!(
            QcSummary::with_criteria(&report, &lenient).verdict,
            QcVerdict::Accepted
        );

        let strict = QcCriteria {
            noise_floor_error_db: -58.0,
            ..QcCriteria::default()
        };
        assert_eq!(
            QcSummary::with_criteria(&report, &strict).verdict,
            QcVerdict::Rejected
        );
    }

    #[test]
    fn test_unnormalized_needs_review() {
        let summary = QcSummary::from_report(&basic_report(-12.0, -70.0));
        assert_eq!(summary.verdict, QcVerdict::NeedsReview);
        let problem = summary.problems().next().unwrap();
        assert_eq!(problem.check, Check::Normalization);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Pass);
    }
}
