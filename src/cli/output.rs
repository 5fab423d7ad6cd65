//! Output formatting for CLI results

use serde::Serialize;
use std::path::Path;

use crate::core::AnalysisReport;
use crate::detection::{Finding, QcSummary, QcVerdict};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Text rendering of a dB value; silence reads as "-inf"
fn db(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1} dB", value)
    } else {
        "-inf dB".to_string()
    }
}

/// Format one file's result for terminal output
pub fn format_report(path: &Path, report: &AnalysisReport, summary: &QcSummary, verbose: bool) -> String {
    let mut output = String::new();

    let verdict_color = match summary.verdict {
        QcVerdict::Accepted => "\x1b[32m",    // green
        QcVerdict::NeedsReview => "\x1b[33m", // yellow
        QcVerdict::Rejected => "\x1b[31m",    // red
    };

    output.push_str(&format!(
        "{}{} {}{}{}\n",
        verdict_color,
        summary.verdict.symbol(),
        BOLD,
        path.display(),
        RESET,
    ));
    output.push_str(&format!(
        "  {} {}({} Hz, {} ch, {:.2}s){}\n",
        summary.verdict.description(),
        DIM,
        report.sample_rate,
        report.channel_count,
        report.duration_secs,
        RESET
    ));

    output.push_str("\n  Checks:\n");
    for finding in &summary.findings {
        output.push_str(&format_finding(finding, verbose));
    }

    if verbose {
        output.push_str(&format_details(report));
    }

    output
}

fn format_finding(finding: &Finding, verbose: bool) -> String {
    let mut output = format!(
        "    {}{} {}{:<13} {}\n",
        finding.severity.color_code(),
        finding.severity.symbol(),
        RESET,
        finding.check.name(),
        finding.description
    );

    if verbose {
        if let Some(details) = &finding.details {
            output.push_str(&format!("      {}{}{}\n", DIM, details, RESET));
        }
    }

    output
}

fn format_details(report: &AnalysisReport) -> String {
    let mut output = format!("\n  {}Technical Details:{}\n", BOLD, RESET);

    let peaks: Vec<String> = report.channel_peaks_db.iter().map(|&p| db(p)).collect();
    output.push_str(&format!("    Channel peaks: {}\n", peaks.join(", ")));
    output.push_str(&format!(
        "    Noise floor (quantile): {}\n",
        db(report.noise_floor_db)
    ));
    if let Some(histogram) = report.noise_floor_histogram_db {
        output.push_str(&format!("    Noise floor (histogram): {}\n", db(histogram)));
    }
    if let Some(silence) = &report.silence {
        output.push_str(&format!(
            "    Silence threshold: {}\n",
            db(silence.threshold_db)
        ));
    }
    if let Some(clipping) = &report.clipping {
        output.push_str(&format!(
            "    Clipping: {} samples, longest run {}, min run {}\n",
            clipping.clipped_samples, clipping.max_consecutive_clipped, clipping.min_consecutive_samples
        ));
        for region in clipping.regions.iter().take(5) {
            output.push_str(&format!(
                "      {}ch{} {:?} {:.3}s-{:.3}s ({} samples, peak {:.3}){}\n",
                DIM,
                region.channel,
                region.clip_type,
                region.start_seconds,
                region.end_seconds,
                region.sample_count,
                region.peak,
                RESET
            ));
        }
    }
    if let Some(bleed) = &report.mic_bleed {
        output.push_str(&format!(
            "    Bleed L->R {}, R->L {}, worst separation {}\n",
            db(bleed.left_to_right.average_bleed_db),
            db(bleed.right_to_left.average_bleed_db),
            bleed.worst_separation_db.map(db).unwrap_or_else(|| "n/a".to_string())
        ));
    }
    if let Some(conversation) = &report.conversational {
        output.push_str(&format!(
            "    Speech: left {:.1}s, right {:.1}s, consistency {}\n",
            conversation.left_active_seconds,
            conversation.right_active_seconds,
            conversation
                .channel_consistency_percentage
                .map(|c| format!("{:.0}%", c))
                .unwrap_or_else(|| "n/a".to_string())
        ));
    }

    output
}

#[derive(Serialize)]
struct JsonResult<'a> {
    file: String,
    verdict: QcVerdict,
    findings: &'a [Finding],
    report: &'a AnalysisReport,
}

/// Format one file's result as JSON
pub fn format_json(path: &Path, report: &AnalysisReport, summary: &QcSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonResult {
        file: path.display().to_string(),
        verdict: summary.verdict,
        findings: &summary.findings,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AudioAnalyzer, SampleBuffer};

    fn report() -> AnalysisReport {
        let samples: Vec<f32> = (0..48_000).map(|i| 0.25 * (i as f32 * 0.05).sin()).collect();
        let buffer = SampleBuffer::new(vec![samples.clone(), samples], 48_000).unwrap();
        AudioAnalyzer::new().analyze(&buffer, None, true).unwrap()
    }

    #[test]
    fn test_text_lists_every_check() {
        let report = report();
        let summary = QcSummary::from_report(&report);
        let text = format_report(Path::new("take.wav"), &report, &summary, true);

        assert!(text.contains("take.wav"));
        for finding in &summary.findings {
            assert!(text.contains(finding.check.name()));
        }
        assert!(text.contains("Technical Details"));
    }

    #[test]
    fn test_json_is_valid() {
        let report = report();
        let summary = QcSummary::from_report(&report);
        let json = format_json(Path::new("take.wav"), &report, &summary).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["file"], "take.wav");
        assert_eq!(value["report"]["stereo_separation"]["stereo_type"], "Mono as Stereo");
    }

    #[test]
    fn test_db_formatting() {
        assert_eq!(db(-12.34), "-12.3 dB");
        assert_eq!(db(f64::NEG_INFINITY), "-inf dB");
    }
}
