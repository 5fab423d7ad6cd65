// src/core/analyzer.rs
//
// Analysis coordinator with builder pattern.
//
// Runs the analyzers in a fixed order over one buffer, maps each stage onto its slice of
// global progress and assembles the report. Peak owns [0, 0.5), noise floor [0.5, 0.9)
// and the extended analyzers split [0.9, 1.0) evenly.

use log::{debug, info};

use super::analysis::{
    analyze_conversation, analyze_peak, analyze_silence, analyze_stereo, check_normalization,
    detect_clipping, detect_mic_bleed, estimate_noise_floor, estimate_reverb, StereoType,
};
use super::buffer::SampleBuffer;
use super::cancel::{CancellationToken, ProgressEvent, ProgressSink, Stage, StageContext};
use super::error::Result;
use super::report::AnalysisReport;
use crate::config::{AnalysisConfig, ClippingConfig, ConversationalConfig, MicBleedConfig};

const PEAK_END: f32 = 0.5;
const NOISE_FLOOR_END: f32 = 0.9;
const EXTENDED_STAGES: [Stage; 6] = [
    Stage::Reverb,
    Stage::Silence,
    Stage::Clipping,
    Stage::StereoSeparation,
    Stage::MicBleed,
    Stage::Conversational,
];

/// Global progress range of an extended stage
fn extended_range(stage: Stage) -> (f32, f32) {
    let slot = (1.0 - NOISE_FLOOR_END) / EXTENDED_STAGES.len() as f32;
    let index = EXTENDED_STAGES
        .iter()
        .position(|s| *s == stage)
        .unwrap_or(EXTENDED_STAGES.len() - 1);
    let start = NOISE_FLOOR_END + slot * index as f32;
    (start, start + slot)
}

/// Builder for AudioAnalyzer configuration
#[derive(Debug, Clone, Default)]
pub struct AnalyzerBuilder {
    config: AnalysisConfig,
    token: Option<CancellationToken>,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn normalization_target(mut self, target_db: f64) -> Self {
        self.config.normalization.target_db = target_db;
        self
    }

    pub fn normalization_tolerance(mut self, tolerance_db: f64) -> Self {
        self.config.normalization.tolerance_db = tolerance_db;
        self
    }

    pub fn clipping(mut self, clipping: ClippingConfig) -> Self {
        self.config.clipping = clipping;
        self
    }

    pub fn parallel_clipping(mut self, parallel: bool) -> Self {
        self.config.clipping.parallel_channels = parallel;
        self
    }

    pub fn mic_bleed(mut self, mic_bleed: MicBleedConfig) -> Self {
        self.config.mic_bleed = mic_bleed;
        self
    }

    pub fn conversational(mut self, conversational: ConversationalConfig) -> Self {
        self.config.conversational = conversational;
        self
    }

    /// Share a cancellation token with other analyzers or the host
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn build(self) -> AudioAnalyzer {
        AudioAnalyzer {
            config: self.config,
            token: self.token.unwrap_or_default(),
        }
    }
}

/// Speech QC analyzer. Holds no per-run state; one instance can serve any number of
/// buffers, sequentially or from several threads.
#[derive(Debug, Clone, Default)]
pub struct AudioAnalyzer {
    config: AnalysisConfig,
    token: CancellationToken,
}

impl AudioAnalyzer {
    /// Create analyzer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create analyzer with custom configuration
    pub fn with_config(config: AnalysisConfig) -> Self {
        AnalyzerBuilder::new().config(config).build()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel every run in flight on this analyzer's token
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_in_progress(&self) -> bool {
        self.token.is_in_progress()
    }

    /// Run the analysis.
    ///
    /// Basic mode (`include_extended == false`) measures peak, quantile noise floor and
    /// normalization only. Cancellation returns [`crate::core::AnalysisError::Cancelled`]
    /// and no report.
    pub fn analyze(
        &self,
        buffer: &SampleBuffer,
        progress: Option<&mut dyn FnMut(&ProgressEvent)>,
        include_extended: bool,
    ) -> Result<AnalysisReport> {
        let run = self.token.begin();
        let scope = run.scope();
        let mut sink = ProgressSink::new(progress);
        let config = &self.config;

        info!(
            "analyzing {} channel(s), {} frames at {} Hz ({} mode)",
            buffer.channel_count(),
            buffer.frame_count(),
            buffer.sample_rate(),
            if include_extended { "extended" } else { "basic" }
        );

        let mut ctx = StageContext::new(Stage::Peak, scope, &mut sink, 0.0, PEAK_END);
        let peak = analyze_peak(buffer, &mut ctx)?;
        debug!("peak: {:.2} dBFS", peak.peak_db);

        let mut ctx = StageContext::new(
            Stage::NoiseFloor,
            scope,
            &mut sink,
            PEAK_END,
            NOISE_FLOOR_END,
        );
        let noise_floor =
            estimate_noise_floor(buffer, &config.noise_floor, include_extended, &mut ctx)?;

        let normalization = check_normalization(peak.peak_db, &config.normalization);
        debug!("normalization: {}", normalization.status);

        let mut report = AnalysisReport {
            sample_rate: buffer.sample_rate(),
            channel_count: buffer.channel_count(),
            frame_count: buffer.frame_count(),
            duration_secs: buffer.duration_secs(),
            peak_db: peak.peak_db,
            channel_peaks_db: peak.channel_peaks_db,
            noise_floor_db: noise_floor.quantile_db,
            noise_floor_histogram_db: noise_floor.histogram_db,
            normalization,
            reverb: None,
            silence: None,
            clipping: None,
            stereo_separation: None,
            mic_bleed: None,
            conversational: None,
        };

        if include_extended {
            if let Some(histogram_db) = noise_floor.histogram_db {
                let (start, end) = extended_range(Stage::Reverb);
                let mut ctx = StageContext::new(Stage::Reverb, scope, &mut sink, start, end);
                report.reverb = Some(estimate_reverb(
                    &buffer.channels()[0],
                    buffer.sample_rate(),
                    histogram_db,
                    &config.reverb,
                    &mut ctx,
                )?);

                let (start, end) = extended_range(Stage::Silence);
                let mut ctx = StageContext::new(Stage::Silence, scope, &mut sink, start, end);
                report.silence = Some(analyze_silence(
                    buffer,
                    peak.peak_db,
                    histogram_db,
                    &config.silence,
                    &mut ctx,
                )?);
            }

            let (start, end) = extended_range(Stage::Clipping);
            let mut ctx = StageContext::new(Stage::Clipping, scope, &mut sink, start, end);
            report.clipping = Some(detect_clipping(buffer, &config.clipping, &mut ctx)?);

            if let Some((left, right)) = buffer.stereo_pair() {
                let rate = buffer.sample_rate();

                let (start, end) = extended_range(Stage::StereoSeparation);
                let mut ctx =
                    StageContext::new(Stage::StereoSeparation, scope, &mut sink, start, end);
                let stereo = analyze_stereo(left, right, rate, &config.stereo, &mut ctx)?;

                let (start, end) = extended_range(Stage::MicBleed);
                let mut ctx = StageContext::new(Stage::MicBleed, scope, &mut sink, start, end);
                report.mic_bleed =
                    Some(detect_mic_bleed(left, right, rate, &config.mic_bleed, &mut ctx)?);

                if stereo.stereo_type == StereoType::Conversational {
                    let floor_db = noise_floor.histogram_db.unwrap_or(noise_floor.quantile_db);
                    let (start, end) = extended_range(Stage::Conversational);
                    let mut ctx =
                        StageContext::new(Stage::Conversational, scope, &mut sink, start, end);
                    report.conversational = Some(analyze_conversation(
                        left,
                        right,
                        rate,
                        floor_db,
                        &config.conversational,
                        &mut ctx,
                    )?);
                }
                report.stereo_separation = Some(stereo);
            }
        }

        sink.emit(Stage::Complete, "Analysis complete", 1.0);
        info!(
            "analysis complete: peak {:.2} dBFS, noise floor {:.1} dBFS",
            report.peak_db, report.noise_floor_db
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AnalysisError;

    fn tone(amplitude: f32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| amplitude * (i as f32 * 0.07).sin())
            .collect()
    }

    #[test]
    fn test_extended_ranges_cover_tail() {
        let (start, _) = extended_range(Stage::Reverb);
        let (_, end) = extended_range(Stage::Conversational);
        assert!((start - 0.9).abs() < 1e-6);
        assert!((end - 1.0).abs() < 1e-6);

        let (_, silence_end) = extended_range(Stage::Silence);
        let (clipping_start, _) = extended_range(Stage::Clipping);
        assert!((silence_end - clipping_start).abs() < 1e-6);
    }

    #[test]
    fn test_basic_mode_skips_extended_sections() {
        let buffer = SampleBuffer::new(vec![tone(0.5, 48_000), tone(0.5, 48_000)], 48_000).unwrap();
        let report = AudioAnalyzer::new().analyze(&buffer, None, false).unwrap();

        assert!(report.noise_floor_histogram_db.is_none());
        assert!(report.reverb.is_none());
        assert!(report.silence.is_none());
        assert!(report.clipping.is_none());
        assert!(report.stereo_separation.is_none());
        assert!(report.mic_bleed.is_none());
        assert!(!report.is_extended());
    }

    #[test]
    fn test_mono_buffer_has_no_stereo_sections() {
        let buffer = SampleBuffer::new(vec![tone(0.5, 48_000)], 48_000).unwrap();
        let report = AudioAnalyzer::new().analyze(&buffer, None, true).unwrap();

        assert!(report.clipping.is_some());
        assert!(report.silence.is_some());
        assert!(report.reverb.is_some());
        assert!(report.stereo_separation.is_none());
        assert!(report.mic_bleed.is_none());
        assert!(report.conversational.is_none());
    }

    #[test]
    fn test_progress_ends_at_one() {
        let buffer = SampleBuffer::new(vec![tone(0.5, 300_000); 2], 48_000).unwrap();
        let mut events: Vec<ProgressEvent> = Vec::new();
        let mut callback = |event: &ProgressEvent| events.push(event.clone());
        AudioAnalyzer::new()
            .analyze(&buffer, Some(&mut callback), true)
            .unwrap();

        assert!(events.windows(2).all(|w| w[0].progress <= w[1].progress));
        let last = events.last().unwrap();
        assert_eq!(last.stage, Stage::Complete);
        assert_eq!(last.progress, 1.0);
        assert!(events.iter().any(|e| e.stage == Stage::MicBleed));
    }

    #[test]
    fn test_builder_applies_overrides() {
        let analyzer = AudioAnalyzer::builder()
            .normalization_target(-3.0)
            .parallel_clipping(false)
            .build();
        assert_eq!(analyzer.config().normalization.target_db, -3.0);
        assert!(!analyzer.config().clipping.parallel_channels);

        let buffer = SampleBuffer::new(vec![tone(0.708, 10_000)], 44_100).unwrap();
        let report = analyzer.analyze(&buffer, None, false).unwrap();
        assert_eq!(report.normalization.target_db, -3.0);
    }

    #[test]
    fn test_cancel_from_progress_callback() {
        let analyzer = AudioAnalyzer::new();
        let buffer = SampleBuffer::new(vec![tone(0.5, 500_000)], 48_000).unwrap();
        let mut callback = |_: &ProgressEvent| analyzer.cancel();

        let err = analyzer
            .analyze(&buffer, Some(&mut callback), true)
            .unwrap_err();
        assert_eq!(err, AnalysisError::Cancelled { stage: Stage::Peak });
        assert!(!analyzer.is_in_progress());

        // A later run is unaffected by the earlier cancellation
        assert!(analyzer.analyze(&buffer, None, false).is_ok());
    }
}
