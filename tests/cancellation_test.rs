//! Cancellation and progress behaviour of the analyzer

mod test_utils;

use speechcheckr::{AnalysisError, AudioAnalyzer, CancellationToken, ProgressEvent, Stage};
use std::sync::mpsc;
use std::thread;
use test_utils::*;

#[test]
fn test_cancel_from_another_thread() {
    let rate = 48_000;
    // Three minutes of stereo
    let buffer = stereo(
        white_noise(0.3, rate, 180.0, 1),
        white_noise(0.3, rate, 180.0, 2),
        rate,
    );
    let analyzer = AudioAnalyzer::new();
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let (cancelled_tx, cancelled_rx) = mpsc::channel::<()>();

    let (worker_analyzer, worker_buffer) = (&analyzer, &buffer);

    let result = thread::scope(|s| {
        let worker = s.spawn(move || {
            let mut first = true;
            let mut callback = |_: &ProgressEvent| {
                if first {
                    first = false;
                    let _ = started_tx.send(());
                    // Hold the run until the controller has cancelled
                    let _ = cancelled_rx.recv();
                }
            };
            worker_analyzer.analyze(worker_buffer, Some(&mut callback), true)
        });

        started_rx.recv().unwrap();
        assert!(analyzer.is_in_progress());
        analyzer.cancel();
        cancelled_tx.send(()).unwrap();

        worker.join().unwrap()
    });

    assert_eq!(result.unwrap_err(), AnalysisError::Cancelled { stage: Stage::Peak });
    assert!(!analyzer.is_in_progress());
}

#[test]
fn test_cancel_reports_current_stage() {
    let rate = 16_000;
    let buffer = stereo(
        white_noise(0.3, rate, 5.0, 3),
        white_noise(0.3, rate, 5.0, 4),
        rate,
    );

    for stage in [Stage::NoiseFloor, Stage::Clipping, Stage::MicBleed] {
        let analyzer = AudioAnalyzer::new();
        let mut callback = |event: &ProgressEvent| {
            if event.stage == stage {
                analyzer.cancel();
            }
        };
        let err = analyzer
            .analyze(&buffer, Some(&mut callback), true)
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err, AnalysisError::Cancelled { stage });
    }
}

#[test]
fn test_cancel_before_run_does_not_affect_it() {
    let rate = 16_000;
    let buffer = mono(white_noise(0.3, rate, 2.0, 5), rate);
    let analyzer = AudioAnalyzer::new();

    analyzer.cancel();
    assert!(analyzer.analyze(&buffer, None, true).is_ok());
}

#[test]
fn test_new_run_after_cancellation_succeeds() {
    let rate = 16_000;
    let buffer = mono(white_noise(0.3, rate, 2.0, 6), rate);
    let analyzer = AudioAnalyzer::new();

    let mut cancel = |_: &ProgressEvent| analyzer.cancel();
    assert!(analyzer.analyze(&buffer, Some(&mut cancel), true).is_err());

    let report = analyzer.analyze(&buffer, None, true).unwrap();
    assert!(report.clipping.is_some());
}

#[test]
fn test_shared_token_cancels_every_analyzer() {
    let rate = 16_000;
    let buffer = mono(white_noise(0.3, rate, 2.0, 7), rate);
    let token = CancellationToken::new();
    let a = AudioAnalyzer::builder().cancellation_token(token.clone()).build();
    let b = AudioAnalyzer::builder().cancellation_token(token.clone()).build();

    let mut cancel_via_token = |_: &ProgressEvent| token.cancel();
    let err = a
        .analyze(&buffer, Some(&mut cancel_via_token), false)
        .unwrap_err();
    assert!(err.is_cancelled());

    // The cancelled run has finished; b starts a fresh generation
    assert!(b.analyze(&buffer, None, false).is_ok());
}

#[test]
fn test_progress_is_monotonic_and_complete() {
    let rate = 48_000;
    let buffer = stereo(
        speech_like(-6.0, rate, 6.0, 8),
        speech_like(-6.0, rate, 6.0, 9),
        rate,
    );
    let mut events: Vec<ProgressEvent> = Vec::new();
    let mut record = |event: &ProgressEvent| events.push(event.clone());

    AudioAnalyzer::new()
        .analyze(&buffer, Some(&mut record), true)
        .unwrap();

    assert!(events.len() > 10);
    assert!(events
        .windows(2)
        .all(|pair| pair[0].progress <= pair[1].progress));
    assert!(events
        .iter()
        .filter(|e| e.stage == Stage::Peak)
        .all(|e| e.progress <= 0.5));
    assert!(events
        .iter()
        .filter(|e| e.stage == Stage::NoiseFloor)
        .all(|e| e.progress >= 0.5 && e.progress <= 0.9));
    assert!(events
        .iter()
        .filter(|e| e.stage == Stage::StereoSeparation)
        .all(|e| e.progress >= 0.9));

    let last = events.last().unwrap();
    assert_eq!(last.stage, Stage::Complete);
    assert_eq!(last.progress, 1.0);
}

#[test]
fn test_long_scans_report_progress_regularly() {
    let rate = 48_000;
    // Two minutes of mono, 5.76M samples
    let buffer = mono(white_noise(0.3, rate, 120.0, 10), rate);
    let mut events: Vec<ProgressEvent> = Vec::new();
    let mut record = |event: &ProgressEvent| events.push(event.clone());

    AudioAnalyzer::new()
        .analyze(&buffer, Some(&mut record), true)
        .unwrap();

    let expected = buffer.total_samples() / 100_000;
    for stage in [Stage::Peak, Stage::NoiseFloor, Stage::Reverb, Stage::Clipping] {
        let count = events.iter().filter(|e| e.stage == stage).count();
        assert!(
            count >= expected,
            "{} reported {} times, expected at least {}",
            stage,
            count,
            expected
        );
    }
}
