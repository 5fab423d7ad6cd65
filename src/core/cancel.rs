// src/core/cancel.rs
//
// Cooperative cancellation and progress reporting shared by every analyzer.
//
// A run captures the token's generation when it starts. `cancel()` bumps the
// generation, so every run that started before the call observes the change at its
// next checkpoint, while runs started afterwards are unaffected.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::error::{AnalysisError, Result};

/// Check cancellation every N samples in sample-level loops
pub const SAMPLE_CHECK_INTERVAL: usize = 10_000;
/// Emit progress (and yield) every N samples
pub const SAMPLE_YIELD_INTERVAL: usize = 100_000;
/// Check cancellation every N noise-floor windows
pub const WINDOW_CHECK_INTERVAL: usize = 1_000;
/// Check cancellation every N stereo/bleed/overlap blocks
pub const BLOCK_CHECK_INTERVAL: usize = 100;
/// Check cancellation every N reverb onsets
pub const ONSET_CHECK_INTERVAL: usize = 100;
/// Check cancellation every N silence chunks
pub const CHUNK_CHECK_INTERVAL: usize = 1_000;

/// Pipeline stage, carried by cancellation errors and progress events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Peak,
    NoiseFloor,
    Reverb,
    Silence,
    Clipping,
    StereoSeparation,
    MicBleed,
    Conversational,
    Complete,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Peak => "peak",
            Stage::NoiseFloor => "noise_floor",
            Stage::Reverb => "reverb",
            Stage::Silence => "silence",
            Stage::Clipping => "clipping",
            Stage::StereoSeparation => "stereo_separation",
            Stage::MicBleed => "mic_bleed",
            Stage::Conversational => "conversational",
            Stage::Complete => "complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default)]
struct TokenState {
    generation: AtomicU64,
    active_runs: AtomicU64,
    in_progress: AtomicBool,
}

/// Shared cancellation handle. Clones refer to the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every run currently in flight. Safe to call from any thread.
    pub fn cancel(&self) {
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        log::debug!("cancellation requested");
    }

    /// Whether at least one run is using this token
    pub fn is_in_progress(&self) -> bool {
        self.state.in_progress.load(Ordering::SeqCst)
    }

    /// Start a run. The guard clears the in-progress flag when the last run ends.
    pub fn begin(&self) -> RunGuard<'_> {
        self.state.active_runs.fetch_add(1, Ordering::SeqCst);
        self.state.in_progress.store(true, Ordering::SeqCst);
        RunGuard {
            token: self,
            generation: self.state.generation.load(Ordering::SeqCst),
        }
    }

    fn generation(&self) -> u64 {
        self.state.generation.load(Ordering::SeqCst)
    }
}

/// One in-flight run
#[derive(Debug)]
pub struct RunGuard<'a> {
    token: &'a CancellationToken,
    generation: u64,
}

impl<'a> RunGuard<'a> {
    pub fn scope(&self) -> RunScope<'a> {
        RunScope {
            token: self.token,
            generation: self.generation,
        }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.token.state.active_runs.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.token.state.in_progress.store(false, Ordering::SeqCst);
        }
    }
}

/// Copyable view of a run, usable from worker threads
#[derive(Debug, Clone, Copy)]
pub struct RunScope<'a> {
    token: &'a CancellationToken,
    generation: u64,
}

impl RunScope<'_> {
    pub fn is_cancelled(&self) -> bool {
        self.token.generation() != self.generation
    }
}

/// Cancellation check bound to a stage
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint<'a> {
    stage: Stage,
    scope: Option<RunScope<'a>>,
}

impl Checkpoint<'_> {
    pub fn check(&self) -> Result<()> {
        match self.scope {
            Some(scope) if scope.is_cancelled() => {
                log::info!("analysis cancelled during {} stage", self.stage);
                Err(AnalysisError::Cancelled { stage: self.stage })
            }
            _ => Ok(()),
        }
    }
}

/// Progress notification. `progress` is the global fraction in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub message: String,
    pub progress: f32,
}

/// Forwards progress events to an optional callback, keeping them monotonic
pub struct ProgressSink<'a> {
    callback: Option<&'a mut dyn FnMut(&ProgressEvent)>,
    last: f32,
}

impl<'a> ProgressSink<'a> {
    pub fn new(callback: Option<&'a mut dyn FnMut(&ProgressEvent)>) -> Self {
        Self {
            callback,
            last: 0.0,
        }
    }

    pub fn silent() -> Self {
        Self::new(None)
    }

    pub fn emit(&mut self, stage: Stage, message: &str, progress: f32) {
        let progress = progress.clamp(self.last, 1.0);
        self.last = progress;
        if let Some(callback) = self.callback.as_mut() {
            callback(&ProgressEvent {
                stage,
                message: message.to_string(),
                progress,
            });
        }
        std::thread::yield_now();
    }
}

/// Everything an analyzer needs from the coordinator: its stage, cancellation and a
/// slice of the global progress range.
pub struct StageContext<'a, 'p> {
    checkpoint: Checkpoint<'a>,
    progress: Option<&'a mut ProgressSink<'p>>,
    start: f32,
    end: f32,
}

impl<'a, 'p> StageContext<'a, 'p> {
    pub fn new(
        stage: Stage,
        scope: RunScope<'a>,
        progress: &'a mut ProgressSink<'p>,
        start: f32,
        end: f32,
    ) -> Self {
        Self {
            checkpoint: Checkpoint {
                stage,
                scope: Some(scope),
            },
            progress: Some(progress),
            start,
            end,
        }
    }

    /// Context for running a single analyzer outside the coordinator
    pub fn standalone(stage: Stage) -> StageContext<'static, 'static> {
        StageContext {
            checkpoint: Checkpoint { stage, scope: None },
            progress: None,
            start: 0.0,
            end: 1.0,
        }
    }

    pub fn stage(&self) -> Stage {
        self.checkpoint.stage
    }

    pub fn checkpoint(&self) -> Checkpoint<'a> {
        self.checkpoint
    }

    pub fn check(&self) -> Result<()> {
        self.checkpoint.check()
    }

    /// Report stage-local progress in [0, 1]; also yields to the host.
    pub fn report(&mut self, message: &str, fraction: f32) {
        let stage = self.checkpoint.stage;
        let global = self.start + (self.end - self.start) * fraction.clamp(0.0, 1.0);
        if let Some(sink) = self.progress.as_mut() {
            sink.emit(stage, message, global);
        }
    }
}
