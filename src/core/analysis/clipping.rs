// src/core/analysis/clipping.rs
//
// Hard clipping (samples pinned at full scale) and near-clipping (0.98 up to full
// scale), tracked per channel.
//
// A region may dip below its level for up to `gap_tolerance` samples without ending,
// so intermittent clipping of one transient stays one event (ClipDaT-style grouping).
// Regions need `max(2, sample_rate / 20000)` qualifying samples to count: a lone
// full-scale sample at 96 kHz is not reported while a short run at 44.1 kHz is.
//
// Each channel is scanned twice. The first pass finds hard regions; the second finds
// near regions knowing which hard regions were kept. A near run that touches a kept
// hard region is that event's shoulder and is not reported on its own. Hard samples
// that did not form a region are bridged, so the near run around them stays one event.

use log::debug;
use rayon::prelude::*;
use serde::Serialize;
use std::ops::Range;

use crate::config::ClippingConfig;
use crate::core::buffer::SampleBuffer;
use crate::core::cancel::{Checkpoint, StageContext, SAMPLE_CHECK_INTERVAL, SAMPLE_YIELD_INTERVAL};
use crate::core::error::Result;
use crate::detection::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipType {
    Hard,
    Near,
}

/// One clipping event on one channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipRegion {
    pub channel: usize,
    pub clip_type: ClipType,
    pub start_sample: usize,
    /// Inclusive
    pub end_sample: usize,
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Qualifying samples inside the region (gap samples excluded)
    pub sample_count: usize,
    pub peak: f32,
}

impl ClipRegion {
    pub fn span(&self) -> usize {
        self.end_sample - self.start_sample + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelClipping {
    pub channel: usize,
    pub clipped_samples: usize,
    pub clipped_percentage: f64,
    pub near_clipped_samples: usize,
    pub near_clipping_percentage: f64,
    pub region_count: usize,
}

/// Clipping analysis result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClippingAnalysis {
    pub clipped_samples: usize,
    pub clipped_percentage: f64,
    pub near_clipped_samples: usize,
    pub near_clipping_percentage: f64,
    pub clipping_event_count: usize,
    pub near_clipping_event_count: usize,
    /// Largest hard region, in qualifying samples
    pub max_consecutive_clipped: usize,
    /// Mean hard region length in seconds
    pub avg_clipping_duration: f64,
    pub min_consecutive_samples: usize,
    pub channels: Vec<ChannelClipping>,
    /// Worst regions first, truncated to the configured limit
    pub regions: Vec<ClipRegion>,
    pub severity: Severity,
}

/// Severity of a clipping result. Any full-scale sample warns, even one too short to
/// form an event.
pub fn clipping_severity(
    clipped_percentage: f64,
    clipping_event_count: usize,
    near_clipping_percentage: f64,
) -> Severity {
    if clipped_percentage > 1.0 || clipping_event_count > 50 {
        Severity::Error
    } else if clipped_percentage > 0.0
        || clipping_event_count > 0
        || near_clipping_percentage > 1.0
    {
        Severity::Warning
    } else {
        Severity::Pass
    }
}

pub fn detect_clipping(
    buffer: &SampleBuffer,
    config: &ClippingConfig,
    ctx: &mut StageContext<'_, '_>,
) -> Result<ClippingAnalysis> {
    let sample_rate = buffer.sample_rate();
    let min_consecutive = config.min_consecutive(sample_rate);
    let checkpoint = ctx.checkpoint();
    let parallel = config.parallel_channels && buffer.channel_count() > 1;

    ctx.report("Detecting clipping", 0.0);
    ctx.check()?;

    // Segments are sized so each one covers about one yield interval across all channels
    let frames = buffer.frame_count();
    let segment = (SAMPLE_YIELD_INTERVAL / buffer.channel_count()).max(1);
    let segments = frames.div_ceil(segment).max(1);
    let total_steps = (2 * segments) as f32;

    let mut scans: Vec<ChannelScan<'_>> = buffer
        .channels()
        .iter()
        .enumerate()
        .map(|(channel, samples)| ChannelScan::new(channel, samples, config, min_consecutive))
        .collect();

    let mut step = 0usize;
    for pass in [Pass::Hard, Pass::Near] {
        for k in 0..segments {
            let range = (k * segment).min(frames)..((k + 1) * segment).min(frames);
            if parallel {
                scans
                    .par_iter_mut()
                    .try_for_each(|scan| scan.advance(pass, range.clone(), checkpoint))?;
            } else {
                for scan in scans.iter_mut() {
                    scan.advance(pass, range.clone(), checkpoint)?;
                }
            }
            step += 1;
            ctx.report("Detecting clipping", step as f32 / total_steps);
        }
        if pass == Pass::Hard {
            scans.iter_mut().for_each(ChannelScan::finish_hard);
        }
    }

    let results = scans
        .into_iter()
        .map(|scan| scan.finish(sample_rate))
        .collect();
    let result = summarize(results, buffer, config, min_consecutive);
    debug!(
        "clipping: {} hard events, {} near events, {:.4}% clipped (min run {})",
        result.clipping_event_count,
        result.near_clipping_event_count,
        result.clipped_percentage,
        min_consecutive
    );
    ctx.report("Clipping detected", 1.0);

    Ok(result)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Hard,
    Near,
}

struct ChannelResult {
    stats: ChannelClipping,
    regions: Vec<ClipRegion>,
}

/// Scan state for one channel, advanced a segment at a time
struct ChannelScan<'s> {
    channel: usize,
    samples: &'s [f32],
    hard_threshold: f32,
    near_threshold: f32,
    gap_tolerance: usize,
    hard: RegionTracker,
    near: RegionTracker,
    clipped: usize,
    near_clipped: usize,
    hard_regions: Vec<OpenRegion>,
    near_regions: Vec<OpenRegion>,
    /// Index of the first kept hard region not yet passed by the near scan
    next_hard: usize,
    /// Last sample of the most recent kept hard region passed by the near scan
    last_hard_end: Option<usize>,
}

impl<'s> ChannelScan<'s> {
    fn new(channel: usize, samples: &'s [f32], config: &ClippingConfig, min_consecutive: usize) -> Self {
        Self {
            channel,
            samples,
            hard_threshold: config.hard_threshold,
            near_threshold: config.near_threshold,
            gap_tolerance: config.gap_tolerance,
            hard: RegionTracker::new(ClipType::Hard, config.gap_tolerance, min_consecutive),
            near: RegionTracker::new(ClipType::Near, config.gap_tolerance, min_consecutive),
            clipped: 0,
            near_clipped: 0,
            hard_regions: Vec::new(),
            near_regions: Vec::new(),
            next_hard: 0,
            last_hard_end: None,
        }
    }

    fn advance(&mut self, pass: Pass, range: Range<usize>, checkpoint: Checkpoint<'_>) -> Result<()> {
        let samples = self.samples;
        let start = range.start;
        for (offset, &sample) in samples[range].iter().enumerate() {
            let index = start + offset;
            if index % SAMPLE_CHECK_INTERVAL == 0 {
                checkpoint.check()?;
            }
            match pass {
                Pass::Hard => self.hard_step(index, sample.abs()),
                Pass::Near => self.near_step(index, sample.abs()),
            }
        }
        Ok(())
    }

    fn hard_step(&mut self, index: usize, magnitude: f32) {
        let class = if magnitude >= self.hard_threshold {
            self.clipped += 1;
            SampleClass::Qualify
        } else {
            if magnitude >= self.near_threshold {
                self.near_clipped += 1;
            }
            SampleClass::Gap
        };
        self.hard_regions.extend(self.hard.step(index, magnitude, class));
    }

    fn finish_hard(&mut self) {
        self.hard_regions.extend(self.hard.close());
    }

    fn near_step(&mut self, index: usize, magnitude: f32) {
        while let Some(region) = self.hard_regions.get(self.next_hard) {
            if region.last >= index {
                break;
            }
            self.last_hard_end = Some(region.last);
            self.next_hard += 1;
        }

        let inside_kept_hard = self
            .hard_regions
            .get(self.next_hard)
            .is_some_and(|region| region.start <= index);
        if inside_kept_hard {
            // Whatever near run led up to this event is its shoulder
            self.near.discard();
            return;
        }

        let class = if magnitude >= self.hard_threshold {
            SampleClass::Bridge
        } else if magnitude >= self.near_threshold {
            SampleClass::Qualify
        } else {
            SampleClass::Gap
        };
        let trailing_shoulder = self
            .last_hard_end
            .is_some_and(|end| index <= end + self.gap_tolerance + 1);
        self.near_regions
            .extend(self.near.step(index, magnitude, class));
        if trailing_shoulder {
            self.near.mark_shoulder();
        }
    }

    fn finish(mut self, sample_rate: u32) -> ChannelResult {
        self.near_regions.extend(self.near.close());

        let rate = sample_rate as f64;
        let channel = self.channel;
        let mut regions: Vec<ClipRegion> = self
            .hard_regions
            .into_iter()
            .chain(self.near_regions)
            .map(|region| ClipRegion {
                channel,
                clip_type: region.clip_type,
                start_sample: region.start,
                end_sample: region.last,
                start_seconds: region.start as f64 / rate,
                end_seconds: (region.last + 1) as f64 / rate,
                sample_count: region.count,
                peak: region.peak,
            })
            .collect();
        regions.sort_by_key(|region| region.start_sample);

        let len = self.samples.len().max(1) as f64;
        ChannelResult {
            stats: ChannelClipping {
                channel,
                clipped_samples: self.clipped,
                clipped_percentage: self.clipped as f64 / len * 100.0,
                near_clipped_samples: self.near_clipped,
                near_clipping_percentage: self.near_clipped as f64 / len * 100.0,
                region_count: regions.len(),
            },
            regions,
        }
    }
}

fn summarize(
    results: Vec<ChannelResult>,
    buffer: &SampleBuffer,
    config: &ClippingConfig,
    min_consecutive: usize,
) -> ClippingAnalysis {
    let total = buffer.total_samples().max(1) as f64;
    let rate = buffer.sample_rate() as f64;

    let mut channels = Vec::with_capacity(results.len());
    let mut regions = Vec::new();
    for result in results {
        channels.push(result.stats);
        regions.extend(result.regions);
    }

    let clipped_samples: usize = channels.iter().map(|c| c.clipped_samples).sum();
    let near_clipped_samples: usize = channels.iter().map(|c| c.near_clipped_samples).sum();
    let clipped_percentage = clipped_samples as f64 / total * 100.0;
    let near_clipping_percentage = near_clipped_samples as f64 / total * 100.0;

    let hard: Vec<&ClipRegion> = regions
        .iter()
        .filter(|r| r.clip_type == ClipType::Hard)
        .collect();
    let clipping_event_count = hard.len();
    let near_clipping_event_count = regions.len() - clipping_event_count;
    let max_consecutive_clipped = hard.iter().map(|r| r.sample_count).max().unwrap_or(0);
    let avg_clipping_duration = if hard.is_empty() {
        0.0
    } else {
        hard.iter().map(|r| r.span() as f64 / rate).sum::<f64>() / hard.len() as f64
    };

    // Worst first: longer before shorter, then earlier before later
    regions.sort_by(|a, b| {
        b.sample_count
            .cmp(&a.sample_count)
            .then(a.start_sample.cmp(&b.start_sample))
            .then(a.channel.cmp(&b.channel))
    });
    regions.truncate(config.max_reported_regions);

    ClippingAnalysis {
        clipped_samples,
        clipped_percentage,
        near_clipped_samples,
        near_clipping_percentage,
        clipping_event_count,
        near_clipping_event_count,
        max_consecutive_clipped,
        avg_clipping_duration,
        min_consecutive_samples: min_consecutive,
        channels,
        regions,
        severity: clipping_severity(
            clipped_percentage,
            clipping_event_count,
            near_clipping_percentage,
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleClass {
    /// Counts toward the region
    Qualify,
    /// Keeps a region open without counting (stray hard samples inside a near run)
    Bridge,
    /// Below the level
    Gap,
}

#[derive(Debug, Clone)]
struct OpenRegion {
    clip_type: ClipType,
    start: usize,
    last: usize,
    count: usize,
    peak: f32,
    gap: usize,
    shoulder: bool,
}

struct RegionTracker {
    clip_type: ClipType,
    gap_tolerance: usize,
    min_samples: usize,
    open: Option<OpenRegion>,
}

impl RegionTracker {
    fn new(clip_type: ClipType, gap_tolerance: usize, min_samples: usize) -> Self {
        Self {
            clip_type,
            gap_tolerance,
            min_samples,
            open: None,
        }
    }

    /// Feed one sample; returns a region when this sample closed one that qualifies
    fn step(&mut self, index: usize, magnitude: f32, class: SampleClass) -> Option<OpenRegion> {
        match (class, self.open.as_mut()) {
            (SampleClass::Gap, Some(region)) => {
                region.gap += 1;
                if region.gap > self.gap_tolerance {
                    return self.close();
                }
            }
            (SampleClass::Gap, None) => {}
            (class, Some(region)) => {
                region.last = index;
                region.gap = 0;
                region.peak = region.peak.max(magnitude);
                if class == SampleClass::Qualify {
                    region.count += 1;
                }
            }
            (class, None) => {
                self.open = Some(OpenRegion {
                    clip_type: self.clip_type,
                    start: index,
                    last: index,
                    count: usize::from(class == SampleClass::Qualify),
                    peak: magnitude,
                    gap: 0,
                    shoulder: false,
                });
            }
        }
        None
    }

    /// Flag the open region, if any, as part of a neighbouring hard event
    fn mark_shoulder(&mut self) {
        if let Some(region) = self.open.as_mut() {
            region.shoulder = true;
        }
    }

    fn discard(&mut self) {
        self.open = None;
    }

    fn close(&mut self) -> Option<OpenRegion> {
        self.open
            .take()
            .filter(|region| region.count >= self.min_samples && !region.shoulder)
    }
}
