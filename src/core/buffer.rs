// src/core/buffer.rs
//
// In-memory sample buffer handed to the analysis engine by its host.

use super::error::BufferError;

/// Decoded audio as planar channels normalized to [-1.0, 1.0]
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
    frame_count: usize,
}

impl SampleBuffer {
    /// Build a buffer from planar channel data.
    ///
    /// Every channel must have the same, non-zero length and every sample must be
    /// finite. Values outside [-1.0, 1.0] are accepted and read as full-scale by the
    /// clipping detector.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, BufferError> {
        if sample_rate == 0 {
            return Err(BufferError::InvalidSampleRate);
        }
        let first = channels.first().ok_or(BufferError::NoChannels)?;
        let frame_count = first.len();
        if frame_count == 0 {
            return Err(BufferError::Empty);
        }

        for (channel, samples) in channels.iter().enumerate() {
            if samples.len() != frame_count {
                return Err(BufferError::ChannelLengthMismatch {
                    channel,
                    expected: frame_count,
                    actual: samples.len(),
                });
            }
            if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
                return Err(BufferError::NonFiniteSample { channel, index });
            }
        }

        Ok(Self {
            channels,
            sample_rate,
            frame_count,
        })
    }

    /// Build a buffer from interleaved samples (frame-major, as decoders emit them)
    pub fn from_interleaved(
        samples: &[f32],
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self, BufferError> {
        if channel_count == 0 {
            return Err(BufferError::NoChannels);
        }
        if samples.len() % channel_count != 0 {
            return Err(BufferError::InterleavedLength {
                len: samples.len(),
                channels: channel_count,
            });
        }

        let frames = samples.len() / channel_count;
        let mut channels: Vec<Vec<f32>> = (0..channel_count)
            .map(|_| Vec::with_capacity(frames))
            .collect();
        for frame in samples.chunks_exact(channel_count) {
            for (ch, &sample) in frame.iter().enumerate() {
                channels[ch].push(sample);
            }
        }

        Self::new(channels, sample_rate)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Total samples across all channels
    pub fn total_samples(&self) -> usize {
        self.frame_count * self.channels.len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count as f64 / self.sample_rate as f64
    }

    /// Left/right pair when the buffer is exactly stereo
    pub fn stereo_pair(&self) -> Option<(&[f32], &[f32])> {
        match self.channels.as_slice() {
            [left, right] => Some((left.as_slice(), right.as_slice())),
            _ => None,
        }
    }
}
