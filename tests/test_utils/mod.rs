//! Synthetic signal generators shared by the integration tests
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use speechcheckr::SampleBuffer;
use std::f32::consts::PI;

pub fn frames(sample_rate: u32, seconds: f32) -> usize {
    (sample_rate as f32 * seconds).round() as usize
}

pub fn silence(sample_rate: u32, seconds: f32) -> Vec<f32> {
    vec![0.0; frames(sample_rate, seconds)]
}

/// Sine wave with the given peak amplitude
pub fn sine(frequency: f32, amplitude: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    (0..frames(sample_rate, seconds))
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

/// Sine whose RMS is `rms_db` dBFS
pub fn sine_at_rms_db(frequency: f32, rms_db: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let amplitude = 10f32.powf(rms_db / 20.0) * std::f32::consts::SQRT_2;
    sine(frequency, amplitude, sample_rate, seconds)
}

/// Seeded uniform white noise in [-amplitude, amplitude]
pub fn white_noise(amplitude: f32, sample_rate: u32, seconds: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..frames(sample_rate, seconds))
        .map(|_| rng.gen_range(-amplitude..=amplitude))
        .collect()
}

/// Noise with a syllable-rate (4 Hz) envelope, scaled so its peak is `peak_dbfs`
pub fn speech_like(peak_dbfs: f32, sample_rate: u32, seconds: f32, seed: u64) -> Vec<f32> {
    let mut samples: Vec<f32> = white_noise(1.0, sample_rate, seconds, seed)
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let t = i as f32 / sample_rate as f32;
            let envelope = 0.3 + 0.7 * (PI * 4.0 * t).sin().abs();
            s * envelope
        })
        .collect();
    scale_to_peak(&mut samples, peak_dbfs);
    samples
}

pub fn scale_to_peak(samples: &mut [f32], peak_dbfs: f32) {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        let gain = 10f32.powf(peak_dbfs / 20.0) / peak;
        samples.iter_mut().for_each(|s| *s *= gain);
    }
}

/// Pin `len` samples from `start` to `level`, keeping each sample's sign
pub fn insert_clip(samples: &mut [f32], start: usize, len: usize, level: f32) {
    samples[start..start + len]
        .iter_mut()
        .for_each(|s| *s = if *s < 0.0 { -level } else { level });
}

/// Exponentially decaying 1 kHz bursts, one per time constant, separated by silence
pub fn decaying_bursts(time_constants: &[f32], sample_rate: u32) -> Vec<f32> {
    let spacing = 2 * sample_rate as usize;
    let lead = sample_rate as usize / 2;
    let mut samples = vec![0.0f32; lead + spacing * time_constants.len()];
    for (k, &tau) in time_constants.iter().enumerate() {
        // Align each burst with an onset window boundary
        let start = (lead + k * spacing) / 1024 * 1024;
        for n in 0..spacing - 1024 {
            let t = n as f32 / sample_rate as f32;
            samples[start + n] = 0.5 * (-t / tau).exp() * (2.0 * PI * 1000.0 * t).sin();
        }
    }
    samples
}

pub fn concat(parts: &[Vec<f32>]) -> Vec<f32> {
    parts.iter().flatten().copied().collect()
}

pub fn mono(samples: Vec<f32>, sample_rate: u32) -> SampleBuffer {
    SampleBuffer::new(vec![samples], sample_rate).expect("valid mono buffer")
}

pub fn stereo(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> SampleBuffer {
    SampleBuffer::new(vec![left, right], sample_rate).expect("valid stereo buffer")
}
