// src/cli/wav.rs
//
// WAV loading for the command-line harness. Uses hound; only uncompressed PCM and IEEE
// float WAV are read.

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::SampleBuffer;

/// Read a WAV file into a validated buffer with samples normalized to [-1.0, 1.0]
pub fn load_wav(path: &Path) -> Result<SampleBuffer> {
    let reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();

    log::debug!(
        "{}: {} Hz, {} channel(s), {}-bit {:?}",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .context("Failed to read float samples")?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                bail!("Unsupported bit depth: {}", spec.bits_per_sample);
            }
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| (v as f64 * scale) as f32))
                .collect::<Result<_, _>>()
                .context("Failed to read integer samples")?
        }
    };

    SampleBuffer::from_interleaved(&samples, spec.channels as usize, spec.sample_rate)
        .with_context(|| format!("Invalid audio in {}", path.display()))
}

/// WAV files at `path`: the file itself, or every `.wav` below a directory
pub fn collect_wav_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        if is_wav(path) {
            files.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        for entry in WalkDir::new(path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && is_wav(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }
    } else {
        bail!("Input not found: {}", path.display());
    }

    Ok(files)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}
