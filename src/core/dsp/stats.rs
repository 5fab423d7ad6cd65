//! Level and statistics helpers shared by the analyzers

use std::cmp::Ordering;

/// Compute RMS (Root Mean Square), accumulated in f64
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Compute peak amplitude
pub fn peak_amplitude(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
}

/// Convert amplitude to dBFS. Zero maps to negative infinity.
pub fn amplitude_to_db(amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        20.0 * amplitude.log10()
    } else {
        f64::NEG_INFINITY
    }
}

/// Convert dB to amplitude
pub fn db_to_amplitude(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Median of a slice (sorts in place). Even counts average the middle pair.
pub fn median(data: &mut [f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }

    data.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = data.len() / 2;
    if data.len() % 2 == 0 {
        Some((data[mid - 1] + data[mid]) / 2.0)
    } else {
        Some(data[mid])
    }
}

/// Nearest-rank percentile of already sorted data, `p` in [0, 1]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p.clamp(0.0, 1.0) * sorted.len() as f64).floor() as usize;
    Some(sorted[rank.min(sorted.len() - 1)])
}

/// Pearson correlation of two equally long signals (mean-centred).
///
/// Returns 0.0 when either signal has no variance.
pub fn pearson_correlation(a: &[f32], b: &[f32]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let mean_a = a[..n].iter().map(|&x| x as f64).sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().map(|&x| x as f64).sum::<f64>() / n as f64;

    let mut cov = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for (&x, &y) in a[..n].iter().zip(&b[..n]) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a < 1e-20 || var_b < 1e-20 {
        return 0.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms() {
        let samples = vec![1.0, -1.0, 1.0, -1.0];
        assert!((rms(&samples) - 1.0).abs() < 0.001);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_db_conversions() {
        assert!((amplitude_to_db(0.5) + 6.0206).abs() < 1e-3);
        assert_eq!(amplitude_to_db(0.0), f64::NEG_INFINITY);
        assert!((db_to_amplitude(-6.0206) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_percentile_sorted() {
        let data: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert_eq!(percentile_sorted(&data, 0.1), Some(10.0));
        assert_eq!(percentile_sorted(&data, 1.0), Some(99.0));
    }

    #[test]
    fn test_correlation() {
        let a: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.05).sin()).collect();
        let scaled: Vec<f32> = a.iter().map(|x| x * 0.3).collect();
        let inverted: Vec<f32> = a.iter().map(|x| -x).collect();

        assert!((pearson_correlation(&a, &scaled) - 1.0).abs() < 1e-9);
        assert!((pearson_correlation(&a, &inverted) + 1.0).abs() < 1e-9);
        assert_eq!(pearson_correlation(&a, &vec![0.2; 1000]), 0.0);
    }
}
