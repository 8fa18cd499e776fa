//! Leading/trailing silence removal

/// Threshold used when silence trimming is enabled without an explicit value
pub const DEFAULT_TRIM_TOP_DB: f32 = 40.0;

const FRAME_LENGTH: usize = 2048;
const HOP_LENGTH: usize = 512;

/// Strip leading and trailing silence from a mono signal.
///
/// Frames of 2048 samples (hop 512, centered) are scored by mean-square energy relative
/// to the loudest frame; audio is kept from the first to the last frame within `top_db`
/// of that peak. An all-silent signal trims to an empty slice.
pub fn trim_silence(samples: &[f32], top_db: f32) -> &[f32] {
    if samples.len() < 2 {
        return samples;
    }

    let energies = frame_energies(samples);
    let peak = energies.iter().copied().fold(0.0f64, f64::max);
    let floor = 1e-10f64;
    if peak <= floor {
        return &samples[..0];
    }
    let peak_db = 10.0 * peak.max(floor).log10();

    let loud = |energy: &f64| 10.0 * energy.max(floor).log10() - peak_db > -(top_db as f64);

    let Some(first) = energies.iter().position(loud) else {
        return &samples[..0];
    };
    // `first` exists, so `last` does too
    let last = energies.iter().rposition(loud).unwrap_or(first);

    let start = (first * HOP_LENGTH).min(samples.len());
    let end = ((last + 1) * HOP_LENGTH).min(samples.len());
    &samples[start..end]
}

/// Mean-square energy of zero-padded, centered frames
fn frame_energies(samples: &[f32]) -> Vec<f64> {
    let half = FRAME_LENGTH / 2;
    let num_frames = 1 + samples.len() / HOP_LENGTH;

    (0..num_frames)
        .map(|frame| {
            // Frame covers [center - half, center + half) in signal coordinates
            let center = frame * HOP_LENGTH;
            let lo = center.saturating_sub(half);
            let hi = (center + half).min(samples.len());
            let sum: f64 = samples[lo..hi].iter().map(|&s| (s as f64) * (s as f64)).sum();
            sum / FRAME_LENGTH as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_surrounding_silence() {
        let mut signal = vec![0.0f32; 8192];
        signal.extend(std::iter::repeat(0.5).take(8192));
        signal.extend(vec![0.0f32; 8192]);

        let trimmed = trim_silence(&signal, DEFAULT_TRIM_TOP_DB);
        // Frame granularity keeps a little context around the burst
        assert!(trimmed.len() >= 8192);
        assert!(trimmed.len() < 8192 + 2 * FRAME_LENGTH + HOP_LENGTH);
        assert!(trimmed.iter().any(|&s| s == 0.5));
    }

    #[test]
    fn test_all_silent_trims_to_empty() {
        let signal = vec![0.0f32; 4096];
        assert!(trim_silence(&signal, DEFAULT_TRIM_TOP_DB).is_empty());
    }

    #[test]
    fn test_loud_signal_untouched() {
        let signal = vec![0.25f32; 10000];
        assert_eq!(trim_silence(&signal, DEFAULT_TRIM_TOP_DB).len(), 10000);
    }
}
