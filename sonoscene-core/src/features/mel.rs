use super::decibel::{DecibelConfig, power_to_db};
use super::stft::stft;
use crate::error::{Result, SonoSceneError};
use ndarray::Array2;

/// Log-mel spectrogram settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MelConfig {
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_mels: usize,
    /// Lowest filter edge in Hz
    pub fmin: f32,
    /// Highest filter edge in Hz, Nyquist when `None`
    pub fmax: Option<f32>,
    pub center: bool,
    pub decibel: DecibelConfig,
}

impl Default for MelConfig {
    fn default() -> Self {
        Self {
            n_fft: 512,
            hop_length: 16,
            n_mels: 128,
            fmin: 20.0,
            fmax: None,
            center: true,
            decibel: DecibelConfig::default(),
        }
    }
}

// Slaney mel scale: linear below 1 kHz, logarithmic above
const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Triangular mel filters, shape `[n_mels, n_fft / 2 + 1]`.
///
/// Filter edges are spaced evenly on the Slaney mel scale between `fmin` and `fmax`, and
/// each filter is scaled by `2 / bandwidth` so that all filters carry equal area.
pub fn mel_filterbank(
    sample_rate: u32,
    n_fft: usize,
    n_mels: usize,
    fmin: f32,
    fmax: Option<f32>,
) -> Result<Array2<f32>> {
    let nyquist = sample_rate as f32 / 2.0;
    let fmax = fmax.unwrap_or(nyquist);
    if sample_rate == 0 || n_fft < 2 || n_mels == 0 {
        return Err(SonoSceneError::InvalidArgument(format!(
            "Mel filterbank needs a sample rate, n_fft >= 2 and n_mels >= 1 \
             (got {} Hz, {}, {})",
            sample_rate, n_fft, n_mels
        )));
    }
    if !(fmin >= 0.0 && fmin < fmax && fmax <= nyquist) {
        return Err(SonoSceneError::InvalidArgument(format!(
            "Mel band [{} Hz, {} Hz] must satisfy 0 <= fmin < fmax <= {} Hz",
            fmin, fmax, nyquist
        )));
    }

    let num_bins = n_fft / 2 + 1;
    let fft_freqs: Vec<f64> = (0..num_bins)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect();

    let mel_min = hz_to_mel(fmin as f64);
    let mel_max = hz_to_mel(fmax as f64);
    let edges: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64))
        .collect();

    let mut weights = Array2::<f32>::zeros((n_mels, num_bins));
    for m in 0..n_mels {
        let (lo, mid, hi) = (edges[m], edges[m + 1], edges[m + 2]);
        let norm = 2.0 / (hi - lo);
        for (k, &f) in fft_freqs.iter().enumerate() {
            let lower = (f - lo) / (mid - lo);
            let upper = (hi - f) / (hi - mid);
            let w = lower.min(upper).max(0.0);
            weights[[m, k]] = (w * norm) as f32;
        }
    }

    if let Some(empty) = weights.rows().into_iter().position(|row| row.iter().all(|&w| w == 0.0)) {
        log::warn!(
            "Mel filter {} of {} is empty; n_mels may be too high for n_fft = {}",
            empty,
            n_mels,
            n_fft
        );
    }
    Ok(weights)
}

/// Mel power spectrogram in decibels, shape `[n_mels, frames]`
pub fn mel_spectrogram(samples: &[f32], sample_rate: u32, config: &MelConfig) -> Result<Array2<f32>> {
    let spectrum = stft(samples, config.n_fft, config.hop_length, config.center)?;
    let power = spectrum.mapv(|c| c.norm_sqr());
    let filters = mel_filterbank(
        sample_rate,
        config.n_fft,
        config.n_mels,
        config.fmin,
        config.fmax,
    )?;

    let mel = filters.dot(&power);
    Ok(power_to_db(&mel, &config.decibel))
}
