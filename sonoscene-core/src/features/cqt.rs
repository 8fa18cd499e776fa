//! Constant-Q transform via sparse spectral kernels.
//!
//! Each frequency bin `k` has a Hann-windowed complex exponential at `f_k` whose length
//! shrinks as the frequency grows, so every bin spans the same number of cycles. The
//! kernels are moved to the frequency domain once, pruned to the few FFT bins that carry
//! almost all of their mass, and then applied to the spectrum of every signal frame.
//!
//! Kernels are L1-normalized; with [`CqtConfig::scale`] each bin is further multiplied by
//! the square root of its filter length.

use super::decibel::{DecibelConfig, power_to_db};
use crate::error::{Result, SonoSceneError};
use ndarray::Array2;
use num_complex::Complex32;
use realfft::RealFftPlanner;
use rustfft::FftPlanner;
use std::f64::consts::PI;

/// Frequency of C1 in Hz
pub const C1_HZ: f32 = 32.703_196;

/// Equivalent noise bandwidth of the Hann window, in FFT bins
const HANN_BANDWIDTH: f64 = 1.500_18;

/// Constant-Q transform settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CqtConfig {
    pub hop_length: usize,
    pub n_bins: usize,
    pub bins_per_octave: usize,
    /// Scales every filter length; below 1 trades frequency for time resolution
    pub filter_scale: f32,
    /// Center of the lowest bin in Hz, C1 when `None`
    pub fmin: Option<f32>,
    /// Fraction of each kernel's spectral mass that may be dropped
    pub sparsity: f32,
    /// Multiply each bin by `sqrt(filter length)`
    pub scale: bool,
    pub decibel: DecibelConfig,
}

impl Default for CqtConfig {
    fn default() -> Self {
        Self {
            hop_length: 256,
            n_bins: 256,
            bins_per_octave: 32,
            filter_scale: 0.1,
            fmin: None,
            sparsity: 0.01,
            scale: true,
            decibel: DecibelConfig::default(),
        }
    }
}

impl CqtConfig {
    /// Quality factor, center frequency over bandwidth
    pub fn q(&self) -> f64 {
        self.filter_scale as f64 / (2f64.powf(1.0 / self.bins_per_octave as f64) - 1.0)
    }

    /// Center frequency of every bin, ascending
    pub fn frequencies(&self) -> Vec<f64> {
        let fmin = self.fmin.unwrap_or(C1_HZ) as f64;
        (0..self.n_bins)
            .map(|k| fmin * 2f64.powf(k as f64 / self.bins_per_octave as f64))
            .collect()
    }

    /// Filter length in samples of every bin, `Q * sample_rate / f_k`
    pub fn filter_lengths(&self, sample_rate: u32) -> Vec<f64> {
        let q = self.q();
        self.frequencies()
            .iter()
            .map(|&f| q * sample_rate as f64 / f)
            .collect()
    }

    fn validate(&self, sample_rate: u32) -> Result<()> {
        if self.hop_length == 0 || self.n_bins == 0 || self.bins_per_octave == 0 {
            return Err(SonoSceneError::InvalidArgument(format!(
                "CQT needs positive hop_length, n_bins and bins_per_octave (got {}, {}, {})",
                self.hop_length, self.n_bins, self.bins_per_octave
            )));
        }
        if !(self.filter_scale > 0.0 && self.filter_scale.is_finite()) {
            return Err(SonoSceneError::InvalidArgument(format!(
                "CQT filter_scale must be positive, got {}",
                self.filter_scale
            )));
        }
        if !(0.0..1.0).contains(&self.sparsity) {
            return Err(SonoSceneError::InvalidArgument(format!(
                "CQT sparsity must be in [0, 1), got {}",
                self.sparsity
            )));
        }
        if let Some(fmin) = self.fmin {
            if !(fmin > 0.0 && fmin.is_finite()) {
                return Err(SonoSceneError::InvalidArgument(format!(
                    "CQT fmin must be positive, got {}",
                    fmin
                )));
            }
        }

        let nyquist = sample_rate as f64 / 2.0;
        let top = self.frequencies().last().copied().unwrap_or_default();
        let filter_top = top * (1.0 + 0.5 * HANN_BANDWIDTH / self.q());
        if filter_top > nyquist {
            return Err(SonoSceneError::InvalidArgument(format!(
                "Highest CQT filter reaches {:.1} Hz, above the Nyquist frequency {:.1} Hz; \
                 lower n_bins or fmin",
                filter_top, nyquist
            )));
        }
        Ok(())
    }
}

/// Nonzero FFT bins of one kernel
struct SparseKernel {
    indices: Vec<usize>,
    values: Vec<Complex32>,
}

/// Precomputed kernels for one sample rate and configuration.
pub struct CqtKernel {
    n_fft: usize,
    hop_length: usize,
    kernels: Vec<SparseKernel>,
}

impl CqtKernel {
    pub fn new(sample_rate: u32, config: &CqtConfig) -> Result<Self> {
        config.validate(sample_rate)?;

        let q = config.q();
        let sr = sample_rate as f64;
        let freqs = config.frequencies();
        let filter_lengths = config.filter_lengths(sample_rate);
        let lengths: Vec<usize> = filter_lengths.iter().map(|l| l.ceil() as usize).collect();
        let n_fft = lengths.iter().copied().max().unwrap_or(1).next_power_of_two();
        let num_bins = n_fft / 2 + 1;

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n_fft);

        let mut kernels = Vec::with_capacity(freqs.len());
        let mut buffer = vec![Complex32::new(0.0, 0.0); n_fft];
        for ((&freq, &len), &exact_len) in freqs.iter().zip(&lengths).zip(&filter_lengths) {
            buffer.fill(Complex32::new(0.0, 0.0));

            let start = (n_fft - len) / 2;
            let half = (len / 2) as f64;
            let mut l1 = 0.0f64;
            let mut atoms = Vec::with_capacity(len);
            for n in 0..len {
                let window = 0.5 - 0.5 * (2.0 * PI * n as f64 / len as f64).cos();
                let phase = 2.0 * PI * freq * (n as f64 - half) / sr;
                let atom = (window * phase.cos(), window * phase.sin());
                l1 += window;
                atoms.push(atom);
            }
            let gain = (if config.scale { exact_len.sqrt() } else { 1.0 }) / l1;
            for (slot, (re, im)) in buffer[start..start + len].iter_mut().zip(atoms) {
                *slot = Complex32::new((re * gain) as f32, (im * gain) as f32);
            }

            fft.process(&mut buffer);
            kernels.push(sparsify(&buffer[..num_bins], config.sparsity));
        }

        let kept: usize = kernels.iter().map(|k| k.indices.len()).sum();
        log::debug!(
            "CQT kernel: {} bins, n_fft {}, Q {:.3}, {} nonzero weights",
            kernels.len(),
            n_fft,
            q,
            kept
        );

        Ok(Self {
            n_fft,
            hop_length: config.hop_length,
            kernels,
        })
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Complex response, shape `[n_bins, 1 + len / hop_length]`.
    ///
    /// Frame `t` is centered on sample `t * hop_length`; the signal is zero-padded past
    /// both ends.
    pub fn transform(&self, samples: &[f32]) -> Result<Array2<Complex32>> {
        let half = self.n_fft / 2;
        let num_frames = 1 + samples.len() / self.hop_length;

        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(self.n_fft);
        let mut frame = r2c.make_input_vec();
        let mut spectrum = r2c.make_output_vec();
        let scale = 1.0 / self.n_fft as f32;

        let mut out = Array2::<Complex32>::zeros((self.kernels.len(), num_frames));
        for t in 0..num_frames {
            frame.fill(0.0);
            // Frame covers [center - half, center + half) in signal coordinates
            let center = t * self.hop_length;
            let lo = center.saturating_sub(half);
            let hi = (center + half).min(samples.len());
            if lo < hi {
                let offset = lo + half - center;
                frame[offset..offset + (hi - lo)].copy_from_slice(&samples[lo..hi]);
            }

            r2c.process(&mut frame, &mut spectrum)
                .map_err(|e| SonoSceneError::Transform(e.to_string()))?;

            for (k, kernel) in self.kernels.iter().enumerate() {
                let response: Complex32 = kernel
                    .indices
                    .iter()
                    .zip(&kernel.values)
                    .map(|(&j, w)| spectrum[j] * w.conj())
                    .sum();
                out[[k, t]] = response * scale;
            }
        }
        Ok(out)
    }
}

/// Keep the largest-magnitude weights covering `1 - sparsity` of the row's L1 mass
fn sparsify(row: &[Complex32], sparsity: f32) -> SparseKernel {
    let mut order: Vec<usize> = (0..row.len()).collect();
    order.sort_by(|&a, &b| row[b].norm().total_cmp(&row[a].norm()));

    let total: f32 = row.iter().map(|c| c.norm()).sum();
    let target = (1.0 - sparsity) * total;

    let mut indices = Vec::new();
    let mut mass = 0.0f32;
    for j in order {
        if mass >= target && !indices.is_empty() {
            break;
        }
        mass += row[j].norm();
        indices.push(j);
    }
    indices.sort_unstable();

    let values = indices.iter().map(|&j| row[j]).collect();
    SparseKernel { indices, values }
}

/// Constant-Q magnitude in decibels, shape `[n_bins, frames]`.
///
/// The magnitude itself goes through [`power_to_db`], so a bin reads `10 * log10(|C|)`.
pub fn cqt_spectrogram(samples: &[f32], sample_rate: u32, config: &CqtConfig) -> Result<Array2<f32>> {
    let kernel = CqtKernel::new(sample_rate, config)?;
    let response = kernel.transform(samples)?;
    let magnitude = response.mapv(|c| c.norm());
    Ok(power_to_db(&magnitude, &config.decibel))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate as f64).sin() as f32)
            .collect()
    }

    #[test]
    fn test_default_geometry() {
        let config = CqtConfig::default();
        let freqs = config.frequencies();
        assert_eq!(freqs.len(), 256);
        assert!((freqs[0] - 32.703).abs() < 1e-3);
        // One octave up every 32 bins
        assert!((freqs[32] / freqs[0] - 2.0).abs() < 1e-9);
        assert!((config.q() - 4.5668).abs() < 1e-3);
    }

    #[test]
    fn test_nyquist_guard() {
        let config = CqtConfig::default();
        // Top bin is ~8.2 kHz, which needs more than a 16 kHz sample rate
        assert!(matches!(
            CqtKernel::new(16000, &config),
            Err(SonoSceneError::InvalidArgument(_))
        ));
        assert!(CqtKernel::new(48000, &config).is_ok());
    }

    #[test]
    fn test_frame_count_and_shape() {
        let config = CqtConfig {
            n_bins: 48,
            bins_per_octave: 12,
            filter_scale: 1.0,
            fmin: Some(110.0),
            ..Default::default()
        };
        let samples = vec![0.0f32; 3000];
        let out = cqt_spectrogram(&samples, 16000, &config).unwrap();
        assert_eq!(out.dim(), (48, 1 + 3000 / 256));
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        let config = CqtConfig {
            n_bins: 48,
            bins_per_octave: 12,
            filter_scale: 1.0,
            fmin: Some(110.0),
            scale: false,
            ..Default::default()
        };
        // Bin 24 is two octaves above fmin
        let samples = tone(440.0, 16000, 16000);
        let kernel = CqtKernel::new(16000, &config).unwrap();
        let response = kernel.transform(&samples).unwrap();

        let column = response.column(response.ncols() / 2);
        let peak = column
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak, 24);
        // L1-normalized kernels see a unit sine at about half amplitude
        assert!((column[24].norm() - 0.5).abs() < 0.1);
    }

    #[test]
    fn test_unit_tone_decibels() {
        let config = CqtConfig {
            n_bins: 48,
            bins_per_octave: 12,
            filter_scale: 1.0,
            fmin: Some(110.0),
            ..Default::default()
        };
        let samples = tone(440.0, 16000, 16000);
        let db = cqt_spectrogram(&samples, 16000, &config).unwrap();
        let mid = db.ncols() / 2;

        // Half amplitude times sqrt of the ~611.5-sample filter, then 10 * log10
        let length = config.filter_lengths(16000)[24];
        assert!((length - 611.5).abs() < 0.5);
        let expected = 10.0 * (0.5 * length.sqrt()).log10() as f32;
        assert!((db[[24, mid]] - expected).abs() < 0.5, "{}", db[[24, mid]]);
        assert!((db[[24, mid]] - 10.92).abs() < 0.5);

        let unscaled = CqtConfig {
            scale: false,
            ..config
        };
        let db = cqt_spectrogram(&samples, 16000, &unscaled).unwrap();
        assert!((db[[24, mid]] - -3.01).abs() < 0.5, "{}", db[[24, mid]]);
    }

    #[test]
    fn test_scale_tilts_by_filter_length() {
        let base = CqtConfig {
            n_bins: 48,
            bins_per_octave: 12,
            filter_scale: 1.0,
            fmin: Some(110.0),
            scale: false,
            ..Default::default()
        };
        let scaled = CqtConfig { scale: true, ..base };
        let samples = tone(880.0, 16000, 16000);

        let plain = CqtKernel::new(16000, &base).unwrap().transform(&samples).unwrap();
        let boosted = CqtKernel::new(16000, &scaled).unwrap().transform(&samples).unwrap();
        let lengths = base.filter_lengths(16000);
        let mid = plain.ncols() / 2;
        let ratio = boosted[[36, mid]].norm() / plain[[36, mid]].norm();
        assert!((ratio as f64 - lengths[36].sqrt()).abs() / lengths[36].sqrt() < 1e-3);
        assert!(lengths[12] > lengths[36]);
    }

    #[test]
    fn test_sparsify_keeps_dominant_mass() {
        let row = vec![
            Complex32::new(10.0, 0.0),
            Complex32::new(0.01, 0.0),
            Complex32::new(0.0, 5.0),
            Complex32::new(0.02, 0.0),
        ];
        let kernel = sparsify(&row, 0.01);
        assert_eq!(kernel.indices, vec![0, 2]);

        let dense = sparsify(&row, 0.0);
        assert_eq!(dense.indices.len(), 4);
    }

    #[test]
    fn test_invalid_config() {
        let bad_sparsity = CqtConfig {
            sparsity: 1.0,
            ..Default::default()
        };
        assert!(CqtKernel::new(48000, &bad_sparsity).is_err());

        let no_bins = CqtConfig {
            n_bins: 0,
            ..Default::default()
        };
        assert!(CqtKernel::new(48000, &no_bins).is_err());
    }
}
