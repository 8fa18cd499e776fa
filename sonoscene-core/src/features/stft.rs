//! Short-time Fourier transform on top of `realfft`

use crate::error::{Result, SonoSceneError};
use ndarray::Array2;
use num_complex::Complex32;
use realfft::RealFftPlanner;
use std::f32::consts::PI;

/// Periodic Hann window of `len` samples (the DFT-even form used for spectral analysis)
pub fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / len as f32).cos())
        .collect()
}

/// Complex spectrogram, shape `[n_fft / 2 + 1, frames]`.
///
/// With `center` the signal is reflect-padded by `n_fft / 2` on both sides so frame `t`
/// is centered on sample `t * hop_length`, giving `1 + len / hop_length` frames. Without it
/// frames start at `t * hop_length` and only whole frames are kept.
pub fn stft(
    samples: &[f32],
    n_fft: usize,
    hop_length: usize,
    center: bool,
) -> Result<Array2<Complex32>> {
    if n_fft < 2 || hop_length == 0 {
        return Err(SonoSceneError::InvalidArgument(format!(
            "STFT needs n_fft >= 2 and hop_length >= 1, got {} and {}",
            n_fft, hop_length
        )));
    }

    let padded;
    let signal: &[f32] = if center {
        padded = reflect_pad(samples, n_fft / 2)?;
        &padded
    } else {
        samples
    };

    if signal.len() < n_fft {
        return Err(SonoSceneError::InvalidArgument(format!(
            "Signal of {} samples is shorter than one {}-sample frame",
            signal.len(),
            n_fft
        )));
    }

    let num_frames = 1 + (signal.len() - n_fft) / hop_length;
    let num_bins = n_fft / 2 + 1;
    let window = hann_window(n_fft);

    let mut planner = RealFftPlanner::<f32>::new();
    let r2c = planner.plan_fft_forward(n_fft);
    let mut frame = r2c.make_input_vec();
    let mut spectrum = r2c.make_output_vec();

    let mut out = Array2::<Complex32>::zeros((num_bins, num_frames));
    for t in 0..num_frames {
        let start = t * hop_length;
        for ((dst, &src), &w) in frame
            .iter_mut()
            .zip(&signal[start..start + n_fft])
            .zip(&window)
        {
            *dst = src * w;
        }
        r2c.process(&mut frame, &mut spectrum)
            .map_err(|e| SonoSceneError::Transform(e.to_string()))?;
        for (k, value) in spectrum.iter().enumerate() {
            out[[k, t]] = *value;
        }
    }
    Ok(out)
}

/// Mirror `pad` samples onto each end without repeating the edge sample.
///
/// Pads longer than the signal keep reflecting back and forth, so the result is the
/// even periodic extension with period `2 * (len - 1)`.
fn reflect_pad(samples: &[f32], pad: usize) -> Result<Vec<f32>> {
    let n = samples.len();
    if n == 0 {
        return Err(SonoSceneError::InvalidArgument(
            "Cannot reflect-pad an empty signal".to_string(),
        ));
    }
    if pad == 0 {
        return Ok(samples.to_vec());
    }
    if n == 1 {
        return Ok(vec![samples[0]; 1 + 2 * pad]);
    }

    let period = 2 * (n - 1) as isize;
    let reflect = |i: isize| {
        let m = i.rem_euclid(period) as usize;
        if m < n { samples[m] } else { samples[2 * (n - 1) - m] }
    };
    let pad = pad as isize;
    Ok((-pad..n as isize + pad).map(reflect).collect())
}
