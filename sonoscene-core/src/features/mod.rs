//! Time-frequency features for rendered audio.
//!
//! [`extract_features`] turns a file or a mono buffer into a decibel-scaled log-mel or
//! constant-Q spectrogram laid out as `[frequency_bin, time_frame]`, both axes ascending.
//!
//! ```
//! use sonoscene_core::features::{FeatureInput, MelConfig, ReadOptions, TransformKind, extract_features};
//!
//! let samples = vec![0.0f32; 16000];
//! let mel = extract_features(
//!     FeatureInput::Samples(&samples),
//!     Some(16000),
//!     &TransformKind::Mel(MelConfig::default()),
//!     &ReadOptions::default(),
//! )?;
//! assert_eq!(mel.dim(), (128, 1 + 16000 / 16));
//! # Ok::<(), sonoscene_core::SonoSceneError>(())
//! ```

mod cqt;
mod decibel;
mod masks;
mod mel;
mod stft;

pub use cqt::{C1_HZ, CqtConfig, CqtKernel, cqt_spectrogram};
pub use decibel::{DbReference, DecibelConfig, power_to_db};
pub use masks::dominance_masks;
pub use mel::{MelConfig, hz_to_mel, mel_filterbank, mel_spectrogram, mel_to_hz};
pub use stft::{hann_window, stft};

use crate::audio_data::{AudioData, ConvertToMono, LoadOptions, ResampleQuality, trim_silence};
use crate::error::{Result, SonoSceneError};
use ndarray::Array2;
use std::path::Path;

/// Which spectrogram to compute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformKind {
    Mel(MelConfig),
    Cqt(CqtConfig),
}

impl TransformKind {
    /// Log-mel with default settings
    pub fn mel() -> Self {
        Self::Mel(MelConfig::default())
    }

    /// Constant-Q with default settings
    pub fn cqt() -> Self {
        Self::Cqt(CqtConfig::default())
    }
}

/// Audio to analyze.
#[derive(Debug, Clone, Copy)]
pub enum FeatureInput<'a> {
    /// Decoded and downmixed to mono
    Path(&'a Path),
    /// Mono samples; the sample rate must be supplied alongside
    Samples(&'a [f32]),
}

/// Preprocessing applied before the transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReadOptions {
    /// Strip leading and trailing audio quieter than this many dB below the peak
    pub trim_silence: Option<f32>,
}

/// Compute a decibel spectrogram of `input`.
///
/// For a file, `sample_rate` is the rate to analyze at (the file is resampled when it
/// differs) and `None` keeps the file's own rate. Raw samples need `sample_rate`.
///
/// # Errors
///
/// * [`SonoSceneError::InvalidArgument`] for raw samples without a sample rate, empty
///   audio, or a configuration the sample rate cannot support
/// * loading errors from the decoder
pub fn extract_features(
    input: FeatureInput<'_>,
    sample_rate: Option<u32>,
    kind: &TransformKind,
    read: &ReadOptions,
) -> Result<Array2<f32>> {
    let audio = match input {
        FeatureInput::Path(path) => {
            let mut options = LoadOptions::new()
                .convert_to_mono(ConvertToMono::ForceMono)
                .resample_quality(ResampleQuality::Sinc);
            if let Some(rate) = sample_rate {
                options = options.target_sample_rate(rate);
            }
            if let Some(top_db) = read.trim_silence {
                options = options.trim_silence(top_db);
            }
            AudioData::from_path_with_options(path, &options)?
        }
        FeatureInput::Samples(samples) => {
            let rate = sample_rate.ok_or_else(|| {
                SonoSceneError::InvalidArgument(
                    "A sample rate is required when extracting features from raw samples"
                        .to_string(),
                )
            })?;
            let samples = match read.trim_silence {
                Some(top_db) => trim_silence(samples, top_db),
                None => samples,
            };
            AudioData::from_samples(samples.to_vec(), rate, 1)?
        }
    };

    if audio.is_empty() {
        return Err(SonoSceneError::InvalidArgument(
            "Cannot extract features from empty audio".to_string(),
        ));
    }

    let features = match kind {
        TransformKind::Mel(config) => mel_spectrogram(audio.samples(), audio.sample_rate(), config)?,
        TransformKind::Cqt(config) => cqt_spectrogram(audio.samples(), audio.sample_rate(), config)?,
    };
    log::debug!(
        "Extracted {} features of shape {:?} at {} Hz",
        match kind {
            TransformKind::Mel(_) => "mel",
            TransformKind::Cqt(_) => "cqt",
        },
        features.dim(),
        audio.sample_rate()
    );
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_data::{WavEncoding, write_wav};

    #[test]
    fn test_raw_samples_need_rate() {
        let samples = vec![0.0f32; 1024];
        let result = extract_features(
            FeatureInput::Samples(&samples),
            None,
            &TransformKind::mel(),
            &ReadOptions::default(),
        );
        assert!(matches!(result, Err(SonoSceneError::InvalidArgument(_))));
    }

    #[test]
    fn test_fully_trimmed_input_rejected() {
        let samples = vec![0.0f32; 8192];
        let result = extract_features(
            FeatureInput::Samples(&samples),
            Some(16000),
            &TransformKind::mel(),
            &ReadOptions {
                trim_silence: Some(40.0),
            },
        );
        assert!(matches!(result, Err(SonoSceneError::InvalidArgument(_))));
    }

    #[test]
    fn test_file_and_samples_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f32> = (0..24000)
            .map(|i| (i as f32 * 0.07).sin() * 0.5)
            .collect();
        write_wav(&path, &samples, 48000, 1, WavEncoding::Float32).unwrap();

        let kind = TransformKind::cqt();
        let from_file = extract_features(
            FeatureInput::Path(&path),
            None,
            &kind,
            &ReadOptions::default(),
        )
        .unwrap();
        let from_samples = extract_features(
            FeatureInput::Samples(&samples),
            Some(48000),
            &kind,
            &ReadOptions::default(),
        )
        .unwrap();

        assert_eq!(from_file.dim(), (256, 1 + 24000 / 256));
        assert_eq!(from_file, from_samples);
    }

    #[test]
    fn test_file_resampled_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        let samples: Vec<f32> = (0..44100).map(|i| ((i * 7919) % 200) as f32 / 200.0 - 0.5).collect();
        write_wav(&path, &samples, 44100, 1, WavEncoding::Float32).unwrap();

        let mel = extract_features(
            FeatureInput::Path(&path),
            Some(16000),
            &TransformKind::Mel(MelConfig {
                hop_length: 160,
                ..Default::default()
            }),
            &ReadOptions::default(),
        )
        .unwrap();
        assert_eq!(mel.dim(), (128, 1 + 16000 / 160));
    }
}
