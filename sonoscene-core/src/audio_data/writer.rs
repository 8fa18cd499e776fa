use crate::error::{Result, SonoSceneError};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Sample encoding for written WAV files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavEncoding {
    /// 32-bit IEEE float, reproduces `f32` samples exactly
    #[default]
    Float32,
    /// 16-bit signed PCM, samples clipped to [-1, 1]
    Pcm16,
}

/// Write interleaved samples to a WAV file.
///
/// # Errors
///
/// Returns [`SonoSceneError::Io`] when the file cannot be created and
/// [`SonoSceneError::InvalidArgument`] for a zero sample rate or channel count.
pub fn write_wav(
    path: impl AsRef<Path>,
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
    encoding: WavEncoding,
) -> Result<()> {
    if sample_rate == 0 || channels == 0 {
        return Err(SonoSceneError::InvalidArgument(format!(
            "Cannot write WAV with sample rate {} and {} channel(s)",
            sample_rate, channels
        )));
    }

    let spec = match encoding {
        WavEncoding::Float32 => WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        },
        WavEncoding::Pcm16 => WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        },
    };

    let path = path.as_ref();
    let mut writer = WavWriter::create(path, spec)?;
    match encoding {
        WavEncoding::Float32 => {
            for &sample in samples {
                writer.write_sample(sample)?;
            }
        }
        WavEncoding::Pcm16 => {
            for &sample in samples {
                let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
                writer.write_sample(quantized)?;
            }
        }
    }
    writer.finalize()?;

    log::debug!(
        "Wrote {} ({} frames, {} ch @ {} Hz, {:?})",
        path.display(),
        samples.len() / channels as usize,
        channels,
        sample_rate,
        encoding
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_data::{AudioDataLoader, DefaultAudioLoader};

    #[test]
    fn test_float_round_trip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f32> = (0..480).map(|i| ((i as f32) * 0.05).sin() * 0.8).collect();

        write_wav(&path, &samples, 48000, 1, WavEncoding::Float32).unwrap();
        let decoded = DefaultAudioLoader.load(&path).unwrap();

        assert_eq!(decoded.sample_rate(), 48000);
        assert_eq!(decoded.channels(), 1);
        assert_eq!(decoded.samples(), samples.as_slice());
    }

    #[test]
    fn test_pcm16_round_trip_within_quantization() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let samples = vec![0.0f32, 0.5, -0.5, 0.25, 0.999, -0.999];

        write_wav(&path, &samples, 16000, 2, WavEncoding::Pcm16).unwrap();
        let decoded = DefaultAudioLoader.load(&path).unwrap();

        assert_eq!(decoded.channels(), 2);
        assert_eq!(decoded.len(), samples.len());
        for (a, b) in decoded.samples().iter().zip(&samples) {
            assert!((a - b).abs() <= 1.0 / 16384.0, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let result = write_wav(
            "/nonexistent-dir/sub/out.wav",
            &[0.0],
            48000,
            1,
            WavEncoding::Float32,
        );
        assert!(matches!(result, Err(SonoSceneError::Io(_))));
    }

    #[test]
    fn test_zero_rate_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_wav(dir.path().join("x.wav"), &[0.0], 0, 1, WavEncoding::Float32);
        assert!(matches!(result, Err(SonoSceneError::InvalidArgument(_))));
    }
}
