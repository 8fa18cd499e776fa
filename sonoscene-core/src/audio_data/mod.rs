mod default_loader;
mod load_options;
mod loader;
mod resampler;
mod trim;
mod writer;

use crate::error::{Result, SonoSceneError};
pub use default_loader::DefaultAudioLoader;
pub use load_options::{ConvertToMono, LoadOptions};
pub use loader::AudioDataLoader;
pub use resampler::{AudioResampler, ResampleQuality};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
pub use trim::{DEFAULT_TRIM_TOP_DB, trim_silence};
pub use writer::{WavEncoding, write_wav};

/// Container for decoded audio with reference-counted sharing.
///
/// # Data Format
/// Samples are stored **interleaved** (`[L0, R0, L1, R1, ...]`); mono audio is
/// simply `[M0, M1, ...]`. Everything the renderer consumes is mono.
#[derive(Debug, Clone)]
pub struct AudioData {
    inner: Arc<AudioDataInner>,
}

#[derive(Debug)]
pub(crate) struct AudioDataInner {
    /// Interleaved samples, `total_frames * channels` long
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono)
    pub channels: u16,

    pub duration: Duration,

    /// One frame = one sample from each channel
    pub total_frames: usize,
}

impl AudioData {
    pub(crate) fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let total_frames = samples.len() / channels.max(1) as usize;
        let duration = if sample_rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(total_frames as f64 / sample_rate as f64)
        };

        Self {
            inner: Arc::new(AudioDataInner {
                samples,
                sample_rate,
                channels,
                duration,
                total_frames,
            }),
        }
    }

    /// Wrap caller-supplied interleaved samples.
    ///
    /// # Errors
    ///
    /// Returns [`SonoSceneError::InvalidArgument`] if the sample rate or channel count is
    /// zero, or if the sample count is not a multiple of the channel count.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 {
            return Err(SonoSceneError::InvalidArgument(
                "Sample rate must be greater than 0".to_string(),
            ));
        }
        if channels == 0 {
            return Err(SonoSceneError::InvalidArgument(
                "Channel count must be greater than 0".to_string(),
            ));
        }
        if samples.len() % channels as usize != 0 {
            return Err(SonoSceneError::InvalidArgument(format!(
                "{} samples do not form whole frames of {} channels",
                samples.len(),
                channels
            )));
        }

        Ok(Self::new(samples, sample_rate, channels))
    }

    /// Load audio from a file path using the Symphonia-based loader, keeping the file's
    /// own channels and sample rate.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with_options(path, &LoadOptions::default())
    }

    /// Load audio from a file path with custom loading options.
    pub fn from_path_with_options(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        Self::from_path_with_loader(path, &DefaultAudioLoader, options)
    }

    /// Load audio from a file path using a custom loader.
    ///
    /// The loader only decodes; trimming, mono conversion and resampling are applied
    /// afterwards from `options`, so every loader behaves the same way.
    pub fn from_path_with_loader<L: AudioDataLoader + ?Sized>(
        path: impl AsRef<Path>,
        loader: &L,
        options: &LoadOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let decoded = loader.load(path)?;
        log::debug!(
            "Decoded {}: {} frames, {} channel(s) @ {} Hz",
            path.display(),
            decoded.total_frames(),
            decoded.channels(),
            decoded.sample_rate()
        );
        options.apply(decoded)
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    pub fn samples(&self) -> &[f32] {
        &self.inner.samples
    }

    pub fn total_frames(&self) -> usize {
        self.inner.total_frames
    }

    pub fn is_empty(&self) -> bool {
        self.inner.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.samples.len()
    }

    /// Get samples for a specific channel (0-indexed)
    pub fn channel_samples(&self, channel: usize) -> Result<Vec<f32>> {
        if channel >= self.inner.channels as usize {
            return Err(SonoSceneError::AudioFormat(format!(
                "Channel {} out of range (max: {})",
                channel,
                self.inner.channels - 1
            )));
        }

        let channel_samples: Vec<f32> = self
            .inner
            .samples
            .chunks(self.inner.channels as usize)
            .map(|frame| frame[channel])
            .collect();

        Ok(channel_samples)
    }

    /// Copy of the frames in `start_frame..end_frame`, clamped to the available audio
    pub fn slice_frames(&self, start_frame: usize, end_frame: usize) -> Self {
        let end_frame = end_frame.min(self.inner.total_frames);
        let start_frame = start_frame.min(end_frame);
        let channels = self.inner.channels as usize;

        Self::new(
            self.inner.samples[start_frame * channels..end_frame * channels].to_vec(),
            self.inner.sample_rate,
            self.inner.channels,
        )
    }

    /// Convert to mono by averaging all channels
    pub fn to_mono(&self) -> Self {
        if self.inner.channels == 1 {
            return self.clone();
        }

        let channels = self.inner.channels as usize;
        let mono_samples: Vec<f32> = self
            .inner
            .samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        Self::new(mono_samples, self.inner.sample_rate, 1)
    }

    /// Resample to a different sample rate, returns a new `AudioData` instance
    pub fn resample(&self, target_sample_rate: u32, quality: ResampleQuality) -> Result<Self> {
        if target_sample_rate == self.inner.sample_rate {
            return Ok(self.clone());
        }

        let resampler = AudioResampler::new(
            self.inner.sample_rate,
            target_sample_rate,
            self.inner.channels,
            quality,
            None,
        )?;

        let resampled_samples = resampler.resample_interleaved(&self.inner.samples)?;

        Ok(Self::new(
            resampled_samples,
            target_sample_rate,
            self.inner.channels,
        ))
    }

    /// Multiply every sample by `gain`
    pub fn scaled(&self, gain: f32) -> Self {
        let samples = self.inner.samples.iter().map(|s| s * gain).collect();
        Self::new(samples, self.inner.sample_rate, self.inner.channels)
    }

    /// Join clips end to end without any crossfade.
    ///
    /// # Errors
    ///
    /// All clips must share one sample rate and channel count, and at least one clip
    /// must be given.
    pub fn concat(clips: &[AudioData]) -> Result<Self> {
        let first = clips.first().ok_or_else(|| {
            SonoSceneError::InvalidArgument("Cannot concatenate an empty list of clips".to_string())
        })?;

        let mut samples = Vec::with_capacity(clips.iter().map(AudioData::len).sum());
        for clip in clips {
            if clip.sample_rate() != first.sample_rate() {
                return Err(SonoSceneError::SampleRateMismatch {
                    expected: first.sample_rate(),
                    found: clip.sample_rate(),
                });
            }
            if clip.channels() != first.channels() {
                return Err(SonoSceneError::AudioFormat(format!(
                    "Cannot concatenate {}-channel audio with {}-channel audio",
                    first.channels(),
                    clip.channels()
                )));
            }
            samples.extend_from_slice(clip.samples());
        }

        Ok(Self::new(samples, first.sample_rate(), first.channels()))
    }

    /// Write the audio to a WAV file
    pub fn save_wav(&self, path: impl AsRef<Path>, encoding: WavEncoding) -> Result<()> {
        write_wav(
            path,
            &self.inner.samples,
            self.inner.sample_rate,
            self.inner.channels,
            encoding,
        )
    }
}
