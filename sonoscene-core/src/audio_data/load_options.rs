use crate::audio_data::{AudioData, ResampleQuality, trim_silence};
use crate::error::{Result, SonoSceneError};
use std::time::Duration;

/// Defines how to handle channel conversion during audio loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertToMono {
    /// Keep original channels: stereo if input is stereo, mono if input is mono.
    Original,

    /// Force mono: channels are averaged together.
    ///
    /// The renderer only propagates mono sources, so scene loading always uses this.
    ForceMono,
}

/// Options for controlling audio file loading behavior.
///
/// The steps run in a fixed order after decoding: `offset`/`duration` trim at the file's
/// native rate, mono conversion, resampling, then optional silence trimming.
///
/// # Examples
///
/// ```no_run
/// # use sonoscene_core::audio_data::{LoadOptions, ConvertToMono};
/// # use std::time::Duration;
/// // Decode the second half-second of a clip as 16 kHz mono
/// let options = LoadOptions::new()
///     .convert_to_mono(ConvertToMono::ForceMono)
///     .target_sample_rate(16000)
///     .offset(Duration::from_millis(500))
///     .duration(Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// How to handle mono conversion during audio loading.
    pub convert_to_mono: ConvertToMono,
    /// Resample to this rate after decoding (None = keep the file's rate)
    pub target_sample_rate: Option<u32>,
    /// Resampler used when `target_sample_rate` differs from the file
    pub resample_quality: ResampleQuality,
    /// Skip this much audio from the start of the file
    pub offset: Duration,
    /// Keep at most this much audio after `offset` (None = until the end)
    pub duration: Option<Duration>,
    /// Strip leading/trailing audio quieter than this many dB below the peak
    pub trim_silence_db: Option<f32>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            convert_to_mono: ConvertToMono::Original,
            target_sample_rate: None,
            resample_quality: ResampleQuality::default(),
            offset: Duration::ZERO,
            duration: None,
            trim_silence_db: None,
        }
    }
}

impl LoadOptions {
    /// Creates a new `LoadOptions` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mono audio at `sample_rate`, the format every scene source is rendered from.
    pub fn mono_at(sample_rate: u32) -> Self {
        Self::default()
            .convert_to_mono(ConvertToMono::ForceMono)
            .target_sample_rate(sample_rate)
    }

    pub fn convert_to_mono(mut self, convert: ConvertToMono) -> Self {
        self.convert_to_mono = convert;
        self
    }

    pub fn target_sample_rate(mut self, rate: u32) -> Self {
        self.target_sample_rate = Some(rate);
        self
    }

    pub fn resample_quality(mut self, quality: ResampleQuality) -> Self {
        self.resample_quality = quality;
        self
    }

    pub fn offset(mut self, offset: Duration) -> Self {
        self.offset = offset;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn trim_silence(mut self, top_db: f32) -> Self {
        self.trim_silence_db = Some(top_db);
        self
    }

    /// Run the post-decode pipeline on freshly decoded audio.
    pub fn apply(&self, decoded: AudioData) -> Result<AudioData> {
        if let Some(0) = self.target_sample_rate {
            return Err(SonoSceneError::InvalidArgument(
                "Target sample rate must be greater than 0".to_string(),
            ));
        }

        let mut audio = decoded;

        if !self.offset.is_zero() || self.duration.is_some() {
            let rate = audio.sample_rate() as f64;
            let start = (self.offset.as_secs_f64() * rate).round() as usize;
            let end = self
                .duration
                .map(|d| start.saturating_add((d.as_secs_f64() * rate).round() as usize))
                .unwrap_or(usize::MAX);
            audio = audio.slice_frames(start, end);
        }

        if self.convert_to_mono == ConvertToMono::ForceMono {
            audio = audio.to_mono();
        }

        if let Some(target_rate) = self.target_sample_rate {
            if target_rate != audio.sample_rate() {
                log::debug!(
                    "Resampling {} Hz -> {} Hz ({:?})",
                    audio.sample_rate(),
                    target_rate,
                    self.resample_quality
                );
                audio = audio.resample(target_rate, self.resample_quality)?;
            }
        }

        if let Some(top_db) = self.trim_silence_db {
            if audio.channels() != 1 {
                return Err(SonoSceneError::AudioFormat(
                    "Silence trimming requires mono audio".to_string(),
                ));
            }
            let trimmed = trim_silence(audio.samples(), top_db);
            audio = AudioData::new(trimmed.to_vec(), audio.sample_rate(), 1);
        }

        Ok(audio)
    }
}
