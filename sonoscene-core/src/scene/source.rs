use crate::audio_data::{
    AudioData, AudioDataLoader, DefaultAudioLoader, LoadOptions, ResampleQuality, WavEncoding,
};
use crate::error::{Result, SonoSceneError};
use crate::math::{DVec3, parse_position};
use crate::scene::TARGET_SAMPLE_RATE;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where a [`SoundSource`] gets its waveform from.
#[derive(Debug, Clone)]
pub enum AudioInput {
    /// A single audio file
    File(PathBuf),
    /// Several files decoded in order and joined end to end, e.g. short utterances
    /// forming one longer stretch of speech
    Files(Vec<PathBuf>),
    /// Mono samples already in memory; the sample rate is mandatory
    Samples {
        data: Vec<f32>,
        sample_rate: Option<u32>,
    },
}

impl AudioInput {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn files<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::Files(paths.into_iter().map(Into::into).collect())
    }

    pub fn samples(data: Vec<f32>, sample_rate: u32) -> Self {
        Self::Samples {
            data,
            sample_rate: Some(sample_rate),
        }
    }
}

/// Construction options for a [`SoundSource`].
///
/// `load` applies to file inputs only; in-memory samples are taken as given.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Seconds into the scene at which the source starts emitting
    pub start_time: f64,
    /// Decoding options for file inputs, applied to every file individually
    pub load: LoadOptions,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            load: LoadOptions::mono_at(TARGET_SAMPLE_RATE),
        }
    }
}

impl SourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_time(mut self, seconds: f64) -> Self {
        self.start_time = seconds;
        self
    }

    /// Skip this much of each file
    pub fn offset(mut self, offset: Duration) -> Self {
        self.load.offset = offset;
        self
    }

    /// Keep at most this much of each file
    pub fn duration(mut self, duration: Duration) -> Self {
        self.load.duration = Some(duration);
        self
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.load.target_sample_rate = Some(rate);
        self
    }

    pub fn resample_quality(mut self, quality: ResampleQuality) -> Self {
        self.load.resample_quality = quality;
        self
    }
}

/// A point emitter with a fixed position and a mono waveform.
///
/// Sources are immutable once built; a [`Scene`](super::Scene) only borrows them.
#[derive(Debug, Clone)]
pub struct SoundSource {
    position: DVec3,
    audio: AudioData,
    start_time: f64,
}

impl SoundSource {
    /// Build a source, decoding any files with the Symphonia-based loader.
    ///
    /// # Errors
    ///
    /// * [`SonoSceneError::InvalidArgument`] if `position` does not hold exactly three
    ///   values, the start time is negative, a file list is empty, or raw samples come
    ///   without a sample rate
    /// * [`SonoSceneError::Io`] / [`SonoSceneError::AudioLoading`] if a file cannot be decoded
    pub fn new(position: &[f64], input: AudioInput, options: &SourceOptions) -> Result<Self> {
        Self::from_loader(position, input, options, &DefaultAudioLoader)
    }

    /// Same as [`SoundSource::new`] but decodes files with a caller-provided loader.
    pub fn from_loader<L: AudioDataLoader + ?Sized>(
        position: &[f64],
        input: AudioInput,
        options: &SourceOptions,
        loader: &L,
    ) -> Result<Self> {
        let position = parse_position(position)?;

        let audio = match input {
            AudioInput::File(path) => load_file(&path, loader, &options.load)?,
            AudioInput::Files(paths) => {
                if paths.is_empty() {
                    return Err(SonoSceneError::InvalidArgument(
                        "File list for a sound source is empty".to_string(),
                    ));
                }
                let clips = paths
                    .iter()
                    .map(|path| load_file(path, loader, &options.load))
                    .collect::<Result<Vec<_>>>()?;
                AudioData::concat(&clips)?
            }
            AudioInput::Samples { data, sample_rate } => {
                let sample_rate = sample_rate.ok_or_else(|| {
                    SonoSceneError::InvalidArgument(
                        "Raw sample input requires a sample rate".to_string(),
                    )
                })?;
                AudioData::from_samples(data, sample_rate, 1)?
            }
        };

        Self::from_audio(position, audio, options.start_time)
    }

    /// Wrap already decoded audio. Multi-channel audio is downmixed to mono.
    pub fn from_audio(position: DVec3, audio: AudioData, start_time: f64) -> Result<Self> {
        if !position.is_finite() {
            return Err(SonoSceneError::InvalidArgument(format!(
                "Source position must be finite, got {}",
                position
            )));
        }
        if !(start_time >= 0.0 && start_time.is_finite()) {
            return Err(SonoSceneError::InvalidArgument(format!(
                "Start time must be a non-negative number of seconds, got {}",
                start_time
            )));
        }
        if audio.sample_rate() == 0 {
            return Err(SonoSceneError::InvalidArgument(
                "Source sample rate must be greater than 0".to_string(),
            ));
        }

        log::debug!(
            "Sound source at {}: {} samples @ {} Hz, starts at {:.3}s",
            position,
            audio.total_frames(),
            audio.sample_rate(),
            start_time
        );

        Ok(Self {
            position,
            audio: audio.to_mono(),
            start_time,
        })
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn audio(&self) -> &AudioData {
        &self.audio
    }

    pub fn samples(&self) -> &[f32] {
        self.audio.samples()
    }

    pub fn sample_rate(&self) -> u32 {
        self.audio.sample_rate()
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Copy of this source with every sample multiplied by `gain`
    pub fn with_gain(&self, gain: f32) -> Self {
        Self {
            position: self.position,
            audio: self.audio.scaled(gain),
            start_time: self.start_time,
        }
    }

    /// Write the source waveform to `path` as 32-bit float WAV
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_with_encoding(path, WavEncoding::default())
    }

    pub fn save_with_encoding(&self, path: impl AsRef<Path>, encoding: WavEncoding) -> Result<()> {
        self.audio.save_wav(path, encoding)
    }
}

fn load_file<L: AudioDataLoader + ?Sized>(
    path: &Path,
    loader: &L,
    options: &LoadOptions,
) -> Result<AudioData> {
    let audio = AudioData::from_path_with_loader(path, loader, options)?;
    log::info!(
        "Loaded {} ({:.2}s @ {} Hz)",
        path.display(),
        audio.duration().as_secs_f64(),
        audio.sample_rate()
    );
    Ok(audio)
}

/// Build a source at `position` with default options (files decoded to 48 kHz mono, start at 0 s)
pub fn build_source(position: &[f64], input: AudioInput) -> Result<SoundSource> {
    SoundSource::new(position, input, &SourceOptions::default())
}
