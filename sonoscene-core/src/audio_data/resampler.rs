use crate::error::{Result, SonoSceneError};
use rubato::{
    FftFixedIn, Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};

/// Which rubato resampler backs an [`AudioResampler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleQuality {
    /// Synchronous FFT resampler, fast and exact for fixed ratios
    #[default]
    Fft,
    /// Band-limited sinc interpolation with a Blackman-Harris window
    Sinc,
}

/// Offline resampler for whole clips.
///
/// Unlike a streaming resampler this one knows the full input up front, so it removes
/// the filter delay and returns exactly `round(len * target / source)` frames, aligned
/// with the input.
pub struct AudioResampler {
    source_sample_rate: u32,
    target_sample_rate: u32,
    channels: u16,
    quality: ResampleQuality,
    chunk_size: usize,
}

impl AudioResampler {
    /// Creates a new resampler.
    ///
    /// # Arguments
    /// * `source_sample_rate` - The sample rate of the input audio
    /// * `target_sample_rate` - The desired sample rate of the output audio
    /// * `channels` - Number of channels in the audio data
    /// * `quality` - Which rubato resampler to use
    /// * `chunk_size` - Optional size of processing chunks (defaults to 1024)
    pub fn new(
        source_sample_rate: u32,
        target_sample_rate: u32,
        channels: u16,
        quality: ResampleQuality,
        chunk_size: Option<usize>,
    ) -> Result<Self> {
        if source_sample_rate == 0 || target_sample_rate == 0 {
            return Err(SonoSceneError::AudioFormat(
                "Sample rates must be greater than 0".to_string(),
            ));
        }

        if channels == 0 {
            return Err(SonoSceneError::AudioFormat(
                "Channel count must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            source_sample_rate,
            target_sample_rate,
            channels,
            quality,
            chunk_size: chunk_size.unwrap_or(1024).max(1),
        })
    }

    /// Resamples a single channel of audio data.
    ///
    /// # Data Format
    /// - **Input**: planar, one channel: `[L0, L1, L2, ...]`
    /// - **Output**: planar, one channel, at the target rate
    pub fn resample_channel(&self, channel_samples: &[f32]) -> Result<Vec<f32>> {
        if self.source_sample_rate == self.target_sample_rate {
            return Ok(channel_samples.to_vec());
        }
        if channel_samples.is_empty() {
            return Ok(Vec::new());
        }

        match self.quality {
            ResampleQuality::Fft => {
                let mut resampler = FftFixedIn::<f32>::new(
                    self.source_sample_rate as usize,
                    self.target_sample_rate as usize,
                    self.chunk_size,
                    2, // sub_chunks
                    1, // single channel
                )
                .map_err(|e| {
                    SonoSceneError::AudioLoading(format!("Failed to create resampler: {}", e))
                })?;
                self.drive(&mut resampler, channel_samples)
            }
            ResampleQuality::Sinc => {
                let parameters = SincInterpolationParameters {
                    sinc_len: 256,
                    f_cutoff: 0.95,
                    oversampling_factor: 256,
                    interpolation: SincInterpolationType::Cubic,
                    window: WindowFunction::BlackmanHarris2,
                };
                let mut resampler = SincFixedIn::<f32>::new(
                    self.resample_ratio(),
                    1.0,
                    parameters,
                    self.chunk_size,
                    1,
                )
                .map_err(|e| {
                    SonoSceneError::AudioLoading(format!("Failed to create resampler: {}", e))
                })?;
                self.drive(&mut resampler, channel_samples)
            }
        }
    }

    /// Feed zero-padded chunks until the delayed output covers the whole input.
    fn drive<R: Resampler<f32>>(&self, resampler: &mut R, input: &[f32]) -> Result<Vec<f32>> {
        let expected = (input.len() as f64 * self.resample_ratio()).round() as usize;
        let delay = resampler.output_delay();

        let mut output_buffer = Vec::with_capacity(expected + delay);
        let mut input_index = 0;

        while output_buffer.len() < expected + delay {
            let frames_needed = resampler.input_frames_next();
            let mut input_chunk = vec![0.0f32; frames_needed];
            if input_index < input.len() {
                let available = (input.len() - input_index).min(frames_needed);
                input_chunk[..available]
                    .copy_from_slice(&input[input_index..input_index + available]);
            }
            input_index += frames_needed;

            let waves_in = vec![input_chunk];
            let waves_out = resampler
                .process(&waves_in, None)
                .map_err(|e| SonoSceneError::AudioLoading(format!("Resampling error: {}", e)))?;

            if let Some(first_channel) = waves_out.first() {
                output_buffer.extend_from_slice(first_channel);
            }
        }

        output_buffer.drain(..delay);
        output_buffer.truncate(expected);
        Ok(output_buffer)
    }

    /// Resamples multi-channel interleaved audio data.
    ///
    /// # Data Format
    /// - **Input**: INTERLEAVED `[L0, R0, L1, R1, ...]`
    /// - **Output**: INTERLEAVED at the target rate
    pub fn resample_interleaved(&self, interleaved_samples: &[f32]) -> Result<Vec<f32>> {
        if self.source_sample_rate == self.target_sample_rate {
            return Ok(interleaved_samples.to_vec());
        }

        let channels = self.channels as usize;
        if channels == 1 {
            return self.resample_channel(interleaved_samples);
        }

        let resampled_channels = (0..channels)
            .map(|ch| {
                let channel_data: Vec<f32> = interleaved_samples
                    .chunks(channels)
                    .map(|frame| frame.get(ch).copied().unwrap_or(0.0))
                    .collect();
                self.resample_channel(&channel_data)
            })
            .collect::<Result<Vec<_>>>()?;

        let new_frames = resampled_channels[0].len();
        let mut interleaved = Vec::with_capacity(new_frames * channels);
        for frame_idx in 0..new_frames {
            for resampled_channel in &resampled_channels {
                interleaved.push(resampled_channel[frame_idx]);
            }
        }

        Ok(interleaved)
    }

    /// Returns the target (output) sample rate in Hz.
    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Returns the source (input) sample rate in Hz.
    pub fn source_sample_rate(&self) -> u32 {
        self.source_sample_rate
    }

    /// Calculates the resampling ratio (target/source).
    pub fn resample_ratio(&self) -> f64 {
        self.target_sample_rate as f64 / self.source_sample_rate as f64
    }
}
