use super::{Microphone, SoundSource, render_contribution};
use crate::audio_data::{WavEncoding, write_wav};
use crate::config::RenderOptions;
use crate::error::{Result, SonoSceneError};
use std::path::Path;
use std::thread;

/// A set of sources heard by a set of microphones.
///
/// The scene borrows both slices; rendering writes into the microphones in place.
pub struct Scene<'a> {
    sources: &'a [SoundSource],
    mics: &'a mut [Microphone],
    sample_rate: u32,
}

impl<'a> Scene<'a> {
    /// # Errors
    ///
    /// * [`SonoSceneError::InvalidArgument`] if `sources` is empty
    /// * [`SonoSceneError::SampleRateMismatch`] if the sources disagree on sample rate
    pub fn new(sources: &'a [SoundSource], mics: &'a mut [Microphone]) -> Result<Self> {
        let sample_rate = common_sample_rate(sources)?;
        log::debug!(
            "Scene with {} source(s) and {} microphone(s) @ {} Hz",
            sources.len(),
            mics.len(),
            sample_rate
        );
        Ok(Self {
            sources,
            mics,
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sources(&self) -> &[SoundSource] {
        self.sources
    }

    pub fn microphones(&self) -> &[Microphone] {
        self.mics
    }

    /// Render every source into every microphone over `[0, cutoff_time)` seconds.
    ///
    /// Each microphone is reset first, so repeated calls give identical results. If any
    /// microphone fails, every microphone is left reset.
    pub fn render(&mut self, cutoff_time: f64, options: &RenderOptions) -> Result<()> {
        let total_samples = self.prepare(cutoff_time, options)?;
        let sources = self.sources;
        let sample_rate = self.sample_rate;

        let result = self.mics.iter_mut().try_for_each(|mic| {
            render_microphone(mic, sources, total_samples, sample_rate, options)
        });
        self.reset_on_error(result)?;

        log::info!(
            "Rendered {} source(s) to {} microphone(s), {} samples each",
            sources.len(),
            self.mics.len(),
            total_samples
        );
        Ok(())
    }

    /// Same result as [`render`](Self::render), one scoped thread per microphone.
    pub fn render_parallel(&mut self, cutoff_time: f64, options: &RenderOptions) -> Result<()> {
        let total_samples = self.prepare(cutoff_time, options)?;
        let sources = self.sources;
        let sample_rate = self.sample_rate;

        let results: Vec<Result<()>> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .mics
                .iter_mut()
                .map(|mic| {
                    scope.spawn(move || {
                        render_microphone(mic, sources, total_samples, sample_rate, options)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect()
        });
        self.reset_on_error(results.into_iter().collect())?;

        log::info!(
            "Rendered {} source(s) to {} microphone(s) in parallel, {} samples each",
            sources.len(),
            self.mics.len(),
            total_samples
        );
        Ok(())
    }

    /// Render, then write microphones `left` and `right` as one stereo WAV file.
    ///
    /// # Errors
    ///
    /// [`SonoSceneError::IndexOutOfRange`] for a bad index, checked before anything is rendered.
    pub fn render_binaural(
        &mut self,
        left: usize,
        right: usize,
        path: impl AsRef<Path>,
        cutoff_time: f64,
        options: &RenderOptions,
    ) -> Result<()> {
        let len = self.mics.len();
        for index in [left, right] {
            if index >= len {
                return Err(SonoSceneError::IndexOutOfRange { index, len });
            }
        }

        self.render(cutoff_time, options)?;
        save_binaural(&self.mics[left], &self.mics[right], path)
    }

    /// Validate the request; on failure no microphone keeps an earlier render
    fn prepare(&mut self, cutoff_time: f64, options: &RenderOptions) -> Result<usize> {
        self.check(cutoff_time, options).inspect_err(|_| self.reset_all())
    }

    fn check(&self, cutoff_time: f64, options: &RenderOptions) -> Result<usize> {
        if !(cutoff_time > 0.0 && cutoff_time.is_finite()) {
            return Err(SonoSceneError::InvalidArgument(format!(
                "Cutoff time must be a positive number of seconds, got {}",
                cutoff_time
            )));
        }
        options.validate()?;
        common_sample_rate(self.sources)?;

        Ok((cutoff_time * self.sample_rate as f64).floor() as usize)
    }

    fn reset_on_error(&mut self, result: Result<()>) -> Result<()> {
        if result.is_err() {
            self.reset_all();
        }
        result
    }

    fn reset_all(&mut self) {
        for mic in self.mics.iter_mut() {
            mic.reset();
        }
    }
}

fn common_sample_rate(sources: &[SoundSource]) -> Result<u32> {
    let Some(first) = sources.first() else {
        return Err(SonoSceneError::InvalidArgument(
            "A scene needs at least one sound source".to_string(),
        ));
    };

    let expected = first.sample_rate();
    match sources.iter().find(|s| s.sample_rate() != expected) {
        Some(other) => Err(SonoSceneError::SampleRateMismatch {
            expected,
            found: other.sample_rate(),
        }),
        None => Ok(expected),
    }
}

fn render_microphone(
    mic: &mut Microphone,
    sources: &[SoundSource],
    total_samples: usize,
    sample_rate: u32,
    options: &RenderOptions,
) -> Result<()> {
    mic.begin_render(total_samples, sample_rate);
    for source in sources {
        let contribution = render_contribution(source, mic.position(), total_samples, options)?;
        mic.accumulate(contribution);
    }
    Ok(())
}

/// Build a [`Scene`] and render it in one call.
pub fn render_scene(
    sources: &[SoundSource],
    mics: &mut [Microphone],
    cutoff_time: f64,
    options: &RenderOptions,
) -> Result<()> {
    Scene::new(sources, mics)?.render(cutoff_time, options)
}

/// Write two rendered microphones as an interleaved stereo WAV (`mic_a` left, `mic_b` right).
pub fn save_binaural(mic_a: &Microphone, mic_b: &Microphone, path: impl AsRef<Path>) -> Result<()> {
    let (Some(rate_a), Some(rate_b)) = (mic_a.sample_rate(), mic_b.sample_rate()) else {
        return Err(SonoSceneError::InvalidArgument(
            "Both microphones must be rendered before saving a binaural pair".to_string(),
        ));
    };
    if rate_a != rate_b {
        return Err(SonoSceneError::InvalidArgument(format!(
            "Binaural pair sample rates differ: {} Hz vs {} Hz",
            rate_a, rate_b
        )));
    }
    if mic_a.buffer().len() != mic_b.buffer().len() {
        return Err(SonoSceneError::InvalidArgument(format!(
            "Binaural pair lengths differ: {} vs {} samples",
            mic_a.buffer().len(),
            mic_b.buffer().len()
        )));
    }

    let interleaved: Vec<f32> = mic_a
        .buffer()
        .iter()
        .zip(mic_b.buffer())
        .flat_map(|(&l, &r)| [l, r])
        .collect();
    write_wav(path, &interleaved, rate_a, 2, WavEncoding::default())
}
