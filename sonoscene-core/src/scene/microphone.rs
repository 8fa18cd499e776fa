use crate::audio_data::{WavEncoding, write_wav};
use crate::error::{Result, SonoSceneError};
use crate::math::{DVec3, circle_positions, parse_position};
use std::path::{Path, PathBuf};

/// An omnidirectional point receiver.
///
/// A microphone starts with only a position. [`Scene::render`](super::Scene::render) fills
/// its mixed buffer, one ground-truth stem per source and its sample rate; [`reset`](Self::reset)
/// clears them so the same microphone can be rendered again.
#[derive(Debug, Clone, PartialEq)]
pub struct Microphone {
    position: DVec3,
    buffer: Vec<f32>,
    sources_gt: Vec<Vec<f32>>,
    sample_rate: Option<u32>,
}

impl Microphone {
    /// Create a microphone from `x, y, z` in meters.
    pub fn new(position: &[f64]) -> Result<Self> {
        Ok(Self::at(parse_position(position)?))
    }

    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            buffer: Vec::new(),
            sources_gt: Vec::new(),
            sample_rate: None,
        }
    }

    /// Planar circular array of `num_mics` microphones with the given radius, centered on
    /// the origin; microphone `i` sits at angle `2πi / num_mics` from +X.
    pub fn circular_array(num_mics: usize, radius: f64) -> Vec<Self> {
        circle_positions(num_mics, radius)
            .into_iter()
            .map(Self::at)
            .collect()
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// The linear mix of all sources as heard here
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    /// Per-source contributions, in the scene's source order
    pub fn sources_gt(&self) -> &[Vec<f32>] {
        &self.sources_gt
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn is_rendered(&self) -> bool {
        self.sample_rate.is_some()
    }

    /// Forget the last render, keeping only the position
    pub fn reset(&mut self) {
        self.buffer = Vec::new();
        self.sources_gt = Vec::new();
        self.sample_rate = None;
    }

    /// Zero the mix to `total_samples` and adopt the scene rate
    pub(crate) fn begin_render(&mut self, total_samples: usize, sample_rate: u32) {
        self.buffer.clear();
        self.buffer.resize(total_samples, 0.0);
        self.sources_gt.clear();
        self.sample_rate = Some(sample_rate);
    }

    /// Add one source's contribution to the mix and keep it as a stem
    pub(crate) fn accumulate(&mut self, contribution: Vec<f32>) {
        debug_assert_eq!(contribution.len(), self.buffer.len());
        for (mixed, sample) in self.buffer.iter_mut().zip(&contribution) {
            *mixed += sample;
        }
        self.sources_gt.push(contribution);
    }

    /// Write the mix and every stem next to each other.
    ///
    /// Files are named `<prefix>mixed.wav` and `<prefix>sourceNN_gt.wav`, so a prefix such as
    /// `scene/mic03_` yields `scene/mic03_mixed.wav`, `scene/mic03_source00_gt.wav`, ...
    ///
    /// # Errors
    ///
    /// [`SonoSceneError::InvalidArgument`] if the microphone was never rendered, and
    /// [`SonoSceneError::Io`] if a file cannot be created.
    pub fn save(&self, prefix: impl AsRef<Path>) -> Result<()> {
        self.save_with_encoding(prefix, WavEncoding::default())
    }

    pub fn save_with_encoding(&self, prefix: impl AsRef<Path>, encoding: WavEncoding) -> Result<()> {
        let sample_rate = self.sample_rate.ok_or_else(|| {
            SonoSceneError::InvalidArgument(format!(
                "Microphone at {} has not been rendered",
                self.position
            ))
        })?;

        let prefix = prefix.as_ref();
        write_wav(
            suffixed(prefix, "mixed.wav"),
            &self.buffer,
            sample_rate,
            1,
            encoding,
        )?;
        for (index, stem) in self.sources_gt.iter().enumerate() {
            write_wav(
                suffixed(prefix, &format!("source{:02}_gt.wav", index)),
                stem,
                sample_rate,
                1,
                encoding,
            )?;
        }

        log::debug!(
            "Saved microphone at {} with {} stem(s) to {}*",
            self.position,
            self.sources_gt.len(),
            prefix.display()
        );
        Ok(())
    }
}

/// Append `suffix` to the last path component (`dir/mic00_` + `mixed.wav`)
fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

/// Create a microphone at `x, y, z` meters
pub fn build_microphone(position: &[f64]) -> Result<Microphone> {
    Microphone::new(position)
}

/// Persist `mic` under `prefix`, see [`Microphone::save`]
pub fn save_microphone(mic: &Microphone, prefix: impl AsRef<Path>) -> Result<()> {
    mic.save(prefix)
}
