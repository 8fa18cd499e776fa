//! Batch description read by `sonoscene-demo render`.
//!
//! ```json
//! {
//!     "scene_duration": 3.0,
//!     "mic_array": { "type": "circle", "num_mics": 6, "radius": 0.3 },
//!     "scenes": [
//!         {
//!             "sources": [
//!                 { "position": [1.0, 2.0, 0.0], "files": ["voices/p225_001.wav", "voices/p225_002.wav"] },
//!                 { "position": [-4.0, 3.5, 0.0], "files": ["bg/rain.wav"], "gain": 0.5 }
//!             ]
//!         }
//!     ]
//! }
//! ```
//!
//! Relative file paths are resolved against the manifest's directory.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use sonoscene_core::config::{NearFieldPolicy, RenderOptions};
use sonoscene_core::scene::{AudioInput, Microphone, SoundSource, SourceOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Radius of the default circular array in meters
const DEFAULT_RADIUS: f64 = 0.3;

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Length of every rendered scene in seconds
    pub scene_duration: f64,
    pub mic_array: MicArraySpec,
    #[serde(default)]
    pub render: RenderSpec,
    pub scenes: Vec<SceneSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MicArraySpec {
    Circle {
        num_mics: usize,
        #[serde(default = "default_radius")]
        radius: f64,
    },
    Positions {
        positions: Vec<[f64; 3]>,
    },
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderSpec {
    pub geometric_attenuation: bool,
    pub atmospheric_attenuation: bool,
    /// Clamp attenuation distance to this floor instead of failing on coincident pairs
    pub min_distance: Option<f64>,
}

impl Default for RenderSpec {
    fn default() -> Self {
        Self {
            geometric_attenuation: true,
            atmospheric_attenuation: true,
            min_distance: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneSpec {
    pub sources: Vec<SourceSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    pub position: [f64; 3],
    pub files: Vec<PathBuf>,
    #[serde(default = "unit_gain")]
    pub gain: f32,
    #[serde(default)]
    pub start_time: f64,
    /// Seconds skipped at the head of each file
    #[serde(default)]
    pub offset: f64,
    /// Seconds kept from each file
    #[serde(default)]
    pub duration: Option<f64>,
}

fn unit_gain() -> f32 {
    1.0
}

impl Manifest {
    /// Read a manifest and make its file paths absolute.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        let mut manifest: Manifest = serde_json::from_str(&text)
            .with_context(|| format!("parsing manifest {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for scene in &mut manifest.scenes {
            for source in &mut scene.sources {
                for file in &mut source.files {
                    if file.is_relative() {
                        *file = base.join(&*file);
                    }
                }
            }
        }

        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if !(self.scene_duration > 0.0 && self.scene_duration.is_finite()) {
            bail!("scene_duration must be positive, got {}", self.scene_duration);
        }
        if self.microphones().is_empty() {
            bail!("mic_array has no microphones");
        }
        for (index, scene) in self.scenes.iter().enumerate() {
            if scene.sources.is_empty() {
                bail!("scene {} has no sources", index);
            }
        }
        Ok(())
    }

    pub fn microphones(&self) -> Vec<Microphone> {
        match &self.mic_array {
            MicArraySpec::Circle { num_mics, radius } => {
                Microphone::circular_array(*num_mics, *radius)
            }
            MicArraySpec::Positions { positions } => positions
                .iter()
                .map(|p| Microphone::at((*p).into()))
                .collect(),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        let near_field = match self.render.min_distance {
            Some(min_distance) => NearFieldPolicy::clamp(min_distance),
            None => NearFieldPolicy::Reject,
        };
        RenderOptions::new()
            .geometric_attenuation(self.render.geometric_attenuation)
            .atmospheric_attenuation(self.render.atmospheric_attenuation)
            .near_field(near_field)
    }
}

impl SourceSpec {
    /// Decode the source's files into a renderable source
    pub fn build(&self) -> Result<SoundSource> {
        let mut options = SourceOptions::new()
            .start_time(self.start_time)
            .offset(seconds(self.offset, "offset")?);
        if let Some(duration) = self.duration {
            options = options.duration(seconds(duration, "duration")?);
        }

        let input = match self.files.as_slice() {
            [single] => AudioInput::File(single.clone()),
            _ => AudioInput::Files(self.files.clone()),
        };
        let source = SoundSource::new(&self.position, input, &options)
            .with_context(|| format!("building source from {:?}", self.files))?;

        Ok(if self.gain == 1.0 {
            source
        } else {
            source.with_gain(self.gain)
        })
    }
}

fn seconds(value: f64, name: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid {} {}", name, value))
}
