//! Scene rendering: propagation of point sources to a set of microphones.
//!
//! A [`Scene`] borrows a slice of [`SoundSource`]s and a mutable slice of
//! [`Microphone`]s. Rendering models each source-microphone pair as
//!
//! 1. a pure sample shift of `floor(sample_rate * (start_time + distance / SPEED_OF_SOUND))`,
//! 2. geometric spreading, dividing by `distance²`,
//! 3. air absorption, multiplying by `exp(-ATTENUATION_ALPHA * distance)`,
//!
//! and sums the contributions into each microphone's mix while keeping every
//! per-source contribution as a ground-truth stem.
//!
//! # Example
//!
//! ```
//! use sonoscene_core::config::RenderOptions;
//! use sonoscene_core::scene::{AudioInput, Microphone, Scene, SoundSource, SourceOptions};
//!
//! let click = AudioInput::Samples { data: vec![1.0], sample_rate: Some(48000) };
//! let sources = vec![SoundSource::new(&[1.0, 0.0, 0.0], click, &SourceOptions::default())?];
//! let mut mics = vec![Microphone::new(&[0.0, 0.0, 0.0])?];
//!
//! let mut scene = Scene::new(&sources, &mut mics)?;
//! scene.render(1.0, &RenderOptions::default())?;
//!
//! // 1 m at 343 m/s is 139 samples at 48 kHz
//! assert_eq!(mics[0].buffer().len(), 48000);
//! assert!(mics[0].buffer()[139] > 0.99);
//! # Ok::<(), sonoscene_core::SonoSceneError>(())
//! ```

mod microphone;
mod propagation;
mod render;
mod source;

pub use microphone::{Microphone, build_microphone, save_microphone};
pub use propagation::{attenuation_gain, delay_samples, render_contribution};
pub use render::{Scene, render_scene, save_binaural};
pub use source::{AudioInput, SoundSource, SourceOptions, build_source};

/// Speed of sound in air, m/s
pub const SPEED_OF_SOUND: f64 = 343.0;

/// Air absorption coefficient per meter (20 °C, 1 atm, 1 kHz, 70 % relative humidity)
pub const ATTENUATION_ALPHA: f64 = 4.98e-3;

/// Rate every file-backed source is decoded to
pub const TARGET_SAMPLE_RATE: u32 = 48000;
