//! # sonoscene-core
//!
//! Offline renderer for multi-microphone acoustic scenes, plus the spectral features used
//! to train source separation and localization models on the rendered data.
//!
//! - [`scene`]: point sources, omnidirectional microphones and free-field propagation
//!   (pure delay, inverse-square spreading, air absorption)
//! - [`features`]: log-mel and constant-Q spectrograms, dominance masks
//! - [`dataset`]: directory layout and `metadata.json` for batches of rendered scenes
//! - [`audio_data`]: decoding, resampling, silence trimming and WAV output
//!
//! ```no_run
//! use sonoscene_core::config::RenderOptions;
//! use sonoscene_core::scene::{AudioInput, Microphone, Scene, build_source};
//!
//! let sources = vec![
//!     build_source(&[2.0, 1.0, 0.0], AudioInput::file("voice.wav"))?,
//!     build_source(&[-4.0, 3.0, 0.0], AudioInput::file("rain.wav"))?.with_gain(0.5),
//! ];
//! let mut mics = Microphone::circular_array(6, 0.3);
//!
//! Scene::new(&sources, &mut mics)?.render(3.0, &RenderOptions::default())?;
//! for (i, mic) in mics.iter().enumerate() {
//!     mic.save(format!("out/mic{:02}_", i))?;
//! }
//! # Ok::<(), sonoscene_core::SonoSceneError>(())
//! ```

pub mod audio_data;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod math;
pub mod scene;

pub use audio_data::{AudioData, LoadOptions, WavEncoding};
pub use config::{NearFieldPolicy, RenderOptions};
pub use dataset::{SceneMetadata, save_scene};
pub use error::{Result, SonoSceneError};
pub use features::{FeatureInput, ReadOptions, TransformKind, extract_features};
pub use scene::{
    AudioInput, Microphone, Scene, SoundSource, SourceOptions, build_microphone, build_source,
    render_scene, save_binaural, save_microphone,
};
