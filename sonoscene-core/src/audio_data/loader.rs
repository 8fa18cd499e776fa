use crate::audio_data::AudioData;
use crate::error::Result;
use std::path::Path;

/// Trait for decoding audio data from file paths.
///
/// sonoscene ships a Symphonia-based [`DefaultAudioLoader`](super::DefaultAudioLoader),
/// but any decoder can be plugged in. A loader only decodes: it returns the file's
/// samples at their native rate and channel count, and the caller's
/// [`LoadOptions`](super::LoadOptions) are applied afterwards.
///
/// # Example
///
/// ```
/// use sonoscene_core::audio_data::{AudioData, AudioDataLoader};
/// use sonoscene_core::error::Result;
/// use std::path::Path;
///
/// /// Every path decodes to one second of silence.
/// struct SilenceLoader;
///
/// impl AudioDataLoader for SilenceLoader {
///     fn load(&self, _path: &Path) -> Result<AudioData> {
///         AudioData::from_samples(vec![0.0; 8000], 8000, 1)
///     }
/// }
/// ```
pub trait AudioDataLoader {
    /// Decodes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a `SonoSceneError` if the file cannot be read or decoded.
    fn load(&self, path: &Path) -> Result<AudioData>;
}
