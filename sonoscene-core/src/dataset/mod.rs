//! On-disk layout of a rendered dataset.
//!
//! ```text
//! <root>/
//!     00000/
//!         mic00_mixed.wav
//!         mic00_source00_gt.wav
//!         mic00_source01_gt.wav
//!         mic01_mixed.wav
//!         ...
//!         metadata.json
//!     00001/
//!         ...
//! ```

mod metadata;

pub use metadata::{METADATA_FILE, SceneMetadata, SourceRecord, source_key};

use crate::error::Result;
use crate::scene::Microphone;
use std::path::{Path, PathBuf};

/// Directory of scene `index` under `root`
pub fn scene_dir(root: impl AsRef<Path>, index: usize) -> PathBuf {
    root.as_ref().join(format!("{:05}", index))
}

/// File prefix for microphone `mic_index` inside a scene directory
pub fn mic_prefix(dir: impl AsRef<Path>, mic_index: usize) -> PathBuf {
    dir.as_ref().join(format!("mic{:02}_", mic_index))
}

/// Persist a rendered scene: every microphone under its prefix, then `metadata.json`.
///
/// The directory is created if needed.
pub fn save_scene(dir: impl AsRef<Path>, mics: &[Microphone], metadata: &SceneMetadata) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    for (index, mic) in mics.iter().enumerate() {
        mic.save(mic_prefix(dir, index))?;
    }
    metadata.save(dir.join(METADATA_FILE))?;

    log::info!(
        "Saved scene with {} microphone(s) and {} source record(s) to {}",
        mics.len(),
        metadata.len(),
        dir.display()
    );
    Ok(())
}
