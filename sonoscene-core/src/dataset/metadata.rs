use crate::error::Result;
use crate::math::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// File name of the per-scene metadata document
pub const METADATA_FILE: &str = "metadata.json";

/// Key under which source `index` is recorded, e.g. `source03`
pub fn source_key(index: usize) -> String {
    format!("source{:02}", index)
}

/// Where a source was placed and which audio it played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub position: [f64; 3],
    pub filename: String,
}

/// The `metadata.json` written next to a rendered scene.
///
/// Serialized as a flat object keyed by [`source_key`]:
///
/// ```json
/// {
///     "source00": {
///         "position": [1.0, -2.5, 0.0],
///         "filename": "out/00000/gt_voice.wav"
///     }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneMetadata {
    sources: BTreeMap<String, SourceRecord>,
}

impl SceneMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record source `index`, replacing any earlier record for it
    pub fn insert_source(&mut self, index: usize, position: DVec3, filename: impl Into<String>) {
        self.sources.insert(
            source_key(index),
            SourceRecord {
                position: position.to_array(),
                filename: filename.into(),
            },
        );
    }

    pub fn source(&self, index: usize) -> Option<&SourceRecord> {
        self.sources.get(&source_key(index))
    }

    /// Records in key order
    pub fn sources(&self) -> impl Iterator<Item = (&str, &SourceRecord)> {
        self.sources.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Write as JSON indented by four spaces
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        self.serialize(&mut serializer)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Ok(serde_json::from_reader(reader)?)
    }
}
