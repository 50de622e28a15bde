//! Manifest (`data.json`) parsing.
//!
//! The manifest names a base folder and an ordered map of levels. Each level
//! points at a folder, a thumbnail and a set of segments, every one of them a
//! free-roam track plus an optional combat track. Parsing here is pure: it
//! validates the document, resolves every asset to `base-folder/folder/file`
//! and never touches the audio device or the image decoder.
//!
//! Top-level problems (unreadable file, malformed JSON, missing `base-folder`
//! or `levels`) are errors. Problems inside a single level or segment entry are
//! logged and the entry is skipped.

use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Default manifest location, relative to the working directory.
pub const DEFAULT_MANIFEST: &str = "data.json";

/// Errors that abort loading the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("unable to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The manifest is not valid JSON.
    #[error("could not parse JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// A required top-level field is missing or has the wrong type.
    #[error("invalid manifest: {0}")]
    Schema(String),
    /// Every level entry was skipped, or none were listed.
    #[error("manifest contains no usable levels")]
    Empty,
}

/// A segment entry with its asset paths resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEntry {
    pub name: String,
    pub free_path: PathBuf,
    pub combat_path: Option<PathBuf>,
}

/// A level entry with its asset paths resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelEntry {
    pub name: String,
    pub thumbnail_path: PathBuf,
    pub segments: Vec<SegmentEntry>,
}

/// A validated manifest, levels in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub base_folder: String,
    pub levels: Vec<LevelEntry>,
}

/// Raw shape of one `levels` value. Every field is optional so a bad entry
/// can be skipped instead of failing the whole document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLevel {
    folder: Option<Value>,
    thumbnail: Option<Value>,
    segments: Option<Value>,
    free: Option<Value>,
    combat: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSegment {
    name: Option<Value>,
    free: Option<Value>,
    combat: Option<Value>,
}

impl Manifest {
    /// Reads and parses a manifest file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses manifest text.
    ///
    /// Level entries missing `folder`, `thumbnail` or segment data are skipped,
    /// as are segment entries missing `name` or `free`. The result may hold zero
    /// levels; deciding whether that is fatal is left to the catalog loader.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let root: Value = serde_json::from_str(text)?;

        let base_folder = root
            .get("base-folder")
            .and_then(Value::as_str)
            .ok_or_else(|| ManifestError::Schema("missing base-folder string".into()))?
            .to_string();

        let levels = match root.get("levels") {
            Some(Value::Object(levels)) => levels,
            Some(_) => {
                return Err(ManifestError::Schema("levels must be an object".into()));
            }
            None => return Err(ManifestError::Schema("missing levels object".into())),
        };

        let levels = levels
            .iter()
            .filter_map(|(name, value)| parse_level(&base_folder, name, value))
            .collect();

        Ok(Self {
            base_folder,
            levels,
        })
    }
}

/// Builds `base/folder/file`, forward-slash joined.
pub fn asset_path(base_folder: &str, folder: &str, file: &str) -> PathBuf {
    PathBuf::from(format!("{}/{}/{}", base_folder, folder, file))
}

fn parse_level(base_folder: &str, name: &str, value: &Value) -> Option<LevelEntry> {
    let raw: RawLevel = match serde_json::from_value(value.clone()) {
        Ok(raw) => raw,
        Err(_) => {
            warn!("Skipping level '{}' because it is not an object", name);
            return None;
        }
    };

    let folder = raw.folder.as_ref().and_then(Value::as_str);
    let thumbnail = raw.thumbnail.as_ref().and_then(Value::as_str);
    let (Some(folder), Some(thumbnail)) = (folder, thumbnail) else {
        warn!("Skipping level '{}' because of missing fields", name);
        return None;
    };

    let segments = match (&raw.segments, raw.free.as_ref().and_then(Value::as_str)) {
        (Some(segments), _) => parse_segments(base_folder, folder, name, segments)?,
        // Single-segment form: `free`/`combat` directly on the level.
        (None, Some(free)) => vec![SegmentEntry {
            name: name.to_string(),
            free_path: asset_path(base_folder, folder, free),
            combat_path: raw
                .combat
                .as_ref()
                .and_then(Value::as_str)
                .map(|combat| asset_path(base_folder, folder, combat)),
        }],
        (None, None) => {
            warn!("Skipping level '{}' because of missing fields", name);
            return None;
        }
    };

    Some(LevelEntry {
        name: name.to_string(),
        thumbnail_path: asset_path(base_folder, folder, thumbnail),
        segments,
    })
}

fn parse_segments(
    base_folder: &str,
    folder: &str,
    level: &str,
    segments: &Value,
) -> Option<Vec<SegmentEntry>> {
    let entries: Vec<(String, &Value)> = match segments {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => {
            warn!("Skipping level '{}' because segments is not an object", level);
            return None;
        }
    };

    let parsed = entries
        .into_iter()
        .filter_map(|(key, value)| {
            let raw: RawSegment = serde_json::from_value(value.clone()).unwrap_or_default();
            let name = raw.name.as_ref().and_then(Value::as_str);
            let free = raw.free.as_ref().and_then(Value::as_str);
            let (Some(name), Some(free)) = (name, free) else {
                warn!(
                    "Skipping segment '{}' of level '{}' because of missing name or free track",
                    key, level
                );
                return None;
            };
            Some(SegmentEntry {
                name: name.to_string(),
                free_path: asset_path(base_folder, folder, free),
                combat_path: raw
                    .combat
                    .as_ref()
                    .and_then(Value::as_str)
                    .map(|combat| asset_path(base_folder, folder, combat)),
            })
        })
        .collect();

    Some(parsed)
}
