//! The level catalog.
//!
//! A [`Catalog`] is an ordered, capacity-bounded list of [`Level`]s, each
//! holding up to [`MAX_SEGMENTS`] playable [`Segment`]s with their audio
//! streams and a thumbnail preview. It is built once at startup from the
//! manifest and owns every loaded asset for the rest of the run.

mod manifest;
mod thumbnail;

pub use manifest::{
    asset_path, LevelEntry, Manifest, ManifestError, SegmentEntry, DEFAULT_MANIFEST,
};
pub use thumbnail::{Thumbnail, ThumbnailError, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};

use crate::audio::{MusicLoader, MusicStream};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Maximum number of levels in a catalog.
pub const MAX_LEVELS: usize = 50;

/// Maximum number of segments in a level.
pub const MAX_SEGMENTS: usize = 10;

/// Raised when a bounded container is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("capacity of {capacity} exceeded")]
pub struct CapacityExceeded {
    pub capacity: usize,
}

/// One playable unit: a free-roam track and an optional combat layer.
pub struct Segment {
    /// Display name.
    pub name: String,
    free: Box<dyn MusicStream>,
    combat: Option<Box<dyn MusicStream>>,
}

impl Segment {
    pub fn new(
        name: impl Into<String>,
        free: Box<dyn MusicStream>,
        combat: Option<Box<dyn MusicStream>>,
    ) -> Self {
        Self {
            name: name.into(),
            free,
            combat,
        }
    }

    pub fn has_combat(&self) -> bool {
        self.combat.is_some()
    }

    pub fn free(&self) -> &dyn MusicStream {
        self.free.as_ref()
    }

    pub fn combat(&self) -> Option<&dyn MusicStream> {
        self.combat.as_deref()
    }

    pub(crate) fn free_mut(&mut self) -> &mut dyn MusicStream {
        self.free.as_mut()
    }

    pub(crate) fn combat_mut(&mut self) -> Option<&mut (dyn MusicStream + 'static)> {
        self.combat.as_deref_mut()
    }

    /// Applies `f` to every stream of the segment, free first.
    pub(crate) fn for_each_stream(&mut self, mut f: impl FnMut(&mut dyn MusicStream)) {
        f(self.free.as_mut());
        if let Some(combat) = self.combat.as_deref_mut() {
            f(combat);
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("name", &self.name)
            .field("has_combat", &self.has_combat())
            .finish()
    }
}

/// A named level: a thumbnail and its segments.
#[derive(Debug)]
pub struct Level {
    /// Display name (the manifest key).
    pub name: String,
    /// Resolved thumbnail path.
    pub thumbnail_path: PathBuf,
    /// Decoded preview, `None` when the image failed to load.
    pub thumbnail: Option<Thumbnail>,
    segments: Vec<Segment>,
    current_segment: usize,
}

impl Level {
    pub fn new(name: impl Into<String>, thumbnail_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            thumbnail_path: thumbnail_path.into(),
            thumbnail: None,
            segments: Vec::new(),
            current_segment: 0,
        }
    }

    /// Appends a segment, refusing once [`MAX_SEGMENTS`] is reached.
    pub fn try_push_segment(&mut self, segment: Segment) -> Result<(), CapacityExceeded> {
        if self.segments.len() >= MAX_SEGMENTS {
            return Err(CapacityExceeded {
                capacity: MAX_SEGMENTS,
            });
        }
        self.segments.push(segment);
        Ok(())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Index of the selected segment. Always valid when the level has segments.
    pub fn current_segment(&self) -> usize {
        self.current_segment
    }

    pub(crate) fn segment_mut(&mut self, index: usize) -> Option<&mut Segment> {
        self.segments.get_mut(index)
    }

    pub(crate) fn set_current_segment(&mut self, index: usize) {
        debug_assert!(index < self.segments.len().max(1));
        self.current_segment = index;
    }
}

/// Ordered, bounded collection of levels.
#[derive(Debug)]
pub struct Catalog {
    levels: Vec<Level>,
    capacity: usize,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::with_capacity(MAX_LEVELS)
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            levels: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a level, refusing once the catalog is full.
    pub fn try_push(&mut self, level: Level) -> Result<(), CapacityExceeded> {
        if self.levels.len() >= self.capacity {
            return Err(CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.levels.push(level);
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub(crate) fn level_mut(&mut self, index: usize) -> Option<&mut Level> {
        self.levels.get_mut(index)
    }

    /// Reads the manifest at `path` and loads every asset it references.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable or malformed manifest, on missing top-level
    /// fields, and when no level survives validation.
    pub fn load<P: AsRef<Path>>(
        path: P,
        loader: &mut dyn MusicLoader,
    ) -> Result<Self, ManifestError> {
        let manifest = Manifest::load(path)?;
        Self::from_manifest(&manifest, loader)
    }

    /// Loads thumbnails and audio for every manifest entry.
    ///
    /// Asset failures are logged and never abort the load: a missing
    /// thumbnail leaves a placeholder, a combat track that fails leaves the
    /// segment without a combat layer, and a free track that fails drops the
    /// segment.
    pub fn from_manifest(
        manifest: &Manifest,
        loader: &mut dyn MusicLoader,
    ) -> Result<Self, ManifestError> {
        let mut catalog = Self::new();

        for entry in &manifest.levels {
            if catalog.len() >= catalog.capacity() {
                warn!(
                    "Catalog is full ({} levels); ignoring '{}' and the rest",
                    catalog.capacity(),
                    entry.name
                );
                break;
            }
            let level = load_level(entry, loader);
            if let Err(e) = catalog.try_push(level) {
                warn!("Could not add level '{}': {}", entry.name, e);
                break;
            }
        }

        if catalog.is_empty() {
            return Err(ManifestError::Empty);
        }

        info!("Loaded {} levels", catalog.len());
        Ok(catalog)
    }
}

fn load_level(entry: &LevelEntry, loader: &mut dyn MusicLoader) -> Level {
    let mut level = Level::new(&entry.name, &entry.thumbnail_path);

    match Thumbnail::load(&entry.thumbnail_path) {
        Ok(thumbnail) => level.thumbnail = Some(thumbnail),
        Err(e) => warn!(
            "Level '{}': thumbnail {}: {}",
            entry.name,
            entry.thumbnail_path.display(),
            e
        ),
    }

    for segment in &entry.segments {
        if level.segment_count() >= MAX_SEGMENTS {
            warn!(
                "Level '{}' has more than {} segments; ignoring '{}' and the rest",
                entry.name, MAX_SEGMENTS, segment.name
            );
            break;
        }
        let Some(loaded) = load_segment(&entry.name, segment, loader) else {
            continue;
        };
        if let Err(e) = level.try_push_segment(loaded) {
            warn!("Level '{}': could not add segment: {}", entry.name, e);
            break;
        }
    }

    if level.segment_count() == 0 {
        warn!("Level '{}' has no playable segments", entry.name);
    }
    level
}

fn load_segment(
    level: &str,
    entry: &SegmentEntry,
    loader: &mut dyn MusicLoader,
) -> Option<Segment> {
    let free = match loader.load_music(&entry.free_path) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(
                "Level '{}': skipping segment '{}': {}",
                level, entry.name, e
            );
            return None;
        }
    };

    let combat = entry
        .combat_path
        .as_ref()
        .and_then(|path| match loader.load_music(path) {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(
                    "Level '{}': segment '{}' has no combat layer: {}",
                    level, entry.name, e
                );
                None
            }
        });

    Some(Segment::new(&entry.name, free, combat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::MockLoader;
    use std::fmt::Write as _;
    use std::fs;

    const FOREST: &str = r#"{"base-folder":"assets","levels":{"Forest":{"folder":"f1","thumbnail":"t.png","segments":{"0":{"name":"Calm","free":"calm.ogg","combat":"fight.ogg"}}}}}"#;

    fn many_levels(count: usize) -> String {
        let mut levels = String::new();
        for i in 0..count {
            if i > 0 {
                levels.push(',');
            }
            write!(
                levels,
                r#""L{i}":{{"folder":"l{i}","thumbnail":"t.png","segments":{{"0":{{"name":"S","free":"s.ogg"}}}}}}"#
            )
            .unwrap();
        }
        format!(r#"{{"base-folder":"assets","levels":{{{}}}}}"#, levels)
    }

    #[test]
    fn test_forest_scenario() {
        let manifest = Manifest::parse(FOREST).unwrap();
        let mut loader = MockLoader::new();
        let catalog = Catalog::from_manifest(&manifest, &mut loader).unwrap();

        assert_eq!(catalog.len(), 1);
        let level = catalog.level(0).unwrap();
        assert_eq!(level.name, "Forest");
        assert_eq!(level.thumbnail_path, PathBuf::from("assets/f1/t.png"));
        assert_eq!(level.current_segment(), 0);
        assert_eq!(level.segment_count(), 1);

        let segment = level.segment(0).unwrap();
        assert_eq!(segment.name, "Calm");
        assert!(segment.has_combat());

        let paths: Vec<_> = loader.loaded.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(
            paths,
            [
                PathBuf::from("assets/f1/calm.ogg"),
                PathBuf::from("assets/f1/fight.ogg")
            ]
        );
        // Nothing starts playing at load time
        assert_eq!(loader.started_count(), 0);
    }

    #[test]
    fn test_levels_in_order_with_first_segment_selected() {
        let manifest = Manifest::parse(&many_levels(5)).unwrap();
        let catalog = Catalog::from_manifest(&manifest, &mut MockLoader::new()).unwrap();
        assert_eq!(catalog.len(), 5);
        for (i, level) in catalog.levels().iter().enumerate() {
            assert_eq!(level.name, format!("L{}", i));
            assert_eq!(level.current_segment(), 0);
        }
    }

    #[test]
    fn test_catalog_capacity_is_enforced() {
        let manifest = Manifest::parse(&many_levels(MAX_LEVELS + 3)).unwrap();
        assert_eq!(manifest.levels.len(), MAX_LEVELS + 3);

        let catalog = Catalog::from_manifest(&manifest, &mut MockLoader::new()).unwrap();
        assert_eq!(catalog.len(), MAX_LEVELS);
        assert_eq!(catalog.levels().last().unwrap().name, format!("L{}", MAX_LEVELS - 1));
    }

    #[test]
    fn test_try_push_signals_capacity() {
        let mut catalog = Catalog::with_capacity(1);
        catalog.try_push(Level::new("A", "a.png")).unwrap();
        let err = catalog.try_push(Level::new("B", "b.png")).unwrap_err();
        assert_eq!(err, CapacityExceeded { capacity: 1 });
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_segment_capacity_is_enforced() {
        let mut segments = String::new();
        for i in 0..MAX_SEGMENTS + 2 {
            if i > 0 {
                segments.push(',');
            }
            write!(segments, r#""{i}":{{"name":"S{i}","free":"s{i}.ogg"}}"#).unwrap();
        }
        let text = format!(
            r#"{{"base-folder":"a","levels":{{"Big":{{"folder":"b","thumbnail":"t.png","segments":{{{}}}}}}}}}"#,
            segments
        );
        let manifest = Manifest::parse(&text).unwrap();
        let catalog = Catalog::from_manifest(&manifest, &mut MockLoader::new()).unwrap();
        assert_eq!(catalog.level(0).unwrap().segment_count(), MAX_SEGMENTS);

        let mut level = Level::new("Full", "f.png");
        let mut loader = MockLoader::new();
        for i in 0..MAX_SEGMENTS {
            let stream = loader.load_music(Path::new(&format!("{}.ogg", i))).unwrap();
            level.try_push_segment(Segment::new("S", stream, None)).unwrap();
        }
        let stream = loader.load_music(Path::new("extra.ogg")).unwrap();
        assert!(level.try_push_segment(Segment::new("S", stream, None)).is_err());
    }

    #[test]
    fn test_zero_levels_is_a_failure() {
        let manifest = Manifest::parse(r#"{"base-folder":"a","levels":{}}"#).unwrap();
        let err = Catalog::from_manifest(&manifest, &mut MockLoader::new()).unwrap_err();
        assert!(matches!(err, ManifestError::Empty));

        let manifest =
            Manifest::parse(r#"{"base-folder":"a","levels":{"Broken":{"folder":"x"}}}"#).unwrap();
        let err = Catalog::from_manifest(&manifest, &mut MockLoader::new()).unwrap_err();
        assert!(matches!(err, ManifestError::Empty));
    }

    #[test]
    fn test_failed_assets_are_not_fatal() {
        let text = r#"{"base-folder":"assets","levels":{"Forest":{"folder":"f1","thumbnail":"t.png","segments":{
            "0":{"name":"Calm","free":"calm.ogg","combat":"fight.ogg"},
            "1":{"name":"Broken","free":"broken.ogg"}
        }}}}"#;
        let manifest = Manifest::parse(text).unwrap();
        let mut loader = MockLoader::new()
            .fail("assets/f1/fight.ogg")
            .fail("assets/f1/broken.ogg");
        let catalog = Catalog::from_manifest(&manifest, &mut loader).unwrap();

        let level = catalog.level(0).unwrap();
        // Thumbnail does not exist on disk: placeholder
        assert!(level.thumbnail.is_none());
        // Combat failed: the segment stays, without a combat layer
        assert_eq!(level.segment_count(), 1);
        assert!(!level.segment(0).unwrap().has_combat());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("assets");
        fs::create_dir_all(base.join("f1")).unwrap();
        image::RgbImage::from_pixel(8, 8, image::Rgb([1, 2, 3]))
            .save(base.join("f1").join("t.png"))
            .unwrap();

        let text = FOREST.replace("\"assets\"", &format!("{:?}", base.display().to_string()));
        let manifest_path = dir.path().join("data.json");
        fs::write(&manifest_path, text).unwrap();

        let catalog = Catalog::load(&manifest_path, &mut MockLoader::new()).unwrap();
        let level = catalog.level(0).unwrap();
        assert!(level.thumbnail.is_some());
        assert_eq!(level.thumbnail_path, base.join("f1").join("t.png"));
    }

    #[test]
    fn test_load_missing_manifest() {
        let err = Catalog::load("missing/data.json", &mut MockLoader::new()).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
