//! Interval index and scene sources.
//!
//! A corpus directory holds two trees:
//!
//! ```text
//! <corpus>/derived_data/transcription_annotation/<pair>/<run>.TextGrid
//! <corpus>/derived_data/multimodal_data/scene_information/<folder>/<file>
//! ```
//!
//! [`IntervalIndex::build`] decodes every timing file of the first tree into a
//! [`Recording`]; [`SceneSources::load`] collects the per-game fragments and
//! scene descriptions of the second. Both scans go exactly two levels deep
//! and skip files they do not recognise.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::diagnostics::{DiagnosticCode, DiagnosticLog};
use crate::error::PentorefError;
use crate::ir::io_eaf::read_eaf;
use crate::ir::io_scene_xml::read_scene_xml;
use crate::ir::io_textgrid::{decode_text, read_textgrid};
use crate::ir::{Recording, SceneDocument};

const TRANSCRIPTION_DIR: &str = "transcription_annotation";
const SCENE_DIR: [&str; 2] = ["multimodal_data", "scene_information"];
const DERIVED_DIR: &str = "derived_data";

const TILE_MARKER: &str = "final-selected";
const LANDMARK_MARKER: &str = "landmark";

/// On-disk format of the timing annotation files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TranscriptionFormat {
    TextGrid,
    Eaf,
}

impl TranscriptionFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TranscriptionFormat::TextGrid => "textgrid",
            TranscriptionFormat::Eaf => "eaf",
        }
    }

    /// `Eaf` if any file two levels below `dir` has the `.eaf` extension,
    /// `TextGrid` otherwise.
    pub fn detect(dir: &Path) -> Result<Self, PentorefError> {
        for path in second_level_files(dir)? {
            if has_extension(&path, "eaf") {
                return Ok(TranscriptionFormat::Eaf);
            }
        }
        Ok(TranscriptionFormat::TextGrid)
    }

    fn read(&self, path: &Path) -> Result<Recording, PentorefError> {
        match self {
            TranscriptionFormat::TextGrid => read_textgrid(path),
            TranscriptionFormat::Eaf => read_eaf(path),
        }
    }
}

impl fmt::Display for TranscriptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Where the two input trees of a corpus live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorpusLayout {
    pub transcriptions: PathBuf,
    pub scenes: Option<PathBuf>,
}

impl CorpusLayout {
    /// Finds the input trees below a corpus root.
    ///
    /// The `derived_data/` level is optional. A missing scene tree is not an
    /// error: the variants that need scenes log every game they cannot find.
    pub fn discover(corpus: &Path) -> Result<Self, PentorefError> {
        if !corpus.is_dir() {
            return Err(PentorefError::LayoutInvalid {
                path: corpus.to_path_buf(),
                message: "corpus path must be a directory".to_string(),
            });
        }

        let bases = [corpus.join(DERIVED_DIR), corpus.to_path_buf()];
        let transcriptions = bases
            .iter()
            .map(|base| base.join(TRANSCRIPTION_DIR))
            .find(|dir| dir.is_dir())
            .ok_or_else(|| PentorefError::LayoutInvalid {
                path: corpus.to_path_buf(),
                message: format!(
                    "expected a {TRANSCRIPTION_DIR}/ directory (optionally below {DERIVED_DIR}/)"
                ),
            })?;
        let scenes = bases
            .iter()
            .map(|base| base.join(SCENE_DIR[0]).join(SCENE_DIR[1]))
            .find(|dir| dir.is_dir());

        Ok(Self {
            transcriptions,
            scenes,
        })
    }
}

/// Decoded recordings of one corpus, keyed and ordered by recording name.
#[derive(Clone, Debug, Default)]
pub struct IntervalIndex {
    recordings: BTreeMap<String, Recording>,
}

impl IntervalIndex {
    /// Decodes every timing file below `dir`, detecting the format first.
    pub fn build(dir: &Path) -> Result<Self, PentorefError> {
        let format = TranscriptionFormat::detect(dir)?;
        Self::build_with_format(dir, format)
    }

    /// Decodes every file below `dir` with the extension of `format`.
    ///
    /// A file that cannot be decoded aborts the build.
    pub fn build_with_format(
        dir: &Path,
        format: TranscriptionFormat,
    ) -> Result<Self, PentorefError> {
        let mut index = Self::default();
        let mut files_read = 0usize;

        for path in second_level_files(dir)? {
            if !has_extension(&path, format.extension()) {
                continue;
            }
            let recording = format.read(&path)?;
            files_read += 1;
            if index.recordings.contains_key(&recording.name) {
                log::warn!(
                    "recording '{}' appears more than once; keeping {}",
                    recording.name,
                    path.display()
                );
            }
            index.insert(recording);
        }

        log::info!("{files_read} {format} files read");
        Ok(index)
    }

    pub fn from_recordings<I: IntoIterator<Item = Recording>>(recordings: I) -> Self {
        let mut index = Self::default();
        for recording in recordings {
            index.insert(recording);
        }
        index
    }

    pub fn insert(&mut self, recording: Recording) {
        self.recordings.insert(recording.name.clone(), recording);
    }

    pub fn get(&self, name: &str) -> Option<&Recording> {
        self.recordings.get(name)
    }

    /// Recordings in name order.
    pub fn recordings(&self) -> impl Iterator<Item = &Recording> {
        self.recordings.values()
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }
}

/// Per-game text fragments and scene descriptions.
///
/// Keys combine the folder name with a part of the file name:
/// `<folder>_<game>` for fragments and piece layouts, `<folder>_<ms>` for
/// tracked-object snapshots.
#[derive(Clone, Debug, Default)]
pub struct SceneSources {
    tiles: BTreeMap<String, String>,
    landmarks: BTreeMap<String, String>,
    scenes: BTreeMap<String, SceneDocument>,
}

impl SceneSources {
    /// Scans a scene directory.
    ///
    /// - `.txt` files named `*final-selected*` are selected-tile fragments,
    ///   keyed `<folder>_<name[3..len-15]>`.
    /// - `.txt` files named `*landmark*` are landmark fragments, keyed
    ///   `<folder>_<name[3..len-9]>`.
    /// - `.xml` files whose name has no `s` are scene descriptions, keyed
    ///   `<folder>_<name[3..]>`.
    ///
    /// Scene XML that does not parse is skipped and logged.
    pub fn load(dir: &Path, log: &mut DiagnosticLog) -> Result<Self, PentorefError> {
        let mut sources = Self::default();

        for path in second_level_files(dir)? {
            let (Some(folder), Some(name)) = (parent_name(&path), stem(&path)) else {
                continue;
            };

            if has_extension(&path, "txt") {
                if name.contains(TILE_MARKER) {
                    let key = format!("{folder}_{}", trim_chars(&name, 3, 15));
                    sources.tiles.insert(key, read_fragment(&path)?);
                } else if name.contains(LANDMARK_MARKER) {
                    let key = format!("{folder}_{}", trim_chars(&name, 3, 9));
                    sources.landmarks.insert(key, read_fragment(&path)?);
                }
            } else if has_extension(&path, "xml") && !name.contains('s') {
                let key = format!("{folder}_{}", trim_chars(&name, 3, 0));
                match read_scene_xml(&path) {
                    Ok(document) => {
                        sources.scenes.insert(key, document);
                    }
                    Err(err) => {
                        log::warn!("skipping scene file: {err}");
                        log.note(
                            DiagnosticCode::SceneFileSkipped,
                            format!(
                                "Scene file \"{}\" could not be parsed and has been skipped: {err}",
                                path.display()
                            ),
                        );
                    }
                }
            }
        }

        log::info!(
            "{} text files read, {} XML files parsed",
            sources.tiles.len() + sources.landmarks.len(),
            sources.scenes.len()
        );
        Ok(sources)
    }

    pub fn insert_tile(&mut self, game: impl Into<String>, text: impl Into<String>) {
        self.tiles.insert(game.into(), text.into());
    }

    pub fn insert_landmark(&mut self, game: impl Into<String>, text: impl Into<String>) {
        self.landmarks.insert(game.into(), text.into());
    }

    pub fn insert_scene(&mut self, key: impl Into<String>, document: SceneDocument) {
        self.scenes.insert(key.into(), document);
    }

    pub fn tile(&self, game: &str) -> Option<&str> {
        self.tiles.get(game).map(String::as_str)
    }

    pub fn landmark(&self, game: &str) -> Option<&str> {
        self.landmarks.get(game).map(String::as_str)
    }

    pub fn scene(&self, key: &str) -> Option<&SceneDocument> {
        self.scenes.get(key)
    }

    /// Snapshots of one recording, keyed `<run>_<milliseconds>`, as
    /// (seconds, document) pairs in time order.
    ///
    /// Keys whose suffix is not a number are ignored.
    pub fn snapshots(&self, run: &str) -> Vec<(f64, &SceneDocument)> {
        let mut out: Vec<(f64, &SceneDocument)> = self
            .scenes
            .iter()
            .filter_map(|(key, document)| {
                let (prefix, millis) = key.rsplit_once('_')?;
                if prefix != run {
                    return None;
                }
                let millis: f64 = millis.parse().ok()?;
                Some((millis / 1000.0, document))
            })
            .collect();
        out.sort_by(|a, b| a.0.total_cmp(&b.0));
        out
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn landmark_count(&self) -> usize {
        self.landmarks.len()
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }
}

/// Files exactly two levels below `dir`, in path order.
fn second_level_files(dir: &Path) -> Result<Vec<PathBuf>, PentorefError> {
    if !dir.is_dir() {
        return Err(PentorefError::LayoutInvalid {
            path: dir.to_path_buf(),
            message: "expected a directory".to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| PentorefError::LayoutInvalid {
            path: dir.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn read_fragment(path: &Path) -> Result<String, PentorefError> {
    let bytes = fs::read(path).map_err(PentorefError::Io)?;
    decode_text(&bytes, path)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

fn stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

fn parent_name(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

/// Drops `front` characters from the start and `back` from the end; empty
/// when the name is too short.
fn trim_chars(name: &str, front: usize, back: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= front + back {
        return String::new();
    }
    chars[front..chars.len() - back].iter().collect()
}
