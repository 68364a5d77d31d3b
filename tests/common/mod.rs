#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub type Span<'a> = (f64, f64, &'a str);

/// Renders tiers as a short-format Praat TextGrid.
pub fn short_textgrid(tiers: &[(&str, &[Span<'_>])]) -> String {
    let xmax = tiers
        .iter()
        .flat_map(|(_, spans)| spans.iter().map(|s| s.1))
        .fold(0.0, f64::max);

    let mut out = String::from("File type = \"ooTextFile\"\nObject class = \"TextGrid\"\n\n");
    out.push_str(&format!("0\n{xmax}\n<exists>\n{}\n", tiers.len()));
    for (name, spans) in tiers {
        out.push_str(&format!(
            "\"IntervalTier\"\n\"{name}\"\n0\n{xmax}\n{}\n",
            spans.len()
        ));
        for (start, end, text) in spans.iter() {
            out.push_str(&format!("{start}\n{end}\n\"{}\"\n", text.replace('"', "\"\"")));
        }
    }
    out
}

pub fn write(path: &Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
}

/// A corpus laid out on disk below a temporary directory:
///
/// ```text
/// <NAME>/derived_data/transcription_annotation/<pair>/<run>.TextGrid
/// <NAME>/derived_data/multimodal_data/scene_information/<run>/<file>
/// ```
pub struct CorpusDir {
    pub temp: TempDir,
    pub root: PathBuf,
}

impl CorpusDir {
    pub fn new(name: &str) -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path().join(name);
        fs::create_dir_all(root.join("derived_data/transcription_annotation"))
            .expect("create transcription dir");
        Self { temp, root }
    }

    pub fn transcriptions(&self) -> PathBuf {
        self.root.join("derived_data/transcription_annotation")
    }

    pub fn scenes(&self) -> PathBuf {
        self.root
            .join("derived_data/multimodal_data/scene_information")
    }

    pub fn output(&self) -> PathBuf {
        self.temp.path().join("out")
    }

    pub fn recording(&self, run: &str, tiers: &[(&str, &[Span<'_>])]) -> &Self {
        let path = self
            .transcriptions()
            .join(format!("pair_{run}"))
            .join(format!("{run}.TextGrid"));
        write(&path, short_textgrid(tiers));
        self
    }

    /// Selected tile of game `<run>_<episode>`.
    pub fn tile(&self, run: &str, episode: &str, piece: &str) -> &Self {
        let path = self
            .scenes()
            .join(run)
            .join(format!("ep_{episode}_final-selected.txt"));
        write(&path, piece);
        self
    }

    pub fn landmark(&self, run: &str, episode: &str, piece: &str) -> &Self {
        let path = self
            .scenes()
            .join(run)
            .join(format!("ep_{episode}_landmark.txt"));
        write(&path, piece);
        self
    }

    /// Scene file keyed `<run>_<key>`.
    pub fn scene(&self, run: &str, key: &str, xml: &str) -> &Self {
        let path = self.scenes().join(run).join(format!("ep_{key}.xml"));
        write(&path, xml);
        self
    }
}

pub fn piece_layout(pieces: &[(&str, &str, &str, &str)]) -> String {
    let mut out = String::from("<game><board>");
    for (id, kind, color, field) in pieces {
        out.push_str(&format!(
            "<piece id=\"{id}\" type=\"{kind}\" color=\"{color}\"><start-field>{field}</start-field><posture isMirrored=\"false\" rotation=\"0\"/></piece>"
        ));
    }
    out.push_str("</board></game>");
    out
}

/// One complete tracked object.
pub fn tracked_object(id: &str, shape: &str, colour: &str) -> String {
    format!(
        r#"<object id="{id}" isLandmark="false" isTarget="false"><position global="center" x="1" y="2"/><shape BestResponse="{shape}"><distribution F="0" I="0" L="0" N="0" P="0" T="0" U="0" V="0" W="0" X="1" Y="0" Z="0"/><orientation value="0"/><skewness horizontal="none" vertical="none"/><edges value="12"/></shape><colour BestResponse="{colour}"><distribution {colour}="1"/><hsv H="0" S="0" V="0"/><rgb B="0" G="0" R="255"/></colour></object>"#
    )
}

pub fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("open csv");
    reader
        .records()
        .map(|record| {
            record
                .expect("csv record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}
