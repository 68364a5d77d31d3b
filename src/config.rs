//! Run configuration.
//!
//! A run is configured by command-line flags, optionally backed by a YAML
//! file. Every key is optional; a flag given on the command line wins over
//! the same key in the file.
//!
//! ```yaml
//! variant: takecv
//! transcriptions: /data/TAKECV_PENTOREF/derived_data/transcription_annotation
//! scenes: /data/TAKECV_PENTOREF/derived_data/multimodal_data/scene_information
//! output: out/
//! format: csv
//! lexicon: german.lex
//! tie_break: legacy
//! first_ref_id: 1
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::assemble::Variant;
use crate::conversion::Format;
use crate::error::PentorefError;
use crate::index::CorpusLayout;
use crate::resolve::TieBreak;

/// Optional settings of one run, as read from YAML or collected from flags.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub variant: Option<String>,
    pub transcriptions: Option<PathBuf>,
    pub scenes: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub log: Option<PathBuf>,
    pub lexicon: Option<PathBuf>,
    pub tie_break: Option<TieBreak>,
    pub first_ref_id: Option<u64>,
}

impl RunConfig {
    pub fn read(path: &Path) -> Result<Self, PentorefError> {
        let data = fs::read_to_string(path).map_err(PentorefError::Io)?;
        serde_yaml::from_str(&data).map_err(|source| PentorefError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, PentorefError> {
        serde_yaml::from_str(yaml).map_err(|source| PentorefError::ConfigParse {
            path: PathBuf::from("<string>"),
            source,
        })
    }

    /// Layers `overrides` on top of `self`: every key set in `overrides`
    /// replaces the value here.
    pub fn overridden_by(self, overrides: RunConfig) -> RunConfig {
        RunConfig {
            variant: overrides.variant.or(self.variant),
            transcriptions: overrides.transcriptions.or(self.transcriptions),
            scenes: overrides.scenes.or(self.scenes),
            output: overrides.output.or(self.output),
            format: overrides.format.or(self.format),
            log: overrides.log.or(self.log),
            lexicon: overrides.lexicon.or(self.lexicon),
            tie_break: overrides.tie_break.or(self.tie_break),
            first_ref_id: overrides.first_ref_id.or(self.first_ref_id),
        }
    }

    /// Fills in defaults for `corpus` and checks every value.
    ///
    /// - variant: given, or inferred from the corpus directory name
    /// - input trees: given, or discovered below the corpus root
    /// - output: the current directory; the log goes to `<output>/<TAG>.log`
    pub fn resolve(&self, corpus: &Path) -> Result<ResolvedRun, PentorefError> {
        let variant = match &self.variant {
            Some(name) => name.parse()?,
            None => Variant::infer_from_dir(corpus).ok_or_else(|| {
                PentorefError::UnsupportedVariant(format!(
                    "cannot infer the variant from '{}'; pass --variant",
                    corpus.display()
                ))
            })?,
        };

        let layout = match &self.transcriptions {
            Some(transcriptions) => CorpusLayout {
                transcriptions: transcriptions.clone(),
                scenes: self.scenes.clone(),
            },
            None => {
                let mut layout = CorpusLayout::discover(corpus)?;
                if self.scenes.is_some() {
                    layout.scenes = self.scenes.clone();
                }
                layout
            }
        };

        let format = match &self.format {
            Some(name) => name.parse()?,
            None => Format::Csv,
        };
        #[cfg(not(feature = "sqlite"))]
        if format == Format::Sqlite {
            return Err(PentorefError::UnsupportedFormat(
                "'sqlite' (this build has no sqlite support; enable the `sqlite` feature)"
                    .to_string(),
            ));
        }

        let output = self.output.clone().unwrap_or_else(|| PathBuf::from("."));
        let log = self
            .log
            .clone()
            .unwrap_or_else(|| output.join(format!("{}.log", variant.corpus_tag())));

        Ok(ResolvedRun {
            variant,
            layout,
            output,
            format,
            log,
            lexicon: self.lexicon.clone(),
            tie_break: self.tie_break.unwrap_or_default(),
            first_ref_id: self.first_ref_id.unwrap_or(1),
        })
    }
}

/// A fully resolved run.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRun {
    pub variant: Variant,
    pub layout: CorpusLayout,
    pub output: PathBuf,
    pub format: Format,
    pub log: PathBuf,
    pub lexicon: Option<PathBuf>,
    pub tie_break: TieBreak,
    pub first_ref_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_with_all_keys() {
        let config = RunConfig::from_yaml_str(
            "variant: takecv\nformat: json\ntie_break: legacy\nfirst_ref_id: 100\nlexicon: de.lex\n",
        )
        .expect("parse");
        assert_eq!(config.variant.as_deref(), Some("takecv"));
        assert_eq!(config.format.as_deref(), Some("json"));
        assert_eq!(config.tie_break, Some(TieBreak::Legacy));
        assert_eq!(config.first_ref_id, Some(100));
        assert_eq!(config.lexicon, Some(PathBuf::from("de.lex")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RunConfig::from_yaml_str("varient: take\n").unwrap_err();
        assert!(matches!(err, PentorefError::ConfigParse { .. }));
    }

    #[test]
    fn flags_override_file_values() {
        let file = RunConfig {
            variant: Some("take".to_string()),
            format: Some("json".to_string()),
            first_ref_id: Some(5),
            ..RunConfig::default()
        };
        let flags = RunConfig {
            format: Some("csv".to_string()),
            ..RunConfig::default()
        };
        let merged = file.overridden_by(flags);
        assert_eq!(merged.variant.as_deref(), Some("take"));
        assert_eq!(merged.format.as_deref(), Some("csv"));
        assert_eq!(merged.first_ref_id, Some(5));
    }

    #[test]
    fn resolve_infers_variant_and_discovers_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = dir.path().join("TAKECV_PENTOREF");
        let transcriptions = corpus.join("derived_data").join("transcription_annotation");
        fs::create_dir_all(&transcriptions).expect("mkdir");

        let run = RunConfig {
            output: Some(dir.path().join("out")),
            ..RunConfig::default()
        }
        .resolve(&corpus)
        .expect("resolve");

        assert_eq!(run.variant, Variant::TakeCv);
        assert_eq!(run.layout.transcriptions, transcriptions);
        assert_eq!(run.layout.scenes, None);
        assert_eq!(run.format, Format::Csv);
        assert_eq!(run.log, dir.path().join("out").join("TAKECV.log"));
        assert_eq!(run.tie_break, TieBreak::LargestOverlap);
        assert_eq!(run.first_ref_id, 1);
    }

    #[test]
    fn resolve_needs_a_variant_for_unknown_directory_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = RunConfig::default().resolve(dir.path()).unwrap_err();
        assert!(matches!(err, PentorefError::UnsupportedVariant(_)));
    }

    #[test]
    fn explicit_transcriptions_skip_discovery() {
        let run = RunConfig {
            variant: Some("generic".to_string()),
            transcriptions: Some(PathBuf::from("/tmp/tg")),
            ..RunConfig::default()
        }
        .resolve(Path::new("/does/not/exist"))
        .expect("resolve");
        assert_eq!(run.layout.transcriptions, PathBuf::from("/tmp/tg"));
        assert_eq!(run.variant, Variant::Generic);
    }
}
