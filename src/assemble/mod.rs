//! Record assembler.
//!
//! Walks the recordings of an [`IntervalIndex`] and turns their tiers into
//! records. Every corpus variant runs the same three operations, in this
//! order, once per recording:
//!
//! 1. [`Extractor::references_and_scenes`]
//! 2. [`Extractor::utterances_and_words`]
//! 3. [`Extractor::actions`]
//!
//! Cross-tier joins go through the [`Resolver`]. Counters and the sticky
//! "last good" values live in explicit contexts: [`CorpusContext`] holds the
//! reference counter shared by all recordings of a run, [`RunContext`] the
//! per-recording state.
//!
//! Nothing in here fails. Every lookup that does not work out is written to
//! the [`DiagnosticLog`] and the record is skipped or gets a null field.

mod generic;
mod pento_cv;
mod scene;
mod take;
mod take_cv;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::diagnostics::{DiagnosticCode, DiagnosticLog, Phase};
use crate::error::PentorefError;
use crate::index::{IntervalIndex, SceneSources};
use crate::ir::{
    CorpusRecords, GameId, Interval, RefId, Recording, Reference, Utterance, UttId, Word,
};
use crate::resolve::{Resolution, Resolver};
use crate::text::{clean_utterance, tokenize, Lemmatizer};

pub use generic::Generic;
pub use pento_cv::PentoCv;
pub use take::Take;
pub use take_cv::TakeCv;

/// Utterance text marking a pause.
pub const PAUSE_MARKER: &str = "p";

/// The closed set of corpus variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Single instructor, separate word tier, piece layout scenes.
    Take,
    /// Single instructor, tracked-object scenes per game.
    TakeCv,
    /// Two speakers, tracked-object snapshots, hand actions.
    PentoCv,
    /// Single speaker, tokenized words, no scenes.
    Generic,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Take,
        Variant::TakeCv,
        Variant::PentoCv,
        Variant::Generic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Take => "take",
            Variant::TakeCv => "takecv",
            Variant::PentoCv => "pentocv",
            Variant::Generic => "generic",
        }
    }

    /// Upper-case corpus tag, used to name the log and database files.
    pub fn corpus_tag(&self) -> &'static str {
        match self {
            Variant::Take => "TAKE",
            Variant::TakeCv => "TAKECV",
            Variant::PentoCv => "PENTOCV",
            Variant::Generic => "GENERIC",
        }
    }

    pub fn speakers(&self) -> &'static [&'static str] {
        match self {
            Variant::PentoCv => &["A", "B"],
            Variant::Take | Variant::TakeCv | Variant::Generic => &["A"],
        }
    }

    /// Tier whose intervals define the games of a recording.
    pub fn episode_tier(&self) -> &'static str {
        match self {
            Variant::PentoCv => "Part",
            Variant::Take | Variant::TakeCv | Variant::Generic => "Episode",
        }
    }

    pub fn extractor(&self) -> &'static dyn Extractor {
        match self {
            Variant::Take => &Take,
            Variant::TakeCv => &TakeCv,
            Variant::PentoCv => &PentoCv,
            Variant::Generic => &Generic,
        }
    }

    /// Infers the variant from a corpus directory name such as
    /// `TAKECV_PENTOREF`.
    ///
    /// Existing paths are canonicalized first, so `.` or `..` resolve to the
    /// directory they name.
    pub fn infer_from_dir(corpus: &Path) -> Option<Variant> {
        let canonical = corpus.canonicalize().ok();
        let corpus = canonical.as_deref().unwrap_or(corpus);
        let name = corpus.file_name()?.to_str()?.to_ascii_uppercase();
        let tag = name.strip_suffix("_PENTOREF")?;
        tag.parse().ok()
    }
}

impl FromStr for Variant {
    type Err = PentorefError;

    /// Case-insensitive; `_` and `-` are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        Variant::ALL
            .into_iter()
            .find(|variant| variant.name() == normalized)
            .ok_or_else(|| {
                PentorefError::UnsupportedVariant(format!(
                    "'{s}' (supported: take, takecv, pentocv, generic)"
                ))
            })
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The three extraction operations of a corpus variant.
pub trait Extractor {
    fn variant(&self) -> Variant;

    /// Emits episode references and scene objects.
    fn references_and_scenes(
        &self,
        run: &mut RunContext<'_>,
        corpus: &mut CorpusContext,
        out: &mut CorpusRecords,
    );

    /// Emits utterances (and inline references), then words.
    fn utterances_and_words(
        &self,
        run: &mut RunContext<'_>,
        corpus: &mut CorpusContext,
        out: &mut CorpusRecords,
    );

    /// Emits hand actions. Most variants have none.
    fn actions(&self, _run: &mut RunContext<'_>, _out: &mut CorpusRecords) {}
}

/// Knobs of one assembler run.
#[derive(Clone, Copy)]
pub struct AssembleOptions<'a> {
    pub resolver: &'a Resolver,
    pub lemmatizer: Option<&'a dyn Lemmatizer>,
    /// First reference ID issued in the run.
    pub first_ref_id: u64,
}

impl<'a> AssembleOptions<'a> {
    pub fn new(resolver: &'a Resolver) -> Self {
        Self {
            resolver,
            lemmatizer: None,
            first_ref_id: 1,
        }
    }

    pub fn with_lemmatizer(mut self, lemmatizer: &'a dyn Lemmatizer) -> Self {
        self.lemmatizer = Some(lemmatizer);
        self
    }

    pub fn with_first_ref_id(mut self, first_ref_id: u64) -> Self {
        self.first_ref_id = first_ref_id;
        self
    }
}

/// State shared by all recordings of one corpus run.
#[derive(Clone, Debug)]
pub struct CorpusContext {
    next_ref_id: u64,
}

impl CorpusContext {
    pub fn new(first_ref_id: u64) -> Self {
        Self {
            next_ref_id: first_ref_id,
        }
    }

    /// Issues the next reference ID. IDs are strictly increasing without
    /// gaps over the whole run.
    pub fn issue_ref_id(&mut self) -> RefId {
        let id = RefId::new(self.next_ref_id);
        self.next_ref_id += 1;
        id
    }

    pub fn next_ref_id(&self) -> u64 {
        self.next_ref_id
    }
}

/// State of one recording while it is assembled.
pub struct RunContext<'a> {
    pub recording: &'a Recording,
    pub sources: &'a SceneSources,
    pub log: &'a mut DiagnosticLog,
    resolver: &'a Resolver,
    lemmatizer: Option<&'a dyn Lemmatizer>,
    next_utt_id: u64,
}

impl<'a> RunContext<'a> {
    pub fn new(
        recording: &'a Recording,
        sources: &'a SceneSources,
        options: AssembleOptions<'a>,
        log: &'a mut DiagnosticLog,
    ) -> Self {
        Self {
            recording,
            sources,
            log,
            resolver: options.resolver,
            lemmatizer: options.lemmatizer,
            next_utt_id: 1,
        }
    }

    pub fn name(&self) -> &'a str {
        &self.recording.name
    }

    pub fn game_id(&self, episode: &str) -> GameId {
        GameId::new(&self.recording.name, episode)
    }

    /// Runs the resolver over every searchable tier of the recording.
    pub fn resolve(&mut self, query: &Interval) -> Resolution<'a> {
        let recording: &'a Recording = self.recording;
        self.resolver.find(recording, query, self.log)
    }

    /// Issues the next utterance ID of this recording, starting at 1.
    pub fn issue_utt_id(&mut self) -> UttId {
        let id = UttId::new(self.next_utt_id);
        self.next_utt_id += 1;
        id
    }

    /// Lemma and tag of a token.
    ///
    /// Without a configured lemmatizer both are null and nothing is logged.
    pub fn lemmatize(
        &mut self,
        token: &str,
        interval: &Interval,
    ) -> (Option<String>, Option<String>) {
        let Some(lemmatizer) = self.lemmatizer else {
            return (None, None);
        };
        match lemmatizer.lemmatize(token) {
            Some(lemma) => (Some(lemma.lemma), Some(lemma.tag)),
            None => {
                self.log.at(
                    interval.start,
                    DiagnosticCode::LemmatizationFailed,
                    format!(
                        "Lemmatization has failed for \"{token}\" in interval \"{}\".",
                        interval.text
                    ),
                );
                (None, None)
            }
        }
    }

    /// Game of `query` from the episode tier, falling back to the last game
    /// found for the same speaker.
    ///
    /// `sticky` holds the last successfully resolved game and is updated on
    /// success. Failures are logged; the result is null only before the
    /// first success.
    pub fn sticky_game(
        &mut self,
        resolution: &Resolution<'_>,
        episode_tier: &str,
        query: &Interval,
        sticky: &mut Option<GameId>,
    ) -> Option<GameId> {
        match resolution.get(episode_tier) {
            Some(episode) => {
                *sticky = Some(self.game_id(&episode.text));
            }
            None => {
                self.log.at(
                    query.start,
                    DiagnosticCode::EpisodeFallback,
                    format!(
                        "No overlapping interval found in tier \"{episode_tier}\" for interval \"{}\". \
                         If possible, the previous interval will be used.",
                        query.text
                    ),
                );
                if sticky.is_none() {
                    self.log.at(
                        query.start,
                        DiagnosticCode::NoPreviousEpisode,
                        "No previous episode could be found.",
                    );
                }
            }
        }
        sticky.clone()
    }
}

/// Where the words of a variant come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WordSource {
    /// Tokens of each cleaned utterance.
    Tokenized,
    /// A separate `<speaker>-words` tier, read after the utterances.
    WordTier,
}

/// One utterance interval being turned into a record.
pub(crate) struct UtteranceSite<'r> {
    pub speaker: &'static str,
    pub interval: &'r Interval,
    pub resolution: Resolution<'r>,
}

/// Shared utterance pass.
///
/// For each speaker and each non-pause interval of `<speaker>-utts`: issues
/// an utterance ID, resolves the game with sticky fallback, lets `decorate`
/// fill variant fields, and with [`WordSource::Tokenized`] emits one word
/// per token of the cleaned text.
pub(crate) fn extract_utterances<'a, F>(
    run: &mut RunContext<'a>,
    corpus: &mut CorpusContext,
    out: &mut CorpusRecords,
    variant: Variant,
    words: WordSource,
    mut decorate: F,
) where
    F: FnMut(
        &mut RunContext<'a>,
        &mut CorpusContext,
        &mut CorpusRecords,
        &UtteranceSite<'a>,
        &mut Utterance,
    ),
{
    let recording: &'a Recording = run.recording;
    let episode_tier = variant.episode_tier();

    for &speaker in variant.speakers() {
        let mut sticky: Option<GameId> = None;
        for interval in recording.intervals(&utterance_tier(speaker)) {
            if interval.text == PAUSE_MARKER {
                continue;
            }

            let utt_id = run.issue_utt_id();
            let resolution = run.resolve(interval);
            let game_id = run.sticky_game(&resolution, episode_tier, interval, &mut sticky);

            let mut utterance = Utterance::new(
                game_id,
                utt_id,
                interval.start,
                interval.end,
                interval.text.as_str(),
                clean_utterance(&interval.text, false),
            );
            let site = UtteranceSite {
                speaker,
                interval,
                resolution,
            };
            decorate(run, corpus, out, &site, &mut utterance);

            if words == WordSource::Tokenized {
                for (index, token) in tokenize(&utterance.utt_clean).into_iter().enumerate() {
                    let (lemma, tag) = run.lemmatize(&token, interval);
                    let mut word =
                        Word::new(utterance.game_id.clone(), utt_id, index as u32 + 1, token);
                    word.lemma = lemma;
                    word.tag = tag;
                    out.words.push(word);
                }
            }
            out.utterances.push(utterance);
        }
    }
}

/// Shared pass over episode intervals for the variants that select one tile
/// per game.
///
/// Emits a reference for every game with a selected-tile fragment, then
/// hands the game to `scenes`.
pub(crate) fn extract_episode_references<'a, F>(
    run: &mut RunContext<'a>,
    corpus: &mut CorpusContext,
    out: &mut CorpusRecords,
    episode_tier: &str,
    mut scenes: F,
) where
    F: FnMut(&mut RunContext<'a>, &mut CorpusRecords, &GameId, &Interval),
{
    let recording: &'a Recording = run.recording;
    let sources: &'a SceneSources = run.sources;

    for interval in recording.intervals(episode_tier) {
        let game_id = run.game_id(&interval.text);
        match sources.tile(game_id.as_str()) {
            Some(tile) => {
                let landmark = sources.landmark(game_id.as_str()).map(str::to_string);
                let ref_id = corpus.issue_ref_id();
                out.references
                    .push(Reference::for_game(ref_id, game_id.clone(), tile, landmark));
            }
            None => run.log.at(
                interval.start,
                DiagnosticCode::TileNotFound,
                format!(
                    "No selected tile could be found for gameID \"{game_id}\". \
                     No reference has been included."
                ),
            ),
        }
        scenes(run, out, &game_id, interval);
    }
}

pub(crate) fn utterance_tier(speaker: &str) -> String {
    format!("{speaker}-utts")
}

pub(crate) fn word_tier(speaker: &str) -> String {
    format!("{speaker}-words")
}

/// Assembles one recording.
pub fn assemble_recording(
    extractor: &dyn Extractor,
    recording: &Recording,
    sources: &SceneSources,
    options: AssembleOptions<'_>,
    corpus: &mut CorpusContext,
    log: &mut DiagnosticLog,
) -> CorpusRecords {
    log::info!("processing {}", recording.name);
    log.begin_recording(recording.name.as_str());

    let mut out = CorpusRecords::default();
    let mut run = RunContext::new(recording, sources, options, log);

    run.log.begin_phase(Phase::ReferencesScenes);
    extractor.references_and_scenes(&mut run, corpus, &mut out);

    run.log.begin_phase(Phase::Utterances);
    extractor.utterances_and_words(&mut run, corpus, &mut out);

    extractor.actions(&mut run, &mut out);
    out
}

/// Assembles every recording of the index, in name order.
///
/// The output depends only on the inputs, the variant and the options.
pub fn assemble_corpus(
    variant: Variant,
    index: &IntervalIndex,
    sources: &SceneSources,
    options: AssembleOptions<'_>,
    log: &mut DiagnosticLog,
) -> CorpusRecords {
    let extractor = variant.extractor();
    let mut corpus = CorpusContext::new(options.first_ref_id);
    let mut records = CorpusRecords::default();

    for recording in index.recordings() {
        let run = assemble_recording(extractor, recording, sources, options, &mut corpus, log);
        records.extend(run);
    }
    records
}
