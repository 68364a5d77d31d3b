//! Single-instructor corpus recorded with the object tracker.
//!
//! Like [`Take`](super::Take) for references, but scenes come from tracked
//! object files and words are tokenized out of the utterances. Utterances
//! carry the relation and landmark markup of the transcription.

use super::scene::{tracked_objects, COLOURS};
use super::{
    extract_episode_references, extract_utterances, CorpusContext, Extractor, RunContext, Variant,
    WordSource,
};
use crate::diagnostics::DiagnosticCode;
use crate::ir::CorpusRecords;
use crate::text::{landmark, relation};

pub struct TakeCv;

impl Extractor for TakeCv {
    fn variant(&self) -> Variant {
        Variant::TakeCv
    }

    fn references_and_scenes(
        &self,
        run: &mut RunContext<'_>,
        corpus: &mut CorpusContext,
        out: &mut CorpusRecords,
    ) {
        let episode_tier = self.variant().episode_tier();
        extract_episode_references(run, corpus, out, episode_tier, |run, out, game_id, episode| {
            // Scene files name games with `_` where the episode label has `.`.
            let key = game_id.as_str().replace('.', "_");
            match run.sources.scene(&key) {
                Some(document) => {
                    let objects = document.find_all("timestamp/object");
                    let scenes = tracked_objects(
                        &objects,
                        &COLOURS,
                        Some(game_id),
                        None,
                        episode.start,
                        run.log,
                    );
                    out.scenes.extend(scenes);
                }
                None => run.log.at(
                    episode.start,
                    DiagnosticCode::SceneNotFound,
                    format!(
                        "No scene information could be found for gameID \"{game_id}\". \
                         No scene has been included."
                    ),
                ),
            }
        });
    }

    fn utterances_and_words(
        &self,
        run: &mut RunContext<'_>,
        corpus: &mut CorpusContext,
        out: &mut CorpusRecords,
    ) {
        extract_utterances(
            run,
            corpus,
            out,
            self.variant(),
            WordSource::Tokenized,
            |_run, _corpus, _out, site, utterance| {
                utterance.rel = relation(&site.interval.text);
                utterance.lm = landmark(&site.interval.text);
            },
        );
    }
}
