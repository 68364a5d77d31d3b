//! Any single-speaker corpus with an `Episode` tier and an `A-utts` tier.
//!
//! References come from selected-tile fragments when they exist; there are
//! no scene descriptions. Words are tokenized out of the utterances.

use super::{
    extract_episode_references, extract_utterances, CorpusContext, Extractor, RunContext, Variant,
    WordSource,
};
use crate::ir::CorpusRecords;

pub struct Generic;

impl Extractor for Generic {
    fn variant(&self) -> Variant {
        Variant::Generic
    }

    fn references_and_scenes(
        &self,
        run: &mut RunContext<'_>,
        corpus: &mut CorpusContext,
        out: &mut CorpusRecords,
    ) {
        let episode_tier = self.variant().episode_tier();
        extract_episode_references(run, corpus, out, episode_tier, |_, _, _, _| {});
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
            |_, _, _, _, _| {},
        );
    }
}
