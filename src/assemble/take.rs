//! Single-instructor corpus with a hand-aligned word tier.
//!
//! References come from the selected tile of each episode, scenes from the
//! piece layout file of the game. Words are not tokenized: every interval of
//! `A-words` is one word, placed in its utterance and game by the resolver
//! and kept only if its game has a reference.

use super::scene::layout_piece;
use super::{
    extract_episode_references, extract_utterances, utterance_tier, word_tier, CorpusContext,
    Extractor, RunContext, Variant, WordSource,
};
use crate::diagnostics::{DiagnosticCode, Phase};
use crate::ir::{CorpusRecords, GameId, Interval, Recording, UttId, Utterance, Word};

pub struct Take;

impl Extractor for Take {
    fn variant(&self) -> Variant {
        Variant::Take
    }

    fn references_and_scenes(
        &self,
        run: &mut RunContext<'_>,
        corpus: &mut CorpusContext,
        out: &mut CorpusRecords,
    ) {
        let episode_tier = self.variant().episode_tier();
        extract_episode_references(run, corpus, out, episode_tier, |run, out, game_id, episode| {
            match run.sources.scene(game_id.as_str()) {
                Some(document) => out.scenes.extend(
                    document
                        .find_all(".//piece")
                        .into_iter()
                        .map(|piece| layout_piece(piece, game_id)),
                ),
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
            WordSource::WordTier,
            |run, _corpus, _out, site, utterance| {
                let tier = format!("{}-dialogue-acts", site.speaker);
                match site.resolution.get(&tier) {
                    Some(act) => utterance.dialogue_act = Some(act.text.clone()),
                    None => run.log.at(
                        site.interval.start,
                        DiagnosticCode::DialogueActNotFound,
                        format!(
                            "No overlapping interval found in tier \"{tier}\" for interval \"{}\". \
                             No dialogue act has been included.",
                            site.interval.text
                        ),
                    ),
                }
            },
        );

        run.log.begin_phase(Phase::Words);
        for &speaker in self.variant().speakers() {
            extract_tier_words(run, out, speaker);
        }
    }
}

/// Words of one speaker's word tier.
///
/// A word carries the `uttID` of the utterance record its interval resolves
/// to, so words and utterances join on `(gameID, uttID)`. Positions restart
/// at 1 whenever that utterance changes. A word overlapping no utterance (or
/// only a pause) stays with the previous word's utterance; a word before any
/// utterance is dropped.
fn extract_tier_words(run: &mut RunContext<'_>, out: &mut CorpusRecords, speaker: &str) {
    let recording: &Recording = run.recording;
    let episode_tier = Variant::Take.episode_tier();
    let utts = utterance_tier(speaker);

    let mut game_sticky: Option<GameId> = None;
    let mut owner: Option<UttId> = None;
    let mut position = 0u32;

    for interval in recording.intervals(&word_tier(speaker)) {
        let resolution = run.resolve(interval);
        let game_id = run.sticky_game(&resolution, episode_tier, interval, &mut game_sticky);
        let (lemma, tag) = run.lemmatize(&interval.text, interval);

        let previous = owner;
        match resolution
            .get(&utts)
            .and_then(|found| utterance_id(&out.utterances, found))
        {
            Some(utt_id) => owner = Some(utt_id),
            None => run.log.at(
                interval.start,
                DiagnosticCode::UtteranceFallback,
                format!(
                    "No overlapping interval found in tier \"{utts}\" for interval \"{}\". \
                     The previous interval has been used.",
                    interval.text
                ),
            ),
        }

        let Some(utt_id) = owner else {
            run.log.at(
                interval.start,
                DiagnosticCode::WordWithoutUtterance,
                format!(
                    "No utterance found for interval \"{}\". No word has been included.",
                    interval.text
                ),
            );
            continue;
        };
        if previous == Some(utt_id) {
            position += 1;
        } else {
            position = 1;
        }

        // The last reference of the game wins.
        let ref_id = game_id.as_ref().and_then(|game| {
            out.references
                .iter()
                .rev()
                .find(|reference| reference.game_id.as_ref() == Some(game))
                .map(|reference| reference.ref_id)
        });
        let Some(ref_id) = ref_id else {
            run.log.at(
                interval.start,
                DiagnosticCode::WordWithoutReference,
                format!(
                    "No reference found for interval \"{}\". No word has been included.",
                    interval.text
                ),
            );
            continue;
        };

        let mut word = Word::new(game_id, utt_id, position, interval.text.as_str());
        word.starttime = Some(interval.start);
        word.endtime = Some(interval.end);
        word.lemma = lemma;
        word.tag = tag;
        word.ref_id = Some(ref_id);
        out.words.push(word);
    }
}

/// ID of the utterance record emitted for `interval`. Pauses have none.
fn utterance_id(utterances: &[Utterance], interval: &Interval) -> Option<UttId> {
    utterances
        .iter()
        .rev()
        .find(|utterance| {
            utterance.starttime.to_bits() == interval.start.to_bits()
                && utterance.endtime.to_bits() == interval.end.to_bits()
                && utterance.utt == interval.text
        })
        .map(|utterance| utterance.utt_id)
}
