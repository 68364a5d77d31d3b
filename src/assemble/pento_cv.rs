//! Two-speaker corpus with continuous object tracking and hand actions.
//!
//! Games are the intervals of the `Part` tier. Scenes are tracker snapshots
//! taken at arbitrary times and placed in a game by looking up the snapshot
//! time. References are marked up inline in the utterances. Both hands have
//! an action tier with `action:piece` labels.

use std::collections::HashMap;

use super::scene::{tracked_objects, COLOURS_WITH_GRAY};
use super::{extract_utterances, CorpusContext, Extractor, RunContext, Variant, WordSource};
use crate::diagnostics::{DiagnosticCode, Phase};
use crate::ir::{Action, CorpusRecords, Hand, Interval, Reference};
use crate::text::{parse_inline_refs, parse_roles};

const ROLES_TIER: &str = "Roles";

pub struct PentoCv;

impl Extractor for PentoCv {
    fn variant(&self) -> Variant {
        Variant::PentoCv
    }

    /// Scene snapshots of the recording, each placed in the game running at
    /// its timestamp. A snapshot outside every game keeps a null game.
    fn references_and_scenes(
        &self,
        run: &mut RunContext<'_>,
        _corpus: &mut CorpusContext,
        out: &mut CorpusRecords,
    ) {
        let episode_tier = self.variant().episode_tier();
        let sources = run.sources;

        for (time, document) in sources.snapshots(run.name()) {
            let resolution = run.resolve(&Interval::instant(time));
            let game_id = match resolution.get(episode_tier) {
                Some(part) => Some(run.game_id(&part.text)),
                None => {
                    let message = format!("No gameID could be found in {}.", run.name());
                    run.log.at(time, DiagnosticCode::GameNotFound, message);
                    None
                }
            };
            let objects = document.find_all("object");
            out.scenes.extend(tracked_objects(
                &objects,
                &COLOURS_WITH_GRAY,
                game_id.as_ref(),
                Some(time),
                time,
                run.log,
            ));
        }
    }

    fn utterances_and_words(
        &self,
        run: &mut RunContext<'_>,
        corpus: &mut CorpusContext,
        out: &mut CorpusRecords,
    ) {
        let mut previous_roles: HashMap<&str, String> = HashMap::new();

        extract_utterances(
            run,
            corpus,
            out,
            self.variant(),
            WordSource::Tokenized,
            |run, corpus, out, site, utterance| {
                utterance.speaker = Some(site.speaker.to_string());

                let role = site
                    .resolution
                    .get(ROLES_TIER)
                    .and_then(|roles| parse_roles(&roles.text))
                    .and_then(|mut roles| roles.remove(site.speaker));
                utterance.role = match role {
                    Some(role) => {
                        previous_roles.insert(site.speaker, role.clone());
                        Some(role)
                    }
                    None => {
                        let previous = previous_roles.get(site.speaker).cloned();
                        run.log.at(
                            site.interval.start,
                            DiagnosticCode::RoleFallback,
                            format!(
                                "No role could be found for speaker \"{}\" in interval \"{}\". \
                                 The previous role has been used.",
                                site.speaker, site.interval.text
                            ),
                        );
                        previous
                    }
                };

                for inline in parse_inline_refs(&site.interval.text) {
                    let mut reference = Reference::inline(
                        corpus.issue_ref_id(),
                        utterance.game_id.clone(),
                        utterance.utt_id,
                    );
                    reference.text = Some(inline.text);
                    reference.id = inline.id;
                    reference.piece = inline.piece;
                    reference.location = inline.location;
                    out.references.push(reference);
                }
            },
        );
    }

    /// Hand actions. An action outside every game is discarded.
    fn actions(&self, run: &mut RunContext<'_>, out: &mut CorpusRecords) {
        run.log.begin_phase(Phase::Actions);
        let recording = run.recording;
        let episode_tier = self.variant().episode_tier();

        for hand in Hand::ALL {
            for interval in recording.intervals(hand.name()) {
                let (action, piece) = match split_action(&interval.text) {
                    Some((action, piece)) => (action.to_string(), Some(piece.to_string())),
                    None => {
                        run.log.at(
                            interval.start,
                            DiagnosticCode::ActionUnreadable,
                            format!(
                                "The action \"{}\" could not be read correctly.",
                                interval.text
                            ),
                        );
                        (interval.text.clone(), None)
                    }
                };

                let resolution = run.resolve(interval);
                let Some(part) = resolution.get(episode_tier) else {
                    run.log.at(
                        interval.start,
                        DiagnosticCode::GameNotFound,
                        format!(
                            "No gameID found for interval \"{}\". No action has been included.",
                            interval.text
                        ),
                    );
                    continue;
                };

                out.actions.push(Action {
                    game_id: run.game_id(&part.text),
                    starttime: interval.start,
                    endtime: interval.end,
                    hand,
                    action,
                    piece,
                });
            }
        }
    }
}

/// Splits `action:piece`; labels without exactly one colon do not split.
fn split_action(text: &str) -> Option<(&str, &str)> {
    let (action, piece) = text.split_once(':')?;
    if piece.contains(':') {
        return None;
    }
    Some((action, piece))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{assemble_corpus, AssembleOptions};
    use crate::diagnostics::DiagnosticLog;
    use crate::index::{IntervalIndex, SceneSources};
    use crate::ir::io_scene_xml::from_scene_xml_str;
    use crate::ir::{GameId, RefId, Recording, Tier, UttId};
    use crate::resolve::Resolver;
    use crate::text::{Lemma, LexiconLemmatizer};

    fn recording() -> Recording {
        Recording::new(
            "r3",
            vec![
                Tier::new(
                    "Part",
                    vec![Interval::new(0.0, 10.0, "1"), Interval::new(10.0, 20.0, "2")],
                ),
                Tier::new(
                    "Roles",
                    vec![Interval::new(0.0, 10.0, "A instructor, B follower")],
                ),
                Tier::new(
                    "A-utts",
                    vec![
                        Interval::new(1.0, 2.0, r#"nimm <ref id="1" piece="X">das Kreuz</ref>"#),
                        Interval::new(11.0, 12.0, "und jetzt"),
                    ],
                ),
                Tier::new("B-utts", vec![Interval::new(2.0, 3.0, "okay")]),
                Tier::new(
                    "lh",
                    vec![Interval::new(2.0, 3.0, "grab:X"), Interval::new(25.0, 26.0, "wave")],
                ),
                Tier::new("rh", vec![Interval::new(12.0, 13.0, "point")]),
            ],
        )
    }

    fn assemble(sources: &SceneSources, log: &mut DiagnosticLog) -> CorpusRecords {
        let index = IntervalIndex::from_recordings([recording()]);
        let resolver = Resolver::default();
        assemble_corpus(Variant::PentoCv, &index, sources, AssembleOptions::new(&resolver), log)
    }

    #[test]
    fn split_action_requires_exactly_one_colon() {
        assert_eq!(split_action("grab:X"), Some(("grab", "X")));
        assert_eq!(split_action("grab"), None);
        assert_eq!(split_action("a:b:c"), None);
    }

    #[test]
    fn utterances_have_speakers_roles_and_inline_refs() {
        let mut log = DiagnosticLog::new();
        let records = assemble(&SceneSources::default(), &mut log);

        let ids: Vec<(u64, &str)> = records
            .utterances
            .iter()
            .map(|u| (u.utt_id.as_u64(), u.speaker.as_deref().unwrap_or("")))
            .collect();
        assert_eq!(ids, vec![(1, "A"), (2, "A"), (3, "B")]);

        assert_eq!(records.utterances[0].role.as_deref(), Some("instructor"));
        // No role interval after 10s: the previous role is kept.
        assert_eq!(records.utterances[1].role.as_deref(), Some("instructor"));
        assert_eq!(records.utterances[2].role.as_deref(), Some("follower"));
        assert_eq!(log.count(DiagnosticCode::RoleFallback), 1);

        assert_eq!(records.references.len(), 1);
        let reference = &records.references[0];
        assert_eq!(reference.ref_id, RefId(1));
        assert_eq!(reference.utt_id, Some(UttId(1)));
        assert_eq!(reference.game_id, Some(GameId::new("r3", "1")));
        assert_eq!(reference.text.as_deref(), Some("das Kreuz"));
        assert_eq!(reference.piece.as_deref(), Some("X"));
        assert_eq!(reference.location, None);
    }

    #[test]
    fn actions_need_a_game_but_not_a_piece() {
        let mut log = DiagnosticLog::new();
        let records = assemble(&SceneSources::default(), &mut log);

        let actions: Vec<(&str, &str, Option<&str>)> = records
            .actions
            .iter()
            .map(|a| (a.hand.name(), a.action.as_str(), a.piece.as_deref()))
            .collect();
        assert_eq!(actions, vec![("lh", "grab", Some("X")), ("rh", "point", None)]);
        assert_eq!(records.actions[1].game_id, GameId::new("r3", "2"));
        assert_eq!(log.count(DiagnosticCode::ActionUnreadable), 2);
        assert_eq!(log.count(DiagnosticCode::GameNotFound), 1);
    }

    #[test]
    fn snapshots_are_placed_in_games() {
        let object = r#"<object id="1"><position global="c" x="0" y="0"/><shape BestResponse="F"><d F="1" I="0" L="0" N="0" P="0" T="0" U="0" V="0" W="0" X="0" Y="0" Z="0"/><o value="0"/><s horizontal="a" vertical="b"/><e value="4"/></shape><colour BestResponse="Gray"><d Gray="1"/><hsv H="0" S="0" V="5"/><rgb B="5" G="5" R="5"/></colour></object>"#;
        let mut sources = SceneSources::default();
        sources.insert_scene(
            "r3_12500",
            from_scene_xml_str(&format!("<frame>{object}</frame>")).expect("parse"),
        );
        sources.insert_scene(
            "r3_30000",
            from_scene_xml_str(&format!("<frame>{object}</frame>")).expect("parse"),
        );

        let mut log = DiagnosticLog::new();
        let records = assemble(&sources, &mut log);

        assert_eq!(records.scenes.len(), 2);
        assert_eq!(records.scenes[0].timestamp_id, Some(12.5));
        assert_eq!(records.scenes[0].game_id, Some(GameId::new("r3", "2")));
        assert_eq!(records.scenes[1].game_id, None);
        assert!(records.scenes[0]
            .colour_distribution
            .as_deref()
            .unwrap()
            .contains("Gray:1"));
    }

    #[test]
    fn tokens_are_lemmatized_when_a_lexicon_is_configured() {
        let mut lexicon = LexiconLemmatizer::new();
        lexicon.insert("nimm", Lemma::new("nehmen", "VVIMP"));

        let index = IntervalIndex::from_recordings([recording()]);
        let resolver = Resolver::default();
        let mut log = DiagnosticLog::new();
        let options = AssembleOptions::new(&resolver).with_lemmatizer(&lexicon);
        let records = assemble_corpus(
            Variant::PentoCv,
            &index,
            &SceneSources::default(),
            options,
            &mut log,
        );

        assert_eq!(records.words[0].word, "nimm");
        assert_eq!(records.words[0].lemma.as_deref(), Some("nehmen"));
        assert_eq!(records.words[0].tag.as_deref(), Some("VVIMP"));
        assert_eq!(records.words[1].lemma, None);
        assert!(log.count(DiagnosticCode::LemmatizationFailed) > 0);
    }
}
