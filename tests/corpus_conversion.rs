use std::fs;

use pentoref::assemble::Variant;
use pentoref::config::RunConfig;
use pentoref::diagnostics::DiagnosticCode;
use pentoref::ir::GameId;

mod common;

use common::{piece_layout, read_csv, tracked_object, CorpusDir};

fn run_config(corpus: &CorpusDir) -> RunConfig {
    RunConfig {
        output: Some(corpus.output()),
        ..RunConfig::default()
    }
}

fn take_corpus() -> CorpusDir {
    let corpus = CorpusDir::new("TAKE_PENTOREF");
    corpus
        .recording(
            "r1",
            &[
                ("Episode", &[(0.0, 10.0, "1"), (10.0, 20.0, "2")]),
                (
                    "A-utts",
                    &[
                        (1.0, 3.0, "nimm das Kreuz"),
                        (3.0, 4.0, "p"),
                        (11.0, 13.0, "jetzt das"),
                        (21.0, 22.0, "fertig"),
                    ],
                ),
                ("A-dialogue-acts", &[(0.5, 3.5, "instruct")]),
                (
                    "A-words",
                    &[
                        (1.0, 1.5, "nimm"),
                        (1.5, 2.0, "das"),
                        (2.0, 3.0, "Kreuz"),
                        (11.0, 12.0, "jetzt"),
                        (12.0, 13.0, "das"),
                    ],
                ),
                ("comments", &[(0.0, 20.0, "free text")]),
            ],
        )
        .tile("r1", "1", "X")
        .tile("r1", "2", "F")
        .scene(
            "r1",
            "1",
            &piece_layout(&[("1", "X", "red", "1,1"), ("2", "F", "blue", "2,3")]),
        );
    corpus
}

#[test]
fn take_corpus_converts_to_csv_tables() {
    let corpus = take_corpus();
    let run = run_config(&corpus).resolve(&corpus.root).expect("resolve");
    assert_eq!(run.variant, Variant::Take);

    let outcome = pentoref::convert(&run).expect("convert");
    let out = corpus.output();

    let words = read_csv(&out.join("TAKE_words.csv"));
    assert_eq!(
        words[0],
        ["gameID", "uttID", "position", "starttime", "endtime", "word", "refID"]
    );
    assert_eq!(words[1], ["r1_1", "1", "1", "1.0", "1.5", "nimm", "1"]);
    assert_eq!(words[4], ["r1_2", "2", "1", "11.0", "12.0", "jetzt", "2"]);
    assert_eq!(words.len(), 6);

    let utts = read_csv(&out.join("TAKE_utts.csv"));
    assert_eq!(
        utts[0],
        ["gameID", "uttID", "starttime", "endtime", "utt", "dialogue-act"]
    );
    assert_eq!(utts[1], ["r1_1", "1", "1.0", "3.0", "nimm das Kreuz", "instruct"]);
    assert_eq!(utts[2][5], "");
    // The last utterance lies after every episode and keeps game 2.
    assert_eq!(utts[3][0], "r1_2");

    let refs = read_csv(&out.join("TAKE_refs.csv"));
    assert_eq!(refs[1..], [vec!["r1_1", "X", "1"], vec!["r1_2", "F", "2"]]);

    let scenes = read_csv(&out.join("TAKE_scenes.csv"));
    assert_eq!(scenes.len(), 3);
    assert_eq!(scenes[2], ["r1_1", "2", "F", "blue", "0", "false", "2,3"]);

    assert!(!out.join("TAKE_actions.csv").exists());

    assert_eq!(outcome.log.count(DiagnosticCode::SceneNotFound), 1);
    assert_eq!(outcome.log.count(DiagnosticCode::EpisodeFallback), 1);
    assert_eq!(outcome.log.count(DiagnosticCode::DialogueActNotFound), 2);

    let log = fs::read_to_string(out.join("TAKE.log")).expect("read log");
    assert!(log.contains("\nr1\n"));
    assert!(log.contains("references/scenes"));
    assert!(log.contains(
        "10.0 seconds: No scene information could be found for gameID \"r1_2\". No scene has been included."
    ));
    assert!(log.contains("21.0 seconds: No overlapping interval found in tier \"Episode\""));

    assert_eq!(outcome.report.output.words, 5);
    assert_eq!(outcome.report.recordings, 1);
}

#[test]
fn reruns_produce_identical_files() {
    let corpus = take_corpus();
    let run = run_config(&corpus).resolve(&corpus.root).expect("resolve");

    pentoref::convert(&run).expect("first run");
    let first_words = fs::read(corpus.output().join("TAKE_words.csv")).expect("read");
    let first_log = fs::read(corpus.output().join("TAKE.log")).expect("read");

    pentoref::convert(&run).expect("second run");
    assert_eq!(
        fs::read(corpus.output().join("TAKE_words.csv")).expect("read"),
        first_words
    );
    assert_eq!(fs::read(corpus.output().join("TAKE.log")).expect("read"), first_log);
}

#[test]
fn reference_ids_continue_across_recordings_from_the_first_id() {
    let corpus = CorpusDir::new("TAKECV_PENTOREF");
    for run in ["r1", "r2"] {
        corpus
            .recording(
                run,
                &[
                    ("Episode", &[(0.0, 5.0, "1.1"), (5.0, 10.0, "1.2")]),
                    ("A-utts", &[(1.0, 2.0, "hier")]),
                ],
            )
            .tile(run, "1.1", "7")
            .tile(run, "1.2", "8");
    }
    corpus.landmark("r2", "1.2", "3");

    let mut config = run_config(&corpus);
    config.first_ref_id = Some(100);
    let run = config.resolve(&corpus.root).expect("resolve");
    let outcome = pentoref::convert(&run).expect("convert");

    let refs: Vec<(u64, String)> = outcome
        .records
        .references
        .iter()
        .map(|r| (r.ref_id.as_u64(), r.game_id.as_ref().unwrap().to_string()))
        .collect();
    assert_eq!(
        refs,
        vec![
            (100, "r1_1.1".to_string()),
            (101, "r1_1.2".to_string()),
            (102, "r2_1.1".to_string()),
            (103, "r2_1.2".to_string()),
        ]
    );

    let csv = read_csv(&corpus.output().join("TAKECV_refs.csv"));
    assert_eq!(csv[0], ["gameID", "pieceID", "landmarkID", "refID"]);
    assert_eq!(csv[4], ["r2_1.2", "8", "3", "103"]);
    assert_eq!(csv[1][2], "");
}

#[test]
fn takecv_scenes_come_from_tracked_objects() {
    let corpus = CorpusDir::new("TAKECV_PENTOREF");
    corpus
        .recording(
            "r2",
            &[
                ("Episode", &[(0.0, 10.0, "1.1")]),
                ("A-utts", &[(1.0, 3.0, "das <rel>links</rel> vom <lm>X</lm>")]),
            ],
        )
        .tile("r2", "1.1", "7")
        .scene(
            "r2",
            "1_1",
            &format!(
                "<scene><timestamp>{}{}</timestamp></scene>",
                tracked_object("7", "X", "Red"),
                tracked_object("8", "T", "Blue")
            ),
        );

    let run = run_config(&corpus).resolve(&corpus.root).expect("resolve");
    let outcome = pentoref::convert(&run).expect("convert");

    assert_eq!(outcome.records.scenes.len(), 2);
    assert_eq!(
        outcome.records.scenes[0].game_id,
        Some(GameId::new("r2", "1.1"))
    );

    let utts = read_csv(&corpus.output().join("TAKECV_utts.csv"));
    assert_eq!(utts[1][5..], ["links", "X"]);

    let words = read_csv(&corpus.output().join("TAKECV_words.csv"));
    let tokens: Vec<&str> = words[1..].iter().map(|row| row[3].as_str()).collect();
    assert_eq!(tokens, ["das", "links", "vom", "X"]);

    let scenes = read_csv(&corpus.output().join("TAKECV_scenes.csv"));
    assert_eq!(scenes[0].len(), 17);
    assert_eq!(scenes[1][1], "7");
}

#[test]
fn pentocv_corpus_to_json() {
    let corpus = CorpusDir::new("PENTOCV_PENTOREF");
    corpus
        .recording(
            "r3",
            &[
                ("Part", &[(0.0, 10.0, "1"), (10.0, 20.0, "2")]),
                ("Roles", &[(0.0, 20.0, "A instructor, B follower")]),
                (
                    "A-utts",
                    &[(1.0, 2.0, "nimm <ref id=\"1\" piece=\"X\">das rote</ref>")],
                ),
                ("B-utts", &[(2.0, 3.0, "okay")]),
                ("lh", &[(2.0, 3.0, "grab:X"), (30.0, 31.0, "wave")]),
                ("rh", &[(11.0, 12.0, "place:X")]),
            ],
        )
        .scene("r3", "2500", &format!("<frame>{}</frame>", tracked_object("1", "X", "Gray")))
        .scene("r3", "12000", &format!("<frame>{}</frame>", tracked_object("1", "X", "Red")))
        .scene("r3", "25000", "<frame><object id=\"2\"/></frame>");

    let mut config = run_config(&corpus);
    config.format = Some("json".to_string());
    let run = config.resolve(&corpus.root).expect("resolve");
    let outcome = pentoref::convert(&run).expect("convert");

    let json = fs::read_to_string(corpus.output().join("PENTOCV.json")).expect("read json");
    let doc: serde_json::Value = serde_json::from_str(&json).expect("parse json");
    let names: Vec<&str> = doc["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["words", "utts", "scenes", "refs", "actions"]);

    let utts = &doc["tables"][1];
    assert_eq!(utts["rows"][0][6], "instructor");
    assert_eq!(utts["rows"][1][7], "B");

    let refs = &doc["tables"][3];
    assert_eq!(refs["columns"][0], "refID");
    assert_eq!(refs["rows"][0][3], "das rote");
    assert!(refs["rows"][0][6].is_null());

    let scenes = &doc["tables"][2];
    assert_eq!(scenes["rows"].as_array().unwrap().len(), 2);
    assert_eq!(scenes["rows"][0][0], 2.5);
    assert_eq!(scenes["rows"][1][1], "r3_2");

    let actions = &doc["tables"][4];
    assert_eq!(actions["rows"].as_array().unwrap().len(), 2);
    assert_eq!(actions["rows"][1][3], "rh");

    assert_eq!(outcome.log.count(DiagnosticCode::SceneObjectUnreadable), 1);
    assert_eq!(outcome.log.count(DiagnosticCode::ActionUnreadable), 1);
    // The snapshot at 25s and the action at 30s lie outside every part.
    assert_eq!(outcome.log.count(DiagnosticCode::GameNotFound), 2);
}

#[test]
fn broken_scene_files_are_skipped_and_logged() {
    let corpus = take_corpus();
    corpus.scene("r1", "2", "<game><piece");

    let run = run_config(&corpus).resolve(&corpus.root).expect("resolve");
    let outcome = pentoref::convert(&run).expect("convert");

    assert_eq!(outcome.log.count(DiagnosticCode::SceneFileSkipped), 1);
    assert_eq!(outcome.log.count(DiagnosticCode::SceneNotFound), 1);
    let log = fs::read_to_string(corpus.output().join("TAKE.log")).expect("read log");
    assert!(log.starts_with("\nsources\n"));
}

#[test]
fn lexicon_fills_lemmas_for_generic_corpora() {
    let corpus = CorpusDir::new("misc");
    corpus.recording(
        "g1",
        &[
            ("Episode", &[(0.0, 5.0, "1")]),
            ("A-utts", &[(1.0, 2.0, "Nimm das")]),
        ],
    );
    let lexicon = corpus.temp.path().join("de.lex");
    common::write(&lexicon, "nimm\tnehmen\tVVIMP\n");

    let mut config = run_config(&corpus);
    config.variant = Some("generic".to_string());
    config.lexicon = Some(lexicon);
    let run = config.resolve(&corpus.root).expect("resolve");
    let outcome = pentoref::convert(&run).expect("convert");

    let words = read_csv(&corpus.output().join("GENERIC_words.csv"));
    assert_eq!(words[1], ["g1_1", "1", "1", "Nimm", "nehmen", "VVIMP"]);
    assert_eq!(words[2][4], "");
    assert_eq!(outcome.log.count(DiagnosticCode::LemmatizationFailed), 1);
    assert_eq!(outcome.log.count(DiagnosticCode::TileNotFound), 1);
}
