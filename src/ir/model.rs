//! Record model for the pentoref intermediate representation.
//!
//! Every corpus variant produces records of the same five kinds. Each kind
//! carries the union of the fields any variant fills; a variant's frozen
//! table schema (see [`crate::tables`]) decides which of them end up in the
//! output. Fields a variant never fills stay `None`.

use serde::{Deserialize, Serialize};

use super::ids::{GameId, RefId, UttId};

/// All records produced by one corpus run, in emission order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusRecords {
    pub words: Vec<Word>,
    pub utterances: Vec<Utterance>,
    pub references: Vec<Reference>,
    pub scenes: Vec<SceneObject>,
    pub actions: Vec<Action>,
}

impl CorpusRecords {
    /// Appends another run's records, keeping order.
    pub fn extend(&mut self, other: CorpusRecords) {
        self.words.extend(other.words);
        self.utterances.extend(other.utterances);
        self.references.extend(other.references);
        self.scenes.extend(other.scenes);
        self.actions.extend(other.actions);
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
            && self.utterances.is_empty()
            && self.references.is_empty()
            && self.scenes.is_empty()
            && self.actions.is_empty()
    }
}

/// One spoken utterance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub game_id: Option<GameId>,
    pub utt_id: UttId,
    pub starttime: f64,
    pub endtime: f64,
    /// Raw transcription text including markup.
    pub utt: String,
    /// Text with tags, fillers and punctuation removed.
    pub utt_clean: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue_act: Option<String>,
    /// Content of the first `<rel>` markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    /// Content of the first `<lm>` markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm: Option<String>,
}

impl Utterance {
    /// Creates an utterance with the fields every variant fills.
    pub fn new(
        game_id: Option<GameId>,
        utt_id: UttId,
        starttime: f64,
        endtime: f64,
        utt: impl Into<String>,
        utt_clean: impl Into<String>,
    ) -> Self {
        Self {
            game_id,
            utt_id,
            starttime,
            endtime,
            utt: utt.into(),
            utt_clean: utt_clean.into(),
            speaker: None,
            role: None,
            dialogue_act: None,
            rel: None,
            lm: None,
        }
    }
}

/// One word, either tokenized out of an utterance or read from a word tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub game_id: Option<GameId>,
    pub utt_id: UttId,
    /// 1-based position inside the owning utterance.
    pub position: u32,
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starttime: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endtime: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<RefId>,
}

impl Word {
    pub fn new(
        game_id: Option<GameId>,
        utt_id: UttId,
        position: u32,
        word: impl Into<String>,
    ) -> Self {
        Self {
            game_id,
            utt_id,
            position,
            word: word.into(),
            starttime: None,
            endtime: None,
            lemma: None,
            tag: None,
            ref_id: None,
        }
    }
}

/// A reference to a game piece.
///
/// Episode-level references carry `piece_id`/`landmark_id` from the selected
/// tile fragments; inline references carry the attributes of a `<ref>` tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub ref_id: RefId,
    pub game_id: Option<GameId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utt_id: Option<UttId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Reference {
    /// Creates a reference selected for a whole game.
    pub fn for_game(
        ref_id: RefId,
        game_id: GameId,
        piece_id: impl Into<String>,
        landmark_id: Option<String>,
    ) -> Self {
        Self {
            ref_id,
            game_id: Some(game_id),
            piece_id: Some(piece_id.into()),
            landmark_id,
            utt_id: None,
            text: None,
            id: None,
            piece: None,
            location: None,
        }
    }

    /// Creates a reference marked up inside an utterance.
    pub fn inline(ref_id: RefId, game_id: Option<GameId>, utt_id: UttId) -> Self {
        Self {
            ref_id,
            game_id,
            piece_id: None,
            landmark_id: None,
            utt_id: Some(utt_id),
            text: None,
            id: None,
            piece: None,
            location: None,
        }
    }
}

/// One object of a scene description.
///
/// Attribute values are copied verbatim from the scene markup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Snapshot time in seconds (continuous-tracking scenes only).
    pub timestamp_id: Option<f64>,
    pub game_id: Option<GameId>,
    pub piece_id: Option<String>,
    pub shape: Option<String>,
    pub colour: Option<String>,

    // piece layout scenes
    pub orientation: Option<String>,
    pub is_mirrored: Option<String>,
    pub grid_position: Option<String>,

    // tracked-object scenes
    pub is_landmark: Option<String>,
    pub is_target: Option<String>,
    pub position_global: Option<String>,
    pub position_x: Option<String>,
    pub position_y: Option<String>,
    pub shape_distribution: Option<String>,
    pub shape_orientation: Option<String>,
    pub shape_skewness_horizontal: Option<String>,
    pub shape_skewness_vertical: Option<String>,
    pub shape_edges: Option<String>,
    pub colour_distribution: Option<String>,
    pub colour_hsv: Option<String>,
    pub colour_rgb: Option<String>,
}

/// Which hand performed an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Lh,
    Rh,
}

impl Hand {
    /// Both hands, in extraction order.
    pub const ALL: [Hand; 2] = [Hand::Lh, Hand::Rh];

    /// Name of the hand, which is also the name of its tier.
    pub fn name(&self) -> &'static str {
        match self {
            Hand::Lh => "lh",
            Hand::Rh => "rh",
        }
    }
}

/// A manipulation of a piece by one hand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub game_id: GameId,
    pub starttime: f64,
    pub endtime: f64,
    pub hand: Hand,
    pub action: String,
    pub piece: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_keeps_emission_order() {
        let mut all = CorpusRecords::default();
        let mut first = CorpusRecords::default();
        first.words.push(Word::new(None, UttId(1), 1, "nimm"));
        let mut second = CorpusRecords::default();
        second.words.push(Word::new(None, UttId(1), 1, "das"));

        all.extend(first);
        all.extend(second);

        let words: Vec<_> = all.words.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, ["nimm", "das"]);
        assert!(!all.is_empty());
    }

    #[test]
    fn game_reference_builder() {
        let r = Reference::for_game(RefId(3), GameId::new("r1", "2"), "F", None);
        assert_eq!(r.piece_id.as_deref(), Some("F"));
        assert!(r.utt_id.is_none());
    }
}
