//! Tabular output.
//!
//! Every corpus variant exports a frozen set of tables with frozen column
//! lists. Records stay in the IR until the very end; a [`Table`] is the
//! projection of one record kind through the variant's column list. The
//! `io_*` modules write projected tables to disk.

pub mod io_csv;
pub mod io_json;
#[cfg(feature = "sqlite")]
pub mod io_sqlite;

use std::fmt;

use serde::Serialize;

use crate::assemble::Variant;
use crate::diagnostics::format_seconds;
use crate::ir::{Action, CorpusRecords, Reference, SceneObject, Utterance, Word};

/// One cell of a projected table.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Float(f64),
    Int(i64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn text(value: &Option<String>) -> Self {
        value.clone().map_or(Value::Null, Value::Text)
    }

    fn float(value: Option<f64>) -> Self {
        value.map_or(Value::Null, Value::Float)
    }

    fn int(value: Option<u64>) -> Self {
        value.map_or(Value::Null, |v| Value::Int(v as i64))
    }
}

impl fmt::Display for Value {
    /// Null renders as the empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(text) => f.write_str(text),
            Value::Float(value) => f.write_str(&format_seconds(*value)),
            Value::Int(value) => write!(f, "{value}"),
        }
    }
}

/// The five table kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Words,
    Utts,
    Refs,
    Scenes,
    Actions,
}

impl TableKind {
    /// Emission order.
    pub const ALL: [TableKind; 5] = [
        TableKind::Words,
        TableKind::Utts,
        TableKind::Scenes,
        TableKind::Refs,
        TableKind::Actions,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Words => "words",
            TableKind::Utts => "utts",
            TableKind::Refs => "refs",
            TableKind::Scenes => "scenes",
            TableKind::Actions => "actions",
        }
    }
}

/// A record kind that can be projected through a column list.
pub trait Record {
    const KIND: TableKind;

    /// Every column this record kind can fill, in declaration order.
    const COLUMNS: &'static [&'static str];

    /// The value of `column`, or `None` if the record kind has no such
    /// column.
    fn field(&self, column: &str) -> Option<Value>;
}

impl Record for Word {
    const KIND: TableKind = TableKind::Words;
    const COLUMNS: &'static [&'static str] = &[
        "gameID",
        "uttID",
        "position",
        "starttime",
        "endtime",
        "word",
        "lemma",
        "tag",
        "refID",
    ];

    fn field(&self, column: &str) -> Option<Value> {
        Some(match column {
            "gameID" => Value::text(&self.game_id.as_ref().map(|g| g.to_string())),
            "uttID" => Value::Int(self.utt_id.as_u64() as i64),
            "position" => Value::Int(i64::from(self.position)),
            "starttime" => Value::float(self.starttime),
            "endtime" => Value::float(self.endtime),
            "word" => Value::Text(self.word.clone()),
            "lemma" => Value::text(&self.lemma),
            "tag" => Value::text(&self.tag),
            "refID" => Value::int(self.ref_id.map(|r| r.as_u64())),
            _ => return None,
        })
    }
}

impl Record for Utterance {
    const KIND: TableKind = TableKind::Utts;
    const COLUMNS: &'static [&'static str] = &[
        "gameID",
        "uttID",
        "starttime",
        "endtime",
        "utt",
        "utt_clean",
        "speaker",
        "role",
        "dialogue-act",
        "rel",
        "lm",
    ];

    fn field(&self, column: &str) -> Option<Value> {
        Some(match column {
            "gameID" => Value::text(&self.game_id.as_ref().map(|g| g.to_string())),
            "uttID" => Value::Int(self.utt_id.as_u64() as i64),
            "starttime" => Value::Float(self.starttime),
            "endtime" => Value::Float(self.endtime),
            "utt" => Value::Text(self.utt.clone()),
            "utt_clean" => Value::Text(self.utt_clean.clone()),
            "speaker" => Value::text(&self.speaker),
            "role" => Value::text(&self.role),
            "dialogue-act" => Value::text(&self.dialogue_act),
            "rel" => Value::text(&self.rel),
            "lm" => Value::text(&self.lm),
            _ => return None,
        })
    }
}

impl Record for Reference {
    const KIND: TableKind = TableKind::Refs;
    const COLUMNS: &'static [&'static str] = &[
        "refID",
        "gameID",
        "pieceID",
        "landmarkID",
        "uttID",
        "text",
        "id",
        "piece",
        "location",
    ];

    fn field(&self, column: &str) -> Option<Value> {
        Some(match column {
            "refID" => Value::Int(self.ref_id.as_u64() as i64),
            "gameID" => Value::text(&self.game_id.as_ref().map(|g| g.to_string())),
            "pieceID" => Value::text(&self.piece_id),
            "landmarkID" => Value::text(&self.landmark_id),
            "uttID" => Value::int(self.utt_id.map(|u| u.as_u64())),
            "text" => Value::text(&self.text),
            "id" => Value::text(&self.id),
            "piece" => Value::text(&self.piece),
            "location" => Value::text(&self.location),
            _ => return None,
        })
    }
}

impl Record for SceneObject {
    const KIND: TableKind = TableKind::Scenes;
    const COLUMNS: &'static [&'static str] = &[
        "timestampID",
        "gameID",
        "pieceID",
        "shape",
        "colour",
        "orientation",
        "isMirrored",
        "gridPosition",
        "isLandmark",
        "isTarget",
        "position_global",
        "position_x",
        "position_y",
        "shape_distribution",
        "shape_orientation",
        "shape_skewness_horizontal",
        "shape_skewness_vertical",
        "shape_edges",
        "colour_distribution",
        "colour_hsv",
        "colour_rgb",
    ];

    fn field(&self, column: &str) -> Option<Value> {
        Some(match column {
            "timestampID" => Value::float(self.timestamp_id),
            "gameID" => Value::text(&self.game_id.as_ref().map(|g| g.to_string())),
            "pieceID" => Value::text(&self.piece_id),
            "shape" => Value::text(&self.shape),
            "colour" => Value::text(&self.colour),
            "orientation" => Value::text(&self.orientation),
            "isMirrored" => Value::text(&self.is_mirrored),
            "gridPosition" => Value::text(&self.grid_position),
            "isLandmark" => Value::text(&self.is_landmark),
            "isTarget" => Value::text(&self.is_target),
            "position_global" => Value::text(&self.position_global),
            "position_x" => Value::text(&self.position_x),
            "position_y" => Value::text(&self.position_y),
            "shape_distribution" => Value::text(&self.shape_distribution),
            "shape_orientation" => Value::text(&self.shape_orientation),
            "shape_skewness_horizontal" => Value::text(&self.shape_skewness_horizontal),
            "shape_skewness_vertical" => Value::text(&self.shape_skewness_vertical),
            "shape_edges" => Value::text(&self.shape_edges),
            "colour_distribution" => Value::text(&self.colour_distribution),
            "colour_hsv" => Value::text(&self.colour_hsv),
            "colour_rgb" => Value::text(&self.colour_rgb),
            _ => return None,
        })
    }
}

impl Record for Action {
    const KIND: TableKind = TableKind::Actions;
    const COLUMNS: &'static [&'static str] =
        &["gameID", "starttime", "endtime", "hand", "action", "piece"];

    fn field(&self, column: &str) -> Option<Value> {
        Some(match column {
            "gameID" => Value::Text(self.game_id.to_string()),
            "starttime" => Value::Float(self.starttime),
            "endtime" => Value::Float(self.endtime),
            "hand" => Value::Text(self.hand.name().to_string()),
            "action" => Value::Text(self.action.clone()),
            "piece" => Value::text(&self.piece),
            _ => return None,
        })
    }
}

/// The frozen column list of one table of `variant`, or `None` if the
/// variant does not export that table.
pub fn columns(variant: Variant, kind: TableKind) -> Option<&'static [&'static str]> {
    use TableKind::*;
    use Variant::*;

    let columns: &'static [&'static str] = match (variant, kind) {
        (Take, Words) => &[
            "gameID", "uttID", "position", "starttime", "endtime", "word", "refID",
        ],
        (Take, Utts) => &["gameID", "uttID", "starttime", "endtime", "utt", "dialogue-act"],
        (Take, Scenes) => &[
            "gameID",
            "pieceID",
            "shape",
            "colour",
            "orientation",
            "isMirrored",
            "gridPosition",
        ],
        (Take, Refs) => &["gameID", "pieceID", "refID"],

        (TakeCv, Words) => &["gameID", "uttID", "position", "word"],
        (TakeCv, Utts) => &["gameID", "uttID", "starttime", "endtime", "utt", "rel", "lm"],
        (TakeCv, Scenes) => &[
            "gameID",
            "pieceID",
            "isLandmark",
            "isTarget",
            "position_global",
            "position_x",
            "position_y",
            "shape",
            "shape_distribution",
            "shape_orientation",
            "shape_skewness_horizontal",
            "shape_skewness_vertical",
            "shape_edges",
            "colour",
            "colour_distribution",
            "colour_hsv",
            "colour_rgb",
        ],
        (TakeCv, Refs) => &["gameID", "pieceID", "landmarkID", "refID"],

        (PentoCv, Words) => &["gameID", "uttID", "position", "word", "lemma", "tag"],
        (PentoCv, Utts) => &[
            "gameID",
            "uttID",
            "starttime",
            "endtime",
            "utt",
            "utt_clean",
            "role",
            "speaker",
        ],
        (PentoCv, Scenes) => &[
            "timestampID",
            "gameID",
            "pieceID",
            "position_global",
            "position_x",
            "position_y",
            "shape",
            "shape_distribution",
            "shape_orientation",
            "shape_skewness_horizontal",
            "shape_skewness_vertical",
            "shape_edges",
            "colour",
            "colour_distribution",
            "colour_hsv",
            "colour_rgb",
        ],
        (PentoCv, Refs) => &["refID", "gameID", "uttID", "text", "id", "piece", "location"],
        (PentoCv, Actions) => &["gameID", "starttime", "endtime", "hand", "action", "piece"],

        (Generic, Words) => &["gameID", "uttID", "position", "word", "lemma", "tag"],
        (Generic, Utts) => &["gameID", "uttID", "starttime", "endtime", "utt", "utt_clean"],
        (Generic, Refs) => &["gameID", "pieceID", "landmarkID", "refID"],

        (Take | TakeCv | Generic, Actions) | (Generic, Scenes) => return None,
    };
    Some(columns)
}

/// A projected table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Table {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Projects `records` through `columns`. Columns the record kind does
    /// not know project to null.
    pub fn project<R: Record>(records: &[R], columns: &[&'static str]) -> Self {
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.field(column).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self {
            name: R::KIND.name(),
            columns: columns.to_vec(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All tables `variant` exports, in emission order.
pub fn tables_for(variant: Variant, records: &CorpusRecords) -> Vec<Table> {
    TableKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let columns = columns(variant, kind)?;
            Some(match kind {
                TableKind::Words => Table::project(&records.words, columns),
                TableKind::Utts => Table::project(&records.utterances, columns),
                TableKind::Refs => Table::project(&records.references, columns),
                TableKind::Scenes => Table::project(&records.scenes, columns),
                TableKind::Actions => Table::project(&records.actions, columns),
            })
        })
        .collect()
}

/// A populated record field that the variant's schema does not export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedColumn {
    pub table: TableKind,
    pub column: &'static str,
    /// Number of records with a non-null value in the column.
    pub populated: usize,
}

/// Fields that some record fills but the variant's tables leave out.
///
/// A record kind the variant does not export at all reports every populated
/// field.
pub fn dropped_columns(variant: Variant, records: &CorpusRecords) -> Vec<DroppedColumn> {
    let mut out = Vec::new();
    collect_dropped(variant, &records.words, &mut out);
    collect_dropped(variant, &records.utterances, &mut out);
    collect_dropped(variant, &records.scenes, &mut out);
    collect_dropped(variant, &records.references, &mut out);
    collect_dropped(variant, &records.actions, &mut out);
    out
}

fn collect_dropped<R: Record>(variant: Variant, records: &[R], out: &mut Vec<DroppedColumn>) {
    let exported = columns(variant, R::KIND).unwrap_or(&[]);
    for column in R::COLUMNS.iter().filter(|c| !exported.contains(c)) {
        let populated = records
            .iter()
            .filter(|record| record.field(column).is_some_and(|v| !v.is_null()))
            .count();
        if populated > 0 {
            out.push(DroppedColumn {
                table: R::KIND,
                column,
                populated,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{GameId, Hand, RefId, UttId};

    fn known<R: Record>(column: &str) -> bool {
        R::COLUMNS.contains(&column)
    }

    #[test]
    fn every_schema_column_resolves_for_its_record_kind() {
        for variant in Variant::ALL {
            for kind in TableKind::ALL {
                let Some(columns) = columns(variant, kind) else {
                    continue;
                };
                for column in columns {
                    let ok = match kind {
                        TableKind::Words => known::<Word>(column),
                        TableKind::Utts => known::<Utterance>(column),
                        TableKind::Refs => known::<Reference>(column),
                        TableKind::Scenes => known::<SceneObject>(column),
                        TableKind::Actions => known::<Action>(column),
                    };
                    assert!(ok, "{variant}: {}.{column} does not resolve", kind.name());
                }
            }
        }
    }

    #[test]
    fn declared_columns_all_have_fields() {
        let word = Word::new(None, UttId(1), 1, "x");
        assert!(Word::COLUMNS.iter().all(|c| word.field(c).is_some()));
        let utt = Utterance::new(None, UttId(1), 0.0, 1.0, "x", "x");
        assert!(Utterance::COLUMNS.iter().all(|c| utt.field(c).is_some()));
        let reference = Reference::inline(RefId(1), None, UttId(1));
        assert!(Reference::COLUMNS.iter().all(|c| reference.field(c).is_some()));
        let scene = SceneObject::default();
        assert!(SceneObject::COLUMNS.iter().all(|c| scene.field(c).is_some()));
        assert!(word.field("nope").is_none());
    }

    #[test]
    fn variants_export_their_table_sets() {
        let records = CorpusRecords::default();
        let names = |variant: Variant| -> Vec<&'static str> {
            tables_for(variant, &records).iter().map(|t| t.name).collect()
        };
        assert_eq!(names(Variant::Take), ["words", "utts", "scenes", "refs"]);
        assert_eq!(names(Variant::TakeCv), ["words", "utts", "scenes", "refs"]);
        assert_eq!(
            names(Variant::PentoCv),
            ["words", "utts", "scenes", "refs", "actions"]
        );
        assert_eq!(names(Variant::Generic), ["words", "utts", "refs"]);
    }

    #[test]
    fn projection_follows_column_order_and_nulls() {
        let mut word = Word::new(Some(GameId::new("r1", "1")), UttId(2), 3, "Kreuz");
        word.starttime = Some(1.0);
        word.endtime = Some(1.25);
        word.ref_id = Some(RefId(7));
        let mut records = CorpusRecords::default();
        records.words.push(word);

        let tables = tables_for(Variant::Take, &records);
        let words = &tables[0];
        assert_eq!(words.columns[0], "gameID");
        assert_eq!(
            words.rows[0],
            vec![
                Value::Text("r1_1".to_string()),
                Value::Int(2),
                Value::Int(3),
                Value::Float(1.0),
                Value::Float(1.25),
                Value::Text("Kreuz".to_string()),
                Value::Int(7),
            ]
        );
        let rendered: Vec<String> = words.rows[0].iter().map(Value::to_string).collect();
        assert_eq!(rendered, ["r1_1", "2", "3", "1.0", "1.25", "Kreuz", "7"]);
    }

    #[test]
    fn populated_fields_outside_the_schema_are_reported() {
        let mut records = CorpusRecords::default();
        let mut word = Word::new(None, UttId(1), 1, "nimm");
        word.lemma = Some("nehmen".to_string());
        records.words.push(word);
        records.actions.push(Action {
            game_id: GameId::new("r1", "1"),
            starttime: 0.0,
            endtime: 1.0,
            hand: Hand::Lh,
            action: "grab".to_string(),
            piece: None,
        });

        let dropped = dropped_columns(Variant::Take, &records);
        let summary: Vec<(&str, &str, usize)> = dropped
            .iter()
            .map(|d| (d.table.name(), d.column, d.populated))
            .collect();
        assert!(summary.contains(&("words", "lemma", 1)));
        assert!(summary.contains(&("actions", "action", 1)));
        assert!(!summary.iter().any(|(_, column, _)| *column == "piece"));

        assert!(dropped_columns(Variant::PentoCv, &records)
            .iter()
            .all(|d| d.table != TableKind::Actions));
    }

    #[test]
    fn null_renders_empty() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Float(12.5).to_string(), "12.5");
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
    }
}
