//! ELAN `.eaf` reader.
//!
//! Supports the parts of the EAF schema the corpora use:
//! - `<TIME_ORDER>` with `<TIME_SLOT TIME_SLOT_ID=".." TIME_VALUE="ms">`
//! - `<TIER TIER_ID="..">` containing `<ALIGNABLE_ANNOTATION>` entries
//! - `<REF_ANNOTATION>` entries, which take the times of the annotation they
//!   point to (following chains of references)
//!
//! Times are converted from milliseconds to seconds and every tier is sorted
//! by end time. Annotations on unaligned time slots (no `TIME_VALUE`) are
//! skipped, as are annotations with empty text or the silence marker.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use super::interval::{Interval, Tier};
use super::io_textgrid::{decode_text, file_stem, SILENCE_MARKER};
use super::recording::Recording;
use crate::error::PentorefError;

/// Longest chain of `REF_ANNOTATION`s followed before giving up.
const MAX_REF_DEPTH: usize = 32;

/// Reads an EAF file into a recording named after the file stem.
pub fn read_eaf(path: &Path) -> Result<Recording, PentorefError> {
    let bytes = fs::read(path).map_err(PentorefError::Io)?;
    let xml = decode_text(&bytes, path)?;
    let tiers = parse_eaf_str(&xml, path)?;
    Ok(Recording::new(file_stem(path), tiers))
}

/// Parses EAF XML from a string.
pub fn from_eaf_str(xml: &str) -> Result<Vec<Tier>, PentorefError> {
    parse_eaf_str(xml, Path::new("<string>"))
}

/// Parses EAF XML from bytes (must be valid UTF-8).
pub fn from_eaf_slice(bytes: &[u8]) -> Result<Vec<Tier>, PentorefError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| PentorefError::EafParse {
        path: PathBuf::from("<bytes>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    parse_eaf_str(xml, Path::new("<bytes>"))
}

#[derive(Debug)]
enum RawAnnotation {
    Aligned {
        start_slot: String,
        end_slot: String,
        value: String,
    },
    Referring {
        parent: String,
        value: String,
    },
}

fn parse_eaf_str(xml: &str, path: &Path) -> Result<Vec<Tier>, PentorefError> {
    let document = Document::parse(xml).map_err(|source| PentorefError::EafParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;

    let root = document.root_element();
    if root.tag_name().name() != "ANNOTATION_DOCUMENT" {
        return Err(PentorefError::EafParse {
            path: path.to_path_buf(),
            message: "missing <ANNOTATION_DOCUMENT> root element".to_string(),
        });
    }

    let slots = parse_time_slots(root, path)?;

    let mut tiers_raw: Vec<(String, Vec<(String, RawAnnotation)>)> = Vec::new();
    for tier_node in elements(root, "TIER") {
        let tier_id = required_attr(tier_node, "TIER_ID", path, "<TIER>")?.to_string();
        let mut annotations = Vec::new();
        for wrapper in elements(tier_node, "ANNOTATION") {
            for ann in wrapper.children().filter(Node::is_element) {
                annotations.push(parse_annotation(ann, path)?);
            }
        }
        tiers_raw.push((tier_id, annotations));
    }

    let mut times: HashMap<&str, (Option<f64>, Option<f64>)> = HashMap::new();
    let mut parents: HashMap<&str, &str> = HashMap::new();
    for (_, annotations) in &tiers_raw {
        for (id, ann) in annotations {
            match ann {
                RawAnnotation::Aligned {
                    start_slot,
                    end_slot,
                    ..
                } => {
                    let start = lookup_slot(&slots, start_slot, path)?;
                    let end = lookup_slot(&slots, end_slot, path)?;
                    times.insert(id.as_str(), (start, end));
                }
                RawAnnotation::Referring { parent, .. } => {
                    parents.insert(id.as_str(), parent.as_str());
                }
            }
        }
    }

    let mut tiers = Vec::with_capacity(tiers_raw.len());
    for (tier_id, annotations) in &tiers_raw {
        let mut intervals = Vec::new();
        for (id, ann) in annotations {
            let (bounds, value) = match ann {
                RawAnnotation::Aligned { value, .. } => (times.get(id.as_str()).copied(), value),
                RawAnnotation::Referring { value, .. } => {
                    (resolve_reference(id, &parents, &times, path)?, value)
                }
            };
            let Some((Some(start_ms), Some(end_ms))) = bounds else {
                continue;
            };
            if value.trim().is_empty() || value == SILENCE_MARKER {
                continue;
            }
            intervals.push(Interval::new(start_ms / 1000.0, end_ms / 1000.0, value.clone()));
        }
        intervals.sort_by(|a, b| a.end.total_cmp(&b.end));
        tiers.push(Tier::new(tier_id.clone(), intervals));
    }

    Ok(tiers)
}

fn parse_time_slots(
    root: Node<'_, '_>,
    path: &Path,
) -> Result<HashMap<String, Option<f64>>, PentorefError> {
    let mut slots = HashMap::new();
    let Some(order) = elements(root, "TIME_ORDER").next() else {
        return Ok(slots);
    };

    for slot in elements(order, "TIME_SLOT") {
        let id = required_attr(slot, "TIME_SLOT_ID", path, "<TIME_SLOT>")?;
        let value = slot
            .attribute("TIME_VALUE")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|raw| {
                raw.parse::<f64>().map_err(|_| PentorefError::EafParse {
                    path: path.to_path_buf(),
                    message: format!("invalid TIME_VALUE '{raw}' for slot '{id}'"),
                })
            })
            .transpose()?;
        slots.insert(id.to_string(), value);
    }

    Ok(slots)
}

fn parse_annotation(
    node: Node<'_, '_>,
    path: &Path,
) -> Result<(String, RawAnnotation), PentorefError> {
    let tag = node.tag_name().name();
    let context = format!("<{tag}>");
    let id = required_attr(node, "ANNOTATION_ID", path, &context)?.to_string();
    let value = elements(node, "ANNOTATION_VALUE")
        .next()
        .and_then(|v| v.text())
        .unwrap_or("")
        .to_string();

    let raw = match tag {
        "ALIGNABLE_ANNOTATION" => RawAnnotation::Aligned {
            start_slot: required_attr(node, "TIME_SLOT_REF1", path, &context)?.to_string(),
            end_slot: required_attr(node, "TIME_SLOT_REF2", path, &context)?.to_string(),
            value,
        },
        "REF_ANNOTATION" => RawAnnotation::Referring {
            parent: required_attr(node, "ANNOTATION_REF", path, &context)?.to_string(),
            value,
        },
        other => {
            return Err(PentorefError::EafParse {
                path: path.to_path_buf(),
                message: format!("unsupported annotation type <{other}>"),
            })
        }
    };

    Ok((id, raw))
}

fn lookup_slot(
    slots: &HashMap<String, Option<f64>>,
    slot: &str,
    path: &Path,
) -> Result<Option<f64>, PentorefError> {
    slots.get(slot).copied().ok_or_else(|| PentorefError::EafParse {
        path: path.to_path_buf(),
        message: format!("annotation references unknown time slot '{slot}'"),
    })
}

fn resolve_reference(
    id: &str,
    parents: &HashMap<&str, &str>,
    times: &HashMap<&str, (Option<f64>, Option<f64>)>,
    path: &Path,
) -> Result<Option<(Option<f64>, Option<f64>)>, PentorefError> {
    let mut current = id;
    for _ in 0..MAX_REF_DEPTH {
        if let Some(bounds) = times.get(current) {
            return Ok(Some(*bounds));
        }
        match parents.get(current) {
            Some(&parent) => current = parent,
            None => {
                return Err(PentorefError::EafParse {
                    path: path.to_path_buf(),
                    message: format!("annotation '{id}' references unknown annotation '{current}'"),
                })
            }
        }
    }

    Err(PentorefError::EafParse {
        path: path.to_path_buf(),
        message: format!("annotation '{id}' has a reference chain longer than {MAX_REF_DEPTH}"),
    })
}

fn elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == tag)
}

fn required_attr<'a>(
    node: Node<'a, '_>,
    attr: &str,
    path: &Path,
    context: &str,
) -> Result<&'a str, PentorefError> {
    node.attribute(attr).ok_or_else(|| PentorefError::EafParse {
        path: path.to_path_buf(),
        message: format!("missing '{attr}' attribute in {context}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EAF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ANNOTATION_DOCUMENT AUTHOR="" FORMAT="3.0" VERSION="3.0">
  <HEADER MEDIA_FILE="" TIME_UNITS="milliseconds"/>
  <TIME_ORDER>
    <TIME_SLOT TIME_SLOT_ID="ts1" TIME_VALUE="0"/>
    <TIME_SLOT TIME_SLOT_ID="ts2" TIME_VALUE="1500"/>
    <TIME_SLOT TIME_SLOT_ID="ts3" TIME_VALUE="2500"/>
    <TIME_SLOT TIME_SLOT_ID="ts4"/>
  </TIME_ORDER>
  <TIER TIER_ID="A-utts" LINGUISTIC_TYPE_REF="default-lt">
    <ANNOTATION>
      <ALIGNABLE_ANNOTATION ANNOTATION_ID="a2" TIME_SLOT_REF1="ts2" TIME_SLOT_REF2="ts3">
        <ANNOTATION_VALUE>das da</ANNOTATION_VALUE>
      </ALIGNABLE_ANNOTATION>
    </ANNOTATION>
    <ANNOTATION>
      <ALIGNABLE_ANNOTATION ANNOTATION_ID="a1" TIME_SLOT_REF1="ts1" TIME_SLOT_REF2="ts2">
        <ANNOTATION_VALUE>nimm</ANNOTATION_VALUE>
      </ALIGNABLE_ANNOTATION>
    </ANNOTATION>
    <ANNOTATION>
      <ALIGNABLE_ANNOTATION ANNOTATION_ID="a3" TIME_SLOT_REF1="ts3" TIME_SLOT_REF2="ts4">
        <ANNOTATION_VALUE>unaligned</ANNOTATION_VALUE>
      </ALIGNABLE_ANNOTATION>
    </ANNOTATION>
  </TIER>
  <TIER TIER_ID="A-dialogue-acts" PARENT_REF="A-utts" LINGUISTIC_TYPE_REF="symbolic">
    <ANNOTATION>
      <REF_ANNOTATION ANNOTATION_ID="a9" ANNOTATION_REF="a1">
        <ANNOTATION_VALUE>instruct</ANNOTATION_VALUE>
      </REF_ANNOTATION>
    </ANNOTATION>
  </TIER>
</ANNOTATION_DOCUMENT>"#;

    #[test]
    fn parses_aligned_annotations_sorted_by_end() {
        let tiers = from_eaf_str(EAF).expect("parse");
        let utts = &tiers[0];
        assert_eq!(utts.name, "A-utts");
        assert_eq!(
            utts.intervals,
            vec![
                Interval::new(0.0, 1.5, "nimm"),
                Interval::new(1.5, 2.5, "das da"),
            ]
        );
    }

    #[test]
    fn reference_annotations_take_parent_times() {
        let tiers = from_eaf_str(EAF).expect("parse");
        assert_eq!(tiers[1].name, "A-dialogue-acts");
        assert_eq!(tiers[1].intervals, vec![Interval::new(0.0, 1.5, "instruct")]);
    }

    #[test]
    fn rejects_wrong_root() {
        let err = from_eaf_str("<TEXTGRID/>").unwrap_err();
        match err {
            PentorefError::EafParse { message, .. } => {
                assert!(message.contains("ANNOTATION_DOCUMENT"))
            }
            other => panic!("expected EafParse, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_slot() {
        let xml = r#"<ANNOTATION_DOCUMENT><TIME_ORDER/><TIER TIER_ID="x"><ANNOTATION>
            <ALIGNABLE_ANNOTATION ANNOTATION_ID="a1" TIME_SLOT_REF1="t1" TIME_SLOT_REF2="t2">
            <ANNOTATION_VALUE>v</ANNOTATION_VALUE></ALIGNABLE_ANNOTATION></ANNOTATION></TIER>
            </ANNOTATION_DOCUMENT>"#;
        assert!(from_eaf_str(xml).is_err());
    }
}
