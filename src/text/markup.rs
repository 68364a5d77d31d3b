//! Inline annotation markup inside utterance text.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static INLINE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(<ref\s+(?:(?:id|piece|location)=".*?"\s*)*>)(.*?)</ref>"#)
        .expect("valid inline reference regex")
});
static REF_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bid="(.*?)""#).expect("valid attribute regex"));
static REF_PIECE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bpiece="(.*?)""#).expect("valid attribute regex"));
static REF_LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\blocation="(.*?)""#).expect("valid attribute regex"));
static RELATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*?<rel>(.*?)</rel>").expect("valid relation regex"));
static LANDMARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*?<lm>(.*?)</lm>").expect("valid landmark regex"));

/// A `<ref ...>text</ref>` tag found in an utterance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineRef {
    /// Tag content, trimmed.
    pub text: String,
    pub id: Option<String>,
    pub piece: Option<String>,
    pub location: Option<String>,
}

/// All inline reference tags of an utterance, in order of appearance.
///
/// The opening tag may carry `id`, `piece` and `location` attributes in any
/// order; missing attributes are `None`.
pub fn parse_inline_refs(utterance: &str) -> Vec<InlineRef> {
    INLINE_REF
        .captures_iter(utterance)
        .map(|caps| {
            let open = caps.get(1).map_or("", |m| m.as_str());
            InlineRef {
                text: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
                id: capture(&REF_ID, open),
                piece: capture(&REF_PIECE, open),
                location: capture(&REF_LOCATION, open),
            }
        })
        .collect()
}

/// Trimmed content of the first `<rel>..</rel>` tag.
pub fn relation(utterance: &str) -> Option<String> {
    capture(&RELATION, utterance).map(|s| s.trim().to_string())
}

/// Trimmed content of the first `<lm>..</lm>` tag.
pub fn landmark(utterance: &str) -> Option<String> {
    capture(&LANDMARK, utterance).map(|s| s.trim().to_string())
}

/// Parses a role assignment such as `"A instructor, B follower"`.
///
/// Returns `None` when any comma-separated part lacks a speaker or a role.
pub fn parse_roles(text: &str) -> Option<HashMap<String, String>> {
    text.split(", ")
        .map(|part| {
            let mut fields = part.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some(speaker), Some(role)) => Some((speaker.to_string(), role.to_string())),
                _ => None,
            }
        })
        .collect()
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
