//! Utterance cleaning and tokenization.
//!
//! Transcriptions carry inline markup: spelling variants
//! (`<v="Katze">Kaaatze</v>`), fillers (`{F aehm}`), reference tags and
//! punctuation. Cleaning reduces an utterance to its spoken words; tokenizing
//! splits the cleaned text into the words that become word records.

use once_cell::sync::Lazy;
use regex::Regex;

static SPELLING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<[vpm]="(.+?)">.+?</[vpm]>"#).expect("valid spelling regex"));
static FILLER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{.*?\}").expect("valid filler regex"));
static FILLER_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(.*?)\}").expect("valid filler regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("valid tag regex"));
static UNCLOSED_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*$").expect("valid tag regex"));
static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.:;,()+$]").expect("valid punctuation regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static TOKEN_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{F|\}|<.*?>").expect("valid token noise regex"));

/// Reduces an utterance to its spoken words.
///
/// With `literal == false`, spelling variants are replaced by their standard
/// spelling and fillers are removed. With `literal == true`, fillers keep
/// their content (`{F aehm}` becomes `F aehm`) and variant tags are simply
/// stripped.
pub fn clean_utterance(text: &str, literal: bool) -> String {
    let mut utt = if literal {
        FILLER_CONTENT.replace_all(text, "$1").into_owned()
    } else {
        let standard = SPELLING_TAG.replace_all(text, "$1");
        FILLER.replace_all(&standard, "").into_owned()
    };
    utt = TAG.replace_all(&utt, "").into_owned();
    utt = UNCLOSED_TAG.replace_all(&utt, "").into_owned();
    utt = PUNCTUATION.replace_all(&utt, "").into_owned();
    WHITESPACE.replace_all(utt.trim(), " ").into_owned()
}

/// Splits a cleaned utterance into word tokens.
///
/// Remaining filler braces and tags are removed, the text is split on
/// whitespace and punctuation is trimmed from both ends of every token.
/// Tokens that consist only of punctuation disappear.
pub fn tokenize(clean: &str) -> Vec<String> {
    let stripped = TOKEN_NOISE.replace_all(clean, "");
    stripped
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
