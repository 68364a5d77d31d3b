//! Lemmatization.
//!
//! Lemmatizers are pluggable through the [`Lemmatizer`] trait. The crate
//! ships a lexicon-backed implementation that reads a tab-separated
//! `word<TAB>lemma<TAB>tag` file.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::PentorefError;

/// Lemma and part-of-speech tag of one token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lemma {
    pub lemma: String,
    pub tag: String,
}

impl Lemma {
    pub fn new(lemma: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            lemma: lemma.into(),
            tag: tag.into(),
        }
    }
}

/// Maps a token to its lemma.
pub trait Lemmatizer {
    /// Returns `None` when the token is unknown.
    fn lemmatize(&self, token: &str) -> Option<Lemma>;
}

/// A lemmatizer backed by a word list.
///
/// Lookup tries the token as written, then its lower-case form.
#[derive(Clone, Debug, Default)]
pub struct LexiconLemmatizer {
    entries: HashMap<String, Lemma>,
}

impl LexiconLemmatizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a lexicon file. Lines starting with `#` are comments; the first
    /// entry for a word wins.
    pub fn read(path: &Path) -> Result<Self, PentorefError> {
        let file = File::open(path).map_err(PentorefError::Io)?;
        Self::from_reader(BufReader::new(file), path)
    }

    /// Parses a lexicon from a string.
    pub fn from_lexicon_str(text: &str) -> Result<Self, PentorefError> {
        Self::from_reader(text.as_bytes(), Path::new("<string>"))
    }

    fn from_reader<R: Read>(reader: R, path: &Path) -> Result<Self, PentorefError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .quoting(false)
            .from_reader(reader);

        let mut lexicon = Self::new();
        for result in csv_reader.deserialize() {
            let (word, lemma, tag): (String, String, String) =
                result.map_err(|source| PentorefError::LexiconParse {
                    path: path.to_path_buf(),
                    source,
                })?;
            lexicon
                .entries
                .entry(word)
                .or_insert_with(|| Lemma::new(lemma, tag));
        }
        Ok(lexicon)
    }

    pub fn insert(&mut self, word: impl Into<String>, lemma: Lemma) {
        self.entries.insert(word.into(), lemma);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Lemmatizer for LexiconLemmatizer {
    fn lemmatize(&self, token: &str) -> Option<Lemma> {
        self.entries
            .get(token)
            .or_else(|| self.entries.get(&token.to_lowercase()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicon_lookup_falls_back_to_lowercase() {
        let lexicon = LexiconLemmatizer::from_lexicon_str(
            "# word\tlemma\ttag\nrote\trot\tADJA\nteil\tTeil\tNN\n",
        )
        .expect("parse lexicon");

        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.lemmatize("rote"), Some(Lemma::new("rot", "ADJA")));
        assert_eq!(lexicon.lemmatize("Teil"), Some(Lemma::new("Teil", "NN")));
        assert_eq!(lexicon.lemmatize("Kreuz"), None);
    }

    #[test]
    fn first_entry_wins() {
        let lexicon =
            LexiconLemmatizer::from_lexicon_str("das\tder\tART\ndas\tdas\tPDS\n").unwrap();
        assert_eq!(lexicon.lemmatize("das"), Some(Lemma::new("der", "ART")));
    }

    #[test]
    fn short_rows_are_an_error() {
        let err = LexiconLemmatizer::from_lexicon_str("rote\trot\n").unwrap_err();
        assert!(matches!(err, PentorefError::LexiconParse { .. }));
    }
}
