//! String transforms applied to utterance text.
//!
//! - [`clean_utterance`] and [`tokenize`] turn transcriptions into words.
//! - [`parse_inline_refs`], [`relation`], [`landmark`] and [`parse_roles`]
//!   read the inline annotation markup some corpora carry.
//! - [`Lemmatizer`] maps tokens to lemmas and tags.

mod clean;
mod lemma;
mod markup;

pub use clean::{clean_utterance, tokenize};
pub use lemma::{Lemma, Lemmatizer, LexiconLemmatizer};
pub use markup::{landmark, parse_inline_refs, parse_roles, relation, InlineRef};

/// Fuzz-only entrypoint for cleaning, tokenizing and markup parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_utterance_text(input: &str) {
    let _ = parse_inline_refs(input);
    let _ = relation(input);
    let _ = landmark(input);
    let _ = parse_roles(input);
    for literal in [false, true] {
        let _ = tokenize(&clean_utterance(input, literal));
    }
}
