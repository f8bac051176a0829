//! Fixed lexical data used by the interrogative filter
//!
//! The corpus is French speech with diacritics stripped, except that
//! `où` appears both as-is and transliterated to `oU`.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Main French QU-words. Composite forms beyond `lequel` are omitted.
pub const FRENCH_QU_WORDS: &[&str] = &[
    "qui",
    "où",
    "oU",
    "quoi",
    "quand",
    "comment",
    "pourquoi",
    "quel",
    "quelle",
    "quelles",
    "quels",
    "combien",
    "que",
    "qu'",
    "lequel",
    "lesquels",
    "laquelle",
    "lesquelles",
];

/// Second half of "n'importe + QU" free-choice phrases
pub const FRENCH_EXCEPTION: &str = "importe";

/// Chain identifier prefix of associative (bridging) chains
pub const ASSOCIATIVE_MARKER: &str = "r-ASSOCIATIVE";

static FRENCH: Lazy<Lexicon> =
    Lazy::new(|| Lexicon::new(FRENCH_QU_WORDS.iter().copied(), FRENCH_EXCEPTION, ASSOCIATIVE_MARKER));

/// Closed word lists consulted by the filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    qu_words: HashSet<String>,
    exception: String,
    associative_marker: String,
}

impl Lexicon {
    pub fn new<'a>(
        qu_words: impl IntoIterator<Item = &'a str>,
        exception: impl Into<String>,
        associative_marker: impl Into<String>,
    ) -> Self {
        Self {
            qu_words: qu_words.into_iter().map(str::to_string).collect(),
            exception: exception.into(),
            associative_marker: associative_marker.into(),
        }
    }

    /// The process-wide French lexicon
    pub fn french() -> &'static Lexicon {
        &FRENCH
    }

    /// Exact, case-sensitive membership
    pub fn is_qu_word(&self, word: &str) -> bool {
        self.qu_words.contains(word)
    }

    pub fn is_exception(&self, word: &str) -> bool {
        self.exception == word
    }

    pub fn associative_marker(&self) -> &str {
        &self.associative_marker
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::french().clone()
    }
}
