//! quchain Core - Domain models, errors and shared configuration
//!
//! This crate defines the types shared by every stage of the chain
//! extraction pipeline:
//! - Token identifiers and tokens of the word layer
//! - Sentences (speech turns)
//! - Mentions and their annotated features
//! - Coreference chains and the rendered output records
//! - Common error types
//! - Configuration management and the fixed QU-word lexicon

pub mod config;
pub mod lexicon;

pub use config::{AppConfig, ConfigError, FilterConfig, LoggingConfig};
pub use lexicon::Lexicon;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for chain extraction
///
/// Every variant except `Config` is scoped to a single document: callers
/// report it and move on to the next file.
#[derive(Error, Debug)]
pub enum QuchainError {
    #[error("Invalid token identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Token of turn {turn} has no identifier")]
    MissingIdentifier { turn: usize },

    #[error("<{element}> is missing attribute {attribute} ({context})")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
        context: String,
    },

    #[error("Mention {mention} references unknown token {token}")]
    UnresolvedToken { mention: String, token: String },

    #[error("Chain {chain} lists unknown mention {mention}")]
    UnknownMention { chain: String, mention: String },

    #[error("Mention {mention} spans {from} to {to}, across turns")]
    CrossScopeRange {
        mention: String,
        from: TokenId,
        to: TokenId,
    },

    #[error("Mention {0} covers no token")]
    EmptyMention(String),

    #[error("Mention {mention} not detected in FS description divisions ({feature})")]
    MissingFeature {
        mention: String,
        feature: &'static str,
    },

    #[error("Chain {chain} has overlapping mentions {first} and {second}")]
    OverlappingMentions {
        chain: String,
        first: String,
        second: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, QuchainError>;

// ============================================================================
// Word Layer
// ============================================================================

/// Structured position of a token: `s<section>.u<turn>.w<word>`
///
/// Ordering is lexicographic over (section, turn, word), which is the
/// document order of the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId {
    pub section: u32,
    pub turn: u32,
    pub word: u32,
}

impl TokenId {
    pub fn new(section: u32, turn: u32, word: u32) -> Self {
        Self {
            section,
            turn,
            word,
        }
    }

    /// Whether both identifiers belong to the same section and turn
    pub fn same_turn(&self, other: &TokenId) -> bool {
        self.section == other.section && self.turn == other.turn
    }

    /// Same section and turn, another word position
    pub fn with_word(&self, word: u32) -> Self {
        Self { word, ..*self }
    }
}

impl FromStr for TokenId {
    type Err = QuchainError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || QuchainError::InvalidIdentifier(s.to_string());

        let mut parts = s.split('.');
        let mut field = |prefix: char| -> Result<u32> {
            parts
                .next()
                .and_then(|p| p.strip_prefix(prefix))
                .and_then(|n| n.parse().ok())
                .ok_or_else(invalid)
        };

        let id = TokenId::new(field('s')?, field('u')?, field('w')?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(id)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}.u{}.w{}", self.section, self.turn, self.word)
    }
}

/// A word or punctuation token with its surface text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: TokenId,
    pub text: String,
}

impl Token {
    pub fn new(id: TokenId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// A speech turn, the unit the renderer prints and elides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Position among the document's turns
    pub index: usize,

    /// Tokens sorted by identifier
    pub tokens: Vec<Token>,
}

impl Sentence {
    /// Build a sentence, sorting tokens into identifier order
    pub fn new(index: usize, mut tokens: Vec<Token>) -> Self {
        tokens.sort_by_key(|t| t.id);
        Self { index, tokens }
    }
}

// ============================================================================
// Mention Layer
// ============================================================================

/// An annotated span referring to a discourse entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub id: String,

    /// Covered tokens, always in identifier order
    tokens: Vec<TokenId>,
}

impl Mention {
    /// Create a mention; the span is sorted and must not be empty
    pub fn new(id: impl Into<String>, mut tokens: Vec<TokenId>) -> Result<Self> {
        let id = id.into();
        if tokens.is_empty() {
            return Err(QuchainError::EmptyMention(id));
        }
        tokens.sort();
        Ok(Self { id, tokens })
    }

    pub fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    pub fn first_token(&self) -> TokenId {
        self.tokens[0]
    }

    pub fn last_token(&self) -> TokenId {
        self.tokens[self.tokens.len() - 1]
    }
}

/// Facts read from the feature-structure layer for one mention
///
/// `None` means the layer said nothing about that feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MentionFeatures {
    /// `NEW=YES`: the mention introduces a discourse referent
    pub novel: Option<bool>,

    /// `type=PR`: the mention is a pronoun
    pub pronoun: Option<bool>,
}

// ============================================================================
// Chain Layer
// ============================================================================

/// A coreference chain with at least two resolved members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreferenceChain {
    pub id: String,

    /// Member mention ids, ordered by their first token
    pub members: Vec<String>,
}

impl CoreferenceChain {
    pub fn new(id: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            id: id.into(),
            members,
        }
    }

    /// Whether the identifier starts with the given kind marker
    pub fn has_marker(&self, marker: &str) -> bool {
        self.id.starts_with(marker)
    }
}

/// A surviving chain together with its rendered excerpt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRecord {
    pub chain_id: String,
    pub member_mention_ids: Vec<String>,
    pub rendered_text: String,
}

// ============================================================================
// Tests
// ============================================================================
