//! quchain Parser - TEI-XML corpus reading
//!
//! Reads an annotated speech document into its raw annotation layers:
//! - Turns (`u`) with their word (`w`) and punctuation (`pc`) tokens
//! - Mention spans (`spanGrp/span`)
//! - Mention feature structures (`div type="unit-fs"/fs/f`)
//! - Coreference links (`linkGrp/link`)
//!
//! Nothing is resolved here: identifiers stay strings and attributes stay
//! optional, so that each consumer decides what absence means. The
//! `conllu` module flattens turns into a one-token-per-line export.

pub mod conllu;
mod tei;

use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while reading a TEI document
#[derive(Error, Debug)]
pub enum ParserError {
    /// IO error while reading the file
    #[error("IO error reading file: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not well-formed XML
    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// An expected TEI region is absent
    #[error("Missing TEI region: {0}")]
    MissingRegion(&'static str),
}

pub type Result<T> = std::result::Result<T, ParserError>;

// ============================================================================
// Annotation Layers
// ============================================================================

/// Raw annotation layers of one TEI document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeiDocument {
    /// Every turn, in document order
    pub turns: Vec<Turn>,

    /// Mention spans
    pub spans: Vec<SpanAnnotation>,

    /// Feature structures describing mentions
    pub feature_structures: Vec<FeatureStructure>,

    /// Coreference links
    pub links: Vec<LinkAnnotation>,
}

impl TeiDocument {
    /// Turns that belong to a `div type="section"`
    pub fn section_turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| t.in_section)
    }
}

/// A speech turn (`u`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Turn {
    /// Whether the turn sits inside a `div type="section"`
    pub in_section: bool,

    /// Word and punctuation tokens in annotation order
    pub tokens: Vec<RawToken>,

    /// Concatenated text content of the whole turn, untrimmed
    pub text: String,
}

impl Turn {
    /// Text content with line breaks and indentation collapsed
    pub fn flattened_text(&self) -> String {
        self.text
            .split('\n')
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn words(&self) -> impl Iterator<Item = &RawToken> {
        self.tokens.iter().filter(|t| t.kind == TokenKind::Word)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Punct,
}

/// A `w` or `pc` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub kind: TokenKind,
    pub xml_id: Option<String>,
    pub text: String,
}

/// A `span` element: either `target` or `from`/`to`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanAnnotation {
    pub xml_id: Option<String>,
    pub target: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl SpanAnnotation {
    /// Token references of a discontinuous span, `#` removed
    ///
    /// Empty when the span is continuous.
    pub fn target_refs(&self) -> Vec<&str> {
        split_refs(self.target.as_deref())
    }

    pub fn from_ref(&self) -> Option<&str> {
        self.from.as_deref().map(strip_ref)
    }

    pub fn to_ref(&self) -> Option<&str> {
        self.to.as_deref().map(strip_ref)
    }
}

/// An `fs` element of the `unit-fs` division
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureStructure {
    pub xml_id: Option<String>,
    pub features: Vec<Feature>,
}

impl FeatureStructure {
    /// Value of the first feature with this name
    pub fn feature(&self, name: &str) -> Option<&str> {
        self.features
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Mention described by this structure: the id minus its last `-segment`
    pub fn mention_id(&self) -> Option<&str> {
        self.xml_id
            .as_deref()
            .and_then(|id| id.rsplit_once('-'))
            .map(|(mention, _)| mention)
    }
}

/// An `f` element: its name and the text of its value element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub value: String,
}

/// A `link` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkAnnotation {
    pub xml_id: Option<String>,
    pub target: Option<String>,
}

impl LinkAnnotation {
    /// Mention references, `#` removed
    pub fn target_refs(&self) -> Vec<&str> {
        split_refs(self.target.as_deref())
    }
}

fn strip_ref(reference: &str) -> &str {
    reference.trim().trim_start_matches('#')
}

fn split_refs(target: Option<&str>) -> Vec<&str> {
    target
        .map(|t| t.split_whitespace().map(strip_ref).filter(|r| !r.is_empty()).collect())
        .unwrap_or_default()
}

// ============================================================================
// Parser
// ============================================================================

/// Whether a path names a corpus document
pub fn is_tei_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("tei")
}

/// TEI document parser
#[derive(Debug, Clone)]
pub struct TeiParser {
    /// Require the section and standOff regions
    pub require_annotations: bool,
}

impl TeiParser {
    /// Create a parser for fully annotated documents
    pub fn new() -> Self {
        Self {
            require_annotations: true,
        }
    }

    /// Accept transcripts without annotation regions
    pub fn with_annotations(mut self, required: bool) -> Self {
        self.require_annotations = required;
        self
    }

    /// Parse a document from a file path
    pub fn parse(&self, path: &Path) -> Result<TeiDocument> {
        let content = std::fs::read_to_string(path).map_err(|e| ParserError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        self.parse_str(&content)
    }

    /// Parse a document held in memory
    pub fn parse_str(&self, xml: &str) -> Result<TeiDocument> {
        let read = tei::read_document(xml)?;

        if self.require_annotations {
            if !read.has_section {
                return Err(ParserError::MissingRegion("div type=\"section\""));
            }
            if !read.has_standoff {
                return Err(ParserError::MissingRegion("standOff"));
            }
        }

        tracing::debug!(
            turns = read.document.turns.len(),
            spans = read.document.spans.len(),
            feature_structures = read.document.feature_structures.len(),
            links = read.document.links.len(),
            "TEI document read"
        );

        Ok(read.document)
    }
}

impl Default for TeiParser {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tei_file_detection() {
        assert!(is_tei_file(Path::new("corpus/ESLO_12.tei")));
        assert!(!is_tei_file(Path::new("corpus/ESLO_12.xml")));
        assert!(!is_tei_file(Path::new("corpus/tei")));
    }

    #[test]
    fn test_reference_splitting() {
        let span = SpanAnnotation {
            target: Some("#s1.u2.w3  #s1.u2.w5".to_string()),
            from: Some("#s1.u2.w1".to_string()),
            ..Default::default()
        };
        assert_eq!(span.target_refs(), vec!["s1.u2.w3", "s1.u2.w5"]);
        assert_eq!(span.from_ref(), Some("s1.u2.w1"));
        assert_eq!(span.to_ref(), None);
        assert!(SpanAnnotation::default().target_refs().is_empty());
    }

    #[test]
    fn test_feature_structure_mention_id() {
        let fs = FeatureStructure {
            xml_id: Some("u-MENTION-12-fs".to_string()),
            features: vec![Feature {
                name: "NEW".to_string(),
                value: "YES".to_string(),
            }],
        };
        assert_eq!(fs.mention_id(), Some("u-MENTION-12"));
        assert_eq!(fs.feature("NEW"), Some("YES"));
        assert_eq!(fs.feature("type"), None);

        let bare = FeatureStructure {
            xml_id: Some("fs12".to_string()),
            features: vec![],
        };
        assert_eq!(bare.mention_id(), None);
    }

    #[test]
    fn test_flattened_text() {
        let turn = Turn {
            text: "\n   euh qui\n  est   là\n\n ?\n".to_string(),
            ..Default::default()
        };
        assert_eq!(turn.flattened_text(), "euh qui est   là ?");
    }

    #[test]
    fn test_missing_regions() {
        let parser = TeiParser::new();
        let no_standoff = r#"<TEI><text><body><div type="section"><u/></div></body></text></TEI>"#;
        assert!(matches!(
            parser.parse_str(no_standoff),
            Err(ParserError::MissingRegion("standOff"))
        ));

        let no_section = r#"<TEI><text><body><u/></body></text><standOff/></TEI>"#;
        assert!(matches!(
            parser.parse_str(no_section),
            Err(ParserError::MissingRegion(_))
        ));

        // Transcript mode accepts both
        let lenient = TeiParser::new().with_annotations(false);
        assert_eq!(lenient.parse_str(no_section).unwrap().turns.len(), 1);
    }

    #[test]
    fn test_parse_missing_file() {
        let result = TeiParser::new().parse(Path::new("/nonexistent/doc.tei"));
        assert!(matches!(result, Err(ParserError::IoError { .. })));
    }
}
