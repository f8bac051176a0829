//! Word index: the token layer of a document
//!
//! Turns of the section divisions become sentences, each sorted by token
//! identifier since annotation order is not trusted.

use std::collections::HashMap;

use quchain_core::{QuchainError, Result, Sentence, Token, TokenId};
use quchain_parser::TeiDocument;

/// Sentences plus identifier lookups
#[derive(Debug, Clone, Default)]
pub struct WordIndex {
    sentences: Vec<Sentence>,
    /// Token id -> (sentence index, position in sentence)
    positions: HashMap<TokenId, (usize, usize)>,
}

impl WordIndex {
    /// Build the index from the section turns of a document
    ///
    /// A token without a parseable identifier fails the whole document.
    pub fn build(doc: &TeiDocument) -> Result<Self> {
        let mut sentences = Vec::new();

        for (index, turn) in doc.section_turns().enumerate() {
            let tokens = turn
                .tokens
                .iter()
                .map(|raw| {
                    let id: TokenId = raw
                        .xml_id
                        .as_deref()
                        .ok_or(QuchainError::MissingIdentifier { turn: index })?
                        .parse()?;
                    Ok(Token::new(id, raw.text.clone()))
                })
                .collect::<Result<Vec<_>>>()?;
            sentences.push(Sentence::new(index, tokens));
        }

        Ok(Self::from_sentences(sentences))
    }

    /// Index already-built sentences
    pub fn from_sentences(sentences: Vec<Sentence>) -> Self {
        let mut positions = HashMap::new();
        for (s, sentence) in sentences.iter().enumerate() {
            for (p, token) in sentence.tokens.iter().enumerate() {
                positions.insert(token.id, (s, p));
            }
        }

        Self {
            sentences,
            positions,
        }
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Surface text of a token
    pub fn text(&self, id: TokenId) -> Option<&str> {
        self.positions
            .get(&id)
            .map(|&(s, p)| self.sentences[s].tokens[p].text.as_str())
    }

    /// Index of the sentence owning a token
    pub fn sentence_of(&self, id: TokenId) -> Option<usize> {
        self.positions.get(&id).map(|&(s, _)| s)
    }

    pub fn token_count(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quchain_parser::TeiParser;

    fn parse(xml: &str) -> TeiDocument {
        TeiParser::new().parse_str(xml).unwrap()
    }

    #[test]
    fn test_build_sorts_tokens() {
        let doc = parse(
            r#"<TEI><text><body>
            <div type="section">
              <u><w xml:id="s1.u1.w10">la</w><w xml:id="s1.u1.w9">est</w><pc xml:id="s1.u1.w11">?</pc></u>
              <u><w xml:id="s1.u2.w1">oui</w></u>
            </div>
            <u><w xml:id="s0.u0.w1">ignored</w></u>
            </body></text><standOff/></TEI>"#,
        );
        let index = WordIndex::build(&doc).unwrap();

        assert_eq!(index.sentences().len(), 2);
        let texts: Vec<&str> = index.sentences()[0]
            .tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, vec!["est", "la", "?"]);

        assert_eq!(index.text(TokenId::new(1, 2, 1)), Some("oui"));
        assert_eq!(index.sentence_of(TokenId::new(1, 2, 1)), Some(1));
        assert_eq!(index.sentence_of(TokenId::new(0, 0, 1)), None);
        assert_eq!(index.token_count(), 4);
    }

    #[test]
    fn test_missing_identifier_is_fatal() {
        let doc = parse(
            r#"<TEI><text><div type="section"><u><w>euh</w></u></div></text><standOff/></TEI>"#,
        );
        assert!(matches!(
            WordIndex::build(&doc),
            Err(QuchainError::MissingIdentifier { turn: 0 })
        ));
    }

    #[test]
    fn test_invalid_identifier_is_fatal() {
        let doc = parse(
            r#"<TEI><text><div type="section"><u><w xml:id="w12">euh</w></u></div></text><standOff/></TEI>"#,
        );
        assert!(matches!(
            WordIndex::build(&doc),
            Err(QuchainError::InvalidIdentifier(id)) if id == "w12"
        ));
    }
}
