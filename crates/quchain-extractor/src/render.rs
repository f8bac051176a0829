//! Excerpt rendering
//!
//! A chain is printed over the sentences from its first to its last
//! mention. Sentences holding a mention, and their immediate neighbours,
//! are printed in full with `**[...]**` around each member mention. Any
//! other run of sentences collapses into a single `[...]`.

use std::collections::BTreeSet;

use quchain_core::{CoreferenceChain, Mention, QuchainError, Result};

use crate::ResolvedDocument;

pub const ELLIPSIS: &str = "[...]";
pub const OPEN_MARK: &str = "**[";
pub const CLOSE_MARK: &str = "]**";

/// Render the excerpt of one chain
///
/// Member spans must be disjoint and ordered; a chain whose mentions
/// overlap is rejected with `OverlappingMentions`.
pub fn render_chain(chain: &CoreferenceChain, doc: &ResolvedDocument) -> Result<String> {
    let mentions = chain
        .members
        .iter()
        .map(|id| {
            doc.mentions
                .get(id)
                .ok_or_else(|| QuchainError::UnknownMention {
                    chain: chain.id.clone(),
                    mention: id.clone(),
                })
        })
        .collect::<Result<Vec<&Mention>>>()?;

    check_disjoint(chain, &mentions)?;

    let sentences = mentions
        .iter()
        .map(|m| {
            doc.words
                .sentence_of(m.first_token())
                .ok_or_else(|| QuchainError::UnresolvedToken {
                    mention: m.id.clone(),
                    token: m.first_token().to_string(),
                })
        })
        .collect::<Result<BTreeSet<usize>>>()?;

    let (Some(&first), Some(&last)) = (sentences.first(), sentences.last()) else {
        return Ok(String::new());
    };

    let holds_mention = |s: usize| sentences.contains(&s);
    let mut out = String::new();
    let mut in_gap = false;
    // Index of the last opened mention
    let mut cursor: Option<usize> = None;

    for s in first..=last {
        let near = holds_mention(s)
            || holds_mention(s + 1)
            || s.checked_sub(1).is_some_and(holds_mention);

        if !near {
            if !in_gap {
                in_gap = true;
                out.push(' ');
                out.push_str(ELLIPSIS);
            }
            continue;
        }

        in_gap = false;
        for token in &doc.words.sentences()[s].tokens {
            out.push(' ');

            let next = cursor.map_or(0, |c| c + 1);
            if next < mentions.len() && token.id == mentions[next].first_token() {
                cursor = Some(next);
                out.push_str(OPEN_MARK);
            }

            out.push_str(&token.text);

            if cursor.is_some_and(|c| token.id == mentions[c].last_token()) {
                out.push_str(CLOSE_MARK);
            }
        }
        out.push('.');
    }

    Ok(out.strip_prefix(' ').unwrap_or(&out).to_string())
}

/// Members are sorted by first token; each must end before the next starts
fn check_disjoint(chain: &CoreferenceChain, mentions: &[&Mention]) -> Result<()> {
    for pair in mentions.windows(2) {
        if pair[1].first_token() <= pair[0].last_token() {
            return Err(QuchainError::OverlappingMentions {
                chain: chain.id.clone(),
                first: pair[0].id.clone(),
                second: pair[1].id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChainTable, MentionTable, WordIndex};
    use quchain_core::{Sentence, Token, TokenId};

    fn id(sentence: usize, word: usize) -> TokenId {
        TokenId::new(1, sentence as u32 + 1, word as u32 + 1)
    }

    /// One sentence per string; mention spans as (sentence, word) pairs
    fn document(sentences: &[&str], mentions: &[(&str, &[(usize, usize)])]) -> ResolvedDocument {
        let sentences = sentences
            .iter()
            .enumerate()
            .map(|(s, text)| {
                let tokens = text
                    .split_whitespace()
                    .enumerate()
                    .map(|(w, word)| Token::new(id(s, w), word))
                    .collect();
                Sentence::new(s, tokens)
            })
            .collect();

        let mut table = MentionTable::default();
        for (mention, span) in mentions {
            let tokens = span.iter().map(|&(s, w)| id(s, w)).collect();
            table.insert(Mention::new(*mention, tokens).unwrap());
        }

        ResolvedDocument::new(WordIndex::from_sentences(sentences), table, ChainTable::default())
    }

    fn chain(members: &[&str]) -> CoreferenceChain {
        CoreferenceChain::new("r-COREF-1", members.iter().map(|m| m.to_string()).collect())
    }

    fn numbered(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("mot{i}")).collect()
    }

    #[test]
    fn test_boundary_markers() {
        let doc = document(
            &["Qui est il ici"],
            &[("m1", &[(0, 0), (0, 1)]), ("m2", &[(0, 2)])],
        );
        let text = render_chain(&chain(&["m1", "m2"]), &doc).unwrap();
        assert_eq!(text, "**[Qui est]** **[il]** ici.");
    }

    #[test]
    fn test_gap_between_sentences_two_and_seven() {
        let words = numbered(9);
        let sentences: Vec<&str> = words.iter().map(String::as_str).collect();
        let doc = document(
            &sentences,
            &[("a", &[(2, 0)]), ("b", &[(3, 0)]), ("c", &[(7, 0)])],
        );

        let text = render_chain(&chain(&["a", "b", "c"]), &doc).unwrap();
        assert_eq!(
            text,
            "**[mot2]**. **[mot3]**. mot4. [...] mot6. **[mot7]**."
        );
        assert_eq!(text.matches(ELLIPSIS).count(), 1);
        assert!(!text.contains("mot5"));
    }

    #[test]
    fn test_long_gap_single_ellipsis() {
        let words = numbered(11);
        let sentences: Vec<&str> = words.iter().map(String::as_str).collect();
        let doc = document(&sentences, &[("a", &[(0, 0)]), ("b", &[(10, 0)])]);

        let text = render_chain(&chain(&["a", "b"]), &doc).unwrap();
        assert_eq!(text, "**[mot0]**. mot1. [...] mot9. **[mot10]**.");
    }

    #[test]
    fn test_adjacent_sentences_no_ellipsis() {
        let doc = document(
            &["qui vient", "euh", "il part"],
            &[("a", &[(0, 0)]), ("b", &[(2, 0)])],
        );
        let text = render_chain(&chain(&["a", "b"]), &doc).unwrap();
        assert_eq!(text, "**[qui]** vient. euh. **[il]** part.");
    }

    #[test]
    fn test_discontinuous_mention_markers() {
        let doc = document(
            &["a b c", "d"],
            &[("m1", &[(0, 0), (0, 2)]), ("m2", &[(1, 0)])],
        );
        let text = render_chain(&chain(&["m1", "m2"]), &doc).unwrap();
        assert_eq!(text, "**[a b c]**. **[d]**.");
    }

    #[test]
    fn test_overlapping_mentions_rejected() {
        let doc = document(
            &["qui est la"],
            &[("m1", &[(0, 0), (0, 1), (0, 2)]), ("m2", &[(0, 1)])],
        );
        let result = render_chain(&chain(&["m1", "m2"]), &doc);
        assert!(matches!(
            result,
            Err(QuchainError::OverlappingMentions { first, second, .. }) if first == "m1" && second == "m2"
        ));
    }

    #[test]
    fn test_unknown_member() {
        let doc = document(&["qui"], &[("m1", &[(0, 0)])]);
        let result = render_chain(&chain(&["m1", "ghost"]), &doc);
        assert!(matches!(
            result,
            Err(QuchainError::UnknownMention { mention, .. }) if mention == "ghost"
        ));
    }
}
