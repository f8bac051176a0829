//! Linguistic filter
//!
//! Selects the chains worth printing, in three steps:
//! 1. interrogative mentions: a QU-word, no "n'importe" idiom, and
//!    optionally a new discourse referent;
//! 2. eligible chains: not associative (optional), at least one
//!    interrogative member, at least one pronoun (optional);
//! 3. subset deduplication over the eligible chains.
//!
//! Every step reads the resolved document and returns fresh collections,
//! so one document can be filtered under several configurations.

use std::collections::HashSet;

use quchain_core::{CoreferenceChain, FilterConfig, Lexicon, Mention, QuchainError, Result};

use crate::ResolvedDocument;

/// Filter configuration bound to a lexicon
#[derive(Debug, Clone, Copy)]
pub struct ChainFilter<'a> {
    config: FilterConfig,
    lexicon: &'a Lexicon,
}

impl<'a> ChainFilter<'a> {
    pub fn new(config: FilterConfig, lexicon: &'a Lexicon) -> Self {
        Self { config, lexicon }
    }

    /// Step 1 for a single mention
    ///
    /// A mention with a QU-word must carry the `NEW` feature even when
    /// novelty is not required.
    pub fn is_interrogative(&self, mention: &Mention, doc: &ResolvedDocument) -> Result<bool> {
        let mut has_qu_word = false;
        for &token in mention.tokens() {
            let text = doc
                .words
                .text(token)
                .ok_or_else(|| QuchainError::UnresolvedToken {
                    mention: mention.id.clone(),
                    token: token.to_string(),
                })?;

            if self.lexicon.is_exception(text) {
                return Ok(false);
            }
            has_qu_word |= self.lexicon.is_qu_word(text);
        }

        if !has_qu_word {
            return Ok(false);
        }
        let novel = doc.mentions.is_novel(&mention.id)?;
        Ok(!self.config.require_novelty || novel)
    }

    /// Step 1 over every mention of the document
    pub fn interrogative_mentions<'d>(&self, doc: &'d ResolvedDocument) -> Result<HashSet<&'d str>> {
        let mut found = HashSet::new();
        for mention in doc.mentions.iter() {
            if self.is_interrogative(mention, doc)? {
                found.insert(mention.id.as_str());
            }
        }
        Ok(found)
    }

    /// Step 2 for a single chain
    pub fn is_eligible(
        &self,
        chain: &CoreferenceChain,
        doc: &ResolvedDocument,
        interrogative: &HashSet<&str>,
    ) -> Result<bool> {
        if self.config.exclude_associative && chain.has_marker(self.lexicon.associative_marker()) {
            return Ok(false);
        }

        if !chain
            .members
            .iter()
            .any(|m| interrogative.contains(m.as_str()))
        {
            return Ok(false);
        }

        if self.config.require_pronoun {
            // Every member is inspected, so a missing feature always surfaces
            let mut has_pronoun = false;
            for member in &chain.members {
                has_pronoun |= doc.mentions.is_pronoun(member)?;
            }
            return Ok(has_pronoun);
        }

        Ok(true)
    }

    /// All three steps, keeping the intermediate results
    pub fn run<'d>(&self, doc: &'d ResolvedDocument) -> Result<Selection<'d>> {
        let interrogative = self.interrogative_mentions(doc)?;

        let mut eligible = Vec::new();
        for chain in doc.chains.iter() {
            if self.is_eligible(chain, doc, &interrogative)? {
                eligible.push(chain);
            }
        }

        let selected = drop_subsumed(&eligible);

        tracing::debug!(
            interrogative = interrogative.len(),
            eligible = eligible.len(),
            selected = selected.len(),
            "Chains filtered"
        );
        Ok(Selection {
            interrogative,
            eligible,
            selected,
        })
    }
}

/// Outcome of each filter step for one document
#[derive(Debug, Clone)]
pub struct Selection<'d> {
    /// Step 1: interrogative mention ids
    pub interrogative: HashSet<&'d str>,
    /// Step 2: eligible chains in document order
    pub eligible: Vec<&'d CoreferenceChain>,
    /// Step 3: eligible chains not subsumed by another
    pub selected: Vec<&'d CoreferenceChain>,
}

/// Step 3: drop every chain whose member set another chain contains
///
/// Relations are computed on the input as given, then applied at once.
/// Of several chains with the same member set only the last survives.
pub fn drop_subsumed<'c>(chains: &[&'c CoreferenceChain]) -> Vec<&'c CoreferenceChain> {
    let sets: Vec<HashSet<&str>> = chains
        .iter()
        .map(|c| c.members.iter().map(String::as_str).collect())
        .collect();

    let subsumed = |b: usize| {
        (0..sets.len()).any(|a| {
            a != b && sets[b].is_subset(&sets[a]) && (sets[b].len() < sets[a].len() || a > b)
        })
    };

    let dropped: Vec<bool> = (0..chains.len()).map(subsumed).collect();

    chains
        .iter()
        .zip(dropped)
        .filter(|(_, dropped)| !dropped)
        .map(|(chain, _)| *chain)
        .collect()
}
