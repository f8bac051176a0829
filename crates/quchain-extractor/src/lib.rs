//! quchain Extractor - Coreference chain extraction pipeline
//!
//! Turns a parsed TEI document into rendered excerpts of the chains
//! that involve an interrogative (QU-word) mention:
//! word index -> mention table -> chain table -> filter -> renderer.

pub mod chains;
pub mod filter;
pub mod mentions;
pub mod render;
pub mod stats;
pub mod words;

pub use chains::ChainTable;
pub use filter::{drop_subsumed, ChainFilter, Selection};
pub use mentions::MentionTable;
pub use render::render_chain;
pub use stats::{BatchSummary, ExtractionStats};
pub use words::WordIndex;

use quchain_core::{ChainRecord, FilterConfig, Lexicon, QuchainError, Result};
use quchain_parser::TeiDocument;

/// The three annotation layers of one document, cross-referenced
#[derive(Debug, Clone, Default)]
pub struct ResolvedDocument {
    pub words: WordIndex,
    pub mentions: MentionTable,
    pub chains: ChainTable,
}

impl ResolvedDocument {
    pub fn new(words: WordIndex, mentions: MentionTable, chains: ChainTable) -> Self {
        Self {
            words,
            mentions,
            chains,
        }
    }

    /// Build the word index, then mentions, then chains
    pub fn resolve(doc: &TeiDocument) -> Result<Self> {
        let words = WordIndex::build(doc)?;
        let mentions = MentionTable::resolve(doc, &words)?;
        let chains = ChainTable::build(doc, &mentions)?;

        tracing::debug!(
            tokens = words.token_count(),
            mentions = mentions.len(),
            chains = chains.len(),
            "Document resolved"
        );
        Ok(Self::new(words, mentions, chains))
    }
}

/// Records of one document with the counts behind them
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<ChainRecord>,
    pub stats: ExtractionStats,
}

/// Filters and renders the chains of resolved documents
#[derive(Debug, Clone, Copy)]
pub struct ChainExtractor<'a> {
    filter: ChainFilter<'a>,
}

impl<'a> ChainExtractor<'a> {
    pub fn new(config: FilterConfig, lexicon: &'a Lexicon) -> Self {
        Self {
            filter: ChainFilter::new(config, lexicon),
        }
    }

    /// Select and render the chains of one document
    ///
    /// A chain with overlapping mentions is logged and left out; any other
    /// error aborts the document.
    pub fn extract(&self, doc: &ResolvedDocument) -> Result<Extraction> {
        let selection = self.filter.run(doc)?;

        let mut stats = ExtractionStats {
            tokens: doc.words.token_count(),
            mentions: doc.mentions.len(),
            chains: doc.chains.len(),
            interrogative_mentions: selection.interrogative.len(),
            eligible_chains: selection.eligible.len(),
            selected_chains: selection.selected.len(),
            rejected_chains: 0,
        };

        let mut records = Vec::with_capacity(selection.selected.len());
        for chain in selection.selected {
            match render_chain(chain, doc) {
                Ok(rendered_text) => records.push(ChainRecord {
                    chain_id: chain.id.clone(),
                    member_mention_ids: chain.members.clone(),
                    rendered_text,
                }),
                Err(e @ QuchainError::OverlappingMentions { .. }) => {
                    tracing::warn!(chain = %chain.id, error = %e, "Chain skipped");
                    stats.rejected_chains += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Extraction { records, stats })
    }

    /// Resolve and extract in one step
    pub fn extract_document(&self, doc: &TeiDocument) -> Result<Extraction> {
        self.extract(&ResolvedDocument::resolve(doc)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quchain_core::{CoreferenceChain, Mention, MentionFeatures, Sentence, Token, TokenId};

    fn fixture() -> ResolvedDocument {
        let tokens = ["qui", "est", "là", "il", "dort"]
            .iter()
            .enumerate()
            .map(|(w, text)| Token::new(TokenId::new(1, 1, w as u32 + 1), *text))
            .collect();
        let words = WordIndex::from_sentences(vec![Sentence::new(0, tokens)]);

        let mut mentions = MentionTable::default();
        let spans = [("m1", vec![1]), ("m2", vec![4]), ("m3", vec![1, 2, 3])];
        for (id, span) in spans {
            let tokens = span.into_iter().map(|w| TokenId::new(1, 1, w)).collect();
            mentions.insert(Mention::new(id, tokens).unwrap());
        }
        mentions.set_features("m1", MentionFeatures { novel: Some(true), pronoun: Some(true) });
        mentions.set_features("m2", MentionFeatures { novel: Some(false), pronoun: Some(true) });
        mentions.set_features("m3", MentionFeatures { novel: Some(true), pronoun: Some(false) });

        let mut chains = ChainTable::default();
        chains.insert(CoreferenceChain::new("r-COREF-1", vec!["m1".into(), "m2".into()]));
        chains.insert(CoreferenceChain::new("r-COREF-2", vec!["m3".into(), "m2".into()]));

        ResolvedDocument::new(words, mentions, chains)
    }

    #[test]
    fn test_extract_records_and_stats() {
        let lexicon = Lexicon::french();
        let extractor = ChainExtractor::new(FilterConfig::default(), lexicon);

        let extraction = extractor.extract(&fixture()).unwrap();

        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[0].chain_id, "r-COREF-1");
        assert_eq!(extraction.records[0].rendered_text, "**[qui]** est là **[il]** dort.");
        assert_eq!(extraction.stats.mentions, 3);
        assert_eq!(extraction.stats.interrogative_mentions, 2);
        assert_eq!(extraction.stats.rendered_chains(), 2);
    }

    #[test]
    fn test_overlapping_chain_is_skipped() {
        let mut doc = fixture();
        doc.chains
            .insert(CoreferenceChain::new("r-COREF-3", vec!["m3".into(), "m1".into()]));

        let extraction = ChainExtractor::new(FilterConfig::default(), Lexicon::french())
            .extract(&doc)
            .unwrap();

        assert_eq!(extraction.stats.selected_chains, 3);
        assert_eq!(extraction.stats.rejected_chains, 1);
        assert!(extraction.records.iter().all(|r| r.chain_id != "r-COREF-3"));
    }
}
