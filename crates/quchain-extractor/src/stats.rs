//! Extraction counters
//!
//! Per-document counts of what each pipeline stage kept, and a batch
//! summary accumulated over documents.

use serde::{Deserialize, Serialize};

/// Counts for one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Tokens in the word index
    pub tokens: usize,
    /// Resolved mentions
    pub mentions: usize,
    /// Chains with at least two members
    pub chains: usize,
    /// Mentions passing the interrogative test
    pub interrogative_mentions: usize,
    /// Chains passing the eligibility test
    pub eligible_chains: usize,
    /// Chains left after subset deduplication
    pub selected_chains: usize,
    /// Selected chains that could not be rendered
    pub rejected_chains: usize,
}

impl ExtractionStats {
    /// Chains actually printed
    pub fn rendered_chains(&self) -> usize {
        self.selected_chains - self.rejected_chains
    }
}

/// Totals over a batch of documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Documents processed to completion
    pub documents: usize,
    /// Documents skipped on error
    pub skipped: usize,
    /// Documents with at least one rendered chain
    pub with_chains: usize,
    /// Totals of the per-document counters
    pub totals: ExtractionStats,
}

impl BatchSummary {
    pub fn record(&mut self, stats: &ExtractionStats) {
        self.documents += 1;
        if stats.rendered_chains() > 0 {
            self.with_chains += 1;
        }

        let t = &mut self.totals;
        t.tokens += stats.tokens;
        t.mentions += stats.mentions;
        t.chains += stats.chains;
        t.interrogative_mentions += stats.interrogative_mentions;
        t.eligible_chains += stats.eligible_chains;
        t.selected_chains += stats.selected_chains;
        t.rejected_chains += stats.rejected_chains;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }
}
