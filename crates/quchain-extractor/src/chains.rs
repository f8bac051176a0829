//! Coreference graph: `link` annotations to ordered chains

use std::collections::HashMap;

use quchain_core::{CoreferenceChain, Mention, QuchainError, Result};
use quchain_parser::TeiDocument;

use crate::mentions::MentionTable;

/// Chains in document order, indexed by id
#[derive(Debug, Clone, Default)]
pub struct ChainTable {
    chains: Vec<CoreferenceChain>,
    index: HashMap<String, usize>,
}

impl ChainTable {
    /// Build chains from the link layer
    ///
    /// Targets that name no resolved mention are dropped as annotation
    /// noise. A chain left with fewer than two distinct members is
    /// discarded.
    pub fn build(doc: &TeiDocument, mentions: &MentionTable) -> Result<Self> {
        let mut table = Self::default();

        for (position, link) in doc.links.iter().enumerate() {
            let id = link
                .xml_id
                .as_deref()
                .ok_or_else(|| QuchainError::MissingAttribute {
                    element: "link",
                    attribute: "xml:id",
                    context: format!("link #{position}"),
                })?;

            let mut members: Vec<&Mention> = Vec::new();
            for target in link.target_refs() {
                match mentions.get(target) {
                    Some(m) if !members.iter().any(|known| known.id == m.id) => members.push(m),
                    Some(_) => {}
                    None => tracing::debug!(chain = id, mention = target, "Unknown link target"),
                }
            }

            if members.len() < 2 {
                tracing::debug!(chain = id, members = members.len(), "Chain too short");
                continue;
            }

            members.sort_by_key(|m| m.first_token());
            table.insert(CoreferenceChain::new(
                id,
                members.iter().map(|m| m.id.clone()).collect(),
            ));
        }

        tracing::debug!(chains = table.len(), "Chains built");
        Ok(table)
    }

    /// Insert a chain; a repeated id replaces the earlier one in place
    pub fn insert(&mut self, chain: CoreferenceChain) {
        match self.index.get(&chain.id) {
            Some(&i) => self.chains[i] = chain,
            None => {
                self.index.insert(chain.id.clone(), self.chains.len());
                self.chains.push(chain);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&CoreferenceChain> {
        self.index.get(id).map(|&i| &self.chains[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoreferenceChain> {
        self.chains.iter()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
