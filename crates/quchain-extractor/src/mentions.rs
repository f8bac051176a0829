//! Mention resolution
//!
//! Turns `span` annotations into token spans and attaches the NEW/type
//! features of the `unit-fs` division.

use std::collections::HashMap;

use quchain_core::{Mention, MentionFeatures, QuchainError, Result, TokenId};
use quchain_parser::{SpanAnnotation, TeiDocument};

use crate::words::WordIndex;

/// Resolved mentions in annotation order, with their features
#[derive(Debug, Clone, Default)]
pub struct MentionTable {
    mentions: Vec<Mention>,
    index: HashMap<String, usize>,
    features: HashMap<String, MentionFeatures>,
}

impl MentionTable {
    /// Resolve every span of the document against the word index
    pub fn resolve(doc: &TeiDocument, words: &WordIndex) -> Result<Self> {
        let mut table = Self {
            features: read_features(doc),
            ..Default::default()
        };

        for (position, span) in doc.spans.iter().enumerate() {
            let mention = resolve_span(span, position)?;

            if let Some(token) = mention.tokens().iter().find(|t| !words.contains(**t)) {
                return Err(QuchainError::UnresolvedToken {
                    mention: mention.id.clone(),
                    token: token.to_string(),
                });
            }

            table.insert(mention);
        }

        tracing::debug!(
            mentions = table.len(),
            described = table.features.len(),
            "Mentions resolved"
        );
        Ok(table)
    }

    /// Insert a mention; a repeated id replaces the earlier one in place
    pub fn insert(&mut self, mention: Mention) {
        match self.index.get(&mention.id) {
            Some(&i) => self.mentions[i] = mention,
            None => {
                self.index.insert(mention.id.clone(), self.mentions.len());
                self.mentions.push(mention);
            }
        }
    }

    pub fn set_features(&mut self, id: impl Into<String>, features: MentionFeatures) {
        self.features.insert(id.into(), features);
    }

    pub fn get(&self, id: &str) -> Option<&Mention> {
        self.index.get(id).map(|&i| &self.mentions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mention> {
        self.mentions.iter()
    }

    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }

    /// Raw features; both are `None` for an undescribed mention
    pub fn features(&self, id: &str) -> MentionFeatures {
        self.features.get(id).copied().unwrap_or_default()
    }

    /// `NEW` feature, which must have been annotated
    pub fn is_novel(&self, id: &str) -> Result<bool> {
        self.features(id)
            .novel
            .ok_or_else(|| QuchainError::MissingFeature {
                mention: id.to_string(),
                feature: "NEW",
            })
    }

    /// `type` feature, which must have been annotated
    pub fn is_pronoun(&self, id: &str) -> Result<bool> {
        self.features(id)
            .pronoun
            .ok_or_else(|| QuchainError::MissingFeature {
                mention: id.to_string(),
                feature: "type",
            })
    }
}

fn resolve_span(span: &SpanAnnotation, position: usize) -> Result<Mention> {
    let id = span
        .xml_id
        .clone()
        .ok_or_else(|| QuchainError::MissingAttribute {
            element: "span",
            attribute: "xml:id",
            context: format!("span #{position}"),
        })?;

    let refs = span.target_refs();
    if !refs.is_empty() {
        // Discontinuous: the listed tokens, in any order
        let tokens = refs
            .iter()
            .map(|r| r.parse())
            .collect::<Result<Vec<TokenId>>>()?;
        return Mention::new(id, tokens);
    }

    let boundary = |value: Option<&str>, attribute: &'static str| -> Result<TokenId> {
        value
            .ok_or_else(|| QuchainError::MissingAttribute {
                element: "span",
                attribute,
                context: id.clone(),
            })?
            .parse()
    };
    let from = boundary(span.from_ref(), "from")?;
    let to = boundary(span.to_ref(), "to")?;

    if !from.same_turn(&to) {
        return Err(QuchainError::CrossScopeRange {
            mention: id,
            from,
            to,
        });
    }

    let tokens = (from.word..=to.word).map(|w| from.with_word(w)).collect();
    Mention::new(id, tokens)
}

/// Map mention ids to the features of their `fs` description
fn read_features(doc: &TeiDocument) -> HashMap<String, MentionFeatures> {
    let mut features: HashMap<String, MentionFeatures> = HashMap::new();

    for fs in &doc.feature_structures {
        let Some(mention) = fs.mention_id() else {
            tracing::debug!(fs = ?fs.xml_id, "Feature structure names no mention");
            continue;
        };

        let entry = features.entry(mention.to_string()).or_default();
        for feature in &fs.features {
            match feature.name.as_str() {
                "NEW" => entry.novel = Some(feature.value == "YES"),
                "type" => entry.pronoun = Some(feature.value == "PR"),
                _ => {}
            }
        }
    }

    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use quchain_parser::TeiParser;

    fn document(spans: &str, fs: &str) -> TeiDocument {
        let xml = format!(
            r#"<TEI><text><body><div type="section">
              <u><w xml:id="s1.u1.w1">n'</w><w xml:id="s1.u1.w2">importe</w><w xml:id="s1.u1.w3">qui</w></u>
              <u><w xml:id="s1.u2.w1">il</w><w xml:id="s1.u2.w2">vient</w></u>
            </div></body></text>
            <standOff><spanGrp>{spans}</spanGrp><div type="unit-fs">{fs}</div></standOff></TEI>"#
        );
        TeiParser::new().parse_str(&xml).unwrap()
    }

    fn resolve(spans: &str, fs: &str) -> Result<MentionTable> {
        let doc = document(spans, fs);
        let words = WordIndex::build(&doc)?;
        MentionTable::resolve(&doc, &words)
    }

    #[test]
    fn test_continuous_span() {
        let table = resolve(r##"<span xml:id="m1" from="#s1.u1.w1" to="#s1.u1.w3"/>"##, "").unwrap();
        let m = table.get("m1").unwrap();
        assert_eq!(
            m.tokens(),
            &[TokenId::new(1, 1, 1), TokenId::new(1, 1, 2), TokenId::new(1, 1, 3)]
        );
    }

    #[test]
    fn test_discontinuous_span_is_sorted() {
        let table = resolve(
            r##"<span xml:id="m1" target="#s1.u2.w1 #s1.u1.w3"/>"##,
            "",
        )
        .unwrap();
        let m = table.get("m1").unwrap();
        assert_eq!(m.tokens(), &[TokenId::new(1, 1, 3), TokenId::new(1, 2, 1)]);
    }

    #[test]
    fn test_empty_target_falls_back_to_range() {
        let table = resolve(
            r##"<span xml:id="m1" target="" from="#s1.u2.w1" to="#s1.u2.w1"/>"##,
            "",
        )
        .unwrap();
        assert_eq!(table.get("m1").unwrap().tokens(), &[TokenId::new(1, 2, 1)]);
    }

    #[test]
    fn test_cross_turn_range_is_fatal() {
        let result = resolve(r##"<span xml:id="m1" from="#s1.u1.w3" to="#s1.u2.w1"/>"##, "");
        assert!(matches!(result, Err(QuchainError::CrossScopeRange { mention, .. }) if mention == "m1"));
    }

    #[test]
    fn test_unresolved_token_is_fatal() {
        let result = resolve(r##"<span xml:id="m1" from="#s1.u2.w1" to="#s1.u2.w4"/>"##, "");
        assert!(matches!(
            result,
            Err(QuchainError::UnresolvedToken { mention, token }) if mention == "m1" && token == "s1.u2.w3"
        ));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let result = resolve(r##"<span xml:id="m1" from="#s1.u2.w2" to="#s1.u2.w1"/>"##, "");
        assert!(matches!(result, Err(QuchainError::EmptyMention(id)) if id == "m1"));
    }

    #[test]
    fn test_missing_boundary() {
        let result = resolve(r##"<span xml:id="m1" from="#s1.u2.w2"/>"##, "");
        assert!(matches!(
            result,
            Err(QuchainError::MissingAttribute { attribute: "to", .. })
        ));
    }

    #[test]
    fn test_features() {
        let table = resolve(
            r##"<span xml:id="m1" target="#s1.u1.w3"/><span xml:id="m2" target="#s1.u2.w1"/>"##,
            r#"<fs xml:id="m1-fs"><f name="NEW"><string>YES</string></f><f name="type"><string>GN</string></f></fs>
               <fs xml:id="m2-fs"><f name="NEW"><string>NO</string></f></fs>"#,
        )
        .unwrap();

        assert!(table.is_novel("m1").unwrap());
        assert!(!table.is_pronoun("m1").unwrap());
        assert!(!table.is_novel("m2").unwrap());
        assert!(matches!(
            table.is_pronoun("m2"),
            Err(QuchainError::MissingFeature { feature: "type", .. })
        ));
        assert!(matches!(
            table.is_novel("m3"),
            Err(QuchainError::MissingFeature { feature: "NEW", .. })
        ));
    }
}
