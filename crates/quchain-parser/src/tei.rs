//! Event-driven reader for TEI corpus documents
//!
//! Walks the document once with quick-xml and collects the raw layers.
//! Element and attribute names are compared by local name, so `tei:type`
//! and `type` are the same attribute and `xml:id` is read as `id`.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::{
    Feature, FeatureStructure, LinkAnnotation, ParserError, RawToken, Result, SpanAnnotation,
    TeiDocument, TokenKind, Turn,
};

/// Document plus the regions seen while reading it
#[derive(Debug, Default)]
pub(crate) struct ReadDocument {
    pub document: TeiDocument,
    pub has_section: bool,
    pub has_standoff: bool,
}

/// What an open element means to the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    Section,
    UnitFs,
    StandOff,
    Turn,
    Token,
    SpanGrp,
    LinkGrp,
    Fs,
    Feature,
    FeatureValue,
    Other,
}

#[derive(Debug, Default)]
struct FeatureBuilder {
    name: String,
    /// Text of the first child element, once that child is seen
    value: Option<String>,
    /// Text directly inside `f`, used when it has no child
    direct: String,
}

impl FeatureBuilder {
    fn finish(self) -> Feature {
        let value = match self.value {
            Some(value) => value.trim().to_string(),
            None => self.direct.trim().to_string(),
        };
        Feature {
            name: self.name,
            value,
        }
    }
}

#[derive(Debug, Default)]
struct Reading {
    read: ReadDocument,
    open: Vec<Open>,
    seen_root: bool,
    turn: Option<Turn>,
    token: Option<RawToken>,
    fs: Option<FeatureStructure>,
    feature: Option<FeatureBuilder>,
}

/// Attributes of one element, keyed by local name
struct Attributes(HashMap<String, String>);

impl Attributes {
    fn read(e: &BytesStart) -> std::result::Result<Self, quick_xml::Error> {
        let mut map = HashMap::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            map.entry(key).or_insert(value);
        }
        Ok(Self(map))
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    fn take(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }
}

impl Reading {
    fn inside(&self, region: Open) -> bool {
        self.open.contains(&region)
    }

    fn open_element(&mut self, e: &BytesStart) -> std::result::Result<Open, quick_xml::Error> {
        self.seen_root = true;
        let mut attrs = Attributes::read(e)?;

        let open = match e.local_name().as_ref() {
            b"div" => match attrs.get("type") {
                Some("section") => {
                    self.read.has_section = true;
                    Open::Section
                }
                Some("unit-fs") => Open::UnitFs,
                _ => Open::Other,
            },
            b"standOff" => {
                self.read.has_standoff = true;
                Open::StandOff
            }
            b"u" if self.turn.is_none() => {
                self.turn = Some(Turn {
                    in_section: self.inside(Open::Section),
                    ..Default::default()
                });
                Open::Turn
            }
            name @ (b"w" | b"pc") if self.turn.is_some() && self.token.is_none() => {
                let kind = if name == b"w" {
                    TokenKind::Word
                } else {
                    TokenKind::Punct
                };
                self.token = Some(RawToken {
                    kind,
                    xml_id: attrs.take("id"),
                    text: String::new(),
                });
                Open::Token
            }
            b"spanGrp" => Open::SpanGrp,
            b"span" if self.inside(Open::SpanGrp) => {
                self.read.document.spans.push(SpanAnnotation {
                    xml_id: attrs.take("id"),
                    target: attrs.take("target"),
                    from: attrs.take("from"),
                    to: attrs.take("to"),
                });
                Open::Other
            }
            b"linkGrp" => Open::LinkGrp,
            b"link" if self.inside(Open::LinkGrp) => {
                self.read.document.links.push(LinkAnnotation {
                    xml_id: attrs.take("id"),
                    target: attrs.take("target"),
                });
                Open::Other
            }
            b"fs" if self.inside(Open::UnitFs) && self.fs.is_none() => {
                self.fs = Some(FeatureStructure {
                    xml_id: attrs.take("id"),
                    features: Vec::new(),
                });
                Open::Fs
            }
            b"f" if self.fs.is_some() && self.feature.is_none() => {
                self.feature = Some(FeatureBuilder {
                    name: attrs.take("name").unwrap_or_default(),
                    ..Default::default()
                });
                Open::Feature
            }
            _ if self.open.last() == Some(&Open::Feature) => match &mut self.feature {
                Some(feature) if feature.value.is_none() => {
                    feature.value = Some(String::new());
                    Open::FeatureValue
                }
                _ => Open::Other,
            },
            _ => Open::Other,
        };

        Ok(open)
    }

    fn close_element(&mut self) {
        match self.open.pop() {
            Some(Open::Token) => {
                if let (Some(mut token), Some(turn)) = (self.token.take(), self.turn.as_mut()) {
                    token.text = token.text.trim().to_string();
                    turn.tokens.push(token);
                }
            }
            Some(Open::Turn) => {
                if let Some(turn) = self.turn.take() {
                    self.read.document.turns.push(turn);
                }
            }
            Some(Open::Feature) => {
                if let (Some(feature), Some(fs)) = (self.feature.take(), self.fs.as_mut()) {
                    fs.features.push(feature.finish());
                }
            }
            Some(Open::Fs) => {
                if let Some(fs) = self.fs.take() {
                    self.read.document.feature_structures.push(fs);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(token) = &mut self.token {
            token.text.push_str(text);
        }
        if let Some(turn) = &mut self.turn {
            turn.text.push_str(text);
        }
        if let Some(feature) = &mut self.feature {
            if self.open.contains(&Open::FeatureValue) {
                if let Some(value) = &mut feature.value {
                    value.push_str(text);
                }
            } else if self.open.last() == Some(&Open::Feature) {
                feature.direct.push_str(text);
            }
        }
    }
}

fn xml_error(position: u64, message: impl ToString) -> ParserError {
    ParserError::Xml {
        position,
        message: message.to_string(),
    }
}

/// Read a whole document held in memory
pub(crate) fn read_document(xml: &str) -> Result<ReadDocument> {
    let mut reader = Reader::from_str(xml);
    let mut state = Reading::default();

    loop {
        let position = reader.buffer_position() as u64;
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let open = state
                    .open_element(&e)
                    .map_err(|err| xml_error(position, err))?;
                state.open.push(open);
            }
            Ok(Event::Empty(e)) => {
                let open = state
                    .open_element(&e)
                    .map_err(|err| xml_error(position, err))?;
                state.open.push(open);
                state.close_element();
            }
            Ok(Event::End(_)) => state.close_element(),
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|err| xml_error(position, err))?;
                state.text(&text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                state.text(&text);
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(xml_error(reader.buffer_position() as u64, err)),
            _ => {}
        }
    }

    if !state.seen_root {
        return Err(xml_error(0, "document has no root element"));
    }
    if !state.open.is_empty() {
        return Err(xml_error(
            reader.buffer_position() as u64,
            format!("{} unclosed element(s) at end of document", state.open.len()),
        ));
    }

    Ok(state.read)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0" xmlns:tei="http://www.tei-c.org/ns/1.0">
  <teiHeader/>
  <text>
    <body>
      <div tei:type="section">
        <u who="#spk1">
          <w xml:id="s1.u1.w2">est</w>
          <w xml:id="s1.u1.w1">qui</w>
          <pc xml:id="s1.u1.w3">?</pc>
        </u>
      </div>
      <u><w xml:id="s0.u0.w1">hors</w></u>
    </body>
  </text>
  <standOff>
    <spanGrp>
      <span xml:id="m1" tei:from="#s1.u1.w1" tei:to="#s1.u1.w2"/>
      <span xml:id="m2" target="#s1.u1.w1 #s1.u1.w3"/>
    </spanGrp>
    <div type="unit-fs">
      <fs xml:id="m1-fs">
        <f name="NEW"><string>YES</string></f>
        <f name="type"><symbol>PR</symbol><string>ignored</string></f>
        <f name="note">direct &amp; plain</f>
      </fs>
    </div>
    <linkGrp>
      <link xml:id="r-COREF-1" target="#m1 #m2"/>
    </linkGrp>
  </standOff>
</TEI>"##;

    #[test]
    fn test_reads_all_layers() {
        let read = read_document(DOC).unwrap();
        assert!(read.has_section);
        assert!(read.has_standoff);

        let doc = read.document;
        assert_eq!(doc.turns.len(), 2);
        assert!(doc.turns[0].in_section);
        assert!(!doc.turns[1].in_section);

        let tokens = &doc.turns[0].tokens;
        assert_eq!(tokens.len(), 3);
        // Annotation order is kept here
        assert_eq!(tokens[0].xml_id.as_deref(), Some("s1.u1.w2"));
        assert_eq!(tokens[0].text, "est");
        assert_eq!(tokens[2].kind, TokenKind::Punct);
        assert_eq!(doc.turns[0].flattened_text(), "est qui ?");

        assert_eq!(doc.spans.len(), 2);
        assert_eq!(doc.spans[0].from.as_deref(), Some("#s1.u1.w1"));
        assert_eq!(doc.spans[0].target, None);
        assert_eq!(doc.spans[1].target_refs(), vec!["s1.u1.w1", "s1.u1.w3"]);

        assert_eq!(doc.links.len(), 1);
        assert_eq!(doc.links[0].xml_id.as_deref(), Some("r-COREF-1"));
    }

    #[test]
    fn test_feature_values() {
        let doc = read_document(DOC).unwrap().document;
        let fs = &doc.feature_structures[0];
        assert_eq!(fs.mention_id(), Some("m1"));
        assert_eq!(fs.feature("NEW"), Some("YES"));
        // Only the first child element counts
        assert_eq!(fs.feature("type"), Some("PR"));
        assert_eq!(fs.feature("note"), Some("direct & plain"));
    }

    #[test]
    fn test_malformed_xml() {
        let result = read_document("<TEI><text><u></text></TEI>");
        assert!(matches!(result, Err(ParserError::Xml { .. })));
    }

    #[test]
    fn test_unclosed_and_empty() {
        assert!(matches!(read_document("<TEI><text>"), Err(ParserError::Xml { .. })));
        assert!(matches!(read_document(""), Err(ParserError::Xml { .. })));
    }
}
