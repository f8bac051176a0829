//! CoNLL-U export of speech turns
//!
//! Flattens every turn into one sentence block with one line per word.
//! Only ID, FORM and MISC (`id=<xml:id>`) are filled; the other columns
//! are left as `_` for a downstream tagger.

use std::path::{Path, PathBuf};

use crate::{ParserError, Result, TeiDocument};

pub const COLUMNS_HEADER: &str =
    "# global.columns = ID FORM LEMMA UPOS XPOS FEATS HEAD DEPREL DEPS MISC";

/// Render a document; `doc_id` prefixes every `sent_id`
pub fn to_conllu(doc: &TeiDocument, doc_id: &str) -> String {
    let mut out = String::new();
    out.push_str(COLUMNS_HEADER);
    out.push('\n');

    for (j, turn) in doc.turns.iter().enumerate() {
        out.push_str(&format!("# sent_id = {doc_id}_{j}\n"));
        out.push_str(&format!("# text = {}\n", turn.flattened_text()));

        for (i, word) in turn.words().enumerate() {
            out.push_str(&format!(
                "{}\t{}{}\tid={}\n",
                i + 1,
                word.text,
                "\t_".repeat(7),
                word.xml_id.as_deref().unwrap_or_default()
            ));
        }
        out.push('\n');
    }

    out
}

/// Write `<stem>.conllu` for `source` into `output_dir`
///
/// Returns the path written.
pub fn export_file(doc: &TeiDocument, source: &Path, output_dir: &Path) -> Result<PathBuf> {
    let doc_id = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let target = output_dir.join(format!("{doc_id}.conllu"));

    std::fs::write(&target, to_conllu(doc, doc_id)).map_err(|e| ParserError::IoError {
        path: target.display().to_string(),
        source: e,
    })?;

    tracing::debug!(path = %target.display(), turns = doc.turns.len(), "CoNLL-U written");
    Ok(target)
}
