//! Fast conversion: text-like documents pass through as Markdown.
//!
//! Markdown uploads are returned unchanged; other text formats are
//! wrapped verbatim. Binary formats are refused with a hint to use
//! advanced mode rather than producing mojibake artifacts.

use async_trait::async_trait;

use crate::convert::{Converter, Markdown, SourceDocument};
use crate::error::{MarkifyError, Result};

/// Extensions accepted as already-textual content.
const TEXT_EXTENSIONS: &[&str] = &[
    "md", "markdown", "txt", "text", "csv", "tsv", "json", "html", "htm", "xml", "yaml", "yml",
    "toml", "rst", "log",
];

pub struct PlainTextConverter;

impl PlainTextConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Converter for PlainTextConverter {
    async fn convert(&self, doc: SourceDocument) -> Result<Markdown> {
        match doc.extension().as_deref() {
            Some(ext) if TEXT_EXTENSIONS.contains(&ext) => {}
            Some(ext) => {
                return Err(MarkifyError::Conversion(format!(
                    "fast mode cannot parse '.{ext}' files; use advanced mode"
                )))
            }
            None => {
                return Err(MarkifyError::Conversion(
                    "fast mode requires a file extension to identify text content".into(),
                ))
            }
        }

        let title = doc.stem();
        let text = String::from_utf8(doc.content).map_err(|_| {
            MarkifyError::Conversion(format!("'{}' is not valid UTF-8 text", doc.filename))
        })?;

        Ok(Markdown { title, text })
    }
}
