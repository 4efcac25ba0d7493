//! PDF document parser.

use super::{parse_source, Extraction, ParserOptions};
use crate::cache::ContentCache;
use crate::error::{IngestError, IngestResult};
use ragline_core::{decode_params, CoreResult, ParsedDocument, Parser, SourceRef};
use std::path::Path;
use tracing::debug;

/// Extracts the text layer of a PDF. This is the slow parser the cache exists for.
pub struct PdfParser {
    cache: Option<ContentCache>,
}

impl PdfParser {
    pub fn new(options: ParserOptions) -> CoreResult<Self> {
        Ok(Self {
            cache: options.open_cache()?,
        })
    }

    pub fn from_params(params: &serde_json::Value) -> CoreResult<Self> {
        Self::new(decode_params("PdfParser", params)?)
    }

    fn convert(&self, path: &Path) -> IngestResult<Extraction> {
        debug!("Parsing PDF: {:?}", path);

        let raw = pdf_extract::extract_text(path).map_err(|e| IngestError::ParseError {
            path: path.to_path_buf(),
            message: format!("Failed to extract text from PDF: {}", e),
        })?;
        let pages = raw.matches('\x0C').count().max(1);
        let text = clean_pdf_text(&raw);

        debug!("Extracted {} characters from PDF", text.len());

        Ok(Extraction {
            metadata: serde_json::json!({
                "format": "pdf",
                "title": path.file_stem().and_then(|n| n.to_str()),
                "length": text.len(),
                "pages": pages,
            }),
            text,
        })
    }
}

impl Parser for PdfParser {
    fn parse(&self, source: &SourceRef) -> CoreResult<Vec<ParsedDocument>> {
        parse_source(self, self.cache.as_ref(), source, |path| self.convert(path))
    }

    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn name(&self) -> &str {
        "PdfParser"
    }
}

/// Trim lines, collapse runs of blank lines and turn form feeds into page rules.
fn clean_pdf_text(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().replace('\x0C', "\n\n---\n\n")
}
