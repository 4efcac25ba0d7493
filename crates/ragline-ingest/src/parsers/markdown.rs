//! Markdown document parser.

use super::{parse_source, read_text, Extraction, ParserOptions};
use crate::cache::ContentCache;
use ragline_core::{decode_params, CoreResult, ParsedDocument, Parser, SourceRef};
use pulldown_cmark::{Event, HeadingLevel, Tag};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct MarkdownParams {
    #[serde(flatten)]
    options: ParserOptions,
    preserve_code_blocks: bool,
}

impl Default for MarkdownParams {
    fn default() -> Self {
        Self {
            options: ParserOptions::default(),
            preserve_code_blocks: true,
        }
    }
}

/// Markdown to plain text, keeping headings as their own paragraphs.
pub struct MarkdownParser {
    preserve_code_blocks: bool,
    cache: Option<ContentCache>,
}

/// What a single pass over the markdown events collects.
#[derive(Default)]
struct Rendered {
    text: String,
    title: Option<String>,
    headings: Vec<String>,
    links: Vec<String>,
}

impl MarkdownParser {
    pub fn new(options: ParserOptions) -> CoreResult<Self> {
        Ok(Self {
            preserve_code_blocks: true,
            cache: options.open_cache()?,
        })
    }

    pub fn from_params(params: &serde_json::Value) -> CoreResult<Self> {
        let params: MarkdownParams = decode_params("MarkdownParser", params)?;
        Ok(Self {
            preserve_code_blocks: params.preserve_code_blocks,
            cache: params.options.open_cache()?,
        })
    }

    pub fn cache(&self) -> Option<&ContentCache> {
        self.cache.as_ref()
    }

    fn render(&self, markdown: &str) -> Rendered {
        let mut out = Rendered::default();
        let mut heading: Option<(HeadingLevel, String)> = None;

        for event in pulldown_cmark::Parser::new(markdown) {
            match event {
                Event::Start(Tag::Heading(level, _, _)) => {
                    heading = Some((level, String::new()));
                }
                Event::End(Tag::Heading(_, _, _)) => {
                    if let Some((level, text)) = heading.take() {
                        let text = text.trim().to_string();
                        if level == HeadingLevel::H1 && out.title.is_none() {
                            out.title = Some(text.clone());
                        }
                        out.text.push_str(&text);
                        out.text.push_str("\n\n");
                        out.headings.push(text);
                    }
                }
                Event::Start(Tag::CodeBlock(_)) if self.preserve_code_blocks => {
                    out.text.push_str("\n```\n");
                }
                Event::End(Tag::CodeBlock(_)) if self.preserve_code_blocks => {
                    out.text.push_str("```\n\n");
                }
                Event::Start(Tag::Link(_, dest, _)) => out.links.push(dest.to_string()),
                Event::End(Tag::Paragraph) => out.text.push_str("\n\n"),
                Event::End(Tag::List(_)) | Event::End(Tag::Item) => out.text.push('\n'),
                Event::Start(Tag::Item) => out.text.push_str("- "),
                Event::Text(t) => match heading.as_mut() {
                    Some((_, text)) => text.push_str(&t),
                    None => out.text.push_str(&t),
                },
                Event::Code(code) => {
                    let target = match heading.as_mut() {
                        Some((_, text)) => text,
                        None => &mut out.text,
                    };
                    target.push('`');
                    target.push_str(&code);
                    target.push('`');
                }
                Event::SoftBreak | Event::HardBreak => out.text.push('\n'),
                _ => {}
            }
        }

        out.text = out.text.trim().to_string();
        out
    }

    fn convert(&self, path: &Path) -> crate::IngestResult<Extraction> {
        let raw = read_text(path)?;
        let rendered = self.render(&raw);
        let title = rendered.title.or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        });

        Ok(Extraction {
            metadata: serde_json::json!({
                "format": "markdown",
                "title": title,
                "headings": rendered.headings,
                "links": rendered.links,
                "original_length": raw.len(),
            }),
            text: rendered.text,
        })
    }
}

impl Parser for MarkdownParser {
    fn parse(&self, source: &SourceRef) -> CoreResult<Vec<ParsedDocument>> {
        parse_source(self, self.cache.as_ref(), source, |path| self.convert(path))
    }

    fn extensions(&self) -> &[&str] {
        &["md", "markdown", "mdown", "mkd"]
    }

    fn name(&self) -> &str {
        "MarkdownParser"
    }
}
