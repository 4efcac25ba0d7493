//! Plain text and source code parser.

use super::{parse_source, read_text, Extraction, ParserOptions};
use crate::cache::ContentCache;
use ragline_core::{decode_params, CoreResult, ParsedDocument, Parser, SourceRef};
use std::path::Path;

const PROSE: &[&str] = &["txt", "text", "log", "org", "rst"];

/// Extension → language for the code files this parser accepts.
const LANGUAGES: &[(&str, &str)] = &[
    ("rs", "rust"),
    ("py", "python"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("go", "go"),
    ("c", "c"),
    ("h", "c"),
    ("cpp", "cpp"),
    ("hpp", "cpp"),
    ("java", "java"),
    ("rb", "ruby"),
    ("sh", "shell"),
    ("bash", "shell"),
    ("json", "json"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("toml", "toml"),
    ("html", "html"),
    ("css", "css"),
    ("sql", "sql"),
    ("swift", "swift"),
    ("kt", "kotlin"),
    ("php", "php"),
    ("lua", "lua"),
];

pub struct TextParser {
    extensions: Vec<&'static str>,
    cache: Option<ContentCache>,
}

impl TextParser {
    pub fn new(options: ParserOptions) -> CoreResult<Self> {
        let extensions = PROSE
            .iter()
            .copied()
            .chain(LANGUAGES.iter().map(|(ext, _)| *ext))
            .collect();
        Ok(Self {
            extensions,
            cache: options.open_cache()?,
        })
    }

    pub fn from_params(params: &serde_json::Value) -> CoreResult<Self> {
        Self::new(decode_params("TextParser", params)?)
    }

    fn detect_language(extension: &str) -> Option<&'static str> {
        let extension = extension.to_lowercase();
        LANGUAGES
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, lang)| *lang)
    }

    fn convert(&self, path: &Path) -> crate::IngestResult<Extraction> {
        let content = read_text(path)?;
        let language = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::detect_language);

        let mut metadata = serde_json::json!({
            "format": if language.is_some() { "code" } else { "text" },
            "title": path.file_name().and_then(|n| n.to_str()),
            "length": content.len(),
            "lines": content.lines().count(),
        });
        if let Some(lang) = language {
            metadata["language"] = serde_json::json!(lang);
        }

        Ok(Extraction {
            text: content,
            metadata,
        })
    }
}

impl Parser for TextParser {
    fn parse(&self, source: &SourceRef) -> CoreResult<Vec<ParsedDocument>> {
        parse_source(self, self.cache.as_ref(), source, |path| self.convert(path))
    }

    fn extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn name(&self) -> &str {
        "TextParser"
    }
}
