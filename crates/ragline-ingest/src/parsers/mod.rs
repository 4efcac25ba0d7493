//! Document parsers for various file types.
//!
//! Every parser implements [`ragline_core::Parser`] and may carry a
//! [`ContentCache`] so that converting the same unmodified file twice only
//! does the work once.

mod markdown;
mod pdf;
mod text;

pub use markdown::MarkdownParser;
pub use pdf::PdfParser;
pub use text::TextParser;

use crate::cache::ContentCache;
use crate::error::{IngestError, IngestResult};
use ragline_config::AppPaths;
use ragline_core::{CoreError, CoreResult, ParsedDocument, Parser, SourceRef, PLAN_NAME_KEY};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parameters shared by every parser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    pub enable_cache: bool,
    /// Defaults to the platform cache directory.
    pub cache_dir: Option<PathBuf>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            enable_cache: true,
            cache_dir: None,
        }
    }
}

impl ParserOptions {
    /// Options with caching turned off.
    pub fn uncached() -> Self {
        Self {
            enable_cache: false,
            cache_dir: None,
        }
    }

    /// Options caching under `dir`.
    pub fn cached_in(dir: impl Into<PathBuf>) -> Self {
        Self {
            enable_cache: true,
            cache_dir: Some(dir.into()),
        }
    }

    pub fn open_cache(&self) -> IngestResult<Option<ContentCache>> {
        if !self.enable_cache {
            return Ok(None);
        }
        let dir = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => {
                AppPaths::new()
                    .ok_or(ragline_config::ConfigError::NoConfigDir)?
                    .cache_dir
            }
        };
        ContentCache::open(dir).map(Some)
    }
}

/// Text and parser-specific metadata produced by one conversion.
struct Extraction {
    text: String,
    metadata: serde_json::Value,
}

/// Shared parse flow: validate, consult the cache, convert, then tag the
/// document with its plan, parser and source path.
fn parse_source(
    parser: &dyn Parser,
    cache: Option<&ContentCache>,
    source: &SourceRef,
    convert: impl FnOnce(&Path) -> IngestResult<Extraction>,
) -> CoreResult<Vec<ParsedDocument>> {
    let path = source.path.as_path();
    if !parser.validate(path) {
        return Err(CoreError::Unsupported(path.to_path_buf()));
    }

    let cached = match cache {
        Some(cache) => cache.get(path, parser.name())?,
        None => None,
    };

    let extraction = match cached {
        Some(hit) => {
            debug!("Using cached conversion of {:?}", path);
            Extraction {
                text: hit.text,
                metadata: hit.metadata.additional_metadata,
            }
        }
        None => {
            let extraction = convert(path)?;
            if let Some(cache) = cache {
                if let Err(e) = cache.put(path, parser.name(), &extraction.text, extraction.metadata.clone()) {
                    warn!("Failed to cache {:?}: {}", path, e);
                }
            }
            extraction
        }
    };

    let document = ParsedDocument::new(extraction.text)
        .with_metadata(extraction.metadata)
        .with_metadata(json!({
            PLAN_NAME_KEY: source.name,
            "parser": parser.name(),
            "source_path": path.display().to_string(),
        }));
    Ok(vec![document])
}

fn read_text(path: &Path) -> IngestResult<String> {
    if !path.exists() {
        return Err(IngestError::FileNotFound(path.to_path_buf()));
    }
    Ok(std::fs::read_to_string(path)?)
}
