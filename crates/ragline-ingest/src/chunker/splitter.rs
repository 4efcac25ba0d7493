//! Character-budget text splitting on natural boundaries.

use crate::error::{IngestError, IngestResult};
use serde::{Deserialize, Serialize};

/// Size settings for a splitter, measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Target size of each piece.
    pub chunk_size: usize,
    /// Characters carried over from the end of one piece into the next.
    pub chunk_overlap: usize,
    /// A piece is not closed until it holds at least this many characters.
    pub min_chunk_size: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            min_chunk_size: 100,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> IngestResult<()> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidSettings(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(IngestError::InvalidSettings(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// A unit of text together with the separator that joins it to its predecessor.
struct Unit<'a> {
    text: &'a str,
    separator: &'static str,
}

/// The piece under construction.
#[derive(Default)]
struct Window {
    text: String,
    /// False while the window only holds carried-over overlap.
    fresh: bool,
}

impl Window {
    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn push(&mut self, unit: &Unit<'_>) {
        if !self.text.is_empty() {
            self.text.push_str(unit.separator);
        }
        self.text.push_str(unit.text);
        self.fresh = true;
    }
}

/// Splits text into pieces of roughly `chunk_size` characters.
///
/// Paragraphs (blank-line separated) are kept whole when they fit. Longer
/// paragraphs fall back to sentences, and text without sentence breaks is cut
/// at the character budget.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitConfig,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            config: SplitConfig::default(),
        }
    }
}

impl TextSplitter {
    pub fn new(config: SplitConfig) -> IngestResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if trimmed.chars().count() <= self.config.chunk_size {
            return vec![trimmed.to_string()];
        }

        let mut pieces = Vec::new();
        let mut window = Window::default();

        for unit in self.units(trimmed) {
            let unit_len = unit.text.chars().count();
            let joined_len = window.len() + unit.separator.chars().count() + unit_len;

            if !window.text.is_empty() && joined_len > self.config.chunk_size {
                if !window.fresh {
                    // Only overlap left; the next unit would not fit beside it.
                    window.text.clear();
                } else if window.len() >= self.config.min_chunk_size {
                    let tail = self.overlap_tail(&window.text);
                    pieces.push(window.text.trim().to_string());
                    window = Window {
                        text: tail,
                        fresh: false,
                    };
                    if window.len() + unit.separator.chars().count() + unit_len
                        > self.config.chunk_size
                    {
                        window.text.clear();
                    }
                }
            }
            window.push(&unit);
        }

        if window.fresh && !window.text.trim().is_empty() {
            pieces.push(window.text.trim().to_string());
        }
        pieces
    }

    /// Break text into paragraphs, sentences or hard cuts so that every unit fits.
    fn units<'a>(&self, text: &'a str) -> Vec<Unit<'a>> {
        let mut units = Vec::new();
        for para in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            if para.chars().count() <= self.config.chunk_size {
                units.push(Unit {
                    text: para,
                    separator: "\n\n",
                });
                continue;
            }

            let mut separator = "\n\n";
            for sentence in split_sentences(para) {
                if sentence.chars().count() <= self.config.chunk_size {
                    units.push(Unit {
                        text: sentence,
                        separator,
                    });
                } else {
                    for cut in hard_cuts(sentence, self.config.chunk_size) {
                        units.push(Unit {
                            text: cut,
                            separator,
                        });
                        separator = " ";
                    }
                }
                separator = " ";
            }
        }
        units
    }

    /// The last `chunk_overlap` characters, starting on a word boundary when possible.
    fn overlap_tail(&self, text: &str) -> String {
        if self.config.chunk_overlap == 0 {
            return String::new();
        }
        let text = text.trim_end();
        let total = text.chars().count();
        let skip = total.saturating_sub(self.config.chunk_overlap);
        let tail: String = text.chars().skip(skip).collect();
        if skip == 0 {
            return tail;
        }
        match tail.find(char::is_whitespace) {
            Some(idx) => tail[idx..].trim_start().to_string(),
            None => tail,
        }
    }
}

/// Split text after `.`, `!` or `?` when followed by whitespace or the end.
pub(super) fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let end = i + c.len_utf8();
        let at_boundary = match chars.peek() {
            None => true,
            Some((_, next)) => next.is_whitespace(),
        };
        if at_boundary {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Cut text into slices of at most `size` characters on char boundaries.
fn hard_cuts(text: &str, size: usize) -> Vec<&str> {
    let mut cuts = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == size {
            cuts.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        cuts.push(&text[start..]);
    }
    cuts
}
