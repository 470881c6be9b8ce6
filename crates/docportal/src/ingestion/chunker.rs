//! Text chunking with exact spans and bounded overlap
//!
//! Chunks are byte spans of the extracted text. Boundaries prefer sentence
//! ends, then word boundaries, then character boundaries for words longer
//! than a chunk. Overlap is filled word by word, so long sentences still
//! share context with their neighbours. Consecutive chunks never leave a gap,
//! so the source text can always be rebuilt from the chunks.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Chunk, DocumentId, TextBlock};

/// Separator placed between text blocks when they are joined
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Half-open byte range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Text blocks joined into one string, remembering where each page begins
#[derive(Debug, Clone)]
pub struct JoinedText {
    /// Full extracted text
    pub text: String,
    /// (byte offset, page number) for every block start
    page_starts: Vec<(usize, Option<u32>)>,
}

impl JoinedText {
    /// Join blocks in order with [`BLOCK_SEPARATOR`]
    pub fn from_blocks(blocks: &[TextBlock]) -> Self {
        let mut text = String::new();
        let mut page_starts = Vec::with_capacity(blocks.len());

        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                text.push_str(BLOCK_SEPARATOR);
            }
            page_starts.push((text.len(), block.page_number));
            text.push_str(&block.text);
        }

        Self { text, page_starts }
    }

    /// Page number of the block containing `offset`
    pub fn page_at(&self, offset: usize) -> Option<u32> {
        let idx = self.page_starts.partition_point(|(start, _)| *start <= offset);
        if idx == 0 {
            return None;
        }
        self.page_starts[idx - 1].1
    }
}

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in bytes
    chunk_size: usize,
    /// Maximum overlap between consecutive chunks in bytes
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. Overlap is clamped below the chunk size.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Create a chunker from validated configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.chunk_size, config.chunk_overlap))
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk ordered text blocks for a document
    pub fn chunk_blocks(
        &self,
        document_id: &DocumentId,
        blocks: &[TextBlock],
    ) -> (JoinedText, Vec<Chunk>) {
        let joined = JoinedText::from_blocks(blocks);

        let chunks = self
            .split(&joined.text)
            .into_iter()
            .enumerate()
            .map(|(position, span)| {
                Chunk::new(
                    document_id.clone(),
                    position as u32,
                    joined.page_at(first_visible(&joined.text, span)),
                    span.start,
                    span.end,
                    joined.text[span.start..span.end].to_string(),
                )
            })
            .collect();

        (joined, chunks)
    }

    /// Split text into chunk spans
    pub fn split(&self, text: &str) -> Vec<Span> {
        let units = self.units(text);
        let mut spans = Vec::new();

        if units.is_empty() {
            return spans;
        }

        let mut first = 0usize;
        let mut prev_end = 0usize;
        loop {
            let start = units[first].span.start;
            let mut next = first;
            while next < units.len()
                && (next == first || units[next].span.end - start <= self.chunk_size)
            {
                next += 1;
            }

            // Prefer ending on a sentence that reaches past the previous chunk
            if next < units.len() {
                if let Some(cut) = (first + 1..=next).rev().find(|&j| {
                    units[j - 1].sentence_end && units[j - 1].span.end > prev_end
                }) {
                    next = cut;
                }
            }

            let end = units[next - 1].span.end;
            spans.push(Span { start, end });

            if next == units.len() {
                break;
            }

            // The next chunk starts at a word inside the overlap window that
            // still leaves room for the unit that did not fit. Sentence starts
            // win over the earliest word.
            let window_start = end.saturating_sub(self.overlap);
            let following_end = units[next].span.end;
            let candidates: Vec<usize> = (first + 1..next)
                .filter(|&k| {
                    let unit = &units[k];
                    unit.wordlike
                        && unit.span.start >= window_start
                        && following_end - unit.span.start <= self.chunk_size
                })
                .collect();

            first = candidates
                .iter()
                .copied()
                .find(|&k| units[k].sentence_start)
                .or_else(|| candidates.first().copied())
                .unwrap_or(next);
            prev_end = end;
        }

        spans
    }

    /// Contiguous word-level pieces covering the text, none longer than a
    /// chunk unless it is a single character
    fn units(&self, text: &str) -> Vec<Unit> {
        let mut units = Vec::new();

        for (start, sentence) in text.split_sentence_bound_indices() {
            let sentence_first = units.len();

            for (offset, word) in sentence.split_word_bound_indices() {
                let word_start = start + offset;
                if word.len() <= self.chunk_size {
                    units.push(Unit::new(word_start, word));
                } else {
                    self.push_char_units(word, word_start, &mut units);
                }
            }

            if units.len() > sentence_first {
                units[sentence_first].sentence_start = true;
                if let Some(last) = units.last_mut() {
                    last.sentence_end = true;
                }
            }
        }

        units
    }

    /// Split an oversize word on character boundaries
    fn push_char_units(&self, word: &str, base: usize, units: &mut Vec<Unit>) {
        let mut piece_start = 0usize;
        let mut piece_end = 0usize;

        for (i, ch) in word.char_indices() {
            let next = i + ch.len_utf8();
            if next - piece_start > self.chunk_size && piece_end > piece_start {
                units.push(Unit::new(base + piece_start, &word[piece_start..piece_end]));
                piece_start = piece_end;
            }
            piece_end = next;
        }

        if piece_end > piece_start {
            units.push(Unit::new(base + piece_start, &word[piece_start..piece_end]));
        }
    }
}

/// Smallest piece the chunker packs
#[derive(Debug, Clone, Copy)]
struct Unit {
    span: Span,
    /// Contains a letter or digit, so a chunk may start here
    wordlike: bool,
    sentence_start: bool,
    sentence_end: bool,
}

impl Unit {
    fn new(start: usize, piece: &str) -> Self {
        Self {
            span: Span {
                start,
                end: start + piece.len(),
            },
            wordlike: piece.chars().any(char::is_alphanumeric),
            sentence_start: false,
            sentence_end: false,
        }
    }
}

/// Offset of the first non-whitespace byte in `span`, so a chunk that begins
/// on a block separator is attributed to the block that follows it
fn first_visible(text: &str, span: Span) -> usize {
    text[span.start..span.end]
        .find(|c: char| !c.is_whitespace())
        .map_or(span.start, |i| span.start + i)
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}
