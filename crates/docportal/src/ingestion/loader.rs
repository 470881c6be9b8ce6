//! PDF loading and text extraction

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::types::TextBlock;

/// Magic bytes every PDF file starts with
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Three or more consecutive newlines
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Character replacements applied to extracted text
const REPLACEMENTS: &[(char, &str)] = &[
    ('\0', ""),
    ('\u{00A0}', " "), // Non-breaking space
    ('\u{2002}', " "), // En space
    ('\u{2003}', " "), // Em space
    ('\u{2009}', " "), // Thin space
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\r', ""),
];

/// Clean up extracted PDF text
pub fn cleanup_pdf_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => result.push_str(to),
            None => result.push(ch),
        }
    }

    let trimmed = result
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");

    BLANK_RUNS.replace_all(trimmed.trim(), "\n\n").into_owned()
}

/// SHA-256 hex digest of raw bytes
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Result of loading a PDF
#[derive(Debug, Clone)]
pub struct LoadedPdf {
    /// Extracted text blocks in reading order
    pub blocks: Vec<TextBlock>,
    /// Number of pages in the file
    pub total_pages: Option<u32>,
    /// SHA-256 of the uploaded bytes
    pub content_hash: String,
}

/// Extracts text from uploaded PDF bytes
#[derive(Debug, Clone)]
pub struct PdfLoader {
    extract_timeout: Duration,
}

impl PdfLoader {
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            extract_timeout: Duration::from_secs(config.extract_timeout_secs),
        }
    }

    /// Cheap checks done before any parsing: extension and magic bytes
    pub fn validate(filename: &str, data: &[u8]) -> Result<()> {
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(Error::invalid_file(filename, "only .pdf files are accepted"));
        }
        if !data.starts_with(PDF_MAGIC) {
            return Err(Error::invalid_file(filename, "file does not start with a PDF header"));
        }
        Ok(())
    }

    /// Load a PDF: validate, parse, extract and clean its text
    pub async fn load(&self, filename: &str, data: bytes::Bytes) -> Result<LoadedPdf> {
        Self::validate(filename, &data)?;
        let content_hash = hash_bytes(&data);

        let parse_data = data.clone();
        let total_pages = tokio::task::spawn_blocking(move || {
            lopdf::Document::load_mem(&parse_data).map(|doc| doc.get_pages().len() as u32)
        })
        .await
        .map_err(|e| Error::internal(format!("PDF parse task failed: {}", e)))?
        .map_err(|e| Error::invalid_file(filename, format!("failed to parse PDF: {}", e)))?;

        let blocks = match self.extract_primary(data.clone(), total_pages).await {
            Some(blocks) => blocks,
            None => {
                let fallback_data = data.clone();
                tokio::task::spawn_blocking(move || extract_with_lopdf(&fallback_data))
                    .await
                    .map_err(|e| Error::internal(format!("PDF fallback task failed: {}", e)))?
                    .map_err(|e| Error::invalid_file(filename, e))?
            }
        };

        let blocks: Vec<TextBlock> = blocks
            .into_iter()
            .map(|block| TextBlock::new(block.page_number, cleanup_pdf_text(&block.text)))
            .filter(|block| !block.text.is_empty())
            .collect();

        if blocks.is_empty() {
            return Err(Error::EmptyDocument(filename.to_string()));
        }

        tracing::debug!(
            "Extracted {} text blocks from {} ({} pages)",
            blocks.len(),
            filename,
            total_pages
        );

        Ok(LoadedPdf {
            blocks,
            total_pages: Some(total_pages),
            content_hash,
        })
    }

    /// Run pdf-extract on a blocking thread. `None` means use the fallback.
    async fn extract_primary(&self, data: bytes::Bytes, total_pages: u32) -> Option<Vec<TextBlock>> {
        let task = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data));

        match tokio::time::timeout(self.extract_timeout, task).await {
            Ok(Ok(Ok(text))) if !text.trim().is_empty() => Some(split_pages(&text, total_pages)),
            Ok(Ok(Ok(_))) => {
                tracing::warn!("pdf-extract produced no text, trying lopdf fallback");
                None
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!("pdf-extract failed: {}, trying lopdf fallback", e);
                None
            }
            Ok(Err(e)) => {
                tracing::error!("pdf-extract task panicked: {}, trying lopdf fallback", e);
                None
            }
            Err(_) => {
                tracing::error!(
                    "PDF extraction timeout after {}s, trying lopdf fallback",
                    self.extract_timeout.as_secs()
                );
                None
            }
        }
    }
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self::new(&LoaderConfig::default())
    }
}

/// Split primary extractor output into pages when form feeds line up with
/// the page count, otherwise keep it as one block
fn split_pages(text: &str, total_pages: u32) -> Vec<TextBlock> {
    let pages: Vec<&str> = text.split('\u{000C}').collect();

    if total_pages > 1 && pages.len() == total_pages as usize {
        return pages
            .into_iter()
            .enumerate()
            .map(|(i, page)| TextBlock::new(Some(i as u32 + 1), page))
            .collect();
    }

    let page_number = (total_pages == 1).then_some(1);
    vec![TextBlock::new(page_number, text.replace('\u{000C}', "\n"))]
}

/// Per-page extraction with lopdf, one block per page
fn extract_with_lopdf(data: &[u8]) -> std::result::Result<Vec<TextBlock>, String> {
    let doc = lopdf::Document::load_mem(data).map_err(|e| format!("failed to load PDF: {}", e))?;

    let mut blocks = Vec::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) if !text.trim().is_empty() => {
                blocks.push(TextBlock::new(Some(*page_number), text));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("Could not extract text from page {}: {}", page_number, e);
            }
        }
    }

    Ok(blocks)
}
