//! PDF ingestion: loading, chunking and embedding

mod chunker;
mod loader;
mod pipeline;

pub use chunker::{JoinedText, Span, TextChunker, BLOCK_SEPARATOR};
pub use loader::{cleanup_pdf_text, hash_bytes, LoadedPdf, PdfLoader};
pub use pipeline::IngestPipeline;
