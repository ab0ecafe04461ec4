//! Text extraction from source documents.
//!
//! A source is read into bytes, handed to the [`TextExtractor`] for its kind,
//! and the extracted sections (pages for PDF) are joined in order with a
//! single line break.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::document::Document;
use crate::error::{RagError, Result};

/// Where a document comes from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A file on disk.
    Path(PathBuf),
    /// An uploaded payload with an optional file name.
    Bytes {
        /// File name used for kind detection and as the document id.
        name: Option<String>,
        /// Raw file contents.
        data: Vec<u8>,
    },
}

impl DocumentSource {
    /// Source for a file on disk.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        DocumentSource::Path(path.into())
    }

    /// Source for an uploaded payload.
    pub fn bytes(name: Option<String>, data: impl Into<Vec<u8>>) -> Self {
        DocumentSource::Bytes { name, data: data.into() }
    }

    fn name(&self) -> Option<String> {
        match self {
            DocumentSource::Path(path) => {
                path.file_name().map(|n| n.to_string_lossy().into_owned())
            }
            DocumentSource::Bytes { name, .. } => name.clone(),
        }
    }
}

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// UTF-8 text, markdown, or anything without a known binary extension.
    Text,
    /// Portable Document Format.
    Pdf,
}

impl SourceKind {
    /// Detect the kind from a file name's extension.
    pub fn from_name(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => SourceKind::Pdf,
            _ => SourceKind::Text,
        }
    }
}

/// Turns raw bytes of one format into ordered text sections.
pub trait TextExtractor: Send + Sync {
    /// Extract sections in source order.
    fn sections(&self, data: &[u8]) -> Result<Vec<String>>;
}

/// Reads UTF-8 text as a single section.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn sections(&self, data: &[u8]) -> Result<Vec<String>> {
        let text = std::str::from_utf8(data)
            .map_err(|e| RagError::Extraction(format!("source is not valid UTF-8: {e}")))?;
        Ok(vec![text.to_string()])
    }
}

/// Extracts one section per PDF page using `lopdf`.
///
/// Only available with the `pdf` feature.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

#[cfg(feature = "pdf")]
impl TextExtractor for PdfExtractor {
    fn sections(&self, data: &[u8]) -> Result<Vec<String>> {
        let pdf = lopdf::Document::load_mem(data)
            .map_err(|e| RagError::Extraction(format!("unreadable PDF: {e}")))?;

        let mut pages = Vec::new();
        for page_number in pdf.get_pages().into_keys() {
            match pdf.extract_text(&[page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => warn!(page_number, error = %e, "skipping unreadable PDF page"),
            }
        }
        Ok(pages)
    }
}

fn extractor_for(kind: SourceKind) -> Result<Box<dyn TextExtractor>> {
    match kind {
        SourceKind::Text => Ok(Box::new(PlainTextExtractor)),
        #[cfg(feature = "pdf")]
        SourceKind::Pdf => Ok(Box::new(PdfExtractor)),
        #[cfg(not(feature = "pdf"))]
        SourceKind::Pdf => {
            Err(RagError::Extraction("PDF support requires the `pdf` feature".to_string()))
        }
    }
}

/// Join sections with a line break, failing if nothing but whitespace remains.
pub fn join_sections(sections: Vec<String>) -> Result<String> {
    let text = sections.join("\n");
    if text.trim().is_empty() {
        return Err(RagError::Extraction("source produced no text".to_string()));
    }
    Ok(text)
}

/// Read `source` and extract its text into a [`Document`].
///
/// The document id is the file name when known, otherwise a random UUID.
///
/// # Errors
///
/// Returns [`RagError::Extraction`] if the source cannot be read, is of an
/// unsupported kind, or yields no text.
pub fn extract(source: &DocumentSource) -> Result<Document> {
    let name = source.name();
    let kind = name.as_deref().map(SourceKind::from_name).unwrap_or(SourceKind::Text);

    let sections = match source {
        DocumentSource::Path(path) => {
            let data = std::fs::read(path).map_err(|e| {
                RagError::Extraction(format!("cannot read '{}': {e}", path.display()))
            })?;
            extractor_for(kind)?.sections(&data)?
        }
        DocumentSource::Bytes { data, .. } => extractor_for(kind)?.sections(data)?,
    };

    let section_count = sections.len();
    let text = join_sections(sections)?;
    let id = name.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    debug!(document.id = %id, ?kind, section_count, "extracted document text");

    let document = Document::new(id, text);
    Ok(match name {
        Some(name) => document.with_source(name),
        None => document,
    })
}
