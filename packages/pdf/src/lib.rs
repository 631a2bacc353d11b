#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Token and line sources for statement documents.
//!
//! Turns a file on disk into a [`DocumentInput`] for the extraction core:
//!
//! - **PDF**: text via pure-Rust extraction ([`pdf_extract`]), either laid
//!   out as positional tokens ([`text_layout`]) or kept as report lines
//!   when a fixed-width report was printed to PDF.
//! - **Token dumps**: JSON pages of positioned tokens from an external
//!   renderer ([`token_dump`]).
//! - **Reports**: fixed-width text files, decoded lossily ([`report`]).
//! - **Images**: an OCR transcript supplied alongside the image.

pub mod report;
pub mod text_layout;
pub mod token_dump;

use std::path::{Path, PathBuf};

use statement_table_extract::config::TextLayoutConfig;
use statement_table_extract::{DocumentInput, ExtractError};
use statement_table_models::ConversionType;
use strum_macros::{AsRefStr, Display};

/// Errors raised while reading a document.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// The file extension is not a supported document type.
    #[error("Unsupported file type: {0}")]
    UnsupportedExtension(String),

    /// An image was given without an OCR transcript.
    #[error("No OCR transcript supplied for image {}", .0.display())]
    MissingTranscript(PathBuf),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A token dump could not be parsed.
    #[error("Invalid token dump: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SourceError> for ExtractError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::Io(e) => Self::Io(e),
            SourceError::Json(e) => Self::Json(e),
            SourceError::Extraction(_)
            | SourceError::UnsupportedExtension(_)
            | SourceError::MissingTranscript(_) => Self::UnsupportedInput(e.to_string()),
        }
    }
}

/// Kind of document file, from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SourceKind {
    /// `.pdf`
    Pdf,
    /// `.json` token dump.
    TokenDump,
    /// `.rpt` or `.txt` fixed-width report.
    Report,
    /// `.jpg`, `.jpeg` or `.png` scan.
    Image,
}

impl SourceKind {
    /// Classifies `path` by extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnsupportedExtension`] for any other
    /// extension, or none.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "json" => Ok(Self::TokenDump),
            "rpt" | "txt" => Ok(Self::Report),
            "jpg" | "jpeg" | "png" => Ok(Self::Image),
            _ => Err(SourceError::UnsupportedExtension(path.display().to_string())),
        }
    }
}

/// Options for [`load`].
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    /// OCR transcript for image input.
    pub transcript: Option<PathBuf>,
    /// Grid used to lay out PDF text as tokens.
    pub text_layout: TextLayoutConfig,
}

/// Extracts the text of a PDF.
///
/// # Errors
///
/// Returns [`SourceError::Extraction`] if the PDF cannot be parsed.
pub fn pdf_text(bytes: &[u8]) -> Result<String, SourceError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| SourceError::Extraction(format!("failed to extract text from PDF: {e}")))?;
    log::debug!("Extracted {} characters of text from PDF", text.len());
    Ok(text)
}

/// Reads `path` into the input shape `kind` expects.
///
/// PDFs become report lines for [`ConversionType::FixedWidthReport`] and
/// positional tokens otherwise.
///
/// # Errors
///
/// Returns [`SourceError`] if the file type is unsupported, the file cannot
/// be read, or its contents cannot be decoded.
pub fn load(
    path: &Path,
    kind: ConversionType,
    options: &SourceOptions,
) -> Result<DocumentInput, SourceError> {
    let source = SourceKind::from_path(path)?;
    log::info!("Reading {} as {source}", path.display());

    let input = match source {
        SourceKind::Pdf => {
            let text = pdf_text(&std::fs::read(path)?)?;
            if kind == ConversionType::FixedWidthReport {
                DocumentInput::Lines(report::lines_lossy(text.as_bytes()))
            } else {
                DocumentInput::Positional(text_layout::tokens_from_text(
                    &text,
                    &options.text_layout,
                ))
            }
        }
        SourceKind::TokenDump => {
            DocumentInput::Positional(token_dump::parse(&std::fs::read(path)?)?)
        }
        SourceKind::Report => DocumentInput::Lines(report::lines_lossy(&std::fs::read(path)?)),
        SourceKind::Image => {
            let transcript = options
                .transcript
                .as_deref()
                .ok_or_else(|| SourceError::MissingTranscript(path.to_path_buf()))?;
            let bytes = std::fs::read(transcript)?;
            DocumentInput::OcrTranscript(String::from_utf8_lossy(&bytes).into_owned())
        }
    };

    Ok(input)
}
