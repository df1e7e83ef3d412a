//! Resume text extraction for the three upload formats (`pdf`, `docx`, `txt`).
//!
//! Pure reads: no side effects beyond opening the file. Truncating the text to
//! the LLM token budget is the caller's job, not this module's.

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

/// Decoded text shorter than this is treated as unextractable, typically a
/// scanned image wrapped in a PDF, or a corrupted upload.
pub const MIN_TEXT_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("file is empty: {0}")]
    EmptyFile(String),

    #[error("no readable text in file (got {0} characters; the document may be scanned or corrupted)")]
    Empty(usize),

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("could not decode PDF: {0}")]
    Pdf(String),

    #[error("could not decode DOCX: {0}")]
    Docx(String),

    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Extracts raw text from a resume file, failing explicitly on anything the
/// downstream analysis could not work with.
pub fn extract_text(file_path: &str, file_type: &str) -> Result<String, ExtractionError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(ExtractionError::NotFound(file_path.to_string()));
    }
    if path.metadata()?.len() == 0 {
        return Err(ExtractionError::EmptyFile(file_path.to_string()));
    }

    let text = match file_type {
        "pdf" => extract_pdf(path)?,
        "docx" => extract_docx(path)?,
        "txt" => extract_txt(path)?,
        other => return Err(ExtractionError::UnsupportedType(other.to_string())),
    };

    let trimmed_len = text.trim().chars().count();
    if trimmed_len < MIN_TEXT_CHARS {
        return Err(ExtractionError::Empty(trimmed_len));
    }

    debug!(chars = text.len(), file_type, "extracted resume text");
    Ok(text)
}

fn extract_pdf(path: &Path) -> Result<String, ExtractionError> {
    pdf_extract::extract_text(path).map_err(|e| ExtractionError::Pdf(e.to_string()))
}

/// A DOCX is a ZIP archive; the body text lives in `word/document.xml` as
/// `<w:t>` runs grouped into `<w:p>` paragraphs.
fn extract_docx(path: &Path) -> Result<String, ExtractionError> {
    let file = std::fs::File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut document_xml = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Docx(format!("missing document.xml: {e}")))?;
    let mut xml = String::new();
    document_xml
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;

    parse_docx_xml(&xml)
}

fn parse_docx_xml(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut text = String::new();
    let mut in_text_run = false;
    let mut in_paragraph = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = true,
                b"p" => in_paragraph = true,
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    if in_paragraph {
                        text.push('\n');
                        in_paragraph = false;
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text_run {
                    text.push_str(&e.xml_content().unwrap_or_default());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractionError::Docx(format!("XML parse error: {e}"))),
            _ => {}
        }
    }

    Ok(text)
}

/// Plain text, with a lossy fallback for resumes saved in legacy encodings.
fn extract_txt(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}
