//! File-type dispatch and plain-text extraction for uploaded CVs.
//!
//! PDF goes through `pdf-extract`, DOCX is unzipped and its `word/document.xml`
//! text runs are collected, TXT is decoded as UTF-8. Extraction is CPU-bound and
//! runs on the blocking pool.

use std::io::{Cursor, Read};
use std::sync::OnceLock;

use bytes::Bytes;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, error};

use crate::errors::AppError;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_TEXT: &str = "text/plain";

/// Exact content types the upload route accepts.
pub const ALLOWED_MIME_TYPES: &[&str] = &[MIME_PDF, MIME_DOCX, MIME_DOC, MIME_TEXT];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file format: {0}")]
    Unsupported(String),

    #[error("PDF file could not be read: {0}")]
    Pdf(String),

    #[error("DOCX file could not be read: {0}")]
    Docx(String),

    #[error("Text extraction aborted: {0}")]
    Aborted(String),
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::Unsupported(_) => AppError::Validation(e.to_string()),
            other => AppError::UnprocessableEntity(other.to_string()),
        }
    }
}

impl DocumentKind {
    /// Picks an extractor by substring of the MIME type.
    pub fn from_mime(mime: &str) -> Result<Self, ExtractError> {
        let mime = mime.to_ascii_lowercase();
        if mime.contains("pdf") {
            Ok(DocumentKind::Pdf)
        } else if mime.contains("wordprocessingml") || mime.contains("msword") {
            Ok(DocumentKind::Docx)
        } else if mime.contains("text") || mime.contains("plain") {
            Ok(DocumentKind::PlainText)
        } else {
            Err(ExtractError::Unsupported(mime))
        }
    }
}

pub fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime)
}

/// Resolves the MIME type of an upload part. Browsers sometimes send no type, or
/// `application/octet-stream`, for Office files; fall back to the file extension.
pub fn resolve_mime(content_type: Option<&str>, file_name: &str) -> String {
    let declared = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    if let Some(ct) = declared {
        return ct;
    }

    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => MIME_PDF,
        "docx" => MIME_DOCX,
        "doc" => MIME_DOC,
        "txt" => MIME_TEXT,
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Extracts plain text on the blocking pool. A panic inside the PDF/DOCX
/// libraries is reported as an extraction error rather than taking down the task.
pub async fn extract_text(bytes: Bytes, kind: DocumentKind) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || extract_text_sync(&bytes, kind))
        .await
        .map_err(|e| {
            error!("Text extraction task failed: {e}");
            ExtractError::Aborted(format!("{kind:?} parser failed"))
        })?
}

pub fn extract_text_sync(bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError> {
    let text = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?,
        DocumentKind::Docx => extract_docx(bytes)?,
        DocumentKind::PlainText => decode_text(bytes),
    };
    debug!("Extracted {} chars from {:?}", text.len(), kind);
    Ok(text)
}

fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx_err = |e: &dyn std::fmt::Display| ExtractError::Docx(e.to_string());

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| docx_err(&e))?;
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|e| docx_err(&e))?;

    let mut xml = String::new();
    document.read_to_string(&mut xml).map_err(|e| docx_err(&e))?;

    Ok(docx_xml_to_text(&xml))
}

fn docx_token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        // Self-closing runs (`<w:t/>`) carry no text and must not open a capture.
        Regex::new(
            r"(?s)<w:t(?:\s[^>]*?[^/>])?>(.*?)</w:t>|<w:tab\s*/>|<w:(?:br|cr)(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?/>|</w:p>",
        )
        .expect("docx token regex is valid")
    })
}

/// Collects text runs from WordprocessingML, keeping paragraph and tab structure.
pub fn docx_xml_to_text(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() / 4);

    for caps in docx_token_regex().captures_iter(xml) {
        if let Some(run) = caps.get(1) {
            out.push_str(&decode_xml_entities(run.as_str()));
            continue;
        }
        let token = caps.get(0).map_or("", |m| m.as_str());
        if token.starts_with("<w:tab") {
            out.push('\t');
        } else {
            out.push('\n');
        }
    }

    out.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn decode_xml_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';') {
            Some(semi) => {
                let entity = &tail[1..semi];
                match decode_entity(entity) {
                    Some(c) => out.push(c),
                    None => out.push_str(&tail[..=semi]),
                }
                rest = &tail[semi + 1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Packs `document_xml` into a minimal DOCX archive.
#[cfg(test)]
pub(crate) fn build_docx(document_xml: &str) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf.into_inner()
}
