use crate::error::ValidationError;
use std::path::Path;

pub const PDF: &str = "application/pdf";
pub const PLAIN_TEXT: &str = "text/plain";
pub const MS_WORD: &str = "application/msword";
pub const OOXML_WORD: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Document types the assistant backend can ingest, with their extensions.
const ACCEPTED: &[(&str, &[&str])] = &[
    (PDF, &["pdf"]),
    (PLAIN_TEXT, &["txt"]),
    (MS_WORD, &["doc"]),
    (OOXML_WORD, &["docx"]),
];

/// MIME types that say nothing about the content; the extension decides instead.
const GENERIC: &[&str] = &["", "application/octet-stream"];

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Guess a MIME type from the file name, falling back to octet-stream.
pub fn mime_from_name(name: &str) -> &'static str {
    let ext = extension_of(name);
    ACCEPTED
        .iter()
        .find(|(_, exts)| exts.contains(&ext.as_str()))
        .map(|(mime, _)| *mime)
        .unwrap_or("application/octet-stream")
}

/// Check a selected file against the allow-list and return the MIME type to
/// submit it with.
pub fn check_accepted(name: &str, declared_mime: &str) -> Result<&'static str, ValidationError> {
    let declared = declared_mime
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    if let Some((mime, _)) = ACCEPTED.iter().find(|(mime, _)| *mime == declared) {
        return Ok(*mime);
    }

    if GENERIC.contains(&declared.as_str()) {
        let guessed = mime_from_name(name);
        if guessed != "application/octet-stream" {
            return Ok(guessed);
        }
    }

    Err(ValidationError::UnsupportedFileType {
        name: name.to_string(),
        mime_type: declared_mime.to_string(),
    })
}
