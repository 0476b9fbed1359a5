// src/extension.rs
//! Choosing the extension a stored upload ends up with.
//!
//! The sniffed media type yields a candidate extension, aliases are
//! renamed to a canonical spelling, and the result is dropped again when
//! the client's own extension already agrees with it or is one we always
//! keep.

use crate::error::UploadError;
use crate::sniff::OCTET_STREAM;
use mime_guess::Mime;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

const BINARY_EXTENSION: &str = ".bin";

static RENAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (".asc", ".txt"),
        (".jfif", ".jpeg"),
        (".jpe", ".jpeg"),
        (".jpg", ".jpeg"),
        (".m1v", ".mpeg"),
        (".m2v", ".mpeg"),
        (".mpe", ".mpeg"),
        (".mpg", ".mpeg"),
        (".tif", ".tiff"),
        (".htm", ".html"),
    ])
});

/// Extensions used for common media types instead of the registry's
/// alphabetical first pick, which for text types is an obscure one.
static PREFERRED: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("text/plain", ".txt"),
        ("text/html", ".html"),
        ("text/xml", ".xml"),
        ("text/css", ".css"),
        ("text/csv", ".csv"),
        ("application/xml", ".xml"),
        ("application/json", ".json"),
        ("application/pdf", ".pdf"),
        ("application/zip", ".zip"),
        ("application/gzip", ".gz"),
        ("image/jpeg", ".jpeg"),
        ("image/png", ".png"),
        ("image/gif", ".gif"),
        ("image/tiff", ".tiff"),
        ("image/webp", ".webp"),
        ("image/bmp", ".bmp"),
        ("image/svg+xml", ".svg"),
        ("audio/mpeg", ".mp3"),
        ("audio/x-wav", ".wav"),
        ("video/mpeg", ".mpeg"),
        ("video/mp4", ".mp4"),
    ])
});

/// Client extensions that are always kept over a sniffed one.
static PRESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        ".amr", ".avi", ".bak", ".bibtex", ".bz2", ".cfg", ".conf", ".css", ".csv", ".db",
        ".deb", ".doc", ".docx", ".dia", ".epub", ".exe", ".flv", ".gz", ".htm", ".html",
        ".ics", ".iso", ".jar", ".jpeg", ".json", ".log", ".mp3", ".odf", ".odg", ".odp",
        ".ods", ".odt", ".otf", ".oxt", ".pas", ".php", ".pl", ".ppd", ".ppt", ".pptx",
        ".rip", ".rpm", ".sh", ".spk", ".sql", ".sxg", ".sxw", ".ttf", ".txt", ".vbox",
        ".vmdk", ".vcs", ".wav", ".xhtml", ".xls", ".xpi", ".xsl",
    ])
});

/// Extension to append to `original_name` for content of `mime_type`.
///
/// An empty string means the client's name is kept as it is.
pub fn resolve_extension(mime_type: &str, original_name: &str) -> Result<String, UploadError> {
    let registered = registered_extension(mime_type)?;
    Ok(reconcile(&registered, original_name))
}

/// Extension registered for `mime_type`, before any renaming.
pub fn registered_extension(mime_type: &str) -> Result<String, UploadError> {
    let mime: Mime = mime_type
        .trim()
        .parse()
        .map_err(|_| UploadError::UnsupportedMediaType(mime_type.to_string()))?;

    let essence = mime.essence_str();
    if essence == OCTET_STREAM {
        return Ok(BINARY_EXTENSION.to_string());
    }
    if let Some(preferred) = PREFERRED.get(essence) {
        return Ok(preferred.to_string());
    }

    let extension = mime_guess::get_mime_extensions_str(essence)
        .and_then(|exts| exts.iter().min())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| BINARY_EXTENSION.to_string());

    Ok(extension)
}

/// Canonical spelling of `extension`.
pub fn canonical_extension(extension: &str) -> &str {
    RENAMES.get(extension).copied().unwrap_or(extension)
}

pub fn is_preserved(extension: &str) -> bool {
    PRESERVED.contains(extension.to_ascii_lowercase().as_str())
}

/// Renames `registered`, then suppresses it if the client's extension
/// matches or is preserved.
pub fn reconcile(registered: &str, original_name: &str) -> String {
    let resolved = canonical_extension(registered);
    let original = file_extension(original_name).to_ascii_lowercase();

    if original == resolved || is_preserved(&original) {
        return String::new();
    }
    resolved.to_string()
}

/// Text from the final dot of `name`, dot included; empty without a dot.
pub fn file_extension(name: &str) -> &str {
    name.rfind('.').map(|idx| &name[idx..]).unwrap_or("")
}
