//! MIME type → file extension resolution for attachments without a filename.
//!
//! Resolution is layered so every input yields an extension:
//!
//! ```text
//! 1. Lookup table   image/jpeg        → .jpg
//! 2. Subtype        video/x-foo+xml   → (not alphanumeric) skip
//!                   model/stl         → .stl
//! 3. Fallback       anything else     → .bin
//! ```
//!
//! The table is compiled in rather than read from a platform MIME registry so
//! that the same archive produces the same filenames on every machine.

/// Extension used when nothing else resolves.
pub const FALLBACK_EXTENSION: &str = ".bin";

const EXTENSIONS: &[(&str, &str)] = &[
    // Images
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/pjpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/bmp", ".bmp"),
    ("image/webp", ".webp"),
    ("image/svg+xml", ".svg"),
    ("image/tiff", ".tiff"),
    ("image/x-icon", ".ico"),
    ("image/vnd.microsoft.icon", ".ico"),
    ("image/heic", ".heic"),
    ("image/avif", ".avif"),
    // Documents
    ("application/pdf", ".pdf"),
    ("application/rtf", ".rtf"),
    ("application/msword", ".doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    ("application/vnd.ms-excel", ".xls"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xlsx",
    ),
    ("application/vnd.ms-powerpoint", ".ppt"),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".pptx",
    ),
    ("application/vnd.oasis.opendocument.text", ".odt"),
    ("application/vnd.oasis.opendocument.spreadsheet", ".ods"),
    ("application/epub+zip", ".epub"),
    ("application/vnd.amazon.ebook", ".azw"),
    ("application/json", ".json"),
    ("application/xml", ".xml"),
    ("application/javascript", ".js"),
    // Archives
    ("application/zip", ".zip"),
    ("application/gzip", ".gz"),
    ("application/x-tar", ".tar"),
    ("application/x-7z-compressed", ".7z"),
    ("application/vnd.rar", ".rar"),
    ("application/x-rar-compressed", ".rar"),
    ("application/octet-stream", ".bin"),
    // Text
    ("text/plain", ".txt"),
    ("text/html", ".html"),
    ("text/css", ".css"),
    ("text/csv", ".csv"),
    ("text/markdown", ".md"),
    ("text/xml", ".xml"),
    ("text/calendar", ".ics"),
    ("text/vcard", ".vcf"),
    ("text/x-vcard", ".vcf"),
    // Audio
    ("audio/mpeg", ".mp3"),
    ("audio/mp4", ".m4a"),
    ("audio/x-m4a", ".m4a"),
    ("audio/aac", ".aac"),
    ("audio/x-aac", ".aac"),
    ("audio/wav", ".wav"),
    ("audio/x-wav", ".wav"),
    ("audio/ogg", ".ogg"),
    ("audio/flac", ".flac"),
    ("audio/amr", ".amr"),
    ("audio/webm", ".weba"),
    // Video
    ("video/mp4", ".mp4"),
    ("video/mpeg", ".mpeg"),
    ("video/quicktime", ".mov"),
    ("video/webm", ".webm"),
    ("video/x-msvideo", ".avi"),
    ("video/3gpp", ".3gp"),
];

/// Resolve a file extension (with leading dot) for a MIME type.
///
/// Parameters are ignored (`text/plain; charset=utf-8` → `.txt`) and the
/// comparison is case-insensitive. Never returns an empty string.
pub fn extension_for_mime(mime_type: &str) -> String {
    let base = base_mime(mime_type);
    if base.is_empty() {
        return FALLBACK_EXTENSION.to_string();
    }

    if let Some((_, ext)) = EXTENSIONS.iter().find(|(m, _)| *m == base) {
        return (*ext).to_string();
    }

    subtype_extension(&base).unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// Lowercased MIME type without parameters.
fn base_mime(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Extension from the subtype, with any `+suffix` removed.
///
/// Only plain alphanumeric subtypes qualify, so `x-matroska` or
/// `vnd.foo.bar` fall through to the generic default.
fn subtype_extension(base: &str) -> Option<String> {
    let (_, subtype) = base.rsplit_once('/')?;
    let subtype = subtype.split('+').next().unwrap_or_default();
    if !subtype.is_empty() && subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(format!(".{subtype}"))
    } else {
        None
    }
}
