//! Filesystem-safe naming for everything the exporter writes.
//!
//! Every path component in the output tree goes through [`sanitize_filename`]:
//! note pages, collection folders and extracted media files. The derived names
//! are pure functions of the input, which is what makes reruns overwrite the
//! previous output instead of piling up new files.
//!
//! ## Note Pages
//!
//! Notes are numbered by their position in the archive, 1-based and padded to
//! three digits, followed by the sanitized title:
//! - first note titled `Shopping list` → `note_001_Shopping_list.html`
//! - note 1234 titled `a/b` → `note_1234_a_b.html`
//!
//! ## Collections
//!
//! An archive `Work Notes.enex` becomes the folder `Work_Notes` and is shown
//! as `Work Notes` in page headings.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::path::Path;

/// Fallback name for inputs that sanitize to nothing.
pub const UNTITLED: &str = "untitled";

/// Upper bound on a sanitized name, in characters.
pub const MAX_NAME_LEN: usize = 150;

/// Upper bound on a sanitized name, in UTF-8 bytes. Filesystems cap a path
/// component at 255 bytes; this leaves room for `note_NNNN_`, `.html` and the
/// `_<md5>` splice of colliding media names.
pub const MAX_NAME_BYTES: usize = 200;

/// Characters that are never allowed in a generated name. `#` is included
/// because it would start a URL fragment in generated links.
const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '#'];

/// Bytes escaped when a generated name is used as a relative URL. `%` must be
/// escaped so a literal `%20` in a file name is not decoded by the browser.
const LINK_ESCAPES: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'%').add(b'<').add(b'>');

/// Map an arbitrary string to a filesystem-safe, non-empty name.
///
/// - `""` → `"untitled"`
/// - `"a/b\\c"` → `"a_b_c"`
/// - `"a   b"` → `"a_b"`
/// - `"...x..."` → `"x"`
///
/// Reserved characters become `_`, runs of spaces and underscores collapse
/// to a single `_`, the result is cut to [`MAX_NAME_LEN`] characters (and at
/// most [`MAX_NAME_BYTES`] bytes, on a character boundary) and then stripped of leading/trailing spaces, dots and underscores. The function is
/// idempotent.
pub fn sanitize_filename(name: &str) -> String {
    let mut collapsed = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        let c = if RESERVED.contains(&c) { '_' } else { c };
        if c == ' ' || c == '_' {
            if !in_run {
                collapsed.push('_');
                in_run = true;
            }
        } else {
            collapsed.push(c);
            in_run = false;
        }
    }

    let mut truncated = String::with_capacity(collapsed.len().min(MAX_NAME_BYTES));
    for c in collapsed.chars().take(MAX_NAME_LEN) {
        if truncated.len() + c.len_utf8() > MAX_NAME_BYTES {
            break;
        }
        truncated.push(c);
    }
    let trimmed = truncated.trim_matches(|c| c == ' ' || c == '.' || c == '_');

    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Format a 1-based positional index as (at least) 3-digit zero-padded.
pub fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// A generated file or folder name as it appears in `href`/`src`.
///
/// - `"report%20final.pdf"` → `"report%2520final.pdf"`
/// - `"日記.html"` → `"%E6%97%A5%E8%A8%98.html"`
pub fn link_target(name: &str) -> String {
    utf8_percent_encode(name, LINK_ESCAPES).to_string()
}

/// Output filename for the note at `position` (0-based parse order).
pub fn note_filename(position: usize, title: &str) -> String {
    format!(
        "note_{}_{}.html",
        format_index(position + 1),
        sanitize_filename(title)
    )
}

/// Output folder for an archive: its file name without extension, sanitized.
pub fn collection_dir_name(archive_file_name: &str) -> String {
    let stem = Path::new(archive_file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    sanitize_filename(&stem)
}

/// Human-facing collection name: the archive file name without the
/// `.<extension>` suffix. Other suffixes are kept as-is.
pub fn collection_display_name(archive_file_name: &str, extension: &str) -> String {
    let suffix = format!(".{extension}");
    archive_file_name
        .strip_suffix(&suffix)
        .unwrap_or(archive_file_name)
        .to_string()
}
