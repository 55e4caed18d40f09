//! Archive parsing: `.enex` XML → notes and content-addressed resources.
//!
//! An archive is one XML document. Notes and their attachments look like:
//!
//! ```text
//! <en-export>
//!   <note>
//!     <title>Trip</title>
//!     <content><![CDATA[<en-note>... <en-media hash="9f1c..." type="image/png"/></en-note>]]></content>
//!     <created>20200101T120000Z</created>
//!     <resource>
//!       <data encoding="base64">iVBORw0KGgo...</data>
//!       <mime>image/png</mime>
//!       <resource-attributes><file-name>map.png</file-name></resource-attributes>
//!     </resource>
//!   </note>
//! </en-export>
//! ```
//!
//! ## Resources
//!
//! `resource` elements are collected wherever they appear, in document order.
//! Each payload is base64-decoded and keyed by the MD5 of its bytes, which is
//! also the digest the archive's `en-media` markers refer to. The first
//! resource with given bytes wins; later duplicates are dropped. A resource
//! with no data, no MIME type or an undecodable payload is skipped with a
//! warning; it never fails the archive.
//!
//! ## Notes
//!
//! Only direct children of `note` are read as note fields. Missing or empty
//! titles and bodies get placeholders from [`NoteDefaults`]; timestamps stay
//! `None` when absent. Notes are returned in document order, which is the
//! order their pages are numbered in.
//!
//! ## Failure
//!
//! A document that is not well-formed XML (bad syntax, mismatched or
//! unclosed tags, no root element) fails the whole archive with
//! [`ParseError::MalformedArchive`].

use crate::mime::extension_for_mime;
use crate::naming::sanitize_filename;
use crate::types::{Note, Resource, ResourceMap};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use md5::{Digest, Md5};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed archive {path}: {reason}")]
    MalformedArchive { path: PathBuf, reason: String },
}

/// Placeholders for notes with a missing or empty title/body.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDefaults {
    pub title: String,
    pub content: String,
}

impl Default for NoteDefaults {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            content: "<p>No content</p>".to_string(),
        }
    }
}

/// Everything extracted from one archive.
#[derive(Debug, Default)]
pub struct ParsedArchive {
    /// Notes in document order
    pub notes: Vec<Note>,
    pub resources: ResourceMap,
    /// Resources dropped for missing fields or undecodable payloads
    pub skipped_resources: usize,
}

/// Payloads are wrapped at fixed widths and not always padded.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Parse an archive file from disk.
pub fn parse_archive(path: &Path, defaults: &NoteDefaults) -> Result<ParsedArchive, ParseError> {
    let bytes = fs::read(path)?;
    parse_archive_bytes(&bytes, path, defaults)
}

/// Parse archive XML already in memory. `origin` labels errors and logs.
pub fn parse_archive_bytes(
    xml: &[u8],
    origin: &Path,
    defaults: &NoteDefaults,
) -> Result<ParsedArchive, ParseError> {
    let malformed = |reason: String| ParseError::MalformedArchive {
        path: origin.to_path_buf(),
        reason,
    };

    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut state = ParseState::new(origin, defaults);

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            malformed(format!("{e} (near byte {})", reader.buffer_position()))
        })?;
        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                state.open(name);
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                state.empty(&name);
            }
            Event::Text(e) => {
                if state.capturing() {
                    let text = e
                        .unescape()
                        .map_err(|err| malformed(format!("invalid text: {err}")))?;
                    state.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if state.capturing() {
                    state.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                state.close(&name);
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }

    if let Some(open) = state.stack.last() {
        return Err(malformed(format!("unexpected end of document inside <{open}>")));
    }
    if !state.seen_root {
        return Err(malformed("document has no root element".to_string()));
    }

    Ok(state.finish())
}

/// Note or resource child element whose text is being collected.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Content,
    Created,
    Updated,
    Data,
    Mime,
    FileName,
}

#[derive(Debug, Default)]
struct NoteBuilder {
    title: Option<String>,
    content: Option<String>,
    created: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Default)]
struct ResourceBuilder {
    data: Option<String>,
    mime: Option<String>,
    filename: Option<String>,
}

struct ParseState<'a> {
    origin: &'a Path,
    defaults: &'a NoteDefaults,
    /// Open element names, outermost first.
    stack: Vec<String>,
    seen_root: bool,
    /// Open note and the stack depth it was opened at.
    note: Option<(usize, NoteBuilder)>,
    resource: Option<(usize, ResourceBuilder)>,
    resource_ordinal: usize,
    capture: Option<(usize, Field)>,
    text: String,
    notes: Vec<Note>,
    resources: ResourceMap,
    used_filenames: HashSet<String>,
    skipped_resources: usize,
}

impl<'a> ParseState<'a> {
    fn new(origin: &'a Path, defaults: &'a NoteDefaults) -> Self {
        Self {
            origin,
            defaults,
            stack: Vec::new(),
            seen_root: false,
            note: None,
            resource: None,
            resource_ordinal: 0,
            capture: None,
            text: String::new(),
            notes: Vec::new(),
            resources: ResourceMap::new(),
            used_filenames: HashSet::new(),
            skipped_resources: 0,
        }
    }

    fn capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Which field, if any, an element at the current position holds.
    fn field_for(&self, name: &str) -> Option<Field> {
        let parent = self.stack.last().map(String::as_str)?;
        match (parent, name) {
            ("note", "title") if self.note.is_some() => Some(Field::Title),
            ("note", "content") if self.note.is_some() => Some(Field::Content),
            ("note", "created") if self.note.is_some() => Some(Field::Created),
            ("note", "updated") if self.note.is_some() => Some(Field::Updated),
            ("resource", "data") if self.resource.is_some() => Some(Field::Data),
            ("resource", "mime") if self.resource.is_some() => Some(Field::Mime),
            ("resource-attributes", "file-name" | "filename") if self.resource.is_some() => {
                Some(Field::FileName)
            }
            _ => None,
        }
    }

    fn open(&mut self, name: String) {
        self.seen_root = true;
        if self.capture.is_none() {
            if let Some(field) = self.field_for(&name) {
                self.capture = Some((self.stack.len() + 1, field));
                self.text.clear();
            }
        }
        match name.as_str() {
            "note" if self.note.is_none() => {
                self.note = Some((self.stack.len() + 1, NoteBuilder::default()));
            }
            "resource" if self.resource.is_none() => {
                self.resource = Some((self.stack.len() + 1, ResourceBuilder::default()));
            }
            _ => {}
        }
        self.stack.push(name);
    }

    fn empty(&mut self, name: &str) {
        self.seen_root = true;
        match name {
            "note" if self.note.is_none() => self.finish_note(NoteBuilder::default()),
            "resource" if self.resource.is_none() => {
                self.resource_ordinal += 1;
                self.skip_resource("element is empty");
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        let depth = self.stack.len();

        if let Some((capture_depth, field)) = self.capture {
            if capture_depth == depth {
                let value = std::mem::take(&mut self.text);
                self.store(field, value);
                self.capture = None;
            }
        }

        if name == "resource" && self.resource.as_ref().is_some_and(|(d, _)| *d == depth) {
            if let Some((_, builder)) = self.resource.take() {
                self.finish_resource(builder);
            }
        }
        if name == "note" && self.note.as_ref().is_some_and(|(d, _)| *d == depth) {
            if let Some((_, builder)) = self.note.take() {
                self.finish_note(builder);
            }
        }

        self.stack.pop();
    }

    fn store(&mut self, field: Field, value: String) {
        match field {
            Field::Title | Field::Content | Field::Created | Field::Updated => {
                let Some((_, note)) = self.note.as_mut() else {
                    return;
                };
                let slot = match field {
                    Field::Title => &mut note.title,
                    Field::Content => &mut note.content,
                    Field::Created => &mut note.created,
                    _ => &mut note.updated,
                };
                *slot = Some(value);
            }
            Field::Data | Field::Mime | Field::FileName => {
                let Some((_, resource)) = self.resource.as_mut() else {
                    return;
                };
                let slot = match field {
                    Field::Data => &mut resource.data,
                    Field::Mime => &mut resource.mime,
                    _ => &mut resource.filename,
                };
                *slot = Some(value);
            }
        }
    }

    fn finish_note(&mut self, builder: NoteBuilder) {
        // Blank text only triggers the defaults; kept values are stored as given.
        let title = builder
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.defaults.title.clone());
        let content = builder
            .content
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.defaults.content.clone());
        let timestamp = |t: Option<String>| t.filter(|t| !t.trim().is_empty());

        self.notes.push(Note {
            title,
            content,
            created: timestamp(builder.created),
            updated: timestamp(builder.updated),
        });
    }

    fn finish_resource(&mut self, builder: ResourceBuilder) {
        self.resource_ordinal += 1;

        let payload: String = builder
            .data
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let mime_type = builder.mime.unwrap_or_default().trim().to_string();
        if payload.is_empty() {
            self.skip_resource("no data");
            return;
        }
        if mime_type.is_empty() {
            self.skip_resource("no MIME type");
            return;
        }

        let data = match BASE64.decode(payload.as_bytes()) {
            Ok(data) => data,
            Err(e) => {
                self.skip_resource(&format!("base64 decode failed: {e}"));
                return;
            }
        };

        let hash = format!("{:x}", Md5::digest(&data));
        if self.resources.contains(&hash) {
            debug!(
                archive = %self.origin.display(),
                %hash,
                "duplicate resource content, keeping first occurrence"
            );
            return;
        }

        let declared = builder
            .filename
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        let filename = match declared {
            Some(name) => sanitize_filename(&name),
            None => sanitize_filename(&format!(
                "resource_{hash}{}",
                extension_for_mime(&mime_type)
            )),
        };
        let filename = self.unique_filename(filename, &hash);

        self.resources.insert(Resource {
            hash,
            mime_type,
            data,
            filename,
        });
    }

    /// Distinct contents sharing a declared filename get the hash spliced in
    /// before the extension so neither overwrites the other on disk.
    fn unique_filename(&mut self, filename: String, hash: &str) -> String {
        let filename = if self.used_filenames.contains(&filename) {
            match filename.rsplit_once('.') {
                Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{hash}.{ext}"),
                _ => format!("{filename}_{hash}"),
            }
        } else {
            filename
        };
        self.used_filenames.insert(filename.clone());
        filename
    }

    fn skip_resource(&mut self, reason: &str) {
        self.skipped_resources += 1;
        warn!(
            archive = %self.origin.display(),
            resource = self.resource_ordinal,
            "skipping resource: {reason}"
        );
    }

    fn finish(self) -> ParsedArchive {
        ParsedArchive {
            notes: self.notes,
            resources: self.resources,
            skipped_resources: self.skipped_resources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{EnexBuilder, b64, md5_hex};

    fn parse(xml: &str) -> ParsedArchive {
        parse_archive_bytes(xml.as_bytes(), Path::new("test.enex"), &NoteDefaults::default())
            .unwrap()
    }

    fn parse_err(xml: &str) -> ParseError {
        parse_archive_bytes(xml.as_bytes(), Path::new("bad.enex"), &NoteDefaults::default())
            .unwrap_err()
    }

    #[test]
    fn notes_in_document_order() {
        let xml = EnexBuilder::new()
            .note("Alpha", "<p>a</p>")
            .note("Bravo", "<p>b</p>")
            .note("Charlie", "<p>c</p>")
            .build();
        let parsed = parse(&xml);
        let titles: Vec<&str> = parsed.notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Bravo", "Charlie"]);
    }

    #[test]
    fn cdata_content_kept_verbatim() {
        let xml = EnexBuilder::new()
            .note("N", r#"<en-note><div style="color: red">Hi &amp; bye</div></en-note>"#)
            .build();
        let parsed = parse(&xml);
        assert_eq!(
            parsed.notes[0].content,
            r#"<en-note><div style="color: red">Hi &amp; bye</div></en-note>"#
        );
    }

    #[test]
    fn escaped_title_is_unescaped() {
        let xml = "<en-export><note><title>Tom &amp; Jerry</title></note></en-export>";
        assert_eq!(parse(xml).notes[0].title, "Tom & Jerry");
    }

    #[test]
    fn missing_title_and_content_get_placeholders() {
        let xml = "<en-export><note><created>20200101T000000Z</created></note></en-export>";
        let note = &parse(xml).notes[0];
        assert_eq!(note.title, "Untitled");
        assert_eq!(note.content, "<p>No content</p>");
        assert_eq!(note.created.as_deref(), Some("20200101T000000Z"));
        assert_eq!(note.updated, None);
    }

    #[test]
    fn empty_title_element_gets_placeholder() {
        let xml = "<en-export><note><title>  </title><content/></note></en-export>";
        let note = &parse(xml).notes[0];
        assert_eq!(note.title, "Untitled");
        assert_eq!(note.content, "<p>No content</p>");
    }

    #[test]
    fn title_and_timestamps_kept_as_given() {
        let xml = "<en-export><note><title>  Padded title </title>\
                   <created> 20200101T000000Z</created></note></en-export>";
        let note = &parse(xml).notes[0];
        assert_eq!(note.title, "  Padded title ");
        assert_eq!(note.created.as_deref(), Some(" 20200101T000000Z"));
    }

    #[test]
    fn custom_defaults_are_used() {
        let defaults = NoteDefaults {
            title: "(no title)".to_string(),
            content: "<p>empty</p>".to_string(),
        };
        let parsed = parse_archive_bytes(
            b"<en-export><note/></en-export>",
            Path::new("x.enex"),
            &defaults,
        )
        .unwrap();
        assert_eq!(parsed.notes[0].title, "(no title)");
        assert_eq!(parsed.notes[0].content, "<p>empty</p>");
    }

    #[test]
    fn resource_title_does_not_leak_into_note() {
        let xml = "<en-export><note><resource><title>inner</title></resource></note></en-export>";
        assert_eq!(parse(xml).notes[0].title, "Untitled");
    }

    #[test]
    fn resource_keyed_by_md5_with_declared_filename() {
        let bytes = b"\x89PNG fake image";
        let xml = EnexBuilder::new()
            .note("Pic", "<en-note/>")
            .resource(bytes, "image/png", Some("map.png"))
            .build();
        let parsed = parse(&xml);
        let hash = md5_hex(bytes);
        let resource = parsed.resources.get(&hash).unwrap();
        assert_eq!(resource.filename, "map.png");
        assert_eq!(resource.mime_type, "image/png");
        assert_eq!(resource.data, bytes);
        assert_eq!(resource.hash.len(), 32);
    }

    #[test]
    fn resource_without_filename_is_synthesized() {
        let bytes = b"%PDF-1.4";
        let xml = EnexBuilder::new()
            .note("Doc", "<en-note/>")
            .resource(bytes, "application/pdf", None)
            .build();
        let parsed = parse(&xml);
        let hash = md5_hex(bytes);
        assert_eq!(
            parsed.resources.get(&hash).unwrap().filename,
            format!("resource_{hash}.pdf")
        );
    }

    #[test]
    fn legacy_filename_attribute_is_accepted() {
        let xml = format!(
            "<en-export><note><resource><data>{}</data><mime>text/plain</mime>\
             <resource-attributes><filename>a.txt</filename></resource-attributes>\
             </resource></note></en-export>",
            b64(b"hello")
        );
        let parsed = parse(&xml);
        assert_eq!(parsed.resources.iter().next().unwrap().filename, "a.txt");
    }

    #[test]
    fn declared_filename_is_sanitized() {
        let bytes = b"data";
        let xml = EnexBuilder::new()
            .note("N", "")
            .resource(bytes, "image/png", Some("a/b:c#.png"))
            .build();
        let parsed = parse(&xml);
        assert_eq!(parsed.resources.get(&md5_hex(bytes)).unwrap().filename, "a_b_c_.png");
    }

    #[test]
    fn duplicate_content_first_seen_wins() {
        let bytes = b"same bytes";
        let xml = EnexBuilder::new()
            .note("One", "")
            .resource(bytes, "image/png", Some("first.png"))
            .note("Two", "")
            .resource(bytes, "image/jpeg", Some("second.jpg"))
            .build();
        let parsed = parse(&xml);
        assert_eq!(parsed.resources.len(), 1);
        let resource = parsed.resources.get(&md5_hex(bytes)).unwrap();
        assert_eq!(resource.filename, "first.png");
        assert_eq!(resource.mime_type, "image/png");
        assert_eq!(parsed.skipped_resources, 0);
    }

    #[test]
    fn distinct_content_with_same_filename_does_not_collide() {
        let xml = EnexBuilder::new()
            .note("N", "")
            .resource(b"one", "image/png", Some("image.png"))
            .resource(b"two", "image/png", Some("image.png"))
            .build();
        let parsed = parse(&xml);
        let names: Vec<&str> = parsed.resources.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names[0], "image.png");
        assert_eq!(names[1], format!("image_{}.png", md5_hex(b"two")));
    }

    #[test]
    fn long_multibyte_filenames_stay_within_name_limit() {
        let declared = format!("{}.pdf", "資料".repeat(100));
        let xml = EnexBuilder::new()
            .note("N", "")
            .resource(b"one", "application/pdf", Some(&declared))
            .resource(b"two", "application/pdf", Some(&declared))
            .build();
        let parsed = parse(&xml);
        assert_eq!(parsed.resources.len(), 2);
        for resource in parsed.resources.iter() {
            assert!(resource.filename.len() <= 255, "{}", resource.filename);
        }
    }

    #[test]
    fn wrapped_base64_is_decoded() {
        let bytes: Vec<u8> = (0..=255).collect();
        let encoded = b64(&bytes);
        let wrapped: String = encoded
            .as_bytes()
            .chunks(76)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n    ");
        let xml = format!(
            "<en-export><note><resource><data encoding=\"base64\">\n    {wrapped}\n</data>\
             <mime>application/octet-stream</mime></resource></note></en-export>"
        );
        let parsed = parse(&xml);
        assert_eq!(parsed.resources.get(&md5_hex(&bytes)).unwrap().data, bytes);
    }

    #[test]
    fn resources_missing_fields_are_skipped() {
        let xml = format!(
            "<en-export><note>\
             <resource><mime>image/png</mime></resource>\
             <resource><data>{}</data></resource>\
             <resource><data>  </data><mime>image/png</mime></resource>\
             <resource/>\
             </note></en-export>",
            b64(b"x")
        );
        let parsed = parse(&xml);
        assert!(parsed.resources.is_empty());
        assert_eq!(parsed.skipped_resources, 4);
        assert_eq!(parsed.notes.len(), 1);
    }

    #[test]
    fn undecodable_resource_is_skipped_not_fatal() {
        let xml = format!(
            "<en-export><note><title>Kept</title>\
             <resource><data>!!!not base64!!!</data><mime>image/png</mime></resource>\
             <resource><data>{}</data><mime>image/png</mime></resource>\
             </note></en-export>",
            b64(b"good")
        );
        let parsed = parse(&xml);
        assert_eq!(parsed.skipped_resources, 1);
        assert_eq!(parsed.resources.len(), 1);
        assert_eq!(parsed.notes[0].title, "Kept");
    }

    #[test]
    fn malformed_xml_is_fatal() {
        let err = parse_err("<en-export><note><title>x</note></en-export>");
        assert!(matches!(err, ParseError::MalformedArchive { .. }));
    }

    #[test]
    fn truncated_document_is_fatal() {
        let err = parse_err("<en-export><note><title>x</title>");
        match err {
            ParseError::MalformedArchive { path, reason } => {
                assert_eq!(path, Path::new("bad.enex"));
                assert!(reason.contains("note"), "reason: {reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_xml_is_fatal() {
        assert!(matches!(parse_err(""), ParseError::MalformedArchive { .. }));
        assert!(matches!(
            parse_err("just some text"),
            ParseError::MalformedArchive { .. }
        ));
    }

    #[test]
    fn doctype_and_declaration_are_ignored() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                   <!DOCTYPE en-export SYSTEM \"http://xml.evernote.com/pub/evernote-export3.dtd\">\n\
                   <en-export export-date=\"20240101T000000Z\"><note><title>T</title></note></en-export>";
        let parsed = parse(xml);
        assert_eq!(parsed.notes.len(), 1);
    }

    #[test]
    fn empty_export_has_no_notes() {
        let parsed = parse("<en-export></en-export>");
        assert!(parsed.notes.is_empty());
        assert!(parsed.resources.is_empty());
    }

    #[test]
    fn parse_archive_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a.enex");
        std::fs::write(&path, EnexBuilder::new().note("From disk", "").build()).unwrap();
        let parsed = parse_archive(&path, &NoteDefaults::default()).unwrap();
        assert_eq!(parsed.notes[0].title, "From disk");
    }

    #[test]
    fn parse_archive_missing_file_is_io_error() {
        let err = parse_archive(Path::new("/nonexistent/x.enex"), &NoteDefaults::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }
}
