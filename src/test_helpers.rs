//! Shared test utilities for the enex-archive test suite.
//!
//! [`EnexBuilder`] writes small but realistic `.enex` documents so tests can
//! describe archives by their notes and attachments instead of hand-written
//! XML.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let xml = EnexBuilder::new()
//!     .note("Trip", r#"<en-note><en-media hash="..." type="image/png"/></en-note>"#)
//!     .resource(b"png bytes", "image/png", Some("map.png"))
//!     .note("Plain", "<en-note>text</en-note>")
//!     .build();
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};
use quick_xml::escape::escape;
use std::path::Path;

/// Base64 with the standard alphabet and padding.
pub fn b64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Lowercase hex MD5, the key archives use for resources.
pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", Md5::digest(bytes))
}

struct FixtureResource {
    data: Vec<u8>,
    mime: String,
    filename: Option<String>,
}

struct FixtureNote {
    title: String,
    content: String,
    resources: Vec<FixtureResource>,
}

/// Builder for `.enex` documents.
#[derive(Default)]
pub struct EnexBuilder {
    notes: Vec<FixtureNote>,
}

impl EnexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a note. `content` is wrapped in CDATA as exporters do; an empty
    /// string produces an empty `<content/>` element.
    pub fn note(mut self, title: &str, content: &str) -> Self {
        self.notes.push(FixtureNote {
            title: title.to_string(),
            content: content.to_string(),
            resources: Vec::new(),
        });
        self
    }

    /// Attach a resource to the most recently added note.
    pub fn resource(mut self, data: &[u8], mime: &str, filename: Option<&str>) -> Self {
        let note = self
            .notes
            .last_mut()
            .expect("add a note before attaching resources");
        note.resources.push(FixtureResource {
            data: data.to_vec(),
            mime: mime.to_string(),
            filename: filename.map(str::to_string),
        });
        self
    }

    pub fn build(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <!DOCTYPE en-export SYSTEM \"http://xml.evernote.com/pub/evernote-export3.dtd\">\n\
             <en-export export-date=\"20240101T000000Z\" application=\"Evernote\" version=\"10\">\n",
        );
        for note in &self.notes {
            xml.push_str("  <note>\n");
            xml.push_str(&format!("    <title>{}</title>\n", escape(&note.title)));
            if note.content.is_empty() {
                xml.push_str("    <content/>\n");
            } else {
                xml.push_str(&format!(
                    "    <content><![CDATA[{}]]></content>\n",
                    note.content
                ));
            }
            xml.push_str("    <created>20240101T120000Z</created>\n");
            xml.push_str("    <updated>20240102T120000Z</updated>\n");
            for resource in &note.resources {
                xml.push_str("    <resource>\n");
                xml.push_str(&format!(
                    "      <data encoding=\"base64\">{}</data>\n",
                    b64(&resource.data)
                ));
                xml.push_str(&format!("      <mime>{}</mime>\n", resource.mime));
                if let Some(name) = &resource.filename {
                    xml.push_str(&format!(
                        "      <resource-attributes><file-name>{}</file-name></resource-attributes>\n",
                        escape(name)
                    ));
                }
                xml.push_str("    </resource>\n");
            }
            xml.push_str("  </note>\n");
        }
        xml.push_str("</en-export>\n");
        xml
    }

    /// Write the document to `dir/name` and return its path.
    pub fn write_to(&self, dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}
