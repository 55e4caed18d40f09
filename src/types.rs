//! Shared types passed between pipeline stages.
//!
//! The parser produces [`Note`]s and a [`ResourceMap`], the rewriter reads the
//! map to resolve media references, and the exporter accumulates one
//! [`Collection`] per archive for the global index.

use std::collections::HashMap;

/// One exported note.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Note title, never empty (defaults to "Untitled")
    pub title: String,
    /// Raw markup body. Replaced once by the rewriter before rendering.
    pub content: String,
    /// Creation timestamp, passed through verbatim
    pub created: Option<String>,
    /// Last modification timestamp, passed through verbatim
    pub updated: Option<String>,
}

/// One binary attachment, identified by the digest of its bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Lowercase hex MD5 of `data`
    pub hash: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    /// Sanitized filename under the collection's `media/` folder
    pub filename: String,
}

impl Resource {
    pub fn is_image(&self) -> bool {
        self.mime_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

/// Resources of one archive, keyed by content hash, in first-seen order.
///
/// Inserting a hash that is already present is a no-op: the first resource
/// with given bytes keeps its metadata (MIME type, filename).
#[derive(Debug, Clone, Default)]
pub struct ResourceMap {
    entries: Vec<Resource>,
    /// Runtime index: hash → position in `entries`.
    index: HashMap<String, usize>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the hash is already known. Returns `true` if inserted.
    pub fn insert(&mut self, resource: Resource) -> bool {
        if self.index.contains_key(&resource.hash) {
            return false;
        }
        self.index.insert(resource.hash.clone(), self.entries.len());
        self.entries.push(resource);
        true
    }

    pub fn get(&self, hash: &str) -> Option<&Resource> {
        self.index.get(hash).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.index.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resources in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.entries.iter()
    }
}

/// One archive's contribution to the global index.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// Display name (archive file name without its suffix)
    pub name: String,
    /// Sanitized output folder under `notebooks/`
    pub dir_name: String,
    pub note_count: usize,
    pub media_count: usize,
}
