//! # enex-archive
//!
//! Converts Evernote `.enex` exports into a browsable static HTML archive:
//! one page per note, attachments extracted to disk, a contents page per
//! notebook and a table of contents over all of them.
//!
//! # Architecture: Forward-Only Pipeline
//!
//! Each archive file flows through the same stages, one archive at a time:
//!
//! ```text
//! 1. Parse     notebook.enex  →  notes + resources   (XML → in-memory model)
//! 2. Extract   resources      →  media/              (decoded bytes, by hash)
//! 3. Rewrite   note bodies    →  clean markup        (media links, layout fixes)
//! 4. Generate  notes          →  *.html              (theme templates)
//! ```
//!
//! After the last archive, the global index is generated from the collected
//! per-archive counts. Nothing else is carried from one archive to the next.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`export`] | Orchestrator: pre-flight checks, discovery, writing the output tree |
//! | [`parse`] | Streams an archive's XML into [`types::Note`]s and a [`types::ResourceMap`] |
//! | [`rewrite`] | Resolves `en-media` markers and strips layout-breaking markup |
//! | [`generate`] | Composes note, collection index and global index pages |
//! | [`template`] | `<%name%>` placeholder substitution, built-in themes, asset copying |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`naming`] | Filename sanitizing and the note/collection naming rules |
//! | [`mime`] | MIME type → file extension |
//! | [`types`] | Shared model types |
//! | [`output`] | CLI summary formatting |
//!
//! # Design Decisions
//!
//! ## Content-Addressed Resources
//!
//! Archives reference attachments from note bodies by the MD5 of their bytes.
//! Resources are keyed by that digest, so identical attachments collapse to a
//! single file no matter how many notes embed them. The first occurrence names
//! the file.
//!
//! ## Regex Cleanup, Not Sanitizing
//!
//! Note bodies are clipped web pages and are kept as-is apart from a handful of
//! targeted regex passes that undo overlays, lightboxes and off-screen content.
//! A full HTML parser would normalize markup and change output in ways nobody
//! asked for.
//!
//! ## Placeholder Templates
//!
//! Page chrome is plain HTML with `<%name%>` placeholders, substituted in a
//! single pass. Unknown placeholders stay verbatim and values are never
//! re-scanned, so note text that happens to contain `<%...%>` is safe. The
//! fragments spliced in (link lists, metadata) are built with
//! [Maud](https://maud.lambda.xyz/) and auto-escaped.
//!
//! ## Deterministic Output
//!
//! Every output path is derived from the archive file name, note position and
//! title, or resource hash. Archives are processed in sorted order and every
//! file is overwritten, so rerunning into the same directory reproduces the
//! same bytes.

pub mod config;
pub mod export;
pub mod generate;
pub mod mime;
pub mod naming;
pub mod output;
pub mod parse;
pub mod rewrite;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
