//! HTML page generation.
//!
//! Composes rewritten notes, collection summaries and footer metadata into
//! the three page kinds of the exported site:
//!
//! - **Note page** (`notebooks/{collection}/note_NNN_{title}.html`): one note
//! - **Collection index** (`notebooks/{collection}/index.html`): every note of
//!   one archive, in archive order
//! - **Global index** (`/index.html`): every collection with its note count
//!
//! Page chrome comes from the theme's templates (see [`crate::template`]).
//! The fragments spliced into them (link lists, note metadata) are built with
//! [maud](https://maud.lambda.xyz/), so titles and collection names are
//! HTML-escaped. Note bodies are inserted verbatim: they are already markup.

use crate::naming::{link_target, note_filename};
use crate::template::{TemplateKind, TemplateSet, TemplateVars};
use crate::types::{Collection, Note};
use maud::{Markup, html};

/// Package version on a release tag, `dev@<git hash>` otherwise.
pub const BUILD_VERSION: &str = env!("BUILD_VERSION");

/// Footer metadata shown on every page.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteInfo {
    pub project_name: String,
    pub version: String,
    pub project_url: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            project_name: env!("CARGO_PKG_NAME").to_string(),
            version: BUILD_VERSION.to_string(),
            project_url: env!("CARGO_PKG_REPOSITORY").to_string(),
        }
    }
}

/// Renders pages from a loaded theme.
pub struct PageGenerator<'a> {
    templates: &'a TemplateSet,
    site: &'a SiteInfo,
}

impl<'a> PageGenerator<'a> {
    pub fn new(templates: &'a TemplateSet, site: &'a SiteInfo) -> Self {
        Self { templates, site }
    }

    /// Variables shared by all page kinds.
    fn base_vars(&self) -> TemplateVars {
        TemplateVars::new()
            .set("project_name", escape(&self.site.project_name))
            .set("version", escape(&self.site.version))
            .set("github_url", escape(&self.site.project_url))
    }

    /// Render one note. `note.content` must already be rewritten.
    pub fn render_note(&self, note: &Note, collection_name: &str) -> String {
        let vars = self
            .base_vars()
            .set("title", escape(&note.title))
            .set("enex_name", escape(collection_name))
            .set("note_meta", note_meta(note).into_string())
            .set("content", &note.content);
        self.templates.render(TemplateKind::Note, &vars)
    }

    /// Render a collection index linking every note in order.
    pub fn render_collection_index(&self, collection_name: &str, notes: &[Note]) -> String {
        let vars = self
            .base_vars()
            .set("enex_name", escape(collection_name))
            .set("note_count", notes.len())
            .set("note_links", note_links(notes).into_string());
        self.templates.render(TemplateKind::CollectionIndex, &vars)
    }

    /// Render the table of contents over all collections.
    pub fn render_global_index(&self, collections: &[Collection]) -> String {
        let total_notes: usize = collections.iter().map(|c| c.note_count).sum();
        let vars = self
            .base_vars()
            .set("collection_links", collection_links(collections).into_string())
            .set("total_collections", collections.len())
            .set("total_notes", total_notes);
        self.templates.render(TemplateKind::GlobalIndex, &vars)
    }
}

fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

/// Created/updated line; empty when the note has neither.
fn note_meta(note: &Note) -> Markup {
    html! {
        @if note.created.is_some() || note.updated.is_some() {
            p.note-meta {
                @if let Some(created) = &note.created {
                    span.created { "Created " (created) }
                }
                @if note.created.is_some() && note.updated.is_some() {
                    " · "
                }
                @if let Some(updated) = &note.updated {
                    span.updated { "Updated " (updated) }
                }
            }
        }
    }
}

/// One `<li>` per note, linking the note's page by its positional filename.
pub fn note_links(notes: &[Note]) -> Markup {
    html! {
        @for (idx, note) in notes.iter().enumerate() {
            li {
                a href=(link_target(&note_filename(idx, &note.title))) { (note.title) }
            }
            "\n"
        }
    }
}

/// One `<li>` per collection, linking its index page.
pub fn collection_links(collections: &[Collection]) -> Markup {
    html! {
        @for collection in collections {
            li {
                a href={ "notebooks/" (link_target(&collection.dir_name)) "/index.html" } { (collection.name) }
                " "
                span.note-count { "(" (collection.note_count) " notes)" }
            }
            "\n"
        }
    }
}
