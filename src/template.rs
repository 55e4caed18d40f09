//! Page templates and theme assets.
//!
//! A theme is three HTML templates plus a fixed set of static assets:
//!
//! ```text
//! themes/
//! ├── dark/
//! │   ├── note.html          # one note
//! │   ├── enex_index.html    # one collection
//! │   └── main_toc.html      # global table of contents
//! ├── light/
//! │   └── ...
//! └── assets/
//!     ├── css/light.css
//!     ├── css/dark.css
//!     └── js/theme-switcher.js
//! ```
//!
//! The `light` and `dark` themes are compiled into the binary. A themes
//! directory with the same layout can be configured instead, in which case
//! every file is read from disk and missing ones fail the run before any
//! archive is processed.
//!
//! ## Placeholders
//!
//! Templates contain `<%name%>` tokens. Rendering replaces each token whose
//! name has a value with that value, verbatim. Tokens without a value are
//! left in the output as-is, and values are never re-scanned for tokens.
//! There is no escaping, no conditionals and no loops: callers pass ready
//! HTML fragments.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Template not found: {0}")]
    TemplateNotFound(PathBuf),
    #[error("Theme asset not found: {0}")]
    AssetNotFound(PathBuf),
}

/// Themes compiled into the binary.
pub const BUILTIN_THEMES: &[&str] = &["light", "dark"];

/// Asset files every theme ships, relative to `assets/`.
pub const ASSET_FILES: &[&str] = &["css/light.css", "css/dark.css", "js/theme-switcher.js"];

struct BuiltinTheme {
    name: &'static str,
    note: &'static str,
    collection_index: &'static str,
    global_index: &'static str,
}

const BUILTIN: &[BuiltinTheme] = &[
    BuiltinTheme {
        name: "light",
        note: include_str!("../themes/light/note.html"),
        collection_index: include_str!("../themes/light/enex_index.html"),
        global_index: include_str!("../themes/light/main_toc.html"),
    },
    BuiltinTheme {
        name: "dark",
        note: include_str!("../themes/dark/note.html"),
        collection_index: include_str!("../themes/dark/enex_index.html"),
        global_index: include_str!("../themes/dark/main_toc.html"),
    },
];

const BUILTIN_ASSETS: &[(&str, &str)] = &[
    ("css/light.css", include_str!("../themes/assets/css/light.css")),
    ("css/dark.css", include_str!("../themes/assets/css/dark.css")),
    (
        "js/theme-switcher.js",
        include_str!("../themes/assets/js/theme-switcher.js"),
    ),
];

/// Where theme files come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeSource {
    Builtin,
    Directory(PathBuf),
}

impl ThemeSource {
    pub fn from_dir(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => ThemeSource::Directory(dir.to_path_buf()),
            None => ThemeSource::Builtin,
        }
    }
}

/// The three page kinds every theme provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Note,
    CollectionIndex,
    GlobalIndex,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 3] = [
        TemplateKind::Note,
        TemplateKind::CollectionIndex,
        TemplateKind::GlobalIndex,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            TemplateKind::Note => "note.html",
            TemplateKind::CollectionIndex => "enex_index.html",
            TemplateKind::GlobalIndex => "main_toc.html",
        }
    }
}

/// Values for one render call.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    values: HashMap<String, String>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to the string form of `value`, replacing any earlier value.
    pub fn set(mut self, name: &str, value: impl Display) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// A loaded theme: one template per [`TemplateKind`].
#[derive(Debug, Clone)]
pub struct TemplateSet {
    pub theme: String,
    note: String,
    collection_index: String,
    global_index: String,
}

impl TemplateSet {
    pub fn new(theme: &str, note: &str, collection_index: &str, global_index: &str) -> Self {
        Self {
            theme: theme.to_string(),
            note: note.to_string(),
            collection_index: collection_index.to_string(),
            global_index: global_index.to_string(),
        }
    }

    /// Load all three templates of `theme`.
    ///
    /// Fails with [`TemplateError::TemplateNotFound`] naming the first missing
    /// file (or, for the built-in source, an unknown theme name).
    pub fn load(source: &ThemeSource, theme: &str) -> Result<Self, TemplateError> {
        match source {
            ThemeSource::Builtin => {
                let builtin = BUILTIN.iter().find(|t| t.name == theme).ok_or_else(|| {
                    TemplateError::TemplateNotFound(
                        Path::new(theme).join(TemplateKind::Note.file_name()),
                    )
                })?;
                Ok(Self::new(
                    builtin.name,
                    builtin.note,
                    builtin.collection_index,
                    builtin.global_index,
                ))
            }
            ThemeSource::Directory(dir) => {
                let theme_dir = dir.join(theme);
                let read = |kind: TemplateKind| -> Result<String, TemplateError> {
                    let path = theme_dir.join(kind.file_name());
                    if !path.is_file() {
                        return Err(TemplateError::TemplateNotFound(path));
                    }
                    Ok(fs::read_to_string(&path)?)
                };
                Ok(Self {
                    theme: theme.to_string(),
                    note: read(TemplateKind::Note)?,
                    collection_index: read(TemplateKind::CollectionIndex)?,
                    global_index: read(TemplateKind::GlobalIndex)?,
                })
            }
        }
    }

    pub fn template(&self, kind: TemplateKind) -> &str {
        match kind {
            TemplateKind::Note => &self.note,
            TemplateKind::CollectionIndex => &self.collection_index,
            TemplateKind::GlobalIndex => &self.global_index,
        }
    }

    pub fn render(&self, kind: TemplateKind, vars: &TemplateVars) -> String {
        render_str(self.template(kind), vars)
    }
}

/// Substitute `<%name%>` tokens in `template`.
pub fn render_str(template: &str, vars: &TemplateVars) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("<%") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after
            .find("%>")
            .and_then(|end| vars.get(&after[..end]).map(|v| (end, v)));
        match value {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("<%");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Copy the theme's static assets to `<output_dir>/assets/`.
///
/// Every entry of [`ASSET_FILES`] must exist; nothing is copied if one is
/// missing. Returns the written paths.
pub fn copy_assets(source: &ThemeSource, output_dir: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    let assets_out = output_dir.join("assets");
    let mut written = Vec::new();

    match source {
        ThemeSource::Builtin => {
            for (rel, content) in BUILTIN_ASSETS {
                let dst = assets_out.join(rel);
                write_file(&dst, content.as_bytes())?;
                written.push(dst);
            }
        }
        ThemeSource::Directory(dir) => {
            let assets_in = dir.join("assets");
            if let Some(missing) = ASSET_FILES
                .iter()
                .map(|rel| assets_in.join(rel))
                .find(|p| !p.is_file())
            {
                return Err(TemplateError::AssetNotFound(missing));
            }
            for rel in ASSET_FILES {
                let dst = assets_out.join(rel);
                if let Some(parent) = dst.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(assets_in.join(rel), &dst)?;
                written.push(dst);
            }
        }
    }

    Ok(written)
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}
