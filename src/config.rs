//! Export configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by a user file, which is looked up in this order:
//!
//! 1. `--config <file>` on the command line (must exist)
//! 2. `config.toml` in the input directory, if present
//! 3. none: stock defaults only
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! theme = "dark"               # "light" or "dark" (or a theme in themes_dir)
//! archive_extension = "enex"   # suffix of archive files in the input directory
//! # themes_dir = "my-themes"   # read templates/assets from disk instead
//!
//! [site]
//! project_name = "enex-archive"
//! project_url = "https://github.com/enex-archive/enex-archive"
//!
//! [defaults]
//! untitled_title = "Untitled"
//! empty_content = "<p>No content</p>"
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::generate::SiteInfo;
use crate::parse::NoteDefaults;
use crate::template::{BUILTIN_THEMES, ThemeSource};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the input directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Export configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Theme name: a built-in theme, or a subdirectory of `themes_dir`.
    pub theme: String,
    /// Archive files are the input directory entries ending in `.<extension>`.
    pub archive_extension: String,
    /// Directory holding `<theme>/` templates and `assets/`. When unset the
    /// built-in themes are used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub themes_dir: Option<PathBuf>,
    /// Footer metadata.
    pub site: SiteConfig,
    /// Placeholders for notes without title or body.
    pub defaults: DefaultsConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            archive_extension: "enex".to_string(),
            themes_dir: None,
            site: SiteConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.theme.trim().is_empty() {
            return Err(ConfigError::Validation("theme must not be empty".into()));
        }
        if self.themes_dir.is_none() && !BUILTIN_THEMES.contains(&self.theme.as_str()) {
            return Err(ConfigError::Validation(format!(
                "theme must be one of {BUILTIN_THEMES:?} unless themes_dir is set, got {:?}",
                self.theme
            )));
        }
        let ext = &self.archive_extension;
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(ConfigError::Validation(
                "archive_extension must be a bare suffix like \"enex\"".into(),
            ));
        }
        if self.defaults.untitled_title.trim().is_empty() {
            return Err(ConfigError::Validation(
                "defaults.untitled_title must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn theme_source(&self) -> ThemeSource {
        ThemeSource::from_dir(self.themes_dir.as_deref())
    }

    pub fn note_defaults(&self) -> NoteDefaults {
        NoteDefaults {
            title: self.defaults.untitled_title.clone(),
            content: self.defaults.empty_content.clone(),
        }
    }

    /// Footer metadata for this run. The version comes from the build.
    pub fn site_info(&self, version: &str) -> SiteInfo {
        SiteInfo {
            project_name: self.site.project_name.clone(),
            version: version.to_string(),
            project_url: self.site.project_url.clone(),
        }
    }
}

/// Footer metadata settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub project_name: String,
    pub project_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            project_name: env!("CARGO_PKG_NAME").to_string(),
            project_url: env!("CARGO_PKG_REPOSITORY").to_string(),
        }
    }
}

/// Note placeholder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    pub untitled_title: String,
    pub empty_content: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let defaults = NoteDefaults::default();
        Self {
            untitled_title: defaults.title,
            empty_content: defaults.content,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ExportConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ExportConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ExportConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Which config file applies: the explicit one, else `config.toml` in the
/// input directory if it exists.
pub fn config_path(explicit: Option<&Path>, input_dir: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let candidate = input_dir.join(CONFIG_FILENAME);
            candidate.is_file().then_some(candidate)
        }
    }
}

/// Load config from `path` merged over stock defaults, or the defaults alone.
pub fn load_config(path: Option<&Path>) -> Result<ExportConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# enex-archive Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# The file is read from --config <file>, or from config.toml in the input
# directory. Unknown keys will cause an error.

# Theme for generated pages: "light" or "dark".
# With themes_dir set, any subdirectory name of themes_dir.
theme = "dark"

# Files in the input directory ending in .<archive_extension> are converted.
archive_extension = "enex"

# Read templates and assets from disk instead of the built-in themes.
# Expected layout: <themes_dir>/<theme>/{note,enex_index,main_toc}.html
# and <themes_dir>/assets/{css/light.css,css/dark.css,js/theme-switcher.js}
# themes_dir = "themes"

# ---------------------------------------------------------------------------
# Page footer
# ---------------------------------------------------------------------------
[site]
project_name = "enex-archive"
project_url = "https://github.com/enex-archive/enex-archive"

# ---------------------------------------------------------------------------
# Placeholders for incomplete notes
# ---------------------------------------------------------------------------
[defaults]
# Title for notes with a missing or empty <title>.
untitled_title = "Untitled"

# Body for notes with a missing or empty <content>.
empty_content = "<p>No content</p>"
"##
}
