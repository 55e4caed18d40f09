//! Pipeline orchestration: input directory in, static site out.
//!
//! ## Output Structure
//!
//! ```text
//! output/
//! ├── index.html                       # Global table of contents
//! ├── assets/
//! │   ├── css/{light,dark}.css
//! │   └── js/theme-switcher.js
//! └── notebooks/
//!     └── Work_Notes/                  # One folder per archive
//!         ├── index.html               # Collection index
//!         ├── note_001_Kickoff.html
//!         ├── note_002_Budget.html
//!         └── media/                   # Only when the archive has resources
//!             └── diagram.png
//! ```
//!
//! ## Run Order
//!
//! 1. Pre-flight: the input must exist, be a directory, and hold at least one
//!    archive. Nothing is written before these pass.
//! 2. Theme templates are loaded and assets copied. A missing template or
//!    asset aborts the run before any archive is touched.
//! 3. Archives are processed one at a time, sorted by file name. Each one is
//!    parsed completely, its resources written, then every note rewritten and
//!    rendered in parse order, then its collection index.
//! 4. The global index is written last from the collections that succeeded.
//!
//! A malformed archive is logged and skipped; the remaining archives still
//! run. Filesystem errors abort the whole run.
//!
//! Every derived path is a pure function of the input, and every file is
//! overwritten, so rerunning into the same output directory reproduces it
//! byte for byte.

use crate::config::{ConfigError, ExportConfig};
use crate::generate::{PageGenerator, SiteInfo};
use crate::naming::{collection_dir_name, collection_display_name, note_filename};
use crate::parse::{NoteDefaults, ParseError, parse_archive};
use crate::rewrite::rewrite_content;
use crate::template::{TemplateError, TemplateSet, copy_assets};
use crate::types::Collection;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Folder under the output root that holds one subfolder per archive.
pub const NOTEBOOKS_DIR: &str = "notebooks";
/// Per-collection folder for extracted resources.
pub const MEDIA_DIR: &str = "media";
/// File name of both the global index and each collection index.
pub const INDEX_FILE: &str = "index.html";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Theme error: {0}")]
    Template(#[from] TemplateError),
    #[error("Input directory not found: {0}")]
    InputNotFound(PathBuf),
    #[error("Input is not a directory: {0}")]
    InputNotADirectory(PathBuf),
    #[error("No .{extension} archives found in {dir}")]
    NoArchivesFound { dir: PathBuf, extension: String },
}

impl ExportError {
    /// Process exit status. Pre-flight failures each get their own code.
    pub fn exit_code(&self) -> u8 {
        match self {
            ExportError::InputNotFound(_) => 2,
            ExportError::InputNotADirectory(_) => 3,
            ExportError::NoArchivesFound { .. } => 4,
            _ => 1,
        }
    }
}

/// An archive that could not be parsed and was left out of the site.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedArchive {
    pub path: PathBuf,
    pub reason: String,
}

/// What a run produced, for the end-of-run summary.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Successfully exported collections, in processing order
    pub collections: Vec<Collection>,
    pub failed: Vec<FailedArchive>,
    /// Resources dropped across all archives for missing or undecodable data
    pub skipped_resources: usize,
}

impl ExportReport {
    pub fn total_notes(&self) -> usize {
        self.collections.iter().map(|c| c.note_count).sum()
    }

    pub fn total_media(&self) -> usize {
        self.collections.iter().map(|c| c.media_count).sum()
    }
}

/// Fail unless `input` is an existing directory.
pub fn check_input(input: &Path) -> Result<(), ExportError> {
    if !input.exists() {
        return Err(ExportError::InputNotFound(input.to_path_buf()));
    }
    if !input.is_dir() {
        return Err(ExportError::InputNotADirectory(input.to_path_buf()));
    }
    Ok(())
}

/// Archive files directly inside `input` with the given extension, sorted by
/// file name. Subdirectories are not searched.
pub fn discover_archives(input: &Path, extension: &str) -> Result<Vec<PathBuf>, ExportError> {
    let mut archives = Vec::new();
    for entry in WalkDir::new(input)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(extension)
        {
            archives.push(path.to_path_buf());
        }
    }
    Ok(archives)
}

/// All pre-flight checks. Returns the archives to process.
pub fn preflight(input: &Path, extension: &str) -> Result<Vec<PathBuf>, ExportError> {
    check_input(input)?;
    let archives = discover_archives(input, extension)?;
    if archives.is_empty() {
        return Err(ExportError::NoArchivesFound {
            dir: input.to_path_buf(),
            extension: extension.to_string(),
        });
    }
    Ok(archives)
}

/// Convert every archive in `input` into a static site under `output`.
pub fn export(
    input: &Path,
    output: &Path,
    config: &ExportConfig,
    site: &SiteInfo,
) -> Result<ExportReport, ExportError> {
    let archives = preflight(input, &config.archive_extension)?;
    info!(count = archives.len(), input = %input.display(), "found archives");

    let source = config.theme_source();
    let templates = TemplateSet::load(&source, &config.theme)?;
    fs::create_dir_all(output)?;
    let assets = copy_assets(&source, output)?;
    debug!(theme = %config.theme, assets = assets.len(), "theme ready");

    let generator = PageGenerator::new(&templates, site);
    let defaults = config.note_defaults();
    let notebooks = output.join(NOTEBOOKS_DIR);
    let mut report = ExportReport::default();
    let mut used_dirs = HashSet::new();

    for archive in &archives {
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = collection_dir_name(&file_name);
        let dir_name = free_dir_name(&base, &used_dirs);
        if dir_name != base {
            warn!(
                archive = %archive.display(),
                folder = %dir_name,
                "collection folder {base} already taken, using {dir_name}"
            );
        }

        let target = ArchiveTarget {
            path: archive,
            name: collection_display_name(&file_name, &config.archive_extension),
            dir: notebooks.join(&dir_name),
            dir_name,
        };
        match export_archive(target, &generator, &defaults) {
            Ok((collection, skipped)) => {
                used_dirs.insert(collection.dir_name.clone());
                report.skipped_resources += skipped;
                report.collections.push(collection);
            }
            Err(ArchiveError::Malformed { path, reason }) => {
                warn!(archive = %path.display(), %reason, "skipping malformed archive");
                report.failed.push(FailedArchive { path, reason });
            }
            Err(ArchiveError::Fatal(e)) => return Err(e),
        }
    }

    let index = generator.render_global_index(&report.collections);
    fs::write(output.join(INDEX_FILE), index)?;
    info!(
        collections = report.collections.len(),
        notes = report.total_notes(),
        failed = report.failed.len(),
        "export complete"
    );

    Ok(report)
}

/// Outcome of one archive: skipped when malformed, fatal otherwise.
enum ArchiveError {
    Malformed { path: PathBuf, reason: String },
    Fatal(ExportError),
}

impl From<std::io::Error> for ArchiveError {
    fn from(e: std::io::Error) -> Self {
        ArchiveError::Fatal(e.into())
    }
}

/// `base`, or `base_2`, `base_3`, ... when earlier archives already own it.
fn free_dir_name(base: &str, used: &HashSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// One archive and where its collection goes.
struct ArchiveTarget<'a> {
    path: &'a Path,
    /// Display name for headings and links
    name: String,
    /// Folder name under `notebooks/`, unique within the run
    dir_name: String,
    dir: PathBuf,
}

fn export_archive(
    target: ArchiveTarget,
    generator: &PageGenerator,
    defaults: &NoteDefaults,
) -> Result<(Collection, usize), ArchiveError> {
    let ArchiveTarget {
        path: archive,
        name,
        dir_name,
        dir: collection_dir,
    } = target;
    let mut parsed = match parse_archive(archive, defaults) {
        Ok(parsed) => parsed,
        Err(ParseError::MalformedArchive { path, reason }) => {
            return Err(ArchiveError::Malformed { path, reason });
        }
        Err(ParseError::Io(e)) => return Err(e.into()),
    };

    fs::create_dir_all(&collection_dir)?;
    debug!(
        archive = %archive.display(),
        notes = parsed.notes.len(),
        resources = parsed.resources.len(),
        "parsed archive"
    );

    if !parsed.resources.is_empty() {
        let media_dir = collection_dir.join(MEDIA_DIR);
        fs::create_dir_all(&media_dir)?;
        for resource in parsed.resources.iter() {
            fs::write(media_dir.join(&resource.filename), &resource.data)?;
        }
    }

    for (idx, note) in parsed.notes.iter_mut().enumerate() {
        note.content = rewrite_content(&note.content, &parsed.resources);
        let html = generator.render_note(note, &name);
        fs::write(collection_dir.join(note_filename(idx, &note.title)), html)?;
    }

    let index = generator.render_collection_index(&name, &parsed.notes);
    fs::write(collection_dir.join(INDEX_FILE), index)?;

    info!(
        collection = %name,
        notes = parsed.notes.len(),
        media = parsed.resources.len(),
        "exported collection"
    );

    Ok((
        Collection {
            name,
            dir_name,
            note_count: parsed.notes.len(),
            media_count: parsed.resources.len(),
        },
        parsed.skipped_resources,
    ))
}
