//! CLI output formatting for the end-of-run summary.
//!
//! # Information-First Display
//!
//! Each collection is listed by its positional index and display name, with
//! the output folder shown as an indented `Folder:` context line, then a
//! totals line. Skipped resources and malformed archives are reported as
//! warnings on stderr while the run happens and do not appear here.
//!
//! # Output Format
//!
//! ```text
//! Collections
//! 001 Recipes ........................... 5 notes, 0 media
//!     Folder: notebooks/Recipes/
//! 002 Work Notes ........................ 2 notes, 1 media
//!     Folder: notebooks/Work_Notes/
//!
//! Exported 2 collections, 7 notes, 1 media file
//! ```
//!
//! # Architecture
//!
//! [`format_export_summary`] returns `Vec<String>` for testability and
//! [`print_export_summary`] writes it to stdout. Formatting is pure: no I/O,
//! no side effects. Log lines go to stderr through `tracing` and never mix
//! with this output.

use crate::export::{ExportReport, NOTEBOOKS_DIR};
use crate::naming::format_index;

/// Column the dot leaders of collection lines run up to.
const LEADER_WIDTH: usize = 40;

/// Pad `label` with a dot leader up to [`LEADER_WIDTH`]. Long labels still
/// get a short leader so the counts stay readable.
fn dot_leader(label: &str) -> String {
    let used = label.chars().count() + 1;
    let dots = LEADER_WIDTH.saturating_sub(used).max(3);
    format!("{} {}", label, ".".repeat(dots))
}

fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}", n, plural)
    }
}

/// Format the summary of a finished export.
pub fn format_export_summary(report: &ExportReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Collections".to_string());
    for (i, collection) in report.collections.iter().enumerate() {
        let label = format!("{} {}", format_index(i + 1), collection.name);
        lines.push(format!(
            "{} {} notes, {} media",
            dot_leader(&label),
            collection.note_count,
            collection.media_count
        ));
        lines.push(format!(
            "    Folder: {}/{}/",
            NOTEBOOKS_DIR, collection.dir_name
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Exported {}, {}, {}",
        plural(report.collections.len(), "collection", "collections"),
        plural(report.total_notes(), "note", "notes"),
        plural(report.total_media(), "media file", "media files")
    ));

    lines
}

/// Print the export summary to stdout.
pub fn print_export_summary(report: &ExportReport) {
    for line in format_export_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::FailedArchive;
    use crate::types::Collection;
    use std::path::PathBuf;

    fn collection(name: &str, dir: &str, notes: usize, media: usize) -> Collection {
        Collection {
            name: name.to_string(),
            dir_name: dir.to_string(),
            note_count: notes,
            media_count: media,
        }
    }

    #[test]
    fn dot_leader_pads_to_width() {
        let line = dot_leader("001 Recipes");
        assert_eq!(line.chars().count(), LEADER_WIDTH);
        assert!(line.starts_with("001 Recipes ."));
        assert!(line.ends_with('.'));
    }

    #[test]
    fn dot_leader_long_label_keeps_minimum() {
        let label = "x".repeat(60);
        assert_eq!(dot_leader(&label), format!("{} ...", label));
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "note", "notes"), "1 note");
        assert_eq!(plural(0, "note", "notes"), "0 notes");
        assert_eq!(plural(2, "note", "notes"), "2 notes");
    }

    #[test]
    fn summary_lists_collections_in_order() {
        let report = ExportReport {
            collections: vec![
                collection("Recipes", "Recipes", 5, 0),
                collection("Work Notes", "Work_Notes", 2, 1),
            ],
            ..ExportReport::default()
        };
        let lines = format_export_summary(&report);

        assert_eq!(lines[0], "Collections");
        assert!(lines[1].starts_with("001 Recipes ."));
        assert!(lines[1].ends_with(" 5 notes, 0 media"));
        assert_eq!(lines[2], "    Folder: notebooks/Recipes/");
        assert!(lines[3].starts_with("002 Work Notes ."));
        assert!(lines[3].ends_with(" 2 notes, 1 media"));
        assert_eq!(lines[4], "    Folder: notebooks/Work_Notes/");
        assert_eq!(
            lines.last().unwrap(),
            "Exported 2 collections, 7 notes, 1 media file"
        );
    }

    #[test]
    fn summary_counts_align() {
        let report = ExportReport {
            collections: vec![
                collection("A", "A", 1, 0),
                collection("A much longer name", "B", 1, 0),
            ],
            ..ExportReport::default()
        };
        let lines = format_export_summary(&report);
        let a = lines[1].find(" 1 notes").unwrap();
        let b = lines[3].find(" 1 notes").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, LEADER_WIDTH);
    }

    #[test]
    fn summary_leaves_out_warnings() {
        let report = ExportReport {
            collections: vec![collection("Good", "Good", 1, 0)],
            failed: vec![FailedArchive {
                path: PathBuf::from("/in/Broken.enex"),
                reason: "unexpected end of file".to_string(),
            }],
            skipped_resources: 3,
        };
        let lines = format_export_summary(&report);
        assert!(!lines.iter().any(|l| l.contains("Broken")));
        assert!(!lines.iter().any(|l| l.contains("Skipped")));
        assert_eq!(
            lines.last().unwrap(),
            "Exported 1 collection, 1 note, 0 media files"
        );
    }

    #[test]
    fn summary_empty_report() {
        let lines = format_export_summary(&ExportReport::default());
        assert_eq!(
            lines,
            vec![
                "Collections".to_string(),
                String::new(),
                "Exported 0 collections, 0 notes, 0 media files".to_string(),
            ]
        );
    }
}
