//! CLI output formatting for both passes.
//!
//! # Output Format
//!
//! ## Dedup
//!
//! ```text
//! Scanned 12 images for duplicates
//! Removed duplicates:
//!   Removed src/assets/portfolio/c.jpg (kept src/assets/portfolio/a.jpg)
//! ```
//!
//! ## Compress
//!
//! ```text
//! Compressed public/images/hero.jpg (-412.3 kB)
//! Skipped public/images/logo.png
//! Failed public/images/broken.webp: Decode failed: ...
//! Compression summary:
//!   Files processed: 3
//!   Files optimized: 1
//!   Files skipped: 2 (1 failed)
//!   Total savings: 412.3 kB
//! ```
//!
//! Paths are shown relative to the project root when they live under it.
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. Diagnostics go through
//! `tracing` to stderr, never through here.

use crate::pipeline::{CompressEvent, CompressionSummary, DedupSummary};
use std::path::Path;

/// `path` relative to `base` when it is under it, as written otherwise.
pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn kb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

// ============================================================================
// Dedup
// ============================================================================

pub fn format_dedup_summary(summary: &DedupSummary, base: &Path, dry_run: bool) -> Vec<String> {
    if summary.files_seen == 0 {
        return vec!["No portfolio images found.".to_string()];
    }

    let mut lines = vec![format!(
        "Scanned {} images for duplicates",
        summary.files_seen
    )];

    if summary.removed.is_empty() {
        lines.push("No duplicate images detected.".to_string());
    } else {
        let (header, verb) = if dry_run {
            ("Would remove duplicates:", "Would remove")
        } else {
            ("Removed duplicates:", "Removed")
        };
        lines.push(header.to_string());
        for removal in &summary.removed {
            lines.push(format!(
                "  {} {} (kept {})",
                verb,
                display_path(&removal.duplicate, base),
                display_path(&removal.kept, base)
            ));
        }
        lines.push(format!(
            "  Reclaimed: {:.1} kB",
            kb(summary.bytes_reclaimed)
        ));
    }

    if !summary.failures.is_empty() {
        lines.push(format!(
            "  Could not process {} file(s):",
            summary.failures.len()
        ));
        for failure in &summary.failures {
            lines.push(format!(
                "    {}: {}",
                display_path(&failure.path, base),
                failure.error
            ));
        }
    }

    lines
}

pub fn print_dedup_summary(summary: &DedupSummary, base: &Path, dry_run: bool) {
    for line in format_dedup_summary(summary, base, dry_run) {
        println!("{}", line);
    }
}

// ============================================================================
// Compress
// ============================================================================

pub fn format_compress_event(event: &CompressEvent, base: &Path) -> Vec<String> {
    match event {
        CompressEvent::Optimized {
            path,
            original_size_bytes,
            new_size_bytes,
        } => vec![format!(
            "Compressed {} (-{:.1} kB)",
            display_path(path, base),
            kb(original_size_bytes.saturating_sub(*new_size_bytes))
        )],
        CompressEvent::Skipped { path } => vec![format!("Skipped {}", display_path(path, base))],
        CompressEvent::Failed { path, error } => {
            vec![format!("Failed {}: {}", display_path(path, base), error)]
        }
    }
}

pub fn format_compress_summary(summary: &CompressionSummary) -> Vec<String> {
    if summary.files_seen == 0 {
        return vec!["No image files found for compression.".to_string()];
    }

    let skipped = if summary.failed > 0 {
        format!("{} ({} failed)", summary.skipped, summary.failed)
    } else {
        summary.skipped.to_string()
    };

    vec![
        "Compression summary:".to_string(),
        format!("  Files processed: {}", summary.files_seen),
        format!("  Files optimized: {}", summary.optimized),
        format!("  Files skipped: {}", skipped),
        format!("  Total savings: {:.1} kB", summary.saved_kb()),
    ]
}

pub fn print_compress_summary(summary: &CompressionSummary) {
    for line in format_compress_summary(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FileFailure;
    use crate::types::Removal;
    use std::path::PathBuf;

    fn base() -> PathBuf {
        PathBuf::from("/site")
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn display_path_strips_base() {
        assert_eq!(
            display_path(Path::new("/site/public/a.jpg"), &base()),
            "public/a.jpg"
        );
    }

    #[test]
    fn display_path_outside_base_is_unchanged() {
        assert_eq!(display_path(Path::new("/other/a.jpg"), &base()), "/other/a.jpg");
    }

    // =========================================================================
    // Dedup
    // =========================================================================

    fn removal() -> Removal {
        Removal {
            duplicate: "/site/portfolio/c.jpg".into(),
            kept: "/site/portfolio/a.jpg".into(),
            size_bytes: 2048,
        }
    }

    #[test]
    fn dedup_nothing_found() {
        let lines = format_dedup_summary(&DedupSummary::default(), &base(), false);
        assert_eq!(lines, vec!["No portfolio images found."]);
    }

    #[test]
    fn dedup_no_duplicates() {
        let summary = DedupSummary {
            files_seen: 3,
            unique: 3,
            ..DedupSummary::default()
        };
        let lines = format_dedup_summary(&summary, &base(), false);
        assert_eq!(
            lines,
            vec!["Scanned 3 images for duplicates", "No duplicate images detected."]
        );
    }

    #[test]
    fn dedup_lists_removals() {
        let summary = DedupSummary {
            files_seen: 3,
            unique: 2,
            removed: vec![removal()],
            bytes_reclaimed: 2048,
            ..DedupSummary::default()
        };
        let lines = format_dedup_summary(&summary, &base(), false);
        assert_eq!(
            lines,
            vec![
                "Scanned 3 images for duplicates",
                "Removed duplicates:",
                "  Removed portfolio/c.jpg (kept portfolio/a.jpg)",
                "  Reclaimed: 2.0 kB",
            ]
        );
    }

    #[test]
    fn dedup_dry_run_wording() {
        let summary = DedupSummary {
            files_seen: 2,
            unique: 1,
            removed: vec![removal()],
            bytes_reclaimed: 2048,
            ..DedupSummary::default()
        };
        let lines = format_dedup_summary(&summary, &base(), true);
        assert_eq!(lines[1], "Would remove duplicates:");
        assert_eq!(lines[2], "  Would remove portfolio/c.jpg (kept portfolio/a.jpg)");
    }

    #[test]
    fn dedup_lists_failures() {
        let summary = DedupSummary {
            files_seen: 2,
            unique: 1,
            failures: vec![FileFailure {
                path: "/site/portfolio/locked.jpg".into(),
                error: "permission denied".into(),
            }],
            ..DedupSummary::default()
        };
        let lines = format_dedup_summary(&summary, &base(), false);
        assert_eq!(lines[2], "  Could not process 1 file(s):");
        assert_eq!(lines[3], "    portfolio/locked.jpg: permission denied");
    }

    // =========================================================================
    // Compress
    // =========================================================================

    #[test]
    fn event_optimized() {
        let event = CompressEvent::Optimized {
            path: "/site/public/hero.jpg".into(),
            original_size_bytes: 500_000,
            new_size_bytes: 300_000,
        };
        assert_eq!(
            format_compress_event(&event, &base()),
            vec!["Compressed public/hero.jpg (-195.3 kB)"]
        );
    }

    #[test]
    fn event_skipped_and_failed() {
        let skipped = CompressEvent::Skipped {
            path: "/site/public/logo.png".into(),
        };
        assert_eq!(
            format_compress_event(&skipped, &base()),
            vec!["Skipped public/logo.png"]
        );

        let failed = CompressEvent::Failed {
            path: "/site/public/bad.webp".into(),
            error: "Decode failed: bad header".into(),
        };
        assert_eq!(
            format_compress_event(&failed, &base()),
            vec!["Failed public/bad.webp: Decode failed: bad header"]
        );
    }

    #[test]
    fn summary_lines() {
        let summary = CompressionSummary {
            files_seen: 3,
            optimized: 1,
            skipped: 2,
            failed: 0,
            bytes_saved: 1536,
            ..CompressionSummary::default()
        };
        assert_eq!(
            format_compress_summary(&summary),
            vec![
                "Compression summary:",
                "  Files processed: 3",
                "  Files optimized: 1",
                "  Files skipped: 2",
                "  Total savings: 1.5 kB",
            ]
        );
    }

    #[test]
    fn summary_mentions_failures() {
        let summary = CompressionSummary {
            files_seen: 2,
            skipped: 2,
            failed: 1,
            ..CompressionSummary::default()
        };
        let lines = format_compress_summary(&summary);
        assert_eq!(lines[3], "  Files skipped: 2 (1 failed)");
        assert_eq!(lines[4], "  Total savings: 0.0 kB");
    }

    #[test]
    fn summary_no_files() {
        assert_eq!(
            format_compress_summary(&CompressionSummary::default()),
            vec!["No image files found for compression."]
        );
    }
}
