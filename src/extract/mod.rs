//! Raw-image extraction from a ZIP archive
//!
//! Review datasets reference a subset of a large imagery archive. This
//! module pulls exactly the referenced files into a working folder.
//! Archive members are matched by basename; names that never turn up are
//! collected into a summary instead of failing the run.

use crate::error::Result;
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::info;
use zip::ZipArchive;

/// Outcome of one extraction run.
#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    /// Distinct file names requested.
    pub requested: usize,
    /// Files actually written.
    pub extracted: usize,
    /// Requested names absent from the archive, sorted.
    pub missing: Vec<String>,
}

impl ExtractSummary {
    pub fn all_found(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Extract every archive member whose basename appears in `wanted`.
pub fn extract_listed_images(
    archive_path: &Path,
    wanted: &HashSet<String>,
    output_dir: &Path,
) -> Result<ExtractSummary> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    std::fs::create_dir_all(output_dir)?;

    let mut found: HashSet<String> = HashSet::new();
    let progress = ProgressBar::new(archive.len() as u64);

    for index in 0..archive.len() {
        progress.inc(1);
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let Some(basename) = entry
            .enclosed_name()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        else {
            continue;
        };

        if !wanted.contains(&basename) || found.contains(&basename) {
            continue;
        }

        let mut output = File::create(output_dir.join(&basename))?;
        io::copy(&mut entry, &mut output)?;
        found.insert(basename);
    }
    progress.finish_and_clear();

    let mut missing: Vec<String> = wanted.difference(&found).cloned().collect();
    missing.sort();

    let summary = ExtractSummary {
        requested: wanted.len(),
        extracted: found.len(),
        missing,
    };
    info!(
        requested = summary.requested,
        extracted = summary.extracted,
        missing = summary.missing.len(),
        "image extraction finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_archive(path: &Path, names: &[&str]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for name in names {
            writer.start_file(*name, options).unwrap();
            writer.write_all(b"fake image bytes").unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_subset_and_missing_summary() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("images.zip");
        build_archive(
            &archive_path,
            &["panos/a.jpg", "panos/b.jpg", "panos/unrelated.jpg"],
        );

        let wanted: HashSet<String> = ["a.jpg", "b.jpg", "ghost.jpg"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let output_dir = dir.path().join("out");
        let summary = extract_listed_images(&archive_path, &wanted, &output_dir).unwrap();

        assert_eq!(summary.requested, 3);
        assert_eq!(summary.extracted, 2);
        assert_eq!(summary.missing, vec!["ghost.jpg".to_string()]);
        assert!(!summary.all_found());

        assert!(output_dir.join("a.jpg").exists());
        assert!(output_dir.join("b.jpg").exists());
        assert!(!output_dir.join("unrelated.jpg").exists());
    }

    #[test]
    fn test_extract_all_found() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("images.zip");
        build_archive(&archive_path, &["a.jpg"]);

        let wanted: HashSet<String> = std::iter::once("a.jpg".to_string()).collect();
        let summary =
            extract_listed_images(&archive_path, &wanted, &dir.path().join("out")).unwrap();
        assert!(summary.all_found());
        assert_eq!(summary.extracted, 1);
    }

    #[test]
    fn test_extract_missing_archive_is_fatal() {
        let wanted = HashSet::new();
        let result = extract_listed_images(
            Path::new("/nonexistent/images.zip"),
            &wanted,
            Path::new("/tmp/out"),
        );
        assert!(result.is_err());
    }
}
