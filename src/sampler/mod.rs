//! Reproducible review subsets
//!
//! Full runs cover thousands of images; review sessions look at a sample.
//! Matched and unmatched images are sampled separately so both outcomes
//! stay represented, with a fixed seed so a session can be re-created.

use crate::types::DetectionRow;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use tracing::info;

/// Sample up to `count` distinct images from each of the matched and
/// unmatched pools. An image counts as matched if any of its rows carries
/// a survey match.
pub fn sample_file_names(rows: &[DetectionRow], count: usize, seed: u64) -> Vec<String> {
    let mut matched_files: HashSet<&str> = HashSet::new();
    for row in rows {
        if row.is_matched() {
            matched_files.insert(row.file_name.as_str());
        }
    }

    // Distinct file names in first-appearance order, split by outcome.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut matched_pool: Vec<&str> = Vec::new();
    let mut unmatched_pool: Vec<&str> = Vec::new();
    for row in rows {
        if !seen.insert(row.file_name.as_str()) {
            continue;
        }
        if matched_files.contains(row.file_name.as_str()) {
            matched_pool.push(row.file_name.as_str());
        } else {
            unmatched_pool.push(row.file_name.as_str());
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut selected: Vec<String> = matched_pool
        .choose_multiple(&mut rng, count.min(matched_pool.len()))
        .map(|s| s.to_string())
        .collect();
    selected.extend(
        unmatched_pool
            .choose_multiple(&mut rng, count.min(unmatched_pool.len()))
            .map(|s| s.to_string()),
    );

    info!(
        matched_pool = matched_pool.len(),
        unmatched_pool = unmatched_pool.len(),
        selected = selected.len(),
        seed,
        "sampled review subset"
    );
    selected
}

/// All rows belonging to the selected images, in table order.
pub fn subset_rows(rows: &[DetectionRow], selected: &HashSet<String>) -> Vec<DetectionRow> {
    rows.iter()
        .filter(|row| selected.contains(&row.file_name))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(file: &str, tree_id: Option<i64>) -> DetectionRow {
        DetectionRow {
            file_name: file.to_string(),
            tree_id,
            ..Default::default()
        }
    }

    fn fixture() -> Vec<DetectionRow> {
        vec![
            row("m1.jpg", Some(1)),
            row("m1.jpg", None), // still matched: one row has an id
            row("m2.jpg", Some(2)),
            row("u1.jpg", None),
            row("u2.jpg", None),
            row("u3.jpg", None),
        ]
    }

    #[test]
    fn test_sampling_is_reproducible() {
        let rows = fixture();
        let first = sample_file_names(&rows, 2, 42);
        let second = sample_file_names(&rows, 2, 42);
        assert_eq!(first, second);
    }

    #[test]
    fn test_sampling_capped_at_pool_size() {
        let rows = fixture();
        let selected = sample_file_names(&rows, 100, 42);
        // 2 matched + 3 unmatched distinct images in the fixture.
        assert_eq!(selected.len(), 5);
    }

    #[test]
    fn test_sampling_draws_from_both_pools() {
        let rows = fixture();
        let selected = sample_file_names(&rows, 1, 42);
        assert_eq!(selected.len(), 2);

        let matched: HashSet<&str> = ["m1.jpg", "m2.jpg"].into_iter().collect();
        assert!(matched.contains(selected[0].as_str()));
        assert!(!matched.contains(selected[1].as_str()));
    }

    #[test]
    fn test_subset_rows_keeps_all_rows_of_selected_images() {
        let rows = fixture();
        let selected: HashSet<String> = std::iter::once("m1.jpg".to_string()).collect();
        let subset = subset_rows(&rows, &selected);
        assert_eq!(subset.len(), 2);
        assert!(subset.iter().all(|r| r.file_name == "m1.jpg"));
    }
}
