//! Best-match normalization
//!
//! Upstream matching may pair one survey record with several detections of
//! the same image. This module collapses every `(file_name, tree_id)` group
//! down to its single best candidate for review:
//!
//! 1. rows are grouped by `(file_name, tree_id)`; unmatched rows stand alone
//! 2. within a group, the row with the smallest `best_angle_diff` wins
//!    (ties broken by original row order)
//! 3. every other row has its survey-derived fields blanked
//!
//! The losing rows are kept, so unmatched detections stay visible for
//! auditing. Output is a freshly built vector; the input is never mutated.

use crate::types::{DetectionRow, SurveyKind};
use std::collections::HashMap;
use tracing::info;

/// Options for the best-match selection.
///
/// When both thresholds are set, a group's best row is kept only if its
/// angle is below `min_threshold` while the second-best angle (infinite for
/// a group of one) is above `second_threshold`; a group failing the gate is
/// blanked entirely. The default keeps the global best unconditionally.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    pub min_threshold: Option<f64>,
    pub second_threshold: Option<f64>,
}

impl NormalizeOptions {
    fn gate_passes(&self, best_angle: f64, second_angle: f64) -> bool {
        match (self.min_threshold, self.second_threshold) {
            (Some(min), Some(second)) => best_angle < min && second_angle > second,
            (Some(min), None) => best_angle < min,
            _ => true,
        }
    }
}

/// Summary of one normalization pass.
#[derive(Debug, Clone, Default)]
pub struct NormalizeStats {
    /// Rows seen.
    pub total_rows: usize,
    /// Rows carrying a survey match on input.
    pub matched_rows: usize,
    /// Distinct `(file_name, tree_id)` groups.
    pub groups: usize,
    /// Rows whose survey fields were blanked.
    pub rows_blanked: usize,
    /// Groups blanked entirely by the threshold gate.
    pub gated_groups: usize,
}

/// Per-group aggregate: best and second-best angle, index of the best row.
struct GroupRank {
    best_idx: usize,
    best_angle: f64,
    second_angle: f64,
}

/// Collapse each `(file_name, tree_id)` group to its best match.
///
/// Idempotent: losing rows leave normalization unmatched, so a second pass
/// finds only single-row groups and changes nothing.
pub fn normalize_best_matches(
    rows: &[DetectionRow],
    kind: SurveyKind,
    options: &NormalizeOptions,
) -> (Vec<DetectionRow>, NormalizeStats) {
    let mut stats = NormalizeStats {
        total_rows: rows.len(),
        ..Default::default()
    };

    // First pass: rank every matched group. The strict `<` keeps the
    // earliest row on ties, matching a stable sort by angle.
    let mut groups: HashMap<(&str, i64), GroupRank> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let Some(tree_id) = row.tree_id else {
            continue;
        };
        stats.matched_rows += 1;

        let angle = row.best_angle_diff.unwrap_or(f64::INFINITY);
        groups
            .entry((row.file_name.as_str(), tree_id))
            .and_modify(|rank| {
                if angle < rank.best_angle {
                    rank.second_angle = rank.best_angle;
                    rank.best_angle = angle;
                    rank.best_idx = idx;
                } else if angle < rank.second_angle {
                    rank.second_angle = angle;
                }
            })
            .or_insert(GroupRank {
                best_idx: idx,
                best_angle: angle,
                second_angle: f64::INFINITY,
            });
    }
    stats.groups = groups.len();

    let mut gated: usize = 0;

    // Second pass: build the output. Winners and unmatched rows pass
    // through unchanged; everything else is blanked.
    let output: Vec<DetectionRow> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let Some(tree_id) = row.tree_id else {
                return row.clone();
            };
            let rank = &groups[&(row.file_name.as_str(), tree_id)];
            let keep = idx == rank.best_idx
                && options.gate_passes(rank.best_angle, rank.second_angle);
            if keep {
                row.clone()
            } else {
                if idx == rank.best_idx {
                    gated += 1;
                }
                stats.rows_blanked += 1;
                blank_match_fields(row, kind)
            }
        })
        .collect();

    stats.gated_groups = gated;

    info!(
        rows = stats.total_rows,
        groups = stats.groups,
        blanked = stats.rows_blanked,
        gated = stats.gated_groups,
        "normalized best matches"
    );

    (output, stats)
}

/// Copy a row with its survey-derived fields cleared.
///
/// Numeric match fields become missing; descriptive fields of the given
/// survey kind are cleared and export as the literal `"None"`.
fn blank_match_fields(row: &DetectionRow, kind: SurveyKind) -> DetectionRow {
    let mut blanked = row.clone();

    blanked.tree_id = None;
    blanked.x_tree = None;
    blanked.y_tree = None;
    blanked.best_angle_diff = None;

    for column in kind.descriptive_columns() {
        match *column {
            "tree_name" => blanked.tree_name = None,
            "name_eng" => blanked.name_eng = None,
            "name_heb" => blanked.name_heb = None,
            "type_1" => blanked.type_1 = None,
            "type_2" => blanked.type_2 = None,
            "type_3" => blanked.type_3 = None,
            "tree_name_code" => blanked.tree_name_code = None,
            "tree_name_big_csv" => blanked.tree_name_big_csv = None,
            _ => {}
        }
    }

    blanked
}
