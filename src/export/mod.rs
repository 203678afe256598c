//! Normalized-table re-exports
//!
//! Writes the cleaned detection table back out for downstream use. The
//! file sentinels are restored at this boundary: missing numeric values
//! become blank cells, missing descriptive values the literal `"None"`,
//! and the candidate list well-formed JSON (so re-exports load back in
//! without repair).

pub mod csv_out;
pub mod excel;

use crate::cli::TableFormat;
use crate::error::Result;
use crate::types::{DetectionRow, SurveyKind};
use std::path::Path;

/// Columns common to every survey kind, in export order.
const BASE_COLUMNS: &[&str] = &[
    "file_name",
    "file_name_with_detections",
    "tree_index",
    "possible_trees",
    "x_tree_image",
    "y_tree_image",
    "real_angle",
    "x_image",
    "y_image",
    "heading",
    "tree_id",
    "x_tree",
    "y_tree",
    "best_angle_diff",
    "additional_matches",
];

/// Full export header for a survey kind.
pub fn export_columns(kind: SurveyKind) -> Vec<&'static str> {
    let mut columns = BASE_COLUMNS.to_vec();
    columns.extend_from_slice(kind.descriptive_columns());
    columns
}

/// One row rendered to export cells, aligned with `export_columns`.
pub fn export_cells(row: &DetectionRow, kind: SurveyKind) -> Vec<ExportCell> {
    let mut cells = vec![
        ExportCell::Text(row.file_name.clone()),
        path_text(&row.file_name_with_detections),
        integer(&row.tree_index),
        integer(&row.possible_trees),
        number(&row.x_tree_image),
        number(&row.y_tree_image),
        number(&row.real_angle),
        number(&row.x_image),
        number(&row.y_image),
        number(&row.heading),
        integer(&row.tree_id),
        number(&row.x_tree),
        number(&row.y_tree),
        number(&row.best_angle_diff),
        ExportCell::Text(
            serde_json::to_string(&row.additional_matches).unwrap_or_else(|_| "[]".to_string()),
        ),
    ];

    for column in kind.descriptive_columns() {
        let value = match *column {
            "tree_name" => &row.tree_name,
            "name_eng" => &row.name_eng,
            "name_heb" => &row.name_heb,
            "type_1" => &row.type_1,
            "type_2" => &row.type_2,
            "type_3" => &row.type_3,
            "tree_name_code" => &row.tree_name_code,
            "tree_name_big_csv" => &row.tree_name_big_csv,
            _ => &None,
        };
        cells.push(ExportCell::Text(
            value.clone().unwrap_or_else(|| "None".to_string()),
        ));
    }

    cells
}

/// A typed export cell; each writer maps it to its own blank/number/text.
pub enum ExportCell {
    Blank,
    Number(f64),
    Text(String),
}

fn number(value: &Option<f64>) -> ExportCell {
    match value {
        Some(n) => ExportCell::Number(*n),
        None => ExportCell::Blank,
    }
}

fn integer(value: &Option<i64>) -> ExportCell {
    match value {
        Some(n) => ExportCell::Number(*n as f64),
        None => ExportCell::Blank,
    }
}

/// Path-like text: blank when missing (no `"None"` sentinel).
fn path_text(value: &Option<String>) -> ExportCell {
    match value {
        Some(s) => ExportCell::Text(s.clone()),
        None => ExportCell::Blank,
    }
}

/// Write the table in the requested format(s); returns the files written.
pub fn export_table(
    rows: &[DetectionRow],
    kind: SurveyKind,
    format: &TableFormat,
    output_dir: &Path,
    stem: &str,
) -> Result<Vec<std::path::PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::new();
    match format {
        TableFormat::Xlsx => {
            let path = output_dir.join(format!("{}.xlsx", stem));
            excel::write_excel(rows, kind, &path)?;
            written.push(path);
        }
        TableFormat::Csv => {
            let path = output_dir.join(format!("{}.csv", stem));
            csv_out::write_csv(rows, kind, &path)?;
            written.push(path);
        }
        TableFormat::Both => {
            let xlsx_path = output_dir.join(format!("{}.xlsx", stem));
            excel::write_excel(rows, kind, &xlsx_path)?;
            written.push(xlsx_path);

            let csv_path = output_dir.join(format!("{}.csv", stem));
            csv_out::write_csv(rows, kind, &csv_path)?;
            written.push(csv_path);
        }
    }

    Ok(written)
}

/// Write the distinct image file names, one per line.
pub fn write_file_name_list(rows: &[DetectionRow], path: &Path) -> Result<usize> {
    let mut seen = std::collections::HashSet::new();
    let mut lines = String::new();
    for row in rows {
        if seen.insert(row.file_name.as_str()) {
            lines.push_str(&row.file_name);
            lines.push('\n');
        }
    }
    std::fs::write(path, lines)?;
    Ok(seen.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_columns_by_kind() {
        let city = export_columns(SurveyKind::City);
        assert!(city.contains(&"name_heb"));
        assert!(!city.contains(&"tree_name_code"));

        let small = export_columns(SurveyKind::Small);
        assert!(small.contains(&"tree_name_code"));
        assert!(!small.contains(&"name_heb"));
    }

    #[test]
    fn test_export_cells_sentinels() {
        let row = DetectionRow {
            file_name: "a.jpg".to_string(),
            ..Default::default()
        };
        let cells = export_cells(&row, SurveyKind::City);
        let columns = export_columns(SurveyKind::City);
        assert_eq!(cells.len(), columns.len());

        // Missing numeric → blank, missing descriptive → "None".
        let tree_id_idx = columns.iter().position(|c| *c == "tree_id").unwrap();
        assert!(matches!(cells[tree_id_idx], ExportCell::Blank));
        let name_idx = columns.iter().position(|c| *c == "tree_name").unwrap();
        assert!(matches!(&cells[name_idx], ExportCell::Text(s) if s == "None"));
    }

    #[test]
    fn test_file_name_list_distinct_in_order() {
        let rows = vec![
            DetectionRow { file_name: "b.jpg".into(), ..Default::default() },
            DetectionRow { file_name: "a.jpg".into(), ..Default::default() },
            DetectionRow { file_name: "b.jpg".into(), ..Default::default() },
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images.txt");
        let count = write_file_name_list(&rows, &path).unwrap();
        assert_eq!(count, 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b.jpg\na.jpg\n");
    }
}
