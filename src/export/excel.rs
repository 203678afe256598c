//! Excel re-export of the normalized detection table

use super::{export_cells, export_columns, ExportCell};
use crate::error::Result;
use crate::types::{DetectionRow, SurveyKind};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

pub fn write_excel(rows: &[DetectionRow], kind: SurveyKind, output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let header_format = Format::new().set_bold();

    let columns = export_columns(kind);
    for (col, name) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col, cell) in export_cells(row, kind).into_iter().enumerate() {
            match cell {
                ExportCell::Blank => {}
                ExportCell::Number(n) => {
                    worksheet.write_number(excel_row, col as u16, n)?;
                }
                ExportCell::Text(s) => {
                    worksheet.write_string(excel_row, col as u16, &s)?;
                }
            }
        }
    }

    workbook.save(output_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_excel_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        let rows = vec![DetectionRow {
            file_name: "a.jpg".to_string(),
            tree_id: Some(5),
            best_angle_diff: Some(3.2),
            tree_name: Some("Olive".to_string()),
            ..Default::default()
        }];
        write_excel(&rows, SurveyKind::City, &path).unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
