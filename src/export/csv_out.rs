//! CSV re-export of the normalized detection table

use super::{export_cells, export_columns, ExportCell};
use crate::error::Result;
use crate::loader;
use crate::types::{DetectionRow, SurveyKind};
use std::path::Path;

pub fn write_csv(rows: &[DetectionRow], kind: SurveyKind, output_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path)?;

    writer.write_record(export_columns(kind))?;

    for row in rows {
        let record: Vec<String> = export_cells(row, kind)
            .into_iter()
            .map(|cell| match cell {
                ExportCell::Blank => String::new(),
                ExportCell::Number(n) => loader::format_cell_number(n),
                ExportCell::Text(s) => s,
            })
            .collect();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_csv_sentinels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let rows = vec![DetectionRow {
            file_name: "a.jpg".to_string(),
            ..Default::default()
        }];
        write_csv(&rows, SurveyKind::City, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("file_name,"));
        let data = lines.next().unwrap();
        assert!(data.starts_with("a.jpg,"));
        assert!(data.contains("None"));
    }
}
