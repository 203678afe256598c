//! Detection-table loading
//!
//! Reads a detection-match table from a spreadsheet (.xlsx/.xls) or a
//! delimited text file (.csv/.txt) into `DetectionRow`s. Cleanup applied
//! while loading, mirroring the upstream table conventions:
//!
//! - the literals `"None"`/`"nan"` and empty cells become missing values
//! - non-numeric text in numeric columns becomes missing, never an error
//! - free text is stripped of characters invalid under the target encoding
//! - the `additional_matches` literal is repaired into structured records

use crate::error::{Result, TreeMatchError};
use crate::repair;
use crate::types::DetectionRow;
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// A table cell decoupled from its source format.
enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

/// Column-name → position map built from the header row.
struct ColumnMap {
    indices: HashMap<String, usize>,
}

impl ColumnMap {
    fn new(headers: impl Iterator<Item = String>) -> Result<Self> {
        let indices: HashMap<String, usize> = headers
            .enumerate()
            .map(|(idx, name)| (name.trim().to_lowercase(), idx))
            .collect();

        if !indices.contains_key("file_name") {
            return Err(TreeMatchError::MissingColumn("file_name".into()));
        }
        Ok(Self { indices })
    }

    fn get<'a>(&self, cells: &'a [CellValue], name: &str) -> Option<&'a CellValue> {
        self.indices.get(name).and_then(|&idx| cells.get(idx))
    }
}

/// Load a detection-match table, dispatching on the file extension.
pub fn load_table(path: &Path) -> Result<Vec<DetectionRow>> {
    if !path.exists() {
        return Err(TreeMatchError::FileNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let rows = match extension.as_str() {
        "xlsx" | "xls" | "xlsm" => load_spreadsheet(path)?,
        "csv" | "txt" => load_delimited(path)?,
        _ => return Err(TreeMatchError::UnsupportedFormat(extension)),
    };

    info!(rows = rows.len(), path = %path.display(), "loaded detection table");
    Ok(rows)
}

/// Read a single named column as text, for image lists and the like.
pub fn load_column(path: &Path, column: &str) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(TreeMatchError::FileNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xls" | "xlsm" => column_from_spreadsheet(path, column),
        "csv" | "txt" => column_from_delimited(path, column),
        _ => Err(TreeMatchError::UnsupportedFormat(extension)),
    }
}

fn column_from_spreadsheet(path: &Path, column: &str) -> Result<Vec<String>> {
    let wanted = column.trim().to_lowercase();

    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TreeMatchError::UnsupportedFormat("workbook has no sheets".into()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows_iter = range.rows();
    let header_row = rows_iter
        .next()
        .ok_or_else(|| TreeMatchError::MissingColumn(column.to_string()))?;
    let position = header_row
        .iter()
        .position(|cell| cell_to_header(cell).trim().to_lowercase() == wanted)
        .ok_or_else(|| TreeMatchError::MissingColumn(column.to_string()))?;

    let mut values = Vec::new();
    for data_row in rows_iter {
        if let Some(cell) = data_row.get(position) {
            if let Some(text) = as_text(Some(&data_to_cell(cell))) {
                values.push(text);
            }
        }
    }
    Ok(values)
}

fn column_from_delimited(path: &Path, column: &str) -> Result<Vec<String>> {
    let wanted = column.trim().to_lowercase();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let position = reader
        .headers()?
        .iter()
        .position(|h| h.trim().to_lowercase() == wanted)
        .ok_or_else(|| TreeMatchError::MissingColumn(column.to_string()))?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(text) = record.get(position) {
            if !is_missing_text(text) {
                values.push(text.trim().to_string());
            }
        }
    }
    Ok(values)
}

fn load_spreadsheet(path: &Path) -> Result<Vec<DetectionRow>> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TreeMatchError::UnsupportedFormat("workbook has no sheets".into()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows_iter = range.rows();
    let headers = match rows_iter.next() {
        Some(header_row) => header_row.iter().map(cell_to_header),
        None => return Ok(Vec::new()),
    };
    let columns = ColumnMap::new(headers)?;

    let mut rows = Vec::new();
    for data_row in rows_iter {
        let cells: Vec<CellValue> = data_row.iter().map(data_to_cell).collect();
        if let Some(row) = build_row(&columns, &cells) {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn load_delimited(path: &Path) -> Result<Vec<DetectionRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let columns = ColumnMap::new(reader.headers()?.iter().map(|h| h.to_string()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<CellValue> = record.iter().map(text_to_cell).collect();
        if let Some(row) = build_row(&columns, &cells) {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn cell_to_header(data: &Data) -> String {
    match data {
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => text_to_cell(s),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Number(if *b { 1.0 } else { 0.0 }),
        other => text_to_cell(&other.to_string()),
    }
}

fn text_to_cell(text: &str) -> CellValue {
    if is_missing_text(text) {
        CellValue::Empty
    } else {
        CellValue::Text(text.to_string())
    }
}

/// The upstream tables write missing values as `"None"` or `"nan"`.
fn is_missing_text(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed == "None" || trimmed.eq_ignore_ascii_case("nan")
}

fn build_row(columns: &ColumnMap, cells: &[CellValue]) -> Option<DetectionRow> {
    let file_name = as_text(columns.get(cells, "file_name"))?;

    Some(DetectionRow {
        file_name,
        file_name_with_detections: as_text(columns.get(cells, "file_name_with_detections")),
        tree_index: as_i64(columns.get(cells, "tree_index")),
        possible_trees: as_i64(columns.get(cells, "possible_trees")),
        x_tree_image: as_f64(columns.get(cells, "x_tree_image")),
        y_tree_image: as_f64(columns.get(cells, "y_tree_image")),
        real_angle: as_f64(columns.get(cells, "real_angle")),
        x_image: as_f64(columns.get(cells, "x_image")),
        y_image: as_f64(columns.get(cells, "y_image")),
        heading: as_f64(columns.get(cells, "heading")),
        tree_id: as_i64(columns.get(cells, "tree_id")),
        x_tree: as_f64(columns.get(cells, "x_tree")),
        y_tree: as_f64(columns.get(cells, "y_tree")),
        best_angle_diff: as_f64(columns.get(cells, "best_angle_diff")),
        additional_matches: match columns.get(cells, "additional_matches") {
            Some(CellValue::Text(text)) => repair::repair_candidates(text),
            _ => Vec::new(),
        },
        tree_name: as_clean_text(columns.get(cells, "tree_name")),
        name_eng: as_clean_text(columns.get(cells, "name_eng")),
        name_heb: as_clean_text(columns.get(cells, "name_heb")),
        type_1: as_clean_text(columns.get(cells, "type_1")),
        type_2: as_clean_text(columns.get(cells, "type_2")),
        type_3: as_clean_text(columns.get(cells, "type_3")),
        tree_name_code: as_clean_text(columns.get(cells, "tree_name_code")),
        tree_name_big_csv: as_clean_text(columns.get(cells, "tree_name_big_csv")),
    })
}

fn as_text(cell: Option<&CellValue>) -> Option<String> {
    match cell? {
        CellValue::Text(s) => Some(s.clone()),
        CellValue::Number(n) => Some(format_cell_number(*n)),
        CellValue::Empty => None,
    }
}

/// Text with the encoding cleanup applied (descriptive free-text fields).
fn as_clean_text(cell: Option<&CellValue>) -> Option<String> {
    as_text(cell).map(|s| sanitize_text(&s))
}

fn as_f64(cell: Option<&CellValue>) -> Option<f64> {
    match cell? {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => {
            let parsed = s.trim().parse::<f64>().ok();
            if parsed.is_none() {
                debug!(text = s.as_str(), "non-numeric cell in numeric column");
            }
            parsed
        }
        CellValue::Empty => None,
    }
}

fn as_i64(cell: Option<&CellValue>) -> Option<i64> {
    match cell? {
        // Ids come back as floats from spreadsheets (5.0 for 5).
        CellValue::Number(n) => Some(*n as i64),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
        }
        CellValue::Empty => None,
    }
}

/// Integral floats print without a fractional part ("12" rather than "12.0").
pub fn format_cell_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Drop characters that do not survive re-encoding: control characters and
/// U+FFFD replacements left over from a broken source encoding.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER && (!c.is_control() || *c == '\n'))
        .collect()
}
