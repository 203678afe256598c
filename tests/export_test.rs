//! Table re-export integration tests

use tempfile::tempdir;
use tree_match_rust::cli::TableFormat;
use tree_match_rust::export;
use tree_match_rust::loader;
use tree_match_rust::{CandidateMatch, DetectionRow, SurveyKind};

fn create_test_row(index: usize) -> DetectionRow {
    DetectionRow {
        file_name: format!("pano_{:03}.jpg", index),
        file_name_with_detections: Some(format!("2_pano_{:03}.jpg", index)),
        tree_index: Some(index as i64),
        possible_trees: Some(2),
        x_tree_image: Some(34.75 + index as f64 * 0.001),
        y_tree_image: Some(32.03),
        real_angle: Some(1.25),
        x_image: Some(34.7501),
        y_image: Some(32.0301),
        heading: Some(90.0),
        tree_id: Some(100 + index as i64),
        x_tree: Some(34.76),
        y_tree: Some(32.04),
        best_angle_diff: Some(3.2 + index as f64),
        additional_matches: vec![CandidateMatch {
            id: Some(900 + index as i64),
            tree_name: Some("Pine".to_string()),
            location_x: Some(34.77),
            location_y: Some(32.05),
        }],
        tree_name: Some("Olive".to_string()),
        name_eng: Some("Olive tree".to_string()),
        name_heb: Some("זית".to_string()),
        type_1: Some("evergreen".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_excel_export_creates_file() {
    let dir = tempdir().expect("Failed to create temp dir");

    let rows: Vec<DetectionRow> = (1..=5).map(create_test_row).collect();
    let written = export::export_table(
        &rows,
        SurveyKind::City,
        &TableFormat::Xlsx,
        dir.path(),
        "matches",
    )
    .expect("excel export failed");

    assert_eq!(written.len(), 1);
    assert!(written[0].exists());
    let metadata = std::fs::metadata(&written[0]).expect("missing file metadata");
    assert!(metadata.len() > 0, "excel file is empty");
}

#[test]
fn test_both_formats_written() {
    let dir = tempdir().expect("Failed to create temp dir");

    let rows = vec![create_test_row(1)];
    let written = export::export_table(
        &rows,
        SurveyKind::City,
        &TableFormat::Both,
        dir.path(),
        "matches",
    )
    .expect("export failed");

    assert_eq!(written.len(), 2);
    assert!(written.iter().any(|p| p.extension().unwrap() == "xlsx"));
    assert!(written.iter().any(|p| p.extension().unwrap() == "csv"));
}

#[test]
fn test_csv_roundtrip_preserves_rows() {
    let dir = tempdir().expect("Failed to create temp dir");

    let mut rows: Vec<DetectionRow> = (1..=3).map(create_test_row).collect();
    // A blanked row exercises the sentinel policy both ways.
    rows.push(DetectionRow {
        file_name: "pano_unmatched.jpg".to_string(),
        tree_index: Some(9),
        possible_trees: Some(1),
        ..Default::default()
    });

    let written = export::export_table(
        &rows,
        SurveyKind::City,
        &TableFormat::Csv,
        dir.path(),
        "roundtrip",
    )
    .expect("csv export failed");

    let reloaded = loader::load_table(&written[0]).expect("reload failed");
    assert_eq!(reloaded, rows);
}

#[test]
fn test_csv_sentinels_on_disk() {
    let dir = tempdir().expect("Failed to create temp dir");

    let rows = vec![DetectionRow {
        file_name: "pano.jpg".to_string(),
        ..Default::default()
    }];
    let written = export::export_table(
        &rows,
        SurveyKind::City,
        &TableFormat::Csv,
        dir.path(),
        "sentinels",
    )
    .expect("csv export failed");

    let content = std::fs::read_to_string(&written[0]).expect("read failed");
    let data_line = content.lines().nth(1).expect("missing data line");
    // Descriptive fields carry the literal sentinel, numeric ones stay blank.
    assert!(data_line.contains("None"));
    assert!(data_line.contains(",,"));
}

#[test]
fn test_empty_table_export() {
    let dir = tempdir().expect("Failed to create temp dir");

    let rows: Vec<DetectionRow> = vec![];
    let written = export::export_table(
        &rows,
        SurveyKind::Small,
        &TableFormat::Both,
        dir.path(),
        "empty",
    )
    .expect("empty export failed");

    assert_eq!(written.len(), 2);
    for path in &written {
        assert!(path.exists());
    }
}
