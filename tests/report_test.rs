//! Review-report integration tests
//!
//! Loads a small table from disk and renders the report the way the CLI
//! does, checking the emitted documents rather than internals.

use std::io::Write;
use tree_match_rust::normalizer::{normalize_best_matches, NormalizeOptions};
use tree_match_rust::report::{generate_report, ReportOptions};
use tree_match_rust::{loader, SurveyKind};

const FIXTURE: &str = "\
file_name,file_name_with_detections,tree_index,possible_trees,x_tree_image,y_tree_image,real_angle,x_image,y_image,heading,tree_id,x_tree,y_tree,best_angle_diff,additional_matches,tree_name\n\
a.jpg,detected/2_a.jpg,1,2,34.752,32.031,1.2,34.7519,32.0309,180.0,5,34.753,32.032,3.2,\"{'id':9,'tree_name':'Pine','location_x':34.76,'location_y':32.04}\",Olive\n\
a.jpg,detected/2_a.jpg,2,2,34.754,32.033,0.8,34.7519,32.0309,180.0,None,None,None,None,[],None\n\
quiet.jpg,detected/0_quiet.jpg,1,0,34.76,32.05,0.5,34.7601,32.0501,90.0,None,None,None,None,[],None\n";

#[test]
fn test_report_from_table_on_disk() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let table_path = dir.path().join("matches.csv");
    let mut table = std::fs::File::create(&table_path).expect("create failed");
    table.write_all(FIXTURE.as_bytes()).expect("write failed");
    drop(table);

    // An images folder with the annotated file present.
    let images_dir = dir.path().join("detected");
    std::fs::create_dir_all(&images_dir).expect("mkdir failed");
    std::fs::write(images_dir.join("2_a.jpg"), b"fake jpeg").expect("image write failed");

    let loaded = loader::load_table(&table_path).expect("load failed");
    let (rows, _) = normalize_best_matches(&loaded, SurveyKind::City, &NormalizeOptions::default());

    let output = dir.path().join("review").join("index.html");
    let options = ReportOptions {
        title: "Detections and Matches".to_string(),
        images_dir: images_dir.clone(),
        max_cases: 200,
        zoom_start: 15,
        direction_line_length: 0.0001,
    };
    let stats = generate_report(&rows, None, &options, &output).expect("report failed");

    // quiet.jpg has no detections and no match: skipped.
    assert_eq!(stats.cases_rendered, 1);
    assert_eq!(stats.cases_skipped, 1);
    assert_eq!(stats.maps_written, 1);

    let html = std::fs::read_to_string(&output).expect("report missing");
    assert!(html.contains("File: a.jpg"));
    assert!(!html.contains("File: quiet.jpg"));
    assert!(html.contains("Detection Tree With Match"));
    assert!(html.contains("Detection Trees Without Match"));
    assert!(html.contains("Potential Survey Trees"));
    assert!(html.contains("Tree Name: Pine"));
    assert!(html.contains("prevBtn"));
    assert!(html.contains("nextBtn"));
    assert!(html.contains("progressBar"));
    assert!(html.contains("iframe src='maps/map_a.jpg.html'"));

    // The map document exists and carries the street-view link.
    let map_html = std::fs::read_to_string(
        output.parent().unwrap().join("maps").join("map_a.jpg.html"),
    )
    .expect("map missing");
    assert!(map_html.contains("Best survey match: Olive (ID: 5)"));
    assert!(map_html.contains("Google Street View"));
    assert!(map_html.contains("cbp=12,180"));
}
