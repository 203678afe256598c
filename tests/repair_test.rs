//! Candidate-list repair integration tests
//!
//! The documented spec cases for the resilient parser.

use tree_match_rust::repair::repair_candidates;
use tree_match_rust::CandidateMatch;

#[test]
fn test_missing_separator_between_records() {
    let raw = "{'id':1,'tree_name':'Oak','location_x':1.0,'location_y':2.0}{'id':2,'tree_name':'Pine','location_x':3.0,'location_y':4.0}";
    let matches = repair_candidates(raw);

    let expected = vec![
        CandidateMatch {
            id: Some(1),
            tree_name: Some("Oak".to_string()),
            location_x: Some(1.0),
            location_y: Some(2.0),
        },
        CandidateMatch {
            id: Some(2),
            tree_name: Some("Pine".to_string()),
            location_x: Some(3.0),
            location_y: Some(4.0),
        },
    ];
    assert_eq!(matches, expected);
}

#[test]
fn test_bare_nan_value_becomes_null() {
    let raw = "[{'id': 1, 'tree_name': nan, 'location_x': 1.0, 'location_y': 2.0}]";
    let matches = repair_candidates(raw);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, Some(1));
    assert_eq!(matches[0].tree_name, None);
}

#[test]
fn test_unparseable_input_returns_empty_without_panicking() {
    assert!(repair_candidates("[{'id': broken").is_empty());
    assert!(repair_candidates("{{{{").is_empty());
    assert!(repair_candidates("not a list at all").is_empty());
}

#[test]
fn test_missing_markers_return_empty() {
    assert!(repair_candidates("").is_empty());
    assert!(repair_candidates("nan").is_empty());
    assert!(repair_candidates("None").is_empty());
    assert!(repair_candidates("[]").is_empty());
}

#[test]
fn test_own_reexport_parses_unchanged() {
    let original = vec![
        CandidateMatch {
            id: Some(11),
            tree_name: Some("Ficus".to_string()),
            location_x: Some(34.78),
            location_y: Some(32.08),
        },
        CandidateMatch {
            id: Some(12),
            tree_name: None,
            location_x: None,
            location_y: None,
        },
    ];
    let json = serde_json::to_string(&original).expect("serialize failed");
    assert_eq!(repair_candidates(&json), original);
}
