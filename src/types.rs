//! Detection-match table types
//!
//! Shared by every pipeline stage:
//! - DetectionRow: one candidate pairing between a detected tree and a survey record
//! - CandidateMatch: one entry of the additional-candidates list
//! - SurveyKind: which survey dataset a table comes from (column set differs)

use serde::{Deserialize, Serialize};

/// Survey dataset a detection table was matched against.
///
/// The city survey and the small field survey carry different descriptive
/// columns; the normalizer and the exporters need to know which set applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurveyKind {
    #[default]
    City,
    Small,
}

impl SurveyKind {
    /// Descriptive survey columns cleared by the normalizer for losing rows.
    pub fn descriptive_columns(&self) -> &'static [&'static str] {
        match self {
            SurveyKind::City => &["tree_name", "name_eng", "name_heb", "type_1", "type_2", "type_3"],
            SurveyKind::Small => &["tree_name", "tree_name_code", "tree_name_big_csv"],
        }
    }
}

impl std::str::FromStr for SurveyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "city" | "tlv" => Ok(SurveyKind::City),
            "small" => Ok(SurveyKind::Small),
            _ => Err(format!("Unknown survey kind: {}. Use city or small", s)),
        }
    }
}

impl std::fmt::Display for SurveyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyKind::City => write!(f, "city"),
            SurveyKind::Small => write!(f, "small"),
        }
    }
}

/// One candidate survey record considered but not selected as best.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateMatch {
    pub id: Option<i64>,
    pub tree_name: Option<String>,
    pub location_x: Option<f64>,
    pub location_y: Option<f64>,
}

/// One candidate pairing between a detected tree and a survey record.
///
/// Match-dependent fields are `Option`: `None` is the in-memory form of the
/// file sentinels (`"None"` in descriptive columns, blank/NaN in numeric
/// ones). Loaders map sentinels in, exporters map them back out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionRow {
    pub file_name: String,

    /// Path of the annotated copy of the image; its basename carries a
    /// leading `<count>_` prefix with the number of drawn detections.
    pub file_name_with_detections: Option<String>,

    pub tree_index: Option<i64>,

    /// Number of detections in the image; 0 on every row means an empty case.
    pub possible_trees: Option<i64>,

    pub x_tree_image: Option<f64>,
    pub y_tree_image: Option<f64>,

    /// Detection heading, radians.
    pub real_angle: Option<f64>,

    /// Capture-vehicle position and heading (degrees).
    pub x_image: Option<f64>,
    pub y_image: Option<f64>,
    pub heading: Option<f64>,

    /// Matched survey record; `None` = unmatched detection.
    pub tree_id: Option<i64>,
    pub x_tree: Option<f64>,
    pub y_tree: Option<f64>,

    /// Angular deviation in degrees; primary ranking key, lower is better.
    pub best_angle_diff: Option<f64>,

    pub additional_matches: Vec<CandidateMatch>,

    // Descriptive survey fields. City survey:
    pub tree_name: Option<String>,
    pub name_eng: Option<String>,
    pub name_heb: Option<String>,
    pub type_1: Option<String>,
    pub type_2: Option<String>,
    pub type_3: Option<String>,

    // Small survey:
    pub tree_name_code: Option<String>,
    pub tree_name_big_csv: Option<String>,
}

impl DetectionRow {
    /// Whether this row carries a survey match.
    pub fn is_matched(&self) -> bool {
        self.tree_id.is_some()
    }
}
