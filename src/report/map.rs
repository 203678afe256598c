//! Per-image interactive map documents
//!
//! One self-contained Leaflet HTML file per detection image:
//! - green marker per best survey match, with a direction line along the
//!   detection heading
//! - blue marker per additional candidate not matched elsewhere
//! - orange marker at the capture-vehicle position, linking out to Google
//!   Street View at that coordinate and heading
//! - a fixed legend box

use crate::error::{Result, TreeMatchError};
use crate::types::DetectionRow;
use std::collections::HashSet;
use std::path::Path;

/// Which column of the two-survey report a map belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSide {
    Left,
    Right,
}

impl MapSide {
    fn prefix(&self) -> &'static str {
        match self {
            MapSide::Left => "left_",
            MapSide::Right => "right_",
        }
    }
}

const LEGEND_HTML: &str = "\
<div style=\"position: fixed; bottom: 50px; left: 50px; width: 200px; \
background-color: white; z-index: 9999; font-size: 14px; padding: 10px; \
border: 2px solid grey; border-radius: 8px; \
box-shadow: 3px 3px 5px rgba(0,0,0,0.5);\">\n\
<b>Legend</b><br>\n\
<span style=\"color:orange\">&#9679;</span> Car location<br>\n\
<span style=\"color:black\">&#9644;</span> Detection direction<br>\n\
<span style=\"color:green\">&#9679;</span> Best survey match<br>\n\
<span style=\"color:blue\">&#9679;</span> Additional candidate<br>\n\
</div>\n";

/// Generate the map document for one image's rows.
///
/// Returns the file name written inside `maps_dir` (callers build iframe
/// URLs relative to the report location).
pub fn generate_map(
    rows: &[DetectionRow],
    maps_dir: &Path,
    zoom_start: u32,
    line_length: f64,
    side: Option<MapSide>,
) -> Result<String> {
    std::fs::create_dir_all(maps_dir)?;

    let first = rows
        .first()
        .ok_or_else(|| TreeMatchError::MapGeneration("no rows for map".into()))?;
    // Centered on the first detection.
    let center_lat = first.y_tree_image.unwrap_or(0.0);
    let center_lon = first.x_tree_image.unwrap_or(0.0);

    let best_match_ids: HashSet<i64> = rows.iter().filter_map(|r| r.tree_id).collect();
    let mut drawn_candidates: HashSet<i64> = HashSet::new();

    let mut markers = String::new();
    for row in rows {
        if let (Some(id), Some(x), Some(y)) = (row.tree_id, row.x_tree, row.y_tree) {
            let name = row.tree_name.as_deref().unwrap_or("Unknown tree");
            markers.push_str(&format!(
                "addMarker({y}, {x}, 'green', {popup});\n",
                y = y,
                x = x,
                popup = js_string(&format!(
                    "Best survey match: {} (ID: {})",
                    escape_html(name),
                    id
                )),
            ));

            // Direction line along the detection heading.
            if let Some(angle) = row.real_angle {
                let x_end = x + line_length * angle.cos();
                let y_end = y + line_length * angle.sin();
                let index = row
                    .tree_index
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "?".to_string());
                markers.push_str(&format!(
                    "addLine({y1}, {x1}, {y2}, {x2}, {popup});\n",
                    y1 = y,
                    x1 = x,
                    y2 = y_end,
                    x2 = x_end,
                    popup = js_string(&format!(
                        "Detection: tree index {}, angle: {:.5}",
                        index, angle
                    )),
                ));
            }
        }

        for candidate in &row.additional_matches {
            let Some(id) = candidate.id else {
                continue;
            };
            if best_match_ids.contains(&id) || !drawn_candidates.insert(id) {
                continue;
            }
            if let (Some(x), Some(y)) = (candidate.location_x, candidate.location_y) {
                let name = candidate.tree_name.as_deref().unwrap_or("Unknown tree");
                markers.push_str(&format!(
                    "addMarker({y}, {x}, 'blue', {popup});\n",
                    y = y,
                    x = x,
                    popup = js_string(&format!(
                        "Additional candidate: {} (ID: {})",
                        escape_html(name),
                        id
                    )),
                ));
            }
        }
    }

    // One vehicle marker per map; the position repeats on every row.
    if let (Some(x_car), Some(y_car)) = (first.x_image, first.y_image) {
        let heading = first.heading.unwrap_or(0.0);
        let streetview_url = format!(
            "https://www.google.com/maps?q={y},{x}&layer=c&cbll={y},{x}&cbp=12,{heading},0,0,0",
            y = y_car,
            x = x_car,
            heading = heading,
        );
        markers.push_str(&format!(
            "addMarker({y}, {x}, 'orange', {popup});\n",
            y = y_car,
            x = x_car,
            popup = js_string(&format!(
                "Car location<br><a href='{}' target='_blank'>View on Google Street View</a>",
                streetview_url
            )),
        ));
    }

    let mut html = String::new();
    html.push_str(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.css\" />\n\
         <script src=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.js\"></script>\n\
         <style>html, body, #map { height: 100%; margin: 0; }</style>\n\
         </head>\n<body>\n<div id=\"map\"></div>\n",
    );
    html.push_str(LEGEND_HTML);
    html.push_str("<script>\n");
    html.push_str(&format!(
        "var map = L.map('map').setView([{}, {}], {});\n",
        center_lat, center_lon, zoom_start
    ));
    html.push_str(
        "L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {\n\
         maxZoom: 19,\n\
         attribution: '&copy; OpenStreetMap contributors'\n\
         }).addTo(map);\n\
         function addMarker(lat, lon, color, popup) {\n\
         L.circleMarker([lat, lon], { color: color, radius: 8, fillOpacity: 0.8 })\n\
         .addTo(map).bindPopup(popup);\n\
         }\n\
         function addLine(lat1, lon1, lat2, lon2, popup) {\n\
         L.polyline([[lat1, lon1], [lat2, lon2]], { color: 'black', weight: 2 })\n\
         .addTo(map).bindPopup(popup);\n\
         }\n",
    );
    html.push_str(&markers);
    html.push_str("</script>\n</body>\n</html>\n");

    let prefix = side.map(|s| s.prefix()).unwrap_or("");
    let map_file = format!("{}map_{}.html", prefix, first.file_name);
    std::fs::write(maps_dir.join(&map_file), html)?;

    Ok(map_file)
}

/// Escape text for inclusion in HTML markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render text as a quoted JavaScript string literal.
fn js_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CandidateMatch;

    fn matched_row() -> DetectionRow {
        DetectionRow {
            file_name: "a.jpg".to_string(),
            tree_index: Some(1),
            x_tree_image: Some(34.752),
            y_tree_image: Some(32.031),
            real_angle: Some(1.2),
            x_image: Some(34.7519),
            y_image: Some(32.0309),
            heading: Some(180.0),
            tree_id: Some(5),
            x_tree: Some(34.753),
            y_tree: Some(32.032),
            best_angle_diff: Some(3.2),
            tree_name: Some("Olive".to_string()),
            additional_matches: vec![
                CandidateMatch {
                    id: Some(5), // same as best match, must be skipped
                    tree_name: Some("Olive".to_string()),
                    location_x: Some(34.7),
                    location_y: Some(32.0),
                },
                CandidateMatch {
                    id: Some(9),
                    tree_name: Some("Pine".to_string()),
                    location_x: Some(34.76),
                    location_y: Some(32.04),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_map_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![matched_row()];
        let file = generate_map(&rows, dir.path(), 15, 0.0001, None).unwrap();

        assert_eq!(file, "map_a.jpg.html");
        let html = std::fs::read_to_string(dir.path().join(&file)).unwrap();
        assert!(html.contains("L.map"));
        assert!(html.contains("'green'"));
        assert!(html.contains("Best survey match: Olive (ID: 5)"));
        assert!(html.contains("Additional candidate: Pine (ID: 9)"));
        assert!(html.contains("'orange'"));
        assert!(html.contains("cbp=12,180"));
        // The candidate with the best-match id is not drawn again.
        assert!(!html.contains("Additional candidate: Olive"));
    }

    #[test]
    fn test_generate_map_side_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![matched_row()];
        let file = generate_map(&rows, dir.path(), 15, 0.0001, Some(MapSide::Right)).unwrap();
        assert_eq!(file, "right_map_a.jpg.html");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c\"'"), "a&lt;b&gt;&amp;&quot;c&quot;&#39;");
    }
}
