//! Paginated review report
//!
//! One static HTML file for manual review of detection matches. Each case
//! is one detection image: annotated image, per-tree-index color legend,
//! match details, and an embedded interactive map. Pagination is client
//! side — one case visible at a time with Previous/Next navigation and a
//! progress bar.

pub mod colors;
pub mod map;

use crate::error::Result;
use crate::types::DetectionRow;
use chrono::Local;
use indicatif::ProgressBar;
use map::{escape_html, MapSide};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "JPG", "JPEG", "PNG"];

/// Report rendering options.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    /// Folder with the annotated detection images, as referenced from the
    /// report location.
    pub images_dir: PathBuf,
    /// Maximum number of cases rendered.
    pub max_cases: usize,
    pub zoom_start: u32,
    pub direction_line_length: f64,
}

/// Summary of one report run.
#[derive(Debug, Clone, Default)]
pub struct ReportStats {
    pub cases_rendered: usize,
    pub cases_skipped: usize,
    pub maps_written: usize,
}

/// Render the review report; maps are written to `maps/` next to it.
///
/// `secondary` is the small-survey table for the two-column layout; cases
/// are driven by the primary table's file order.
pub fn generate_report(
    primary: &[DetectionRow],
    secondary: Option<&[DetectionRow]>,
    options: &ReportOptions,
    output_html: &Path,
) -> Result<ReportStats> {
    let parent = output_html.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let maps_dir = parent.join("maps");

    let available_images = scan_detected_images(&options.images_dir);

    let primary_cases = group_by_file(primary);
    let secondary_groups: HashMap<&str, Vec<&DetectionRow>> = secondary
        .map(|rows| {
            let mut groups: HashMap<&str, Vec<&DetectionRow>> = HashMap::new();
            for row in rows {
                groups.entry(row.file_name.as_str()).or_default().push(row);
            }
            groups
        })
        .unwrap_or_default();

    let mut stats = ReportStats::default();
    let mut sections = String::new();

    let progress = ProgressBar::new(primary_cases.len() as u64);
    for (file_name, case_rows) in &primary_cases {
        progress.inc(1);
        if stats.cases_rendered >= options.max_cases {
            break;
        }

        let secondary_rows = secondary_groups.get(file_name.as_str());
        if !keep_case(case_rows, secondary_rows.map(|v| v.as_slice()), secondary.is_some()) {
            stats.cases_skipped += 1;
            continue;
        }

        sections.push_str("<div class='file-section' style='display:none;'>\n");
        sections.push_str(&format!(
            "<div class='file-title'>File: {}</div>\n",
            escape_html(file_name)
        ));
        sections.push_str(&render_legend(case_rows));

        sections.push_str("<div class='row'>\n");

        sections.push_str("<div class='left'>\n<h3>City Survey</h3>\n");
        let side = secondary.is_some().then_some(MapSide::Left);
        sections.push_str(&render_case_column(
            case_rows,
            options,
            &maps_dir,
            side,
            &available_images,
            &mut stats,
        )?);
        sections.push_str("</div>\n");

        if let Some(rows) = secondary_rows {
            sections.push_str("<div class='right'>\n<h3>Small Survey</h3>\n");
            sections.push_str(&render_case_column(
                rows,
                options,
                &maps_dir,
                Some(MapSide::Right),
                &available_images,
                &mut stats,
            )?);
            sections.push_str("</div>\n");
        }

        sections.push_str("</div>\n</div>\n");
        stats.cases_rendered += 1;
    }
    progress.finish_and_clear();

    let html = assemble_document(&options.title, &sections);
    std::fs::write(output_html, html)?;

    info!(
        rendered = stats.cases_rendered,
        skipped = stats.cases_skipped,
        maps = stats.maps_written,
        output = %output_html.display(),
        "review report written"
    );
    Ok(stats)
}

/// Group rows per file name, preserving first-appearance order.
fn group_by_file(rows: &[DetectionRow]) -> Vec<(String, Vec<&DetectionRow>)> {
    let mut order: Vec<(String, Vec<&DetectionRow>)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        match positions.get(row.file_name.as_str()) {
            Some(&idx) => order[idx].1.push(row),
            None => {
                positions.insert(row.file_name.as_str(), order.len());
                order.push((row.file_name.clone(), vec![row]));
            }
        }
    }
    order
}

fn has_detections(rows: &[&DetectionRow]) -> bool {
    rows.iter().any(|r| r.possible_trees.unwrap_or(0) > 0)
}

fn has_matches(rows: &[&DetectionRow]) -> bool {
    rows.iter().any(|r| r.is_matched())
}

/// A case stays in the report if some survey detected something and some
/// survey matched something.
fn keep_case(
    primary: &[&DetectionRow],
    secondary: Option<&[&DetectionRow]>,
    two_surveys: bool,
) -> bool {
    if !two_surveys {
        return has_detections(primary) && has_matches(primary);
    }
    let secondary = secondary.unwrap_or(&[]);
    (has_detections(primary) || has_detections(secondary))
        && (has_matches(primary) || has_matches(secondary))
}

/// Per-tree-index color legend; the count comes from the `N_` prefix of the
/// annotated image's basename.
fn render_legend(rows: &[&DetectionRow]) -> String {
    let num_detections = rows
        .first()
        .and_then(|r| r.file_name_with_detections.as_deref())
        .map(detection_count_from_path)
        .unwrap_or(0);

    let mut legend = String::from("<div class='legend'><strong>Legend:</strong><br>\n");
    for index in 1..=num_detections {
        let (r, g, b) = colors::color_for_index(index);
        legend.push_str(&format!(
            "<span style='display:inline-block;width:20px;height:20px;\
             background-color:rgb({r},{g},{b});margin-right:5px;'></span>Tree index {index}<br>\n",
        ));
    }
    legend.push_str("</div>\n");
    legend
}

/// `"7_pano_001.jpg"` → 7; anything without a digit prefix → 0.
fn detection_count_from_path(path: &str) -> usize {
    let basename = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    basename
        .split('_')
        .next()
        .filter(|prefix| !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()))
        .and_then(|prefix| prefix.parse().ok())
        .unwrap_or(0)
}

/// Map iframe, annotated image and detail paragraphs for one survey column.
fn render_case_column(
    rows: &[&DetectionRow],
    options: &ReportOptions,
    maps_dir: &Path,
    side: Option<MapSide>,
    available_images: &HashSet<String>,
    stats: &mut ReportStats,
) -> Result<String> {
    let owned: Vec<DetectionRow> = rows.iter().map(|r| (*r).clone()).collect();
    let map_file = map::generate_map(
        &owned,
        maps_dir,
        options.zoom_start,
        options.direction_line_length,
        side,
    )?;
    stats.maps_written += 1;

    let mut html = String::new();
    html.push_str(&format!(
        "<div style='margin-bottom:20px;'><iframe src='maps/{}' width='100%' height='500px'></iframe></div>\n",
        encode_url_path(&map_file)
    ));

    // Annotated image.
    if let Some(path) = rows.first().and_then(|r| r.file_name_with_detections.as_deref()) {
        let basename = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !available_images.is_empty() && !available_images.contains(&basename) {
            warn!(image = basename.as_str(), "annotated image not found in images folder");
        }
        let img_path = options.images_dir.join(&basename);
        html.push_str(&format!(
            "<img src='{}' loading='lazy' alt='Detected Image'>\n",
            encode_url_path(&img_path.to_string_lossy())
        ));
    }

    html.push_str("<div class='details'>\n");

    // Matched detections.
    for row in rows.iter().filter(|r| r.is_matched()) {
        html.push_str(&format!(
            "<p><strong>Detection Tree With Match:</strong><br>\
             Tree Index: {index}<br>\
             Location: ({x_img}, {y_img})<br>\
             Real Angle (rad): {angle}<br>\
             Angle Difference (deg): {diff}<br>\
             <strong>Best Survey Match:</strong><br>\
             Tree ID: {id}<br>\
             Tree Name: {name}<br>\
             Location: ({x}, {y})<br></p>\n",
            index = opt_i64(&row.tree_index),
            x_img = opt_f64(&row.x_tree_image),
            y_img = opt_f64(&row.y_tree_image),
            angle = opt_f64_fixed(&row.real_angle),
            diff = opt_f64_fixed(&row.best_angle_diff),
            id = opt_i64(&row.tree_id),
            name = escape_html(row.tree_name.as_deref().unwrap_or("None")),
            x = opt_f64(&row.x_tree),
            y = opt_f64(&row.y_tree),
        ));
    }

    // Unmatched detections.
    let unmatched: Vec<&&DetectionRow> = rows.iter().filter(|r| !r.is_matched()).collect();
    if !unmatched.is_empty() {
        html.push_str("<strong>Detection Trees Without Match</strong>\n");
        for row in unmatched {
            html.push_str(&format!(
                "<p>Tree Index: {index}<br>\
                 Real Angle (rad): {angle}<br>\
                 Location: ({x_img}, {y_img})<br></p>\n",
                index = opt_i64(&row.tree_index),
                angle = opt_f64_fixed(&row.real_angle),
                x_img = opt_f64(&row.x_tree_image),
                y_img = opt_f64(&row.y_tree_image),
            ));
        }
    }

    // Candidates the case considered but matched nowhere.
    let matched_ids: HashSet<i64> = rows.iter().filter_map(|r| r.tree_id).collect();
    let extras: Vec<_> = rows
        .first()
        .map(|r| {
            r.additional_matches
                .iter()
                .filter(|m| m.id.map(|id| !matched_ids.contains(&id)).unwrap_or(true))
                .collect()
        })
        .unwrap_or_default();
    if !extras.is_empty() {
        html.push_str("<strong>Potential Survey Trees:</strong>\n");
        for candidate in extras {
            html.push_str(&format!(
                "<p>ID: {id}<br>Tree Name: {name}<br>Location: ({x}, {y})<br></p>\n",
                id = opt_i64(&candidate.id),
                name = escape_html(candidate.tree_name.as_deref().unwrap_or("None")),
                x = opt_f64(&candidate.location_x),
                y = opt_f64(&candidate.location_y),
            ));
        }
    }

    html.push_str("</div>\n");
    Ok(html)
}

fn opt_i64(value: &Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string())
}

fn opt_f64(value: &Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string())
}

fn opt_f64_fixed(value: &Option<f64>) -> String {
    value
        .map(|v| format!("{:.5}", v))
        .unwrap_or_else(|| "None".to_string())
}

/// Index the annotated-images folder by basename. A missing folder is a
/// warning, not an error — the report still renders with dangling links.
fn scan_detected_images(folder: &Path) -> HashSet<String> {
    if !folder.exists() {
        warn!(folder = %folder.display(), "annotated images folder not found");
        return HashSet::new();
    }

    let mut basenames = HashSet::new();
    for entry in WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy();
            if IMAGE_EXTENSIONS.iter().any(|&e| e == ext_str) {
                if let Some(name) = path.file_name() {
                    basenames.insert(name.to_string_lossy().to_string());
                }
            }
        }
    }
    basenames
}

/// Percent-encode a path for use in a URL attribute, leaving separators.
fn encode_url_path(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for byte in path.replace('\\', "/").bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

const REPORT_STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 0; padding: 0; }\n\
.file-section { margin-bottom: 50px; border-bottom: 2px solid #ddd; padding-bottom: 20px; }\n\
.file-title { font-size: 24px; font-weight: bold; margin: 20px 0; }\n\
.row { display: flex; margin-bottom: 20px; }\n\
.left { flex: 50%; padding: 10px; }\n\
.right { flex: 50%; padding: 10px; }\n\
img { max-width: 100%; height: auto; border: 1px solid #ddd; margin-bottom: 10px; }\n\
.details { margin-top: 10px; }\n\
.legend { margin-bottom: 10px; padding: 5px; border: 1px solid #ccc; display: inline-block; }\n";

const PAGINATION_SCRIPT: &str = "\
document.addEventListener('DOMContentLoaded', function () {\n\
    let currentIndex = 0;\n\
    const fileSections = document.querySelectorAll('.file-section');\n\
    const totalCases = fileSections.length;\n\
    const progressBar = document.getElementById('progressBar');\n\
    const progressText = document.getElementById('progress');\n\
    const prevBtn = document.getElementById('prevBtn');\n\
    const nextBtn = document.getElementById('nextBtn');\n\
\n\
    function showCase(index) {\n\
        fileSections.forEach((section, i) => {\n\
            section.style.display = i === index ? 'block' : 'none';\n\
        });\n\
        progressText.innerText = `Case ${index + 1} of ${totalCases}`;\n\
        prevBtn.disabled = index === 0;\n\
        nextBtn.disabled = index === totalCases - 1;\n\
        progressBar.value = ((index + 1) / totalCases) * 100;\n\
    }\n\
\n\
    prevBtn.addEventListener('click', function () {\n\
        if (currentIndex > 0) { currentIndex--; showCase(currentIndex); }\n\
    });\n\
    nextBtn.addEventListener('click', function () {\n\
        if (currentIndex < totalCases - 1) { currentIndex++; showCase(currentIndex); }\n\
    });\n\
\n\
    if (totalCases > 0) { showCase(currentIndex); }\n\
});\n";

fn assemble_document(title: &str, sections: &str) -> String {
    let generated = Local::now().format("%Y-%m-%d %H:%M");
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>{title}</title>\n\
         <style>\n{style}</style>\n\
         <script>\n{script}</script>\n\
         </head>\n<body>\n\
         <h1>{title}</h1>\n\
         <div style=\"text-align: center; margin-bottom: 20px;\">\n\
         <span id=\"progress\">Case 1 of X</span><br>\n\
         <progress id=\"progressBar\" value=\"0\" max=\"100\" style=\"width: 100%;\"></progress><br>\n\
         <button id=\"prevBtn\" disabled>Previous</button>\n\
         <button id=\"nextBtn\">Next</button>\n\
         </div>\n\
         {sections}\
         <footer style=\"text-align: center; color: #888; margin: 20px;\">Generated {generated}</footer>\n\
         </body>\n</html>\n",
        title = escape_html(title),
        style = REPORT_STYLE,
        script = PAGINATION_SCRIPT,
        sections = sections,
        generated = generated,
    )
}
