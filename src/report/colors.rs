//! Per-tree-index legend palette
//!
//! Matches the colors the detection stage draws onto the annotated images;
//! indices past the palette wrap around.

pub const INDEX_COLORS: [(u8, u8, u8); 16] = [
    (230, 25, 75),
    (60, 180, 75),
    (255, 225, 25),
    (0, 130, 200),
    (245, 130, 49),
    (145, 30, 180),
    (70, 240, 240),
    (240, 50, 230),
    (210, 245, 60),
    (250, 190, 190),
    (0, 128, 128),
    (230, 190, 255),
    (170, 110, 40),
    (255, 250, 200),
    (128, 0, 0),
    (170, 255, 195),
];

/// Color for a 1-based tree index.
pub fn color_for_index(index: usize) -> (u8, u8, u8) {
    let wrapped = (index.saturating_sub(1)) % INDEX_COLORS.len();
    INDEX_COLORS[wrapped]
}
