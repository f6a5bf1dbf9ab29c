//! Column count and width as pure functions of the viewport width

use crate::state::data::Photo;

/// Horizontal padding around the grid
pub const PADDING: f32 = 32.0;
/// Gap between columns and between tiles of a column
pub const GAP: f32 = 16.0;

/// Viewport widths above which another column is added
pub const BIG_SCREEN: f32 = 1200.0;
pub const MEDIUM_SCREEN: f32 = 800.0;
pub const SMALL_SCREEN: f32 = 500.0;

/// Column geometry derived from the viewport width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    /// Number of masonry columns (1 to 4)
    pub column_count: usize,
    /// Width of each column in pixels
    pub column_width: f32,
}

impl LayoutMetrics {
    pub fn for_viewport(viewport_width: f32) -> Self {
        let column_count = columns_for(viewport_width);
        LayoutMetrics {
            column_count,
            column_width: column_width_for(viewport_width, column_count, PADDING, GAP),
        }
    }
}

/// Number of columns for a viewport width
pub fn columns_for(viewport_width: f32) -> usize {
    if viewport_width > BIG_SCREEN {
        4
    } else if viewport_width > MEDIUM_SCREEN {
        3
    } else if viewport_width > SMALL_SCREEN {
        2
    } else {
        1
    }
}

/// Width of one column; `column_count` must be at least 1
pub fn column_width_for(viewport_width: f32, column_count: usize, padding: f32, gap: f32) -> f32 {
    debug_assert!(column_count >= 1, "column_count comes from columns_for");
    let count = column_count as f32;
    (viewport_width - 2.0 * padding - (count - 1.0) * gap) / count
}

/// Rendered height of a photo tile scaled to the column width
pub fn tile_height(photo: &Photo, column_width: f32) -> f32 {
    photo.aspect_ratio() * column_width
}
