//! Masonry layout module
//!
//! This module handles:
//! - Column count and width from the viewport width (metrics.rs)
//! - Debounced responsive recomputation on resize (observer.rs)
//! - Round-robin placement of photos into columns (distribute.rs)

pub mod distribute;
pub mod metrics;
pub mod observer;

pub use distribute::distribute;
pub use metrics::LayoutMetrics;
pub use observer::{ResizeOutcome, ResponsiveLayoutObserver};

/// Axis-aligned rectangle in grid content coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Region { x, y, width, height }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Grow the region by `margin` on every side
    pub fn inflate(&self, margin: f32) -> Region {
        Region {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    /// Overlapping part of two regions, if they overlap at all
    pub fn intersection(&self, other: &Region) -> Option<Region> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        if right > left && bottom > top {
            Some(Region::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }
}
