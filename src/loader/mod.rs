//! Lazy image loading module
//!
//! This module handles:
//! - Tracking which tiles intersect the viewport (visibility.rs)
//! - Progressive medium-then-original loading per photo (progressive.rs)
//! - The single-photo detail view (detail.rs)

pub mod detail;
pub mod progressive;
pub mod visibility;

pub use progressive::{ImageRequest, LoadState, PhotoView, ProgressiveImageLoader, ViewState};
pub use visibility::VisibilityTracker;
