//! Per-tile visibility tracking
//!
//! A geometric stand-in for an intersection observer: the tile's region
//! is tested against the viewport grown by `ROOT_MARGIN`, so images
//! start loading slightly before they scroll into view.

use crate::layout::Region;

/// Pre-fetch margin added around the viewport
pub const ROOT_MARGIN: f32 = 20.0;

#[derive(Debug, Clone)]
pub struct VisibilityTracker {
    threshold: f32,
    region: Option<Region>,
    visible: bool,
    subscribed: bool,
    /// The first observation after (re)subscribing always reports
    pending_initial: bool,
}

impl VisibilityTracker {
    /// `already_known_visible` seeds `visible`, letting cached photos
    /// skip the loading placeholder.
    pub fn new(threshold: f32, already_known_visible: bool) -> Self {
        VisibilityTracker {
            threshold: threshold.clamp(0.0, 1.0),
            region: None,
            visible: already_known_visible,
            subscribed: true,
            pending_initial: true,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    /// Attach (or move) the observed region
    pub fn attach(&mut self, region: Region) {
        self.region = Some(region);
    }

    /// Change the threshold, re-subscribing if it differs
    pub fn set_threshold(&mut self, threshold: f32) {
        let threshold = threshold.clamp(0.0, 1.0);
        if threshold != self.threshold {
            self.threshold = threshold;
            self.subscribed = true;
            self.pending_initial = true;
        }
    }

    /// Deliver one intersection callback for the given viewport.
    ///
    /// Returns the new `visible` value when it changed (or on the first
    /// callback after subscribing), `None` otherwise.
    pub fn observe(&mut self, viewport: &Region) -> Option<bool> {
        if !self.subscribed {
            return None;
        }
        let region = self.region?;

        let intersecting = is_intersecting(&region, viewport, self.threshold);
        let changed = intersecting != self.visible || self.pending_initial;
        self.pending_initial = false;
        self.visible = intersecting;

        changed.then_some(intersecting)
    }

    /// Release the observer; later observations are ignored
    pub fn teardown(&mut self) {
        self.subscribed = false;
        self.region = None;
    }
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new(0.0, false)
    }
}

fn is_intersecting(region: &Region, viewport: &Region, threshold: f32) -> bool {
    let root = viewport.inflate(ROOT_MARGIN);
    match region.intersection(&root) {
        Some(overlap) => {
            let area = region.area();
            area > 0.0 && overlap.area() / area >= threshold
        }
        None => false,
    }
}
