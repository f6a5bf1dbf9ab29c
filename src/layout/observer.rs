//! Responsive column metrics with a resize cooldown
//!
//! The first resize of a burst recomputes immediately and opens a
//! cooldown window. Resizes inside the window are coalesced into one
//! trailing recompute when the window closes.

use std::time::Duration;

use super::metrics::LayoutMetrics;
use crate::state::timer::{Timer, TimerToken};

/// Length of the resize cooldown window
pub const RESIZE_COOLDOWN: Duration = Duration::from_millis(100);

/// Result of feeding one resize event to the observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeOutcome {
    /// Metrics were recomputed; the shell must report `cooldown` back
    /// through `on_cooldown_elapsed` after its delay
    Recomputed {
        metrics: LayoutMetrics,
        cooldown: TimerToken,
    },
    /// The event fell inside a cooldown window and was coalesced
    Coalesced,
    /// The observer has been torn down
    Ignored,
}

#[derive(Debug)]
pub struct ResponsiveLayoutObserver {
    metrics: LayoutMetrics,
    viewport_width: f32,
    cooldown: Timer,
    resized_during_cooldown: bool,
    subscribed: bool,
}

impl ResponsiveLayoutObserver {
    /// Compute the initial metrics and subscribe
    pub fn new(viewport_width: f32) -> Self {
        ResponsiveLayoutObserver {
            metrics: LayoutMetrics::for_viewport(viewport_width),
            viewport_width,
            cooldown: Timer::new(RESIZE_COOLDOWN),
            resized_during_cooldown: false,
            subscribed: true,
        }
    }

    pub fn metrics(&self) -> LayoutMetrics {
        self.metrics
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    pub fn on_resize(&mut self, viewport_width: f32) -> ResizeOutcome {
        if !self.subscribed {
            return ResizeOutcome::Ignored;
        }

        self.viewport_width = viewport_width;
        if self.cooldown.is_armed() {
            self.resized_during_cooldown = true;
            return ResizeOutcome::Coalesced;
        }

        self.metrics = LayoutMetrics::for_viewport(viewport_width);
        ResizeOutcome::Recomputed {
            metrics: self.metrics,
            cooldown: self.cooldown.arm(),
        }
    }

    /// Close the cooldown window. Returns the trailing metrics if any
    /// resize was coalesced while it was open.
    pub fn on_cooldown_elapsed(&mut self, token: TimerToken) -> Option<LayoutMetrics> {
        if !self.cooldown.expire(token) {
            return None;
        }

        let resized = std::mem::take(&mut self.resized_during_cooldown);
        if !resized {
            return None;
        }

        self.metrics = LayoutMetrics::for_viewport(self.viewport_width);
        tracing::debug!(
            columns = self.metrics.column_count,
            width = self.metrics.column_width,
            "trailing layout recompute"
        );
        Some(self.metrics)
    }

    /// Unsubscribe and cancel the pending cooldown
    pub fn teardown(&mut self) {
        self.subscribed = false;
        self.cooldown.cancel();
        self.resized_during_cooldown = false;
    }
}
