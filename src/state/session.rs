//! The session store
//!
//! One `Session` is constructed when the gallery starts and lives until
//! it closes. It owns the image cache and the pagination state; every
//! rendering subtree borrows it instead of reaching for a global.

use super::cache::ImageCache;
use super::pagination::PaginationController;
use crate::config::Config;

/// Session-scoped store shared by the grid and the detail view
#[derive(Debug)]
pub struct Session {
    pub cache: ImageCache,
    pub pagination: PaginationController,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        tracing::info!(page_size = config.page_size, "session started");
        Session {
            cache: ImageCache::new(),
            pagination: PaginationController::new(config.page_size),
        }
    }

    /// Cancel pending timers and release cached blobs
    pub fn teardown(&mut self) {
        self.pagination.teardown();
        let released = self.cache.release();
        tracing::info!(released, "session closed");
    }
}
