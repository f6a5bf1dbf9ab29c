//! GPU image handles for cached blobs
//!
//! iced uploads an image once per `Handle`, so each blob gets exactly one
//! handle, keyed by blob id. A handle lives as long as some view shows
//! its blob, which can outlast the blob's cache entry when an original
//! replaces a medium that a tile is still displaying.

use std::collections::{HashMap, HashSet};

use iced::widget::image::Handle;

use crate::state::cache::BlobHandle;

#[derive(Debug, Default)]
pub struct Textures {
    handles: HashMap<u64, Handle>,
}

impl Textures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep exactly the handles of the blobs being displayed, creating
    /// the missing ones. The handle shares the blob's buffer.
    pub fn sync<'b>(&mut self, displayed: impl IntoIterator<Item = &'b BlobHandle>) {
        let mut live = HashSet::new();
        for blob in displayed {
            live.insert(blob.id());
            self.handles
                .entry(blob.id())
                .or_insert_with(|| Handle::from_bytes(blob.shared()));
        }
        self.handles.retain(|id, _| live.contains(id));
    }

    /// Handle for the blob a view wants to show, if it is uploaded
    pub fn handle_for(&self, blob: Option<&BlobHandle>) -> Option<Handle> {
        self.handles.get(&blob?.id()).cloned()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn clear(&mut self) {
        self.handles.clear();
    }
}
