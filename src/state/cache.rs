//! Session-scoped in-memory image cache
//!
//! Maps a photo id to the best blob obtained so far. Entries are never
//! evicted; the whole cache is released when the session ends.

use std::collections::HashMap;

use bytes::Bytes;

use super::data::PhotoId;

/// Which pre-rendered variant of a photo a fetch targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Medium,
    Original,
}

impl Variant {
    pub fn is_original(self) -> bool {
        matches!(self, Variant::Original)
    }
}

/// Locally resolvable handle to downloaded image bytes
///
/// Handles are cheap to clone and share one buffer; equality is by blob id.
#[derive(Clone)]
pub struct BlobHandle {
    id: u64,
    bytes: Bytes,
}

impl BlobHandle {
    /// Session-unique blob id
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Another reference to the same buffer
    pub fn shared(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl PartialEq for BlobHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BlobHandle {}

impl std::fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobHandle")
            .field("id", &self.id)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Best blob known for one photo
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub blob: BlobHandle,
    /// Once true, lower-resolution results never overwrite this entry
    pub is_original_resolution: bool,
}

/// In-memory blob cache shared by every loader of a session
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: HashMap<PhotoId, CacheEntry>,
    next_blob_id: u64,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PhotoId) -> Option<&CacheEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: PhotoId) -> bool {
        self.entries.contains_key(&id)
    }

    /// True if the entry for `id` is already full resolution
    pub fn is_original(&self, id: PhotoId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| entry.is_original_resolution)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store freshly downloaded bytes according to the write policy:
    /// a medium result is applied only if nothing is cached for `id`,
    /// an original result is always applied and marked full resolution.
    ///
    /// Returns the entry now cached when the write was applied.
    pub fn store(
        &mut self,
        id: PhotoId,
        variant: Variant,
        bytes: impl Into<Bytes>,
    ) -> Option<&CacheEntry> {
        if !variant.is_original() && self.entries.contains_key(&id) {
            return None;
        }

        self.next_blob_id += 1;
        let entry = CacheEntry {
            blob: BlobHandle {
                id: self.next_blob_id,
                bytes: bytes.into(),
            },
            is_original_resolution: variant.is_original(),
        };

        tracing::debug!(
            photo = %id,
            blob = entry.blob.id,
            bytes = entry.blob.len(),
            original = entry.is_original_resolution,
            "cached image"
        );

        self.entries.insert(id, entry);
        self.entries.get(&id)
    }

    /// Drop every entry and its blob. Returns the number released.
    pub fn release(&mut self) -> usize {
        let released = self.entries.len();
        self.entries.clear();
        released
    }
}

impl Drop for ImageCache {
    fn drop(&mut self) {
        let released = self.release();
        if released > 0 {
            tracing::info!(released, "released cached image blobs");
        }
    }
}
