//! Progressive per-photo image loading
//!
//! Once a photo becomes visible its medium and original variants are
//! requested together. Whichever arrives first is shown; the original
//! always replaces the medium, never the other way round. All results go
//! through the session `ImageCache`, which is the only place blobs live.

use bytes::Bytes;

use crate::error::GalleryError;
use crate::state::cache::{BlobHandle, ImageCache, Variant};
use crate::state::data::{Photo, PhotoId, PhotoSources};

/// Loader state. Exactly one of these holds at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// Not visible yet, nothing requested
    Idle,
    /// Requests issued, nothing displayable yet
    Loading,
    /// Showing the best blob so far; `None` for photos without a source
    Displayed(Option<BlobHandle>),
    /// Every request failed and nothing is cached
    Failed(String),
}

/// One image download for the shell to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub photo_id: PhotoId,
    pub variant: Variant,
    pub url: String,
}

/// Render state exposed to the rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Displayed,
    Failed,
}

/// Per-photo render contract
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoView {
    pub state: ViewState,
    pub src: Option<BlobHandle>,
    pub error: Option<String>,
    /// Height / width of the photo
    pub aspect_ratio: f32,
}

#[derive(Debug, Clone)]
pub struct ProgressiveImageLoader {
    photo_id: PhotoId,
    sources: PhotoSources,
    aspect_ratio: f32,
    /// Placeholders never read the cache or the network
    placeholder: bool,
    state: LoadState,
    medium_in_flight: bool,
    original_in_flight: bool,
}

impl ProgressiveImageLoader {
    /// Create the loader, starting from whatever the cache already holds
    pub fn new(photo: &Photo, cache: &ImageCache) -> Self {
        let cached = cache.get(photo.id).filter(|_| !photo.is_skeleton);
        let state = match cached {
            Some(entry) => LoadState::Displayed(Some(entry.blob.clone())),
            None => LoadState::Idle,
        };

        ProgressiveImageLoader {
            photo_id: photo.id,
            sources: photo.src.clone(),
            aspect_ratio: photo.aspect_ratio(),
            placeholder: photo.is_skeleton,
            state,
            medium_in_flight: false,
            original_in_flight: false,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_fetching(&self) -> bool {
        self.medium_in_flight || self.original_in_flight
    }

    /// React to a visibility change and return the downloads to start
    pub fn on_visibility(&mut self, visible: bool, cache: &ImageCache) -> Vec<ImageRequest> {
        if !visible {
            return Vec::new();
        }

        if self.placeholder {
            self.state = LoadState::Displayed(None);
            return Vec::new();
        }

        if let Some(entry) = cache.get(self.photo_id) {
            self.state = LoadState::Displayed(Some(entry.blob.clone()));
            if entry.is_original_resolution {
                return Vec::new();
            }
            // Show the medium right away but still upgrade it
            return self.request(Variant::Original).into_iter().collect();
        }

        if self.is_fetching() || matches!(self.state, LoadState::Displayed(_)) {
            return Vec::new();
        }

        if self.sources.medium.is_empty() {
            self.state = LoadState::Displayed(None);
            return Vec::new();
        }

        tracing::trace!(photo = %self.photo_id, "loading image");
        self.state = LoadState::Loading;
        [Variant::Medium, Variant::Original]
            .into_iter()
            .filter_map(|variant| self.request(variant))
            .collect()
    }

    fn request(&mut self, variant: Variant) -> Option<ImageRequest> {
        let (in_flight, url) = match variant {
            Variant::Medium => (&mut self.medium_in_flight, &self.sources.medium),
            Variant::Original => (&mut self.original_in_flight, &self.sources.original),
        };
        if *in_flight || url.is_empty() {
            return None;
        }
        *in_flight = true;

        Some(ImageRequest {
            photo_id: self.photo_id,
            variant,
            url: url.clone(),
        })
    }

    /// Apply the outcome of one download.
    ///
    /// Successful bytes go through the cache write policy. A failure is
    /// only surfaced when nothing at all is cached for this photo.
    pub fn on_fetched(
        &mut self,
        request: &ImageRequest,
        result: Result<Bytes, GalleryError>,
        cache: &mut ImageCache,
    ) {
        if request.photo_id != self.photo_id {
            return;
        }
        let outcome = result.map(|bytes| {
            cache.store(self.photo_id, request.variant, bytes);
        });
        self.on_settled(request, outcome, cache);
    }

    /// A download for this photo finished and its bytes, if any, are
    /// already in the cache. Used when the same download serves
    /// several loaders.
    pub fn on_settled(
        &mut self,
        request: &ImageRequest,
        outcome: Result<(), GalleryError>,
        cache: &ImageCache,
    ) {
        if request.photo_id != self.photo_id || self.placeholder {
            return;
        }
        match request.variant {
            Variant::Medium => self.medium_in_flight = false,
            Variant::Original => self.original_in_flight = false,
        }

        match (outcome, cache.get(self.photo_id)) {
            // The cache holds the best blob after the write policy ran
            (Ok(()), Some(entry)) => {
                self.state = LoadState::Displayed(Some(entry.blob.clone()));
            }
            (Ok(()), None) => {}
            (Err(err), Some(_)) => {
                tracing::debug!(
                    photo = %self.photo_id,
                    variant = ?request.variant,
                    error = %err,
                    "ignoring image failure, cached copy kept"
                );
            }
            (Err(err), None) => {
                tracing::warn!(
                    photo = %self.photo_id,
                    variant = ?request.variant,
                    error = %err,
                    "image fetch failed"
                );
                self.state = LoadState::Failed(err.to_string());
            }
        }
    }

    /// Render contract for this photo
    pub fn view(&self) -> PhotoView {
        let (state, src, error) = match &self.state {
            LoadState::Idle | LoadState::Loading => (ViewState::Loading, None, None),
            LoadState::Displayed(blob) => (ViewState::Displayed, blob.clone(), None),
            LoadState::Failed(message) => (ViewState::Failed, None, Some(message.clone())),
        };
        PhotoView {
            state,
            src,
            error,
            aspect_ratio: self.aspect_ratio,
        }
    }
}
