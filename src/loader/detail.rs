//! Single-photo detail view
//!
//! Shows one photo at full size. The photo record is taken from the grid
//! when available, otherwise fetched by id. Pixels go through the same
//! progressive loader and session cache as the grid, so a photo already
//! seen in the grid appears instantly.

use super::progressive::{ImageRequest, PhotoView, ProgressiveImageLoader};
use crate::error::GalleryError;
use crate::state::cache::ImageCache;
use crate::state::data::{Photo, PhotoId};

/// Fetches the detail view needs before it can render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailRequests {
    /// Photo record to fetch by id
    pub photo: Option<PhotoId>,
    pub images: Vec<ImageRequest>,
}

#[derive(Debug, Clone)]
pub struct PhotoDetail {
    id: PhotoId,
    photo: Option<Photo>,
    loader: Option<ProgressiveImageLoader>,
    error: Option<String>,
}

impl PhotoDetail {
    /// Open the detail view for `id`. `known` is the record from the
    /// current collection, if the grid has it.
    pub fn open(id: PhotoId, known: Option<&Photo>, cache: &ImageCache) -> (Self, DetailRequests) {
        let mut detail = PhotoDetail {
            id,
            photo: None,
            loader: None,
            error: None,
        };

        let requests = match known {
            Some(photo) => DetailRequests {
                photo: None,
                images: detail.show(photo.clone(), cache),
            },
            None => DetailRequests {
                photo: Some(id),
                images: Vec::new(),
            },
        };
        (detail, requests)
    }

    fn show(&mut self, photo: Photo, cache: &ImageCache) -> Vec<ImageRequest> {
        let mut loader = ProgressiveImageLoader::new(&photo, cache);
        // The detail image is always on screen
        let images = loader.on_visibility(true, cache);
        self.photo = Some(photo);
        self.loader = Some(loader);
        images
    }

    pub fn id(&self) -> PhotoId {
        self.id
    }

    pub fn photo(&self) -> Option<&Photo> {
        self.photo.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Apply the result of the by-id photo fetch
    pub fn photo_loaded(
        &mut self,
        result: Result<Photo, GalleryError>,
        cache: &ImageCache,
    ) -> Vec<ImageRequest> {
        match result {
            Ok(photo) if photo.id == self.id => self.show(photo, cache),
            Ok(photo) => {
                tracing::warn!(expected = %self.id, received = %photo.id, "photo id mismatch");
                self.error = Some(format!("Failed to fetch photo with ID {}", self.id));
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(photo = %self.id, error = %err, "photo fetch failed");
                self.error = Some(format!("Failed to fetch photo with ID {}", self.id));
                Vec::new()
            }
        }
    }

    /// A download for the shown photo finished. The grid owns the cache
    /// write, so the detail loader only picks up the result.
    pub fn on_settled(
        &mut self,
        request: &ImageRequest,
        outcome: Result<(), GalleryError>,
        cache: &ImageCache,
    ) {
        if let Some(loader) = self.loader.as_mut() {
            loader.on_settled(request, outcome, cache);
        }
    }

    /// Render contract of the large image, once the record is known
    pub fn image(&self) -> Option<PhotoView> {
        self.loader.as_ref().map(ProgressiveImageLoader::view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::progressive::ViewState;
    use crate::state::cache::Variant;
    use crate::state::data::PhotoSources;

    fn photo(id: u64) -> Photo {
        Photo {
            id: PhotoId(id),
            alt: "Pier".to_string(),
            photographer: "Someone".to_string(),
            photographer_url: "https://www.pexels.com/@someone".to_string(),
            width: 400,
            height: 600,
            src: PhotoSources {
                medium: format!("https://img/{id}/m.jpg"),
                original: format!("https://img/{id}/o.jpg"),
            },
            is_skeleton: false,
        }
    }

    #[test]
    fn test_known_photo_starts_loading_immediately() {
        let cache = ImageCache::new();
        let (detail, requests) = PhotoDetail::open(PhotoId(5), Some(&photo(5)), &cache);
        assert!(requests.photo.is_none());
        assert_eq!(requests.images.len(), 2);
        assert_eq!(detail.image().unwrap().state, ViewState::Loading);
    }

    #[test]
    fn test_cached_original_needs_no_fetch() {
        let mut cache = ImageCache::new();
        cache.store(PhotoId(5), Variant::Original, vec![1]);
        let (detail, requests) = PhotoDetail::open(PhotoId(5), Some(&photo(5)), &cache);
        assert_eq!(requests, DetailRequests::default());
        assert_eq!(detail.image().unwrap().state, ViewState::Displayed);
    }

    #[test]
    fn test_unknown_photo_is_fetched_by_id() {
        let mut cache = ImageCache::new();
        let (mut detail, requests) = PhotoDetail::open(PhotoId(9), None, &cache);
        assert_eq!(requests.photo, Some(PhotoId(9)));
        assert!(detail.image().is_none());

        let images = detail.photo_loaded(Ok(photo(9)), &cache);
        assert_eq!(images.len(), 2);
        assert_eq!(detail.photo().unwrap().alt, "Pier");

        let original = images.iter().find(|r| r.variant == Variant::Original).unwrap();
        cache.store(PhotoId(9), Variant::Original, vec![3]);
        detail.on_settled(original, Ok(()), &cache);
        assert!(cache.is_original(PhotoId(9)));
        assert_eq!(detail.image().unwrap().state, ViewState::Displayed);
    }

    #[test]
    fn test_fetch_failure_names_the_photo() {
        let cache = ImageCache::new();
        let (mut detail, _) = PhotoDetail::open(PhotoId(9), None, &cache);
        let images = detail.photo_loaded(
            Err(GalleryError::Api {
                operation: "fetch photo".to_string(),
                status: 404,
            }),
            &cache,
        );
        assert!(images.is_empty());
        assert_eq!(detail.error(), Some("Failed to fetch photo with ID 9"));
    }

    #[test]
    fn test_shared_download_settles_detail_and_grid_loaders() {
        let mut cache = ImageCache::new();
        let mut grid_loader = ProgressiveImageLoader::new(&photo(5), &cache);
        let grid_requests = grid_loader.on_visibility(true, &cache);
        assert_eq!(grid_requests.len(), 2);

        // The detail view asks for the same variants while the grid's
        // downloads are still running
        let (mut detail, requests) = PhotoDetail::open(PhotoId(5), Some(&photo(5)), &cache);
        assert_eq!(requests.images, grid_requests);

        // One download lands: the grid stores it, the detail follows
        let original = &grid_requests[1];
        grid_loader.on_fetched(original, Ok(vec![4u8].into()), &mut cache);
        detail.on_settled(original, Ok(()), &cache);

        let shown = detail.image().unwrap();
        assert_eq!(shown.state, ViewState::Displayed);
        assert_eq!(shown.src, grid_loader.view().src);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_download_without_cache_fails_detail() {
        let cache = ImageCache::new();
        let (mut detail, requests) = PhotoDetail::open(PhotoId(5), Some(&photo(5)), &cache);
        let failure = GalleryError::Api {
            operation: "fetch image".to_string(),
            status: 500,
        };
        for request in &requests.images {
            detail.on_settled(request, Err(failure.clone()), &cache);
        }
        assert_eq!(detail.image().unwrap().state, ViewState::Failed);
    }
}
