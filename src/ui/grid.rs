//! Masonry grid: the composition root of the gallery
//!
//! Takes the photo list from the session, places it into columns with
//! the current layout metrics, keeps one visibility tracker per list
//! position and one progressive loader per photo, and turns
//! scroll/resize events into image and next-page requests.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use iced::widget::{column, container, image, mouse_area, row, text, Column};
use iced::{Element, Length};

use super::textures::Textures;
use crate::error::GalleryError;
use crate::layout::metrics::{tile_height, GAP, PADDING};
use crate::layout::{distribute, LayoutMetrics, Region, ResizeOutcome, ResponsiveLayoutObserver};
use crate::loader::{
    ImageRequest, LoadState, PhotoView, ProgressiveImageLoader, ViewState, VisibilityTracker,
};
use crate::state::cache::BlobHandle;
use crate::state::data::{Photo, PhotoId};
use crate::state::pagination::PageRequest;
use crate::state::session::Session;
use crate::state::timer::TimerToken;
use crate::Message;

/// Fetches produced by a grid event
#[derive(Debug, Default, PartialEq)]
pub struct GridEffects {
    pub images: Vec<ImageRequest>,
    pub next_page: Option<PageRequest>,
}

/// Placeholders share small ids with real photos, so they are keyed apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TileKey {
    id: PhotoId,
    skeleton: bool,
}

impl TileKey {
    fn of(photo: &Photo) -> Self {
        TileKey {
            id: photo.id,
            skeleton: photo.is_skeleton,
        }
    }

    fn real(id: PhotoId) -> Self {
        TileKey { id, skeleton: false }
    }
}

/// One position of the photo list. Repeated ids get one slot each so
/// every occurrence is placed and observed on its own.
#[derive(Debug)]
struct Slot {
    key: TileKey,
    tracker: VisibilityTracker,
}

impl Slot {
    fn new(photo: &Photo, session: &Session) -> Self {
        let cached = !photo.is_skeleton && session.cache.contains(photo.id);
        Slot {
            key: TileKey::of(photo),
            tracker: VisibilityTracker::new(0.0, cached),
        }
    }
}

/// Placement of one tile, handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedTile {
    pub photo: Photo,
    pub region: Region,
    pub view: PhotoView,
}

#[derive(Debug)]
pub struct MasonryGrid {
    layout: ResponsiveLayoutObserver,
    /// Indexed like the session's photo list
    slots: Vec<Slot>,
    /// Loaders are per photo and shared by repeated occurrences
    loaders: HashMap<TileKey, ProgressiveImageLoader>,
    /// Visible part of the grid content
    viewport: Region,
    /// Trigger index that was last checked while visible
    last_trigger: Option<usize>,
}

impl MasonryGrid {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        MasonryGrid {
            layout: ResponsiveLayoutObserver::new(viewport_width),
            slots: Vec::new(),
            loaders: HashMap::new(),
            viewport: Region::new(0.0, 0.0, viewport_width, viewport_height),
            last_trigger: None,
        }
    }

    pub fn metrics(&self) -> LayoutMetrics {
        self.layout.metrics()
    }

    pub fn viewport(&self) -> Region {
        self.viewport
    }

    /// Window resize. Returns the cooldown token to schedule, if any.
    pub fn on_resize(
        &mut self,
        width: f32,
        height: f32,
        session: &mut Session,
    ) -> (Option<TimerToken>, GridEffects) {
        self.viewport.width = width;
        self.viewport.height = height;

        match self.layout.on_resize(width) {
            ResizeOutcome::Recomputed { metrics, cooldown } => {
                tracing::debug!(columns = metrics.column_count, width = metrics.column_width, "layout recomputed");
                (Some(cooldown), self.sync(session))
            }
            ResizeOutcome::Coalesced | ResizeOutcome::Ignored => (None, GridEffects::default()),
        }
    }

    pub fn on_cooldown_elapsed(&mut self, token: TimerToken, session: &mut Session) -> GridEffects {
        match self.layout.on_cooldown_elapsed(token) {
            Some(_) => self.sync(session),
            None => GridEffects::default(),
        }
    }

    /// The grid was scrolled; `offset_y` is the top of the visible content
    pub fn on_scroll(&mut self, offset_y: f32, width: f32, height: f32, session: &mut Session) -> GridEffects {
        self.viewport = Region::new(0.0, offset_y, width, height);
        self.observe(session)
    }

    /// Reconcile tiles with the session's photo list, re-place them and
    /// deliver intersection callbacks. Call after the list changes.
    pub fn sync(&mut self, session: &mut Session) -> GridEffects {
        self.reconcile(session);
        self.place(session);
        self.observe(session)
    }

    fn reconcile(&mut self, session: &Session) {
        let photos = session.pagination.photos();

        let wanted: HashSet<TileKey> = photos.iter().map(TileKey::of).collect();
        self.loaders.retain(|key, _| wanted.contains(key));
        for photo in photos {
            self.loaders
                .entry(TileKey::of(photo))
                .or_insert_with(|| ProgressiveImageLoader::new(photo, &session.cache));
        }

        for slot in self.slots.iter_mut().skip(photos.len()) {
            slot.tracker.teardown();
        }
        self.slots.truncate(photos.len());
        for (index, photo) in photos.iter().enumerate() {
            match self.slots.get_mut(index) {
                Some(slot) if slot.key == TileKey::of(photo) => {}
                Some(slot) => {
                    slot.tracker.teardown();
                    *slot = Slot::new(photo, session);
                }
                None => self.slots.push(Slot::new(photo, session)),
            }
        }
    }

    /// Attach every slot to its region in content coordinates
    fn place(&mut self, session: &Session) {
        let metrics = self.metrics();
        let photos = session.pagination.photos();
        let indices: Vec<usize> = (0..photos.len()).collect();
        let Ok(columns) = distribute(indices, metrics.column_count as isize) else {
            return;
        };

        for (column_index, column) in columns.iter().enumerate() {
            let x = PADDING + column_index as f32 * (metrics.column_width + GAP);
            let mut y = 0.0;
            for &index in column {
                let height = tile_height(&photos[index], metrics.column_width);
                if let Some(slot) = self.slots.get_mut(index) {
                    slot.tracker.attach(Region::new(x, y, metrics.column_width, height));
                }
                y += height + GAP;
            }
        }
    }

    fn observe(&mut self, session: &mut Session) -> GridEffects {
        let mut effects = GridEffects::default();
        let trigger = session.pagination.next_page_trigger_index();
        let mut trigger_visible = false;
        let mut trigger_became_visible = false;

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let changed = slot.tracker.observe(&self.viewport);
            if let (Some(visible), Some(loader)) = (changed, self.loaders.get_mut(&slot.key)) {
                effects.images.extend(loader.on_visibility(visible, &session.cache));
            }
            if Some(index) == trigger {
                trigger_visible = slot.tracker.visible();
                trigger_became_visible = changed == Some(true);
            }
        }

        // Fire when the trigger photo scrolls into view, or when the
        // trigger moved onto a photo that is already in view
        let moved = trigger.is_some() && trigger != self.last_trigger;
        if trigger_visible && (trigger_became_visible || moved) {
            self.last_trigger = trigger;
            effects.next_page = session.pagination.request_next_page();
        }

        effects
    }

    /// Route a finished download to its loader and the cache. Downloads
    /// for photos that left the grid still land in the cache.
    pub fn on_image_fetched(
        &mut self,
        request: &ImageRequest,
        result: Result<Bytes, GalleryError>,
        session: &mut Session,
    ) {
        match self.loaders.get_mut(&TileKey::real(request.photo_id)) {
            Some(loader) => loader.on_fetched(request, result, &mut session.cache),
            None => {
                if let Ok(bytes) = result {
                    session.cache.store(request.photo_id, request.variant, bytes);
                }
            }
        }
    }

    /// Blobs currently shown by some tile
    pub fn displayed_blobs(&self) -> impl Iterator<Item = &BlobHandle> {
        self.loaders.values().filter_map(|loader| match loader.state() {
            LoadState::Displayed(Some(blob)) => Some(blob),
            _ => None,
        })
    }

    /// The photo list split into columns, with regions and render state
    pub fn placed_columns(&self, session: &Session) -> Vec<Vec<PlacedTile>> {
        let photos = session.pagination.photos();
        let indices: Vec<usize> = (0..photos.len()).collect();
        let columns = distribute(indices, self.metrics().column_count as isize).unwrap_or_default();

        columns
            .into_iter()
            .map(|column| {
                column
                    .into_iter()
                    .filter_map(|index| {
                        let slot = self.slots.get(index)?;
                        let loader = self.loaders.get(&slot.key)?;
                        Some(PlacedTile {
                            photo: photos[index].clone(),
                            region: slot.tracker.region()?,
                            view: loader.view(),
                        })
                    })
                    .collect()
            })
            .collect()
    }

    /// Release every tracker
    pub fn teardown(&mut self) {
        self.layout.teardown();
        for slot in &mut self.slots {
            slot.tracker.teardown();
        }
        self.slots.clear();
        self.loaders.clear();
    }
}

/// Render the masonry columns
pub fn view<'a>(grid: &MasonryGrid, session: &Session, textures: &'a Textures) -> Element<'a, Message> {
    let metrics = grid.metrics();

    let columns = grid.placed_columns(session).into_iter().map(|tiles| {
        let tiles = tiles.into_iter().map(|tile| view_tile(tile, metrics.column_width, textures));
        let column: Element<'a, Message> = Column::with_children(tiles)
            .spacing(GAP)
            .width(Length::Fixed(metrics.column_width))
            .into();
        column
    });

    container(row(columns).spacing(GAP))
        .padding([0.0, PADDING])
        .into()
}

fn view_tile<'a>(tile: PlacedTile, width: f32, textures: &'a Textures) -> Element<'a, Message> {
    let height = tile.region.height;
    let id = tile.photo.id;

    let handle = textures.handle_for(tile.view.src.as_ref());
    let content: Element<'a, Message> = match (tile.view.state, handle) {
        (ViewState::Failed, _) => container(text(tile.view.error.unwrap_or_default()).size(14))
            .padding(8)
            .into(),
        (ViewState::Displayed, Some(handle)) => image(handle)
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
            .content_fit(iced::ContentFit::Cover)
            .into(),
        _ => super::skeleton(width, height),
    };

    let tile_body = container(column![content])
        .width(Length::Fixed(width))
        .height(Length::Fixed(height));

    if tile.photo.is_skeleton {
        tile_body.into()
    } else {
        mouse_area(tile_body).on_press(Message::OpenPhoto(id)).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::cache::Variant;
    use crate::state::data::{PhotoPage, PhotoSources};
    use crate::state::pagination::PageQuery;

    fn session() -> Session {
        let config = Config::from_lookup(|key| (key == "PEXELS_API_KEY").then(|| "key".to_string())).unwrap();
        Session::new(&config)
    }

    fn photo(id: u64) -> Photo {
        Photo {
            id: PhotoId(id),
            alt: String::new(),
            photographer: String::new(),
            photographer_url: String::new(),
            width: 300,
            height: 300,
            src: PhotoSources {
                medium: format!("https://img/{id}/m.jpg"),
                original: format!("https://img/{id}/o.jpg"),
            },
            is_skeleton: false,
        }
    }

    /// Session with `count` real photos loaded and a next-page cursor
    fn loaded(count: u64) -> Session {
        let mut session = session();
        let request = session.pagination.start();
        session.pagination.page_loaded(
            &request,
            Ok(PhotoPage {
                photos: (1..=count).map(photo).collect(),
                next_page: Some("https://api.example.com/v1/curated?page=2".to_string()),
            }),
        );
        session
    }

    #[test]
    fn test_skeletons_request_nothing() {
        let mut session = session();
        let mut grid = MasonryGrid::new(1280.0, 800.0);
        let effects = grid.sync(&mut session);
        assert!(effects.images.is_empty());
        assert!(effects.next_page.is_none());
        assert_eq!(grid.placed_columns(&session).len(), 4);
    }

    #[test]
    fn test_only_visible_photos_load() {
        let mut session = loaded(40);
        // 4 columns of 292px square tiles: rows 0..=2 intersect 800px + margin
        let mut grid = MasonryGrid::new(1280.0, 800.0);
        let effects = grid.sync(&mut session);

        let medium: Vec<_> = effects
            .images
            .iter()
            .filter(|r| r.variant == Variant::Medium)
            .collect();
        assert_eq!(medium.len(), 12);
        assert_eq!(effects.images.len(), 24);
        assert!(effects.next_page.is_none());

        // Scrolling back and forth issues nothing twice
        grid.on_scroll(0.0, 1280.0, 800.0, &mut session);
        let again = grid.on_scroll(0.0, 1280.0, 800.0, &mut session);
        assert!(again.images.is_empty());
    }

    #[test]
    fn test_near_end_photo_requests_next_page() {
        let mut session = loaded(40);
        let mut grid = MasonryGrid::new(1280.0, 800.0);
        grid.sync(&mut session);

        // Trigger index 30 sits in row 7; scroll it into view
        let effects = grid.on_scroll(7.0 * (292.0 + GAP), 1280.0, 800.0, &mut session);
        let request = effects.next_page.expect("next page requested");
        assert!(matches!(request.query, PageQuery::Cursor(_)));
        assert!(session.pagination.state().loading);

        // Further scrolling while loading does not request again
        let effects = grid.on_scroll(7.0 * (292.0 + GAP) + 5.0, 1280.0, 800.0, &mut session);
        assert!(effects.next_page.is_none());
    }

    #[test]
    fn test_image_results_reach_tiles_and_cache() {
        let mut session = loaded(4);
        let mut grid = MasonryGrid::new(1280.0, 800.0);
        let effects = grid.sync(&mut session);

        for request in &effects.images {
            grid.on_image_fetched(request, Ok(Bytes::from(vec![request.photo_id.0 as u8])), &mut session);
        }
        assert_eq!(session.cache.len(), 4);
        assert!(session.cache.is_original(PhotoId(1)));

        let placed = grid.placed_columns(&session);
        assert_eq!(placed.len(), 4);
        assert!(placed
            .iter()
            .flatten()
            .all(|tile| tile.view.state == ViewState::Displayed && tile.view.src.is_some()));
    }

    #[test]
    fn test_results_for_removed_photos_are_cached() {
        let mut session = loaded(4);
        let mut grid = MasonryGrid::new(1280.0, 800.0);
        let effects = grid.sync(&mut session);

        // A new search replaces the collection before downloads finish
        let token = session.pagination.set_search("cats");
        session.pagination.search_timer_elapsed(token).unwrap();
        grid.sync(&mut session);

        let original = effects
            .images
            .iter()
            .find(|r| r.variant == Variant::Original)
            .unwrap();
        grid.on_image_fetched(original, Ok(Bytes::from(vec![1])), &mut session);
        assert!(session.cache.is_original(original.photo_id));
    }

    #[test]
    fn test_resize_relays_columns() {
        let mut session = loaded(12);
        let mut grid = MasonryGrid::new(1280.0, 800.0);
        grid.sync(&mut session);

        let (token, _) = grid.on_resize(600.0, 800.0, &mut session);
        assert!(token.is_some());
        assert_eq!(grid.metrics().column_count, 2);
        assert_eq!(grid.placed_columns(&session).len(), 2);

        let (coalesced, _) = grid.on_resize(400.0, 800.0, &mut session);
        assert!(coalesced.is_none());
        grid.on_cooldown_elapsed(token.unwrap(), &mut session);
        assert_eq!(grid.metrics().column_count, 1);

        let placed = grid.placed_columns(&session);
        assert_eq!(placed[0].len(), 12);
        assert_eq!(placed[0][1].region.y, placed[0][0].region.height + GAP);
    }

    #[test]
    fn test_cached_photo_is_displayed_without_fetch() {
        let mut session = loaded(1);
        session.cache.store(PhotoId(1), Variant::Original, vec![5]);

        let mut grid = MasonryGrid::new(1280.0, 800.0);
        let effects = grid.sync(&mut session);
        assert!(effects.images.is_empty());
        let placed = grid.placed_columns(&session);
        assert_eq!(placed[0][0].view.state, ViewState::Displayed);
    }

    #[test]
    fn test_repeated_id_gets_its_own_slot() {
        let mut session = session();
        let request = session.pagination.start();
        let mut photos: Vec<Photo> = (1..=39).map(photo).collect();
        photos.push(photo(1));
        session.pagination.page_loaded(
            &request,
            Ok(PhotoPage {
                photos,
                next_page: None,
            }),
        );

        let mut grid = MasonryGrid::new(1280.0, 800.0);
        let effects = grid.sync(&mut session);

        // The first occurrence is on screen and loads
        assert!(effects.images.iter().any(|r| r.photo_id == PhotoId(1)));
        let placed = grid.placed_columns(&session);
        assert_eq!(placed[0][0].photo.id, PhotoId(1));
        assert_eq!(placed[0][0].region, Region::new(PADDING, 0.0, 292.0, 292.0));

        // The repeat keeps its own slot at the end of the last column
        let repeat = placed[3].last().unwrap();
        assert_eq!(repeat.photo.id, PhotoId(1));
        assert_eq!(repeat.region.x, PADDING + 3.0 * (292.0 + GAP));
        assert_eq!(repeat.region.y, 9.0 * (292.0 + GAP));

        // Both occurrences share one loader and show the same blob
        let medium = effects
            .images
            .iter()
            .find(|r| r.photo_id == PhotoId(1) && r.variant == Variant::Medium)
            .unwrap();
        grid.on_image_fetched(medium, Ok(Bytes::from(vec![1])), &mut session);
        let placed = grid.placed_columns(&session);
        assert_eq!(placed[0][0].view, placed[3].last().unwrap().view);
        assert_eq!(grid.displayed_blobs().count(), 1);
    }

    #[test]
    fn test_trigger_uses_its_own_position_with_repeats() {
        let mut session = session();
        let request = session.pagination.start();
        // Index 30 (the trigger) repeats id 1, which also sits at index 0
        let mut photos: Vec<Photo> = (1..=40).map(photo).collect();
        photos[30] = photo(1);
        session.pagination.page_loaded(
            &request,
            Ok(PhotoPage {
                photos,
                next_page: Some("https://api.example.com/v1/curated?page=2".to_string()),
            }),
        );

        let mut grid = MasonryGrid::new(1280.0, 800.0);
        let effects = grid.sync(&mut session);
        // Index 0 is visible but the trigger position is not
        assert!(effects.next_page.is_none());

        let effects = grid.on_scroll(7.0 * (292.0 + GAP), 1280.0, 800.0, &mut session);
        assert!(effects.next_page.is_some());
    }

    #[test]
    fn test_displayed_blobs_follow_loaders() {
        let mut session = loaded(1);
        let mut grid = MasonryGrid::new(1280.0, 800.0);
        assert_eq!(grid.displayed_blobs().count(), 0);

        let effects = grid.sync(&mut session);
        let original = effects.images.iter().find(|r| r.variant == Variant::Original).unwrap();
        grid.on_image_fetched(original, Ok(Bytes::from(vec![2])), &mut session);

        let cached = session.cache.get(PhotoId(1)).unwrap().blob.clone();
        assert_eq!(grid.displayed_blobs().collect::<Vec<_>>(), vec![&cached]);
    }

    #[test]
    fn test_teardown_releases_tiles() {
        let mut session = loaded(4);
        let mut grid = MasonryGrid::new(1280.0, 800.0);
        grid.sync(&mut session);
        grid.teardown();
        assert!(grid.placed_columns(&session).iter().all(Vec::is_empty));
    }
}
