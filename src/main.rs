use std::collections::HashSet;

use bytes::Bytes;
use iced::widget::{column, container, scrollable, text, text_input};
use iced::{Alignment, Element, Length, Size, Subscription, Task, Theme};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod layout;
mod loader;
mod state;
mod ui;

use api::ApiClient;
use config::Config;
use error::GalleryError;
use loader::detail::PhotoDetail;
use loader::ImageRequest;
use state::cache::Variant;
use state::data::{Photo, PhotoId, PhotoPage};
use state::pagination::PageRequest;
use state::session::Session;
use state::timer::TimerToken;
use ui::grid::{GridEffects, MasonryGrid};
use ui::textures::Textures;

/// Space taken by the title and search box above the grid
const HEADER_HEIGHT: f32 = 160.0;

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// The window was resized
    WindowResized(Size),
    /// The resize cooldown window closed
    LayoutCooldownElapsed(TimerToken),
    /// The user edited the search box
    SearchChanged(String),
    /// The search debounce elapsed
    SearchDebounceElapsed(TimerToken),
    /// A list fetch finished
    PageLoaded(PageRequest, Result<PhotoPage, GalleryError>),
    /// The grid was scrolled
    Scrolled(scrollable::Viewport),
    /// An image download finished
    ImageFetched(ImageRequest, Result<Bytes, GalleryError>),
    /// The user clicked a tile, or a photo was requested at startup
    OpenPhoto(PhotoId),
    /// The by-id photo fetch of the detail view finished
    PhotoLoaded(PhotoId, Result<Photo, GalleryError>),
    /// The user left the detail view
    BackToGrid,
}

/// Main application state
struct Gallery {
    client: ApiClient,
    /// Cache and pagination, shared by every view
    session: Session,
    grid: MasonryGrid,
    /// Open detail view, if any
    detail: Option<PhotoDetail>,
    textures: Textures,
    /// Image downloads in flight; one download serves every loader
    /// waiting on the same photo variant
    downloads: HashSet<(PhotoId, Variant)>,
    /// Last known scroll offset of the grid, restored after the detail view
    scroll_offset: f32,
    /// Pending timers; replacing or dropping a handle aborts its task
    search_timer: Option<iced::task::Handle>,
    cooldown_timer: Option<iced::task::Handle>,
}

fn grid_id() -> scrollable::Id {
    scrollable::Id::new("masonry-grid")
}

impl Gallery {
    /// Create a new instance of the application
    fn new(config: Config) -> (Self, Task<Message>) {
        let client = ApiClient::new(&config);
        let mut session = Session::new(&config);
        let window = Size::new(config.window_width, config.window_height);
        let mut grid = MasonryGrid::new(window.width, grid_height(window));

        let first_page = session.pagination.start();
        let effects = grid.sync(&mut session);

        tracing::info!(
            columns = grid.metrics().column_count,
            api = %config.api_base,
            "gallery initialized"
        );

        let mut gallery = Gallery {
            client,
            session,
            grid,
            detail: None,
            textures: Textures::new(),
            downloads: HashSet::new(),
            scroll_offset: 0.0,
            search_timer: None,
            cooldown_timer: None,
        };
        let mut tasks = vec![gallery.fetch_page(first_page), gallery.grid_tasks(effects)];
        if let Some(id) = config.open_photo {
            tasks.push(gallery.update(Message::OpenPhoto(id)));
        }
        (gallery, Task::batch(tasks))
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let task = self.handle(message);
        self.sync_textures();
        task
    }

    fn handle(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::WindowResized(size) => {
                let (cooldown, effects) =
                    self.grid
                        .on_resize(size.width, grid_height(size), &mut self.session);

                let mut tasks = vec![self.grid_tasks(effects)];
                if let Some(token) = cooldown {
                    let (timer, handle) = schedule(token, Message::LayoutCooldownElapsed);
                    self.cooldown_timer = Some(handle.abort_on_drop());
                    tasks.push(timer);
                }
                Task::batch(tasks)
            }
            Message::LayoutCooldownElapsed(token) => {
                self.cooldown_timer = None;
                let effects = self.grid.on_cooldown_elapsed(token, &mut self.session);
                self.grid_tasks(effects)
            }
            Message::SearchChanged(term) => {
                let token = self.session.pagination.set_search(term);
                let (timer, handle) = schedule(token, Message::SearchDebounceElapsed);
                // Dropping the previous handle aborts the previous timer
                self.search_timer = Some(handle.abort_on_drop());
                timer
            }
            Message::SearchDebounceElapsed(token) => {
                let Some(request) = self.session.pagination.search_timer_elapsed(token) else {
                    return Task::none();
                };
                self.search_timer = None;
                let effects = self.grid.sync(&mut self.session);
                Task::batch([self.fetch_page(request), self.grid_tasks(effects)])
            }
            Message::PageLoaded(request, result) => {
                if !self.session.pagination.page_loaded(&request, result) {
                    return Task::none();
                }
                let effects = self.grid.sync(&mut self.session);
                self.grid_tasks(effects)
            }
            Message::Scrolled(viewport) => {
                let offset = viewport.absolute_offset().y;
                let bounds = viewport.bounds();
                self.scroll_offset = offset;
                let effects =
                    self.grid
                        .on_scroll(offset, bounds.width, bounds.height, &mut self.session);
                self.grid_tasks(effects)
            }
            Message::ImageFetched(request, result) => {
                self.downloads.remove(&(request.photo_id, request.variant));
                let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);

                // The grid writes the cache, the detail view follows it
                self.grid.on_image_fetched(&request, result, &mut self.session);
                if let Some(detail) = self.detail.as_mut().filter(|d| d.id() == request.photo_id) {
                    detail.on_settled(&request, outcome, &self.session.cache);
                }
                Task::none()
            }
            Message::OpenPhoto(id) => {
                let known = self
                    .session
                    .pagination
                    .photos()
                    .iter()
                    .find(|photo| photo.id == id && !photo.is_skeleton);
                let (detail, requests) = PhotoDetail::open(id, known, &self.session.cache);
                self.detail = Some(detail);
                if known.is_none() {
                    tracing::info!(photo = %id, "photo not in the grid, fetching by id");
                }

                let mut tasks: Vec<Task<Message>> = requests
                    .images
                    .into_iter()
                    .map(|request| self.fetch_image(request))
                    .collect();
                if let Some(id) = requests.photo {
                    tasks.push(self.fetch_photo(id));
                }
                Task::batch(tasks)
            }
            Message::PhotoLoaded(id, result) => {
                let Some(detail) = self.detail.as_mut().filter(|detail| detail.id() == id) else {
                    return Task::none();
                };
                let images = detail.photo_loaded(result, &self.session.cache);
                let tasks: Vec<Task<Message>> = images
                    .into_iter()
                    .map(|request| self.fetch_image(request))
                    .collect();
                Task::batch(tasks)
            }
            Message::BackToGrid => {
                self.detail = None;
                scrollable::scroll_to(
                    grid_id(),
                    scrollable::AbsoluteOffset {
                        x: 0.0,
                        y: self.scroll_offset,
                    },
                )
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        if let Some(detail) = &self.detail {
            return ui::detail::view(detail, &self.textures);
        }

        let header = column![
            text("Masonry Grid").size(50),
            text_input("Search photos...", &self.session.pagination.state().search)
                .on_input(Message::SearchChanged)
                .padding(10)
                .width(Length::Fixed(400.0)),
        ]
        .spacing(20)
        .padding(20)
        .align_x(Alignment::Center);

        let body: Element<Message> = match &self.session.pagination.state().error {
            Some(error) => container(text(error.as_str()).size(18))
                .padding(32)
                .into(),
            None => scrollable(ui::grid::view(&self.grid, &self.session, &self.textures))
                .id(grid_id())
                .on_scroll(Message::Scrolled)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
        };

        container(column![header, body])
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::window::resize_events().map(|(_id, size)| Message::WindowResized(size))
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }

    // ---- fetch tasks ----

    /// Give every displayed blob a texture and drop the rest
    fn sync_textures(&mut self) {
        let detail_blob = self
            .detail
            .as_ref()
            .and_then(PhotoDetail::image)
            .and_then(|view| view.src);
        self.textures
            .sync(self.grid.displayed_blobs().chain(detail_blob.as_ref()));
    }

    fn grid_tasks(&mut self, effects: GridEffects) -> Task<Message> {
        let mut tasks: Vec<Task<Message>> = effects
            .images
            .into_iter()
            .map(|request| self.fetch_image(request))
            .collect();
        if let Some(request) = effects.next_page {
            tasks.push(self.fetch_page(request));
        }
        Task::batch(tasks)
    }

    fn fetch_page(&self, request: PageRequest) -> Task<Message> {
        let client = self.client.clone();
        Task::perform(
            async move {
                let result = client.fetch_page(&request).await;
                (request, result)
            },
            |(request, result)| Message::PageLoaded(request, result),
        )
    }

    fn fetch_photo(&self, id: PhotoId) -> Task<Message> {
        let client = self.client.clone();
        Task::perform(
            async move { client.fetch_photo(id).await },
            move |result| Message::PhotoLoaded(id, result),
        )
    }

    /// Start a download unless the same one is already running
    fn fetch_image(&mut self, request: ImageRequest) -> Task<Message> {
        if !self.downloads.insert((request.photo_id, request.variant)) {
            tracing::trace!(photo = %request.photo_id, variant = ?request.variant, "download already in flight");
            return Task::none();
        }
        let client = self.client.clone();
        Task::perform(
            async move {
                let result = client.fetch_image(&request.url).await;
                (request, result)
            },
            |(request, result)| Message::ImageFetched(request, result),
        )
    }
}

impl Drop for Gallery {
    fn drop(&mut self) {
        self.grid.teardown();
        self.textures.clear();
        self.session.teardown();
    }
}

/// Height of the grid viewport for a window size
fn grid_height(window: Size) -> f32 {
    (window.height - HEADER_HEIGHT).max(0.0)
}

/// Sleep for the token's delay, then report it. The returned handle
/// aborts the sleep.
fn schedule(
    token: TimerToken,
    on_elapsed: fn(TimerToken) -> Message,
) -> (Task<Message>, iced::task::Handle) {
    Task::perform(tokio::time::sleep(token.delay()), move |_| on_elapsed(token)).abortable()
}

fn main() -> iced::Result {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "masonry_gallery=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // The gallery cannot work without an API key, so configuration
    // errors stop it before a window opens
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let window_size = Size::new(config.window_width, config.window_height);

    iced::application("Masonry Grid", Gallery::update, Gallery::view)
        .subscription(Gallery::subscription)
        .theme(Gallery::theme)
        .window_size(window_size)
        .centered()
        .run_with(move || Gallery::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ViewState;
    use crate::state::data::PhotoSources;
    use crate::state::pagination::PageQuery;

    fn gallery(open_photo: Option<&str>) -> Gallery {
        let config = Config::from_lookup(|key| match key {
            "PEXELS_API_KEY" => Some("key".to_string()),
            "GALLERY_OPEN_PHOTO" => open_photo.map(str::to_string),
            _ => None,
        })
        .unwrap();
        Gallery::new(config).0
    }

    fn photo(id: u64) -> Photo {
        Photo {
            id: PhotoId(id),
            alt: format!("Photo {id}"),
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

    fn image(id: u64, variant: Variant) -> ImageRequest {
        ImageRequest {
            photo_id: PhotoId(id),
            variant,
            url: String::new(),
        }
    }

    /// Gallery showing one row of four photos
    fn loaded() -> Gallery {
        let mut gallery = gallery(None);
        let _ = gallery.update(Message::PageLoaded(
            PageRequest {
                token: 1,
                query: PageQuery::Curated,
                per_page: 80,
            },
            Ok(PhotoPage {
                photos: (1..=4).map(photo).collect(),
                next_page: None,
            }),
        ));
        gallery
    }

    #[test]
    fn test_startup_photo_is_fetched_by_id() {
        let mut gallery = gallery(Some("9"));
        let detail = gallery.detail.as_ref().unwrap();
        assert_eq!(detail.id(), PhotoId(9));
        assert!(detail.photo().is_none());

        let _ = gallery.update(Message::PhotoLoaded(PhotoId(9), Ok(photo(9))));
        assert_eq!(gallery.detail.as_ref().unwrap().photo().unwrap().alt, "Photo 9");
        assert!(gallery.downloads.contains(&(PhotoId(9), Variant::Medium)));
        assert!(gallery.downloads.contains(&(PhotoId(9), Variant::Original)));
    }

    #[test]
    fn test_startup_photo_failure_is_shown() {
        let mut gallery = gallery(Some("9"));
        let _ = gallery.update(Message::PhotoLoaded(
            PhotoId(9),
            Err(GalleryError::Api {
                operation: "fetch the photo".to_string(),
                status: 404,
            }),
        ));
        let detail = gallery.detail.as_ref().unwrap();
        assert_eq!(detail.error(), Some("Failed to fetch photo with ID 9"));
    }

    #[test]
    fn test_detail_reuses_grid_downloads() {
        let mut gallery = loaded();
        assert_eq!(gallery.downloads.len(), 8);

        // The grid's downloads for photo 2 are still running
        let _ = gallery.update(Message::OpenPhoto(PhotoId(2)));
        assert_eq!(gallery.downloads.len(), 8);

        let _ = gallery.update(Message::ImageFetched(
            image(2, Variant::Original),
            Ok(Bytes::from_static(&[7])),
        ));
        assert_eq!(gallery.downloads.len(), 7);
        assert_eq!(
            gallery.detail.as_ref().unwrap().image().unwrap().state,
            ViewState::Displayed
        );
        assert_eq!(gallery.session.cache.len(), 1);
        // Grid tile and detail view draw the same texture
        assert_eq!(gallery.textures.len(), 1);
    }

    #[test]
    fn test_medium_shown_by_grid_stays_drawable() {
        let mut gallery = loaded();
        let _ = gallery.update(Message::ImageFetched(
            image(1, Variant::Medium),
            Ok(Bytes::from_static(&[1])),
        ));
        let medium = gallery.session.cache.get(PhotoId(1)).unwrap().blob.clone();
        assert!(gallery.textures.handle_for(Some(&medium)).is_some());

        // The original fails, so the tile keeps showing the medium
        let _ = gallery.update(Message::ImageFetched(
            image(1, Variant::Original),
            Err(GalleryError::Api {
                operation: "fetch image".to_string(),
                status: 500,
            }),
        ));
        assert!(gallery.textures.handle_for(Some(&medium)).is_some());
    }

    #[test]
    fn test_back_to_grid_closes_detail() {
        let mut gallery = loaded();
        let _ = gallery.update(Message::OpenPhoto(PhotoId(3)));
        assert!(gallery.detail.is_some());
        let _ = gallery.update(Message::BackToGrid);
        assert!(gallery.detail.is_none());
    }
}
