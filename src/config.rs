//! Runtime configuration
//!
//! Settings are read from the process environment after `.env` has been
//! loaded by `dotenvy`. The API key is the only required value.

use crate::error::{GalleryError, Result};
use crate::state::data::PhotoId;

/// Default Pexels-compatible API root
pub const DEFAULT_API_BASE: &str = "https://api.pexels.com/v1";

/// Photos requested per page (also the skeleton placeholder count)
pub const DEFAULT_PAGE_SIZE: usize = 80;

/// Largest page size the API accepts
const MAX_PAGE_SIZE: usize = 80;

/// Gallery configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Static authorization header value sent with every API request
    pub api_key: String,
    /// API root, without trailing slash
    pub api_base: String,
    /// Photos per page
    pub page_size: usize,
    /// Initial window size in logical pixels
    pub window_width: f32,
    pub window_height: f32,
    /// Photo to open in the detail view at startup
    pub open_photo: Option<PhotoId>,
}

impl Config {
    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("PEXELS_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| GalleryError::Config("PEXELS_API_KEY must be set".to_string()))?;

        let api_base = lookup("GALLERY_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let page_size = match lookup("GALLERY_PAGE_SIZE") {
            Some(raw) => {
                let size: usize = raw.trim().parse().map_err(|_| {
                    GalleryError::Config(format!("GALLERY_PAGE_SIZE must be a number, got {raw:?}"))
                })?;
                if size == 0 || size > MAX_PAGE_SIZE {
                    return Err(GalleryError::Config(format!(
                        "GALLERY_PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}, got {size}"
                    )));
                }
                size
            }
            None => DEFAULT_PAGE_SIZE,
        };

        let window_width = parse_dimension(&lookup, "GALLERY_WINDOW_WIDTH", 1280.0)?;
        let window_height = parse_dimension(&lookup, "GALLERY_WINDOW_HEIGHT", 860.0)?;

        let open_photo = match lookup("GALLERY_OPEN_PHOTO") {
            Some(raw) => Some(PhotoId(raw.trim().parse().map_err(|_| {
                GalleryError::Config(format!("GALLERY_OPEN_PHOTO must be a photo id, got {raw:?}"))
            })?)),
            None => None,
        };

        Ok(Config {
            api_key,
            api_base,
            page_size,
            window_width,
            window_height,
            open_photo,
        })
    }
}

fn parse_dimension<F>(lookup: &F, key: &str, default: f32) -> Result<f32>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<f32>() {
            Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
            _ => Err(GalleryError::Config(format!(
                "{key} must be a positive number, got {raw:?}"
            ))),
        },
        None => Ok(default),
    }
}
