//! Shared data structures for the gallery
//!
//! These structs represent the data model that flows between
//! the photo API and the UI layer.

use serde::{Deserialize, Serialize};

/// Width of a skeleton placeholder photo
const SKELETON_WIDTH: u32 = 200;
/// Height of a skeleton placeholder photo
const SKELETON_HEIGHT: u32 = 300;

/// Unique photo identifier (unique within a session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub u64);

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pre-rendered size variants served by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoSources {
    /// Low-resolution variant, loaded first
    #[serde(default)]
    pub medium: String,
    /// Full-resolution variant, loaded second
    #[serde(default)]
    pub original: String,
}

/// Represents a single photo returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    /// Alternative text (may be empty)
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub photographer: String,
    #[serde(default)]
    pub photographer_url: String,
    /// Intrinsic pixel width
    pub width: u32,
    /// Intrinsic pixel height
    pub height: u32,
    #[serde(default)]
    pub src: PhotoSources,
    /// Placeholder row awaiting real data
    #[serde(default, rename = "isSkeleton", skip_serializing_if = "std::ops::Not::not")]
    pub is_skeleton: bool,
}

impl Photo {
    /// Build a local placeholder with the given id
    pub fn skeleton(id: u64) -> Self {
        Photo {
            id: PhotoId(id),
            alt: String::new(),
            photographer: String::new(),
            photographer_url: String::new(),
            width: SKELETON_WIDTH,
            height: SKELETON_HEIGHT,
            src: PhotoSources::default(),
            is_skeleton: true,
        }
    }

    /// Height / width, used to size tiles before pixels arrive
    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 {
            1.0
        } else {
            self.height as f32 / self.width as f32
        }
    }

    /// True if the photo can be fetched progressively
    pub fn has_source(&self) -> bool {
        !self.src.medium.is_empty()
    }

    /// Label used by the rendering surface
    pub fn label(&self) -> String {
        if self.alt.is_empty() {
            format!("Photo #{}", self.id)
        } else {
            self.alt.clone()
        }
    }
}

/// Generate the placeholder set shown while a page is being fetched
pub fn skeleton_photos(count: usize) -> Vec<Photo> {
    (0..count as u64).map(Photo::skeleton).collect()
}

/// One page of results from the curated or search endpoints
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PhotoPage {
    #[serde(default)]
    pub photos: Vec<Photo>,
    /// Opaque cursor for the next page (absent on the last page)
    #[serde(default)]
    pub next_page: Option<String>,
}
