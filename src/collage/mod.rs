pub mod compositor;
pub mod layout;
pub mod loader;
pub mod overlay;

use serde::{Deserialize, Serialize};

pub use compositor::Compositor;
pub use layout::{cover_crop, select_memories, GridPlan, CANVAS_HEIGHT, CANVAS_WIDTH, MAX_MEMORIES};
pub use loader::{DefaultFetcher, ImageFetcher, LoadedImage};
pub use overlay::Typeface;

/// Minimal projection of a submission: only the photo location matters here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRef {
    pub photo_url: String,
}

impl MemoryRef {
    pub fn new(photo_url: impl Into<String>) -> Self {
        MemoryRef {
            photo_url: photo_url.into(),
        }
    }
}

/// Everything needed to render one collage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollageRequest {
    #[serde(default)]
    pub memories: Vec<MemoryRef>,
    #[serde(default)]
    pub host_label: String,
    pub share_url: String,
    #[serde(default)]
    pub year: Option<i32>,
}

/// Encoded PNG collage, owned by the caller
#[derive(Debug, Clone)]
pub struct CollageResult {
    pub png: Vec<u8>,
    /// Grid used for the photo cells; `None` for the text-only collage
    pub grid: Option<GridPlan>,
    /// Number of photo slots drawn (after sampling)
    pub photo_count: usize,
    /// Slots that fell back to the placeholder tile
    pub placeholder_count: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    #[error("Could not acquire a {0}x{1} drawing surface")]
    Surface(u32, u32),
    #[error("Failed to encode collage: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Collage rendering aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image source: {0}")]
    UnsupportedSource(String),
    #[error("Fetch task failed: {0}")]
    Task(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid {0} font data")]
    Invalid(&'static str),
}

pub type CompositionResult<T> = Result<T, CompositionError>;
