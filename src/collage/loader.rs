use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use super::overlay::{self, Typeface};
use super::FetchError;

/// Per-image fetch budget before falling back to the placeholder
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on a single downloaded photo
const MAX_IMAGE_BYTES: u64 = 32 * 1024 * 1024;

const PLACEHOLDER_SIZE: u32 = 200;
const PLACEHOLDER_FILL: Rgba<u8> = Rgba([0x37, 0x41, 0x51, 255]);
const PLACEHOLDER_TEXT: Rgba<u8> = Rgba([0x9c, 0xa3, 0xaf, 255]);
const PLACEHOLDER_FONT_PX: f32 = 20.0;

/// Source of raw (still encoded) image bytes
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches `http(s)://` sources over the network and everything else from disk
#[derive(Clone)]
pub struct DefaultFetcher {
    agent: ureq::Agent,
}

impl DefaultFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        DefaultFetcher { agent }
    }
}

impl Default for DefaultFetcher {
    fn default() -> Self {
        Self::new(FETCH_TIMEOUT)
    }
}

#[async_trait]
impl ImageFetcher for DefaultFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let agent = self.agent.clone();
            let url = source.to_string();

            // ureq is blocking, keep it off the async workers
            return tokio::task::spawn_blocking(move || -> Result<Vec<u8>, FetchError> {
                let mut response = agent.get(&url).call()?;
                let bytes = response
                    .body_mut()
                    .with_config()
                    .limit(MAX_IMAGE_BYTES)
                    .read_to_vec()?;
                Ok(bytes)
            })
            .await
            .map_err(|e| FetchError::Task(e.to_string()))?;
        }

        if let Some(path) = source.strip_prefix("file://") {
            return Ok(tokio::fs::read(path).await?);
        }

        if source.contains("://") || source.starts_with("data:") {
            return Err(FetchError::UnsupportedSource(source.to_string()));
        }

        Ok(tokio::fs::read(source).await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels ({0}x{1})")]
    Empty(u32, u32),
    #[error("decode task failed: {0}")]
    Task(String),
}

/// Decoded bitmap ready to be drawn into a cell
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub bitmap: RgbaImage,
    pub placeholder: bool,
}

impl LoadedImage {
    /// Gray "Photo" tile substituted for images that could not be loaded
    pub fn placeholder(typeface: &Typeface) -> Self {
        let mut bitmap = RgbaImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, PLACEHOLDER_FILL);

        let font = typeface.font(false);
        let label = "Photo";
        let width = overlay::text_width(font, PLACEHOLDER_FONT_PX, label);
        let v_metrics = font.v_metrics(rusttype::Scale::uniform(PLACEHOLDER_FONT_PX));
        let center = PLACEHOLDER_SIZE as f32 / 2.0;
        let baseline = center + (v_metrics.ascent + v_metrics.descent) / 2.0;

        overlay::draw_text(
            &mut bitmap,
            font,
            PLACEHOLDER_FONT_PX,
            center - width / 2.0,
            baseline,
            PLACEHOLDER_TEXT,
            label,
        );

        LoadedImage {
            bitmap,
            placeholder: true,
        }
    }
}

/// Fetch and decode one image; `timeout` bounds both steps
pub async fn load_image(
    fetcher: &dyn ImageFetcher,
    source: &str,
    timeout: Duration,
) -> Result<RgbaImage, LoadError> {
    let load = async {
        let bytes = fetcher.fetch(source).await?;

        // Decoding full-size photos is CPU bound, keep it off the async workers
        let bitmap = tokio::task::spawn_blocking(move || decode(&bytes))
            .await
            .map_err(|e| LoadError::Task(e.to_string()))??;
        Ok::<RgbaImage, LoadError>(bitmap)
    };

    tokio::time::timeout(timeout, load)
        .await
        .map_err(|_| LoadError::Timeout(timeout))?
}

/// Decode and validate raw bytes into an RGBA bitmap
fn decode(bytes: &[u8]) -> Result<RgbaImage, LoadError> {
    let decoded = image::load_from_memory(bytes)?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(LoadError::Empty(decoded.width(), decoded.height()));
    }

    Ok(decoded.to_rgba8())
}

/// Load one image, substituting the placeholder on any failure
pub async fn load_or_placeholder(
    fetcher: &dyn ImageFetcher,
    index: usize,
    source: &str,
    timeout: Duration,
    typeface: &Typeface,
) -> LoadedImage {
    match load_image(fetcher, source, timeout).await {
        Ok(bitmap) => {
            debug!(
                "Loaded collage image {} ({}x{}) from {}",
                index,
                bitmap.width(),
                bitmap.height(),
                source
            );
            LoadedImage {
                bitmap,
                placeholder: false,
            }
        }
        Err(e) => {
            warn!("Failed to load collage image {} from {}: {}", index, source, e);
            LoadedImage::placeholder(typeface)
        }
    }
}

/// Load every source concurrently; results come back in input order
pub async fn load_all(
    fetcher: Arc<dyn ImageFetcher>,
    sources: Vec<String>,
    timeout: Duration,
    typeface: Typeface,
) -> Vec<LoadedImage> {
    let handles: Vec<_> = sources
        .into_iter()
        .enumerate()
        .map(|(index, source)| {
            let fetcher = fetcher.clone();
            let typeface = typeface.clone();
            tokio::spawn(async move {
                load_or_placeholder(fetcher.as_ref(), index, &source, timeout, &typeface).await
            })
        })
        .collect();

    let mut images = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(image) => images.push(image),
            Err(e) => {
                warn!("Collage image task {} failed: {}", index, e);
                images.push(LoadedImage::placeholder(&typeface));
            }
        }
    }

    images
}
