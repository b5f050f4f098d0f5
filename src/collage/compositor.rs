use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use log::{debug, info};
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::layout::{cover_crop, select_memories, GridPlan, CANVAS_HEIGHT, CANVAS_WIDTH};
use super::loader::{self, ImageFetcher, LoadedImage, FETCH_TIMEOUT};
use super::overlay::{self, Typeface};
use super::{CollageRequest, CollageResult, CompositionError, CompositionResult, MemoryRef};

/// Canvas color under the photo grid
const PHOTO_BASE: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Solid slate base of the text-only collage
const EMPTY_BASE: Rgba<u8> = Rgba([0x0f, 0x17, 0x2a, 255]);

/// Renders memories into a 1080x1920 PNG collage
#[derive(Clone)]
pub struct Compositor {
    fetcher: Arc<dyn ImageFetcher>,
    typeface: Typeface,
    default_year: i32,
    fetch_timeout: Duration,
}

impl Compositor {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, typeface: Typeface, default_year: i32) -> Self {
        Compositor {
            fetcher,
            typeface,
            default_year,
            fetch_timeout: FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn default_year(&self) -> i32 {
        self.default_year
    }

    /// Compose a collage labelled with the configured program year
    pub async fn compose(
        &self,
        memories: &[MemoryRef],
        host_label: &str,
        share_url: &str,
    ) -> CompositionResult<CollageResult> {
        self.compose_for_year(memories, host_label, share_url, self.default_year)
            .await
    }

    pub async fn compose_request(
        &self,
        request: &CollageRequest,
    ) -> CompositionResult<CollageResult> {
        let year = request.year.unwrap_or(self.default_year);
        self.compose_for_year(&request.memories, &request.host_label, &request.share_url, year)
            .await
    }

    pub async fn compose_for_year(
        &self,
        memories: &[MemoryRef],
        host_label: &str,
        share_url: &str,
        year: i32,
    ) -> CompositionResult<CollageResult> {
        let started = Instant::now();
        let selected = select_memories(memories);
        let grid = GridPlan::for_count(selected.len());

        info!(
            "Composing collage: {} of {} memories, grid {:?}",
            selected.len(),
            memories.len(),
            grid.map(|g| (g.columns, g.rows))
        );

        let images = match grid {
            Some(_) => {
                let sources = selected.into_iter().map(|m| m.photo_url).collect();
                loader::load_all(
                    self.fetcher.clone(),
                    sources,
                    self.fetch_timeout,
                    self.typeface.clone(),
                )
                .await
            }
            None => Vec::new(),
        };

        let photo_count = images.len();
        let placeholder_count = images.iter().filter(|img| img.placeholder).count();
        let typeface = self.typeface.clone();
        let host_label = host_label.to_string();
        let share_url = share_url.to_string();

        // Pixel work and PNG encoding are CPU bound
        let png = tokio::task::spawn_blocking(move || {
            render(grid, &images, &typeface, &host_label, year, &share_url)
        })
        .await
        .map_err(|e| CompositionError::Aborted(e.to_string()))??;

        debug!(
            "Collage composed in {:?} ({} bytes, {} placeholders)",
            started.elapsed(),
            png.len(),
            placeholder_count
        );

        Ok(CollageResult {
            png,
            grid,
            photo_count,
            placeholder_count,
        })
    }
}

fn render(
    grid: Option<GridPlan>,
    images: &[LoadedImage],
    typeface: &Typeface,
    host_label: &str,
    year: i32,
    share_url: &str,
) -> CompositionResult<Vec<u8>> {
    let base = if grid.is_some() { PHOTO_BASE } else { EMPTY_BASE };
    let mut canvas = acquire_surface(CANVAS_WIDTH, CANVAS_HEIGHT, base)?;

    if let Some(grid) = grid {
        for (index, image) in images.iter().enumerate() {
            draw_cell(&mut canvas, &grid, index, &image.bitmap);
        }
        overlay::apply_gradient(&mut canvas);
    }

    overlay::draw_overlay(&mut canvas, typeface, host_label, year, share_url);

    encode_png(canvas)
}

/// Allocate the canvas buffer, reporting allocation failure instead of aborting
fn acquire_surface(width: u32, height: u32, base: Rgba<u8>) -> CompositionResult<RgbaImage> {
    let pixels = width as usize * height as usize;
    let mut buffer: Vec<u8> = Vec::new();
    buffer
        .try_reserve_exact(pixels * 4)
        .map_err(|_| CompositionError::Surface(width, height))?;

    for _ in 0..pixels {
        buffer.extend_from_slice(&base.0);
    }

    RgbaImage::from_raw(width, height, buffer).ok_or(CompositionError::Surface(width, height))
}

/// Cover-crop `bitmap` to the cell's aspect ratio and paint it into the cell
fn draw_cell(canvas: &mut RgbaImage, grid: &GridPlan, index: usize, bitmap: &RgbaImage) {
    let (x0, y0, x1, y1) = grid.cell_rect(index).pixel_bounds();
    let cell_width = x1.saturating_sub(x0);
    let cell_height = y1.saturating_sub(y0);
    if cell_width == 0 || cell_height == 0 {
        return;
    }

    let crop = cover_crop(bitmap.width(), bitmap.height(), grid.cell_aspect());
    let crop_x = (crop.x.round() as u32).min(bitmap.width() - 1);
    let crop_y = (crop.y.round() as u32).min(bitmap.height() - 1);
    let crop_w = (crop.width.round() as u32).clamp(1, bitmap.width() - crop_x);
    let crop_h = (crop.height.round() as u32).clamp(1, bitmap.height() - crop_y);

    let cropped = imageops::crop_imm(bitmap, crop_x, crop_y, crop_w, crop_h).to_image();
    let scaled = imageops::resize(&cropped, cell_width, cell_height, FilterType::Lanczos3);

    imageops::replace(canvas, &scaled, x0 as i64, y0 as i64);
}

fn encode_png(canvas: RgbaImage) -> CompositionResult<Vec<u8>> {
    let mut png = Vec::new();
    DynamicImage::ImageRgba8(canvas).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}
