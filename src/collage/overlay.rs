use image::{imageops, Rgba, RgbaImage};
use rusttype::{point, Font, Scale};
use std::path::Path;
use std::sync::Arc;

use super::layout::{CANVAS_HEIGHT, CANVAS_WIDTH};
use super::FontError;

/// Vertical darkening wash: (position, opacity) stops from top to bottom
const GRADIENT_STOPS: [(f32, f32); 4] = [(0.0, 0.2), (0.4, 0.1), (0.6, 0.1), (1.0, 0.4)];

const HOST_FONT_PX: f32 = 64.0;
const TITLE_FONT_PX: f32 = 112.0;
const HOST_OFFSET_Y: f32 = -80.0;
const TITLE_OFFSET_Y: f32 = 20.0;

const SHADOW_COLOR: Rgba<u8> = Rgba([0, 0, 0, 204]);
const SHADOW_SIGMA: f32 = 7.5;
const SHADOW_OFFSET_Y: i64 = 5;
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

const URL_FONT_PX: f32 = 24.0;
const URL_MARGIN: f32 = 40.0;
const URL_PADDING: f32 = 12.0;
const URL_BOX_HEIGHT: f32 = 30.0;
const URL_CHIP_RADIUS: f32 = 8.0;
const URL_COLOR: Rgba<u8> = Rgba([255, 255, 255, 230]);
const URL_CHIP_COLOR: Rgba<u8> = Rgba([0, 0, 0, 153]);

const BUNDLED_REGULAR: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const BUNDLED_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Regular and bold fonts used for all collage text
#[derive(Clone)]
pub struct Typeface {
    regular: Arc<Font<'static>>,
    bold: Arc<Font<'static>>,
}

impl Typeface {
    /// DejaVu Sans regular and bold compiled into the binary
    pub fn bundled() -> Result<Self, FontError> {
        let regular = Font::try_from_bytes(BUNDLED_REGULAR).ok_or(FontError::Invalid("regular"))?;
        let bold = Font::try_from_bytes(BUNDLED_BOLD).ok_or(FontError::Invalid("bold"))?;

        Ok(Typeface {
            regular: Arc::new(regular),
            bold: Arc::new(bold),
        })
    }

    /// Bundled fonts with either weight replaced by a TTF on disk
    pub fn with_overrides(regular: Option<&Path>, bold: Option<&Path>) -> Result<Self, FontError> {
        let mut typeface = Self::bundled()?;

        if let Some(path) = regular {
            typeface.regular = Arc::new(load_font(path, "regular")?);
        }
        if let Some(path) = bold {
            typeface.bold = Arc::new(load_font(path, "bold")?);
        }

        Ok(typeface)
    }

    pub fn font(&self, bold: bool) -> &Font<'static> {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }
}

fn load_font(path: &Path, weight: &'static str) -> Result<Font<'static>, FontError> {
    let bytes = std::fs::read(path)?;
    Font::try_from_vec(bytes).ok_or(FontError::Invalid(weight))
}

/// One centered line of the title block
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub px: f32,
    pub center_y: f32,
    pub bold: bool,
}

/// Lines of the centered title block. The host line is dropped when the
/// label is empty; the title line keeps its anchor either way.
pub fn title_lines(host_label: &str, year: i32) -> Vec<TextLine> {
    let center_y = CANVAS_HEIGHT as f32 / 2.0;
    let mut lines = Vec::with_capacity(2);

    if !host_label.is_empty() {
        lines.push(TextLine {
            text: format!("{}'s", host_label),
            px: HOST_FONT_PX,
            center_y: center_y + HOST_OFFSET_Y,
            bold: true,
        });
    }

    lines.push(TextLine {
        text: format!("{} WRAPPED", year),
        px: TITLE_FONT_PX,
        center_y: center_y + TITLE_OFFSET_Y,
        bold: true,
    });

    lines
}

/// Background rectangle behind the share URL
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChipRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Chip sized to a URL of `text_width` pixels, anchored bottom-right
pub fn url_chip_rect(text_width: f32) -> ChipRect {
    let right = CANVAS_WIDTH as f32 - URL_MARGIN;
    let baseline = CANVAS_HEIGHT as f32 - URL_MARGIN;

    ChipRect {
        x: right - text_width - URL_PADDING,
        y: baseline - URL_BOX_HEIGHT,
        width: text_width + URL_PADDING * 2.0,
        height: URL_BOX_HEIGHT + URL_PADDING,
    }
}

/// Opacity of the darkening wash at relative height `t` in [0, 1]
pub fn gradient_alpha(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);

    for pair in GRADIENT_STOPS.windows(2) {
        let (t0, a0) = pair[0];
        let (t1, a1) = pair[1];
        if t <= t1 {
            let span = t1 - t0;
            if span <= f32::EPSILON {
                return a1;
            }
            return a0 + (a1 - a0) * (t - t0) / span;
        }
    }

    GRADIENT_STOPS[GRADIENT_STOPS.len() - 1].1
}

/// Darken the canvas with the vertical gradient wash
pub fn apply_gradient(canvas: &mut RgbaImage) {
    let height = canvas.height() as f32;

    for (_, y, pixel) in canvas.enumerate_pixels_mut() {
        let alpha = gradient_alpha((y as f32 + 0.5) / height);
        blend_pixel(pixel, Rgba([0, 0, 0, 255]), alpha);
    }
}

/// Draw the title block and the URL chip
pub fn draw_overlay(
    canvas: &mut RgbaImage,
    typeface: &Typeface,
    host_label: &str,
    year: i32,
    share_url: &str,
) {
    let center_x = CANVAS_WIDTH as f32 / 2.0;
    let lines = title_lines(host_label, year);

    for line in &lines {
        let font = typeface.font(line.bold);
        draw_shadowed_text(canvas, font, line.px, center_x, line.center_y, &line.text);
    }

    if !share_url.is_empty() {
        draw_url_chip(canvas, typeface.font(false), share_url);
    }
}

fn draw_url_chip(canvas: &mut RgbaImage, font: &Font<'static>, url: &str) {
    let width = text_width(font, URL_FONT_PX, url);
    let chip = url_chip_rect(width);
    fill_rounded_rect(canvas, chip, URL_CHIP_RADIUS, URL_CHIP_COLOR);

    let scale = Scale::uniform(URL_FONT_PX);
    let v_metrics = font.v_metrics(scale);
    let right = CANVAS_WIDTH as f32 - URL_MARGIN;
    // Bottom of the em box sits on the anchor line
    let baseline = CANVAS_HEIGHT as f32 - URL_MARGIN + v_metrics.descent;

    draw_text(canvas, font, URL_FONT_PX, right - width, baseline, URL_COLOR, url);
}

/// Render centered text with a soft drop shadow beneath it
fn draw_shadowed_text(
    canvas: &mut RgbaImage,
    font: &Font<'static>,
    px: f32,
    center_x: f32,
    center_y: f32,
    text: &str,
) {
    let width = text_width(font, px, text);
    let v_metrics = font.v_metrics(Scale::uniform(px));
    let left = center_x - width / 2.0;
    let baseline = center_y + (v_metrics.ascent + v_metrics.descent) / 2.0;

    // Shadow is rendered into a padded layer, blurred, then composited
    let margin = (SHADOW_SIGMA * 3.0).ceil();
    let layer_x = (left - margin).floor();
    let layer_y = (baseline - v_metrics.ascent - margin).floor();
    let layer_w = (width + margin * 2.0).ceil().max(1.0) as u32;
    let layer_h = (v_metrics.ascent - v_metrics.descent + margin * 2.0).ceil().max(1.0) as u32;

    let mut layer = RgbaImage::new(layer_w, layer_h);
    draw_text(
        &mut layer,
        font,
        px,
        left - layer_x,
        baseline - layer_y,
        SHADOW_COLOR,
        text,
    );
    let shadow = imageops::blur(&layer, SHADOW_SIGMA);
    imageops::overlay(
        canvas,
        &shadow,
        layer_x as i64,
        layer_y as i64 + SHADOW_OFFSET_Y,
    );

    draw_text(canvas, font, px, left, baseline, TEXT_COLOR, text);
}

/// Horizontal advance of `text` at `px`
pub fn text_width(font: &Font<'static>, px: f32, text: &str) -> f32 {
    let scale = Scale::uniform(px);
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Rasterize `text` with its left edge at `x` and baseline at `baseline`
pub fn draw_text(
    img: &mut RgbaImage,
    font: &Font<'static>,
    px: f32,
    x: f32,
    baseline: f32,
    color: Rgba<u8>,
    text: &str,
) {
    let scale = Scale::uniform(px);
    let (width, height) = img.dimensions();

    for glyph in font.layout(text, scale, point(x, baseline)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };

        glyph.draw(|gx, gy, coverage| {
            let px = gx as i32 + bb.min.x;
            let py = gy as i32 + bb.min.y;
            if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                return;
            }
            blend_pixel(img.get_pixel_mut(px as u32, py as u32), color, coverage);
        });
    }
}

/// Fill `rect` with `color`, rounding its corners by `radius`
pub fn fill_rounded_rect(img: &mut RgbaImage, rect: ChipRect, radius: f32, color: Rgba<u8>) {
    let radius = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    let x0 = rect.x.floor().max(0.0) as u32;
    let y0 = rect.y.floor().max(0.0) as u32;
    let x1 = ((rect.x + rect.width).ceil() as u32).min(img.width());
    let y1 = ((rect.y + rect.height).ceil() as u32).min(img.height());

    for py in y0..y1 {
        for px in x0..x1 {
            let cx = px as f32 + 0.5;
            let cy = py as f32 + 0.5;

            // Distance outside the rect once shrunk by the corner radius
            let dx = (rect.x + radius - cx).max(cx - (rect.x + rect.width - radius)).max(0.0);
            let dy = (rect.y + radius - cy).max(cy - (rect.y + rect.height - radius)).max(0.0);
            let dist = (dx * dx + dy * dy).sqrt();
            let coverage = (radius - dist + 0.5).clamp(0.0, 1.0);

            // Pixels cut by the straight edges
            let edge_x = (cx - rect.x + 0.5).min(rect.x + rect.width - cx + 0.5).clamp(0.0, 1.0);
            let edge_y = (cy - rect.y + 0.5).min(rect.y + rect.height - cy + 0.5).clamp(0.0, 1.0);

            let coverage = coverage.min(edge_x).min(edge_y);
            if coverage > 0.0 {
                blend_pixel(img.get_pixel_mut(px, py), color, coverage);
            }
        }
    }
}

/// Source-over blend of `color` scaled by `coverage` onto `dst`
pub fn blend_pixel(dst: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    let sa = color.0[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }

    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }

    for i in 0..3 {
        let sc = color.0[i] as f32;
        let dc = dst.0[i] as f32;
        dst.0[i] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
