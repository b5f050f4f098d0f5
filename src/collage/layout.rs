use rand::seq::SliceRandom;

/// Output canvas width (portrait story format)
pub const CANVAS_WIDTH: u32 = 1080;
/// Output canvas height (portrait story format)
pub const CANVAS_HEIGHT: u32 = 1920;
/// Maximum number of memories placed on one collage
pub const MAX_MEMORIES: usize = 24;

/// Grid layout derived from the number of memories being composited
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPlan {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: f32,
    pub cell_height: f32,
}

impl GridPlan {
    /// Calculate the grid for `count` memories. Returns `None` for an empty
    /// collage, which renders the text-only variant.
    pub fn for_count(count: usize) -> Option<Self> {
        let (columns, rows) = match count {
            0 => return None,
            1 => (1, 1),
            2 => (2, 1),
            3..=4 => (2, 2),
            5..=6 => (3, 2),
            7..=9 => (3, 3),
            10..=12 => (3, 4),
            13..=15 => (3, 5),
            16..=18 => (3, 6),
            19..=21 => (3, 7),
            _ => (3, 8),
        };

        Some(GridPlan {
            columns,
            rows,
            cell_width: CANVAS_WIDTH as f32 / columns as f32,
            cell_height: CANVAS_HEIGHT as f32 / rows as f32,
        })
    }

    pub fn capacity(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    pub fn cell_aspect(&self) -> f32 {
        self.cell_width / self.cell_height
    }

    /// Destination rectangle for the memory at flat `index`
    pub fn cell_rect(&self, index: usize) -> CellRect {
        let row = index as u32 / self.columns;
        let col = index as u32 % self.columns;

        CellRect {
            x: col as f32 * self.cell_width,
            y: row as f32 * self.cell_height,
            width: self.cell_width,
            height: self.cell_height,
        }
    }
}

/// Destination cell on the canvas, in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CellRect {
    /// Integer pixel bounds `(x0, y0, x1, y1)`; adjacent cells share edges
    /// so the grid covers the canvas without gaps.
    pub fn pixel_bounds(&self) -> (u32, u32, u32, u32) {
        let x0 = self.x.round() as u32;
        let y0 = self.y.round() as u32;
        let x1 = ((self.x + self.width).round() as u32).min(CANVAS_WIDTH);
        let y1 = ((self.y + self.height).round() as u32).min(CANVAS_HEIGHT);
        (x0, y0, x1, y1)
    }
}

/// Source region of an image, in source pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Centered crop of a `source_width`x`source_height` image matching
/// `target_aspect` (width / height) so it fills the target without distortion.
pub fn cover_crop(source_width: u32, source_height: u32, target_aspect: f32) -> CropRect {
    let sw = source_width as f32;
    let sh = source_height as f32;
    let source_aspect = sw / sh;

    if source_aspect > target_aspect {
        // Wider than the cell: trim left and right
        let width = sh * target_aspect;
        CropRect {
            x: (sw - width) / 2.0,
            y: 0.0,
            width,
            height: sh,
        }
    } else if source_aspect < target_aspect {
        // Taller than the cell: trim top and bottom
        let height = sw / target_aspect;
        CropRect {
            x: 0.0,
            y: (sh - height) / 2.0,
            width: sw,
            height,
        }
    } else {
        CropRect {
            x: 0.0,
            y: 0.0,
            width: sw,
            height: sh,
        }
    }
}

/// Pick the memories that go onto the collage. Inputs over the cap are
/// shuffled and truncated; smaller inputs keep their order.
pub fn select_memories<T: Clone>(memories: &[T]) -> Vec<T> {
    let mut selected: Vec<T> = memories.to_vec();

    if selected.len() > MAX_MEMORIES {
        selected.shuffle(&mut rand::rng());
        selected.truncate(MAX_MEMORIES);
    }

    selected
}
