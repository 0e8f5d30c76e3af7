//! Fixed-grid glyph atlas
//!
//! One uniform cell per code point. Row 0 holds the widened ASCII range,
//! row `lead - lead_start + 1` / column `trail - trail_start` holds a
//! double-byte pair. Pixels are 32-bit with coverage in the top byte.

use crate::CoverageBitmap;

/// Pixel rectangle of a cell in the atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Normalized texture coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UvPoint {
    pub x: f32,
    pub y: f32,
}

/// The four corners of a cell in texture space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellUv {
    pub top_left: UvPoint,
    pub top_right: UvPoint,
    pub bottom_left: UvPoint,
    pub bottom_right: UvPoint,
}

/// Atlas pixel buffer plus its grid geometry
pub struct AtlasGrid {
    cell_width: u32,
    cell_height: u32,
    rows: u32,
    cols: u32,
    /// Row-major pixels, top row first
    pixels: Vec<u32>,
    background: u32,
    foreground: u32,
}

impl AtlasGrid {
    /// Allocate a `rows x cols` grid filled with `background`.
    ///
    /// Only the RGB part of `foreground` is used.
    pub fn new(
        rows: u32,
        cols: u32,
        cell_width: u32,
        cell_height: u32,
        background: u32,
        foreground: u32,
    ) -> Self {
        let len = rows as usize * cell_height as usize * cols as usize * cell_width as usize;
        Self {
            cell_width,
            cell_height,
            rows,
            cols,
            pixels: vec![background; len],
            background,
            foreground: foreground & 0x00FF_FFFF,
        }
    }

    /// Atlas width in pixels
    pub fn width(&self) -> u32 {
        self.cols * self.cell_width
    }

    /// Atlas height in pixels
    pub fn height(&self) -> u32 {
        self.rows * self.cell_height
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn cell_width(&self) -> u32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> u32 {
        self.cell_height
    }

    pub fn background(&self) -> u32 {
        self.background
    }

    pub fn foreground(&self) -> u32 {
        self.foreground
    }

    pub fn has_cell(&self, row: u32, col: u32) -> bool {
        row < self.rows && col < self.cols
    }

    /// Pixel rectangle of cell `(row, col)`
    pub fn cell_rect(&self, row: u32, col: u32) -> PixelRect {
        PixelRect {
            x: col * self.cell_width,
            y: row * self.cell_height,
            width: self.cell_width,
            height: self.cell_height,
        }
    }

    /// Cell containing pixel `(x, y)`
    pub fn cell_at(&self, x: u32, y: u32) -> (u32, u32) {
        (y / self.cell_height, x / self.cell_width)
    }

    /// Texture coordinates of cell `(row, col)`.
    ///
    /// Edges are derived from integer pixel offsets, so neighbouring cells
    /// share bit-identical edge values.
    pub fn cell_uv(&self, row: u32, col: u32) -> CellUv {
        let left = self.u(col);
        let right = self.u(col + 1);
        let top = self.v(row);
        let bottom = self.v(row + 1);
        CellUv {
            top_left: UvPoint { x: left, y: top },
            top_right: UvPoint { x: right, y: top },
            bottom_left: UvPoint { x: left, y: bottom },
            bottom_right: UvPoint { x: right, y: bottom },
        }
    }

    fn u(&self, col: u32) -> f32 {
        (col as f64 * self.cell_width as f64 / self.width() as f64) as f32
    }

    fn v(&self, row: u32) -> f32 {
        (row as f64 * self.cell_height as f64 / self.height() as f64) as f32
    }

    /// Write a coverage bitmap into the top-left corner of a cell.
    ///
    /// Every bitmap pixel inside the cell becomes
    /// `coverage << 24 | foreground`; whatever extends past the cell edge is
    /// dropped. Returns `true` when the bitmap had to be clipped.
    pub fn compose(&mut self, row: u32, col: u32, bitmap: &CoverageBitmap) -> bool {
        if !self.has_cell(row, col) {
            return bitmap.width > 0 && bitmap.height > 0;
        }
        let rect = self.cell_rect(row, col);
        let w = bitmap.width.min(rect.width);
        let h = bitmap.height.min(rect.height);
        let atlas_width = self.width() as usize;

        for y in 0..h {
            let dst_row = (rect.y + y) as usize * atlas_width;
            for x in 0..w {
                let coverage = bitmap.get(x, y) as u32;
                self.pixels[dst_row + (rect.x + x) as usize] = (coverage << 24) | self.foreground;
            }
        }

        bitmap.width > rect.width || bitmap.height > rect.height
    }

    /// Pixel at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        self.pixels
            .get(y as usize * self.width() as usize + x as usize)
            .copied()
    }

    /// One pixel row, top row is 0
    pub fn row(&self, y: u32) -> &[u32] {
        let width = self.width() as usize;
        let start = y as usize * width;
        &self.pixels[start..start + width]
    }

    /// All pixels, top row first
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Whether every pixel of the cell still holds the background
    pub fn is_cell_blank(&self, row: u32, col: u32) -> bool {
        let rect = self.cell_rect(row, col);
        (rect.y..rect.y + rect.height).all(|y| {
            (rect.x..rect.x + rect.width).all(|x| self.pixel(x, y) == Some(self.background))
        })
    }
}
