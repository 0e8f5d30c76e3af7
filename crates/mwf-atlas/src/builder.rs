//! Atlas construction
//!
//! Walks the grid in file order: the ASCII row first, then every
//! `(lead, trail)` pair lead-major. Each cell is mapped, looked up,
//! rasterized and composed independently; a failing cell never stops the
//! build.

use std::borrow::Cow;

use crate::codepage::{CodepointMapper, dbc_to_sbc};
use crate::config::{AtlasConfig, CodeRange, MissingGlyphPolicy};
use crate::fnt::{FontMetadata, GlyphMetadata, RECORD_COUNT};
use crate::grid::AtlasGrid;
use crate::raster::{CoverageBitmap, GlyphSource, RasterError};
use crate::Result;

/// Per-build counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Cells the builder tried to fill
    pub cells_visited: u32,
    /// Cells that received a bitmap
    pub cells_rendered: u32,
    /// Byte sequences with no Unicode mapping
    pub unmapped: u32,
    /// Code points the font has no glyph for
    pub missing_glyph: u32,
    /// Glyphs that failed to rasterize
    pub raster_failed: u32,
    /// Cells rendered with the fallback glyph
    pub fallback_used: u32,
    /// Bitmaps larger than their cell
    pub clipped: u32,
}

/// Result of a build: pixels, metadata and counters
pub struct BuildOutput {
    pub grid: AtlasGrid,
    pub metadata: FontMetadata,
    pub stats: BuildStats,
    pub code_range: CodeRange,
}

impl BuildOutput {
    /// Placement of a double-byte character; `None` outside the code range
    pub fn cell_metadata(&self, lead: u8, trail: u8) -> Option<GlyphMetadata> {
        let (row, col) = self.code_range.cell_of(lead, trail)?;
        Some(GlyphMetadata::for_cell(&self.grid, row, col))
    }
}

/// Bitmap drawn into cells without a glyph
type Fallback = Option<std::result::Result<CoverageBitmap, RasterError>>;

/// Builds the atlas from a charset mapper and a glyph source
pub struct AtlasBuilder<M, G> {
    config: AtlasConfig,
    mapper: M,
    glyphs: G,
}

impl<M: CodepointMapper, G: GlyphSource> AtlasBuilder<M, G> {
    /// Create a builder; the configuration is validated up front
    pub fn new(config: AtlasConfig, mapper: M, glyphs: G) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            mapper,
            glyphs,
        })
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Run the whole build
    pub fn build(&self) -> BuildOutput {
        let range = self.config.code_range;
        let mut grid = AtlasGrid::new(
            range.grid_rows(),
            range.grid_cols(),
            self.config.cell_width,
            self.config.cell_height,
            self.config.background,
            self.config.foreground,
        );
        let mut stats = BuildStats::default();

        tracing::info!(
            "Building {}x{} atlas: {} rows x {} columns, policy {:?}",
            grid.width(),
            grid.height(),
            grid.rows(),
            grid.cols(),
            self.config.missing_glyph
        );

        // One slot per single-byte value regardless of output
        let records: Vec<GlyphMetadata> = (0..RECORD_COUNT as u32)
            .map(|col| {
                if col < grid.cols() {
                    GlyphMetadata::for_cell(&grid, 0, col)
                } else {
                    GlyphMetadata::default()
                }
            })
            .collect();

        let fallback = self.fallback_bitmap();

        let ascii_cols = match self.config.missing_glyph {
            MissingGlyphPolicy::Skip => grid.cols().min(range.lead_start as u32),
            MissingGlyphPolicy::Fill => grid.cols(),
        };
        for col in 0..ascii_cols {
            let pair = u8::try_from(col).ok().and_then(dbc_to_sbc);
            let bytes = pair.as_ref().map(|p| &p[..]);
            self.fill_cell(&mut grid, 0, col, bytes, &fallback, &mut stats);
        }

        for (lead, trail) in range.pairs() {
            let Some((row, col)) = range.cell_of(lead, trail) else {
                continue;
            };
            let bytes = [lead, trail];
            self.fill_cell(&mut grid, row, col, Some(&bytes[..]), &fallback, &mut stats);
        }

        tracing::info!(
            "Atlas built: {} of {} cells rendered ({} unmapped, {} without glyph, {} failed, {} fallback, {} clipped)",
            stats.cells_rendered,
            stats.cells_visited,
            stats.unmapped,
            stats.missing_glyph,
            stats.raster_failed,
            stats.fallback_used,
            stats.clipped
        );

        let metadata = FontMetadata {
            glyph_count: range.double_byte_count() as f32,
            texture_name: self
                .config
                .texture_name
                .as_deref()
                .map(|name| name.as_bytes().to_vec())
                .unwrap_or_default(),
            records,
        };

        BuildOutput {
            grid,
            metadata,
            stats,
            code_range: range,
        }
    }

    /// Rasterize the fallback glyph once for the whole build
    fn fallback_bitmap(&self) -> Fallback {
        if self.config.missing_glyph != MissingGlyphPolicy::Fill {
            return None;
        }
        let bitmap = self.glyphs.bitmap(self.config.fallback_glyph);
        if let Err(e) = &bitmap {
            tracing::warn!(
                "Fallback glyph {} unusable, cells without a glyph stay blank: {}",
                self.config.fallback_glyph,
                e
            );
        }
        Some(bitmap)
    }

    /// Resolve the glyph for one cell and compose it
    fn fill_cell(
        &self,
        grid: &mut AtlasGrid,
        row: u32,
        col: u32,
        bytes: Option<&[u8]>,
        fallback: &Fallback,
        stats: &mut BuildStats,
    ) {
        stats.cells_visited += 1;

        let glyph_id = match bytes.and_then(|b| self.mapper.map(b)) {
            None => {
                stats.unmapped += 1;
                tracing::debug!("Cell ({}, {}): {:02X?} has no Unicode mapping", row, col, bytes);
                None
            }
            Some(codepoint) => match self.glyphs.glyph_index(codepoint) {
                0 => {
                    stats.missing_glyph += 1;
                    tracing::debug!("Cell ({}, {}): no glyph for U+{:04X}", row, col, codepoint);
                    None
                }
                id => Some(id),
            },
        };

        let (bitmap, is_fallback) = match (glyph_id, fallback) {
            (Some(id), _) => match self.glyphs.bitmap(id) {
                Ok(bitmap) => (Cow::Owned(bitmap), false),
                Err(e) => {
                    stats.raster_failed += 1;
                    tracing::debug!("Cell ({}, {}): {}", row, col, e);
                    return;
                }
            },
            (None, Some(Ok(bitmap))) => (Cow::Borrowed(bitmap), true),
            (None, Some(Err(_))) => {
                stats.raster_failed += 1;
                return;
            }
            (None, None) => return,
        };

        if grid.compose(row, col, &bitmap) {
            stats.clipped += 1;
            tracing::debug!(
                "Cell ({}, {}): {}x{} bitmap clipped to cell",
                row,
                col,
                bitmap.width,
                bitmap.height
            );
        }
        stats.cells_rendered += 1;
        if is_fallback {
            stats.fallback_used += 1;
        }
    }
}
