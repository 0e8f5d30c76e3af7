//! Atlas configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{FontGenError, Result};

/// Longest texture name that still leaves a terminating NUL in the header
pub const MAX_TEXTURE_NAME_LEN: usize = crate::fnt::TEXTURE_NAME_LEN - 1;

/// Largest accepted cell edge in pixels
pub const MAX_CELL_SIZE: u32 = 1024;

/// Inclusive lead/trail byte ranges of the double-byte space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRange {
    pub lead_start: u8,
    pub lead_end: u8,
    pub trail_start: u8,
    pub trail_end: u8,
}

impl CodeRange {
    /// Full GBK space as laid out by the engine
    pub const GBK: CodeRange = CodeRange {
        lead_start: 0x81,
        lead_end: 0xFE,
        trail_start: 0x40,
        trail_end: 0xFE,
    };

    pub fn new(lead: (u8, u8), trail: (u8, u8)) -> Self {
        Self {
            lead_start: lead.0,
            lead_end: lead.1,
            trail_start: trail.0,
            trail_end: trail.1,
        }
    }

    /// Number of lead byte values
    pub fn lead_count(&self) -> u32 {
        (self.lead_end as u32 + 1).saturating_sub(self.lead_start as u32)
    }

    /// Number of trail byte values
    pub fn trail_count(&self) -> u32 {
        (self.trail_end as u32 + 1).saturating_sub(self.trail_start as u32)
    }

    /// Number of double-byte code points in the range
    pub fn double_byte_count(&self) -> u32 {
        self.lead_count() * self.trail_count()
    }

    /// Grid rows: one reserved ASCII row plus one row per lead byte
    pub fn grid_rows(&self) -> u32 {
        self.lead_count() + 1
    }

    /// Grid columns: one per trail byte
    pub fn grid_cols(&self) -> u32 {
        self.trail_count()
    }

    pub fn contains(&self, lead: u8, trail: u8) -> bool {
        (self.lead_start..=self.lead_end).contains(&lead)
            && (self.trail_start..=self.trail_end).contains(&trail)
    }

    /// Grid cell `(row, col)` of a double-byte pair
    pub fn cell_of(&self, lead: u8, trail: u8) -> Option<(u32, u32)> {
        if !self.contains(lead, trail) {
            return None;
        }
        Some((
            (lead - self.lead_start) as u32 + 1,
            (trail - self.trail_start) as u32,
        ))
    }

    /// Iterate `(lead, trail)` pairs in lead-major, trail-minor order
    pub fn pairs(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        let trail = self.trail_start..=self.trail_end;
        (self.lead_start..=self.lead_end)
            .flat_map(move |lead| trail.clone().map(move |t| (lead, t)))
    }
}

impl Default for CodeRange {
    fn default() -> Self {
        Self::GBK
    }
}

/// What to do with a cell whose code point has no mapping or no glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingGlyphPolicy {
    /// Leave the cell at the background color
    #[default]
    Skip,
    /// Render the configured fallback glyph instead
    Fill,
}

/// Row order of the pixel stream in the `.tex` file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowOrder {
    /// Last atlas row first (engine texture convention)
    #[default]
    BottomUp,
    /// Natural top-to-bottom order
    TopDown,
}

/// Atlas build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Double-byte space covered by the grid
    pub code_range: CodeRange,

    /// Cell width in pixels (also the rasterizer pixel size)
    pub cell_width: u32,

    /// Cell height in pixels
    pub cell_height: u32,

    /// Missing glyph handling
    pub missing_glyph: MissingGlyphPolicy,

    /// Glyph index rendered under [`MissingGlyphPolicy::Fill`]
    pub fallback_glyph: u16,

    /// Pixel stream row order
    pub row_order: RowOrder,

    /// Initial pixel value
    pub background: u32,

    /// RGB of inked pixels; the alpha byte is replaced by glyph coverage
    pub foreground: u32,

    /// Name written into the `.fnt` header (defaults to the texture path)
    pub texture_name: Option<String>,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            code_range: CodeRange::GBK,
            cell_width: 16,
            cell_height: 16,
            missing_glyph: MissingGlyphPolicy::Skip,
            fallback_glyph: 5000,
            row_order: RowOrder::BottomUp,
            background: 0x0000_0000,
            foreground: 0x00FF_FFFF,
            texture_name: None,
        }
    }
}

impl AtlasConfig {
    /// Load a (possibly partial) JSON configuration
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| FontGenError::InvalidConfig(e.to_string()))
    }

    /// Atlas width in pixels
    pub fn atlas_width(&self) -> u64 {
        self.code_range.grid_cols() as u64 * self.cell_width as u64
    }

    /// Atlas height in pixels, including the ASCII row
    pub fn atlas_height(&self) -> u64 {
        self.code_range.grid_rows() as u64 * self.cell_height as u64
    }

    /// Check every precondition that would otherwise surface mid-build
    pub fn validate(&self) -> Result<()> {
        let range = &self.code_range;
        if range.lead_start > range.lead_end {
            return Err(FontGenError::InvalidConfig(format!(
                "lead range {:#04X}..={:#04X} is empty",
                range.lead_start, range.lead_end
            )));
        }
        if range.trail_start > range.trail_end {
            return Err(FontGenError::InvalidConfig(format!(
                "trail range {:#04X}..={:#04X} is empty",
                range.trail_start, range.trail_end
            )));
        }
        for (name, size) in [("cell width", self.cell_width), ("cell height", self.cell_height)] {
            if size == 0 || size > MAX_CELL_SIZE {
                return Err(FontGenError::InvalidConfig(format!(
                    "{name} {size} outside 1..={MAX_CELL_SIZE}"
                )));
            }
        }
        if self.atlas_width() > i32::MAX as u64 || self.atlas_height() > i32::MAX as u64 {
            return Err(FontGenError::InvalidConfig(format!(
                "atlas {}x{} does not fit the texture header",
                self.atlas_width(),
                self.atlas_height()
            )));
        }
        if let Some(name) = &self.texture_name {
            check_texture_name(name.as_bytes())?;
        }
        Ok(())
    }
}

pub(crate) fn check_texture_name(name: &[u8]) -> Result<()> {
    if name.len() > MAX_TEXTURE_NAME_LEN {
        return Err(FontGenError::InvalidConfig(format!(
            "texture name is {} bytes, at most {} allowed",
            name.len(),
            MAX_TEXTURE_NAME_LEN
        )));
    }
    Ok(())
}
