//! `.fnt` metadata file
//!
//! Layout, little-endian, no padding:
//!
//! ```text
//! f32        glyph count (double-byte cells)
//! i32        format marker, always 1
//! i32        format marker, always 1
//! [u8; 284]  texture file name, NUL padded
//! 256 x record          record i: grid cell (0, i), zeroed past the last column
//! ```
//!
//! A record is fourteen f32: `u1`, four UV corners (x, y each), width,
//! height, `u2`, kerning, ascent. The record count never depends on the
//! code range; double-byte cells are addressed by grid geometry alone.

use std::io::Write;

use crate::grid::{AtlasGrid, CellUv, UvPoint};
use crate::{FontGenError, Result};

/// Length of the texture name field
pub const TEXTURE_NAME_LEN: usize = 284;

/// Header size in bytes
pub const HEADER_LEN: usize = 4 + 4 + 4 + TEXTURE_NAME_LEN;

/// Record size in bytes
pub const RECORD_LEN: usize = 14 * 4;

/// Records per file
pub const RECORD_COUNT: usize = 256;

/// Size of every `.fnt` file
pub const FILE_LEN: usize = HEADER_LEN + RECORD_COUNT * RECORD_LEN;

const FORMAT_MARKER: i32 = 1;

/// Placement of one glyph in the texture
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphMetadata {
    /// Unused, always 0
    pub u1: f32,
    pub uv: CellUv,
    pub width: f32,
    pub height: f32,
    /// Unused, always 0
    pub u2: f32,
    pub kerning: f32,
    pub ascent: f32,
}

impl GlyphMetadata {
    /// Record for a grid cell, derived purely from geometry
    pub fn for_cell(grid: &AtlasGrid, row: u32, col: u32) -> Self {
        Self {
            u1: 0.0,
            uv: grid.cell_uv(row, col),
            width: grid.cell_width() as f32,
            height: grid.cell_height() as f32,
            u2: 0.0,
            kerning: 0.0,
            ascent: 0.0,
        }
    }

    fn fields(&self) -> [f32; 14] {
        let uv = &self.uv;
        [
            self.u1,
            uv.top_left.x,
            uv.top_left.y,
            uv.top_right.x,
            uv.top_right.y,
            uv.bottom_left.x,
            uv.bottom_left.y,
            uv.bottom_right.x,
            uv.bottom_right.y,
            self.width,
            self.height,
            self.u2,
            self.kerning,
            self.ascent,
        ]
    }

    /// Encode as a 56-byte record
    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        for (chunk, value) in out.chunks_exact_mut(4).zip(self.fields()) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Decode a 56-byte record
    pub fn from_bytes(bytes: &[u8; RECORD_LEN]) -> Self {
        let mut f = [0f32; 14];
        for (value, chunk) in f.iter_mut().zip(bytes.chunks_exact(4)) {
            *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        let point = |i: usize| UvPoint { x: f[i], y: f[i + 1] };
        Self {
            u1: f[0],
            uv: CellUv {
                top_left: point(1),
                top_right: point(3),
                bottom_left: point(5),
                bottom_right: point(7),
            },
            width: f[9],
            height: f[10],
            u2: f[11],
            kerning: f[12],
            ascent: f[13],
        }
    }
}

/// Complete contents of a `.fnt` file
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetadata {
    /// Number of double-byte cells, stored as f32
    pub glyph_count: f32,
    /// Texture name without padding
    pub texture_name: Vec<u8>,
    /// Exactly [`RECORD_COUNT`] entries
    pub records: Vec<GlyphMetadata>,
}

impl FontMetadata {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Serialize the whole file
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        if self.records.len() != RECORD_COUNT {
            return Err(FontGenError::InvalidConfig(format!(
                "metadata has {} records, expected {}",
                self.records.len(),
                RECORD_COUNT
            )));
        }
        crate::config::check_texture_name(&self.texture_name)?;

        w.write_all(&self.glyph_count.to_le_bytes())?;
        w.write_all(&FORMAT_MARKER.to_le_bytes())?;
        w.write_all(&FORMAT_MARKER.to_le_bytes())?;

        let mut name = [0u8; TEXTURE_NAME_LEN];
        name[..self.texture_name.len()].copy_from_slice(&self.texture_name);
        w.write_all(&name)?;

        for record in &self.records {
            w.write_all(&record.to_bytes())?;
        }
        Ok(())
    }

    /// Serialize into a new buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(FILE_LEN);
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Parse a file produced by [`FontMetadata::write_to`]
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != FILE_LEN {
            return Err(FontGenError::MalformedMetadata(format!(
                "metadata is {} bytes, expected {}",
                bytes.len(),
                FILE_LEN
            )));
        }
        let glyph_count = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let name_field = &bytes[12..HEADER_LEN];
        let name_len = name_field.iter().position(|&b| b == 0).unwrap_or(TEXTURE_NAME_LEN);

        let records = bytes[HEADER_LEN..]
            .chunks_exact(RECORD_LEN)
            .map(|chunk| {
                let mut record = [0u8; RECORD_LEN];
                record.copy_from_slice(chunk);
                GlyphMetadata::from_bytes(&record)
            })
            .collect();

        Ok(Self {
            glyph_count,
            texture_name: name_field[..name_len].to_vec(),
            records,
        })
    }
}
