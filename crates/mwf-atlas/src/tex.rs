//! `.tex` pixel file
//!
//! `i32 width`, `i32 height`, then `width * height` little-endian `u32`
//! pixels. Rows are written bottom-up unless [`RowOrder::TopDown`] is
//! selected; pixel values never depend on the order.

use std::io::{self, BufRead, Read, Write};

use crate::config::RowOrder;
use crate::grid::AtlasGrid;
use crate::{FontGenError, Result};

/// Header size in bytes
pub const HEADER_LEN: usize = 8;

/// Texture dimensions as stored in the file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureHeader {
    pub width: u32,
    pub height: u32,
}

impl TextureHeader {
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let width = i32::try_from(self.width)
            .map_err(|_| FontGenError::InvalidConfig(format!("width {} exceeds i32", self.width)))?;
        let height = i32::try_from(self.height)
            .map_err(|_| FontGenError::InvalidConfig(format!("height {} exceeds i32", self.height)))?;
        w.write_all(&width.to_le_bytes())?;
        w.write_all(&height.to_le_bytes())?;
        Ok(())
    }

    /// Read the header; a short or negative header is malformed
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_LEN];
        r.read_exact(&mut buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                FontGenError::MalformedTexture("file ends inside the header".into())
            }
            _ => FontGenError::Io(e),
        })?;
        let width = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let height = i32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        match (u32::try_from(width), u32::try_from(height)) {
            (Ok(width), Ok(height)) => Ok(Self { width, height }),
            _ => Err(FontGenError::MalformedTexture(format!(
                "negative dimensions {width}x{height}"
            ))),
        }
    }
}

/// Write the whole atlas
pub fn write_texture<W: Write>(w: &mut W, grid: &AtlasGrid, order: RowOrder) -> Result<()> {
    let header = TextureHeader {
        width: grid.width(),
        height: grid.height(),
    };
    header.write_to(w)?;

    let mut row_bytes = Vec::with_capacity(grid.width() as usize * 4);
    let mut write_row = |y: u32, w: &mut W| -> io::Result<()> {
        row_bytes.clear();
        for pixel in grid.row(y) {
            row_bytes.extend_from_slice(&pixel.to_le_bytes());
        }
        w.write_all(&row_bytes)
    };

    match order {
        RowOrder::BottomUp => {
            for y in (0..grid.height()).rev() {
                write_row(y, w)?;
            }
        }
        RowOrder::TopDown => {
            for y in 0..grid.height() {
                write_row(y, w)?;
            }
        }
    }
    Ok(())
}

/// Read one pixel, `None` on a short read
pub fn read_pixel<R: Read>(r: &mut R) -> io::Result<Option<u32>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => return Ok(None),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(Some(u32::from_le_bytes(buf)))
}

/// Pixel written for missing data
const FILLER_PIXEL: u32 = 0;

/// Dump a `.tex` stream as a plain-text PPM (`P3`).
///
/// Rows come out in stored order. The top byte of each pixel is red, then
/// green and blue; truncated pixel data is padded with black.
pub fn write_ppm<R: BufRead, W: Write>(r: &mut R, w: &mut W) -> Result<TextureHeader> {
    let header = TextureHeader::read_from(r)?;

    writeln!(w, "P3")?;
    writeln!(w, "{} {}", header.width, header.height)?;
    writeln!(w, "255")?;

    let mut missing = 0u64;
    for _ in 0..header.pixel_count() {
        let pixel = match read_pixel(r)? {
            Some(p) => p,
            None => {
                missing += 1;
                FILLER_PIXEL
            }
        };
        let [_, b, g, red] = pixel.to_le_bytes();
        writeln!(w, "{red} {g} {b}")?;
    }

    if missing > 0 {
        tracing::warn!("Texture truncated: {} pixels padded", missing);
    }
    Ok(header)
}
