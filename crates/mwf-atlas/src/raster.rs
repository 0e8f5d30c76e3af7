//! Glyph rasterization

use std::path::{Path, PathBuf};

use ttf_parser::{Face, GlyphId, OutlineBuilder};

use crate::{FontGenError, Result};

/// Single-channel coverage bitmap (0 = transparent, 255 = full ink)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoverageBitmap {
    /// Bitmap width
    pub width: u32,
    /// Bitmap height
    pub height: u32,
    /// Row-major coverage, `width * height` bytes
    pub data: Vec<u8>,
}

impl CoverageBitmap {
    /// Create an empty bitmap
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a bitmap from row-major coverage bytes
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        Self { width, height, data }
    }

    /// Bitmap with every pixel set to `coverage`
    pub fn filled(width: u32, height: u32, coverage: u8) -> Self {
        Self::new(width, height, vec![coverage; (width * height) as usize])
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Coverage at `(x, y)`, 0 outside the bitmap
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or(0)
    }
}

/// Per-glyph rasterization failure. Never fatal to a build.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RasterError {
    #[error("glyph {0} is outside the font's glyph table")]
    GlyphOutOfRange(u16),

    #[error("cannot allocate a {width}x{height} glyph canvas")]
    Allocation { width: u32, height: u32 },
}

/// Glyph lookup and rasterization at a fixed pixel size
pub trait GlyphSource {
    /// Glyph index for a Unicode code point; 0 means "no glyph"
    fn glyph_index(&self, codepoint: u32) -> u16;

    /// Rasterize a glyph, cropped to its ink bounding box
    fn bitmap(&self, glyph_id: u16) -> std::result::Result<CoverageBitmap, RasterError>;
}

impl<T: GlyphSource + ?Sized> GlyphSource for &T {
    fn glyph_index(&self, codepoint: u32) -> u16 {
        (**self).glyph_index(codepoint)
    }

    fn bitmap(&self, glyph_id: u16) -> std::result::Result<CoverageBitmap, RasterError> {
        (**self).bitmap(glyph_id)
    }
}

/// Font file bytes kept alive for the lifetime of a [`TtfRasterizer`]
pub struct FontFile {
    path: PathBuf,
    data: Vec<u8>,
}

impl FontFile {
    /// Read a font file from disk
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| FontGenError::FontRead {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Read {} bytes of font data from {}", data.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Wrap in-memory font data
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            path: PathBuf::new(),
            data,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Glyph rasterizer using ttf-parser outlines and tiny-skia
pub struct TtfRasterizer<'a> {
    face: Face<'a>,
    /// Pixels per em
    pixel_size: f32,
}

impl<'a> TtfRasterizer<'a> {
    /// Parse the first face of `font` and fix the pixel size.
    ///
    /// Fails when the data is not a font or carries no Unicode cmap.
    pub fn new(font: &'a FontFile, pixel_size: u32) -> Result<Self> {
        if pixel_size == 0 {
            return Err(FontGenError::InvalidConfig("pixel size must be positive".into()));
        }

        let face = Face::parse(font.data(), 0)
            .map_err(|e| FontGenError::FontParsing(e.to_string()))?;

        let has_unicode = face
            .tables()
            .cmap
            .map(|cmap| cmap.subtables.into_iter().any(|s| s.is_unicode()))
            .unwrap_or(false);
        if !has_unicode {
            return Err(FontGenError::NoUnicodeCharmap);
        }

        tracing::info!(
            "Loaded font {} ({} glyphs, {} units/em) at {}px",
            font.path().display(),
            face.number_of_glyphs(),
            face.units_per_em(),
            pixel_size
        );

        Ok(Self {
            face,
            pixel_size: pixel_size as f32,
        })
    }
}

impl GlyphSource for TtfRasterizer<'_> {
    fn glyph_index(&self, codepoint: u32) -> u16 {
        char::from_u32(codepoint)
            .and_then(|c| self.face.glyph_index(c))
            .map(|g| g.0)
            .unwrap_or(0)
    }

    fn bitmap(&self, glyph_id: u16) -> std::result::Result<CoverageBitmap, RasterError> {
        if glyph_id >= self.face.number_of_glyphs() {
            return Err(RasterError::GlyphOutOfRange(glyph_id));
        }
        let glyph = GlyphId(glyph_id);

        // No bounding box means no outline (e.g. a space)
        let Some(bbox) = self.face.glyph_bounding_box(glyph) else {
            return Ok(CoverageBitmap::empty());
        };

        let scale = self.pixel_size / self.face.units_per_em() as f32;

        let width = scaled_extent(bbox.x_min, bbox.x_max, scale);
        let height = scaled_extent(bbox.y_min, bbox.y_max, scale);

        if width == 0 || height == 0 {
            return Ok(CoverageBitmap::empty());
        }

        let mut builder = PathBuilder::new(scale, bbox.x_min as f32, bbox.y_max as f32);
        if self.face.outline_glyph(glyph, &mut builder).is_none() {
            return Ok(CoverageBitmap::empty());
        }
        let Some(path) = builder.finish() else {
            return Ok(CoverageBitmap::empty());
        };

        let mut pixmap =
            tiny_skia::Pixmap::new(width, height).ok_or(RasterError::Allocation { width, height })?;

        let mut paint = tiny_skia::Paint::default();
        paint.set_color(tiny_skia::Color::WHITE);
        paint.anti_alias = true;

        pixmap.fill_path(
            &path,
            &paint,
            tiny_skia::FillRule::Winding,
            tiny_skia::Transform::identity(),
            None,
        );

        // Alpha channel is the coverage
        let data: Vec<u8> = pixmap.pixels().iter().map(|p| p.alpha()).collect();

        Ok(CoverageBitmap::new(width, height, data))
    }
}

/// Pixel span of `min..max` font units; widened first, a bbox can exceed `i16::MAX`
fn scaled_extent(min: i16, max: i16, scale: f32) -> u32 {
    ((max as i32 - min as i32) as f32 * scale).ceil() as u32
}

/// Path builder that converts ttf-parser outlines to tiny-skia paths
struct PathBuilder {
    builder: tiny_skia::PathBuilder,
    scale: f32,
    offset_x: f32,
    offset_y: f32,
}

impl PathBuilder {
    fn new(scale: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            builder: tiny_skia::PathBuilder::new(),
            scale,
            offset_x,
            offset_y,
        }
    }

    fn transform_x(&self, x: f32) -> f32 {
        (x - self.offset_x) * self.scale
    }

    fn transform_y(&self, y: f32) -> f32 {
        (self.offset_y - y) * self.scale // Flip Y axis
    }

    fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for PathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(self.transform_x(x), self.transform_y(y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(self.transform_x(x), self.transform_y(y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(
            self.transform_x(x1),
            self.transform_y(y1),
            self.transform_x(x),
            self.transform_y(y),
        );
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(
            self.transform_x(x1),
            self.transform_y(y1),
            self.transform_x(x2),
            self.transform_y(y2),
            self.transform_x(x),
            self.transform_y(y),
        );
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONO: &[u8] = include_bytes!("../tests/fonts/DejaVuSansMono.ttf");

    fn mono() -> FontFile {
        FontFile::from_bytes(MONO.to_vec())
    }

    #[test]
    fn test_bitmap_get() {
        let bitmap = CoverageBitmap::new(2, 2, vec![1, 2, 3, 4]);
        assert_eq!(bitmap.get(0, 0), 1);
        assert_eq!(bitmap.get(1, 0), 2);
        assert_eq!(bitmap.get(0, 1), 3);
        assert_eq!(bitmap.get(1, 1), 4);
        assert_eq!(bitmap.get(2, 0), 0);
    }

    #[test]
    fn test_empty_bitmap() {
        assert!(CoverageBitmap::empty().is_empty());
        assert!(!CoverageBitmap::filled(1, 1, 255).is_empty());
    }

    #[test]
    fn test_rejects_non_font() {
        let font = FontFile::from_bytes(b"definitely not a font".to_vec());
        assert!(matches!(
            TtfRasterizer::new(&font, 16),
            Err(FontGenError::FontParsing(_))
        ));
    }

    #[test]
    fn test_rejects_zero_pixel_size() {
        let font = FontFile::from_bytes(Vec::new());
        assert!(matches!(
            TtfRasterizer::new(&font, 0),
            Err(FontGenError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_scaled_extent_wide_bbox() {
        assert_eq!(scaled_extent(0, 2048, 16.0 / 2048.0), 16);
        assert_eq!(scaled_extent(37, 1196, 16.0 / 2048.0), 10);
        assert_eq!(scaled_extent(i16::MIN, i16::MAX, 1.0 / 64.0), 1024);
        assert_eq!(scaled_extent(-20000, 20000, 0.5), 20000);
    }

    #[test]
    fn test_real_glyph_coverage() {
        let font = mono();
        let raster = TtfRasterizer::new(&font, 16).unwrap();

        let glyph = raster.glyph_index('A' as u32);
        assert_ne!(glyph, 0);
        let bitmap = raster.bitmap(glyph).unwrap();
        assert!(bitmap.width > 0 && bitmap.width <= 32, "width {}", bitmap.width);
        assert!(bitmap.height > 0 && bitmap.height <= 32, "height {}", bitmap.height);
        assert_eq!(bitmap.data.len(), (bitmap.width * bitmap.height) as usize);
        let inked = bitmap.data.iter().filter(|&&c| c > 0).count();
        assert!(inked > 10 && inked < bitmap.data.len(), "{inked} inked pixels");
    }

    #[test]
    fn test_bitmap_scales_with_pixel_size() {
        let font = mono();
        let small = TtfRasterizer::new(&font, 16).unwrap();
        let large = TtfRasterizer::new(&font, 48).unwrap();
        let a = small.bitmap(small.glyph_index('W' as u32)).unwrap();
        let b = large.bitmap(large.glyph_index('W' as u32)).unwrap();
        assert!(b.height >= a.height * 2, "{}x{} vs {}x{}", a.width, a.height, b.width, b.height);
    }

    #[test]
    fn test_real_font_lookup_edges() {
        let font = mono();
        let raster = TtfRasterizer::new(&font, 16).unwrap();

        // No CJK coverage
        assert_eq!(raster.glyph_index(0x4E02), 0);
        // Not a scalar value
        assert_eq!(raster.glyph_index(0xD800), 0);
        // A space has no outline
        assert!(raster.bitmap(raster.glyph_index(' ' as u32)).unwrap().is_empty());
        assert_eq!(raster.bitmap(u16::MAX), Err(RasterError::GlyphOutOfRange(u16::MAX)));
    }

    #[test]
    fn test_missing_font_file() {
        let path = std::env::temp_dir().join("mwf-atlas-no-such-font.ttf");
        assert!(matches!(
            FontFile::open(&path),
            Err(FontGenError::FontRead { .. })
        ));
    }
}
