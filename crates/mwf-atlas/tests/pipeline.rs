//! Pipeline tests - charset mapping through to the written files
//!
//! Most tests use the real GBK mapper with an in-memory glyph source; the
//! TrueType section renders DejaVu Sans Mono from `tests/fonts`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use mwf_atlas::fnt::{FILE_LEN, HEADER_LEN, RECORD_LEN};
use mwf_atlas::*;

/// Glyph source with a fixed code point table; every glyph is a 5x5 block
struct FakeFont {
    glyphs: HashMap<u32, u16>,
}

impl FakeFont {
    fn blank() -> Self {
        Self { glyphs: HashMap::new() }
    }

    fn with(codepoint: char, glyph_id: u16) -> Self {
        Self {
            glyphs: HashMap::from([(codepoint as u32, glyph_id)]),
        }
    }
}

impl GlyphSource for FakeFont {
    fn glyph_index(&self, codepoint: u32) -> u16 {
        self.glyphs.get(&codepoint).copied().unwrap_or(0)
    }

    fn bitmap(&self, glyph_id: u16) -> std::result::Result<CoverageBitmap, RasterError> {
        if !self.glyphs.values().any(|&g| g == glyph_id) {
            return Err(RasterError::GlyphOutOfRange(glyph_id));
        }
        Ok(CoverageBitmap::filled(5, 5, 200))
    }
}

fn small_config() -> AtlasConfig {
    AtlasConfig {
        code_range: CodeRange::new((0x81, 0x82), (0x40, 0x42)),
        ..Default::default()
    }
}

struct TempDir(PathBuf);

impl TempDir {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("mwf-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.0.join(file)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.0).ok();
    }
}

fn read_pixels(bytes: &[u8]) -> (TextureHeader, Vec<u32>) {
    let header = TextureHeader::read_from(&mut &bytes[..]).unwrap();
    let pixels = bytes[tex::HEADER_LEN..]
        .chunks_exact(4)
        .map(|p| u32::from_le_bytes([p[0], p[1], p[2], p[3]]))
        .collect();
    (header, pixels)
}

// ============================================================================
// END-TO-END
// ============================================================================

#[test]
fn test_single_glyph_font() {
    let dir = TempDir::new("single");
    let (fnt, tex) = (dir.path("cn.fnt"), dir.path("cn.tex"));

    // GBK 81 40 is U+4E02
    let generator = FontGenerator::new(AtlasConfig {
        row_order: RowOrder::TopDown,
        ..small_config()
    });
    let stats = generator
        .run_with_source(FakeFont::with('\u{4E02}', 7), &fnt, &tex)
        .unwrap();
    assert_eq!(stats.cells_rendered, 1);

    let (header, pixels) = read_pixels(&std::fs::read(&tex).unwrap());
    assert_eq!(header, TextureHeader { width: 3 * 16, height: 3 * 16 });
    assert_eq!(pixels.len(), 48 * 48);

    for y in 0..48u32 {
        for x in 0..48u32 {
            let p = pixels[(y * 48 + x) as usize];
            let in_cell = (16..32).contains(&y) && x < 16;
            if in_cell && x < 5 && y < 21 {
                assert_eq!(p, 0xC8FF_FFFF, "pixel ({x}, {y})");
            } else {
                assert_eq!(p, 0, "pixel ({x}, {y})");
            }
        }
    }

    let fnt_bytes = std::fs::read(&fnt).unwrap();
    assert_eq!(fnt_bytes.len(), HEADER_LEN + 256 * RECORD_LEN);
    let meta = FontMetadata::parse(&fnt_bytes).unwrap();
    assert_eq!(meta.glyph_count, 6.0);
    assert_eq!(meta.record_count(), 256);
    assert_eq!(meta.texture_name, tex.to_string_lossy().as_bytes());
    assert_eq!(meta.records[2].uv.top_left, UvPoint { x: 2.0 / 3.0, y: 0.0 });

    // The six double-byte cells are addressed by geometry
    let out = AtlasBuilder::new(small_config(), GbkMapper::new(), FakeFont::blank())
        .unwrap()
        .build();
    let cells: Vec<GlyphMetadata> = small_config()
        .code_range
        .pairs()
        .filter_map(|(lead, trail)| out.cell_metadata(lead, trail))
        .collect();
    assert_eq!(cells.len(), 6);
    let first = cells[0].uv;
    assert_eq!(first.top_left, UvPoint { x: 0.0, y: 1.0 / 3.0 });
    assert_eq!(first.bottom_right, UvPoint { x: 1.0 / 3.0, y: 2.0 / 3.0 });
}

#[test]
fn test_blank_font_still_full_size() {
    let dir = TempDir::new("blank");
    let (fnt, tex) = (dir.path("blank.fnt"), dir.path("blank.tex"));

    let stats = FontGenerator::new(small_config())
        .run_with_source(FakeFont::blank(), &fnt, &tex)
        .unwrap();
    assert_eq!(stats.cells_rendered, 0);

    let fnt_bytes = std::fs::read(&fnt).unwrap();
    assert_eq!(fnt_bytes.len(), HEADER_LEN + 256 * RECORD_LEN);

    let (header, pixels) = read_pixels(&std::fs::read(&tex).unwrap());
    assert_eq!(header, TextureHeader { width: 48, height: 48 });
    assert_eq!(pixels.len(), 48 * 48);
    assert!(pixels.iter().all(|&p| p == 0));
}

#[test]
fn test_row_order_only_changes_texture() {
    let dir = TempDir::new("order");
    let mut outputs = Vec::new();

    for order in [RowOrder::BottomUp, RowOrder::TopDown] {
        let fnt = dir.path(&format!("{order:?}.fnt"));
        let tex = dir.path(&format!("{order:?}.tex"));
        let generator = FontGenerator::new(AtlasConfig {
            row_order: order,
            texture_name: Some("cn.tex".into()),
            ..small_config()
        });
        generator
            .run_with_source(FakeFont::with('\u{4E02}', 7), &fnt, &tex)
            .unwrap();
        outputs.push((std::fs::read(&fnt).unwrap(), std::fs::read(&tex).unwrap()));
    }

    let (bottom_up, top_down) = (&outputs[0], &outputs[1]);
    assert_eq!(bottom_up.0, top_down.0);

    let row_len = 48 * 4;
    let rows = |bytes: &[u8]| -> Vec<Vec<u8>> {
        bytes[tex::HEADER_LEN..].chunks(row_len).map(<[u8]>::to_vec).collect()
    };
    let mut reversed = rows(&top_down.1);
    reversed.reverse();
    assert_eq!(rows(&bottom_up.1), reversed);
    assert_ne!(bottom_up.1, top_down.1);
}

#[test]
fn test_ascii_row_full_width_glyph() {
    // 'A' widens to GBK A3 C1, U+FF21
    let config = AtlasConfig {
        code_range: CodeRange::new((0x81, 0x81), (0x40, 0xFE)),
        ..Default::default()
    };
    let builder = AtlasBuilder::new(config, GbkMapper::new(), FakeFont::with('\u{FF21}', 3)).unwrap();
    let out = builder.build();

    assert_eq!(out.stats.cells_rendered, 1);
    assert!(!out.grid.is_cell_blank(0, b'A' as u32));
    assert!(out.grid.is_cell_blank(0, b'B' as u32));
}

#[test]
fn test_fill_policy_covers_every_cell() {
    let config = AtlasConfig {
        missing_glyph: MissingGlyphPolicy::Fill,
        fallback_glyph: 7,
        ..small_config()
    };
    let builder = AtlasBuilder::new(config, GbkMapper::new(), FakeFont::with('\u{4E02}', 7)).unwrap();
    let out = builder.build();

    for row in 0..out.grid.rows() {
        for col in 0..out.grid.cols() {
            assert!(!out.grid.is_cell_blank(row, col), "cell ({row}, {col})");
        }
    }
    assert_eq!(out.stats.fallback_used, 8);
}

#[test]
fn test_default_geometry() {
    let builder = AtlasBuilder::new(AtlasConfig::default(), GbkMapper::new(), FakeFont::blank()).unwrap();
    let out = builder.build();

    assert_eq!(out.grid.width(), 191 * 16);
    assert_eq!(out.grid.height(), 127 * 16);
    assert_eq!(out.metadata.glyph_count, 24066.0);
    assert_eq!(out.metadata.record_count(), 256);
    assert_eq!(out.metadata.to_bytes().unwrap().len(), FILE_LEN);
    assert_eq!(out.stats.cells_visited, 0x81 + 24066);
    // Trail 0x7F is never valid, so every row has at least one gap
    assert!(out.stats.unmapped >= 126);
    assert_eq!(out.stats.cells_rendered, 0);
}

#[test]
fn test_dump_written_texture() {
    let mut grid = AtlasGrid::new(1, 2, 1, 1, 0, 0x00FF_FFFF);
    grid.compose(0, 1, &CoverageBitmap::filled(1, 1, 0x40));

    let mut tex_bytes = Vec::new();
    tex::write_texture(&mut tex_bytes, &grid, RowOrder::BottomUp).unwrap();

    let mut ppm = Vec::new();
    tex::write_ppm(&mut tex_bytes.as_slice(), &mut ppm).unwrap();
    assert_eq!(String::from_utf8(ppm).unwrap(), "P3\n2 1\n255\n0 0 0\n64 255 255\n");
}

// ============================================================================
// TRUETYPE
// ============================================================================

fn mono_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fonts/DejaVuSansMono.ttf")
}

/// Maps one double-byte pair to a fixed character, everything else unmapped
struct OnePair {
    pair: [u8; 2],
    codepoint: char,
}

impl CodepointMapper for OnePair {
    fn map(&self, bytes: &[u8]) -> Option<u32> {
        (bytes == self.pair).then_some(self.codepoint as u32)
    }
}

#[test]
fn test_truetype_oversized_glyph_clipped() {
    let font = FontFile::open(&mono_path()).unwrap();
    let raster = TtfRasterizer::new(&font, 16).unwrap();

    // 16px 'W' is about 12 pixels tall, the cells only 8
    let config = AtlasConfig {
        code_range: CodeRange::new((0x81, 0x82), (0x40, 0x41)),
        cell_width: 16,
        cell_height: 8,
        ..Default::default()
    };
    let mapper = OnePair {
        pair: [0x81, 0x40],
        codepoint: 'W',
    };
    let out = AtlasBuilder::new(config, mapper, &raster).unwrap().build();

    assert_eq!(out.stats.cells_rendered, 1);
    assert_eq!(out.stats.clipped, 1);
    assert!(!out.grid.is_cell_blank(1, 0));
    for (row, col) in [(0, 0), (0, 1), (1, 1), (2, 0), (2, 1)] {
        assert!(out.grid.is_cell_blank(row, col), "cell ({row}, {col})");
    }
}

#[test]
fn test_truetype_greek_row() {
    let dir = TempDir::new("greek");
    let (fnt, tex) = (dir.path("greek.fnt"), dir.path("greek.tex"));

    // GBK A6 A1..A3 are U+0391..U+0393
    let config = AtlasConfig {
        code_range: CodeRange::new((0xA6, 0xA6), (0xA1, 0xA3)),
        row_order: RowOrder::TopDown,
        ..Default::default()
    };
    let stats = FontGenerator::new(config).run(&mono_path(), &fnt, &tex).unwrap();
    assert_eq!(stats.cells_rendered, 3);
    assert_eq!(stats.clipped, 0);

    let (header, pixels) = read_pixels(&std::fs::read(&tex).unwrap());
    assert_eq!(header, TextureHeader { width: 48, height: 32 });

    // ASCII row: only control bytes fit in three columns, nothing drawn
    assert!(pixels[..48 * 16].iter().all(|&p| p == 0));
    for col in 0..3usize {
        let inked = (16..32usize)
            .flat_map(|y| (col * 16..col * 16 + 16).map(move |x| y * 48 + x))
            .filter(|&i| pixels[i] >> 24 != 0)
            .count();
        assert!(inked > 10, "column {col} has {inked} inked pixels");
    }
    assert_eq!(std::fs::read(&fnt).unwrap().len(), FILE_LEN);
}
