//! mwf Atlas - Legacy Font Texture Generator
//!
//! Converts a TrueType/OpenType font into the two files a legacy game
//! engine reads for double-byte text:
//! - `.fnt`: fixed header plus 256 UV/size records
//! - `.tex`: the rasterized glyphs of the whole GBK space on a uniform grid
//!
//! Row 0 of the grid holds full-width renderings of the single-byte ASCII
//! range; every following row is one lead byte, every column one trail byte.

pub mod builder;
pub mod codepage;
pub mod config;
pub mod fnt;
pub mod generator;
pub mod grid;
pub mod raster;
pub mod tex;

pub use builder::{AtlasBuilder, BuildOutput, BuildStats};
pub use codepage::{CodepointMapper, GbkMapper, dbc_to_sbc};
pub use config::{AtlasConfig, CodeRange, MissingGlyphPolicy, RowOrder};
pub use fnt::{FontMetadata, GlyphMetadata};
pub use generator::FontGenerator;
pub use grid::{AtlasGrid, CellUv, PixelRect, UvPoint};
pub use raster::{CoverageBitmap, FontFile, GlyphSource, RasterError, TtfRasterizer};
pub use tex::TextureHeader;

use std::path::PathBuf;

/// Font generation error types
#[derive(Debug, thiserror::Error)]
pub enum FontGenError {
    #[error("Failed to read font file {path}: {source}")]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse font: {0}")]
    FontParsing(String),

    #[error("Font has no Unicode character map")]
    NoUnicodeCharmap,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed metadata file: {0}")]
    MalformedMetadata(String),

    #[error("Malformed texture file: {0}")]
    MalformedTexture(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FontGenError>;
