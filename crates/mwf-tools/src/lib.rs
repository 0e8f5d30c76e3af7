//! mwf Tools - command line front-ends
//!
//! - `mwf-gen`: font file to `.fnt` + `.tex`
//! - `tex2ppm`: `.tex` to a viewable PPM image

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use mwf_atlas::{AtlasConfig, MissingGlyphPolicy, RowOrder};

/// Install the fmt subscriber; `RUST_LOG` overrides the default `info`
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Missing glyph handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Leave cells without a glyph blank
    Skip,
    /// Draw the fallback glyph into them
    Fill,
}

impl From<PolicyArg> for MissingGlyphPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Skip => MissingGlyphPolicy::Skip,
            PolicyArg::Fill => MissingGlyphPolicy::Fill,
        }
    }
}

/// Texture row order
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RowOrderArg {
    BottomUp,
    TopDown,
}

impl From<RowOrderArg> for RowOrder {
    fn from(arg: RowOrderArg) -> Self {
        match arg {
            RowOrderArg::BottomUp => RowOrder::BottomUp,
            RowOrderArg::TopDown => RowOrder::TopDown,
        }
    }
}

/// Generate a GBK font texture (.tex) and glyph table (.fnt) from a TrueType font
#[derive(Debug, Parser)]
#[command(name = "mwf-gen", version)]
pub struct GenArgs {
    /// TrueType/OpenType font to rasterize
    pub font: PathBuf,

    /// Output glyph table
    pub fnt: PathBuf,

    /// Output texture; its path is echoed into the .fnt header
    pub tex: PathBuf,

    /// JSON configuration file, overridden by the flags below
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cell width and height in pixels
    #[arg(long, value_name = "PX")]
    pub cell_size: Option<u32>,

    /// What to draw for characters the font lacks
    #[arg(long, value_enum)]
    pub missing_glyph: Option<PolicyArg>,

    /// Glyph index drawn by `--missing-glyph fill`
    #[arg(long, value_name = "INDEX")]
    pub fallback_glyph: Option<u16>,

    /// Row order of the texture pixels
    #[arg(long, value_enum)]
    pub row_order: Option<RowOrderArg>,

    /// Name to store in the .fnt header instead of the texture path
    #[arg(long, value_name = "NAME")]
    pub texture_name: Option<String>,
}

impl GenArgs {
    /// Defaults, then the config file, then flags
    pub fn atlas_config(&self) -> anyhow::Result<AtlasConfig> {
        let mut config = match &self.config {
            Some(path) => AtlasConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => AtlasConfig::default(),
        };

        if let Some(size) = self.cell_size {
            config.cell_width = size;
            config.cell_height = size;
        }
        if let Some(policy) = self.missing_glyph {
            config.missing_glyph = policy.into();
        }
        if let Some(glyph) = self.fallback_glyph {
            config.fallback_glyph = glyph;
        }
        if let Some(order) = self.row_order {
            config.row_order = order.into();
        }
        if let Some(name) = &self.texture_name {
            config.texture_name = Some(name.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

/// Dump a .tex texture as a plain-text PPM image
#[derive(Debug, Parser)]
#[command(name = "tex2ppm", version)]
pub struct DumpArgs {
    /// Texture produced by mwf-gen
    pub tex: PathBuf,

    /// PPM (P3) output
    pub ppm: PathBuf,
}
