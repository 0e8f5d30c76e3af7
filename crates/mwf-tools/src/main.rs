//! mwf-gen - Main Entry Point

use anyhow::Context;
use clap::Parser;
use mwf_atlas::FontGenerator;
use mwf_tools::GenArgs;

fn main() -> anyhow::Result<()> {
    mwf_tools::init_logging();

    let args = GenArgs::parse();
    let config = args.atlas_config()?;

    tracing::info!("Generating {} from {}", args.tex.display(), args.font.display());

    let stats = FontGenerator::new(config)
        .run(&args.font, &args.fnt, &args.tex)
        .with_context(|| format!("failed to generate font from {}", args.font.display()))?;

    tracing::info!(
        "Done: {} glyphs rendered, {} cells left blank",
        stats.cells_rendered,
        stats.cells_visited - stats.cells_rendered
    );
    Ok(())
}
